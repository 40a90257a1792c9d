//! Wire-level decode/encode for the query shapes this server supports.
//!
//! Message framing is hickory-proto's RFC 1035 implementation (including
//! compression-pointer acceptance on decode); this module owns the server's
//! contract on top of it: a request must be a single-question IN-class
//! QUERY, and every response echoes the question with QR=1, AA=1, RA=0 and
//! at most one answer inside the 512-octet plain-UDP limit.

use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Record};
use hickory_proto::error::ProtoError;

/// TTL stamped on every synthesized or relayed answer.
pub const ANSWER_TTL: u32 = 60;

/// Plain-UDP DNS responses must fit in 512 octets.
pub const MAX_UDP_RESPONSE_SIZE: usize = 512;

/// A validated single-question query.
#[derive(Debug, Clone)]
pub struct DecodedQuery {
    /// Query ID, echoed in the response.
    pub id: u16,

    /// The RD flag from the request, copied into the response.
    pub recursion_desired: bool,

    /// The question section's single entry.
    pub query: Query,
}

/// A request that failed the decode contract.
///
/// Carries whatever could still be salvaged for the FORMERR response: the
/// query ID when the first two header bytes were readable (0 otherwise) and
/// the question when the message itself parsed.
#[derive(Debug)]
pub struct FormError {
    /// Best-effort query ID; 0 when unreadable.
    pub id: u16,

    /// The question, when the message parsed but failed validation.
    pub query: Option<Query>,

    /// Human-readable cause, for logging only.
    pub reason: String,
}

/// Decode and validate a request.
///
/// Rejects messages that fail to parse, carry QDCOUNT != 1, are responses
/// (QR=1), use an opcode other than QUERY, or ask a class other than IN.
pub fn decode_query(bytes: &[u8]) -> Result<DecodedQuery, FormError> {
    // The ID occupies the first two octets; salvage it even from garbage so
    // the FORMERR can still be correlated by the client.
    let id = match bytes {
        [hi, lo, ..] => u16::from_be_bytes([*hi, *lo]),
        _ => 0,
    };

    let message = Message::from_vec(bytes).map_err(|e| FormError {
        id,
        query: None,
        reason: format!("unparseable message: {e}"),
    })?;

    let form_error = |query: Option<Query>, reason: String| FormError {
        id: message.id(),
        query,
        reason,
    };

    if message.message_type() != MessageType::Query {
        return Err(form_error(None, "QR flag set on a request".to_string()));
    }
    if message.op_code() != OpCode::Query {
        return Err(form_error(
            None,
            format!("unsupported opcode: {:?}", message.op_code()),
        ));
    }
    if message.queries().len() != 1 {
        return Err(form_error(
            None,
            format!("expected exactly one question, got {}", message.queries().len()),
        ));
    }

    let query = message.queries()[0].clone();
    if query.query_class() != DNSClass::IN {
        let class = query.query_class();
        return Err(form_error(
            Some(query),
            format!("unsupported query class: {class:?}"),
        ));
    }

    Ok(DecodedQuery {
        id: message.id(),
        recursion_desired: message.recursion_desired(),
        query,
    })
}

/// Encode a response carrying a single answer record.
///
/// The caller stamps the record's TTL ([`ANSWER_TTL`]). Should the encoded
/// message overflow the UDP size limit, the answer is dropped and TC set.
pub fn encode_answer(decoded: &DecodedQuery, record: Record) -> Result<Vec<u8>, ProtoError> {
    let mut message = response_skeleton(decoded, ResponseCode::NoError);
    message.add_answer(record);

    let bytes = message.to_vec()?;
    if bytes.len() <= MAX_UDP_RESPONSE_SIZE {
        return Ok(bytes);
    }

    let mut truncated = response_skeleton(decoded, ResponseCode::NoError);
    truncated.set_truncated(true);
    truncated.to_vec()
}

/// Encode an answerless response with the given RCODE (NXDOMAIN, SERVFAIL).
pub fn encode_rcode(
    decoded: &DecodedQuery,
    rcode: ResponseCode,
) -> Result<Vec<u8>, ProtoError> {
    response_skeleton(decoded, rcode).to_vec()
}

/// Encode the FORMERR response for a rejected request.
pub fn encode_formerr(error: &FormError) -> Result<Vec<u8>, ProtoError> {
    let mut message = Message::error_msg(error.id, OpCode::Query, ResponseCode::FormErr);
    if let Some(query) = &error.query {
        message.add_query(query.clone());
    }
    message.to_vec()
}

/// The flag and question layout shared by every non-FORMERR response.
fn response_skeleton(decoded: &DecodedQuery, rcode: ResponseCode) -> Message {
    let mut message = Message::new();
    message
        .set_id(decoded.id)
        .set_message_type(MessageType::Response)
        .set_op_code(OpCode::Query)
        .set_authoritative(true)
        .set_recursion_desired(decoded.recursion_desired)
        .set_recursion_available(false)
        .set_response_code(rcode)
        .add_query(decoded.query.clone());
    message
}
