//! The per-query pipeline.
//!
//! `QueryHandler` is a pure function of (request bytes, registry, upstream
//! resolver) -> response bytes, so it is shared freely across request tasks.
//! The flow per query:
//!
//! ```text
//! decode -> classify
//!   PTR   -> parse ip6.arpa -> find network -> [upstream?] -> synthesize
//!   AAAA  -> match template -> rebuild address
//!   other -> NXDOMAIN
//! ```
//!
//! Decode failures answer FORMERR, anything unexpected after a successful
//! decode answers SERVFAIL; a request task never panics.

use std::net::SocketAddr;
use std::sync::Arc;

use hickory_proto::op::ResponseCode;
use hickory_proto::rr::rdata::{AAAA, PTR};
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use tracing::{debug, error, info, trace};

use crate::addr;
use crate::error::DnsError;
use crate::metrics::{self, QueryResult, Timer, UpstreamOutcome};
use crate::registry::Registry;
use crate::upstream::PtrResolver;
use crate::wire::{self, DecodedQuery, ANSWER_TTL};

/// Label appended to delegated PTR queries.
///
/// This is a contract with the operator's upstream nameserver configuration:
/// the upstream sees `<reverse-name>.upstream` instead of the reverse name
/// itself, so pointing it back at a conventional authoritative server cannot
/// loop queries through this one.
const UPSTREAM_LABEL: &str = "upstream";

/// The authoritative query pipeline.
pub struct QueryHandler {
    registry: Arc<Registry>,
    resolver: Arc<dyn PtrResolver>,
    query_log: bool,
}

impl QueryHandler {
    /// Create a handler over the given registry and upstream delegate.
    pub fn new(registry: Arc<Registry>, resolver: Arc<dyn PtrResolver>, query_log: bool) -> Self {
        Self {
            registry,
            resolver,
            query_log,
        }
    }

    /// Process one request datagram into a response datagram.
    ///
    /// `None` means nothing can be sent (response encoding itself failed);
    /// the dispatcher drops the packet.
    pub async fn handle(&self, bytes: &[u8], src: SocketAddr) -> Option<Vec<u8>> {
        let timer = Timer::start();

        let decoded = match wire::decode_query(bytes) {
            Ok(decoded) => decoded,
            Err(form_error) => {
                debug!(client = %src, reason = %form_error.reason, "rejecting malformed request");
                metrics::record_query("unknown", QueryResult::FormErr, timer.elapsed());
                return match wire::encode_formerr(&form_error) {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        error!(client = %src, error = %e, "failed to encode FORMERR response");
                        None
                    }
                };
            }
        };

        if self.query_log {
            info!(
                target: "query",
                client = %src.ip(),
                name = %decoded.query.name(),
                qtype = %decoded.query.query_type(),
                "query"
            );
        }

        let qtype = decoded.query.query_type().to_string();
        let (bytes, result) = match self.dispatch(&decoded).await {
            Ok(done) => done,
            Err(e) => {
                error!(client = %src, error = %e, "internal error while answering query");
                match wire::encode_rcode(&decoded, ResponseCode::ServFail) {
                    Ok(bytes) => (bytes, QueryResult::ServFail),
                    Err(e) => {
                        error!(client = %src, error = %e, "failed to encode SERVFAIL response");
                        metrics::record_query(&qtype, QueryResult::ServFail, timer.elapsed());
                        return None;
                    }
                }
            }
        };

        metrics::record_query(&qtype, result, timer.elapsed());
        Some(bytes)
    }

    async fn dispatch(&self, decoded: &DecodedQuery) -> Result<(Vec<u8>, QueryResult), DnsError> {
        match decoded.query.query_type() {
            RecordType::PTR => self.answer_ptr(decoded).await,
            RecordType::AAAA => self.answer_aaaa(decoded),
            other => {
                trace!(qtype = %other, "unsupported query type");
                self.nxdomain(decoded)
            }
        }
    }

    /// PTR: reverse name -> address -> network -> (upstream | synthesis).
    async fn answer_ptr(&self, decoded: &DecodedQuery) -> Result<(Vec<u8>, QueryResult), DnsError> {
        let qname = decoded.query.name();

        let address = match addr::parse_ptr_qname(qname) {
            Ok(address) => address,
            Err(e) => {
                debug!(qname = %qname, error = %e, "not a reverse address");
                return self.nxdomain(decoded);
            }
        };

        let Some(network) = self.registry.find_by_addr(address) else {
            debug!(%address, "address outside every configured network");
            return self.nxdomain(decoded);
        };

        if let Some(endpoint) = network.upstream {
            if let Some(target) = self.delegate(qname, endpoint).await? {
                return self.answer(decoded, RData::PTR(PTR(target)), QueryResult::Relayed);
            }
        }

        let digits = addr::host_digits(address, &network.network)?;
        let hostname = network.template.synthesize(&digits)?;
        debug!(%address, %hostname, "synthesized PTR answer");
        self.answer(decoded, RData::PTR(PTR(hostname)), QueryResult::Answered)
    }

    /// Ask the network's upstream, with the loop-avoidance label appended.
    async fn delegate(
        &self,
        qname: &Name,
        endpoint: SocketAddr,
    ) -> Result<Option<Name>, DnsError> {
        let upstream_qname = qname.clone().append_label(UPSTREAM_LABEL)?;
        let target = self.resolver.resolve_ptr(endpoint, &upstream_qname).await;
        match &target {
            Some(target) => {
                debug!(upstream = %endpoint, %target, "relaying upstream PTR answer");
                metrics::record_upstream(UpstreamOutcome::Answered);
            }
            None => {
                debug!(upstream = %endpoint, "upstream unavailable, falling back to synthesis");
                metrics::record_upstream(UpstreamOutcome::NoAnswer);
            }
        }
        Ok(target)
    }

    /// AAAA: template match -> digits -> address. Upstream is never consulted.
    fn answer_aaaa(&self, decoded: &DecodedQuery) -> Result<(Vec<u8>, QueryResult), DnsError> {
        let qname = decoded.query.name();

        let Some((network, digits)) = self.registry.find_by_name(qname) else {
            debug!(%qname, "name matches no configured template");
            return self.nxdomain(decoded);
        };

        let address = match addr::addr_from_digits(&digits, &network.network) {
            Ok(address) => address,
            Err(e) => {
                debug!(%qname, error = %e, "template residue does not rebuild an address");
                return self.nxdomain(decoded);
            }
        };

        debug!(%qname, %address, "synthesized AAAA answer");
        self.answer(decoded, RData::AAAA(AAAA(address)), QueryResult::Answered)
    }

    fn answer(
        &self,
        decoded: &DecodedQuery,
        rdata: RData,
        result: QueryResult,
    ) -> Result<(Vec<u8>, QueryResult), DnsError> {
        let mut record = Record::from_rdata(decoded.query.name().clone(), ANSWER_TTL, rdata);
        record.set_dns_class(DNSClass::IN);
        Ok((wire::encode_answer(decoded, record)?, result))
    }

    fn nxdomain(&self, decoded: &DecodedQuery) -> Result<(Vec<u8>, QueryResult), DnsError> {
        Ok((
            wire::encode_rcode(decoded, ResponseCode::NXDomain)?,
            QueryResult::NxDomain,
        ))
    }
}
