//! Upstream PTR delegation.
//!
//! A network may name an upstream resolver; the pipeline asks it first so
//! that administratively assigned names override synthesis. Each query uses
//! a short-lived UDP socket and a randomized ID. Every failure mode --
//! timeout, socket error, malformed reply, negative or empty answer -- is
//! reported as "no answer", and the caller falls back to local synthesis.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{Name, RData, RecordType};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::debug;

use crate::error::DnsError;

/// Deadline for one upstream round trip.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(2);

/// Receive buffer; upstream replies may exceed the plain-UDP message size.
const UDP_RECV_BUFFER_SIZE: usize = 4096;

/// Forward-resolve contract the query pipeline delegates PTR lookups to.
#[async_trait]
pub trait PtrResolver: Send + Sync {
    /// Ask `endpoint` for a PTR record on `qname`.
    ///
    /// Returns the first PTR target on a NOERROR reply carrying one, `None`
    /// on any failure. The implementation must bound the round trip with a
    /// deadline; exceeding it is just another `None`.
    async fn resolve_ptr(&self, endpoint: SocketAddr, qname: &Name) -> Option<Name>;
}

/// [`PtrResolver`] speaking plain UDP with a fresh socket per query.
#[derive(Debug, Clone)]
pub struct UdpPtrResolver {
    timeout: Duration,
}

impl UdpPtrResolver {
    /// Resolver with the default deadline.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_UPSTREAM_TIMEOUT)
    }

    /// Resolver with a custom deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// One send/receive exchange on a throwaway socket.
    async fn exchange(
        &self,
        endpoint: SocketAddr,
        query: &Message,
    ) -> Result<Message, DnsError> {
        let query_bytes = query.to_vec()?;

        let bind_addr = if endpoint.is_ipv6() {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0)
        } else {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.send_to(&query_bytes, endpoint).await?;

        let mut buf = vec![0u8; UDP_RECV_BUFFER_SIZE];
        let (len, src) = timeout(self.timeout, socket.recv_from(&mut buf))
            .await
            .map_err(|_| {
                io::Error::new(io::ErrorKind::TimedOut, format!("upstream {endpoint} timed out"))
            })??;

        if src != endpoint {
            return Err(DnsError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("reply from unexpected source {src} (expected {endpoint})"),
            )));
        }

        Ok(Message::from_vec(&buf[..len])?)
    }
}

impl Default for UdpPtrResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PtrResolver for UdpPtrResolver {
    async fn resolve_ptr(&self, endpoint: SocketAddr, qname: &Name) -> Option<Name> {
        let mut query = Message::new();
        query.set_id(rand::random());
        query.set_message_type(MessageType::Query);
        query.set_op_code(OpCode::Query);
        query.set_recursion_desired(true);
        query.add_query(Query::query(qname.clone(), RecordType::PTR));

        let response = match self.exchange(endpoint, &query).await {
            Ok(response) => response,
            Err(e) => {
                debug!(upstream = %endpoint, qname = %qname, error = %e, "upstream query failed");
                return None;
            }
        };

        if response.id() != query.id() {
            debug!(upstream = %endpoint, "upstream reply ID mismatch");
            return None;
        }
        if response.response_code() != ResponseCode::NoError {
            debug!(
                upstream = %endpoint,
                rcode = ?response.response_code(),
                "upstream returned a negative answer"
            );
            return None;
        }

        let target = response.answers().iter().find_map(|record| match record.data() {
            Some(RData::PTR(ptr)) => Some(ptr.0.clone()),
            _ => None,
        });
        if target.is_none() {
            debug!(upstream = %endpoint, "upstream reply carried no PTR answer");
        }
        target
    }
}
