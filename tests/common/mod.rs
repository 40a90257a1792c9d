//! Shared test infrastructure for the end-to-end query tests.
//!
//! Everything here speaks real UDP on loopback: a server bound to an
//! ephemeral port, a throwaway client socket per query, and a scriptable
//! mock upstream.

#![allow(dead_code)]

use std::net::{Ipv6Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::PTR;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use slaac_dns::upstream::UdpPtrResolver;
use slaac_dns::{parse_config, DnsServer};

/// Reverse name for 2001:db8::1234:5678:9abc:def0.
pub const PTR_QNAME: &str =
    "0.f.e.d.c.b.a.9.8.7.6.5.4.3.2.1.0.0.0.0.0.0.0.0.8.b.d.0.1.0.0.2.ip6.arpa.";

/// How long the server-side upstream resolver waits in tests.
pub const TEST_UPSTREAM_TIMEOUT: Duration = Duration::from_millis(250);

// --- Test server ---

/// A server on an ephemeral loopback port, shut down on drop.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: CancellationToken,
}

impl TestServer {
    /// Parse `config_text` (a loopback listen address is prepended) and
    /// serve it on an ephemeral port.
    pub async fn start(config_text: &str) -> Self {
        let text = format!("listen 127.0.0.1\n{config_text}");
        let mut config = parse_config(&text).expect("test config must parse");
        config.port = 0;

        let resolver = Arc::new(UdpPtrResolver::with_timeout(TEST_UPSTREAM_TIMEOUT));
        let server = DnsServer::bind_with_resolver(&config, resolver)
            .await
            .expect("failed to bind test server");
        let addr = server.local_addrs().expect("local addrs")[0];

        let shutdown = CancellationToken::new();
        tokio::spawn(server.run(shutdown.clone()));

        Self { addr, shutdown }
    }

    /// Send a query and return the parsed response.
    pub async fn query(&self, name: &str, rtype: RecordType, id: u16) -> Message {
        self.send_raw(&build_query_bytes(name, rtype, id)).await
    }

    /// Send arbitrary bytes and return the parsed response.
    pub async fn send_raw(&self, bytes: &[u8]) -> Message {
        let client = UdpSocket::bind("127.0.0.1:0").await.expect("bind client");
        client.send_to(bytes, self.addr).await.expect("send query");

        let mut buf = [0u8; 512];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), client.recv_from(&mut buf))
            .await
            .expect("no response within two seconds")
            .expect("recv response");
        Message::from_vec(&buf[..len]).expect("parse response")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// --- Query/response helpers ---

/// Build wire-format bytes for a DNS query.
pub fn build_query_bytes(name: &str, rtype: RecordType, id: u16) -> Vec<u8> {
    let mut message = Message::new();
    message.set_id(id);
    message.set_message_type(MessageType::Query);
    message.set_op_code(OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(Query::query(Name::from_ascii(name).unwrap(), rtype));
    message.to_vec().unwrap()
}

/// Extract the single PTR target from a response.
pub fn ptr_target(response: &Message) -> String {
    assert_eq!(response.answers().len(), 1, "expected exactly one answer");
    match response.answers()[0].data() {
        Some(RData::PTR(ptr)) => ptr.0.to_ascii(),
        other => panic!("expected PTR rdata, got {other:?}"),
    }
}

/// Extract the single AAAA address from a response.
pub fn aaaa_addr(response: &Message) -> Ipv6Addr {
    assert_eq!(response.answers().len(), 1, "expected exactly one answer");
    match response.answers()[0].data() {
        Some(RData::AAAA(aaaa)) => aaaa.0,
        other => panic!("expected AAAA rdata, got {other:?}"),
    }
}

// --- Mock upstream ---

/// What the mock upstream does with each query it receives.
#[derive(Clone)]
pub enum UpstreamBehavior {
    /// NOERROR with the given PTR targets.
    AnswerPtr(Vec<&'static str>),
    /// NXDOMAIN.
    NxDomain,
    /// NOERROR, zero answers.
    Empty,
    /// Receive and never reply.
    Silent,
}

/// Spawn a mock upstream resolver; returns its address and the names it was
/// asked for.
pub async fn spawn_upstream(behavior: UpstreamBehavior) -> (SocketAddr, Arc<Mutex<Vec<Name>>>) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.expect("bind upstream");
    let addr = socket.local_addr().expect("upstream addr");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_task = Arc::clone(&seen);

    tokio::spawn(async move {
        let mut buf = [0u8; 4096];
        loop {
            let Ok((len, src)) = socket.recv_from(&mut buf).await else {
                return;
            };
            let Ok(query) = Message::from_vec(&buf[..len]) else {
                continue;
            };
            seen_task
                .lock()
                .unwrap()
                .push(query.queries()[0].name().clone());

            let response = match &behavior {
                UpstreamBehavior::Silent => continue,
                UpstreamBehavior::NxDomain => {
                    Message::error_msg(query.id(), OpCode::Query, ResponseCode::NXDomain)
                }
                UpstreamBehavior::Empty => {
                    let mut response = Message::new();
                    response.set_id(query.id());
                    response.set_message_type(MessageType::Response);
                    response.set_response_code(ResponseCode::NoError);
                    response.add_query(query.queries()[0].clone());
                    response
                }
                UpstreamBehavior::AnswerPtr(targets) => {
                    let mut response = Message::new();
                    response.set_id(query.id());
                    response.set_message_type(MessageType::Response);
                    response.set_response_code(ResponseCode::NoError);
                    response.add_query(query.queries()[0].clone());
                    for target in targets {
                        response.add_answer(Record::from_rdata(
                            query.queries()[0].name().clone(),
                            300,
                            RData::PTR(PTR(Name::from_ascii(target).unwrap())),
                        ));
                    }
                    response
                }
            };

            let _ = socket
                .send_to(&response.to_vec().unwrap(), src)
                .await;
        }
    });

    (addr, seen)
}
