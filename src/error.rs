//! Error types for slaac-dns.

use std::net::Ipv6Addr;

use ipnet::Ipv6Net;
use thiserror::Error;

/// Errors that can occur in the DNS server.
#[derive(Debug, Error)]
pub enum DnsError {
    /// IO error (socket, config file, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// DNS protocol error from the message layer
    #[error("DNS protocol error: {0}")]
    Proto(#[from] hickory_proto::error::ProtoError),

    /// Invalid configuration, caught at load time
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A qname that is not a well-formed `ip6.arpa` reverse name
    #[error("malformed reverse name: {0}")]
    MalformedName(String),

    /// Address does not fall inside the network it was resolved against
    #[error("address {addr} is outside network {net}")]
    OutOfNetwork {
        /// The offending address.
        addr: Ipv6Addr,
        /// The network it was checked against.
        net: Ipv6Net,
    },

    /// Host digit run has the wrong length for the network's prefix
    #[error("expected {expected} host digits, got {got}")]
    DigitCountMismatch {
        /// Digits required by the prefix length.
        expected: usize,
        /// Digits actually supplied.
        got: usize,
    },

    /// Host digit run contains a character outside `[0-9a-fA-F]`
    #[error("non-hex character in host digits: {0:?}")]
    NonHexDigit(String),
}
