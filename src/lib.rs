//! slaac-dns - An authoritative DNS server that synthesizes IPv6 reverse
//! and forward records from hostname templates.
//!
//! SLAAC networks hand every host a self-derived interface identifier, so
//! materialized reverse zone files are impractical. This crate instead
//! answers on the fly: for each configured network, PTR queries substitute
//! the address's host bits (as hex digits) into a template, and AAAA
//! queries for such names rebuild the address. A per-network upstream
//! resolver may be consulted first for PTR, letting administratively
//! assigned names override synthesis.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          slaac-dns                            │
//! │                                                               │
//! │   UDP :53 ──▶ ┌────────────┐     ┌───────────────────┐        │
//! │               │ DnsServer  │────▶│   QueryHandler    │        │
//! │               │ (dispatch) │     │ (decode/classify) │        │
//! │               └────────────┘     └──────┬──────┬─────┘        │
//! │                                         │      │              │
//! │                              PTR/AAAA   │      │ PTR only     │
//! │                                         ▼      ▼              │
//! │                              ┌──────────────┐ ┌─────────────┐ │
//! │                              │   Registry   │ │ PtrResolver │─┼─▶ upstream
//! │                              │ (templates + │ │ (UDP, 2 s   │ │   UDP :53
//! │                              │  prefixes)   │ │  deadline)  │ │
//! │                              └──────────────┘ └─────────────┘ │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Resolution
//!
//! ```text
//! PTR  0.f.e.d. … .8.b.d.0.1.0.0.2.ip6.arpa
//!   → address 2001:db8::1234:5678:9abc:def0
//!   → network 2001:db8::/64, template host-%DIGITS%.example.com
//!   → host-123456789abcdef0.example.com
//!
//! AAAA host-123456789abcdef0.example.com
//!   → digits 123456789abcdef0
//!   → 2001:db8::1234:5678:9abc:def0
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use slaac_dns::{parse_config, DnsServer};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = parse_config(
//!         "network 2001:db8::/64\n    resolves to host-%DIGITS%.example.com\n",
//!     )
//!     .unwrap();
//!
//!     let shutdown = CancellationToken::new();
//!     let server = DnsServer::bind(&config).await.unwrap();
//!     server.run(shutdown).await.unwrap();
//! }
//! ```

#![warn(missing_docs)]

pub mod addr;
pub mod config;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod registry;
pub mod server;
pub mod telemetry;
pub mod template;
pub mod upstream;
pub mod wire;

// Re-export main types
pub use config::{parse_config, Config, NetworkConfig, TelemetryConfig};
pub use error::DnsError;
pub use handler::QueryHandler;
pub use registry::Registry;
pub use server::DnsServer;
pub use template::HostTemplate;
pub use upstream::{PtrResolver, UdpPtrResolver};
