//! Configuration types and the config-file parser for slaac-dns.
//!
//! The configuration file is line based. `#` starts a comment, blank lines
//! are skipped, and a `network` directive opens a block whose indented lines
//! describe that network:
//!
//! ```text
//! listen ::1
//!
//! network 2001:db8::/64
//!     resolves to host-%DIGITS%.example.com
//!     with upstream 2001:4860:4860::8888
//! ```
//!
//! All validation happens at load time; a server never starts with a bad
//! configuration.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use ipnet::Ipv6Net;

use crate::addr;
use crate::error::DnsError;
use crate::template::HostTemplate;

/// Default DNS port.
pub const DEFAULT_PORT: u16 = 53;

/// Addresses bound when neither the file nor the CLI names any.
pub const DEFAULT_LISTEN_ADDRS: [IpAddr; 2] = [
    IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
];

/// A single configured network: prefix, compiled template, optional
/// upstream resolver.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// The IPv6 prefix this network covers. Normalized: host bits zero.
    pub network: Ipv6Net,

    /// Hostname template, compiled against this prefix's host-digit count.
    pub template: HostTemplate,

    /// Upstream resolver consulted for PTR queries before synthesis.
    pub upstream: Option<SocketAddr>,
}

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Addresses to bind, in file order. May be empty; see
    /// [`Config::listen_socket_addrs`].
    pub listen_addresses: Vec<IpAddr>,

    /// Configured networks, in file order. Order is significant: the first
    /// matching network wins for both address and name lookups.
    pub networks: Vec<NetworkConfig>,

    /// UDP port to serve on.
    pub port: u16,

    /// Log one line per query.
    pub query_log: bool,
}

/// Telemetry configuration, assembled from CLI flags.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Log level filter (e.g. "info", "slaac_dns=debug,warn").
    pub log_level: String,

    /// Prometheus metrics exporter address, when compiled in.
    pub prometheus_addr: Option<SocketAddr>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            prometheus_addr: None,
        }
    }
}

impl Config {
    /// The socket addresses to bind: every configured listen address at the
    /// configured port, falling back to [`DEFAULT_LISTEN_ADDRS`] when none
    /// was named.
    pub fn listen_socket_addrs(&self) -> Vec<SocketAddr> {
        let addrs = if self.listen_addresses.is_empty() {
            &DEFAULT_LISTEN_ADDRS[..]
        } else {
            &self.listen_addresses[..]
        };
        addrs
            .iter()
            .map(|a| SocketAddr::new(*a, self.port))
            .collect()
    }
}

/// Parse a configuration file.
pub fn parse_config(text: &str) -> Result<Config, DnsError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut listen_addresses = Vec::new();
    let mut networks = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let raw = lines[i];
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            i += 1;
            continue;
        }

        if let Some(rest) = line.strip_prefix("listen ") {
            let addr: IpAddr = rest
                .trim()
                .parse()
                .map_err(|_| DnsError::Config(format!("invalid listen address: {rest}")))?;
            listen_addresses.push(addr);
            i += 1;
        } else if let Some(rest) = line.strip_prefix("network ") {
            let (network, consumed) = parse_network_block(rest.trim(), &lines[i + 1..])?;
            networks.push(network);
            i += 1 + consumed;
        } else {
            return Err(DnsError::Config(format!("unknown directive: {line}")));
        }
    }

    Ok(Config {
        listen_addresses,
        networks,
        port: DEFAULT_PORT,
        query_log: false,
    })
}

/// Parse one `network` block: the CIDR from the directive line plus the
/// indented continuation lines that follow. Returns the parsed network and
/// the number of continuation lines consumed.
fn parse_network_block(
    cidr: &str,
    following: &[&str],
) -> Result<(NetworkConfig, usize), DnsError> {
    let network: Ipv6Net = cidr
        .parse()
        .map_err(|_| DnsError::Config(format!("invalid network CIDR: {cidr}")))?;
    if network.addr() != network.network() {
        return Err(DnsError::Config(format!(
            "network {cidr} has host bits set; expected {}",
            network.trunc()
        )));
    }
    if network.prefix_len() % 4 != 0 {
        return Err(DnsError::Config(format!(
            "network {cidr}: prefix length must fall on a nibble boundary"
        )));
    }

    let mut template_text: Option<String> = None;
    let mut upstream: Option<SocketAddr> = None;
    let mut consumed = 0;

    for raw in following {
        let line = strip_comment(raw);
        if line.trim().is_empty() {
            consumed += 1;
            continue;
        }
        if !line.starts_with(' ') && !line.starts_with('\t') {
            break;
        }
        consumed += 1;

        let directive = line.trim();
        if let Some(rest) = directive.strip_prefix("resolves to ") {
            if template_text.is_some() {
                return Err(DnsError::Config(format!(
                    "network {cidr}: duplicate 'resolves to' directive"
                )));
            }
            template_text = Some(rest.trim().to_string());
        } else if let Some(rest) = directive.strip_prefix("with upstream ") {
            if upstream.is_some() {
                return Err(DnsError::Config(format!(
                    "network {cidr}: duplicate 'with upstream' directive"
                )));
            }
            upstream = Some(parse_upstream_addr(rest.trim())?);
        } else {
            return Err(DnsError::Config(format!(
                "network {cidr}: unknown directive: {directive}"
            )));
        }
    }

    let template_text = template_text.ok_or_else(|| {
        DnsError::Config(format!("network {cidr}: missing 'resolves to' directive"))
    })?;
    let template = HostTemplate::compile(&template_text, addr::digit_count(&network))?;

    Ok((
        NetworkConfig {
            network,
            template,
            upstream,
        },
        consumed,
    ))
}

/// Parse an upstream endpoint. A bare IP literal implies port 53; an
/// explicit port uses the `ip:port` / `[v6]:port` forms.
fn parse_upstream_addr(text: &str) -> Result<SocketAddr, DnsError> {
    if let Ok(sockaddr) = text.parse::<SocketAddr>() {
        return Ok(sockaddr);
    }
    let ip: IpAddr = text
        .parse()
        .map_err(|_| DnsError::Config(format!("invalid upstream address: {text}")))?;
    Ok(SocketAddr::new(ip, DEFAULT_PORT))
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(at) => &line[..at],
        None => line,
    }
}
