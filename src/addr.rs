//! IPv6 address <-> reverse-name conversions.
//!
//! The reverse direction walks `ip6.arpa` names (32 single-nibble labels,
//! least-significant first); the forward direction renders the host bits of
//! an address, relative to its network prefix, as a fixed-width run of
//! lowercase hex digits.

use std::net::Ipv6Addr;

use hickory_proto::rr::Name;
use ipnet::{IpNet, Ipv6Net};

use crate::error::DnsError;

/// Build the fully qualified `ip6.arpa` name for an address.
pub fn ptr_qname(addr: Ipv6Addr) -> Name {
    Name::from(addr)
}

/// Parse an `ip6.arpa` name back into an address.
///
/// Requires the full 34-label form: 32 single hex-character labels followed
/// by `ip6.arpa` (case-insensitive). Anything else, including
/// `in-addr.arpa` names and truncated nibble runs, is a [`DnsError::MalformedName`].
pub fn parse_ptr_qname(qname: &Name) -> Result<Ipv6Addr, DnsError> {
    let malformed = || DnsError::MalformedName(qname.to_ascii());

    match qname.parse_arpa_name() {
        Ok(IpNet::V6(net)) if net.prefix_len() == 128 => Ok(net.addr()),
        _ => Err(malformed()),
    }
}

/// Number of hex digits covering the host bits of `net`.
pub fn digit_count(net: &Ipv6Net) -> usize {
    (128 - net.prefix_len() as usize) / 4
}

/// Render the host bits of `addr` within `net` as lowercase hex,
/// left-padded to the network's digit count.
pub fn host_digits(addr: Ipv6Addr, net: &Ipv6Net) -> Result<String, DnsError> {
    if !net.contains(&addr) {
        return Err(DnsError::OutOfNetwork { addr, net: *net });
    }

    let width = digit_count(net);
    if width == 0 {
        return Ok(String::new());
    }

    let host = u128::from(addr) & host_mask(net.prefix_len());
    Ok(format!("{host:0width$x}"))
}

/// Rebuild an address from a host-digit run and its network.
///
/// The run must be exactly the network's digit count and all hex
/// (either case).
pub fn addr_from_digits(digits: &str, net: &Ipv6Net) -> Result<Ipv6Addr, DnsError> {
    let expected = digit_count(net);
    if digits.len() != expected {
        return Err(DnsError::DigitCountMismatch {
            expected,
            got: digits.len(),
        });
    }

    // from_str_radix tolerates a leading sign, so check characters first.
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DnsError::NonHexDigit(digits.to_string()));
    }

    let host = if digits.is_empty() {
        0
    } else {
        u128::from_str_radix(digits, 16)
            .map_err(|_| DnsError::NonHexDigit(digits.to_string()))?
    };

    Ok(Ipv6Addr::from(u128::from(net.network()) | host))
}

/// Mask selecting the low `128 - prefix_len` bits.
fn host_mask(prefix_len: u8) -> u128 {
    match prefix_len {
        0 => u128::MAX,
        128 => 0,
        p => (1u128 << (128 - p)) - 1,
    }
}
