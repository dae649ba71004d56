//! Address literal classification.
//!
//! Candidate values pulled out of events are free text, so these checks are
//! deliberately forgiving about notation: [`is_ip`] accepts single addresses
//! and CIDR blocks in either family, while [`is_ipv4`] / [`is_ipv6`] demand a
//! plain single address of the named family.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnetwork::IpNetwork;

/// True for a single IPv4/IPv6 address or a CIDR block of either family.
///
/// Bare integers like `"127"` are rejected up front: an address literal has
/// to contain at least one `.` or `:` before parsing is attempted.
pub fn is_ip(text: &str) -> bool {
    if !text.contains('.') && !text.contains(':') {
        return false;
    }
    text.parse::<IpAddr>().is_ok() || text.parse::<IpNetwork>().is_ok()
}

/// True only for a plain single IPv4 address. CIDR notation does not count.
pub fn is_ipv4(text: &str) -> bool {
    text.parse::<Ipv4Addr>().is_ok()
}

/// True only for a plain single IPv6 address. CIDR notation does not count.
pub fn is_ipv6(text: &str) -> bool {
    text.parse::<Ipv6Addr>().is_ok()
}
