//! IPv4/IPv6 range membership and sizing.
//!
//! Addresses are compared as unsigned 128-bit integers. IPv4 addresses are widened into the same
//! domain, but a probe is only ever compared against a range of its own family: an IPv6 probe is
//! never inside an IPv4 range, whatever its numeric value.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use utoipa::ToSchema;

/// Inclusive address range, stored in the textual form the API exchanges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IpRange {
    pub first: String,
    pub last: String,
}

impl IpRange {
    pub fn new(first: impl Into<String>, last: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            last: last.into(),
        }
    }

    /// Both endpoints parsed, or `None` if either is malformed or the families differ.
    fn bounds(&self) -> Option<(IpAddr, IpAddr)> {
        let first: IpAddr = self.first.parse().ok()?;
        let last: IpAddr = self.last.parse().ok()?;
        (first.is_ipv4() == last.is_ipv4()).then_some((first, last))
    }

    pub fn is_ipv4(&self) -> bool {
        matches!(self.first.parse::<IpAddr>(), Ok(IpAddr::V4(_)))
    }
}

pub fn ip_to_u128(ip: &IpAddr) -> u128 {
    match ip {
        IpAddr::V4(v4) => u128::from(u32::from(*v4)),
        IpAddr::V6(v6) => u128::from(*v6),
    }
}

fn u128_to_ip(value: u128, v4: bool) -> IpAddr {
    if v4 {
        IpAddr::V4(Ipv4Addr::from(value as u32))
    } else {
        IpAddr::V6(Ipv6Addr::from(value))
    }
}

fn addr_in_range(ip: &IpAddr, range: &IpRange) -> bool {
    let Some((first, last)) = range.bounds() else {
        return false;
    };
    if ip.is_ipv4() != first.is_ipv4() {
        return false;
    }
    let n = ip_to_u128(ip);
    ip_to_u128(&first) <= n && n <= ip_to_u128(&last)
}

/// Inclusive containment check. Malformed input and mixed families are "not contained".
pub fn ip_in_range(ip: &str, range: &IpRange) -> bool {
    match ip.parse::<IpAddr>() {
        Ok(addr) => addr_in_range(&addr, range),
        Err(_) => false,
    }
}

pub fn ip_in_any_range(ip: &str, ranges: &[IpRange]) -> bool {
    match ip.parse::<IpAddr>() {
        Ok(addr) => ranges.iter().any(|r| addr_in_range(&addr, r)),
        Err(_) => false,
    }
}

/// Number of addresses in the range, `last - first + 1`. Inverted or malformed ranges are empty.
///
/// A full IPv6 range holds 2^128 addresses, one more than `u128` can represent; that single case
/// saturates at `u128::MAX`.
pub fn ip_range_len(range: &IpRange) -> u128 {
    let Some((first, last)) = range.bounds() else {
        return 0;
    };
    let (first, last) = (ip_to_u128(&first), ip_to_u128(&last));
    if last < first {
        return 0;
    }
    (last - first).saturating_add(1)
}

/// First address, walking `ranges` in order, that does not appear in `used`.
pub fn first_free_ip(ranges: &[IpRange], used: &HashSet<IpAddr>) -> Option<IpAddr> {
    for range in ranges {
        let Some((first, last)) = range.bounds() else {
            continue;
        };
        let v4 = first.is_ipv4();
        let (mut cursor, end) = (ip_to_u128(&first), ip_to_u128(&last));
        while cursor <= end {
            let candidate = u128_to_ip(cursor, v4);
            if !used.contains(&candidate) {
                return Some(candidate);
            }
            match cursor.checked_add(1) {
                Some(next) => cursor = next,
                None => break,
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v4_range() -> IpRange {
        IpRange::new("10.0.0.0", "10.0.0.10")
    }

    #[test]
    fn test_ipv4_containment_is_inclusive() {
        let ranges = vec![v4_range()];
        assert!(ip_in_any_range("10.0.0.5", &ranges));
        assert!(ip_in_any_range("10.0.0.0", &ranges));
        assert!(ip_in_any_range("10.0.0.10", &ranges));
        assert!(!ip_in_any_range("10.0.0.11", &ranges));
        assert!(!ip_in_any_range("9.255.255.255", &ranges));
    }

    #[test]
    fn test_family_mismatch_is_not_contained() {
        // ::a is numerically 10, squarely between the v4 bounds' low bits, but the wrong family
        let range = IpRange::new("0.0.0.0", "0.0.0.20");
        assert!(!ip_in_range("::a", &range));

        let v6 = IpRange::new("fd00::1", "fd00::ff");
        assert!(ip_in_range("fd00::10", &v6));
        assert!(!ip_in_range("10.0.0.5", &v6));
    }

    #[test]
    fn test_malformed_input() {
        assert!(!ip_in_range("not-an-ip", &v4_range()));
        assert!(!ip_in_range("10.0.0.5", &IpRange::new("10.0.0.0", "fd00::1")));
        assert_eq!(ip_range_len(&IpRange::new("10.0.0.0", "garbage")), 0);
    }

    #[test]
    fn test_range_len() {
        assert_eq!(ip_range_len(&v4_range()), 11);
        assert_eq!(ip_range_len(&IpRange::new("10.0.0.1", "10.0.0.1")), 1);
        assert_eq!(ip_range_len(&IpRange::new("10.0.0.9", "10.0.0.1")), 0);
        assert_eq!(ip_range_len(&IpRange::new("0.0.0.0", "255.255.255.255")), 1 << 32);
        assert_eq!(ip_range_len(&IpRange::new("fd00::", "fd00::ffff:ffff:ffff:ffff")), 1u128 << 64);
        assert_eq!(
            ip_range_len(&IpRange::new("::", "ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff")),
            u128::MAX
        );
    }

    #[test]
    fn test_first_free_ip_skips_used() {
        let ranges = vec![IpRange::new("10.0.0.1", "10.0.0.2"), IpRange::new("10.1.0.1", "10.1.0.1")];
        let mut used = HashSet::new();
        assert_eq!(first_free_ip(&ranges, &used), Some("10.0.0.1".parse().unwrap()));

        used.insert("10.0.0.1".parse().unwrap());
        used.insert("10.0.0.2".parse().unwrap());
        assert_eq!(first_free_ip(&ranges, &used), Some("10.1.0.1".parse().unwrap()));

        used.insert("10.1.0.1".parse().unwrap());
        assert_eq!(first_free_ip(&ranges, &used), None);
    }

    #[test]
    fn test_first_free_ip_v6() {
        let ranges = vec![IpRange::new("fd00::1", "fd00::3")];
        let used: HashSet<IpAddr> = ["fd00::1".parse().unwrap()].into_iter().collect();
        assert_eq!(first_free_ip(&ranges, &used), Some("fd00::2".parse().unwrap()));
    }
}
