//! Address arithmetic used by IP pools and floating IPs.

pub mod ip_range;

pub use ip_range::{IpRange, first_free_ip, ip_in_any_range, ip_in_range, ip_range_len, ip_to_u128};
