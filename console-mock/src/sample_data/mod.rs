//! Synthetic data for the metrics views.
//!
//! Generators here are seeded from their inputs so the console shows stable-looking charts while
//! it is being developed. See [`utilization`] for the one deliberate exception.

pub mod lcg;
pub mod timeseries;
pub mod utilization;

pub use lcg::{Lcg, name_checksum};
pub use timeseries::{mock_query_result, mock_table};
pub use utilization::{ClusterCapacity, UtilizationSample, generate_utilization};
