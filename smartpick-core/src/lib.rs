//! Ticket recommendation for the 6/45 lottery.
//!
//! [`index::MatchIndex`] holds the combinations that already won at ranks 1
//! to 3; [`sampler::generate`] draws random tickets that avoid them and
//! satisfy a [`filter::FilterSpec`].

pub mod config;
pub mod filter;
pub mod hot;
pub mod index;
pub mod sampler;
pub mod source;

pub use config::SamplerConfig;
pub use filter::{FilterError, FilterSpec};
pub use index::{Combination, DerivationRule, MatchIndex, Rank, SharedIndex};
pub use sampler::{generate, Batch, BatchStatus, Rejection};
