use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use smartpick_db::models::{is_valid_number, POOL_SIZE};

use crate::index::Rank;

/// Invalid generation requests. Reported before any sampling happens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("At most one required number is allowed, got {0}")]
    TooManyRequired(usize),
    #[error("Number {0} is outside 1-{max}", max = POOL_SIZE)]
    OutOfRange(u8),
    #[error("Requested count must be at least 1")]
    ZeroCount,
    #[error("Hot window must cover at least one draw")]
    ZeroHotWindow,
    #[error("Consecutive-run threshold must be at least 2, got {0}")]
    RunTooShort(usize),
    #[error("Unknown rank {0}, expected 1, 2 or 3")]
    InvalidRank(u8),
}

/// Constraints of one generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    /// Numbers every result must contain. At most one.
    pub required: Vec<u8>,
    /// Numbers no result may contain.
    pub forbidden: Vec<u8>,
    /// Ranks whose past winning combinations are rejected.
    pub exclude_ranks: Vec<Rank>,
    /// Reject numbers seen in this many most recent draws.
    pub hot_window: Option<usize>,
    /// Reject combinations holding a run of consecutive numbers this long.
    pub min_consecutive_run: Option<usize>,
    pub count: usize,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            required: Vec::new(),
            forbidden: Vec::new(),
            exclude_ranks: Rank::ALL.to_vec(),
            hot_window: None,
            min_consecutive_run: None,
            count: 5,
        }
    }
}

impl FilterSpec {
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.required.len() > 1 {
            return Err(FilterError::TooManyRequired(self.required.len()));
        }
        if let Some(&n) = self
            .required
            .iter()
            .chain(&self.forbidden)
            .find(|&&n| !is_valid_number(n))
        {
            return Err(FilterError::OutOfRange(n));
        }
        if self.count == 0 {
            return Err(FilterError::ZeroCount);
        }
        if self.hot_window == Some(0) {
            return Err(FilterError::ZeroHotWindow);
        }
        match self.min_consecutive_run {
            Some(len) if len < 2 => Err(FilterError::RunTooShort(len)),
            _ => Ok(()),
        }
    }

    pub fn required_set(&self) -> BTreeSet<u8> {
        self.required.iter().copied().collect()
    }

    pub fn forbidden_set(&self) -> BTreeSet<u8> {
        self.forbidden.iter().copied().collect()
    }

    /// Excluded ranks without repeats, in rank order.
    pub fn excluded_ranks(&self) -> Vec<Rank> {
        let ranks: BTreeSet<Rank> = self.exclude_ranks.iter().copied().collect();
        ranks.into_iter().collect()
    }
}
