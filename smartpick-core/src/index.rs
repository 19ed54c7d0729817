//! Lookup sets of combinations that already won at ranks 1 to 3.
//!
//! Every entry is stored sorted, so membership tests do not depend on the
//! order in which numbers were drawn or typed.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use smartpick_db::models::{is_valid_number, Draw, PICK_COUNT};

use crate::filter::FilterError;

/// Numbers shared with a draw for a rank-3 win.
pub const SUBSET_LEN: usize = 5;

/// A sorted ticket of six main numbers.
pub type Combination = [u8; PICK_COUNT];
/// A sorted five-number subset of a ticket.
pub type SubsetKey = [u8; SUBSET_LEN];
/// A record as found in a history source, before any validation.
pub type RawRecord = Vec<i64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Rank {
    First,
    Second,
    Third,
}

impl Rank {
    pub const ALL: [Rank; 3] = [Rank::First, Rank::Second, Rank::Third];

    pub fn number(self) -> u8 {
        match self {
            Rank::First => 1,
            Rank::Second => 2,
            Rank::Third => 3,
        }
    }
}

impl TryFrom<u8> for Rank {
    type Error = FilterError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Rank::First),
            2 => Ok(Rank::Second),
            3 => Ok(Rank::Third),
            other => Err(FilterError::InvalidRank(other)),
        }
    }
}

impl From<Rank> for u8 {
    fn from(rank: Rank) -> u8 {
        rank.number()
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rank {}", self.number())
    }
}

/// How rank-2 and rank-3 entries are derived from a full draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DerivationRule {
    /// Rank 2 gets each five-number subset plus the bonus, rank 3 gets the
    /// subsets themselves.
    #[default]
    Corrected,
    /// Subsets of the main numbers are classified by whether they hold the
    /// bonus. They never do, so rank 2 stays empty.
    Legacy,
}

/// Raw per-rank records, as handed over by a history source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankRecords {
    pub first: Vec<RawRecord>,
    pub second: Vec<RawRecord>,
    pub third: Vec<RawRecord>,
}

impl RankRecords {
    pub fn get(&self, rank: Rank) -> &[RawRecord] {
        match rank {
            Rank::First => &self.first,
            Rank::Second => &self.second,
            Rank::Third => &self.third,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty() && self.second.is_empty() && self.third.is_empty()
    }
}

/// Takes the first `N` values of `record`, sorted. `None` when the record is
/// too short, out of range or holds a repeated number.
pub fn normalize<const N: usize>(record: &[i64]) -> Option<[u8; N]> {
    if record.len() < N {
        return None;
    }
    let mut out = [0u8; N];
    for (slot, &value) in out.iter_mut().zip(record) {
        let n = u8::try_from(value).ok().filter(|&n| is_valid_number(n))?;
        *slot = n;
    }
    out.sort();
    if out.windows(2).any(|w| w[0] == w[1]) {
        return None;
    }
    Some(out)
}

/// The six five-number subsets of a ticket, each sorted.
pub fn five_subsets(numbers: &Combination) -> [SubsetKey; PICK_COUNT] {
    let mut sorted = *numbers;
    sorted.sort();
    let mut subsets = [[0u8; SUBSET_LEN]; PICK_COUNT];
    for (skip, subset) in subsets.iter_mut().enumerate() {
        let mut k = 0;
        for (i, &n) in sorted.iter().enumerate() {
            if i != skip {
                subset[k] = n;
                k += 1;
            }
        }
    }
    subsets
}

/// Rank-2 and rank-3 entries implied by one draw.
pub fn derive_ranks_2_and_3(
    numbers: &Combination,
    bonus: u8,
    rule: DerivationRule,
) -> (Vec<Combination>, Vec<SubsetKey>) {
    let subsets = five_subsets(numbers);
    match rule {
        DerivationRule::Corrected => {
            let second: Vec<Combination> = subsets
                .iter()
                .map(|subset| {
                    let mut ticket = [bonus; PICK_COUNT];
                    ticket[..SUBSET_LEN].copy_from_slice(subset);
                    ticket.sort();
                    ticket
                })
                .collect();
            (second, subsets.to_vec())
        }
        DerivationRule::Legacy => {
            let third: Vec<SubsetKey> = subsets
                .iter()
                .filter(|subset| !subset.contains(&bonus))
                .copied()
                .collect();
            (Vec::new(), third)
        }
    }
}

/// Immutable once built; share it through [`SharedIndex`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchIndex {
    first: HashSet<Combination>,
    second: HashSet<Combination>,
    third: HashSet<SubsetKey>,
}

impl MatchIndex {
    pub fn from_draws(draws: &[Draw], rule: DerivationRule) -> Self {
        let mut index = Self::default();
        for draw in draws {
            index.add_draw(draw, rule);
        }
        debug!(
            "Index built from {} draws: {} / {} / {} entries",
            draws.len(),
            index.first.len(),
            index.second.len(),
            index.third.len()
        );
        index
    }

    pub fn from_records(records: &RankRecords) -> Self {
        let mut index = Self::default();
        for rank in Rank::ALL {
            index.add_records(rank, records.get(rank));
        }
        index
    }

    pub fn add_draw(&mut self, draw: &Draw, rule: DerivationRule) {
        let numbers = draw.sorted_numbers();
        let (second, third) = derive_ranks_2_and_3(&numbers, draw.bonus, rule);
        self.first.insert(numbers);
        self.second.extend(second);
        self.third.extend(third);
    }

    /// Normalizes and inserts raw records for `rank`. Malformed records are
    /// skipped; returns how many were.
    pub fn add_records(&mut self, rank: Rank, records: &[RawRecord]) -> usize {
        let mut skipped = 0;
        for record in records {
            let inserted = match rank {
                Rank::First => normalize::<PICK_COUNT>(record).map(|c| self.first.insert(c)),
                Rank::Second => normalize::<PICK_COUNT>(record).map(|c| self.second.insert(c)),
                Rank::Third => normalize::<SUBSET_LEN>(record).map(|c| self.third.insert(c)),
            };
            if inserted.is_none() {
                skipped += 1;
            }
        }
        if skipped > 0 {
            warn!("{}: skipped {} malformed records out of {}", rank, skipped, records.len());
        }
        skipped
    }

    pub fn merge(&mut self, other: &MatchIndex) {
        self.first.extend(other.first.iter().copied());
        self.second.extend(other.second.iter().copied());
        self.third.extend(other.third.iter().copied());
    }

    pub fn len(&self, rank: Rank) -> usize {
        match rank {
            Rank::First => self.first.len(),
            Rank::Second => self.second.len(),
            Rank::Third => self.third.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty() && self.second.is_empty() && self.third.is_empty()
    }

    pub fn contains(&self, rank: Rank, combination: &Combination) -> bool {
        match rank {
            Rank::First => self.first.contains(combination),
            Rank::Second => self.second.contains(combination),
            Rank::Third => five_subsets(combination)
                .iter()
                .any(|subset| self.third.contains(subset)),
        }
    }

    /// First rank of `ranks` at which `combination` already won.
    pub fn matching_rank(&self, combination: &Combination, ranks: &[Rank]) -> Option<Rank> {
        ranks
            .iter()
            .copied()
            .find(|&rank| self.contains(rank, combination))
    }

    /// Entries of one rank as plain records, sorted for stable output.
    pub fn records(&self, rank: Rank) -> Vec<RawRecord> {
        fn widen<const N: usize>(set: &HashSet<[u8; N]>) -> Vec<RawRecord> {
            let mut rows: Vec<RawRecord> = set
                .iter()
                .map(|entry| entry.iter().map(|&n| i64::from(n)).collect())
                .collect();
            rows.sort();
            rows
        }
        match rank {
            Rank::First => widen(&self.first),
            Rank::Second => widen(&self.second),
            Rank::Third => widen(&self.third),
        }
    }
}

/// Holder of the current index snapshot. Rebuilds swap in a whole new index;
/// readers keep whichever snapshot they cloned.
#[derive(Debug, Default)]
pub struct SharedIndex {
    current: RwLock<Arc<MatchIndex>>,
}

impl SharedIndex {
    pub fn new(index: MatchIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    pub fn snapshot(&self) -> Arc<MatchIndex> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Installs `index` and returns the snapshot it replaced.
    pub fn replace(&self, index: MatchIndex) -> Arc<MatchIndex> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(index))
    }
}
