//! Rejection sampling of 6/45 tickets under a [`FilterSpec`].
//!
//! Each attempt draws six distinct numbers uniformly, then runs the checks in
//! a fixed order: required, forbidden, historical ranks, hot numbers,
//! consecutive runs, duplicates within the batch. The first failing check is
//! recorded and the attempt is discarded. Sampling stops once `count` tickets
//! are accepted or `retry_budget` attempts were rejected.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::{debug, info};
use rand::seq::index::sample as sample_indices;
use rand::Rng;

use smartpick_db::models::{Draw, PICK_COUNT, POOL_SIZE};

use crate::config::SamplerConfig;
use crate::filter::{FilterError, FilterSpec};
use crate::hot::hot_numbers;
use crate::index::{Combination, MatchIndex, Rank};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rejection {
    MissingRequired,
    Forbidden,
    HistoricalMatch(Rank),
    HotNumber,
    ConsecutiveRun,
    Duplicate,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::MissingRequired => write!(f, "missing required number"),
            Rejection::Forbidden => write!(f, "forbidden number"),
            Rejection::HistoricalMatch(rank) => write!(f, "past {rank} win"),
            Rejection::HotNumber => write!(f, "hot number"),
            Rejection::ConsecutiveRun => write!(f, "consecutive run"),
            Rejection::Duplicate => write!(f, "duplicate in batch"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every requested ticket was produced.
    Complete,
    /// The retry budget ran out first.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub combinations: Vec<Combination>,
    pub requested: usize,
    pub status: BatchStatus,
    pub attempts: usize,
    pub rejections: BTreeMap<Rejection, usize>,
}

impl Batch {
    pub fn is_complete(&self) -> bool {
        self.status == BatchStatus::Complete
    }

    pub fn rejected(&self) -> usize {
        self.rejections.values().sum()
    }
}

/// Six distinct numbers drawn uniformly from 1..=45, sorted.
pub fn draw_candidate<R: Rng + ?Sized>(rng: &mut R) -> Combination {
    let mut candidate = [0u8; PICK_COUNT];
    let picks = sample_indices(rng, POOL_SIZE as usize, PICK_COUNT);
    for (slot, i) in candidate.iter_mut().zip(picks) {
        *slot = i as u8 + 1;
    }
    candidate.sort();
    candidate
}

/// True when `numbers` holds at least `min_len` consecutive integers.
pub fn has_consecutive_run(numbers: &[u8], min_len: usize) -> bool {
    let mut sorted = numbers.to_vec();
    sorted.sort();

    let mut streak = 1;
    if !sorted.is_empty() && streak >= min_len {
        return true;
    }
    for w in sorted.windows(2) {
        if w[0].checked_add(1) == Some(w[1]) {
            streak += 1;
            if streak >= min_len {
                return true;
            }
        } else {
            streak = 1;
        }
    }
    false
}

/// Per-call view of a validated spec.
struct Constraints<'a> {
    required: BTreeSet<u8>,
    forbidden: BTreeSet<u8>,
    ranks: Vec<Rank>,
    hot: BTreeSet<u8>,
    min_run: Option<usize>,
    index: &'a MatchIndex,
}

impl<'a> Constraints<'a> {
    fn new(spec: &FilterSpec, index: &'a MatchIndex, recent: &[Draw]) -> Self {
        Self {
            required: spec.required_set(),
            forbidden: spec.forbidden_set(),
            ranks: spec.excluded_ranks(),
            hot: spec
                .hot_window
                .map(|window| hot_numbers(recent, window))
                .unwrap_or_default(),
            min_run: spec.min_consecutive_run,
            index,
        }
    }

    fn check(&self, candidate: &Combination, accepted: &HashSet<Combination>) -> Option<Rejection> {
        if !self.required.iter().all(|n| candidate.contains(n)) {
            return Some(Rejection::MissingRequired);
        }
        if candidate.iter().any(|n| self.forbidden.contains(n)) {
            return Some(Rejection::Forbidden);
        }
        if let Some(rank) = self.index.matching_rank(candidate, &self.ranks) {
            return Some(Rejection::HistoricalMatch(rank));
        }
        if candidate.iter().any(|n| self.hot.contains(n)) {
            return Some(Rejection::HotNumber);
        }
        if let Some(min_run) = self.min_run {
            if has_consecutive_run(candidate, min_run) {
                return Some(Rejection::ConsecutiveRun);
            }
        }
        if accepted.contains(candidate) {
            return Some(Rejection::Duplicate);
        }
        None
    }
}

/// Generates up to `spec.count` distinct tickets.
///
/// `recent` is the rank-1 history, oldest first; only its tail is read when
/// `spec.hot_window` is set. Running out of budget is not an error: the
/// returned batch is marked [`BatchStatus::Exhausted`] and may be empty.
pub fn generate<R: Rng + ?Sized>(
    spec: &FilterSpec,
    index: &MatchIndex,
    recent: &[Draw],
    config: &SamplerConfig,
    rng: &mut R,
) -> Result<Batch, FilterError> {
    spec.validate()?;

    let constraints = Constraints::new(spec, index, recent);
    if !constraints.hot.is_empty() {
        debug!("Excluding {} hot numbers", constraints.hot.len());
    }

    // `count` is caller-controlled, so the batch grows on demand.
    let mut combinations: Vec<Combination> = Vec::new();
    let mut accepted: HashSet<Combination> = HashSet::new();
    let mut rejections: BTreeMap<Rejection, usize> = BTreeMap::new();
    let mut rejected = 0;
    let mut attempts = 0;

    while combinations.len() < spec.count && rejected < config.retry_budget {
        attempts += 1;
        let candidate = draw_candidate(rng);
        match constraints.check(&candidate, &accepted) {
            Some(reason) => {
                *rejections.entry(reason).or_insert(0) += 1;
                rejected += 1;
            }
            None => {
                accepted.insert(candidate);
                combinations.push(candidate);
            }
        }
    }

    let status = if combinations.len() == spec.count {
        BatchStatus::Complete
    } else {
        info!(
            "Retry budget of {} exhausted with {}/{} combinations",
            config.retry_budget,
            combinations.len(),
            spec.count
        );
        BatchStatus::Exhausted
    };

    Ok(Batch {
        combinations,
        requested: spec.count,
        status,
        attempts,
        rejections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::DerivationRule;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn draw(round: u32, numbers: [u8; 6], bonus: u8) -> Draw {
        Draw {
            round,
            date: String::new(),
            numbers,
            bonus,
        }
    }

    fn run(spec: &FilterSpec, index: &MatchIndex, recent: &[Draw], seed: u64) -> Batch {
        let mut rng = StdRng::seed_from_u64(seed);
        generate(spec, index, recent, &SamplerConfig::default(), &mut rng).unwrap()
    }

    #[test]
    fn test_draw_candidate_is_valid() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..500 {
            let c = draw_candidate(&mut rng);
            assert!(c.windows(2).all(|w| w[0] < w[1]), "not strictly sorted: {:?}", c);
            assert!(c.iter().all(|&n| (1..=45).contains(&n)));
        }
    }

    #[test]
    fn test_consecutive_run() {
        assert!(has_consecutive_run(&[5, 6, 19, 27, 33, 40], 2));
        assert!(!has_consecutive_run(&[5, 6, 19, 27, 33, 40], 3));
        assert!(has_consecutive_run(&[40, 3, 2, 1, 20, 30], 3));
        assert!(!has_consecutive_run(&[1, 3, 5, 7, 9, 11], 2));
        // A break resets the streak.
        assert!(!has_consecutive_run(&[1, 2, 4, 5, 7, 8], 3));
        assert!(!has_consecutive_run(&[], 2));
    }

    #[test]
    fn test_batch_is_complete_and_unique() {
        let spec = FilterSpec {
            count: 50,
            ..FilterSpec::default()
        };
        let batch = run(&spec, &MatchIndex::default(), &[], 7);

        assert!(batch.is_complete());
        assert_eq!(batch.combinations.len(), 50);
        let unique: BTreeSet<_> = batch.combinations.iter().collect();
        assert_eq!(unique.len(), 50);
    }

    #[test]
    fn test_required_and_forbidden() {
        let spec = FilterSpec {
            required: vec![17],
            forbidden: vec![1, 2, 3, 4, 5, 44, 45],
            count: 20,
            ..FilterSpec::default()
        };
        let batch = run(&spec, &MatchIndex::default(), &[], 11);

        assert_eq!(batch.combinations.len(), 20);
        for c in &batch.combinations {
            assert!(c.contains(&17), "{:?} misses 17", c);
            assert!(!c.iter().any(|n| spec.forbidden.contains(n)), "{:?} holds a forbidden number", c);
        }
    }

    #[test]
    fn test_too_many_required_is_an_input_error() {
        let spec = FilterSpec {
            required: vec![1, 2],
            ..FilterSpec::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let result = generate(&spec, &MatchIndex::default(), &[], &SamplerConfig::default(), &mut rng);
        assert_eq!(result, Err(FilterError::TooManyRequired(2)));
    }

    fn check_with(spec: &FilterSpec, index: &MatchIndex, candidate: Combination) -> Option<Rejection> {
        Constraints::new(spec, index, &[]).check(&candidate, &HashSet::new())
    }

    #[test]
    fn test_check_rejects_past_wins_by_rank() {
        let index = MatchIndex::from_draws(
            &[draw(1, [7, 11, 22, 23, 24, 36], 40)],
            DerivationRule::Corrected,
        );
        let spec = FilterSpec::default();

        assert_eq!(
            check_with(&spec, &index, [7, 11, 22, 23, 24, 36]),
            Some(Rejection::HistoricalMatch(Rank::First))
        );
        assert_eq!(
            check_with(&spec, &index, [7, 11, 22, 23, 36, 40]),
            Some(Rejection::HistoricalMatch(Rank::Second))
        );
        assert_eq!(
            check_with(&spec, &index, [1, 7, 11, 22, 23, 36]),
            Some(Rejection::HistoricalMatch(Rank::Third))
        );
        assert_eq!(check_with(&spec, &index, [1, 7, 11, 22, 23, 37]), None);
    }

    #[test]
    fn test_check_only_uses_excluded_ranks() {
        let index = MatchIndex::from_draws(
            &[draw(1, [7, 11, 22, 23, 24, 36], 40)],
            DerivationRule::Corrected,
        );
        let spec = FilterSpec {
            exclude_ranks: vec![Rank::Second],
            ..FilterSpec::default()
        };
        assert_eq!(check_with(&spec, &index, [7, 11, 22, 23, 24, 36]), None);
        assert_eq!(check_with(&spec, &index, [1, 7, 11, 22, 23, 36]), None);

        let spec = FilterSpec {
            exclude_ranks: Vec::new(),
            ..FilterSpec::default()
        };
        assert_eq!(check_with(&spec, &index, [7, 11, 22, 23, 36, 40]), None);
    }

    #[test]
    fn test_legacy_rule_never_rejects_rank_two() {
        let index = MatchIndex::from_draws(
            &[draw(1, [7, 11, 22, 23, 24, 36], 40)],
            DerivationRule::Legacy,
        );
        let spec = FilterSpec {
            exclude_ranks: vec![Rank::First, Rank::Second],
            ..FilterSpec::default()
        };
        assert_eq!(check_with(&spec, &index, [7, 11, 22, 23, 36, 40]), None);

        // The five shared main numbers still count as a rank-3 match.
        let spec = FilterSpec::default();
        assert_eq!(
            check_with(&spec, &index, [7, 11, 22, 23, 36, 40]),
            Some(Rejection::HistoricalMatch(Rank::Third))
        );
    }

    #[test]
    fn test_check_order_and_duplicates() {
        let spec = FilterSpec {
            required: vec![2],
            forbidden: vec![3],
            min_consecutive_run: Some(2),
            ..FilterSpec::default()
        };
        let index = MatchIndex::default();
        let constraints = Constraints::new(&spec, &index, &[]);
        let none = HashSet::new();

        assert_eq!(constraints.check(&[3, 10, 20, 30, 40, 45], &none), Some(Rejection::MissingRequired));
        assert_eq!(constraints.check(&[2, 3, 20, 30, 40, 45], &none), Some(Rejection::Forbidden));
        assert_eq!(constraints.check(&[2, 10, 11, 30, 40, 45], &none), Some(Rejection::ConsecutiveRun));
        let ticket = [2, 10, 20, 30, 40, 45];
        assert_eq!(constraints.check(&ticket, &none), None);
        assert_eq!(constraints.check(&ticket, &HashSet::from([ticket])), Some(Rejection::Duplicate));
    }

    #[test]
    fn test_rank_three_exclusion_during_generation() {
        // Every five-number set holding both 1 and 2 counts as a past rank-3 win,
        // so no ticket may hold the pair.
        let mut records = Vec::new();
        for a in 3..=45i64 {
            for b in (a + 1)..=45 {
                for c in (b + 1)..=45 {
                    records.push(vec![1, 2, a, b, c]);
                }
            }
        }
        let mut index = MatchIndex::default();
        index.add_records(Rank::Third, &records);

        let spec = FilterSpec {
            required: vec![1],
            exclude_ranks: vec![Rank::Third],
            count: 100,
            ..FilterSpec::default()
        };
        let batch = run(&spec, &index, &[], 17);

        assert_eq!(batch.combinations.len(), 100);
        for c in &batch.combinations {
            assert!(c.contains(&1));
            assert!(!c.contains(&2), "{:?} matches a past rank-3 win", c);
        }
        assert!(batch.rejections[&Rejection::HistoricalMatch(Rank::Third)] > 0);
    }

    #[test]
    fn test_hot_numbers_excluded() {
        let recent = vec![
            draw(1, [1, 2, 3, 4, 5, 6], 7),
            draw(2, [10, 11, 12, 13, 14, 15], 16),
        ];
        let spec = FilterSpec {
            hot_window: Some(1),
            count: 30,
            ..FilterSpec::default()
        };
        let batch = run(&spec, &MatchIndex::default(), &recent, 21);

        assert_eq!(batch.combinations.len(), 30);
        for c in &batch.combinations {
            assert!(!c.iter().any(|n| (10..=15).contains(n)), "{:?} holds a hot number", c);
        }
    }

    #[test]
    fn test_consecutive_runs_excluded() {
        let spec = FilterSpec {
            min_consecutive_run: Some(2),
            count: 30,
            ..FilterSpec::default()
        };
        let batch = run(&spec, &MatchIndex::default(), &[], 13);

        assert_eq!(batch.combinations.len(), 30);
        for c in &batch.combinations {
            assert!(!has_consecutive_run(c, 2), "{:?} holds a run", c);
        }
    }

    #[test]
    fn test_unsatisfiable_spec_terminates() {
        let spec = FilterSpec {
            required: vec![9],
            forbidden: vec![9],
            ..FilterSpec::default()
        };
        let config = SamplerConfig {
            retry_budget: 1_000,
            ..SamplerConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let batch = generate(&spec, &MatchIndex::default(), &[], &config, &mut rng).unwrap();

        assert!(batch.combinations.is_empty());
        assert_eq!(batch.status, BatchStatus::Exhausted);
        assert_eq!(batch.rejected(), 1_000);
        assert_eq!(batch.attempts, 1_000);
    }

    #[test]
    fn test_huge_count_runs_out_of_budget() {
        let spec = FilterSpec {
            required: vec![9],
            forbidden: vec![9],
            count: usize::MAX,
            ..FilterSpec::default()
        };
        assert!(spec.validate().is_ok());
        let config = SamplerConfig {
            retry_budget: 10,
            ..SamplerConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let batch = generate(&spec, &MatchIndex::default(), &[], &config, &mut rng).unwrap();

        assert!(batch.combinations.is_empty());
        assert_eq!(batch.requested, usize::MAX);
        assert_eq!(batch.status, BatchStatus::Exhausted);
    }

    #[test]
    fn test_large_batch_stays_unique() {
        let spec = FilterSpec {
            exclude_ranks: Vec::new(),
            count: 20_000,
            ..FilterSpec::default()
        };
        let batch = run(&spec, &MatchIndex::default(), &[], 5);

        assert!(batch.is_complete());
        let unique: HashSet<_> = batch.combinations.iter().collect();
        assert_eq!(unique.len(), 20_000);
        assert_eq!(batch.attempts, 20_000 + batch.rejected());
    }

    #[test]
    fn test_zero_budget_returns_empty() {
        let config = SamplerConfig {
            retry_budget: 0,
            ..SamplerConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let batch = generate(&FilterSpec::default(), &MatchIndex::default(), &[], &config, &mut rng).unwrap();
        assert!(batch.combinations.is_empty());
        assert!(!batch.is_complete());
    }

    #[test]
    fn test_seed_determinism() {
        let spec = FilterSpec::default();
        let a = run(&spec, &MatchIndex::default(), &[], 123);
        let b = run(&spec, &MatchIndex::default(), &[], 123);
        assert_eq!(a.combinations, b.combinations);
    }
}
