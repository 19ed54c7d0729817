use std::collections::BTreeSet;

use smartpick_db::models::{Draw, NumberStats, PICK_COUNT, POOL_SIZE};

use crate::index::Combination;

/// The last `window` draws of an oldest-first history, or all of them.
pub fn recent_window(draws: &[Draw], window: usize) -> &[Draw] {
    &draws[draws.len().saturating_sub(window)..]
}

/// Frequency and gap of every number over the window, indexed by `number - 1`.
pub fn compute_stats(draws: &[Draw], window: usize) -> Vec<NumberStats> {
    let recent = recent_window(draws, window);
    let mut stats: Vec<NumberStats> = (1..=POOL_SIZE)
        .map(|n| NumberStats {
            number: n,
            frequency: 0,
            gap: recent.len() as u32,
        })
        .collect();

    // Newest first, so the first sighting sets the gap.
    for (age, draw) in recent.iter().rev().enumerate() {
        for &n in &draw.numbers {
            let Some(stat) = (n as usize).checked_sub(1).and_then(|i| stats.get_mut(i)) else {
                continue;
            };
            if stat.frequency == 0 {
                stat.gap = age as u32;
            }
            stat.frequency += 1;
        }
    }

    stats
}

/// Numbers drawn at least once in the window.
pub fn hot_numbers(draws: &[Draw], window: usize) -> BTreeSet<u8> {
    recent_window(draws, window)
        .iter()
        .flat_map(|draw| draw.numbers)
        .collect()
}

/// Hot numbers by descending frequency, ties broken by the smaller gap then
/// the smaller number.
pub fn ranked_hot_numbers(draws: &[Draw], window: usize) -> Vec<NumberStats> {
    let mut ranked: Vec<NumberStats> = compute_stats(draws, window)
        .into_iter()
        .filter(|s| s.frequency > 0)
        .collect();
    ranked.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then(a.gap.cmp(&b.gap))
            .then(a.number.cmp(&b.number))
    });
    ranked
}

/// Hot-pick mode: the six highest-ranked hot numbers as one ticket.
pub fn hot_pick(draws: &[Draw], window: usize) -> Option<Combination> {
    let ranked = ranked_hot_numbers(draws, window);
    if ranked.len() < PICK_COUNT {
        return None;
    }
    let mut pick = [0u8; PICK_COUNT];
    for (slot, stat) in pick.iter_mut().zip(&ranked) {
        *slot = stat.number;
    }
    pick.sort();
    Some(pick)
}
