//! Legacy JSON history files: one object per file, holding its rank under a
//! `rank1`/`rank2`/`rank3` key as an array of number arrays.

use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};
use serde_json::{Map, Value};

use crate::index::{MatchIndex, Rank, RankRecords, RawRecord};

pub const RANK1_FILE: &str = "winning_numbers_full.json";
pub const RANK2_FILE: &str = "winning_numbers_rank2.json";
pub const RANK3_FILE: &str = "winning_numbers_rank3.json";

pub fn rank_key(rank: Rank) -> &'static str {
    match rank {
        Rank::First => "rank1",
        Rank::Second => "rank2",
        Rank::Third => "rank3",
    }
}

pub fn rank_file(rank: Rank) -> &'static str {
    match rank {
        Rank::First => RANK1_FILE,
        Rank::Second => RANK2_FILE,
        Rank::Third => RANK3_FILE,
    }
}

pub fn try_load_rank_records(path: &Path, key: &str) -> Result<Vec<RawRecord>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {:?}", path))?;
    let object: Map<String, Value> = serde_json::from_str(&json)
        .with_context(|| format!("{:?} is not a JSON object", path))?;
    match object.get(key) {
        Some(rows) => serde_json::from_value(rows.clone())
            .with_context(|| format!("{:?}: '{}' is not a list of number lists", path, key)),
        None => {
            debug!("{:?} has no '{}' entry", path, key);
            Ok(Vec::new())
        }
    }
}

/// Like [`try_load_rank_records`], but an unreadable source only costs its
/// records: the failure is logged and an empty list returned.
pub fn load_rank_records(path: &Path, key: &str) -> Vec<RawRecord> {
    match try_load_rank_records(path, key) {
        Ok(records) => records,
        Err(e) => {
            warn!("History source unavailable, no exclusion from it: {:#}", e);
            Vec::new()
        }
    }
}

/// Loads the three conventional rank files from `dir`.
pub fn load_history_dir(dir: &Path) -> RankRecords {
    let load = |rank: Rank| load_rank_records(&dir.join(rank_file(rank)), rank_key(rank));
    RankRecords {
        first: load(Rank::First),
        second: load(Rank::Second),
        third: load(Rank::Third),
    }
}

pub fn export_rank_records(path: &Path, key: &str, records: &[RawRecord]) -> Result<()> {
    let mut object = Map::new();
    object.insert(key.to_string(), serde_json::to_value(records)?);
    let json = serde_json::to_string_pretty(&Value::Object(object))?;
    std::fs::write(path, json).with_context(|| format!("Cannot write {:?}", path))?;
    Ok(())
}

/// Writes every rank of `index` to the conventional files in `dir`.
pub fn export_history_dir(dir: &Path, index: &MatchIndex) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("Cannot create directory {:?}", dir))?;
    for rank in Rank::ALL {
        export_rank_records(&dir.join(rank_file(rank)), rank_key(rank), &index.records(rank))?;
    }
    Ok(())
}
