use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use smartpick_db::rusqlite::Connection;
use std::path::Path;

use smartpick_db::db::insert_draw;
use smartpick_db::models::{validate_draw, Draw, PICK_COUNT};

/// Accepts `DD/MM/YYYY`, `YYYY-MM-DD` or `YYYY.MM.DD`, returns ISO.
pub fn parse_date(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let date = ["%d/%m/%Y", "%Y-%m-%d", "%Y.%m.%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok());
    match date {
        Some(date) => Ok(date.format("%Y-%m-%d").to_string()),
        None => bail!("Invalid date: '{}'", raw),
    }
}

/// Columns: round, date, six main numbers, bonus.
fn parse_record(record: &csv::StringRecord) -> Result<Draw> {
    let get = |idx: usize| -> Result<String> {
        record
            .get(idx)
            .map(|s| s.trim().to_string())
            .with_context(|| format!("Missing field at index {}", idx))
    };

    let get_u8 = |idx: usize| -> Result<u8> {
        let s = get(idx)?;
        s.parse::<u8>()
            .with_context(|| format!("Cannot parse '{}' (index {})", s, idx))
    };

    let round_str = get(0)?;
    let round = round_str
        .parse::<u32>()
        .with_context(|| format!("Cannot parse round '{}'", round_str))?;
    let date = parse_date(&get(1)?)?;

    let mut numbers = [0u8; PICK_COUNT];
    for (i, slot) in numbers.iter_mut().enumerate() {
        *slot = get_u8(2 + i)?;
    }
    let bonus = get_u8(2 + PICK_COUNT)?;
    validate_draw(&numbers, bonus)?;

    Ok(Draw {
        round,
        date,
        numbers,
        bonus,
    })
}

pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path, delimiter: u8) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Cannot open {:?}", path))?;

    let tx = conn.unchecked_transaction()
        .context("Cannot start transaction")?;

    let mut result = ImportResult {
        total_records: 0,
        inserted: 0,
        skipped: 0,
        errors: 0,
    };

    for record_result in reader.records() {
        result.total_records += 1;
        match record_result {
            Ok(record) => {
                match parse_record(&record) {
                    Ok(draw) => {
                        match insert_draw(&tx, &draw) {
                            Ok(true) => result.inserted += 1,
                            Ok(false) => result.skipped += 1,
                            Err(e) => {
                                log::error!("Insert failed on line {}: {:#}", result.total_records, e);
                                result.errors += 1;
                            }
                        }
                    }
                    Err(e) => {
                        log::warn!("Parse error on line {}: {:#}", result.total_records, e);
                        result.errors += 1;
                    }
                }
            }
            Err(e) => {
                log::warn!("Read error on line {}: {}", result.total_records, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Commit failed")?;
    Ok(result)
}
