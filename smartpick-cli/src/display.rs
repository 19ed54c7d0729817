use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::import::ImportResult;
use smartpick_core::{Batch, BatchStatus};
use smartpick_db::models::{Draw, NumberStats};

fn format_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("No draws to show.");
        return;
    }

    let mut table = new_table(vec!["Round", "Date", "Numbers", "Bonus"]);
    for draw in draws {
        table.add_row(vec![
            draw.round.to_string(),
            draw.date.clone(),
            format_numbers(&draw.sorted_numbers()),
            format!("{:2}", draw.bonus),
        ]);
    }

    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import finished:");
    println!("  Lines read         : {}", result.total_records);
    println!("  Inserted           : {}", result.inserted);
    println!("  Duplicates skipped : {}", result.skipped);
    if result.errors > 0 {
        println!("  Errors             : {}", result.errors);
    }
}

pub fn display_hot(ranked: &[NumberStats], pick: Option<&[u8]>, window: usize) {
    println!("\nHot numbers over the last {} draws\n", window);

    let mut table = new_table(vec!["Number", "Frequency", "Gap"]);
    for stat in ranked {
        table.add_row(vec![
            format!("{:2}", stat.number),
            stat.frequency.to_string(),
            stat.gap.to_string(),
        ]);
    }
    println!("{table}");

    match pick {
        Some(numbers) => println!("\nHot pick: {}", format_numbers(numbers)),
        None => println!("\nNot enough history for a hot pick."),
    }
}

pub fn display_batch(batch: &Batch) {
    if batch.combinations.is_empty() {
        println!("No combination found. Try loosening the filters.");
    } else {
        println!("\nRecommended combinations\n");
        let mut table = new_table(vec!["#", "Numbers"]);
        for (i, combination) in batch.combinations.iter().enumerate() {
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(format_numbers(combination)).fg(Color::Green),
            ]);
        }
        println!("{table}");
    }

    if batch.status == BatchStatus::Exhausted && !batch.combinations.is_empty() {
        println!(
            "Only {} of {} combinations satisfied the filters.",
            batch.combinations.len(),
            batch.requested
        );
    }

    if !batch.rejections.is_empty() {
        let rejected = batch
            .rejections
            .iter()
            .map(|(reason, count)| format!("{reason}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        println!("{} draws tried ({rejected})", batch.attempts);
    }
}
