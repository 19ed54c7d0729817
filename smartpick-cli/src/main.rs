mod display;
mod import;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::display::{display_batch, display_draws, display_hot, display_import_summary};
use crate::import::parse_date;
use smartpick_core::hot::{hot_pick, ranked_hot_numbers};
use smartpick_core::source::{export_history_dir, load_history_dir};
use smartpick_core::{generate, DerivationRule, FilterError, FilterSpec, MatchIndex, Rank, SamplerConfig};
use smartpick_db::db::{count_draws, db_path, fetch_all_draws, fetch_last_draws, insert_draw, migrate, open_db};
use smartpick_db::models::{validate_draw, Draw, PICK_COUNT};
use smartpick_db::rusqlite::Connection;

#[derive(Parser)]
#[command(name = "smartpick", about = "6/45 lottery picks that skip past rank 1-3 wins")]
struct Cli {
    /// Database file (default: data/smartpick.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import draws from a CSV file (round, date, n1..n6, bonus)
    Import {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = ";")]
        delimiter: char,
    },

    /// Print the database path
    DbPath,

    /// List the latest draws
    List {
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Rank the hot numbers of the recent draws
    Hot {
        #[arg(short, long, default_value = "10")]
        window: usize,
    },

    /// Recommend combinations
    Generate(GenerateArgs),

    /// Write the rank 1-3 history as legacy JSON files
    Export {
        #[arg(short, long, default_value = "static")]
        dir: PathBuf,
    },

    /// Add a draw by hand
    Add,
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Number every combination must contain
    #[arg(short, long)]
    include: Vec<u8>,

    /// Numbers no combination may contain (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    exclude: Vec<u8>,

    /// Ranks whose past wins are excluded (comma separated)
    #[arg(short, long, value_delimiter = ',', default_value = "1,2,3")]
    ranks: Vec<u8>,

    /// Skip numbers drawn in this many recent draws
    #[arg(long)]
    hot_window: Option<usize>,

    /// Skip combinations with a run of this many consecutive numbers
    #[arg(long)]
    max_run: Option<usize>,

    #[arg(short, long, default_value = "5")]
    count: usize,

    /// Seed for reproducible picks
    #[arg(long)]
    seed: Option<u64>,

    /// JSON filter spec; replaces the filter flags above
    #[arg(long)]
    filter: Option<PathBuf>,

    /// JSON sampler config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the retry budget
    #[arg(long)]
    budget: Option<usize>,

    /// Derive rank 2 the way the legacy web app did (never populated)
    #[arg(long)]
    legacy_rank2: bool,

    /// Directory with legacy JSON rank files to exclude as well
    #[arg(long)]
    legacy_dir: Option<PathBuf>,
}

impl GenerateArgs {
    fn filter_spec(&self) -> Result<FilterSpec> {
        if let Some(path) = &self.filter {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read filter {:?}", path))?;
            return serde_json::from_str(&json)
                .with_context(|| format!("Invalid filter {:?}", path));
        }
        let exclude_ranks = self
            .ranks
            .iter()
            .map(|&r| Rank::try_from(r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FilterSpec {
            required: self.include.clone(),
            forbidden: self.exclude.clone(),
            exclude_ranks,
            hot_window: self.hot_window,
            min_consecutive_run: self.max_run,
            count: self.count,
        })
    }

    fn sampler_config(&self) -> Result<SamplerConfig> {
        let mut config = match &self.config {
            Some(path) => SamplerConfig::load(path)?,
            None => SamplerConfig::default(),
        };
        if let Some(budget) = self.budget {
            config.retry_budget = budget;
        }
        if self.legacy_rank2 {
            config.derivation_rule = DerivationRule::Legacy;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let path = cli.db.unwrap_or_else(db_path);
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file, delimiter } => cmd_import(&conn, &file, delimiter),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last),
        Command::Hot { window } => cmd_hot(&conn, window),
        Command::Generate(args) => cmd_generate(&conn, &args),
        Command::Export { dir } => cmd_export(&conn, &dir),
        Command::Add => cmd_add(&conn),
    }
}

fn cmd_import(conn: &Connection, file: &Path, delimiter: char) -> Result<()> {
    if !delimiter.is_ascii() {
        bail!("Delimiter must be a single ASCII character");
    }
    let result = import::import_csv(conn, file, delimiter as u8)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    let n = count_draws(conn)?;
    if n == 0 {
        println!("Empty database. Run first: smartpick import --file <csv>");
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_hot(conn: &Connection, window: usize) -> Result<()> {
    if window == 0 {
        return Err(FilterError::ZeroHotWindow.into());
    }
    let draws = fetch_all_draws(conn)?;
    if draws.is_empty() {
        println!("Empty database. Run first: smartpick import --file <csv>");
        return Ok(());
    }
    let effective_window = window.min(draws.len());
    let ranked = ranked_hot_numbers(&draws, effective_window);
    let pick = hot_pick(&draws, effective_window);
    display_hot(&ranked, pick.as_ref().map(|p| p.as_slice()), effective_window);
    Ok(())
}

/// History read failures only cost the exclusion, never the generation.
fn load_history(conn: &Connection) -> Vec<Draw> {
    match fetch_all_draws(conn) {
        Ok(draws) => draws,
        Err(e) => {
            log::warn!("Draw history unavailable, generating without it: {:#}", e);
            Vec::new()
        }
    }
}

fn cmd_generate(conn: &Connection, args: &GenerateArgs) -> Result<()> {
    let spec = args.filter_spec()?;
    let config = args.sampler_config()?;

    let draws = load_history(conn);
    let mut index = MatchIndex::from_draws(&draws, config.derivation_rule);
    if let Some(dir) = &args.legacy_dir {
        index.merge(&MatchIndex::from_records(&load_history_dir(dir)));
    }
    log::info!(
        "Excluding against {} draws ({} / {} / {} entries)",
        draws.len(),
        index.len(Rank::First),
        index.len(Rank::Second),
        index.len(Rank::Third)
    );

    let mut rng: StdRng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    let batch = generate(&spec, &index, &draws, &config, &mut rng)
        .context("Invalid filter")?;
    display_batch(&batch);
    Ok(())
}

fn cmd_export(conn: &Connection, dir: &Path) -> Result<()> {
    let draws = fetch_all_draws(conn)?;
    let index = MatchIndex::from_draws(&draws, DerivationRule::Corrected);
    export_history_dir(dir, &index)?;
    println!(
        "Exported {} draws to {} ({} / {} / {} entries)",
        draws.len(),
        dir.display(),
        index.len(Rank::First),
        index.len(Rank::Second),
        index.len(Rank::Third)
    );
    Ok(())
}

fn cmd_add(conn: &Connection) -> Result<()> {
    println!("Add a draw by hand\n");

    let round: u32 = prompt("Round (e.g. 1100): ")?
        .parse()
        .context("Invalid round")?;
    let date = parse_date(&prompt("Date (DD/MM/YYYY): ")?)?;
    let (numbers, bonus) = prompt_numbers()?;

    let draw = Draw {
        round,
        date,
        numbers,
        bonus,
    };

    println!("\nDraw to insert:");
    display_draws(std::slice::from_ref(&draw));

    let confirm = prompt("\nConfirm insert? (y/n): ")?;
    if confirm.trim().eq_ignore_ascii_case("y") {
        if insert_draw(conn, &draw)? {
            println!("Draw inserted.");
        } else {
            println!("This round already exists (duplicate ignored).");
        }
    } else {
        println!("Insert cancelled.");
    }

    Ok(())
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Read error")?;
    Ok(input.trim().to_string())
}

fn prompt_numbers() -> Result<([u8; PICK_COUNT], u8)> {
    loop {
        let input = prompt("6 numbers then the bonus (space separated, 1-45): ")?;
        let nums: Result<Vec<u8>, _> = input.split_whitespace().map(|s| s.parse::<u8>()).collect();
        match nums {
            Ok(v) if v.len() == PICK_COUNT + 1 => {
                let mut numbers = [0u8; PICK_COUNT];
                numbers.copy_from_slice(&v[..PICK_COUNT]);
                let bonus = v[PICK_COUNT];
                match validate_draw(&numbers, bonus) {
                    Ok(()) => return Ok((numbers, bonus)),
                    Err(e) => println!("{e}. Try again."),
                }
            }
            _ => println!("Enter exactly 7 numbers. Try again."),
        }
    }
}
