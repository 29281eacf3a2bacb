#![forbid(unsafe_code)]
//! PatientChain CLI - record patients, mine blocks and inspect the chain.

use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use patientchain::blockchain::Ledger;
use patientchain::config::{load_config, load_config_from, Config};
use patientchain::miner::{CancelToken, Miner};
use patientchain::record::Record;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Parser)]
#[command(name = "patientchain", version, about = "Tamper-evident patient record ledger")]
struct Args {
    /// Path to a TOML config file (defaults to ./patientchain.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the proof-of-work difficulty (leading hex zeros).
    #[arg(long)]
    difficulty: Option<u32>,

    /// Override the number of mining threads.
    #[arg(long)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add two patients, mine a block and print the chain.
    Demo,
    /// Mine `blocks` blocks, each carrying `records` generated patient entries.
    Mine {
        #[arg(long, default_value_t = 1)]
        blocks: u32,
        #[arg(long, default_value_t = 2)]
        records: u32,
    },
    /// Find the proof for a previous proof value.
    Proof { previous: u64 },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if let Some(difficulty) = args.difficulty {
        config.ledger.difficulty = difficulty;
    }
    if let Some(threads) = args.threads {
        config.miner.threads = threads;
    }
    config.validate()?;

    match args.command.unwrap_or(Command::Demo) {
        Command::Demo => run_demo(&config),
        Command::Mine { blocks, records } => run_mine(&config, blocks, records),
        Command::Proof { previous } => run_proof(&config, previous),
    }
}

fn run_demo(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::with_config(&config.ledger)?;
    let miner = Miner::from_config(&config.miner);

    println!("{}", "Adding patient data...".bright_cyan());
    ledger.add_patient_data("P001", "Surya", 30, "Fever")?;
    ledger.add_patient_data("P002", "Suresh", 40, "Common cold")?;

    let start_time = Instant::now();
    let block = ledger.mine_block_with(&miner, &CancelToken::new())?;
    let elapsed = start_time.elapsed();

    println!();
    println!("{}", "╔═══════════════════════════════════════════════╗".green());
    println!("{}", "║               ✅ NEW BLOCK MINED              ║".green().bold());
    println!("{}", "╚═══════════════════════════════════════════════╝".green());
    println!("{}", serde_json::to_string_pretty(&block)?);
    println!("{}", format!("Mining time: {:.3} seconds", elapsed.as_secs_f64()).dimmed());

    print_validity(&ledger);

    println!();
    println!("{}", "Full Blockchain:".bright_cyan().bold());
    for blk in ledger.blocks() {
        println!("{}", serde_json::to_string_pretty(blk)?);
    }
    Ok(())
}

fn run_mine(config: &Config, blocks: u32, records: u32) -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::with_config(&config.ledger)?;
    let miner = Miner::from_config(&config.miner);
    let cancel = CancelToken::new();

    let mut patient_seq = 0u32;
    for _ in 0..blocks {
        for _ in 0..records {
            patient_seq += 1;
            let id = format!("P{:03}", patient_seq);
            ledger.add_record(
                Record::patient(&id, &format!("Patient {}", patient_seq), 20 + patient_seq % 60, "Checkup"),
            )?;
        }
        let block = ledger.mine_block_with(&miner, &cancel)?;
        println!(
            "{} block #{} (proof {}, {} records)",
            "⛏️ ".yellow(),
            block.index,
            block.proof,
            block.data.len()
        );
    }

    print_chain_table(&ledger)?;
    print_validity(&ledger);
    Ok(())
}

fn run_proof(config: &Config, previous: u64) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = Ledger::with_config(&config.ledger)?;
    let miner = Miner::from_config(&config.miner);
    let proof = miner.mine(ledger.proof_of_work(), previous, &CancelToken::new())?;
    println!(
        "proof_of_work({}) = {} (difficulty {})",
        previous,
        proof.to_string().bright_green().bold(),
        ledger.proof_of_work().difficulty()
    );
    Ok(())
}

fn print_chain_table(ledger: &Ledger) -> Result<(), Box<dyn std::error::Error>> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Index").add_attribute(Attribute::Bold),
            Cell::new("Timestamp").add_attribute(Attribute::Bold),
            Cell::new("Records").add_attribute(Attribute::Bold),
            Cell::new("Proof").add_attribute(Attribute::Bold),
            Cell::new("Previous Hash").add_attribute(Attribute::Bold),
            Cell::new("Hash").add_attribute(Attribute::Bold),
        ]);

    for block in ledger.blocks() {
        table.add_row(vec![
            Cell::new(block.index),
            Cell::new(format!("{:.6}", block.timestamp)),
            Cell::new(block.data.len()),
            Cell::new(block.proof),
            Cell::new(short_hash(&block.previous_hash)),
            Cell::new(short_hash(&block.hash()?)),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn print_validity(ledger: &Ledger) {
    match ledger.validate_chain() {
        Ok(()) => println!("\nIs Blockchain valid? {}", "true".green().bold()),
        Err(e) => println!("\nIs Blockchain valid? {} ({})", "false".red().bold(), e),
    }
}

/// Abbreviates by characters; `previous_hash` may be any configured string.
fn short_hash(hash: &str) -> String {
    let chars: Vec<char> = hash.chars().collect();
    if chars.len() > 20 {
        let head: String = chars[..10].iter().collect();
        let tail: String = chars[chars.len() - 6..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        hash.to_string()
    }
}
