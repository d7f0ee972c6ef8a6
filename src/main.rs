//! Scanner maintenance CLI.
//! Usage:
//!   mtg-scanner check <data_dir>
//!   mtg-scanner collection <data_dir>
//!   mtg-scanner remove <data_dir> <id>

use anyhow::{bail, Context, Result};
use mtg_scanner_lib::Scanner;
use std::path::PathBuf;

fn main() {
    mtg_scanner_lib::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    let (Some(command), Some(data_dir)) = (args.get(1), args.get(2)) else {
        bail!(
            "Usage: {} <check|collection|remove> <data_dir> [id]",
            args.first().map(String::as_str).unwrap_or("mtg-scanner")
        );
    };
    let scanner = Scanner::open(&PathBuf::from(data_dir))?;

    match command.as_str() {
        "check" => {
            let config = scanner.config();
            println!("Data directory: {}", scanner.data_dir().display());
            println!("Dictionary: {} card names", scanner.matcher().entry_count());
            println!(
                "Match score: {:.2} ({})",
                config.match_score(),
                if config.strict_matching { "strict" } else { "general" }
            );
            println!(
                "Frame interval: {:?}, cache freshness: {:?}",
                config.frame_interval(),
                config.cache_freshness()
            );
            println!("Collection: {} cards", scanner.collection()?.len());
        }
        "collection" => {
            for card in scanner.collection()? {
                println!(
                    "#{:<4} {:<32} {:<6} {:<10} {}%",
                    card.id,
                    card.name,
                    card.set_code.as_deref().unwrap_or("-"),
                    card.rarity.as_deref().unwrap_or("-"),
                    card.confidence
                );
            }
        }
        "remove" => {
            let id: u64 = args
                .get(3)
                .context("remove needs a card id")?
                .parse()
                .context("card id must be a number")?;
            match scanner.remove_from_collection(id)? {
                Some(card) => println!("Removed #{} {}", id, card.name),
                None => println!("No card #{}", id),
            }
        }
        other => bail!("Unknown command {:?}", other),
    }
    Ok(())
}
