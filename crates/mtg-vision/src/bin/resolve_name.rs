//! CLI tool to resolve card names against the card dictionary.
//! Usage: cargo run -p mtg-vision --features cli --bin resolve_name -- <data_dir> <name>...

use mtg_vision::{NameMatcher, NameResolution, DEFAULT_MIN_SCORE, STRICT_MIN_SCORE};
use std::path::PathBuf;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <data_dir> <name> [name...]", args[0]);
        std::process::exit(1);
    }

    let data_dir = PathBuf::from(&args[1]);
    let matcher = match NameMatcher::load(&data_dir) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Failed to load card dictionary: {:#}", e);
            std::process::exit(1);
        }
    };
    println!("Dictionary: {} card names", matcher.entry_count());

    for name in &args[2..] {
        println!("\n=== {:?} ===", name);
        for (label, min_score) in [("general", DEFAULT_MIN_SCORE), ("strict", STRICT_MIN_SCORE)] {
            match matcher.resolve(name, min_score) {
                NameResolution::Exact(entry) => {
                    println!("  {:<8} exact  -> {}", label, entry.display_name);
                }
                NameResolution::Fuzzy { entry, score } => {
                    println!("  {:<8} fuzzy  -> {} (score {:.3})", label, entry.display_name, score);
                }
                NameResolution::Unmatched => {
                    println!("  {:<8} no match at {:.2}", label, min_score);
                }
            }
        }
    }
}
