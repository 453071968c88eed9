//! mold-rules: Validate a rules file before deploying it
//!
//! Classification itself never fails - overlapping configuration is resolved
//! by the fixed precedence order. This tool exists so colliding group keys
//! and duplicate group memberships surface at setup time instead of being
//! papered over at request time.
//!
//! Usage:
//!   mold-rules rules.json

use anyhow::{Context, Result};
use clap::Parser;
use mold::cast::RulesProfile;

#[derive(Parser, Debug)]
#[command(name = "mold-rules")]
#[command(about = "Validate a mold rules file", long_about = None)]
struct Args {
    /// Rules file to check
    #[arg(value_name = "FILE")]
    rules: String,

    /// Only print issues, no summary
    #[arg(long, short = 'q')]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let content = std::fs::read_to_string(&args.rules)
        .context(format!("Failed to read rules file: {}", args.rules))?;
    let profile: RulesProfile = serde_json::from_str(&content)
        .context(format!("Failed to parse rules file: {}", args.rules))?;

    let type_count = profile.types.len();
    let compiled = profile.compile();
    let issues = compiled.check();

    if !args.quiet {
        println!("=== Rules Check: {} ===\n", args.rules);
        println!("Record types with overrides: {}", type_count);
        println!("Issues found: {}\n", issues.len());
    }

    for issue in &issues {
        println!("{}", issue);
    }

    if issues.is_empty() {
        if !args.quiet {
            println!("OK");
        }
        Ok(())
    } else {
        std::process::exit(1);
    }
}
