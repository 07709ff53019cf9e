//! Compute power indices for a formula stored as JSON.
//!
//! Run with:
//! ```bash
//! cargo run --example banzhaf -- --input formula.json --verify
//! ```

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use banzhaf_rs::brute;
use banzhaf_rs::circuit::{BooleanCircuit, CircuitConfig};
use banzhaf_rs::parse::parse_reader;
use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;

#[derive(Parser)]
#[command(author, version, about = "Banzhaf power indices via circuit compilation")]
struct Cli {
    /// Input file with a JSON formula
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Compilation budget in seconds
    #[arg(short, long, value_name = "SECS", default_value_t = 200.0)]
    timeout: f64,

    /// Cross-check the indices by brute-force enumeration
    #[arg(long)]
    verify: bool,

    /// Write the compiled circuit in DOT format
    #[arg(long, value_name = "FILE")]
    dot: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let cli = Cli::parse();

    log::info!("Loading formula from {:?}", cli.input);
    let (formula, names) = parse_reader(File::open(&cli.input)?)?;
    log::info!("Loaded formula over {} variables", names.len());

    let config = CircuitConfig::default().with_timeout(Duration::from_secs_f64(cli.timeout));
    let mut circuit = BooleanCircuit::new(&formula, &config)?;
    circuit.label_with(&names);

    if let Some(path) = &cli.dot {
        std::fs::write(path, circuit.to_dot()?)?;
        log::info!("Circuit written to {:?}", path);
    }

    for (label, index) in circuit.banzhaf_values() {
        println!("{}\t{}", label, index);
    }

    if cli.verify && formula.var_count() > brute::MAX_VARS {
        log::warn!(
            "Skipping verification: {} variables, enumeration handles at most {}",
            formula.var_count(),
            brute::MAX_VARS
        );
    } else if cli.verify {
        log::info!("Verifying against brute-force enumeration...");
        let k = circuit.arena().get(circuit.root().value).vars.len();
        let scale = if k < 100 { 2f64.powi(k as i32 - 1) } else { 0.5 };
        for (var, index) in circuit.power_indices() {
            let high = brute::probability(&formula, |w| if w == var { 1.0 } else { 0.5 });
            let low = brute::probability(&formula, |w| if w == var { 0.0 } else { 0.5 });
            let (Some(high), Some(low)) = (high, low) else {
                return Err(eyre!("Enumeration refused a formula over {} variables", formula.var_count()));
            };
            let expected = scale * (high - low);
            if (index - expected).abs() > 1e-6 * expected.abs().max(1.0) {
                return Err(eyre!(
                    "Mismatch for {}: circuit {} vs enumeration {}",
                    names.name(var).unwrap_or("?"),
                    index,
                    expected
                ));
            }
        }
        log::info!("All indices agree");
    }

    Ok(())
}
