//! CLI for ansprache.
//!
//! Runs the proactive-conversation simulation, prints the default
//! configuration, and summarizes interaction logs. It is the operational
//! interface around the score engine.

mod driver;

use anyhow::{Context, Result};
use ansprache_core::record::read_jsonl;
use ansprache_core::{AgentConfig, ResponseSource, SimilarityTable};
use ansprache_feedback::AcceptanceAnalyzer;
use ansprache_scores::ProactiveAgent;
use clap::{Parser, Subcommand, ValueEnum};
use driver::{
    run_simulation, InteractiveResponder, RandomGate, ReplayResponder, SimulatedResponder,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the proposal/feedback simulation
    Simulate(SimulateArgs),
    /// Summarize an interaction log
    Report {
        /// JSONL interaction log written by `simulate --log`
        #[arg(long)]
        log: PathBuf,

        /// Minimum number of interactions before a report is produced
        #[arg(long, default_value = "10")]
        min_interactions: usize,
    },
    /// Print the default configuration as TOML
    InitConfig,
}

#[derive(clap::Args)]
struct SimulateArgs {
    /// Agent configuration (TOML); defaults to the built-in household catalog
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ability similarity table (nested JSON object)
    #[arg(long)]
    similarity: Option<PathBuf>,

    /// Number of cycles to run
    #[arg(long, default_value = "10")]
    cycles: usize,

    /// Seed for context sampling, gate, tie-breaks and simulated responses
    #[arg(long)]
    seed: Option<u64>,

    /// Timing gate threshold in [0, 1]; higher means the robot speaks less
    #[arg(long, default_value = "0.5", value_parser = parse_unit_interval)]
    threshold: f64,

    /// Where responses come from
    #[arg(long, value_enum, default_value = "interactive")]
    responder: Responder,

    /// Acceptance probability for the simulated responder
    #[arg(long, default_value = "0.5", value_parser = parse_unit_interval)]
    accept_probability: f64,

    /// JSONL log to replay responses from (with `--responder replay`)
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Append one JSONL interaction record per answered proposal
    #[arg(long)]
    log: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Responder {
    Interactive,
    Simulated,
    Replay,
}

fn parse_unit_interval(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("not a number: {e}"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is outside [0, 1]"))
    }
}

/// Independent RNG streams derived from one optional seed.
fn rng_for(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s.wrapping_add(stream)),
        None => StdRng::from_entropy(),
    }
}

fn load_config(path: Option<&Path>) -> Result<AgentConfig> {
    match path {
        Some(p) => AgentConfig::from_path(p)
            .with_context(|| format!("Failed to load config: {}", p.display())),
        None => Ok(AgentConfig::default()),
    }
}

fn load_similarity(path: Option<&Path>, config: &AgentConfig) -> Result<SimilarityTable> {
    match path {
        Some(p) => SimilarityTable::from_path(p)
            .with_context(|| format!("Failed to load similarity table: {}", p.display())),
        None => {
            warn!("no similarity table given; acceptance will not propagate to related abilities");
            SimilarityTable::uniform(&config.abilities, 0.0).context("Failed to build empty table")
        }
    }
}

fn load_records(path: &Path) -> Result<Vec<ansprache_core::InteractionRecord>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open log: {}", path.display()))?;
    read_jsonl(BufReader::new(file)).with_context(|| format!("Failed to parse log: {}", path.display()))
}

fn open_log(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log for writing: {}", path.display()))
}

fn simulate(args: SimulateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let similarity = load_similarity(args.similarity.as_deref(), &config)?;
    let contexts = config.contexts();

    let mut agent = ProactiveAgent::new(&config, similarity, rng_for(args.seed, 2))
        .context("Failed to initialize score table")?;
    let mut gate = RandomGate::new(args.threshold, rng_for(args.seed, 1));
    let mut sampler = rng_for(args.seed, 0);

    let mut responses: Box<dyn ResponseSource> = match args.responder {
        Responder::Interactive => Box::new(InteractiveResponder::new(
            BufReader::new(io::stdin()),
            io::stdout(),
        )),
        Responder::Simulated => Box::new(SimulatedResponder::new(
            args.accept_probability,
            rng_for(args.seed, 3),
        )?),
        Responder::Replay => {
            let path = args
                .replay
                .as_deref()
                .context("--responder replay requires --replay <PATH>")?;
            Box::new(ReplayResponder::from_records(&load_records(path)?))
        }
    };

    let mut log_file = args.log.as_deref().map(open_log).transpose()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    info!(
        contexts = contexts.len(),
        abilities = config.abilities.len(),
        cycles = args.cycles,
        "starting simulation"
    );
    let summary = run_simulation(
        &mut agent,
        &mut gate,
        responses.as_mut(),
        &contexts,
        &mut sampler,
        args.cycles,
        &mut out,
        log_file.as_mut().map(|f| f as &mut dyn Write),
    )?;

    writeln!(
        out,
        "Ran {} cycles: {} proposals ({} accepted, {} declined), held back {} times.",
        summary.cycles,
        summary.proposals(),
        summary.accepted,
        summary.rejected,
        summary.held_back
    )?;
    if summary.exhausted {
        writeln!(out, "Stopped early: no more responses.")?;
    }
    Ok(())
}

fn report(log: &Path, min_interactions: usize) -> Result<()> {
    let records = load_records(log)?;
    match AcceptanceAnalyzer::new(min_interactions).report(&records) {
        Some(report) => {
            serde_json::to_writer_pretty(io::stdout(), &report)?;
            println!();
        }
        None => println!(
            "Not enough interactions for a report ({} < {}).",
            records.len(),
            min_interactions
        ),
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate(args) => simulate(args)?,
        Commands::Report {
            log,
            min_interactions,
        } => report(&log, min_interactions)?,
        Commands::InitConfig => {
            print!("{}", AgentConfig::default_toml()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_interval_parser() {
        assert_eq!(parse_unit_interval("0.5"), Ok(0.5));
        assert_eq!(parse_unit_interval("1"), Ok(1.0));
        assert!(parse_unit_interval("1.1").is_err());
        assert!(parse_unit_interval("-0.1").is_err());
        assert!(parse_unit_interval("NaN").is_err());
        assert!(parse_unit_interval("half").is_err());
    }

    #[test]
    fn seeded_streams_are_reproducible_and_distinct() {
        use rand::Rng;
        let a: u64 = rng_for(Some(7), 0).gen();
        let b: u64 = rng_for(Some(7), 0).gen();
        let c: u64 = rng_for(Some(7), 1).gen();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn cli_parses_simulate_flags() {
        let cli = Cli::try_parse_from([
            "ansprache",
            "simulate",
            "--cycles",
            "3",
            "--responder",
            "simulated",
            "--seed",
            "1",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.cycles, 3);
                assert_eq!(args.responder, Responder::Simulated);
                assert_eq!(args.seed, Some(1));
                assert!((args.threshold - 0.5).abs() < f64::EPSILON);
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn replay_without_path_is_an_error() {
        let args = SimulateArgs {
            config: None,
            similarity: None,
            cycles: 1,
            seed: Some(0),
            threshold: 0.0,
            responder: Responder::Replay,
            accept_probability: 0.5,
            replay: None,
            log: None,
        };
        let err = simulate(args).unwrap_err();
        assert!(err.to_string().contains("--replay"));
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = load_config(Some(Path::new("/nonexistent/ansprache.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }
}
