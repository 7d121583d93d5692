//! auctionbench CLI
//!
//! A command-line tool for driving emulated user sessions against an
//! auction web application.

use auctionbench_harness::{
    Backend, Harness, HarnessConfig, HttpIssuer, NoopIssuer, PhaseConfig, RequestIssuer,
};
use auctionbench_model::{ThinkTime, TransitionTable};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "auctionbench")]
#[command(about = "Session-emulation load generator for auction sites")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a transition table and print its states
    Check {
        /// Path to the transition table file
        table: PathBuf,
    },

    /// Run the benchmark against a target site
    Run {
        /// Path to the transition table file
        #[arg(short, long)]
        table: PathBuf,

        /// Base URL of the site under test
        #[arg(short, long, required_unless_present = "dry_run")]
        url: Option<String>,

        /// Application-server flavor (php, servlets, ejb)
        #[arg(long, default_value = "php")]
        backend: String,

        /// Number of concurrent emulated users
        #[arg(short, long, default_value = "100")]
        sessions: usize,

        /// Up-ramp length (e.g., "60s", "2m")
        #[arg(long, default_value = "60s")]
        up: humantime::Duration,

        /// Steady-state measurement length
        #[arg(short, long, default_value = "5m")]
        duration: humantime::Duration,

        /// Down-ramp length
        #[arg(long, default_value = "60s")]
        down: humantime::Duration,

        /// Think-time multiplier during the ramps
        #[arg(long, default_value = "10.0")]
        ramp_slowdown: f32,

        /// Think-time multiplier during steady state
        #[arg(long, default_value = "1.0")]
        slowdown: f32,

        /// End steady state early after this many transitions
        #[arg(long)]
        max_transactions: Option<u64>,

        /// Think-time model (fixed, tpcw)
        #[arg(long, default_value = "fixed")]
        think: String,

        /// Let each finished session be replaced by a fresh one
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        restart_sessions: bool,

        /// Base RNG seed for reproducible runs
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Delay between consecutive worker launches
        #[arg(long, default_value = "5ms")]
        stagger: humantime::Duration,

        /// Grace period for workers to exit after the down-ramp
        #[arg(long, default_value = "2s")]
        shutdown_timeout: humantime::Duration,

        /// Skip HTTP entirely; exercise only the emulation engine
        #[arg(long)]
        dry_run: bool,

        /// Emit the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn parse_backend(s: &str) -> Result<Backend, String> {
    match s.to_lowercase().as_str() {
        "php" => Ok(Backend::Php),
        "servlets" => Ok(Backend::Servlets),
        "ejb" => Ok(Backend::Ejb),
        _ => Err(format!("Unknown backend: {}", s)),
    }
}

fn parse_think_time(s: &str) -> Result<ThinkTime, String> {
    match s.to_lowercase().as_str() {
        "fixed" => Ok(ThinkTime::Fixed),
        "tpcw" | "negexp" => Ok(ThinkTime::NegativeExponential),
        _ => Err(format!("Unknown think-time model: {}", s)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { table } => {
            // Don't initialize tracing for check - output goes to stdout
            let table = TransitionTable::load(&table, ThinkTime::Fixed)?;
            println!("{}: {} pages", table.name(), table.origin_count());
            for (state, name) in table.names().iter().enumerate() {
                println!("  [{state:>2}] {name} (wait {} ms)", table.wait_ms(state));
            }
        }

        Commands::Run {
            table,
            url,
            backend,
            sessions,
            up,
            duration,
            down,
            ramp_slowdown,
            slowdown,
            max_transactions,
            think,
            restart_sessions,
            seed,
            stagger,
            shutdown_timeout,
            dry_run,
            json,
        } => {
            tracing_subscriber::fmt::init();

            let think = parse_think_time(&think)?;
            let table = Arc::new(TransitionTable::load(&table, think)?);

            let issuer: Arc<dyn RequestIssuer> = if dry_run {
                Arc::new(NoopIssuer)
            } else {
                let backend = parse_backend(&backend)?;
                let url = url.ok_or("a base URL is required unless --dry-run is set")?;
                Arc::new(HttpIssuer::new(&url, backend, &table))
            };

            let mut steady = PhaseConfig::new(*duration).with_slowdown(slowdown);
            if let Some(max) = max_transactions {
                steady = steady.with_max_transactions(max);
            }
            let config = HarnessConfig::new(sessions)
                .with_up_ramp(PhaseConfig::new(*up).with_slowdown(ramp_slowdown))
                .with_steady(steady)
                .with_down_ramp(PhaseConfig::new(*down).with_slowdown(ramp_slowdown))
                .with_restart_sessions(restart_sessions)
                .with_seed(seed)
                .with_start_stagger(*stagger)
                .with_shutdown_timeout(*shutdown_timeout);

            let harness = Harness::new(config, table, issuer)?;
            let report = harness.run().await;
            if json {
                println!("{}", report.to_json()?);
            } else {
                report.print();
            }
        }
    }

    Ok(())
}
