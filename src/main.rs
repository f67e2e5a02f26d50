use std::net::SocketAddr;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use gto_trainer::benchmark::{run_benchmark, BenchmarkConfig, HeroPolicyKind};
use gto_trainer::rival::RivalStyle;
use gto_trainer::web;
use gto_trainer::{Trainer, TrainerConfig};

#[derive(Debug, Parser)]
#[command(
    name = "gto-trainer",
    version,
    about = "Heads-up NLHE trainer (Rust edition)",
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Number of hands to play (defaults to 1)
    #[arg(long, default_value_t = 1)]
    hands: u32,

    /// RNG seed (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Monte Carlo samples per decision
    #[arg(long = "mc", default_value_t = 200)]
    mc_samples: u32,

    /// Disable ANSI colors in CLI output
    #[arg(long = "no-color", default_value_t = false)]
    no_color: bool,

    /// Rival style preset
    #[arg(long = "rival-style", default_value = "balanced")]
    rival_style: RivalStyleArg,

    /// Auto-play hands using the best-EV action (useful for smoke tests)
    #[arg(long, default_value_t = false)]
    auto: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the web server
    Serve {
        /// Address to bind (HOST:PORT)
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,
    },
    /// Run a deterministic self-play sweep and report accuracy/exploitability
    Benchmark {
        /// Hands per scenario
        #[arg(long, default_value_t = 50)]
        hands: u32,

        /// One or more RNG seeds; each gets its own scenario
        #[arg(long = "seed", num_args = 1.., default_values_t = [101])]
        seeds: Vec<u64>,

        /// Monte Carlo samples per decision
        #[arg(long = "mc", default_value_t = 96)]
        mc_trials: u32,

        /// Rival style preset shared by every scenario
        #[arg(long = "rival-style", default_value = "balanced")]
        rival_style: RivalStyleArg,

        /// Scripted hero policy: "best" always takes the top-EV option,
        /// "gto" samples from the engine's mixed-strategy frequencies
        #[arg(long = "hero-policy", default_value = "gto")]
        hero_policy: String,
    },
}

#[derive(Debug, Clone, ValueEnum)]
enum RivalStyleArg {
    Balanced,
    Aggressive,
    Passive,
}

impl From<RivalStyleArg> for RivalStyle {
    fn from(arg: RivalStyleArg) -> Self {
        match arg {
            RivalStyleArg::Balanced => RivalStyle::Balanced,
            RivalStyleArg::Aggressive => RivalStyle::Aggressive,
            RivalStyleArg::Passive => RivalStyle::Passive,
        }
    }
}

/// Sizes the blocking pool `concurrency::run_blocking` hands session work
/// off to: `max(1, min(32, num_cpus))`, matching the bound the legacy
/// `ThreadPoolExecutor` used.
fn blocking_pool_size() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1).clamp(1, 32)
}

fn main() -> Result<()> {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().max_blocking_threads(blocking_pool_size()).build()?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Serve { addr }) => run_server(addr).await?,
        Some(Commands::Benchmark { hands, seeds, mc_trials, rival_style, hero_policy }) => {
            run_benchmark_command(hands, seeds, mc_trials, rival_style, hero_policy)?
        }
        None => run_cli(cli).await?,
    }

    Ok(())
}

fn run_benchmark_command(hands: u32, seeds: Vec<u64>, mc_trials: u32, rival_style: RivalStyleArg, hero_policy: String) -> Result<()> {
    let config = BenchmarkConfig {
        hands,
        seeds,
        mc_trials,
        rival_style: rival_style.into(),
        hero_policy: HeroPolicyKind::parse(&hero_policy)?,
        scenarios: None,
    };
    let result = run_benchmark(&config)?;
    for run in &result.runs {
        println!(
            "{:<16} seed={:<8} hands={:<4} accuracy={:>6.2}% exploitability={:>7.4}bb/decision",
            run.scenario.name,
            run.scenario.seed,
            run.stats.hands,
            run.accuracy_pct(),
            run.exploitability_bb()
        );
    }
    println!(
        "combined          hands={:<4} accuracy={:>6.2}% exploitability={:>7.4}bb/decision",
        result.combined.hands,
        result.accuracy_pct(),
        result.exploitability_bb()
    );
    Ok(())
}

async fn run_cli(cli: Cli) -> Result<()> {
    let config = TrainerConfig {
        hands: cli.hands,
        mc_samples: cli.mc_samples,
        seed: cli.seed,
        rival_style: cli.rival_style.clone().into(),
        no_color: cli.no_color,
    };
    let mut trainer = Trainer::new(config);
    if cli.auto {
        let summary = trainer.autoplay_best()?;
        trainer.print_summary(&summary);
        Ok(())
    } else {
        trainer.run()
    }
}

async fn run_server(addr: String) -> Result<()> {
    let addr: SocketAddr = addr.parse()?;
    web::serve(addr).await
}
