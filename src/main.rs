use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tube_draw::balancer::{AutoBalancer, BalancerSettings};
use tube_draw::cards::Shuffler;
use tube_draw::console::Console;
use tube_draw::web;
use tube_draw::{Progress, SimConfig, Simulation};

#[derive(Debug, Parser)]
#[command(
    name = "tube-draw",
    version,
    about = "Five-card draw simulator with depletable tube payouts",
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// JSON configuration file (camelCase keys)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Rounds per run (overrides the config file)
    #[arg(long, global = true)]
    rounds: Option<u32>,

    /// Players seated against the dealer
    #[arg(long, global = true)]
    players: Option<u32>,

    /// Ante per player per round
    #[arg(long, global = true)]
    ante: Option<u64>,

    /// RNG seed for shuffling (random if omitted)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Print the report as JSON instead of text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Disable ANSI colors in CLI output
    #[arg(long = "no-color", global = true, default_value_t = false)]
    no_color: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one simulation (the default)
    Run,
    /// Tune the bust penalty multiplier toward the target house edge
    Balance {
        /// Maximum simulations to run
        #[arg(long, default_value_t = 8)]
        max_iterations: u32,
    },
    /// Run the web server
    Serve {
        /// Address to bind (HOST:PORT)
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = color_eyre::install();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Serve { addr }) => run_server(addr).await?,
        Some(Commands::Balance { max_iterations }) => run_balance(&cli, *max_iterations)?,
        Some(Commands::Run) | None => run_simulation(&cli)?,
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<SimConfig> {
    let mut config = match &cli.config {
        Some(path) => SimConfig::from_json_file(path)?,
        None => SimConfig::default(),
    };
    if let Some(rounds) = cli.rounds {
        config.rounds_per_run = rounds;
    }
    if let Some(players) = cli.players {
        config.player_count = players;
    }
    if let Some(ante) = cli.ante {
        config.ante = ante;
    }
    Ok(config)
}

fn shuffler(cli: &Cli) -> Shuffler<StdRng> {
    let seed = cli.seed.unwrap_or_else(rand::random);
    info!(seed, "shuffling decks");
    Shuffler::new(StdRng::seed_from_u64(seed))
}

fn run_simulation(cli: &Cli) -> Result<()> {
    let simulation = Simulation::new(load_config(cli)?)?;
    let mut decks = shuffler(cli);
    let checkpoint = (simulation.config().rounds_per_run / 10).max(1);
    let report = simulation.run_with_progress(&mut decks, |progress: Progress| {
        if progress.completed % checkpoint == 0 {
            info!(completed = progress.completed, total = progress.total, "progress");
        }
    })?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        Console::new(cli.no_color).print_report(&report);
    }
    Ok(())
}

fn run_balance(cli: &Cli, max_iterations: u32) -> Result<()> {
    let settings = BalancerSettings {
        max_iterations,
        ..BalancerSettings::default()
    };
    let balancer = AutoBalancer::new(load_config(cli)?, settings);
    let outcome = balancer.run(&mut shuffler(cli))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        Console::new(cli.no_color).print_balance(&outcome);
    }
    Ok(())
}

async fn run_server(addr: &str) -> Result<()> {
    let addr: SocketAddr = addr.parse()?;
    info!(%addr, "serving");
    web::serve(addr).await
}
