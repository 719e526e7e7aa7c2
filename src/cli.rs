//! Command-line interface: argument definitions, dispatch, and terminal
//! status rendering.
//!
//! `run()` handles all output including errors; `main.rs` only maps the
//! returned code to a process exit.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::{BudgetLevel, Config, Phase, Planner, TravelPace, TripParams};

/// Generation failed after exhausting its attempts, or setup failed.
pub const EXIT_FAILURE: i32 = 1;

/// Generation was cancelled (Ctrl-C), conventional interrupt code.
pub const EXIT_INTERRUPTED: i32 = 130;

/// wayplan - AI travel itinerary generator
#[derive(Parser)]
#[command(name = "wayplan")]
#[command(about = "Generate day-by-day travel itineraries with a generative AI backend")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate an itinerary and print it to stdout
    Generate(GenerateArgs),

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Destination city or region
    #[arg(long)]
    pub destination: String,

    /// Trip length in days
    #[arg(long)]
    pub days: u32,

    /// First day of the trip (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Number of travelers
    #[arg(long, default_value_t = 1)]
    pub travelers: u32,

    /// Spending level the plan should assume
    #[arg(long, value_enum, default_value_t = BudgetArg::Moderate)]
    pub budget: BudgetArg,

    /// How densely to pack each day
    #[arg(long, value_enum, default_value_t = PaceArg::Balanced)]
    pub pace: PaceArg,

    /// Interests to weave into the plan (repeatable or comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub interests: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum BudgetArg {
    Shoestring,
    Moderate,
    Luxury,
}

impl From<BudgetArg> for BudgetLevel {
    fn from(value: BudgetArg) -> Self {
        match value {
            BudgetArg::Shoestring => BudgetLevel::Shoestring,
            BudgetArg::Moderate => BudgetLevel::Moderate,
            BudgetArg::Luxury => BudgetLevel::Luxury,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PaceArg {
    Relaxed,
    Balanced,
    Packed,
}

impl From<PaceArg> for TravelPace {
    fn from(value: PaceArg) -> Self {
        match value {
            PaceArg::Relaxed => TravelPace::Relaxed,
            PaceArg::Balanced => TravelPace::Balanced,
            PaceArg::Packed => TravelPace::Packed,
        }
    }
}

impl GenerateArgs {
    fn into_params(self) -> TripParams {
        let mut params = TripParams::new(self.destination, self.days)
            .with_travelers(self.travelers)
            .with_budget(self.budget.into())
            .with_pace(self.pace.into());
        if let Some(date) = self.start_date {
            params = params.with_start_date(date);
        }
        for interest in self.interests {
            params = params.with_interest(interest);
        }
        params
    }
}

/// Parse arguments, load configuration, and dispatch.
///
/// All output, including error reporting, happens here. The caller only
/// maps the returned code to a process exit.
pub fn run() -> Result<(), i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match Config::discover(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("✗ {err}");
            return Err(EXIT_FAILURE);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("✗ failed to create async runtime: {err}");
            return Err(EXIT_FAILURE);
        }
    };

    match cli.command {
        Commands::Generate(args) => rt.block_on(run_generate(config, args)),
        Commands::Config => run_config(&config),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "wayplan=info,wayplan_orchestrator=info,wayplan_llm=info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_generate(config: Config, args: GenerateArgs) -> Result<(), i32> {
    let planner = match Planner::from_config(&config) {
        Ok(planner) => Arc::new(planner),
        Err(err) => {
            eprintln!("✗ {err}");
            return Err(EXIT_FAILURE);
        }
    };
    let params = args.into_params();

    // Status line on stderr so a redirected stdout gets only the itinerary.
    let mut updates = planner.subscribe();
    let render = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            if snapshot.phase.is_terminal() {
                break;
            }
            if snapshot.is_loading {
                eprint!(
                    "\r\x1b[2K{:>3.0}% {}",
                    snapshot.progress, snapshot.current_message
                );
                let _ = std::io::stderr().flush();
            }
        }
        eprint!("\r\x1b[2K");
        let _ = std::io::stderr().flush();
    });

    {
        let planner = Arc::clone(&planner);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                planner.cancel();
            }
        });
    }

    let outcome = planner.generate(&params).await;
    let _ = render.await;

    match outcome {
        Ok(Phase::Succeeded) => {
            let snapshot = planner.snapshot();
            if let Some(response) = snapshot.response {
                println!("{response}");
            }
            Ok(())
        }
        Ok(Phase::Cancelled) => {
            eprintln!("✗ generation cancelled");
            Err(EXIT_INTERRUPTED)
        }
        Ok(_) => {
            let snapshot = planner.snapshot();
            let message = snapshot
                .error
                .unwrap_or_else(|| "generation failed".to_string());
            eprintln!("✗ {message}");
            Err(EXIT_FAILURE)
        }
        Err(err) => {
            eprintln!("✗ {err}");
            Err(EXIT_FAILURE)
        }
    }
}

fn run_config(config: &Config) -> Result<(), i32> {
    match toml::to_string_pretty(config) {
        Ok(rendered) => {
            print!("{rendered}");
            Ok(())
        }
        Err(err) => {
            eprintln!("✗ failed to render configuration: {err}");
            Err(EXIT_FAILURE)
        }
    }
}
