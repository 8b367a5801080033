mod commands;
mod config;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::forecast::{ForecastArgs, InventoryArgs, ReceivablesArgs, SimulateArgs};
use commands::pricing::{DerivedArgs, PricePointsArgs, ScenariosArgs};
use commands::units::ConvertArgs;

/// Pricing, break-even and sales forecasting for small shops
#[derive(Parser)]
#[command(
    name = "shopcalc",
    version,
    about = "Pricing, break-even and sales forecasting for small shops",
    long_about = "Work out retail prices from wholesale cost, the monthly volume needed \
                  to hit a profit target, what-if price scenarios, and a month-by-month \
                  sales forecast from recorded transactions. All money is computed \
                  with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// YAML business profile supplying default parameters
    #[arg(long, env = "SHOPCALC_PROFILE", global = true)]
    profile: Option<PathBuf>,

    /// Log more to stderr (-v debug, -vv trace); SHOPCALC_LOG otherwise
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a weight between grams, ounces and kilograms
    Convert(ConvertArgs),
    /// Price table for a set of markups over wholesale
    PricePoints(PricePointsArgs),
    /// Eleven price scenarios around a base price
    Scenarios(ScenariosArgs),
    /// Revenue, cost, profit and break-even for one price and volume
    Derived(DerivedArgs),
    /// Monthly dashboard and forward forecast from transactions
    Forecast(ForecastArgs),
    /// Accounts receivable aging
    Receivables(ReceivablesArgs),
    /// Stock valuation and reorder alerts
    Inventory(InventoryArgs),
    /// Simulate daily sales and restocks
    Simulate(SimulateArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env("SHOPCALC_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let profile = cli.profile.as_deref();
    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Convert(args) => commands::units::run_convert(args),
        Commands::PricePoints(args) => commands::pricing::run_price_points(args, profile),
        Commands::Scenarios(args) => commands::pricing::run_scenarios(args, profile),
        Commands::Derived(args) => commands::pricing::run_derived(args, profile),
        Commands::Forecast(args) => commands::forecast::run_forecast(args, profile),
        Commands::Receivables(args) => commands::forecast::run_receivables(args),
        Commands::Inventory(args) => commands::forecast::run_inventory(args, profile),
        Commands::Simulate(args) => commands::forecast::run_simulate(args),
        Commands::Version => {
            println!("shopcalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
