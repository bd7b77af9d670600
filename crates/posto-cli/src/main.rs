use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "posto")]
#[command(about = "FIFO inventory costing for fuel-station sales", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

/// Inputs shared by every costing command.
#[derive(Args, Debug, Clone)]
pub struct LedgerArgs {
    /// Purchases CSV (one row per delivered batch)
    #[arg(long)]
    pub purchases: PathBuf,

    /// Layered config paths in merge order (base -> station -> overrides)
    #[arg(long = "config")]
    pub config_paths: Vec<String>,

    /// FIFO start date (YYYY-MM-DD); overrides /fifo/start_date from config
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BasisArg {
    /// Stock as delivered, before any sale
    AsPurchased,
    /// Stock left after costing the given sales
    AfterSales,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Full FIFO report: per-product summaries, totals, adjusted profit, sale lines
    Report {
        #[command(flatten)]
        ledger: LedgerArgs,

        /// Sales CSV
        #[arg(long)]
        sales: PathBuf,

        /// Inventory adjustments CSV (losses/gains)
        #[arg(long)]
        adjustments: Option<PathBuf>,
    },

    /// Cost summary and sale lines of one product
    Product {
        #[command(flatten)]
        ledger: LedgerArgs,

        /// Sales CSV
        #[arg(long)]
        sales: PathBuf,

        /// Product code (e.g. GC, GA, DS10, DS500, ET)
        #[arg(long)]
        code: String,
    },

    /// What-if cost of a sale; never consumes inventory
    Preview {
        #[command(flatten)]
        ledger: LedgerArgs,

        /// Sales already made; the preview runs against what they leave
        #[arg(long)]
        sales: Option<PathBuf>,

        /// Product code
        #[arg(long)]
        code: String,

        /// Sale date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Volume in liters
        #[arg(long)]
        volume: Decimal,
    },

    /// Remaining inventory volume and value per product
    Snapshot {
        #[command(flatten)]
        ledger: LedgerArgs,

        /// Sales CSV (required for after-sales)
        #[arg(long)]
        sales: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = BasisArg::AfterSales)]
        basis: BasisArg,
    },

    /// Sales mix: share per product plus premium-gasoline and S10-diesel ratios
    Mix {
        /// Sales CSV
        #[arg(long)]
        sales: PathBuf,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,
    },
}

fn init_tracing() {
    // stderr keeps stdout clean for JSON output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn main() -> Result<()> {
    // Optional dev convenience; missing file is fine.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = posto_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Report {
            ledger,
            sales,
            adjustments,
        } => commands::costing::report(&ledger, &sales, adjustments.as_deref())?,

        Commands::Product {
            ledger,
            sales,
            code,
        } => commands::costing::product(&ledger, &sales, &code)?,

        Commands::Preview {
            ledger,
            sales,
            code,
            date,
            volume,
        } => commands::costing::preview(&ledger, sales.as_deref(), &code, date, volume)?,

        Commands::Snapshot {
            ledger,
            sales,
            basis,
        } => commands::costing::snapshot(&ledger, sales.as_deref(), basis)?,

        Commands::Mix {
            sales,
            config_paths,
        } => commands::mix::mix(&sales, &config_paths)?,
    }

    Ok(())
}
