//! # Duka Backoffice
//!
//! Scheduler entry point and admin CLI for the supermarket ledger.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Parse CLI (clap)                                                   │
//! │  2. Load BackofficeConfig (defaults → backoffice.toml → DUKA_*)        │
//! │  3. Initialize tracing (RUST_LOG, else config.log_filter)              │
//! │  4. Open database, run migrations                                      │
//! │  5. Dispatch command                                                   │
//! │  6. Close pool                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scheduling
//! The write-off is idempotent per day, so a plain cron entry is enough:
//! ```text
//! 5 0 * * *  duka-backoffice writeoff
//! ```

mod commands;
mod config;

use std::error::Error;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use duka_core::Money;
use duka_db::{Database, DbConfig};

use crate::config::BackofficeConfig;

#[derive(Parser)]
#[command(name = "duka-backoffice")]
#[command(about = "Expiry write-off, discount check and stock reports for Duka POS")]
#[command(version)]
struct Cli {
    /// Config file (default: platform config dir / backoffice.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database file, overrides config and DUKA_DB_PATH
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write off stock of products that expired before the given date
    Writeoff {
        /// Only list what would be written off
        #[arg(long)]
        preview: bool,

        /// Reference date, YYYY-MM-DD (default: today, UTC)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Staff username recorded on the log rows (default: system_staff)
        #[arg(long)]
        staff: Option<String>,
    },

    /// Show discounts active on a date and how they stack on a total
    Discounts {
        /// Date, YYYY-MM-DD (default: today, UTC)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Sale total in cents
        #[arg(long)]
        total: Option<i64>,
    },

    /// Products at or below reorder level, and products expiring soon
    Reorder {
        /// Expiry horizon in days (default: expiring_within_days)
        #[arg(long)]
        days: Option<u64>,
    },

    /// Sales KPIs and expiry losses for a date range
    Report {
        /// First day, YYYY-MM-DD (default: today)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day, YYYY-MM-DD (default: today)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let mut config = BackofficeConfig::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }

    init_tracing(&config.log_filter);

    info!(
        path = %config.database_path.display(),
        stacking_order = %config.stacking_order,
        "Starting duka-backoffice"
    );

    let db = Database::new(
        DbConfig::new(&config.database_path)
            .max_connections(config.max_connections)
            .stacking_order(config.stacking_order),
    )
    .await?;

    let result = run(&db, &config, cli.command).await;
    db.close().await;

    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }
    result
}

async fn run(db: &Database, config: &BackofficeConfig, command: Commands) -> commands::CommandResult {
    let today = Utc::now().date_naive();
    let mut out = std::io::stdout().lock();

    match command {
        Commands::Writeoff {
            preview: true,
            as_of,
            ..
        } => commands::writeoff_preview(db, as_of.unwrap_or(today), &mut out).await,
        Commands::Writeoff { as_of, staff, .. } => {
            let username = staff.as_deref().unwrap_or(&config.system_staff);
            commands::writeoff(db, as_of.unwrap_or(today), username, &mut out).await
        }
        Commands::Discounts { date, total } => {
            commands::discounts(
                db,
                date.unwrap_or(today),
                total.map(Money::from_cents),
                config.stacking_order,
                &mut out,
            )
            .await
        }
        Commands::Reorder { days } => {
            let days = days.unwrap_or(config.expiring_within_days);
            commands::reorder(db, today, days, &mut out).await
        }
        Commands::Report { from, to } => {
            commands::report(db, from.unwrap_or(today), to.unwrap_or(today), &mut out).await
        }
    }
}

/// Initializes tracing; `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
