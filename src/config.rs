use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "budget-tracker", about = "Track expenses and incomes in the terminal")]
pub struct Args {
    /// SQLite file holding the ledger
    #[arg(long, env = "BUDGET_TRACKER_DB", default_value = "budget.db")]
    pub db: PathBuf,

    /// Currency prefix for displayed amounts
    #[arg(long, env = "BUDGET_TRACKER_CURRENCY", default_value = "$")]
    pub currency: String,

    /// Log output (the terminal belongs to the UI)
    #[arg(long, env = "BUDGET_TRACKER_LOG", default_value = "budget-tracker.log")]
    pub log_file: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print totals and every record, then exit
    Summary,
}
