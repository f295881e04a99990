use anyhow::{Context, Result};
use budget_tracker::config::{Args, Command};
use budget_tracker::{format_money, KeyValueStore, Ledger, SqliteStore};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;

    info!(version = budget_tracker::VERSION, db = %args.db.display(), "starting");
    let store = SqliteStore::open(&args.db)?;
    let ledger = Ledger::load(store);

    match args.command {
        Some(Command::Summary) => print_summary(&ledger, &args.currency),
        None => run_ui_mode(ledger, args.currency)?,
    }

    Ok(())
}

/// Logs go to a file: the terminal belongs to the UI
fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn print_summary<S: KeyValueStore>(ledger: &Ledger<S>, currency: &str) {
    let totals = ledger.totals();
    println!("Summary");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Total Expense: {}", format_money(currency, totals.expense));
    println!("Total Income:  {}", format_money(currency, totals.income));
    println!("Net Balance:   {}", format_money(currency, totals.net));

    println!("\nExpenses ({})", ledger.expenses().len());
    for e in ledger.expenses() {
        println!(
            "  {:<30} {:<14} {:>12}",
            e.name,
            e.category.map(|c| c.as_str()).unwrap_or("-"),
            format_money(currency, e.amount)
        );
    }

    println!("\nIncomes ({})", ledger.incomes().len());
    for i in ledger.incomes() {
        println!("  {:<30} {:<14} {:>12}", i.name, "", format_money(currency, i.amount));
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode<S: KeyValueStore>(ledger: Ledger<S>, currency: String) -> Result<()> {
    let mut app = budget_tracker::ui::App::new(ledger, currency);
    budget_tracker::ui::run_ui(&mut app)?;
    info!("ui closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode<S: KeyValueStore>(_ledger: Ledger<S>, _currency: String) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or print totals with: budget-tracker summary");
    std::process::exit(1);
}
