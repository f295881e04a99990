// Budget Tracker - Core Library
// Ledger store, storage backends and editor state, shared by the TUI and
// the summary command.

pub mod config;
pub mod editor;
pub mod ledger;
pub mod records;
pub mod storage;

// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use editor::{Draft, EntryEditor, EntryState, ExpenseForm, IncomeForm};
pub use ledger::{Ledger, Totals};
pub use records::{
    format_money, parse_amount, Category, ExpenseRecord, IncomeRecord, RecordKind,
    ValidationError,
};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore, EXPENSES_KEY, INCOMES_KEY};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
