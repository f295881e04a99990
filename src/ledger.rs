// 📊 Ledger Store - owns the expense and income lists
//
// Every successful mutation writes the full affected list back to storage
// before returning. Write failures are logged and swallowed: the in-memory
// lists stay authoritative for the running session.

use crate::records::{
    validate_fields, Category, ExpenseRecord, IncomeRecord, RecordFields, RecordKind,
    ValidationError,
};
use crate::storage::{KeyValueStore, EXPENSES_KEY, INCOMES_KEY};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

/// Derived sums, recomputed from the lists on every call
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    pub expense: f64,
    pub income: f64,
    /// income - expense
    pub net: f64,
}

pub struct Ledger<S: KeyValueStore> {
    store: S,
    expenses: Vec<ExpenseRecord>,
    incomes: Vec<IncomeRecord>,
}

impl<S: KeyValueStore> Ledger<S> {
    /// Load both lists. A missing or corrupt key becomes an empty list for
    /// that key only; this never fails.
    pub fn load(store: S) -> Self {
        let expenses: Vec<ExpenseRecord> = load_list(&store, EXPENSES_KEY);
        let incomes: Vec<IncomeRecord> = load_list(&store, INCOMES_KEY);
        info!(
            expenses = expenses.len(),
            incomes = incomes.len(),
            "ledger loaded"
        );
        Self {
            store,
            expenses,
            incomes,
        }
    }

    pub fn expenses(&self) -> &[ExpenseRecord] {
        &self.expenses
    }

    pub fn incomes(&self) -> &[IncomeRecord] {
        &self.incomes
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give the storage back, e.g. to reload it as if the app restarted
    pub fn into_store(self) -> S {
        self.store
    }

    pub fn contains(&self, id: i64, kind: RecordKind) -> bool {
        match kind {
            RecordKind::Expense => self.expenses.iter().any(|e| e.id == id),
            RecordKind::Income => self.incomes.iter().any(|i| i.id == id),
        }
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Append a new expense. Returns the new record's id.
    pub fn add_expense(
        &mut self,
        name: &str,
        category: Option<Category>,
        amount_text: &str,
    ) -> Result<i64, ValidationError> {
        let fields = validate_fields(RecordKind::Expense, name, category, amount_text)?;
        let ids: Vec<i64> = self.expenses.iter().map(|e| e.id).collect();
        let id = next_id(&ids);
        self.expenses.push(ExpenseRecord {
            id,
            name: fields.name,
            category: fields.category,
            amount: fields.amount,
        });
        info!(id, amount = fields.amount, "expense added");
        self.persist(RecordKind::Expense);
        Ok(id)
    }

    /// Append a new income. Returns the new record's id.
    pub fn add_income(&mut self, name: &str, amount_text: &str) -> Result<i64, ValidationError> {
        let fields = validate_fields(RecordKind::Income, name, None, amount_text)?;
        let ids: Vec<i64> = self.incomes.iter().map(|i| i.id).collect();
        let id = next_id(&ids);
        self.incomes.push(IncomeRecord {
            id,
            name: fields.name,
            amount: fields.amount,
        });
        info!(id, amount = fields.amount, "income added");
        self.persist(RecordKind::Income);
        Ok(id)
    }

    /// Drop the record with `id` from its list. Absent id is a no-op.
    pub fn remove(&mut self, id: i64, kind: RecordKind) -> bool {
        let removed = match kind {
            RecordKind::Expense => {
                let before = self.expenses.len();
                self.expenses.retain(|e| e.id != id);
                before != self.expenses.len()
            }
            RecordKind::Income => {
                let before = self.incomes.len();
                self.incomes.retain(|i| i.id != id);
                before != self.incomes.len()
            }
        };

        if removed {
            info!(id, kind = kind.as_str(), "record removed");
            self.persist(kind);
        }
        removed
    }

    /// Replace the record's fields with validated draft values, keeping its
    /// id and position. `Ok(false)` when the id is not in the list.
    pub fn save(
        &mut self,
        id: i64,
        kind: RecordKind,
        name: &str,
        category: Option<Category>,
        amount_text: &str,
    ) -> Result<bool, ValidationError> {
        let fields = validate_fields(kind, name, category, amount_text)?;
        Ok(self.replace(id, kind, fields))
    }

    fn replace(&mut self, id: i64, kind: RecordKind, fields: RecordFields) -> bool {
        let found = match kind {
            RecordKind::Expense => match self.expenses.iter_mut().find(|e| e.id == id) {
                Some(slot) => {
                    *slot = ExpenseRecord {
                        id,
                        name: fields.name,
                        category: fields.category,
                        amount: fields.amount,
                    };
                    true
                }
                None => false,
            },
            RecordKind::Income => match self.incomes.iter_mut().find(|i| i.id == id) {
                Some(slot) => {
                    *slot = IncomeRecord {
                        id,
                        name: fields.name,
                        amount: fields.amount,
                    };
                    true
                }
                None => false,
            },
        };

        if found {
            info!(id, kind = kind.as_str(), "record saved");
            self.persist(kind);
        }
        found
    }

    pub fn totals(&self) -> Totals {
        let expense: f64 = self.expenses.iter().map(|e| e.amount).sum();
        let income: f64 = self.incomes.iter().map(|i| i.amount).sum();
        Totals {
            expense,
            income,
            net: income - expense,
        }
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    fn persist(&mut self, kind: RecordKind) {
        let result = match kind {
            RecordKind::Expense => write_list(&mut self.store, EXPENSES_KEY, &self.expenses),
            RecordKind::Income => write_list(&mut self.store, INCOMES_KEY, &self.incomes),
        };
        if let Err(err) = result {
            warn!(kind = kind.as_str(), error = %err, "failed to persist list");
        }
    }
}

fn load_list<S: KeyValueStore, T: DeserializeOwned>(store: &S, key: &str) -> Vec<T> {
    let raw = match store.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!(key, error = %err, "failed to read stored list, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(list) => list,
        Err(err) => {
            warn!(key, error = %err, "stored list is malformed, starting empty");
            Vec::new()
        }
    }
}

fn write_list<S: KeyValueStore, T: Serialize>(
    store: &mut S,
    key: &str,
    list: &[T],
) -> anyhow::Result<()> {
    let payload = serde_json::to_string(list)?;
    store.write(key, &payload)
}

/// Creation time in ms, bumped past the largest id already in the list.
/// Once the list holds `i64::MAX`, take the smallest free positive id.
fn next_id(existing: &[i64]) -> i64 {
    let now = Utc::now().timestamp_millis();
    match existing.iter().copied().max() {
        Some(max) if max >= now => max
            .checked_add(1)
            .unwrap_or_else(|| smallest_unused_id(existing)),
        _ => now,
    }
}

fn smallest_unused_id(existing: &[i64]) -> i64 {
    let taken: HashSet<i64> = existing.iter().copied().collect();
    (1..=i64::MAX).find(|id| !taken.contains(id)).unwrap_or(0)
}
