// ✏️ Entry Editor - add-form drafts and per-record view state
//
// None of this lives in the ledger: drafts are view concerns. The ledger
// only ever sees validated intents (add, save, remove).

use crate::ledger::Ledger;
use crate::records::{Category, ExpenseRecord, IncomeRecord, RecordKind, ValidationError};
use crate::storage::KeyValueStore;

// ============================================================================
// ADD-FORMS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseForm {
    pub name: String,
    pub category: Option<Category>,
    pub amount: String,
}

impl ExpenseForm {
    /// Add the drafted expense. Fields are cleared only on success.
    pub fn submit<S: KeyValueStore>(
        &mut self,
        ledger: &mut Ledger<S>,
    ) -> Result<i64, ValidationError> {
        let id = ledger.add_expense(&self.name, self.category, &self.amount)?;
        *self = Self::default();
        Ok(id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomeForm {
    pub name: String,
    pub amount: String,
}

impl IncomeForm {
    /// Add the drafted income. Fields are cleared only on success.
    pub fn submit<S: KeyValueStore>(
        &mut self,
        ledger: &mut Ledger<S>,
    ) -> Result<i64, ValidationError> {
        let id = ledger.add_income(&self.name, &self.amount)?;
        *self = Self::default();
        Ok(id)
    }
}

// ============================================================================
// PER-RECORD STATE
// ============================================================================

/// Unsaved values of a record being edited. Amount stays as typed text.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub name: String,
    pub category: Option<Category>,
    pub amount: String,
}

impl Draft {
    pub fn from_expense(record: &ExpenseRecord) -> Self {
        Self {
            name: record.name.clone(),
            category: record.category,
            amount: record.amount.to_string(),
        }
    }

    pub fn from_income(record: &IncomeRecord) -> Self {
        Self {
            name: record.name.clone(),
            category: None,
            amount: record.amount.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum EntryState {
    #[default]
    Viewing,
    Editing(Draft),
}

/// One record's editor. Identified by list kind + id.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryEditor {
    pub id: i64,
    pub kind: RecordKind,
    pub state: EntryState,
}

impl EntryEditor {
    pub fn new(id: i64, kind: RecordKind) -> Self {
        Self {
            id,
            kind,
            state: EntryState::Viewing,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EntryState::Editing(_))
    }

    pub fn draft(&self) -> Option<&Draft> {
        match &self.state {
            EntryState::Editing(draft) => Some(draft),
            EntryState::Viewing => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        match &mut self.state {
            EntryState::Editing(draft) => Some(draft),
            EntryState::Viewing => None,
        }
    }

    /// Viewing → Editing, seeding the draft from the current record.
    /// Returns false if the record is gone.
    pub fn begin_edit<S: KeyValueStore>(&mut self, ledger: &Ledger<S>) -> bool {
        let draft = match self.kind {
            RecordKind::Expense => ledger
                .expenses()
                .iter()
                .find(|e| e.id == self.id)
                .map(Draft::from_expense),
            RecordKind::Income => ledger
                .incomes()
                .iter()
                .find(|i| i.id == self.id)
                .map(Draft::from_income),
        };
        match draft {
            Some(draft) => {
                self.state = EntryState::Editing(draft);
                true
            }
            None => false,
        }
    }

    /// Editing → Viewing, dropping the draft
    pub fn cancel(&mut self) {
        self.state = EntryState::Viewing;
    }

    /// Send the draft to the ledger. Back to Viewing once the ledger answers
    /// Ok (saved, or the record no longer exists). A rejected draft keeps
    /// the editor open with the typed values intact.
    pub fn save<S: KeyValueStore>(
        &mut self,
        ledger: &mut Ledger<S>,
    ) -> Result<bool, ValidationError> {
        let Some(draft) = self.draft() else {
            return Ok(false);
        };
        let found = ledger.save(self.id, self.kind, &draft.name, draft.category, &draft.amount)?;
        self.state = EntryState::Viewing;
        Ok(found)
    }

    /// Emit a remove intent for this record
    pub fn remove<S: KeyValueStore>(&self, ledger: &mut Ledger<S>) -> bool {
        ledger.remove(self.id, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn ledger_with_coffee() -> (Ledger<MemoryStore>, i64) {
        let mut ledger = Ledger::load(MemoryStore::new());
        let id = ledger.add_expense("Coffee", Some(Category::Food), "4.50").unwrap();
        (ledger, id)
    }

    #[test]
    fn test_expense_form_clears_on_success() {
        let mut ledger = Ledger::load(MemoryStore::new());
        let mut form = ExpenseForm {
            name: "Coffee".to_string(),
            category: Some(Category::Food),
            amount: "4.50".to_string(),
        };

        form.submit(&mut ledger).unwrap();

        assert_eq!(form, ExpenseForm::default());
        assert_eq!(ledger.expenses().len(), 1);
        assert_eq!(ledger.expenses()[0].amount, 4.5);
        assert_eq!(ledger.expenses()[0].category, Some(Category::Food));
    }

    #[test]
    fn test_expense_form_preserved_on_failure() {
        let mut ledger = Ledger::load(MemoryStore::new());
        let cases = [
            ExpenseForm {
                name: String::new(),
                category: Some(Category::Food),
                amount: "4.50".to_string(),
            },
            ExpenseForm {
                name: "Coffee".to_string(),
                category: None,
                amount: "4.50".to_string(),
            },
            ExpenseForm {
                name: "Coffee".to_string(),
                category: Some(Category::Food),
                amount: "0".to_string(),
            },
        ];

        for case in cases {
            let mut form = case.clone();
            assert!(form.submit(&mut ledger).is_err());
            assert_eq!(form, case);
        }
        assert!(ledger.expenses().is_empty());
    }

    #[test]
    fn test_income_form() {
        let mut ledger = Ledger::load(MemoryStore::new());
        let mut form = IncomeForm {
            name: "Salary".to_string(),
            amount: String::new(),
        };
        assert!(form.submit(&mut ledger).is_err());
        assert_eq!(form.name, "Salary");

        form.amount = "2000".to_string();
        form.submit(&mut ledger).unwrap();
        assert_eq!(form, IncomeForm::default());
        assert_eq!(ledger.incomes().len(), 1);
        assert!(ledger.expenses().is_empty());
    }

    #[test]
    fn test_edit_seeds_draft_from_record() {
        let (ledger, id) = ledger_with_coffee();
        let mut editor = EntryEditor::new(id, RecordKind::Expense);
        assert!(!editor.is_editing());

        assert!(editor.begin_edit(&ledger));

        let draft = editor.draft().unwrap();
        assert_eq!(draft.name, "Coffee");
        assert_eq!(draft.category, Some(Category::Food));
        assert_eq!(draft.amount, "4.5");
    }

    #[test]
    fn test_save_draft_updates_record() {
        let (mut ledger, id) = ledger_with_coffee();
        let mut editor = EntryEditor::new(id, RecordKind::Expense);
        editor.begin_edit(&ledger);
        editor.draft_mut().unwrap().amount = "9.99".to_string();

        assert_eq!(editor.save(&mut ledger), Ok(true));

        assert_eq!(editor.state, EntryState::Viewing);
        assert_eq!(ledger.expenses()[0].id, id);
        assert_eq!(ledger.expenses()[0].amount, 9.99);
    }

    #[test]
    fn test_rejected_draft_stays_editing() {
        let (mut ledger, id) = ledger_with_coffee();
        let mut editor = EntryEditor::new(id, RecordKind::Expense);
        editor.begin_edit(&ledger);
        editor.draft_mut().unwrap().amount = "4.5.0".to_string();

        assert!(editor.save(&mut ledger).is_err());

        assert_eq!(editor.draft().unwrap().amount, "4.5.0");
        assert_eq!(ledger.expenses()[0].amount, 4.5);
    }

    #[test]
    fn test_cancel_discards_draft() {
        let (ledger, id) = ledger_with_coffee();
        let mut editor = EntryEditor::new(id, RecordKind::Expense);
        editor.begin_edit(&ledger);
        editor.draft_mut().unwrap().name = "Tea".to_string();

        editor.cancel();

        assert_eq!(editor.state, EntryState::Viewing);
        assert_eq!(ledger.expenses()[0].name, "Coffee");
    }

    #[test]
    fn test_save_after_record_removed() {
        let (mut ledger, id) = ledger_with_coffee();
        let mut editor = EntryEditor::new(id, RecordKind::Expense);
        editor.begin_edit(&ledger);

        assert!(editor.remove(&mut ledger));
        assert_eq!(editor.save(&mut ledger), Ok(false));
        assert!(!editor.is_editing());
        assert!(ledger.expenses().is_empty());
    }

    #[test]
    fn test_begin_edit_missing_record() {
        let ledger = Ledger::load(MemoryStore::new());
        let mut editor = EntryEditor::new(99, RecordKind::Income);
        assert!(!editor.begin_edit(&ledger));
        assert!(!editor.is_editing());
    }
}
