// 📒 Ledger Records - Expense and income entries
//
// Records are values: an edit replaces every mutable field at once, the id
// never changes. The JSON shape matches what is stored under the
// `expenses` / `incomes` keys.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// ============================================================================
// CATEGORY
// ============================================================================

/// Closed set of expense categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Food,
    Transport,
    Entertainment,
    Bills,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Food,
        Category::Transport,
        Category::Entertainment,
        Category::Bills,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Entertainment => "Entertainment",
            Category::Bills => "Bills",
            Category::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == s)
    }

    /// Step forward through `None, Food, ..., Other, None` (selector order)
    pub fn cycle_next(current: Option<Self>) -> Option<Self> {
        match current {
            None => Some(Self::ALL[0]),
            Some(c) => {
                let i = Self::ALL.iter().position(|x| *x == c).unwrap_or(0);
                Self::ALL.get(i + 1).copied()
            }
        }
    }

    /// Step backward through the selector order
    pub fn cycle_previous(current: Option<Self>) -> Option<Self> {
        match current {
            None => Some(Self::ALL[Self::ALL.len() - 1]),
            Some(c) => {
                let i = Self::ALL.iter().position(|x| *x == c).unwrap_or(0);
                if i == 0 {
                    None
                } else {
                    Some(Self::ALL[i - 1])
                }
            }
        }
    }
}

/// Stored as plain text; "" is the unset value. Unknown text reads as unset
/// rather than failing the whole list.
mod category_text {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<Category>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.map(|c| c.as_str()).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Category>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.as_deref().and_then(Category::parse))
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// Which list a record lives in. Every lookup is scoped by kind + id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Expense,
    Income,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Expense => "expense",
            RecordKind::Income => "income",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: i64,
    pub name: String,
    #[serde(with = "category_text", default)]
    pub category: Option<Category>,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeRecord {
    pub id: i64,
    pub name: String,
    pub amount: f64,
}

/// Replacement values for a record, already validated
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFields {
    pub name: String,
    pub category: Option<Category>,
    pub amount: f64,
}

// ============================================================================
// VALIDATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("name is required")]
    MissingName,

    #[error("category is required")]
    MissingCategory,

    #[error("amount must be a number greater than zero (got {0:?})")]
    InvalidAmount(String),
}

/// Parse user-typed amount text. Must be finite and strictly positive.
pub fn parse_amount(text: &str) -> Result<f64, ValidationError> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err(ValidationError::InvalidAmount(trimmed.to_string())),
    }
}

/// Check draft text for a record of `kind` and turn it into fields
pub fn validate_fields(
    kind: RecordKind,
    name: &str,
    category: Option<Category>,
    amount_text: &str,
) -> Result<RecordFields, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    if kind == RecordKind::Expense && category.is_none() {
        return Err(ValidationError::MissingCategory);
    }
    let amount = parse_amount(amount_text)?;

    Ok(RecordFields {
        name: name.to_string(),
        category: match kind {
            RecordKind::Expense => category,
            RecordKind::Income => None,
        },
        amount,
    })
}

/// `$4.50` style. Negative values keep the sign after the prefix (`$-3.00`).
pub fn format_money(prefix: &str, amount: f64) -> String {
    format!("{}{:.2}", prefix, amount)
}
