use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use thiserror::Error;

use super::money::{parse_money, Amount, Money};

/// Shown by category pickers before a choice is made; never a real category.
pub const CATEGORY_PLACEHOLDER: &str = "Select Category";

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%m-%d-%Y", "%d-%m-%Y", "%d.%m.%Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Stable key of a row inside one working table. Survives sorting and
/// filtering; never reused after a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transaction {
    /// Kept as the source wrote it.
    pub date: String,
    pub description: String,
    pub amount: Amount,
    /// Empty means uncategorized.
    pub category: String,
}

impl Transaction {
    pub fn new(date: &str, description: &str, amount: Amount) -> Self {
        Transaction {
            date: date.to_string(),
            description: description.to_string(),
            amount,
            category: String::new(),
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn is_categorized(&self) -> bool {
        !self.category.is_empty()
    }

    /// Chronological key when the date is in a recognised format.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select a category")]
    MissingCategory,
    #[error("Amount must be a number, got '{0}'")]
    InvalidAmount(String),
    #[error("Description cannot be empty")]
    EmptyDescription,
}

/// A user's edit of one row, exactly as typed.
#[derive(Debug, Clone)]
pub struct RowEdit {
    pub category: String,
    pub amount: String,
    pub description: String,
}

/// A `RowEdit` that passed validation and can be applied without further checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEdit {
    pub category: String,
    pub amount: Money,
    pub description: String,
}

impl ValidatedEdit {
    pub fn validate(edit: RowEdit) -> Result<ValidatedEdit, ValidationError> {
        let category = edit.category.trim();
        if category.is_empty() || category == CATEGORY_PLACEHOLDER {
            return Err(ValidationError::MissingCategory);
        }

        let amount = parse_money(&edit.amount)
            .map_err(|_| ValidationError::InvalidAmount(edit.amount.clone()))?;

        let description = edit.description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }

        Ok(ValidatedEdit {
            category: category.to_string(),
            amount,
            description: description.to_string(),
        })
    }

    pub fn apply_to(&self, tx: &mut Transaction) {
        tx.category = self.category.clone();
        tx.amount = Amount::Value(self.amount);
        tx.description = self.description.clone();
    }
}
