//! Derived, read-only projections of a [`WorkingTable`].
//!
//! Filtering never touches the table and returns rows tagged with their
//! [`RowId`], so a row picked from a filtered display can be resolved back to
//! its table entry. Sorting is the one exception: it reorders the table
//! itself so the order survives later filter changes.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::money::Amount;
use super::table::{LookupError, Row, WorkingTable};
use super::transaction::{RowId, Transaction};

pub const FILTER_ALL: &str = "All";
pub const FILTER_ALL_CATEGORIES: &str = "All Categories";
pub const FILTER_UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Uncategorized,
    Named(String),
}

impl CategoryFilter {
    /// Parses a label from the filter selector.
    pub fn from_choice(choice: &str) -> Self {
        match choice.trim() {
            "" | FILTER_ALL | FILTER_ALL_CATEGORIES => CategoryFilter::All,
            FILTER_UNCATEGORIZED => CategoryFilter::Uncategorized,
            name => CategoryFilter::Named(name.to_string()),
        }
    }

    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Uncategorized => category.is_empty(),
            CategoryFilter::Named(name) => category == name,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "{FILTER_ALL}"),
            CategoryFilter::Uncategorized => write!(f, "{FILTER_UNCATEGORIZED}"),
            CategoryFilter::Named(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignFilter {
    #[default]
    All,
    Positive,
    Negative,
}

impl SignFilter {
    /// Non-numeric amounts count as zero, so both sign filters drop them.
    pub fn matches(self, amount: &Amount) -> bool {
        let value = amount.coerced();
        match self {
            SignFilter::All => true,
            SignFilter::Positive => value.is_positive(),
            SignFilter::Negative => value.is_negative(),
        }
    }
}

impl FromStr for SignFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(SignFilter::All),
            "positive" | "pos" | "+" => Ok(SignFilter::Positive),
            "negative" | "neg" | "-" => Ok(SignFilter::Negative),
            other => Err(format!("Unknown sign filter: '{other}'")),
        }
    }
}

impl fmt::Display for SignFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignFilter::All => write!(f, "All"),
            SignFilter::Positive => write!(f, "Positive"),
            SignFilter::Negative => write!(f, "Negative"),
        }
    }
}

/// The currently requested view. Predicates are independent and AND-ed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewFilter {
    pub category: CategoryFilter,
    pub search: String,
    pub sign: SignFilter,
}

impl ViewFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.matches_with(&SearchTerm::new(&self.search), tx)
    }

    fn matches_with(&self, search: &SearchTerm, tx: &Transaction) -> bool {
        self.category.matches(&tx.category)
            && search.matches(&tx.description)
            && self.sign.matches(&tx.amount)
    }
}

/// Lowercased once per filter run rather than once per row.
struct SearchTerm(Option<String>);

impl SearchTerm {
    fn new(term: &str) -> Self {
        SearchTerm((!term.is_empty()).then(|| term.to_lowercase()))
    }

    fn matches(&self, description: &str) -> bool {
        match &self.0 {
            None => true,
            Some(needle) => !description.is_empty() && description.to_lowercase().contains(needle),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewRow<'a> {
    pub id: RowId,
    pub transaction: &'a Transaction,
}

/// Rows selected by a [`ViewFilter`], reindexed from zero for display.
#[derive(Debug, Clone, Default)]
pub struct View<'a> {
    rows: Vec<ViewRow<'a>>,
}

impl<'a> View<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ViewRow<'a>] {
        &self.rows
    }

    pub fn get(&self, display_index: usize) -> Option<&ViewRow<'a>> {
        self.rows.get(display_index)
    }

    /// Maps a display position back to the table row it shows.
    pub fn resolve(&self, display_index: usize) -> Result<RowId, LookupError> {
        self.rows
            .get(display_index)
            .map(|row| row.id)
            .ok_or(LookupError::StaleIndex {
                index: display_index,
                len: self.rows.len(),
            })
    }

    pub fn transactions(&self) -> impl Iterator<Item = &'a Transaction> + '_ {
        self.rows.iter().map(|row| row.transaction)
    }
}

pub fn filter<'a>(table: &'a WorkingTable, view_filter: &ViewFilter) -> View<'a> {
    let search = SearchTerm::new(&view_filter.search);
    let rows = table
        .rows()
        .iter()
        .filter(|row| view_filter.matches_with(&search, &row.transaction))
        .map(|row| ViewRow {
            id: row.id,
            transaction: &row.transaction,
        })
        .collect();
    View { rows }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Date,
    Description,
    Amount,
    Category,
}

impl Column {
    pub const ALL: [Column; 4] = [
        Column::Date,
        Column::Description,
        Column::Amount,
        Column::Category,
    ];
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" => Ok(Column::Date),
            "description" => Ok(Column::Description),
            "amount" => Ok(Column::Amount),
            "category" => Ok(Column::Category),
            other => Err(format!("Unknown column: '{other}'")),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Date => write!(f, "Date"),
            Column::Description => write!(f, "Description"),
            Column::Amount => write!(f, "Amount"),
            Column::Category => write!(f, "Category"),
        }
    }
}

/// Stable sort of the table itself. Amounts and dates that do not parse sort
/// last in both directions; text columns compare by byte order.
pub fn sort(table: &mut WorkingTable, column: Column, ascending: bool) {
    let rows = table.rows_mut();
    match column {
        Column::Amount => sort_missing_last(rows, ascending, |row| row.transaction.amount.value()),
        Column::Date => sort_missing_last(rows, ascending, |row| row.transaction.parsed_date()),
        Column::Description => rows.sort_by(|a, b| {
            directed(
                a.transaction.description.cmp(&b.transaction.description),
                ascending,
            )
        }),
        Column::Category => rows.sort_by(|a, b| {
            directed(a.transaction.category.cmp(&b.transaction.category), ascending)
        }),
    }
}

fn directed(ordering: Ordering, ascending: bool) -> Ordering {
    if ascending {
        ordering
    } else {
        ordering.reverse()
    }
}

fn sort_missing_last<K, F>(rows: &mut [Row], ascending: bool, key: F)
where
    K: Ord,
    F: Fn(&Row) -> Option<K>,
{
    rows.sort_by(|a, b| match (key(a), key(b)) {
        (Some(x), Some(y)) => directed(x.cmp(&y), ascending),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Entries for the category filter selector.
pub fn filter_choices(categories: &[String]) -> Vec<String> {
    [FILTER_ALL, FILTER_UNCATEGORIZED]
        .into_iter()
        .map(str::to_string)
        .chain(categories.iter().cloned())
        .collect()
}
