pub mod classify;
pub mod money;
pub mod rules;
pub mod summary;
pub mod table;
pub mod transaction;
pub mod view;

pub use classify::{classify, ClassifyReport, Classifier};
pub use money::{parse_money, parse_money_with, Amount, AmountError, DecimalSeparator, Money};
pub use rules::{CategoryRules, RuleSet};
pub use summary::{category_totals, overall_totals, SummaryRow, Totals};
pub use table::{LookupError, Row, WorkingTable};
pub use transaction::{
    parse_date, RowEdit, RowId, Transaction, ValidatedEdit, ValidationError, CATEGORY_PLACEHOLDER,
};
pub use view::{
    filter, filter_choices, sort, CategoryFilter, Column, SignFilter, View, ViewFilter, ViewRow,
};
