use thiserror::Error;

use super::classify::{ClassifyReport, Classifier};
use super::rules::RuleSet;
use super::transaction::{RowId, Transaction, ValidatedEdit};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Row {0} no longer exists")]
    UnknownRow(RowId),
    #[error("No row at position {index}; the current view has {len} rows")]
    StaleIndex { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: RowId,
    pub transaction: Transaction,
}

/// The loaded transactions in their canonical order. Only mutated through
/// `&mut self`; views borrow it immutably.
#[derive(Debug, Clone, Default)]
pub struct WorkingTable {
    rows: Vec<Row>,
    next_id: u64,
}

impl WorkingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh table from an import. Any incoming category is discarded.
    pub fn from_transactions<I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = Transaction>,
    {
        let mut table = Self::new();
        for mut tx in transactions {
            tx.category.clear();
            table.push(tx);
        }
        table
    }

    pub fn push(&mut self, transaction: Transaction) -> RowId {
        let id = RowId(self.next_id);
        self.next_id += 1;
        self.rows.push(Row { id, transaction });
        id
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.rows.iter().map(|row| &row.transaction)
    }

    pub fn get(&self, id: RowId) -> Option<&Transaction> {
        self.rows
            .iter()
            .find(|row| row.id == id)
            .map(|row| &row.transaction)
    }

    fn position(&self, id: RowId) -> Result<usize, LookupError> {
        self.rows
            .iter()
            .position(|row| row.id == id)
            .ok_or(LookupError::UnknownRow(id))
    }

    /// Re-runs classification over every row with `rules`.
    pub fn classify(&mut self, rules: &RuleSet) -> ClassifyReport {
        Classifier::new(rules).classify(self.rows.iter_mut().map(|row| &mut row.transaction))
    }

    pub fn apply_edit(&mut self, id: RowId, edit: &ValidatedEdit) -> Result<(), LookupError> {
        let idx = self.position(id)?;
        edit.apply_to(&mut self.rows[idx].transaction);
        Ok(())
    }

    pub fn delete(&mut self, id: RowId) -> Result<Transaction, LookupError> {
        let idx = self.position(id)?;
        Ok(self.rows.remove(idx).transaction)
    }

    pub fn uncategorized_count(&self) -> usize {
        self.transactions().filter(|tx| !tx.is_categorized()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Amount, Money};
    use crate::rules::CategoryRules;
    use crate::transaction::RowEdit;

    fn tx(desc: &str, amount: &str) -> Transaction {
        Transaction::new("2024-03-01", desc, Amount::parse(amount))
    }

    fn sample() -> WorkingTable {
        WorkingTable::from_transactions(vec![
            tx("SALARY", "1000"),
            tx("RENT", "-800"),
            tx("SALARY", "1000"),
        ])
    }

    #[test]
    fn import_discards_source_categories() {
        let table = WorkingTable::from_transactions(vec![tx("X", "1").with_category("Old")]);
        assert_eq!(table.uncategorized_count(), 1);
    }

    #[test]
    fn identical_rows_get_distinct_ids() {
        let table = sample();
        let ids: Vec<_> = table.rows().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RowId(0), RowId(1), RowId(2)]);
        assert_eq!(table.get(RowId(0)), table.get(RowId(2)));
    }

    #[test]
    fn delete_removes_only_that_row() {
        let mut table = sample();
        let removed = table.delete(RowId(1)).unwrap();
        assert_eq!(removed.description, "RENT");
        assert_eq!(table.len(), 2);
        assert!(table.get(RowId(1)).is_none());
    }

    #[test]
    fn delete_unknown_row_leaves_table_untouched() {
        let mut table = sample();
        table.delete(RowId(1)).unwrap();
        assert_eq!(
            table.delete(RowId(1)),
            Err(LookupError::UnknownRow(RowId(1)))
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut table = sample();
        table.delete(RowId(2)).unwrap();
        assert_eq!(table.push(tx("NEW", "1")), RowId(3));
    }

    #[test]
    fn apply_edit_updates_in_place() {
        let mut table = sample();
        let edit = ValidatedEdit::validate(RowEdit {
            category: "Housing".to_string(),
            amount: "-850".to_string(),
            description: "RENT MARCH".to_string(),
        })
        .unwrap();
        table.apply_edit(RowId(1), &edit).unwrap();
        let row = table.get(RowId(1)).unwrap();
        assert_eq!(row.category, "Housing");
        assert_eq!(row.description, "RENT MARCH");
        assert_eq!(row.amount.value(), Some(Money::from_cents(-85000)));
        assert_eq!(table.rows()[1].id, RowId(1));
    }

    #[test]
    fn classify_reports_remaining_uncategorized() {
        let mut table = sample();
        let mut rules = RuleSet::new();
        rules.insert(
            "Income",
            CategoryRules {
                exact: vec!["SALARY".to_string()],
                contains: vec![],
            },
        );
        let report = table.classify(&rules);
        assert_eq!(report.exact, 2);
        assert_eq!(report.uncategorized, 1);
        assert_eq!(table.uncategorized_count(), 1);
    }
}
