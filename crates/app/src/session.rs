use sortbook_core::{
    category_totals, filter, filter_choices, overall_totals, sort, ClassifyReport, Column,
    LookupError, RowEdit, RowId, RuleSet, SummaryRow, Totals, Transaction, ValidatedEdit,
    ValidationError, View, ViewFilter, WorkingTable,
};
use sortbook_import::{export_file, import_file, ExportError, ImportError};
use sortbook_storage::{load_categories, migrate_file, PersistenceError, RuleStore};
use std::path::Path;
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Lookup(#[from] LookupError),
    #[error("Could not save rules: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

/// One user's working state: the loaded table, the rule store, and the
/// filter currently applied. Commands run one at a time against it.
pub struct Session {
    config: AppConfig,
    store: RuleStore,
    categories: Vec<String>,
    table: WorkingTable,
    filter: ViewFilter,
}

impl Session {
    pub fn open(config: AppConfig) -> Self {
        let store = RuleStore::open(&config.store_config());
        let categories = load_categories(&config.categories_path);
        tracing::info!("Session ready with {} categories", categories.len());
        Self {
            config,
            store,
            categories,
            table: WorkingTable::new(),
            filter: ViewFilter::default(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleSet {
        self.store.rules()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// "All", "Uncategorized", then the configured categories.
    pub fn category_choices(&self) -> Vec<String> {
        filter_choices(&self.categories)
    }

    pub fn table(&self) -> &WorkingTable {
        &self.table
    }

    pub fn current_filter(&self) -> &ViewFilter {
        &self.filter
    }

    /// Imports `path` and classifies it. On failure the current table stays.
    pub fn load(&mut self, path: &Path) -> Result<ClassifyReport, SessionError> {
        let transactions = import_file(path, &self.config.import)?;
        let report = self.replace_transactions(transactions);
        tracing::info!(
            "Loaded {} rows from {}; {} left uncategorized",
            self.table.len(),
            path.display(),
            report.uncategorized
        );
        Ok(report)
    }

    /// Discards the current table for `transactions`, classified against the
    /// current rules, and clears the filter.
    pub fn replace_transactions(&mut self, transactions: Vec<Transaction>) -> ClassifyReport {
        let mut table = WorkingTable::from_transactions(transactions);
        let report = table.classify(self.store.rules());
        self.table = table;
        self.filter = ViewFilter::default();
        report
    }

    pub fn reclassify(&mut self) -> ClassifyReport {
        self.table.classify(self.store.rules())
    }

    pub fn set_filter(&mut self, filter: ViewFilter) {
        self.filter = filter;
    }

    pub fn clear_filter(&mut self) {
        self.filter = ViewFilter::default();
    }

    /// Recomputed on every call; nothing is cached across mutations.
    pub fn view(&self) -> View<'_> {
        filter(&self.table, &self.filter)
    }

    pub fn sort(&mut self, column: Column, ascending: bool) {
        sort(&mut self.table, column, ascending);
    }

    pub fn category_totals(&self) -> Vec<SummaryRow> {
        category_totals(self.view().transactions())
    }

    pub fn overall_totals(&self) -> Totals {
        overall_totals(self.view().transactions())
    }

    /// Edits the row at `display_index` of the current view.
    pub fn edit(&mut self, display_index: usize, edit: RowEdit) -> Result<RowId, SessionError> {
        let validated = ValidatedEdit::validate(edit)?;
        let id = self.view().resolve(display_index)?;
        self.apply_edit(id, &validated)?;
        Ok(id)
    }

    /// Edits the row with `id`, wherever it sits in the table. A deleted or
    /// replaced row is `LookupError::UnknownRow`.
    pub fn edit_row(&mut self, id: RowId, edit: RowEdit) -> Result<(), SessionError> {
        let validated = ValidatedEdit::validate(edit)?;
        self.apply_edit(id, &validated)
    }

    /// Applies the edit, then forgets the row's old description and learns
    /// the new one. The row stays edited even if saving the rules fails.
    fn apply_edit(&mut self, id: RowId, edit: &ValidatedEdit) -> Result<(), SessionError> {
        let old_description = self
            .table
            .get(id)
            .map(|tx| tx.description.clone())
            .ok_or(LookupError::UnknownRow(id))?;
        self.table.apply_edit(id, edit)?;
        self.store.relearn(&edit.category, &old_description, &edit.description)?;
        tracing::info!("Learned '{}' as {}", edit.description, edit.category);
        Ok(())
    }

    pub fn delete(&mut self, display_index: usize) -> Result<Transaction, SessionError> {
        let id = self.view().resolve(display_index)?;
        self.delete_row(id)
    }

    pub fn delete_row(&mut self, id: RowId) -> Result<Transaction, SessionError> {
        let removed = self.table.delete(id)?;
        tracing::debug!("Deleted row {id}");
        Ok(removed)
    }

    /// Writes the current view, in view order.
    pub fn export(&self, path: &Path) -> Result<usize, SessionError> {
        let written = export_file(path, self.view().transactions(), &self.config.import)?;
        tracing::info!("Exported {written} rows to {}", path.display());
        Ok(written)
    }

    /// Copies the current rules to `path`, e.g. for a backup.
    pub fn export_rules(&self, path: &Path) -> Result<(), SessionError> {
        self.store.export_to(path)?;
        tracing::info!("Exported {} rule categories to {}", self.rules().len(), path.display());
        Ok(())
    }

    pub fn replace_rules(&mut self, rules: RuleSet) -> Result<(), SessionError> {
        self.store.replace(rules)?;
        Ok(())
    }

    /// Converts a legacy flat keyword file into the rule store, replacing it.
    pub fn migrate(&mut self, source: &Path) -> Result<usize, SessionError> {
        let rules = migrate_file(source, self.store.path())?;
        let count = rules.len();
        self.store.reload();
        Ok(count)
    }
}
