use std::collections::HashMap;

use super::rules::RuleSet;
use super::transaction::Transaction;

/// How many rows each pass categorized in one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyReport {
    pub exact: usize,
    pub contains: usize,
    pub uncategorized: usize,
}

impl ClassifyReport {
    pub fn categorized(&self) -> usize {
        self.exact + self.contains
    }
}

/// A lowercased contains-pattern with the category it belongs to.
struct CompiledPattern<'r> {
    category: &'r str,
    needle: String,
}

/// A rule set prepared for matching: exact descriptions indexed, contains
/// patterns lowercased once, both in rule-set declaration order.
pub struct Classifier<'r> {
    exact: HashMap<&'r str, &'r str>,
    patterns: Vec<CompiledPattern<'r>>,
}

impl<'r> Classifier<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        let mut exact = HashMap::new();
        let mut patterns = Vec::new();

        for (category, category_rules) in rules.iter() {
            for description in &category_rules.exact {
                // First declared category keeps a duplicated description.
                exact.entry(description.as_str()).or_insert(category);
            }
            patterns.extend(
                category_rules
                    .contains
                    .iter()
                    .filter(|p| !p.is_empty())
                    .map(|p| CompiledPattern {
                        category,
                        needle: p.to_lowercase(),
                    }),
            );
        }

        Self { exact, patterns }
    }

    pub fn exact_match(&self, description: &str) -> Option<&'r str> {
        self.exact.get(description).copied()
    }

    pub fn contains_match(&self, description: &str) -> Option<&'r str> {
        let text = description.to_lowercase();
        self.patterns
            .iter()
            .find(|p| text.contains(&p.needle))
            .map(|p| p.category)
    }

    /// The category a single description would receive.
    pub fn categorize(&self, description: &str) -> Option<&'r str> {
        self.exact_match(description)
            .or_else(|| self.contains_match(description))
    }

    /// Resets and re-categorizes every transaction. Pass 1 assigns exact
    /// matches; pass 2 only considers rows pass 1 left empty.
    pub fn classify<'t, I>(&self, transactions: I) -> ClassifyReport
    where
        I: IntoIterator<Item = &'t mut Transaction>,
    {
        let mut pending: Vec<&mut Transaction> = transactions.into_iter().collect();
        let mut report = ClassifyReport::default();

        for tx in pending.iter_mut() {
            tx.category.clear();
            if let Some(category) = self.exact_match(&tx.description) {
                tx.category = category.to_string();
                report.exact += 1;
            }
        }

        pending.retain(|tx| !tx.is_categorized());

        for tx in pending.iter_mut() {
            if let Some(category) = self.contains_match(&tx.description) {
                tx.category = category.to_string();
                report.contains += 1;
            }
        }

        report.uncategorized = pending.iter().filter(|tx| !tx.is_categorized()).count();
        report
    }
}

/// Categorizes a batch against `rules` in one call.
pub fn classify(transactions: &mut [Transaction], rules: &RuleSet) -> ClassifyReport {
    Classifier::new(rules).classify(transactions.iter_mut())
}
