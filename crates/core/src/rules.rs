use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// The two rule kinds registered under one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRules {
    /// Full descriptions, matched case-sensitively.
    #[serde(default)]
    pub exact: Vec<String>,
    /// Substrings, matched case-insensitively, tried in list order.
    #[serde(default)]
    pub contains: Vec<String>,
}

impl CategoryRules {
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.contains.is_empty()
    }
}

/// Category name → rules, in declaration order. Order decides ties during
/// classification, so it is preserved through load and save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    categories: Vec<(String, CategoryRules)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryRules)> {
        self.categories.iter().map(|(name, rules)| (name.as_str(), rules))
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, category: &str) -> Option<&CategoryRules> {
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, rules)| rules)
    }

    /// Replaces the rules of an existing category in place, or appends a new one.
    pub fn insert(&mut self, category: &str, rules: CategoryRules) {
        *self.entry(category) = rules;
    }

    /// Rules for `category`, appending an empty entry if it is not declared yet.
    pub fn entry(&mut self, category: &str) -> &mut CategoryRules {
        let idx = match self.categories.iter().position(|(name, _)| name == category) {
            Some(idx) => idx,
            None => {
                self.categories
                    .push((category.to_string(), CategoryRules::default()));
                self.categories.len() - 1
            }
        };
        &mut self.categories[idx].1
    }

    /// Which category's exact set holds `description`, first declared wins.
    pub fn exact_owner(&self, description: &str) -> Option<&str> {
        self.iter()
            .find(|(_, rules)| rules.exact.iter().any(|d| d == description))
            .map(|(name, _)| name)
    }

    /// Records a manual choice: `description` becomes an exact rule of
    /// `category` and of no other category. Calling it twice is a no-op.
    pub fn learn(&mut self, category: &str, description: &str) {
        for (name, rules) in self.categories.iter_mut() {
            if name != category {
                rules.exact.retain(|d| d != description);
            }
        }

        let rules = self.entry(category);
        if !rules.exact.iter().any(|d| d == description) {
            rules.exact.push(description.to_string());
        }
    }

    /// Drops `description` from every exact list. Categories stay declared
    /// even when this empties them.
    pub fn forget(&mut self, description: &str) {
        for (_, rules) in self.categories.iter_mut() {
            rules.exact.retain(|d| d != description);
        }
    }

    /// An edit renamed a row from `old_description`: the old text no longer
    /// owns a category and the new one is learned.
    pub fn relearn(&mut self, category: &str, old_description: &str, description: &str) {
        self.forget(old_description);
        self.learn(category, description);
    }
}

impl FromIterator<(String, CategoryRules)> for RuleSet {
    fn from_iter<I: IntoIterator<Item = (String, CategoryRules)>>(iter: I) -> Self {
        let mut set = RuleSet::new();
        for (name, rules) in iter {
            set.insert(&name, rules);
        }
        set
    }
}

impl Serialize for RuleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for (name, rules) in &self.categories {
            map.serialize_entry(name, rules)?;
        }
        map.end()
    }
}
