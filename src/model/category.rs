use crate::store::Document;
use std::collections::BTreeSet;

/// The categories offered when none have been configured.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Bills",
    "Entertainment",
    "Food",
    "Other",
    "Rent",
    "Transport",
];

/// The set of known expense categories. Names are case-sensitive and kept sorted. The registry
/// only ever grows: there is no way to remove a category.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct CategoryRegistry {
    names: BTreeSet<String>,
}

impl CategoryRegistry {
    /// Builds the registry from every category used by an expense in `document` plus `defaults`.
    /// Blank names are skipped.
    pub fn load<S>(document: &Document, defaults: impl IntoIterator<Item = S>) -> Self
    where
        S: AsRef<str>,
    {
        let used = document.expenses().iter().filter_map(|e| e.category());
        let names = defaults
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .chain(used.map(|s| s.to_string()))
            .filter(|s| !s.is_empty())
            .collect();
        Self { names }
    }

    /// Adds `name` after trimming it. Returns `false`, and changes nothing, if the trimmed name is
    /// empty or already known.
    pub fn add(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.names.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// The categories in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Kind, NewTransaction};

    fn document() -> Document {
        let mut doc = Document::default();
        doc.push(
            Kind::Expense,
            NewTransaction::expense("Coffee", "2.5", "2024-01-06", "Cafés")
                .validate()
                .unwrap(),
        );
        doc.push(
            Kind::Expense,
            NewTransaction::expense("Bus", "1", "2024-01-07", "Transport")
                .validate()
                .unwrap(),
        );
        doc
    }

    #[test]
    fn test_load_merges_and_sorts() {
        let registry = CategoryRegistry::load(&document(), DEFAULT_CATEGORIES);
        let names: Vec<&str> = registry.iter().collect();
        assert_eq!(
            names,
            vec!["Bills", "Cafés", "Entertainment", "Food", "Other", "Rent", "Transport"]
        );
    }

    #[test]
    fn test_add() {
        let mut registry = CategoryRegistry::load(&Document::default(), ["Food"]);
        assert!(registry.add("  Health "));
        assert!(registry.contains("Health"));
        assert!(!registry.add("Health"));
        assert!(!registry.add("   "));
        assert!(registry.add("food"));
        assert_eq!(registry.len(), 3);
    }
}
