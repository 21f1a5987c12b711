//! Product category.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A product category, normalized once when product data enters the system.
///
/// `key` is the trimmed value the backend sent, `id` is the comparison key
/// (trimmed, lower-cased) and `label` is what the shopper sees. Two
/// categories are the same category when their ids match, whatever their
/// labels look like.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    key: String,
    id: String,
    label: String,
}

impl Category {
    /// Create a category from a raw key and a display label.
    ///
    /// Returns `None` when the key is blank after trimming. A blank label
    /// falls back to the trimmed key.
    #[must_use]
    pub fn new(key: &str, label: &str) -> Option<Self> {
        let id = Self::normalize(key);
        if id.is_empty() {
            return None;
        }
        let label = match label.trim() {
            "" => key.trim(),
            trimmed => trimmed,
        };
        Some(Self {
            key: key.trim().to_owned(),
            id,
            label: label.to_owned(),
        })
    }

    /// Create a category whose key is its label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::new(label, label)
    }

    /// Normalize a raw category value for comparison.
    #[must_use]
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    /// The key as the backend knows it; use this when filtering by category.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The normalized comparison key.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether this category is the one a shopper selected.
    ///
    /// The selection may be either a key or a label; both are normalized.
    #[must_use]
    pub fn matches(&self, selection: &str) -> bool {
        let wanted = Self::normalize(selection);
        self.id == wanted || Self::normalize(&self.label) == wanted
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Category {}

impl core::hash::Hash for Category {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_key() {
        let category = Category::new("  Electronics ", "Electronics").unwrap();
        assert_eq!(category.id(), "electronics");
        assert_eq!(category.key(), "Electronics");
        assert_eq!(category.label(), "Electronics");
    }

    #[test]
    fn test_blank_key_is_rejected() {
        assert!(Category::new("   ", "Anything").is_none());
        assert!(Category::from_label("").is_none());
    }

    #[test]
    fn test_blank_label_falls_back_to_key() {
        let category = Category::new("home-garden", " ").unwrap();
        assert_eq!(category.label(), "home-garden");
    }

    #[test]
    fn test_matches_key_or_label() {
        let category = Category::new("home-garden", "Home & Garden").unwrap();
        assert!(category.matches("HOME-GARDEN"));
        assert!(category.matches(" home & garden "));
        assert!(!category.matches("garden"));
    }

    #[test]
    fn test_equality_ignores_label() {
        let a = Category::new("books", "Books").unwrap();
        let b = Category::new("BOOKS", "All the books").unwrap();
        assert_eq!(a, b);
    }
}
