//! Order identifiers and order-history rows

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::locator::Locator;
use crate::pages::selectors;

static PIPE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\|\s*").expect("valid regex"));

/// Server-assigned order reference, normalized for comparison.
///
/// The confirmation label decorates the id with pipes (`" | 6a1b2c | "`);
/// the normalized form has every pipe and the whitespace around it removed
/// and is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Normalize raw label text. Returns `None` when nothing is left.
    pub fn from_label(raw: &str) -> Option<Self> {
        let cleaned = PIPE_SEPARATOR.replace_all(raw, "");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            None
        } else {
            Some(Self(cleaned.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a table cell names this order. Both sides are trimmed.
    pub fn matches_cell(&self, cell: &str) -> bool {
        cell.trim() == self.0.trim()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to one row of the order-history table, valid until the table changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRow {
    /// Position among `tbody tr` in document order.
    pub index: usize,
    /// Trimmed text of the row's identifier cell.
    pub order_id: String,
    /// Full row text, used to check which product the row refers to.
    pub text: String,
}

impl OrderRow {
    pub fn delete_button(&self) -> Locator {
        selectors::order_row_delete_button(self.index)
    }

    /// Case-insensitive check that the row shows `product`.
    pub fn mentions(&self, product: &str) -> bool {
        self.text.to_lowercase().contains(&product.trim().to_lowercase())
    }
}

/// Result of deleting an order by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(OrderRow),
    NotFound,
}

impl DeleteOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(" | A1B2C3 | ", "A1B2C3" ; "surrounded by pipes")]
    #[test_case("| 6960ea76c019fb1ad6f2bb2f |", "6960ea76c019fb1ad6f2bb2f" ; "no outer whitespace")]
    #[test_case("\n   |  abc123  |\n ", "abc123" ; "newlines and padding")]
    #[test_case("abc|def", "abcdef" ; "embedded pipe")]
    #[test_case("  plain-id  ", "plain-id" ; "no pipes")]
    fn test_from_label_normalizes(raw: &str, expected: &str) {
        assert_eq!(OrderId::from_label(raw).unwrap().as_str(), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("   " ; "whitespace")]
    #[test_case(" | | " ; "only separators")]
    fn test_from_label_empty_is_none(raw: &str) {
        assert_eq!(OrderId::from_label(raw), None);
    }

    #[test]
    fn test_matches_cell_trims() {
        let id = OrderId::from_label("| abc123 |").unwrap();
        assert!(id.matches_cell("  abc123\n"));
        assert!(!id.matches_cell("abc1234"));
        assert!(!id.matches_cell(""));
    }

    #[test]
    fn test_row_mentions_product() {
        let row = OrderRow {
            index: 0,
            order_id: "abc".into(),
            text: "abc  IPHONE 13 PRO  $ 231500  Mon Jan 01".into(),
        };
        assert!(row.mentions("iphone 13 pro"));
        assert!(!row.mentions("ZARA COAT 3"));
    }
}
