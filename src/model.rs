//! Entity types stored by the bill store
//!
//! Every entity carries the identifier the store assigned on insert.
//! Identifier `0` is the "unset" sentinel and never refers to a row.

use serde::{Deserialize, Serialize};

/// Identifier assigned by the store (SQLite rowid)
pub type RowId = u32;

/// Sentinel meaning "no reference provided"
pub const UNSET_ID: RowId = 0;

/// Top-level spending classification, e.g. "Groceries"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: RowId,
    pub name: String,
}

/// Sub-classification of a category describing what a bill was for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub id: RowId,
    pub category_id: RowId,
    pub name: String,
}

impl Usage {
    pub fn new(id: RowId, category_id: RowId, name: impl Into<String>) -> Self {
        Self {
            id,
            category_id,
            name: name.into(),
        }
    }
}

/// Vendor a bill was paid to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub id: RowId,
    pub name: String,
}

/// A single expense record.
///
/// `date` is kept as the caller supplied it; the store only requires it to be
/// non-empty. `filename` references an attachment such as a scanned receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: RowId,
    pub date: String,
    pub price: f64,
    pub shop_id: RowId,
    pub usage_id: RowId,
    pub filename: Option<String>,
}

/// A bill with its references resolved to names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillDetails {
    pub id: RowId,
    pub date: String,
    pub price: f64,
    pub shop: String,
    pub usage: String,
    pub category: String,
    pub filename: Option<String>,
}

impl std::fmt::Display for BillDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} {:.2} at {} ({} / {})",
            self.id, self.date, self.price, self.shop, self.category, self.usage
        )?;
        if let Some(file) = &self.filename {
            write!(f, " [{}]", file)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bill_details_display() {
        let details = BillDetails {
            id: 3,
            date: "2024-01-05".to_string(),
            price: 42.5,
            shop: "SuperMart".to_string(),
            usage: "Weekly shop".to_string(),
            category: "Groceries".to_string(),
            filename: Some("receipt.pdf".to_string()),
        };

        assert_eq!(
            details.to_string(),
            "#3 2024-01-05 42.50 at SuperMart (Groceries / Weekly shop) [receipt.pdf]"
        );
    }

    #[test]
    fn test_bill_details_display_without_attachment() {
        let details = BillDetails {
            id: 1,
            date: "2024-02-01".to_string(),
            price: -5.0,
            shop: "Bakery".to_string(),
            usage: "Refund".to_string(),
            category: "Food".to_string(),
            filename: None,
        };

        assert!(!details.to_string().contains('['));
    }

    #[test]
    fn test_usage_serializes_snake_case() {
        let usage = Usage::new(2, 1, "Weekly shop");
        let json = serde_json::to_value(&usage).unwrap();
        assert_eq!(json["category_id"], 1);
        assert_eq!(json["name"], "Weekly shop");
    }
}
