//! Order records kept in the fridge's order history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;
use crate::product::Product;

/// Timestamp format used on receipts.
pub const RECEIPT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Unique identifier for a committed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random order ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An entry of the append-only order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub ordered_at: DateTime<Utc>,
    pub product: Product,
}

impl OrderRecord {
    /// Records an order for `product` placed now.
    pub fn new(product: Product) -> Self {
        Self::at(product, Utc::now())
    }

    /// Records an order for `product` placed at `ordered_at`.
    pub fn at(product: Product, ordered_at: DateTime<Utc>) -> Self {
        Self {
            id: OrderId::new(),
            ordered_at,
            product,
        }
    }

    pub fn total(&self) -> Money {
        self.product.unit_price()
    }

    /// Amount spent across `orders`.
    pub fn sum_totals(orders: &[OrderRecord]) -> Money {
        orders.iter().map(OrderRecord::total).sum()
    }

    /// Renders the human-readable receipt printed when the order is stocked.
    pub fn receipt(&self) -> String {
        format!(
            "Receipt:\n{}\n\nItems\n  {}\n\nTotal\t{}\n",
            self.ordered_at.format(RECEIPT_TIME_FORMAT),
            self.product,
            self.total()
        )
    }
}

impl std::fmt::Display for OrderRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "order {} at {}: {}",
            self.id,
            self.ordered_at.format(RECEIPT_TIME_FORMAT),
            self.product
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_record() -> OrderRecord {
        let at = Utc.with_ymd_and_hms(2024, 5, 17, 18, 30, 5).unwrap();
        OrderRecord::at(Product::from_catalog("beer").unwrap(), at)
    }

    #[test]
    fn test_order_ids_are_unique() {
        assert_ne!(OrderId::new(), OrderId::new());
        assert_ne!(fixed_record().id, fixed_record().id);
    }

    #[test]
    fn test_receipt_layout() {
        let receipt = fixed_record().receipt();
        assert!(receipt.starts_with("Receipt:\n2024-05-17 18:30:05\n"));
        assert!(receipt.contains("beer (price €2.30, weight 3)"));
        assert!(receipt.ends_with("Total\t€2.30\n"));
    }

    #[test]
    fn test_sum_totals() {
        let at = Utc.with_ymd_and_hms(2024, 5, 17, 18, 30, 5).unwrap();
        let orders: Vec<OrderRecord> = ["apple", "beer", "elden ring"]
            .into_iter()
            .map(|name| OrderRecord::at(Product::from_catalog(name).unwrap(), at))
            .collect();
        assert_eq!(OrderRecord::sum_totals(&orders), Money::from_cents(7230));
        assert_eq!(OrderRecord::sum_totals(&[]), Money::zero());
    }

    #[test]
    fn test_display_mentions_product() {
        let record = fixed_record();
        let line = record.to_string();
        assert!(line.starts_with(&format!("order {}", record.id)));
        assert!(line.contains("2024-05-17 18:30:05"));
        assert!(line.ends_with("beer (price €2.30, weight 3)"));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let record = fixed_record();
        let json = serde_json::to_string(&record).unwrap();
        let deserialized: OrderRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, deserialized);
    }
}
