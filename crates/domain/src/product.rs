//! Product definitions and the fixed catalog.

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Names accepted by [`Product::from_catalog`], in catalog order.
pub const CATALOG_NAMES: [&str; 4] = ["apple", "watermelon", "elden ring", "beer"];

/// An immutable product definition.
///
/// Identity is structural: two products with the same name, price and weight
/// are the same product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Product {
    name: String,
    unit_price: Money,
    unit_weight: i64,
}

impl Product {
    /// Creates a product outside the catalog.
    pub fn new(name: impl Into<String>, unit_price: Money, unit_weight: i64) -> Self {
        Self {
            name: name.into(),
            unit_price,
            unit_weight,
        }
    }

    /// Looks up a product by name. Unknown names yield `None`.
    pub fn from_catalog(name: &str) -> Option<Self> {
        let (price, weight) = match name {
            "apple" => (100, 2),
            "watermelon" => (300, 20),
            "elden ring" => (6900, 2),
            "beer" => (230, 3),
            _ => return None,
        };
        Some(Self::new(name, Money::from_cents(price), weight))
    }

    /// Returns every catalog product, in catalog order.
    pub fn catalog() -> Vec<Self> {
        CATALOG_NAMES
            .iter()
            .filter_map(|name| Self::from_catalog(name))
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn unit_weight(&self) -> i64 {
        self.unit_weight
    }
}

impl std::fmt::Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (price {}, weight {})",
            self.name, self.unit_price, self.unit_weight
        )
    }
}
