//! Fridge stock: an ordered multiset of products.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::product::Product;

/// Errors that can occur when mutating stock.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    /// No instance of the product is in stock.
    #[error("Product not in stock: {name}")]
    NotInStock { name: String },
}

/// The products currently held, in the order they were stocked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stock {
    items: Vec<Product>,
}

impl Stock {
    /// Creates an empty stock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one instance of `product`.
    pub fn add(&mut self, product: Product) {
        self.items.push(product);
    }

    /// Removes the first instance structurally equal to `product`.
    ///
    /// Returns how many instances of that product remain afterwards.
    pub fn remove_one(&mut self, product: &Product) -> Result<usize, StockError> {
        let index = self
            .items
            .iter()
            .position(|p| p == product)
            .ok_or_else(|| StockError::NotInStock {
                name: product.name().to_string(),
            })?;
        self.items.remove(index);
        Ok(self.count(product))
    }

    /// Returns the number of instances of `product`.
    pub fn count(&self, product: &Product) -> usize {
        self.items.iter().filter(|p| *p == product).count()
    }

    pub fn contains(&self, product: &Product) -> bool {
        self.items.contains(product)
    }

    /// Number of items, i.e. occupied slots.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of the unit weights of every item.
    pub fn total_weight(&self) -> i64 {
        self.items
            .iter()
            .map(Product::unit_weight)
            .fold(0, i64::saturating_add)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.items.iter()
    }

    pub fn to_vec(&self) -> Vec<Product> {
        self.items.clone()
    }
}

impl FromIterator<Product> for Stock {
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Display for Stock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Fridge content:")?;
        if self.items.is_empty() {
            writeln!(f, "  (empty)")?;
        }
        for product in &self.items {
            writeln!(f, "  {product}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str) -> Product {
        Product::from_catalog(name).unwrap()
    }

    fn sample() -> Stock {
        ["apple", "apple", "watermelon", "beer"]
            .into_iter()
            .map(product)
            .collect()
    }

    #[test]
    fn test_totals() {
        let stock = sample();
        assert_eq!(stock.len(), 4);
        assert_eq!(stock.total_weight(), 2 + 2 + 20 + 3);
        assert_eq!(stock.count(&product("apple")), 2);
        assert!(!stock.contains(&product("elden ring")));
    }

    #[test]
    fn test_remove_one_reports_remaining() {
        let mut stock = sample();
        let apple = product("apple");

        assert_eq!(stock.remove_one(&apple), Ok(1));
        assert_eq!(stock.remove_one(&apple), Ok(0));
        assert_eq!(stock.len(), 2);
        assert!(!stock.contains(&apple));
    }

    #[test]
    fn test_remove_missing_product() {
        let mut stock = sample();
        let result = stock.remove_one(&product("elden ring"));
        assert_eq!(
            result,
            Err(StockError::NotInStock {
                name: "elden ring".to_string()
            })
        );
        assert_eq!(stock, sample());
    }

    #[test]
    fn test_remove_requires_structural_match() {
        let mut stock = sample();
        let cheap_beer = Product::new("beer", crate::Money::from_cents(1), 3);
        assert!(stock.remove_one(&cheap_beer).is_err());
        assert_eq!(stock.len(), 4);
    }

    #[test]
    fn test_add_preserves_order() {
        let mut stock = Stock::new();
        assert!(stock.is_empty());
        stock.add(product("beer"));
        stock.add(product("apple"));
        let names: Vec<_> = stock.iter().map(|p| p.name()).collect();
        assert_eq!(names, ["beer", "apple"]);
    }

    #[test]
    fn test_display_lists_items() {
        let rendered = sample().to_string();
        assert!(rendered.starts_with("Fridge content:"));
        assert_eq!(rendered.matches("apple").count(), 2);
        assert!(Stock::new().to_string().contains("(empty)"));
    }
}
