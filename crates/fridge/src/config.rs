//! Fridge configuration.

use std::time::Duration;

use domain::Product;

/// Maximum total weight the fridge holds.
pub const DEFAULT_MAX_WEIGHT: i64 = 100;

/// Maximum number of items (slots) the fridge holds.
pub const DEFAULT_MAX_SPACE: i64 = 10;

/// How long an order aggregator waits for both tracker replies.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

const DEFAULT_STOCK: [&str; 6] = ["apple", "apple", "apple", "watermelon", "elden ring", "beer"];

/// Settings used when spawning a [`Fridge`](crate::Fridge).
///
/// Defaults:
/// - `max_weight` — 100
/// - `max_space` — 10
/// - `reply_timeout` — 5 seconds; `None` waits forever
/// - `initial_stock` — apple ×3, watermelon, elden ring, beer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FridgeConfig {
    pub max_weight: i64,
    pub max_space: i64,
    pub reply_timeout: Option<Duration>,
    pub initial_stock: Vec<Product>,
}

impl FridgeConfig {
    /// Replaces the stock the fridge starts with.
    pub fn with_initial_stock(mut self, stock: Vec<Product>) -> Self {
        self.initial_stock = stock;
        self
    }

    /// Replaces the capacity limits of both trackers.
    pub fn with_capacity(mut self, max_weight: i64, max_space: i64) -> Self {
        self.max_weight = max_weight;
        self.max_space = max_space;
        self
    }

    /// Sets how long order aggregators wait for tracker replies.
    pub fn with_reply_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.reply_timeout = timeout;
        self
    }
}

impl Default for FridgeConfig {
    fn default() -> Self {
        Self {
            max_weight: DEFAULT_MAX_WEIGHT,
            max_space: DEFAULT_MAX_SPACE,
            reply_timeout: Some(DEFAULT_REPLY_TIMEOUT),
            initial_stock: DEFAULT_STOCK
                .iter()
                .filter_map(|name| Product::from_catalog(name))
                .collect(),
        }
    }
}
