//! Integration tests for the fridge replenishment pipeline.

use std::time::Duration;

use domain::{Money, Product};
use fridge::{CapacityState, Fridge, FridgeConfig, FridgeEvent, FridgeHandle};
use tokio::sync::broadcast;

const WAIT: Duration = Duration::from_secs(2);

fn product(name: &str) -> Product {
    Product::from_catalog(name).unwrap()
}

struct TestHarness {
    fridge: FridgeHandle,
    events: broadcast::Receiver<FridgeEvent>,
}

impl TestHarness {
    fn new(stock: &[&str]) -> Self {
        Self::with_config(FridgeConfig::default(), stock)
    }

    fn with_config(config: FridgeConfig, stock: &[&str]) -> Self {
        let config = config
            .with_initial_stock(stock.iter().map(|name| product(name)).collect())
            .with_reply_timeout(Some(WAIT));
        let (fridge, _join) = Fridge::spawn(config);
        let events = fridge.subscribe();
        Self { fridge, events }
    }

    /// Waits for the next event matching `pred`, collecting everything seen.
    async fn wait_for(&mut self, pred: impl Fn(&FridgeEvent) -> bool) -> Vec<FridgeEvent> {
        let mut seen = Vec::new();
        loop {
            let event = tokio::time::timeout(WAIT, self.events.recv())
                .await
                .expect("timed out waiting for fridge event")
                .expect("event channel closed");
            let done = pred(&event);
            seen.push(event);
            if done {
                return seen;
            }
        }
    }

    async fn next_outcome(&mut self) -> FridgeEvent {
        let mut seen = self.wait_for(FridgeEvent::is_order_outcome).await;
        seen.pop().unwrap()
    }

    /// Asserts that no event arrives within a short grace period.
    async fn assert_quiet(&mut self) {
        let next = tokio::time::timeout(Duration::from_millis(200), self.events.recv()).await;
        assert!(next.is_err(), "unexpected event: {next:?}");
    }
}

#[tokio::test]
async fn test_fitting_order_is_stocked_and_recorded() {
    let mut h = TestHarness::new(&["apple", "watermelon"]);
    let before = h.fridge.snapshot().await.unwrap();

    h.fridge.request_order(product("beer")).unwrap();

    let outcome = h.next_outcome().await;
    let FridgeEvent::StockCommitted { order, .. } = outcome else {
        panic!("expected StockCommitted, got {outcome:?}");
    };
    assert_eq!(order.product, product("beer"));

    let after = h.fridge.snapshot().await.unwrap();
    assert_eq!(
        after.stock.count(&product("beer")),
        before.stock.count(&product("beer")) + 1
    );
    assert_eq!(after.orders.len(), before.orders.len() + 1);
    assert_eq!(after.orders[0].product, product("beer"));
    assert_eq!(after.orders[0].id, order.id);
    assert_eq!(after.weight.current, before.weight.current + 3);
    assert_eq!(after.space.current, before.space.current + 1);
}

#[tokio::test]
async fn test_every_catalog_product_fits_an_empty_fridge() {
    let mut h = TestHarness::new(&[]);

    for p in Product::catalog() {
        h.fridge.request_order(p.clone()).unwrap();
        let outcome = h.next_outcome().await;
        assert!(
            matches!(&outcome, FridgeEvent::StockCommitted { order, .. } if order.product == p),
            "unexpected outcome {outcome:?}"
        );
    }

    let snapshot = h.fridge.snapshot().await.unwrap();
    assert_eq!(snapshot.stock.len(), 4);
    assert_eq!(snapshot.orders.len(), 4);
    assert_eq!(snapshot.weight.current, 2 + 20 + 2 + 3);
}

#[tokio::test]
async fn test_full_space_rejects_order() {
    let beers = ["beer"; 10];
    let mut h = TestHarness::new(&beers);
    let before = h.fridge.snapshot().await.unwrap();
    assert_eq!(before.space, CapacityState { current: 10, max: 10 });

    h.fridge.request_order(product("beer")).unwrap();

    let outcome = h.next_outcome().await;
    assert!(matches!(
        outcome,
        FridgeEvent::OrderRejected {
            available_space: 0,
            available_weight: 70,
            ..
        }
    ));
    assert_eq!(h.fridge.snapshot().await.unwrap(), before);
}

#[tokio::test]
async fn test_insufficient_weight_rejects_order() {
    // 4 watermelons weigh 80, leaving exactly 20: not strictly more than 20.
    let mut h = TestHarness::new(&["watermelon"; 4]);
    let before = h.fridge.snapshot().await.unwrap();

    h.fridge.request_order(product("watermelon")).unwrap();

    let outcome = h.next_outcome().await;
    assert!(matches!(
        outcome,
        FridgeEvent::OrderRejected {
            available_weight: 20,
            available_space: 6,
            ..
        }
    ));
    assert_eq!(h.fridge.snapshot().await.unwrap(), before);

    // A lighter product still fits.
    h.fridge.request_order(product("apple")).unwrap();
    assert!(matches!(
        h.next_outcome().await,
        FridgeEvent::StockCommitted { .. }
    ));
}

#[tokio::test]
async fn test_consuming_last_instance_triggers_one_reorder() {
    let mut h = TestHarness::new(&["apple", "apple", "apple", "watermelon"]);
    let before = h.fridge.snapshot().await.unwrap();
    assert_eq!(before.weight.current, 26);
    assert_eq!(before.space.current, 4);

    for _ in 0..3 {
        h.fridge.consume(product("apple")).unwrap();
    }

    let seen = h.wait_for(FridgeEvent::is_order_outcome).await;
    let triggered = seen
        .iter()
        .filter(|e| matches!(e, FridgeEvent::ReplenishmentTriggered { .. }))
        .count();
    let requested = seen
        .iter()
        .filter(|e| matches!(e, FridgeEvent::OrderRequested { .. }))
        .count();
    assert_eq!(triggered, 1);
    assert_eq!(requested, 1);
    assert!(matches!(
        seen.last(),
        Some(FridgeEvent::StockCommitted { order, .. }) if order.product == product("apple")
    ));
    h.assert_quiet().await;

    let after = h.fridge.snapshot().await.unwrap();
    assert_eq!(after.stock.count(&product("apple")), 1);
    assert_eq!(after.stock.count(&product("watermelon")), 1);
    assert_eq!(after.stock.len(), 2);
    assert_eq!(after.orders.len(), 1);
    assert_eq!(after.orders[0].product, product("apple"));
    assert_eq!(after.weight.current, 22);
    assert_eq!(after.space.current, 2);
}

#[tokio::test]
async fn test_consume_with_remaining_instances_does_not_reorder() {
    let mut h = TestHarness::new(&["beer", "beer"]);

    h.fridge.consume(product("beer")).unwrap();

    let seen = h
        .wait_for(|e| matches!(e, FridgeEvent::Consumed { .. }))
        .await;
    assert_eq!(
        seen,
        vec![FridgeEvent::Consumed {
            product: product("beer"),
            remaining: 1
        }]
    );
    h.assert_quiet().await;
}

#[tokio::test]
async fn test_consume_miss_changes_nothing() {
    let mut h = TestHarness::new(&["apple"]);
    let before = h.fridge.snapshot().await.unwrap();

    h.fridge.consume(product("elden ring")).unwrap();

    let seen = h
        .wait_for(|e| matches!(e, FridgeEvent::ConsumeMissed { .. }))
        .await;
    assert_eq!(seen.len(), 1);
    h.assert_quiet().await;
    assert_eq!(h.fridge.snapshot().await.unwrap(), before);
}

#[tokio::test]
async fn test_rejected_reorder_leaves_product_understocked() {
    // Max weight 23 leaves exactly 3 after the beer is gone: too little for another.
    let config = FridgeConfig::default().with_capacity(23, 10);
    let mut h = TestHarness::with_config(config, &["watermelon", "beer"]);

    h.fridge.consume(product("beer")).unwrap();

    let outcome = h.next_outcome().await;
    assert!(matches!(
        outcome,
        FridgeEvent::OrderRejected {
            available_weight: 3,
            ..
        }
    ));
    h.assert_quiet().await;

    let snapshot = h.fridge.snapshot().await.unwrap();
    assert_eq!(snapshot.stock.count(&product("beer")), 0);
    assert!(snapshot.orders.is_empty());
}

#[tokio::test]
async fn test_concurrent_orders_for_same_product_are_independent() {
    let mut h = TestHarness::new(&[]);

    for _ in 0..5 {
        h.fridge.request_order(product("apple")).unwrap();
    }

    let mut aggregators = Vec::new();
    for _ in 0..5 {
        match h.next_outcome().await {
            FridgeEvent::StockCommitted { aggregator_id, .. } => aggregators.push(aggregator_id),
            other => panic!("expected StockCommitted, got {other:?}"),
        }
    }
    aggregators.sort_by_key(|id| id.to_string());
    aggregators.dedup();
    assert_eq!(aggregators.len(), 5);

    let snapshot = h.fridge.snapshot().await.unwrap();
    assert_eq!(snapshot.stock.count(&product("apple")), 5);
    assert_eq!(snapshot.orders.len(), 5);
}

#[tokio::test]
async fn test_counters_match_stock_after_overfilling() {
    // Orders in flight all see the same headroom, so more than max_space can commit.
    let config = FridgeConfig::default().with_capacity(100, 3);
    let mut h = TestHarness::with_config(config, &[]);

    for _ in 0..5 {
        h.fridge.request_order(product("apple")).unwrap();
    }
    for _ in 0..5 {
        h.next_outcome().await;
    }

    let snapshot = h.fridge.snapshot().await.unwrap();
    assert!(snapshot.stock.len() >= 3);
    assert_eq!(snapshot.space.current, snapshot.stock.len() as i64);
    assert_eq!(snapshot.weight.current, snapshot.stock.total_weight());

    // Consuming brings the counter back under the limit only once the stock really fits.
    let extra = snapshot.stock.len() - 2;
    for _ in 0..extra {
        h.fridge.consume(product("apple")).unwrap();
    }
    let snapshot = h.fridge.snapshot().await.unwrap();
    assert_eq!(snapshot.stock.len(), 2);
    assert_eq!(snapshot.space.current, 2);

    h.fridge.request_order(product("beer")).unwrap();
    assert!(matches!(
        h.next_outcome().await,
        FridgeEvent::StockCommitted { .. }
    ));
}

#[tokio::test]
async fn test_extreme_product_weight_keeps_trackers_running() {
    let odd = Product::new("void", Money::from_cents(1), i64::MIN);
    let config = FridgeConfig::default()
        .with_initial_stock(vec![odd.clone()])
        .with_reply_timeout(Some(WAIT));
    let (fridge, _join) = Fridge::spawn(config);
    let mut events = fridge.subscribe();

    fridge.consume(odd).unwrap();
    let snapshot = fridge.snapshot().await.unwrap();
    assert!(snapshot.stock.is_empty());

    fridge.request_order(product("apple")).unwrap();
    let outcome = tokio::time::timeout(WAIT, async {
        loop {
            match events.recv().await.unwrap() {
                FridgeEvent::StockCommitted { order, .. } if order.product == product("apple") => {
                    return true;
                }
                FridgeEvent::OrderAbandoned { .. } => return false,
                _ => {}
            }
        }
    })
    .await
    .unwrap();
    assert!(outcome, "trackers stopped answering");
}

#[tokio::test]
async fn test_fridge_stops_after_last_handle_dropped() {
    let (fridge, join) = Fridge::spawn(FridgeConfig::default());
    let clone = fridge.clone();
    drop(fridge);
    // A clone still keeps the fridge alive.
    assert!(clone.snapshot().await.is_ok());
    drop(clone);

    tokio::time::timeout(WAIT, join).await.unwrap().unwrap();
}
