//! End-to-end tests of the reservation engine, ledger queries, and catalog
//! service against the in-memory backend.
//!
//! The recurring assertion is conservation: for every product, initial stock
//! equals the available counter plus the sum of active import quantities, at
//! every quiescent point.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};

use eximhub_auth::Role;
use eximhub_catalog::{ListingDraft, Product};
use eximhub_core::{ActorId, DomainError, ImportId, ProductId, Quantity};
use eximhub_ledger::ImportRecord;

use crate::catalog_service::CatalogService;
use crate::query::LedgerQueries;
use crate::reservation::{EngineError, ReservationEngine};
use crate::store::{
    ActorRecord, InMemoryStockLedger, RoleDirectory, StockDecrement, StockLedgerStore, StoreError,
};

type MemEngine = ReservationEngine<Arc<InMemoryStockLedger>, Arc<InMemoryStockLedger>>;

fn harness() -> (Arc<InMemoryStockLedger>, MemEngine) {
    let store = Arc::new(InMemoryStockLedger::new());
    let engine = ReservationEngine::new(store.clone(), store.clone());
    (store, engine)
}

fn ts(seconds_ago: i64) -> DateTime<Utc> {
    Utc::now() - ChronoDuration::seconds(seconds_ago)
}

async fn register(store: &InMemoryStockLedger, role: Role) -> ActorId {
    let actor = ActorId::new();
    store
        .upsert_actor(&ActorRecord {
            actor_id: actor,
            email: format!("{actor}@example.com"),
            role,
            registered_at: Utc::now(),
        })
        .await
        .unwrap();
    actor
}

async fn seed_product_at(
    store: &InMemoryStockLedger,
    owner: ActorId,
    stock: i64,
    created_at: DateTime<Utc>,
) -> ProductId {
    let product = Product::from_draft(
        owner,
        ListingDraft {
            name: "Cardamom".to_string(),
            origin: "Kerala".to_string(),
            price_cents: 2_500,
            rating: Some(5),
            initial_quantity: stock,
        },
        created_at,
    )
    .unwrap();
    store.insert_product(&product).await.unwrap();
    product.id
}

async fn seed_product(store: &InMemoryStockLedger, owner: ActorId, stock: i64) -> ProductId {
    seed_product_at(store, owner, stock, Utc::now()).await
}

async fn available(store: &InMemoryStockLedger, id: ProductId) -> i64 {
    store
        .fetch_product(id)
        .await
        .unwrap()
        .unwrap()
        .available_quantity
}

async fn active_total(store: &InMemoryStockLedger, id: ProductId) -> i64 {
    store
        .imports_for_product(id)
        .await
        .unwrap()
        .iter()
        .filter(|r| r.is_active())
        .map(|r| r.quantity)
        .sum()
}

async fn assert_conserved(store: &InMemoryStockLedger, id: ProductId, initial: i64) {
    let counter = available(store, id).await;
    let reserved = active_total(store, id).await;
    assert_eq!(
        counter + reserved,
        initial,
        "conservation broken: {counter} available + {reserved} reserved != {initial}"
    );
}

#[tokio::test]
async fn reserve_decrements_counter_and_appends_record() {
    let (store, engine) = harness();
    let owner = register(&store, Role::Exporter).await;
    let importer = register(&store, Role::Importer).await;
    let product = seed_product(&store, owner, 10).await;

    let receipt = engine.reserve(product, 4, importer).await.unwrap();

    assert_eq!(receipt.remaining_stock, 6);
    assert_eq!(receipt.import.product_id, product);
    assert_eq!(receipt.import.importer_id, importer);
    assert_eq!(receipt.import.quantity, 4);
    assert!(receipt.import.is_active());

    assert_eq!(available(&store, product).await, 6);
    assert_conserved(&store, product, 10).await;
}

#[tokio::test]
async fn stock_exhausts_to_exactly_zero() {
    let (store, engine) = harness();
    let owner = register(&store, Role::Exporter).await;
    let first = register(&store, Role::Importer).await;
    let second = register(&store, Role::Importer).await;
    let product = seed_product(&store, owner, 10).await;

    let receipt = engine.reserve(product, 5, first).await.unwrap();
    assert_eq!(receipt.remaining_stock, 5);

    let err = engine.reserve(product, 6, second).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Domain(DomainError::InsufficientStock {
            requested: 6,
            available: 5
        })
    ));

    let receipt = engine.reserve(product, 5, second).await.unwrap();
    assert_eq!(receipt.remaining_stock, 0);

    let err = engine.reserve(product, 1, first).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Domain(DomainError::InsufficientStock {
            requested: 1,
            available: 0
        })
    ));

    assert_eq!(available(&store, product).await, 0);
    assert_conserved(&store, product, 10).await;
}

#[tokio::test]
async fn reserve_rejects_nonpositive_quantity_before_touching_stock() {
    let (store, engine) = harness();
    let owner = register(&store, Role::Exporter).await;
    let importer = register(&store, Role::Importer).await;
    let product = seed_product(&store, owner, 10).await;

    for quantity in [0, -4] {
        let err = engine.reserve(product, quantity, importer).await.unwrap_err();
        assert!(matches!(err, EngineError::Domain(DomainError::Validation(_))));
    }

    assert_eq!(available(&store, product).await, 10);
    assert!(store.imports_for_product(product).await.unwrap().is_empty());
}

#[tokio::test]
async fn reserve_of_unknown_product_is_not_found() {
    let (store, engine) = harness();
    let importer = register(&store, Role::Importer).await;

    let err = engine
        .reserve(ProductId::new(), 1, importer)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Domain(DomainError::NotFound(_))));
}

#[tokio::test]
async fn self_import_is_rejected_and_stock_untouched() {
    let (store, engine) = harness();

    // The check fires regardless of which capability the owner holds.
    for role in [Role::Exporter, Role::Importer] {
        let owner = register(&store, role).await;
        let product = seed_product(&store, owner, 7).await;

        let err = engine.reserve(product, 2, owner).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(DomainError::SelfImportForbidden)
        ));

        assert_eq!(available(&store, product).await, 7);
        assert!(store.imports_for_product(product).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn reserve_requires_importer_capability() {
    let (store, engine) = harness();
    let owner = register(&store, Role::Exporter).await;
    let exporter = register(&store, Role::Exporter).await;
    let unregistered = ActorId::new();
    let product = seed_product(&store, owner, 5).await;

    let err = engine.reserve(product, 1, exporter).await.unwrap_err();
    assert!(matches!(err, EngineError::Domain(DomainError::Forbidden(_))));

    let err = engine.reserve(product, 1, unregistered).await.unwrap_err();
    assert!(matches!(err, EngineError::Domain(DomainError::Forbidden(_))));

    assert_eq!(available(&store, product).await, 5);
}

#[tokio::test]
async fn release_restores_stock_exactly_once() {
    let (store, engine) = harness();
    let owner = register(&store, Role::Exporter).await;
    let importer = register(&store, Role::Importer).await;
    let product = seed_product(&store, owner, 10).await;

    let receipt = engine.reserve(product, 3, importer).await.unwrap();
    assert_eq!(available(&store, product).await, 7);

    engine.release(receipt.import.id, importer).await.unwrap();
    assert_eq!(available(&store, product).await, 10);

    let record = store.fetch_import(receipt.import.id).await.unwrap().unwrap();
    assert!(record.reversed);

    let err = engine.release(receipt.import.id, importer).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Domain(DomainError::AlreadyReversed)
    ));
    assert_eq!(available(&store, product).await, 10);
    assert_conserved(&store, product, 10).await;
}

#[tokio::test]
async fn release_is_reserved_to_the_importing_actor() {
    let (store, engine) = harness();
    let owner = register(&store, Role::Exporter).await;
    let importer = register(&store, Role::Importer).await;
    let other = register(&store, Role::Importer).await;
    let product = seed_product(&store, owner, 10).await;

    let receipt = engine.reserve(product, 3, importer).await.unwrap();

    let err = engine.release(receipt.import.id, other).await.unwrap_err();
    assert!(matches!(err, EngineError::Domain(DomainError::Forbidden(_))));

    // Still active, still released only by its importer.
    assert_eq!(available(&store, product).await, 7);
    engine.release(receipt.import.id, importer).await.unwrap();
    assert_eq!(available(&store, product).await, 10);
}

#[tokio::test]
async fn release_of_unknown_import_is_not_found() {
    let (store, engine) = harness();
    let importer = register(&store, Role::Importer).await;

    let err = engine.release(ImportId::new(), importer).await.unwrap_err();
    assert!(matches!(err, EngineError::Domain(DomainError::NotFound(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reserves_never_oversell() {
    let (store, engine) = harness();
    let owner = register(&store, Role::Exporter).await;
    let product = seed_product(&store, owner, 10).await;

    let mut importers = Vec::new();
    for _ in 0..8 {
        importers.push(register(&store, Role::Importer).await);
    }

    let mut handles = Vec::new();
    for importer in importers {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.reserve(product, 3, importer).await
        }));
    }

    let mut successes = 0;
    let mut rejections = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(EngineError::Domain(DomainError::InsufficientStock { .. })) => rejections += 1,
            Err(other) => panic!("unexpected failure: {other}"),
        }
    }

    // floor(10 / 3) winners, everyone else bounced.
    assert_eq!(successes, 3);
    assert_eq!(rejections, 5);
    assert_eq!(available(&store, product).await, 1);
    assert_conserved(&store, product, 10).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_releases_credit_exactly_once() {
    let (store, engine) = harness();
    let owner = register(&store, Role::Exporter).await;
    let importer = register(&store, Role::Importer).await;
    let product = seed_product(&store, owner, 10).await;

    let receipt = engine.reserve(product, 4, importer).await.unwrap();
    let import_id = receipt.import.id;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.release(import_id, importer).await
        }));
    }

    let mut released = 0;
    let mut already = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => released += 1,
            Err(EngineError::Domain(DomainError::AlreadyReversed)) => already += 1,
            Err(other) => panic!("unexpected failure: {other}"),
        }
    }

    assert_eq!(released, 1);
    assert_eq!(already, 3);
    assert_eq!(available(&store, product).await, 10);
    assert_conserved(&store, product, 10).await;
}

#[tokio::test]
async fn conservation_holds_across_mixed_operations() {
    let (store, engine) = harness();
    let owner = register(&store, Role::Exporter).await;
    let a = register(&store, Role::Importer).await;
    let b = register(&store, Role::Importer).await;
    let product = seed_product(&store, owner, 20).await;

    let first = engine.reserve(product, 6, a).await.unwrap();
    assert_conserved(&store, product, 20).await;

    engine.reserve(product, 30, b).await.unwrap_err();
    assert_conserved(&store, product, 20).await;

    let second = engine.reserve(product, 8, b).await.unwrap();
    assert_conserved(&store, product, 20).await;

    engine.release(first.import.id, a).await.unwrap();
    assert_conserved(&store, product, 20).await;

    engine.release(first.import.id, a).await.unwrap_err();
    assert_conserved(&store, product, 20).await;

    let third = engine.reserve(product, 12, a).await.unwrap();
    assert_conserved(&store, product, 20).await;

    engine.release(second.import.id, b).await.unwrap();
    engine.release(third.import.id, a).await.unwrap();
    assert_conserved(&store, product, 20).await;
    assert_eq!(available(&store, product).await, 20);
}

// ---- ledger queries ----------------------------------------------------

#[tokio::test]
async fn importer_summaries_group_per_product() {
    let (store, engine) = harness();
    let queries = LedgerQueries::new(store.clone());
    let owner = register(&store, Role::Exporter).await;
    let importer = register(&store, Role::Importer).await;
    let spice = seed_product(&store, owner, 50).await;
    let tea = seed_product(&store, owner, 50).await;

    engine.reserve(spice, 2, importer).await.unwrap();
    engine.reserve(spice, 3, importer).await.unwrap();
    let tea_receipt = engine.reserve(tea, 4, importer).await.unwrap();

    let summaries = queries.imports_by_importer(importer).await.unwrap();
    assert_eq!(summaries.len(), 2);

    let spice_summary = summaries.iter().find(|s| s.product_id == spice).unwrap();
    assert_eq!(spice_summary.total_quantity, 5);
    let tea_summary = summaries.iter().find(|s| s.product_id == tea).unwrap();
    assert_eq!(tea_summary.total_quantity, 4);

    // Releasing drops the released quantity out of the grouping.
    engine.release(tea_receipt.import.id, importer).await.unwrap();
    let summaries = queries.imports_by_importer(importer).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].product_id, spice);
    assert_eq!(summaries[0].total_quantity, 5);
}

#[tokio::test]
async fn importer_summaries_order_by_most_recent_activity() {
    let (store, _) = harness();
    let queries = LedgerQueries::new(store.clone());
    let owner = register(&store, Role::Exporter).await;
    let importer = register(&store, Role::Importer).await;
    let older = seed_product(&store, owner, 50).await;
    let newer = seed_product(&store, owner, 50).await;

    for (product, seconds_ago) in [(older, 300), (newer, 60), (older, 600)] {
        let record = ImportRecord::new(
            product,
            importer,
            Quantity::new(1).unwrap(),
            ts(seconds_ago),
        );
        store.append_import(&record).await.unwrap();
    }

    let summaries = queries.imports_by_importer(importer).await.unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].product_id, newer);
    assert_eq!(summaries[1].product_id, older);
    assert_eq!(summaries[1].total_quantity, 2);
    assert_eq!(summaries[1].last_imported_at, ts_of(&store, older, importer).await);
}

async fn ts_of(store: &InMemoryStockLedger, product: ProductId, importer: ActorId) -> DateTime<Utc> {
    store
        .imports_for_product(product)
        .await
        .unwrap()
        .iter()
        .filter(|r| r.importer_id == importer)
        .map(|r| r.created_at)
        .max()
        .unwrap()
}

#[tokio::test]
async fn product_importers_order_by_recency_and_skip_reversed() {
    let (store, _) = harness();
    let queries = LedgerQueries::new(store.clone());
    let owner = register(&store, Role::Exporter).await;
    let early = register(&store, Role::Importer).await;
    let late = register(&store, Role::Importer).await;
    let product = seed_product(&store, owner, 50).await;

    let early_record =
        ImportRecord::new(product, early, Quantity::new(2).unwrap(), ts(120));
    store.append_import(&early_record).await.unwrap();

    let late_record = ImportRecord::new(product, late, Quantity::new(5).unwrap(), ts(30));
    store.append_import(&late_record).await.unwrap();

    let mut reversed_record =
        ImportRecord::new(product, early, Quantity::new(9).unwrap(), ts(10));
    reversed_record.reversed = true;
    store.append_import(&reversed_record).await.unwrap();

    let entries = queries.importers_of_product(product).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].importer_id, late);
    assert_eq!(entries[0].quantity, 5);
    assert_eq!(entries[1].importer_id, early);
    assert_eq!(entries[1].quantity, 2);
}

#[tokio::test]
async fn product_importers_distinguish_missing_from_untouched() {
    let (store, _) = harness();
    let queries = LedgerQueries::new(store.clone());
    let owner = register(&store, Role::Exporter).await;
    let product = seed_product(&store, owner, 5).await;

    let err = queries
        .importers_of_product(ProductId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Domain(DomainError::NotFound(_))));

    let entries = queries.importers_of_product(product).await.unwrap();
    assert!(entries.is_empty());
}

// ---- compensation ------------------------------------------------------

/// Wraps the in-memory ledger and injects storage faults.
struct FlakyStore {
    inner: Arc<InMemoryStockLedger>,
    fail_appends: AtomicU32,
    fail_credits: AtomicU32,
    credit_sees_missing: AtomicBool,
}

impl FlakyStore {
    fn new(inner: Arc<InMemoryStockLedger>) -> Self {
        Self {
            inner,
            fail_appends: AtomicU32::new(0),
            fail_credits: AtomicU32::new(0),
            credit_sees_missing: AtomicBool::new(false),
        }
    }
}

fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl StockLedgerStore for FlakyStore {
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        self.inner.insert_product(product).await
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.inner.fetch_product(id).await
    }

    async fn list_products(&self, owner: Option<ActorId>) -> Result<Vec<Product>, StoreError> {
        self.inner.list_products(owner).await
    }

    async fn latest_products(&self, limit: i64) -> Result<Vec<Product>, StoreError> {
        self.inner.latest_products(limit).await
    }

    async fn try_decrement_stock(
        &self,
        id: ProductId,
        amount: i64,
    ) -> Result<StockDecrement, StoreError> {
        self.inner.try_decrement_stock(id, amount).await
    }

    async fn credit_stock(&self, id: ProductId, amount: i64) -> Result<bool, StoreError> {
        if self.credit_sees_missing.load(Ordering::SeqCst) {
            return Ok(false);
        }
        if take_one(&self.fail_credits) {
            return Err(StoreError::Backend("injected credit failure".to_string()));
        }
        self.inner.credit_stock(id, amount).await
    }

    async fn append_import(&self, record: &ImportRecord) -> Result<(), StoreError> {
        if take_one(&self.fail_appends) {
            return Err(StoreError::Backend("injected append failure".to_string()));
        }
        self.inner.append_import(record).await
    }

    async fn fetch_import(&self, id: ImportId) -> Result<Option<ImportRecord>, StoreError> {
        self.inner.fetch_import(id).await
    }

    async fn mark_reversed_if_active(&self, id: ImportId) -> Result<bool, StoreError> {
        self.inner.mark_reversed_if_active(id).await
    }

    async fn imports_by_importer(
        &self,
        importer: ActorId,
    ) -> Result<Vec<ImportRecord>, StoreError> {
        self.inner.imports_by_importer(importer).await
    }

    async fn imports_for_product(
        &self,
        product: ProductId,
    ) -> Result<Vec<ImportRecord>, StoreError> {
        self.inner.imports_for_product(product).await
    }
}

fn flaky_harness() -> (
    Arc<InMemoryStockLedger>,
    Arc<FlakyStore>,
    ReservationEngine<Arc<FlakyStore>, Arc<InMemoryStockLedger>>,
) {
    let inner = Arc::new(InMemoryStockLedger::new());
    let flaky = Arc::new(FlakyStore::new(inner.clone()));
    let engine = ReservationEngine::new(flaky.clone(), inner.clone())
        .with_retry_backoff(Duration::from_millis(1));
    (inner, flaky, engine)
}

#[tokio::test]
async fn failed_append_restores_the_decrement() {
    let (inner, flaky, engine) = flaky_harness();
    let owner = register(&inner, Role::Exporter).await;
    let importer = register(&inner, Role::Importer).await;
    let product = seed_product(&inner, owner, 10).await;

    flaky.fail_appends.store(1, Ordering::SeqCst);

    let err = engine.reserve(product, 4, importer).await.unwrap_err();
    assert!(matches!(err, EngineError::Store(StoreError::Backend(_))));

    // Caller sees the append failure, the counter sees nothing at all.
    assert_eq!(available(&inner, product).await, 10);
    assert!(inner.imports_for_product(product).await.unwrap().is_empty());
}

#[tokio::test]
async fn compensation_retries_until_the_credit_lands() {
    let (inner, flaky, engine) = flaky_harness();
    let owner = register(&inner, Role::Exporter).await;
    let importer = register(&inner, Role::Importer).await;
    let product = seed_product(&inner, owner, 10).await;

    flaky.fail_appends.store(1, Ordering::SeqCst);
    flaky.fail_credits.store(2, Ordering::SeqCst);

    let err = engine.reserve(product, 4, importer).await.unwrap_err();
    assert!(matches!(err, EngineError::Store(StoreError::Backend(_))));

    assert_eq!(available(&inner, product).await, 10);
}

#[tokio::test]
async fn exhausted_compensation_reports_inconsistent_state() {
    let (inner, flaky, engine) = flaky_harness();
    let engine = engine.with_retry_budget(2);
    let owner = register(&inner, Role::Exporter).await;
    let importer = register(&inner, Role::Importer).await;
    let product = seed_product(&inner, owner, 10).await;

    flaky.fail_appends.store(1, Ordering::SeqCst);
    flaky.fail_credits.store(u32::MAX, Ordering::SeqCst);

    let err = engine.reserve(product, 4, importer).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Domain(DomainError::InconsistentState(_))
    ));

    // The decrement could not be undone.
    assert_eq!(available(&inner, product).await, 6);
}

#[tokio::test]
async fn release_against_vanished_product_keeps_flag_and_reports_inconsistent() {
    let (inner, flaky, engine) = flaky_harness();
    let owner = register(&inner, Role::Exporter).await;
    let importer = register(&inner, Role::Importer).await;
    let product = seed_product(&inner, owner, 10).await;

    let receipt = engine.reserve(product, 3, importer).await.unwrap();

    flaky.credit_sees_missing.store(true, Ordering::SeqCst);

    let err = engine.release(receipt.import.id, importer).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Domain(DomainError::InconsistentState(_))
    ));

    // The reversal flag stays set: a retry must not get a second credit.
    let record = inner.fetch_import(receipt.import.id).await.unwrap().unwrap();
    assert!(record.reversed);

    let err = engine.release(receipt.import.id, importer).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Domain(DomainError::AlreadyReversed)
    ));
}

// ---- catalog service ---------------------------------------------------

fn catalog(
    store: &Arc<InMemoryStockLedger>,
) -> CatalogService<Arc<InMemoryStockLedger>, Arc<InMemoryStockLedger>> {
    CatalogService::new(store.clone(), store.clone())
}

fn draft(name: &str, quantity: i64) -> ListingDraft {
    ListingDraft {
        name: name.to_string(),
        origin: "Assam".to_string(),
        price_cents: 1_200,
        rating: None,
        initial_quantity: quantity,
    }
}

#[tokio::test]
async fn listing_requires_exporter_capability() {
    let (store, _) = harness();
    let service = catalog(&store);
    let importer = register(&store, Role::Importer).await;
    let unregistered = ActorId::new();

    let err = service
        .list_product(importer, draft("Tea", 10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Domain(DomainError::Forbidden(_))));

    let err = service
        .list_product(unregistered, draft("Tea", 10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Domain(DomainError::Forbidden(_))));

    let exporter = register(&store, Role::Exporter).await;
    let product = service
        .list_product(exporter, draft("Tea", 10))
        .await
        .unwrap();
    assert_eq!(product.available_quantity, 10);
    assert_eq!(product.owner_id, exporter);
}

#[tokio::test]
async fn products_filter_by_owner_and_order_newest_first() {
    let (store, _) = harness();
    let service = catalog(&store);
    let alice = register(&store, Role::Exporter).await;
    let bob = register(&store, Role::Exporter).await;

    let old = seed_product_at(&store, alice, 5, ts(300)).await;
    let new = seed_product_at(&store, alice, 5, ts(30)).await;
    seed_product_at(&store, bob, 5, ts(120)).await;

    let all = service.products(None).await.unwrap();
    assert_eq!(all.len(), 3);

    let alices = service.products(Some(alice)).await.unwrap();
    assert_eq!(alices.len(), 2);
    assert_eq!(alices[0].id, new);
    assert_eq!(alices[1].id, old);
}

#[tokio::test]
async fn latest_products_keeps_the_six_newest() {
    let (store, _) = harness();
    let service = catalog(&store);
    let owner = register(&store, Role::Exporter).await;

    let mut ids = Vec::new();
    for age in [800, 700, 600, 500, 400, 300, 200, 100] {
        ids.push(seed_product_at(&store, owner, 5, ts(age)).await);
    }

    let latest = service.latest_products().await.unwrap();
    assert_eq!(latest.len(), 6);
    assert_eq!(latest[0].id, ids[7]);
    assert_eq!(latest[5].id, ids[2]);
}

#[tokio::test]
async fn fetching_unknown_product_is_not_found() {
    let (store, _) = harness();
    let service = catalog(&store);

    let err = service.product(ProductId::new()).await.unwrap_err();
    assert!(matches!(err, EngineError::Domain(DomainError::NotFound(_))));
}

#[tokio::test]
async fn registration_upserts_the_directory_entry() {
    let (store, _) = harness();
    let service = catalog(&store);
    let actor = ActorId::new();

    service
        .register_actor(actor, "trader@example.com".to_string(), Role::Importer)
        .await
        .unwrap();
    assert_eq!(store.role_of(actor).await.unwrap(), Some(Role::Importer));

    // Re-registering the same actor replaces the role in place.
    service
        .register_actor(actor, "trader@example.com".to_string(), Role::Exporter)
        .await
        .unwrap();
    assert_eq!(store.role_of(actor).await.unwrap(), Some(Role::Exporter));

    let err = service
        .register_actor(ActorId::new(), "   ".to_string(), Role::Importer)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Domain(DomainError::Validation(_))));
}

#[tokio::test]
async fn registration_rejects_duplicate_email() {
    let (store, _) = harness();
    let service = catalog(&store);

    service
        .register_actor(ActorId::new(), "same@example.com".to_string(), Role::Importer)
        .await
        .unwrap();

    let err = service
        .register_actor(ActorId::new(), "same@example.com".to_string(), Role::Importer)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Store(StoreError::Conflict(_))));
}
