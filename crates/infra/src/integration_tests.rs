//! Integration tests for the engine over the in-memory store.
//!
//! Tests: engine operation → store writes → observable quantities
//!
//! Verifies:
//! - the documented warehouse scenarios (transfer, insufficient stock, reconcile)
//! - what a store failure between the two halves of a transfer leaves behind,
//!   with and without transactional transfers
//! - best-effort reconciliation under store failures
//! - quantity conservation under concurrent transfers

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use rust_decimal::Decimal;

    use warehouse_core::{InventoryId, ProductId, WarehouseId, ZoneId};
    use warehouse_inventory::{
        InventoryKey, InventoryLine, InventoryRecord, Location, NewProduct, NewZone, Product,
        ProductPatch, StorageZone, Warehouse, ZoneStock,
    };

    use crate::engine::{EngineError, EngineOptions, EntryOutcome, InventoryEngine, Transfer};
    use crate::store::{InMemoryInventoryStore, InventoryStore, StoreError, StoreResult};

    /// In-memory store with switchable write failures.
    #[derive(Debug, Default)]
    struct FaultyStore {
        inner: InMemoryInventoryStore,
        fail_upserts: AtomicBool,
        /// Fail `set_inventory_quantity` once this many calls have succeeded.
        fail_set_quantity_after: Option<usize>,
        set_quantity_calls: AtomicUsize,
    }

    impl FaultyStore {
        fn seeded() -> Self {
            Self {
                inner: InMemoryInventoryStore::seeded(),
                ..Self::default()
            }
        }
    }

    impl InventoryStore for FaultyStore {
        type Transaction<'a> = <InMemoryInventoryStore as InventoryStore>::Transaction<'a>;

        fn begin(&self) -> StoreResult<Self::Transaction<'_>> {
            self.inner.begin()
        }

        fn create_product(&self, product: NewProduct) -> StoreResult<ProductId> {
            self.inner.create_product(product)
        }

        fn get_product(&self, id: ProductId) -> StoreResult<Product> {
            self.inner.get_product(id)
        }

        fn update_product(&self, id: ProductId, patch: &ProductPatch) -> StoreResult<Product> {
            self.inner.update_product(id, patch)
        }

        fn delete_product(&self, id: ProductId) -> StoreResult<()> {
            self.inner.delete_product(id)
        }

        fn get_warehouse(&self, id: WarehouseId) -> StoreResult<Warehouse> {
            self.inner.get_warehouse(id)
        }

        fn get_zone(&self, id: ZoneId) -> StoreResult<StorageZone> {
            self.inner.get_zone(id)
        }

        fn create_zone(&self, zone: NewZone) -> StoreResult<ZoneId> {
            self.inner.create_zone(zone)
        }

        fn list_zones(&self, warehouse_id: WarehouseId) -> StoreResult<Vec<ZoneStock>> {
            self.inner.list_zones(warehouse_id)
        }

        fn list_inventory(&self, warehouse_id: WarehouseId) -> StoreResult<Vec<InventoryLine>> {
            self.inner.list_inventory(warehouse_id)
        }

        fn list_inventory_for_product(
            &self,
            product_id: ProductId,
        ) -> StoreResult<Vec<InventoryRecord>> {
            self.inner.list_inventory_for_product(product_id)
        }

        fn find_inventory(&self, key: InventoryKey) -> StoreResult<Option<InventoryRecord>> {
            self.inner.find_inventory(key)
        }

        fn upsert_inventory(&self, key: InventoryKey, quantity: u64) -> StoreResult<InventoryId> {
            if self.fail_upserts.load(Ordering::SeqCst) {
                return Err(StoreError::unavailable("injected upsert failure"));
            }
            self.inner.upsert_inventory(key, quantity)
        }

        fn set_inventory_quantity(&self, id: InventoryId, quantity: u64) -> StoreResult<()> {
            let call = self.set_quantity_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_set_quantity_after.is_some_and(|limit| call >= limit) {
                return Err(StoreError::unavailable("injected write failure"));
            }
            self.inner.set_inventory_quantity(id, quantity)
        }
    }

    const PRODUCT: ProductId = ProductId::new(1);

    fn w(id: i64) -> WarehouseId {
        WarehouseId::new(id)
    }

    /// Zone-less transfer from warehouse 1 to warehouse 2.
    fn a_to_b(quantity: u64) -> Transfer {
        Transfer::new(PRODUCT, Location::warehouse(w(1)), Location::warehouse(w(2)), quantity)
    }

    fn quantity<S: InventoryStore>(store: &S, location: Location) -> Option<u64> {
        store
            .find_inventory(InventoryKey::new(PRODUCT, location))
            .unwrap()
            .map(|r| r.quantity())
    }

    /// Product 1 with 5 units of zone-less stock in warehouse 1.
    fn stocked<S: InventoryStore>(engine: &InventoryEngine<S>) {
        warehouse_observability::init_for_tests();
        let id = engine
            .add_product("Widget", "W-001", Decimal::new(1250, 2))
            .unwrap();
        assert_eq!(id, PRODUCT);
        engine.stock_in(PRODUCT, Location::warehouse(w(1)), 5).unwrap();
    }

    #[test]
    fn transfer_to_another_warehouse_creates_destination_record() {
        let engine = InventoryEngine::new(InMemoryInventoryStore::seeded());
        stocked(&engine);

        let request = a_to_b(3);
        engine.transfer(&request).unwrap();

        assert_eq!(quantity(engine.store(), Location::warehouse(w(1))), Some(2));
        assert_eq!(quantity(engine.store(), Location::warehouse(w(2))), Some(3));
    }

    #[test]
    fn oversized_transfer_fails_without_mutation() {
        let engine = InventoryEngine::new(InMemoryInventoryStore::seeded());
        stocked(&engine);

        let request = a_to_b(10);
        assert_eq!(
            engine.transfer(&request),
            Err(EngineError::InsufficientStock {
                requested: 10,
                available: 5
            })
        );
        assert_eq!(quantity(engine.store(), Location::warehouse(w(1))), Some(5));
        assert_eq!(quantity(engine.store(), Location::warehouse(w(2))), None);
    }

    #[test]
    fn same_location_transfer_is_a_no_op() {
        let engine = InventoryEngine::new(InMemoryInventoryStore::seeded());
        stocked(&engine);
        let here = Location::warehouse(w(1));

        for q in 1..=5 {
            engine.transfer(&Transfer::new(PRODUCT, here, here, q)).unwrap();
            assert_eq!(quantity(engine.store(), here), Some(5));
        }
    }

    #[test]
    fn reconcile_matching_count_is_a_no_op_and_different_count_overwrites() {
        let engine = InventoryEngine::new(InMemoryInventoryStore::seeded());
        stocked(&engine);

        let report = engine.reconcile(w(1), &BTreeMap::from([(PRODUCT, 5)])).unwrap();
        assert_eq!(report.outcome_for(PRODUCT), Some(&EntryOutcome::Unchanged { quantity: 5 }));
        assert_eq!(report.changed(), 0);

        let report = engine.reconcile(w(1), &BTreeMap::from([(PRODUCT, 8)])).unwrap();
        assert_eq!(report.outcome_for(PRODUCT), Some(&EntryOutcome::Adjusted { from: 5, to: 8 }));
        assert_eq!(quantity(engine.store(), Location::warehouse(w(1))), Some(8));
    }

    #[test]
    fn atomic_transfer_rolls_back_source_when_destination_write_fails() {
        let engine = InventoryEngine::new(FaultyStore::seeded());
        stocked(&engine);
        engine.store().fail_upserts.store(true, Ordering::SeqCst);

        let request = a_to_b(3);
        let err = engine.transfer(&request).unwrap_err();

        assert!(matches!(err, EngineError::Persistence(_)));
        assert_eq!(quantity(engine.store(), Location::warehouse(w(1))), Some(5));
        assert_eq!(quantity(engine.store(), Location::warehouse(w(2))), None);
    }

    #[test]
    fn non_atomic_transfer_loses_quantity_when_destination_write_fails() {
        let options = EngineOptions {
            atomic_transfers: false,
            ..EngineOptions::default()
        };
        let engine = InventoryEngine::with_options(FaultyStore::seeded(), options);
        stocked(&engine);
        engine.store().fail_upserts.store(true, Ordering::SeqCst);

        let request = a_to_b(3);
        let err = engine.transfer(&request).unwrap_err();

        // The source decrement stuck; the 3 units are gone.
        assert!(matches!(err, EngineError::Persistence(_)));
        assert_eq!(quantity(engine.store(), Location::warehouse(w(1))), Some(2));
        assert_eq!(quantity(engine.store(), Location::warehouse(w(2))), None);
    }

    #[test]
    fn failed_source_decrement_mutates_nothing() {
        let store = FaultyStore {
            fail_set_quantity_after: Some(0),
            ..FaultyStore::seeded()
        };
        let engine = InventoryEngine::new(store);
        // stock_in creates the record through upsert, so the decrement is the first set.
        stocked(&engine);

        let request = a_to_b(3);
        assert!(matches!(engine.transfer(&request), Err(EngineError::Persistence(_))));
        assert_eq!(quantity(engine.store(), Location::warehouse(w(1))), Some(5));
        assert_eq!(quantity(engine.store(), Location::warehouse(w(2))), None);
    }

    #[test]
    fn reconcile_reports_failed_entries_and_applies_the_rest() {
        let engine = InventoryEngine::new(FaultyStore::seeded());
        stocked(&engine);
        let other = engine.add_product("Gadget", "G-001", Decimal::ONE).unwrap();
        engine.store().fail_upserts.store(true, Ordering::SeqCst);

        // PRODUCT exists (overwrite via set), `other` needs a new record (upsert fails).
        let counted = BTreeMap::from([(PRODUCT, 9), (other, 4)]);
        let report = engine.reconcile(w(1), &counted).unwrap();

        assert_eq!(report.outcome_for(PRODUCT), Some(&EntryOutcome::Adjusted { from: 5, to: 9 }));
        assert!(report.outcome_for(other).unwrap().is_failure());
        assert!(!report.is_clean());
        assert_eq!(quantity(engine.store(), Location::warehouse(w(1))), Some(9));
    }

    #[test]
    fn stock_report_joins_product_warehouse_and_zone() {
        let engine = InventoryEngine::new(InMemoryInventoryStore::seeded());
        stocked(&engine);
        engine
            .stock_in(PRODUCT, Location::zone(w(1), ZoneId::new(2)), 4)
            .unwrap();

        let lines = engine.stock_report(w(1)).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.warehouse.location() == "Warehouse A"));
        assert!(lines.iter().all(|l| l.product.as_ref().map(|p| p.name()) == Some("Widget")));
        let zoned = lines.iter().find(|l| l.zone.is_some()).unwrap();
        assert_eq!(zoned.zone.as_ref().unwrap().name(), "Rack A1");
        assert_eq!(zoned.record.quantity(), 4);
    }

    #[test]
    fn concurrent_atomic_transfers_conserve_total_quantity() {
        let engine = Arc::new(InventoryEngine::new(InMemoryInventoryStore::seeded()));
        warehouse_observability::init_for_tests();
        engine.add_product("Widget", "W-001", Decimal::ONE).unwrap();
        let a = Location::warehouse(w(1));
        let b = Location::warehouse(w(2));
        engine.stock_in(PRODUCT, a, 100).unwrap();
        engine.stock_in(PRODUCT, b, 100).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    let (from, to) = if i % 2 == 0 { (a, b) } else { (b, a) };
                    for q in 1..=20 {
                        match engine.transfer(&Transfer::new(PRODUCT, from, to, q)) {
                            Ok(()) | Err(EngineError::InsufficientStock { .. }) => {}
                            Err(other) => panic!("unexpected transfer failure: {other}"),
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let total = quantity(engine.store(), a).unwrap() + quantity(engine.store(), b).unwrap();
        assert_eq!(total, 200);
    }
}
