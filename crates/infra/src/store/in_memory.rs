use std::collections::{BTreeMap, HashMap};
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, ThreadId};

use warehouse_core::{Entity, InventoryId, ProductId, WarehouseId, ZoneId};
use warehouse_inventory::{
    InventoryKey, InventoryLine, InventoryRecord, NewProduct, NewZone, Product, ProductPatch,
    StorageZone, Warehouse, ZoneStock,
};

use super::r#trait::{InventoryStore, StoreError, StoreResult, StoreTransaction};

/// Prior state of one row written inside a transaction.
#[derive(Debug, Clone)]
enum Undo {
    Warehouse(WarehouseId, Option<Warehouse>),
    Zone(ZoneId, Option<StorageZone>),
    Product(ProductId, Option<Product>),
    Inventory(InventoryId, Option<InventoryRecord>),
}

#[derive(Debug)]
struct Tables {
    warehouses: BTreeMap<WarehouseId, Warehouse>,
    zones: BTreeMap<ZoneId, StorageZone>,
    products: BTreeMap<ProductId, Product>,
    inventory: BTreeMap<InventoryId, InventoryRecord>,
    /// Unique index over the business key.
    inventory_by_key: HashMap<InventoryKey, InventoryId>,
    next_product: i64,
    next_zone: i64,
    next_inventory: i64,
    /// Undo log of the open transaction, if any. Id counters are not rolled back.
    undo: Option<Vec<Undo>>,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            warehouses: BTreeMap::new(),
            zones: BTreeMap::new(),
            products: BTreeMap::new(),
            inventory: BTreeMap::new(),
            inventory_by_key: HashMap::new(),
            next_product: 1,
            next_zone: 1,
            next_inventory: 1,
            undo: None,
        }
    }
}

fn insert<E: Entity>(table: &mut BTreeMap<E::Id, E>, entity: E) {
    table.insert(entity.id(), entity);
}

fn restore<E: Entity>(table: &mut BTreeMap<E::Id, E>, id: E::Id, previous: Option<E>) {
    match previous {
        Some(entity) => insert(table, entity),
        None => {
            table.remove(&id);
        }
    }
}

impl Tables {
    fn product_by_sku(&self, sku: &str) -> Option<&Product> {
        self.products.values().find(|p| p.sku().as_str() == sku)
    }

    fn warehouse(&self, id: WarehouseId) -> StoreResult<&Warehouse> {
        self.warehouses
            .get(&id)
            .ok_or_else(|| StoreError::not_found(format!("warehouse {id}")))
    }

    fn zone(&self, id: ZoneId) -> StoreResult<&StorageZone> {
        self.zones
            .get(&id)
            .ok_or_else(|| StoreError::not_found(format!("zone {id}")))
    }

    /// Foreign-key checks of an inventory row: product, warehouse and zone must
    /// exist. Zone ownership is deliberately not checked here.
    fn check_references(&self, key: &InventoryKey) -> StoreResult<()> {
        if !self.products.contains_key(&key.product_id) {
            return Err(StoreError::not_found(format!("product {}", key.product_id)));
        }
        self.warehouse(key.warehouse_id())?;
        if let Some(zone_id) = key.zone_id() {
            self.zone(zone_id)?;
        }
        Ok(())
    }

    /// Log the current state of a row before it is written. No-op outside a
    /// transaction.
    fn remember(&mut self, row: impl FnOnce(&Self) -> Undo) {
        if self.undo.is_some() {
            let entry = row(self);
            if let Some(log) = self.undo.as_mut() {
                log.push(entry);
            }
        }
    }

    fn roll_back(&mut self, log: Vec<Undo>) {
        for entry in log.into_iter().rev() {
            match entry {
                Undo::Warehouse(id, previous) => restore(&mut self.warehouses, id, previous),
                Undo::Zone(id, previous) => restore(&mut self.zones, id, previous),
                Undo::Product(id, previous) => restore(&mut self.products, id, previous),
                Undo::Inventory(id, previous) => {
                    if let Some(record) = self.inventory.get(&id) {
                        self.inventory_by_key.remove(&record.key());
                    }
                    if let Some(record) = &previous {
                        self.inventory_by_key.insert(record.key(), id);
                    }
                    restore(&mut self.inventory, id, previous);
                }
            }
        }
    }
}

/// Table guard paired with the caller's turn on the transaction gate.
///
/// Fields drop in order: the tables lock is released before the turn.
struct Access<'a, G> {
    tables: G,
    _turn: Option<RwLockReadGuard<'a, ()>>,
}

impl<G: Deref<Target = Tables>> Deref for Access<'_, G> {
    type Target = Tables;

    fn deref(&self) -> &Tables {
        &self.tables
    }
}

impl<G: DerefMut<Target = Tables>> DerefMut for Access<'_, G> {
    fn deref_mut(&mut self) -> &mut Tables {
        &mut self.tables
    }
}

/// In-memory inventory store.
///
/// Intended for tests/dev. An open transaction holds the gate exclusively:
/// every other caller, reader or writer, waits until it commits or rolls back,
/// while the owning thread goes through. Rollback replays an undo log of the
/// rows the transaction wrote, so its cost is proportional to those writes.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    tables: RwLock<Tables>,
    tx_gate: RwLock<()>,
    tx_owner: Mutex<Option<ThreadId>>,
}

impl InMemoryInventoryStore {
    /// Empty store: no warehouses, no zones.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the reference warehouses and zones.
    ///
    /// - warehouse 1 "Warehouse A", warehouse 2 "Warehouse B"
    /// - zone 1 "Cold room 1" (capacity 100) and zone 2 "Rack A1" (capacity 200),
    ///   both in warehouse 1
    pub fn seeded() -> Self {
        let mut tables = Tables::default();
        for (id, location) in [(1, "Warehouse A"), (2, "Warehouse B")] {
            insert(&mut tables.warehouses, Warehouse::new(WarehouseId::new(id), location));
        }
        for (id, name, capacity) in [(1, "Cold room 1", 100), (2, "Rack A1", 200)] {
            if let Ok(new) = NewZone::new(name, capacity, WarehouseId::new(1)) {
                insert(&mut tables.zones, StorageZone::from_new(ZoneId::new(id), new));
            }
        }
        tables.next_zone = 3;

        Self {
            tables: RwLock::new(tables),
            ..Self::default()
        }
    }

    /// Add a warehouse outside the store contract (reference data loading).
    pub fn seed_warehouse(&self, warehouse: Warehouse) -> StoreResult<()> {
        let mut tables = self.write()?;
        let id = warehouse.id();
        tables.remember(|t| Undo::Warehouse(id, t.warehouses.get(&id).cloned()));
        insert(&mut tables.warehouses, warehouse);
        Ok(())
    }

    fn owner(&self) -> StoreResult<MutexGuard<'_, Option<ThreadId>>> {
        self.tx_owner
            .lock()
            .map_err(|_| StoreError::unavailable("transaction owner poisoned"))
    }

    fn owns_transaction(&self) -> StoreResult<bool> {
        Ok(*self.owner()? == Some(thread::current().id()))
    }

    /// Wait until no other thread holds a transaction open. The gate guards no
    /// data, so its poisoning is ignored.
    fn turn(&self) -> StoreResult<Option<RwLockReadGuard<'_, ()>>> {
        if self.owns_transaction()? {
            return Ok(None);
        }
        Ok(Some(self.tx_gate.read().unwrap_or_else(PoisonError::into_inner)))
    }

    fn read(&self) -> StoreResult<Access<'_, RwLockReadGuard<'_, Tables>>> {
        let turn = self.turn()?;
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        Ok(Access { tables, _turn: turn })
    }

    fn write(&self) -> StoreResult<Access<'_, RwLockWriteGuard<'_, Tables>>> {
        let turn = self.turn()?;
        let tables = self
            .tables
            .write()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        Ok(Access { tables, _turn: turn })
    }
}

/// Transaction handle of [`InMemoryInventoryStore`].
///
/// Dropping it without [`StoreTransaction::commit`] undoes every write the
/// owning thread made since [`InventoryStore::begin`].
#[derive(Debug)]
pub struct InMemoryTransaction<'a> {
    store: &'a InMemoryInventoryStore,
    committed: bool,
    _gate: RwLockWriteGuard<'a, ()>,
}

impl StoreTransaction for InMemoryTransaction<'_> {
    fn commit(mut self) -> StoreResult<()> {
        self.committed = true;
        Ok(())
    }
}

impl Drop for InMemoryTransaction<'_> {
    fn drop(&mut self) {
        let mut tables = match self.store.tables.write() {
            Ok(tables) => tables,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(log) = tables.undo.take() {
            if !self.committed {
                tables.roll_back(log);
            }
        }
        drop(tables);

        let mut owner = match self.store.tx_owner.lock() {
            Ok(owner) => owner,
            Err(poisoned) => poisoned.into_inner(),
        };
        *owner = None;
    }
}

impl InventoryStore for InMemoryInventoryStore {
    type Transaction<'a> = InMemoryTransaction<'a>;

    fn begin(&self) -> StoreResult<Self::Transaction<'_>> {
        if self.owns_transaction()? {
            return Err(StoreError::conflict("a transaction is already open on this thread"));
        }
        let gate = self.tx_gate.write().unwrap_or_else(PoisonError::into_inner);
        let tx = InMemoryTransaction {
            store: self,
            committed: false,
            _gate: gate,
        };
        *self.owner()? = Some(thread::current().id());
        self.write()?.undo = Some(Vec::new());
        Ok(tx)
    }

    fn create_product(&self, product: NewProduct) -> StoreResult<ProductId> {
        let mut tables = self.write()?;
        if tables.product_by_sku(product.sku.as_str()).is_some() {
            return Err(StoreError::conflict(format!("sku '{}' already exists", product.sku)));
        }

        let id = ProductId::new(tables.next_product);
        tables.next_product += 1;
        tables.remember(|_| Undo::Product(id, None));
        insert(&mut tables.products, Product::from_new(id, product));
        Ok(id)
    }

    fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        self.read()?
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("product {id}")))
    }

    fn update_product(&self, id: ProductId, patch: &ProductPatch) -> StoreResult<Product> {
        let mut tables = self.write()?;
        if let Some(sku) = &patch.sku {
            if let Some(other) = tables.product_by_sku(sku.as_str()) {
                if other.id() != id {
                    return Err(StoreError::conflict(format!("sku '{sku}' already exists")));
                }
            }
        }
        if !tables.products.contains_key(&id) {
            return Err(StoreError::not_found(format!("product {id}")));
        }

        tables.remember(|t| Undo::Product(id, t.products.get(&id).cloned()));
        let product = tables
            .products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(format!("product {id}")))?;
        product.apply(patch);
        Ok(product.clone())
    }

    fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut tables = self.write()?;
        let removed = tables
            .products
            .remove(&id)
            .ok_or_else(|| StoreError::not_found(format!("product {id}")))?;
        tables.remember(|_| Undo::Product(id, Some(removed)));
        Ok(())
    }

    fn get_warehouse(&self, id: WarehouseId) -> StoreResult<Warehouse> {
        self.read()?.warehouse(id).cloned()
    }

    fn get_zone(&self, id: ZoneId) -> StoreResult<StorageZone> {
        self.read()?.zone(id).cloned()
    }

    fn create_zone(&self, zone: NewZone) -> StoreResult<ZoneId> {
        let mut tables = self.write()?;
        tables.warehouse(zone.warehouse_id)?;

        let id = ZoneId::new(tables.next_zone);
        tables.next_zone += 1;
        tables.remember(|_| Undo::Zone(id, None));
        insert(&mut tables.zones, StorageZone::from_new(id, zone));
        Ok(id)
    }

    fn list_zones(&self, warehouse_id: WarehouseId) -> StoreResult<Vec<ZoneStock>> {
        let tables = self.read()?;
        let zones = tables
            .zones
            .values()
            .filter(|z| z.belongs_to(warehouse_id))
            .map(|zone| ZoneStock {
                zone: zone.clone(),
                records: tables
                    .inventory
                    .values()
                    .filter(|r| r.location().zone_id == Some(zone.id()))
                    .cloned()
                    .collect(),
            })
            .collect();
        Ok(zones)
    }

    fn list_inventory(&self, warehouse_id: WarehouseId) -> StoreResult<Vec<InventoryLine>> {
        let tables = self.read()?;
        let warehouse = tables.warehouse(warehouse_id)?.clone();
        let lines = tables
            .inventory
            .values()
            .filter(|r| r.location().warehouse_id == warehouse_id)
            .map(|record| InventoryLine {
                product: tables.products.get(&record.product_id()).cloned(),
                warehouse: warehouse.clone(),
                zone: record
                    .location()
                    .zone_id
                    .and_then(|z| tables.zones.get(&z).cloned()),
                record: record.clone(),
            })
            .collect();
        Ok(lines)
    }

    fn list_inventory_for_product(
        &self,
        product_id: ProductId,
    ) -> StoreResult<Vec<InventoryRecord>> {
        Ok(self
            .read()?
            .inventory
            .values()
            .filter(|r| r.product_id() == product_id)
            .cloned()
            .collect())
    }

    fn find_inventory(&self, key: InventoryKey) -> StoreResult<Option<InventoryRecord>> {
        let tables = self.read()?;
        Ok(tables
            .inventory_by_key
            .get(&key)
            .and_then(|id| tables.inventory.get(id))
            .cloned())
    }

    fn upsert_inventory(&self, key: InventoryKey, quantity: u64) -> StoreResult<InventoryId> {
        let mut tables = self.write()?;
        if let Some(&id) = tables.inventory_by_key.get(&key) {
            if tables.inventory.contains_key(&id) {
                tables.remember(|t| Undo::Inventory(id, t.inventory.get(&id).cloned()));
                if let Some(record) = tables.inventory.get_mut(&id) {
                    record.set_quantity(quantity);
                }
                return Ok(id);
            }
        }

        tables.check_references(&key)?;
        let id = InventoryId::new(tables.next_inventory);
        tables.next_inventory += 1;
        tables.remember(|_| Undo::Inventory(id, None));
        insert(&mut tables.inventory, InventoryRecord::new(id, key, quantity));
        tables.inventory_by_key.insert(key, id);
        Ok(id)
    }

    fn set_inventory_quantity(&self, id: InventoryId, quantity: u64) -> StoreResult<()> {
        let mut tables = self.write()?;
        if !tables.inventory.contains_key(&id) {
            return Err(StoreError::not_found(format!("inventory record {id}")));
        }
        tables.remember(|t| Undo::Inventory(id, t.inventory.get(&id).cloned()));
        if let Some(record) = tables.inventory.get_mut(&id) {
            record.set_quantity(quantity);
        }
        Ok(())
    }
}
