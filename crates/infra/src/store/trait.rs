use std::sync::Arc;

use thiserror::Error;

use warehouse_core::{InventoryId, ProductId, WarehouseId, ZoneId};
use warehouse_inventory::{
    InventoryKey, InventoryLine, InventoryRecord, NewProduct, NewZone, Product, ProductPatch,
    StorageZone, Warehouse, ZoneStock,
};

/// Result type returned by store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation error.
///
/// These are **infrastructure errors** as reported by the backend. The engine
/// converts them into its own error kinds at its boundary; callers of the
/// engine never see a `StoreError`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A unique index rejected the write (duplicate sku, duplicate business key).
    #[error("uniqueness violation: {0}")]
    Conflict(String),

    /// The backend failed for a reason opaque to callers (IO, poisoned lock, ...).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(what: impl Into<String>) -> Self {
        Self::Conflict(what.into())
    }

    pub fn unavailable(what: impl Into<String>) -> Self {
        Self::Unavailable(what.into())
    }
}

/// Scoped transaction handle returned by [`InventoryStore::begin`].
///
/// Writes issued through the store while the handle is alive become permanent
/// on [`commit`](StoreTransaction::commit). Dropping the handle without
/// committing rolls them back. A rollback must only undo the transaction's own
/// writes; writes of other callers are never discarded.
pub trait StoreTransaction {
    fn commit(self) -> StoreResult<()>;
}

/// Durable CRUD access to products, warehouses, zones and inventory records.
///
/// ## Implementation Requirements
///
/// Implementations must:
/// - reject a second product with an existing sku (`Conflict`)
/// - keep at most one inventory record per `InventoryKey`, treating a missing
///   zone as its own distinct value
/// - assign ids on creation and never reuse them
/// - return listings in ascending id order
///
/// Implementations are not required to check that a zone belongs to the
/// warehouse named alongside it; the engine does that when configured to.
pub trait InventoryStore: Send + Sync {
    type Transaction<'a>: StoreTransaction
    where
        Self: 'a;

    /// Open a transaction scope.
    fn begin(&self) -> StoreResult<Self::Transaction<'_>>;

    fn create_product(&self, product: NewProduct) -> StoreResult<ProductId>;

    fn get_product(&self, id: ProductId) -> StoreResult<Product>;

    /// Apply a partial update and return the updated product.
    fn update_product(&self, id: ProductId, patch: &ProductPatch) -> StoreResult<Product>;

    /// Remove a product. Inventory records referencing it are left in place.
    fn delete_product(&self, id: ProductId) -> StoreResult<()>;

    fn get_warehouse(&self, id: WarehouseId) -> StoreResult<Warehouse>;

    fn get_zone(&self, id: ZoneId) -> StoreResult<StorageZone>;

    fn create_zone(&self, zone: NewZone) -> StoreResult<ZoneId>;

    /// Zones of a warehouse, each with the inventory records stored in it.
    fn list_zones(&self, warehouse_id: WarehouseId) -> StoreResult<Vec<ZoneStock>>;

    /// Inventory records of a warehouse joined with product, warehouse and zone.
    fn list_inventory(&self, warehouse_id: WarehouseId) -> StoreResult<Vec<InventoryLine>>;

    /// Every inventory record of a product, across all warehouses.
    fn list_inventory_for_product(&self, product_id: ProductId)
    -> StoreResult<Vec<InventoryRecord>>;

    /// Exact lookup by business key (`None` zone matches only zone-less records).
    fn find_inventory(&self, key: InventoryKey) -> StoreResult<Option<InventoryRecord>>;

    /// Set the quantity of the record for `key`, creating it if absent.
    fn upsert_inventory(&self, key: InventoryKey, quantity: u64) -> StoreResult<InventoryId>;

    fn set_inventory_quantity(&self, id: InventoryId, quantity: u64) -> StoreResult<()>;
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    type Transaction<'a>
        = S::Transaction<'a>
    where
        Self: 'a;

    fn begin(&self) -> StoreResult<Self::Transaction<'_>> {
        (**self).begin()
    }

    fn create_product(&self, product: NewProduct) -> StoreResult<ProductId> {
        (**self).create_product(product)
    }

    fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        (**self).get_product(id)
    }

    fn update_product(&self, id: ProductId, patch: &ProductPatch) -> StoreResult<Product> {
        (**self).update_product(id, patch)
    }

    fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        (**self).delete_product(id)
    }

    fn get_warehouse(&self, id: WarehouseId) -> StoreResult<Warehouse> {
        (**self).get_warehouse(id)
    }

    fn get_zone(&self, id: ZoneId) -> StoreResult<StorageZone> {
        (**self).get_zone(id)
    }

    fn create_zone(&self, zone: NewZone) -> StoreResult<ZoneId> {
        (**self).create_zone(zone)
    }

    fn list_zones(&self, warehouse_id: WarehouseId) -> StoreResult<Vec<ZoneStock>> {
        (**self).list_zones(warehouse_id)
    }

    fn list_inventory(&self, warehouse_id: WarehouseId) -> StoreResult<Vec<InventoryLine>> {
        (**self).list_inventory(warehouse_id)
    }

    fn list_inventory_for_product(
        &self,
        product_id: ProductId,
    ) -> StoreResult<Vec<InventoryRecord>> {
        (**self).list_inventory_for_product(product_id)
    }

    fn find_inventory(&self, key: InventoryKey) -> StoreResult<Option<InventoryRecord>> {
        (**self).find_inventory(key)
    }

    fn upsert_inventory(&self, key: InventoryKey, quantity: u64) -> StoreResult<InventoryId> {
        (**self).upsert_inventory(key, quantity)
    }

    fn set_inventory_quantity(&self, id: InventoryId, quantity: u64) -> StoreResult<()> {
        (**self).set_inventory_quantity(id, quantity)
    }
}
