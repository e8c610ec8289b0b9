use serde::{Deserialize, Serialize};

use warehouse_core::{
    DomainError, DomainResult, Entity, InventoryId, ProductId, WarehouseId, ZoneId,
};

use crate::product::Product;
use crate::warehouse::{StorageZone, Warehouse};

/// Where stock sits: a warehouse, optionally narrowed to one of its zones.
///
/// `zone_id == None` is warehouse-level ("zone-less") stock and is a distinct
/// location from every zone of the same warehouse.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub warehouse_id: WarehouseId,
    pub zone_id: Option<ZoneId>,
}

impl Location {
    pub fn new(warehouse_id: WarehouseId, zone_id: Option<ZoneId>) -> Self {
        Self {
            warehouse_id,
            zone_id,
        }
    }

    /// Warehouse-level location (no zone).
    pub fn warehouse(warehouse_id: WarehouseId) -> Self {
        Self::new(warehouse_id, None)
    }

    pub fn zone(warehouse_id: WarehouseId, zone_id: ZoneId) -> Self {
        Self::new(warehouse_id, Some(zone_id))
    }

    pub fn is_zone_less(&self) -> bool {
        self.zone_id.is_none()
    }
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.zone_id {
            Some(zone) => write!(f, "warehouse {}/zone {}", self.warehouse_id, zone),
            None => write!(f, "warehouse {}", self.warehouse_id),
        }
    }
}

/// Business key of an inventory record. At most one record exists per key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InventoryKey {
    pub product_id: ProductId,
    pub location: Location,
}

impl InventoryKey {
    pub fn new(product_id: ProductId, location: Location) -> Self {
        Self {
            product_id,
            location,
        }
    }

    pub fn warehouse_id(&self) -> WarehouseId {
        self.location.warehouse_id
    }

    pub fn zone_id(&self) -> Option<ZoneId> {
        self.location.zone_id
    }
}

/// Quantity of one product held at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    id: InventoryId,
    key: InventoryKey,
    quantity: u64,
}

impl InventoryRecord {
    pub fn new(id: InventoryId, key: InventoryKey, quantity: u64) -> Self {
        Self { id, key, quantity }
    }

    pub fn key(&self) -> InventoryKey {
        self.key
    }

    pub fn product_id(&self) -> ProductId {
        self.key.product_id
    }

    pub fn location(&self) -> Location {
        self.key.location
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn set_quantity(&mut self, quantity: u64) {
        self.quantity = quantity;
    }

    /// Quantity left after removing `amount`, or `InsufficientStock` if the
    /// record holds less than that. Does not mutate the record.
    pub fn after_withdrawal(&self, amount: u64) -> DomainResult<u64> {
        self.quantity
            .checked_sub(amount)
            .ok_or(DomainError::insufficient_stock(amount, self.quantity))
    }

    /// Quantity after adding `amount`. Does not mutate the record.
    pub fn after_deposit(&self, amount: u64) -> DomainResult<u64> {
        self.quantity.checked_add(amount).ok_or_else(|| {
            DomainError::validation(format!(
                "quantity overflow at {} (current: {}, adding: {})",
                self.key.location, self.quantity, amount
            ))
        })
    }
}

impl Entity for InventoryRecord {
    type Id = InventoryId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// An inventory record joined with the entities it references.
///
/// `product` is `None` when the product was deleted under the orphaning
/// deletion policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLine {
    pub record: InventoryRecord,
    pub product: Option<Product>,
    pub warehouse: Warehouse,
    pub zone: Option<StorageZone>,
}
