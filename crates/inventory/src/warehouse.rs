use serde::{Deserialize, Serialize};

use warehouse_core::{DomainError, DomainResult, Entity, ValueObject, WarehouseId, ZoneId};

use crate::record::InventoryRecord;
use crate::validation::non_empty;

/// A physical site. Warehouses are reference data: seeded once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    id: WarehouseId,
    location: String,
}

impl Warehouse {
    pub fn new(id: WarehouseId, location: impl Into<String>) -> Self {
        Self {
            id,
            location: location.into(),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Zone capacity in units. Informational: stock movements do not check it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capacity(u32);

impl Capacity {
    pub fn new(units: u32) -> DomainResult<Self> {
        if units == 0 {
            return Err(DomainError::validation("capacity must be positive"));
        }
        Ok(Self(units))
    }

    pub fn units(&self) -> u32 {
        self.0
    }
}

impl ValueObject for Capacity {}

/// Validated input for creating a storage zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewZone {
    pub name: String,
    pub capacity: Capacity,
    pub warehouse_id: WarehouseId,
}

impl NewZone {
    pub fn new(name: &str, capacity: u32, warehouse_id: WarehouseId) -> DomainResult<Self> {
        Ok(Self {
            name: non_empty("zone name", name)?,
            capacity: Capacity::new(capacity)?,
            warehouse_id,
        })
    }
}

/// A sub-location of exactly one warehouse (cold room, rack, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageZone {
    id: ZoneId,
    name: String,
    capacity: Capacity,
    warehouse_id: WarehouseId,
}

impl StorageZone {
    pub fn from_new(id: ZoneId, new: NewZone) -> Self {
        Self {
            id,
            name: new.name,
            capacity: new.capacity,
            warehouse_id: new.warehouse_id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub fn warehouse_id(&self) -> WarehouseId {
        self.warehouse_id
    }

    pub fn belongs_to(&self, warehouse_id: WarehouseId) -> bool {
        self.warehouse_id == warehouse_id
    }
}

impl Entity for StorageZone {
    type Id = ZoneId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// A zone together with the inventory records stored in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneStock {
    pub zone: StorageZone,
    pub records: Vec<InventoryRecord>,
}

impl ZoneStock {
    /// Total units currently recorded in the zone, saturating at `u64::MAX`.
    pub fn occupancy(&self) -> u64 {
        self.records
            .iter()
            .fold(0u64, |total, r| total.saturating_add(r.quantity()))
    }

    /// Whether recorded stock exceeds the zone's nominal capacity.
    pub fn is_over_capacity(&self) -> bool {
        self.occupancy() > u64::from(self.zone.capacity().units())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{InventoryKey, Location};
    use warehouse_core::{InventoryId, ProductId};

    fn cold_room() -> StorageZone {
        let new = NewZone::new("Cold room 1", 100, WarehouseId::new(1)).unwrap();
        StorageZone::from_new(ZoneId::new(1), new)
    }

    fn record(id: i64, product: i64, quantity: u64) -> InventoryRecord {
        let key = InventoryKey::new(
            ProductId::new(product),
            Location::zone(WarehouseId::new(1), ZoneId::new(1)),
        );
        InventoryRecord::new(InventoryId::new(id), key, quantity)
    }

    #[test]
    fn new_zone_requires_name_and_capacity() {
        assert!(NewZone::new("", 10, WarehouseId::new(1)).is_err());
        assert!(NewZone::new("Rack", 0, WarehouseId::new(1)).is_err());
        assert!(NewZone::new("Rack", 1, WarehouseId::new(1)).is_ok());
    }

    #[test]
    fn zone_knows_its_warehouse() {
        let zone = cold_room();
        assert!(zone.belongs_to(WarehouseId::new(1)));
        assert!(!zone.belongs_to(WarehouseId::new(2)));
    }

    #[test]
    fn occupancy_sums_records_and_flags_overflow() {
        let stock = ZoneStock {
            zone: cold_room(),
            records: vec![record(1, 10, 60), record(2, 11, 30)],
        };
        assert_eq!(stock.occupancy(), 90);
        assert!(!stock.is_over_capacity());

        let stock = ZoneStock {
            zone: cold_room(),
            records: vec![record(1, 10, 60), record(2, 11, 41)],
        };
        assert!(stock.is_over_capacity());
    }

    #[test]
    fn occupancy_saturates_instead_of_overflowing() {
        let stock = ZoneStock {
            zone: cold_room(),
            records: vec![record(1, 10, u64::MAX), record(2, 11, 1)],
        };
        assert_eq!(stock.occupancy(), u64::MAX);
        assert!(stock.is_over_capacity());
    }
}
