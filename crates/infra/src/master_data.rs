//! Master-data lookup boundary.
//!
//! The engine only needs existence checks before a document may reference a
//! location, item, or supplier; full master-data CRUD lives elsewhere.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use mise_core::{ItemId, LocationId, SupplierId};

/// Narrow contract over the master-data collaborator.
pub trait MasterData: Send + Sync {
    fn location_exists(&self, id: LocationId) -> bool;
    fn item_exists(&self, id: ItemId) -> bool;
    fn supplier_exists(&self, id: SupplierId) -> bool;
}

impl<M> MasterData for Arc<M>
where
    M: MasterData + ?Sized,
{
    fn location_exists(&self, id: LocationId) -> bool {
        (**self).location_exists(id)
    }

    fn item_exists(&self, id: ItemId) -> bool {
        (**self).item_exists(id)
    }

    fn supplier_exists(&self, id: SupplierId) -> bool {
        (**self).supplier_exists(id)
    }
}

/// Registry-backed master data for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryMasterData {
    locations: RwLock<HashSet<LocationId>>,
    items: RwLock<HashSet<ItemId>>,
    suppliers: RwLock<HashSet<SupplierId>>,
}

impl InMemoryMasterData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_location(&self, id: LocationId) {
        if let Ok(mut set) = self.locations.write() {
            set.insert(id);
        }
    }

    pub fn register_item(&self, id: ItemId) {
        if let Ok(mut set) = self.items.write() {
            set.insert(id);
        }
    }

    pub fn register_supplier(&self, id: SupplierId) {
        if let Ok(mut set) = self.suppliers.write() {
            set.insert(id);
        }
    }
}

impl MasterData for InMemoryMasterData {
    fn location_exists(&self, id: LocationId) -> bool {
        self.locations
            .read()
            .map(|set| set.contains(&id))
            .unwrap_or(false)
    }

    fn item_exists(&self, id: ItemId) -> bool {
        self.items
            .read()
            .map(|set| set.contains(&id))
            .unwrap_or(false)
    }

    fn supplier_exists(&self, id: SupplierId) -> bool {
        self.suppliers
            .read()
            .map(|set| set.contains(&id))
            .unwrap_or(false)
    }
}
