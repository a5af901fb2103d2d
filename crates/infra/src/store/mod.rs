//! Car + snapshot storage boundary.
//!
//! The store is the persistence layer's raw side: plain reads and writes with
//! no hooks. [`crate::repository::CarRepository`] wraps a store and fires
//! lifecycle hooks around its mutations.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use thiserror::Error;

use carlot_core::CarId;
use carlot_inventory::{Car, CarTotals, InventorySnapshot};

pub use in_memory::InMemoryCarStore;
pub use postgres::PostgresCarStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Tried to update a car that does not exist.
    #[error("car {0} not found")]
    CarNotFound(CarId),

    /// A record with the same id already exists.
    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// Backend failure (connection, query, decoding).
    #[error("database error: {0}")]
    Database(String),

    /// An in-process lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Synchronous car/snapshot storage.
///
/// Implementations must make a write visible to subsequent reads on the same
/// store before returning, so post-write hooks observe it.
pub trait CarStore: Send + Sync {
    fn insert_car(&self, car: &Car) -> Result<(), StoreError>;

    /// Overwrite an existing car. Fails with [`StoreError::CarNotFound`] if absent.
    fn update_car(&self, car: &Car) -> Result<(), StoreError>;

    /// Remove a car, returning it if it existed.
    fn delete_car(&self, id: CarId) -> Result<Option<Car>, StoreError>;

    fn get_car(&self, id: CarId) -> Result<Option<Car>, StoreError>;

    fn list_cars(&self) -> Result<Vec<Car>, StoreError>;

    /// Live count and value sum over every stored car.
    fn car_totals(&self) -> Result<CarTotals, StoreError>;

    /// Append a snapshot. Snapshots are never updated or deleted.
    fn insert_snapshot(&self, snapshot: &InventorySnapshot) -> Result<(), StoreError>;

    fn latest_snapshot(&self) -> Result<Option<InventorySnapshot>, StoreError>;

    /// All snapshots, oldest first.
    fn list_snapshots(&self) -> Result<Vec<InventorySnapshot>, StoreError>;
}

impl<S> CarStore for Arc<S>
where
    S: CarStore + ?Sized,
{
    fn insert_car(&self, car: &Car) -> Result<(), StoreError> {
        (**self).insert_car(car)
    }

    fn update_car(&self, car: &Car) -> Result<(), StoreError> {
        (**self).update_car(car)
    }

    fn delete_car(&self, id: CarId) -> Result<Option<Car>, StoreError> {
        (**self).delete_car(id)
    }

    fn get_car(&self, id: CarId) -> Result<Option<Car>, StoreError> {
        (**self).get_car(id)
    }

    fn list_cars(&self) -> Result<Vec<Car>, StoreError> {
        (**self).list_cars()
    }

    fn car_totals(&self) -> Result<CarTotals, StoreError> {
        (**self).car_totals()
    }

    fn insert_snapshot(&self, snapshot: &InventorySnapshot) -> Result<(), StoreError> {
        (**self).insert_snapshot(snapshot)
    }

    fn latest_snapshot(&self) -> Result<Option<InventorySnapshot>, StoreError> {
        (**self).latest_snapshot()
    }

    fn list_snapshots(&self) -> Result<Vec<InventorySnapshot>, StoreError> {
        (**self).list_snapshots()
    }
}
