//! Car inventory domain module.
//!
//! This crate contains the car record and the inventory snapshot, implemented
//! as deterministic domain logic (no IO, no HTTP, no storage).

pub mod car;
pub mod snapshot;

pub use car::{
    Car, CarChanges, NewCar, MAX_MODEL_YEAR, MAX_VALUE_CENTS, MIN_MODEL_YEAR, VALUE_SCALE,
};
pub use snapshot::{CarTotals, InventorySnapshot};
