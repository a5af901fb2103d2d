//! Lifecycle hook handlers registered against the car repository.

pub mod inventory_events;

pub use inventory_events::{BioSettings, InventoryEventHandler};
