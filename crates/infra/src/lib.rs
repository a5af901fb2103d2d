//! Infrastructure layer: storage adapters, hook wiring, config.

pub mod bootstrap;
pub mod config;
pub mod handlers;
pub mod repository;
pub mod store;


pub use bootstrap::{build_inventory, wire, BootstrapError};
pub use config::{AppConfig, ConfigError, DatabaseConfig};
pub use handlers::{BioSettings, InventoryEventHandler};
pub use repository::{CarRepository, RepositoryError};
pub use store::{CarStore, InMemoryCarStore, PostgresCarStore, StoreError};
