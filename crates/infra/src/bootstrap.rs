//! Startup wiring: store + text generator + hook registration.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use carlot_ai::{AiError, GeminiClient, TextGenerator};

use crate::config::AppConfig;
use crate::handlers::{BioSettings, InventoryEventHandler};
use crate::repository::CarRepository;
use crate::store::{CarStore, InMemoryCarStore, PostgresCarStore, StoreError};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("store setup failed: {0}")]
    Store(#[from] StoreError),

    #[error("text generator setup failed: {0}")]
    Ai(#[from] AiError),
}

/// Build a ready-to-use repository from validated configuration.
pub fn build_inventory(config: &AppConfig) -> Result<CarRepository<dyn CarStore>, BootstrapError> {
    let store: Arc<dyn CarStore> = match &config.database {
        Some(db) => {
            let store = PostgresCarStore::connect(&db.url, db.max_connections)?;
            store.migrate()?;
            Arc::new(store)
        }
        None => {
            info!("DATABASE_URL not set; using in-memory car store");
            Arc::new(InMemoryCarStore::new())
        }
    };

    let generator: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(config.gemini.clone())?);

    Ok(wire(store, generator, config.bio.clone()))
}

/// Register the inventory handler on a repository over `store`.
pub fn wire<S, G>(store: Arc<S>, generator: Arc<G>, bio: BioSettings) -> CarRepository<S>
where
    S: CarStore + ?Sized + 'static,
    G: TextGenerator + ?Sized + 'static,
{
    let repository = CarRepository::new(store.clone());
    repository.register_hook(Arc::new(InventoryEventHandler::new(store, generator, bio)));
    info!(hooks = ?repository.hooks().names(), "car repository ready");
    repository
}
