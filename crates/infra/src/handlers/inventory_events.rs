//! Inventory reactions to car lifecycle events.
//!
//! - created / deleted → record a fresh [`InventorySnapshot`] from live totals.
//! - before save with an empty `bio` → ask the text service for one.
//!
//! Everything runs synchronously on the caller's thread. Failures are not
//! retried and no fallback bio is written; the error aborts the mutation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use carlot_ai::{BioPromptTemplate, CarBioPrompt, GenerationRequest, TextGenerator, DEFAULT_MODEL};
use carlot_core::SnapshotId;
use carlot_events::{HookError, LifecycleHooks, SaveKind};
use carlot_inventory::{Car, InventorySnapshot};

use crate::store::{CarStore, StoreError};

const HOOK_NAME: &str = "inventory_event_handler";

/// How biographies are requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BioSettings {
    /// Fixed model identifier sent with every request.
    pub model: String,
    pub template: BioPromptTemplate,
}

impl Default for BioSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            template: BioPromptTemplate::default(),
        }
    }
}

pub struct InventoryEventHandler<S: ?Sized, G: ?Sized> {
    store: Arc<S>,
    generator: Arc<G>,
    bio: BioSettings,
}

impl<S, G> InventoryEventHandler<S, G>
where
    S: CarStore + ?Sized,
    G: TextGenerator + ?Sized,
{
    pub fn new(store: Arc<S>, generator: Arc<G>, bio: BioSettings) -> Self {
        Self {
            store,
            generator,
            bio,
        }
    }

    /// Read live totals and append one snapshot.
    ///
    /// Full count + sum over the store on every call.
    pub fn record_snapshot(&self) -> Result<InventorySnapshot, StoreError> {
        let totals = self.store.car_totals()?;
        let snapshot = InventorySnapshot::record(SnapshotId::new(), totals, Utc::now());
        self.store.insert_snapshot(&snapshot)?;
        info!(
            snapshot_id = %snapshot.id,
            cars_count = snapshot.cars_count,
            cars_value = ?snapshot.cars_value,
            "inventory snapshot recorded"
        );
        Ok(snapshot)
    }

    fn bio_request(&self, car: &Car) -> GenerationRequest {
        let prompt = CarBioPrompt {
            model: car.model(),
            brand: car.brand(),
            model_year: car.model_year(),
        }
        .render(&self.bio.template);
        GenerationRequest::new(self.bio.model.clone(), prompt)
    }
}

impl<S, G> LifecycleHooks<Car> for InventoryEventHandler<S, G>
where
    S: CarStore + ?Sized,
    G: TextGenerator + ?Sized,
{
    fn name(&self) -> &'static str {
        HOOK_NAME
    }

    fn on_before_save(&self, car: &mut Car, kind: SaveKind) -> Result<(), HookError> {
        if !car.needs_bio() {
            debug!(car_id = %car.id_typed(), kind = %kind, "bio present; skipping generation");
            return Ok(());
        }

        let request = self.bio_request(car);
        let generated = self
            .generator
            .generate(&request)
            .map_err(|e| HookError::new(HOOK_NAME, "pre-save", e))?;

        info!(
            car_id = %car.id_typed(),
            kind = %kind,
            model = %generated.model,
            bio_chars = generated.text.chars().count(),
            "bio generated"
        );
        car.set_bio(generated.text);
        Ok(())
    }

    fn on_created(&self, _car: &Car) -> Result<(), HookError> {
        self.record_snapshot()
            .map(|_| ())
            .map_err(|e| HookError::new(HOOK_NAME, "post-create", e))
    }

    fn on_deleted(&self, _car: &Car) -> Result<(), HookError> {
        self.record_snapshot()
            .map(|_| ())
            .map_err(|e| HookError::new(HOOK_NAME, "post-delete", e))
    }
}

impl<S: ?Sized, G: ?Sized> core::fmt::Debug for InventoryEventHandler<S, G> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InventoryEventHandler")
            .field("bio", &self.bio)
            .finish_non_exhaustive()
    }
}
