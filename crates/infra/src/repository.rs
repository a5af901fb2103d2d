//! Car persistence layer with lifecycle hooks.
//!
//! ```text
//! create:  validate → before_save(Create) → insert → created
//! update:  load → apply changes → before_save(Update) → update
//! delete:  delete → deleted
//! ```
//!
//! A pre-save hook error aborts the write (nothing is stored). A post-write
//! hook error is returned after the write has been applied; undoing it is the
//! caller's concern (e.g. by rolling back an enclosing transaction).

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};

use carlot_core::{CarId, DomainError};
use carlot_events::{HookError, HookRegistry, LifecycleHooks, SaveKind};
use carlot_inventory::{Car, CarChanges, InventorySnapshot, NewCar};

use crate::store::{CarStore, StoreError};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error("car {0} not found")]
    NotFound(CarId),
}

/// Persistence entry point for cars.
///
/// Hooks are registered once at startup through [`CarRepository::register_hook`].
pub struct CarRepository<S: ?Sized> {
    store: Arc<S>,
    hooks: HookRegistry<Car>,
}

impl<S: ?Sized> CarRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            hooks: HookRegistry::new(),
        }
    }

    pub fn register_hook(&self, hook: Arc<dyn LifecycleHooks<Car>>) {
        debug!(hook = hook.name(), "registering car lifecycle hook");
        self.hooks.register(hook);
    }

    pub fn hooks(&self) -> &HookRegistry<Car> {
        &self.hooks
    }
}

impl<S> CarRepository<S>
where
    S: CarStore + ?Sized,
{
    #[instrument(skip(self, input), fields(brand = %input.brand, model = %input.model), err)]
    pub fn create(&self, input: NewCar) -> Result<Car, RepositoryError> {
        let mut car = Car::create(CarId::new(), input)?;
        self.hooks.before_save(&mut car, SaveKind::Create)?;
        self.store.insert_car(&car)?;
        debug!(car_id = %car.id_typed(), "car inserted");
        self.hooks.created(&car)?;
        Ok(car)
    }

    /// Apply `changes` and save. Updates run the pre-save hooks but record no
    /// inventory snapshot; only create and delete do.
    #[instrument(skip(self, changes), fields(car_id = %id), err)]
    pub fn update(&self, id: CarId, changes: CarChanges) -> Result<Car, RepositoryError> {
        let mut car = self
            .store
            .get_car(id)?
            .ok_or(RepositoryError::NotFound(id))?;
        car.apply_changes(changes)?;
        self.hooks.before_save(&mut car, SaveKind::Update)?;
        self.store.update_car(&car).map_err(|e| match e {
            StoreError::CarNotFound(id) => RepositoryError::NotFound(id),
            other => other.into(),
        })?;
        debug!("car updated");
        Ok(car)
    }

    #[instrument(skip(self), fields(car_id = %id), err)]
    pub fn delete(&self, id: CarId) -> Result<Car, RepositoryError> {
        let car = self
            .store
            .delete_car(id)?
            .ok_or(RepositoryError::NotFound(id))?;
        debug!("car deleted");
        self.hooks.deleted(&car)?;
        Ok(car)
    }

    pub fn get(&self, id: CarId) -> Result<Option<Car>, RepositoryError> {
        Ok(self.store.get_car(id)?)
    }

    pub fn list(&self) -> Result<Vec<Car>, RepositoryError> {
        Ok(self.store.list_cars()?)
    }

    pub fn latest_snapshot(&self) -> Result<Option<InventorySnapshot>, RepositoryError> {
        Ok(self.store.latest_snapshot()?)
    }

    pub fn list_snapshots(&self) -> Result<Vec<InventorySnapshot>, RepositoryError> {
        Ok(self.store.list_snapshots()?)
    }
}

impl<S: ?Sized> core::fmt::Debug for CarRepository<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CarRepository")
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use rust_decimal::Decimal;

    use super::*;
    use crate::store::InMemoryCarStore;

    #[derive(Default)]
    struct Tracer {
        seen: Mutex<Vec<String>>,
        reject_saves: bool,
    }

    #[derive(Debug, Error)]
    #[error("rejected")]
    struct Rejected;

    impl LifecycleHooks<Car> for Tracer {
        fn name(&self) -> &'static str {
            "tracer"
        }

        fn on_before_save(&self, car: &mut Car, kind: SaveKind) -> Result<(), HookError> {
            self.seen.lock().unwrap().push(format!("before_save:{kind}"));
            if self.reject_saves {
                return Err(HookError::new("tracer", "pre-save", Rejected));
            }
            if car.needs_bio() {
                car.set_bio("traced");
            }
            Ok(())
        }

        fn on_created(&self, _car: &Car) -> Result<(), HookError> {
            self.seen.lock().unwrap().push("created".into());
            Ok(())
        }

        fn on_deleted(&self, _car: &Car) -> Result<(), HookError> {
            self.seen.lock().unwrap().push("deleted".into());
            Ok(())
        }
    }

    fn new_car() -> NewCar {
        NewCar {
            model: "Onix".into(),
            brand: "Chevrolet".into(),
            model_year: 2022,
            value: Decimal::from(70_000),
            bio: None,
        }
    }

    fn setup(tracer: Tracer) -> (CarRepository<InMemoryCarStore>, Arc<Tracer>) {
        let repo = CarRepository::new(Arc::new(InMemoryCarStore::new()));
        let tracer = Arc::new(tracer);
        repo.register_hook(tracer.clone());
        (repo, tracer)
    }

    #[test]
    fn create_runs_before_save_then_created() {
        let (repo, tracer) = setup(Tracer::default());

        let car = repo.create(new_car()).unwrap();

        assert_eq!(car.bio(), "traced");
        assert_eq!(repo.get(car.id_typed()).unwrap().unwrap().bio(), "traced");
        assert_eq!(*tracer.seen.lock().unwrap(), vec!["before_save:create", "created"]);
    }

    #[test]
    fn update_runs_before_save_only() {
        let (repo, tracer) = setup(Tracer::default());
        let car = repo.create(new_car()).unwrap();
        tracer.seen.lock().unwrap().clear();

        let updated = repo
            .update(
                car.id_typed(),
                CarChanges {
                    value: Some(Decimal::from(65_000)),
                    ..CarChanges::default()
                },
            )
            .unwrap();

        assert_eq!(updated.value(), Decimal::from(65_000));
        assert_eq!(*tracer.seen.lock().unwrap(), vec!["before_save:update"]);
    }

    #[test]
    fn rejected_save_stores_nothing() {
        let (repo, tracer) = setup(Tracer {
            reject_saves: true,
            ..Tracer::default()
        });

        let err = repo.create(new_car()).unwrap_err();

        assert!(matches!(err, RepositoryError::Hook(_)));
        assert!(repo.list().unwrap().is_empty());
        assert_eq!(*tracer.seen.lock().unwrap(), vec!["before_save:create"]);
    }

    #[test]
    fn invalid_input_never_reaches_hooks() {
        let (repo, tracer) = setup(Tracer::default());

        let err = repo
            .create(NewCar {
                model: String::new(),
                ..new_car()
            })
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Domain(DomainError::Validation(_))));
        assert!(tracer.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn delete_returns_removed_car_and_fires_deleted() {
        let (repo, tracer) = setup(Tracer::default());
        let car = repo.create(new_car()).unwrap();

        let removed = repo.delete(car.id_typed()).unwrap();

        assert_eq!(removed, car);
        assert!(repo.get(car.id_typed()).unwrap().is_none());
        assert_eq!(tracer.seen.lock().unwrap().last().unwrap(), "deleted");
    }

    #[test]
    fn missing_car_is_not_found() {
        let (repo, tracer) = setup(Tracer::default());
        let id = CarId::new();

        assert!(matches!(repo.delete(id), Err(RepositoryError::NotFound(x)) if x == id));
        assert!(matches!(
            repo.update(id, CarChanges::default()),
            Err(RepositoryError::NotFound(x)) if x == id
        ));
        assert!(tracer.seen.lock().unwrap().is_empty());
    }
}
