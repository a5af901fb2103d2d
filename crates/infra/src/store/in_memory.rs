use std::collections::BTreeMap;
use std::sync::RwLock;

use carlot_core::CarId;
use carlot_inventory::{Car, CarTotals, InventorySnapshot};

use super::{CarStore, StoreError};

/// In-memory car store.
///
/// Intended for tests/dev. Totals are a full scan, like the SQL aggregate.
#[derive(Debug, Default)]
pub struct InMemoryCarStore {
    cars: RwLock<BTreeMap<CarId, Car>>,
    snapshots: RwLock<Vec<InventorySnapshot>>,
}

impl InMemoryCarStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CarStore for InMemoryCarStore {
    fn insert_car(&self, car: &Car) -> Result<(), StoreError> {
        let mut cars = self.cars.write().map_err(|_| StoreError::Poisoned)?;
        if cars.contains_key(&car.id_typed()) {
            return Err(StoreError::Duplicate(format!("car {}", car.id_typed())));
        }
        cars.insert(car.id_typed(), car.clone());
        Ok(())
    }

    fn update_car(&self, car: &Car) -> Result<(), StoreError> {
        let mut cars = self.cars.write().map_err(|_| StoreError::Poisoned)?;
        match cars.get_mut(&car.id_typed()) {
            Some(slot) => {
                *slot = car.clone();
                Ok(())
            }
            None => Err(StoreError::CarNotFound(car.id_typed())),
        }
    }

    fn delete_car(&self, id: CarId) -> Result<Option<Car>, StoreError> {
        let mut cars = self.cars.write().map_err(|_| StoreError::Poisoned)?;
        Ok(cars.remove(&id))
    }

    fn get_car(&self, id: CarId) -> Result<Option<Car>, StoreError> {
        let cars = self.cars.read().map_err(|_| StoreError::Poisoned)?;
        Ok(cars.get(&id).cloned())
    }

    fn list_cars(&self) -> Result<Vec<Car>, StoreError> {
        let cars = self.cars.read().map_err(|_| StoreError::Poisoned)?;
        Ok(cars.values().cloned().collect())
    }

    fn car_totals(&self) -> Result<CarTotals, StoreError> {
        let cars = self.cars.read().map_err(|_| StoreError::Poisoned)?;
        Ok(CarTotals::from_values(cars.values().map(Car::value)))
    }

    fn insert_snapshot(&self, snapshot: &InventorySnapshot) -> Result<(), StoreError> {
        let mut snapshots = self.snapshots.write().map_err(|_| StoreError::Poisoned)?;
        if snapshots.iter().any(|s| s.id == snapshot.id) {
            return Err(StoreError::Duplicate(format!("snapshot {}", snapshot.id)));
        }
        snapshots.push(snapshot.clone());
        Ok(())
    }

    fn latest_snapshot(&self) -> Result<Option<InventorySnapshot>, StoreError> {
        let snapshots = self.snapshots.read().map_err(|_| StoreError::Poisoned)?;
        Ok(snapshots.last().cloned())
    }

    fn list_snapshots(&self) -> Result<Vec<InventorySnapshot>, StoreError> {
        let snapshots = self.snapshots.read().map_err(|_| StoreError::Poisoned)?;
        Ok(snapshots.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use carlot_core::SnapshotId;
    use carlot_inventory::NewCar;

    use super::*;

    fn car(value: i64) -> Car {
        Car::create(
            CarId::new(),
            NewCar {
                model: "Uno".into(),
                brand: "Fiat".into(),
                model_year: 2010,
                value: Decimal::from(value),
                bio: Some("bio".into()),
            },
        )
        .unwrap()
    }

    #[test]
    fn totals_follow_inserts_and_deletes() {
        let store = InMemoryCarStore::new();
        assert_eq!(store.car_totals().unwrap(), CarTotals::default());

        let a = car(10_000);
        let b = car(20_000);
        store.insert_car(&a).unwrap();
        store.insert_car(&b).unwrap();
        assert_eq!(
            store.car_totals().unwrap(),
            CarTotals {
                count: 2,
                value: Some(Decimal::from(30_000))
            }
        );

        assert_eq!(store.delete_car(a.id_typed()).unwrap(), Some(a));
        assert_eq!(store.car_totals().unwrap().count, 1);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let store = InMemoryCarStore::new();
        let a = car(1);
        store.insert_car(&a).unwrap();
        assert!(matches!(store.insert_car(&a), Err(StoreError::Duplicate(_))));
    }

    #[test]
    fn update_of_missing_car_fails() {
        let store = InMemoryCarStore::new();
        let a = car(1);
        assert_eq!(
            store.update_car(&a),
            Err(StoreError::CarNotFound(a.id_typed()))
        );
    }

    #[test]
    fn delete_of_missing_car_returns_none() {
        let store = InMemoryCarStore::new();
        assert_eq!(store.delete_car(CarId::new()).unwrap(), None);
    }

    #[test]
    fn snapshots_are_append_only_in_order() {
        let store = InMemoryCarStore::new();
        let first = InventorySnapshot::record(SnapshotId::new(), CarTotals::default(), Utc::now());
        let second = InventorySnapshot::record(
            SnapshotId::new(),
            CarTotals {
                count: 1,
                value: Some(Decimal::ONE),
            },
            Utc::now(),
        );
        store.insert_snapshot(&first).unwrap();
        store.insert_snapshot(&second).unwrap();

        assert_eq!(store.latest_snapshot().unwrap(), Some(second.clone()));
        assert_eq!(store.list_snapshots().unwrap(), vec![first, second]);
    }
}
