//! Postgres-backed car store.
//!
//! The store API is synchronous, so the store owns a small current-thread
//! Tokio runtime and blocks on each query. Do not call it from inside another
//! Tokio runtime (`block_on` would panic).
//!
//! ## Error Mapping
//!
//! | SQLx error | Postgres code | `StoreError` |
//! |------------|---------------|--------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (other) | any | `Database` |
//! | PoolClosed / Io / other | n/a | `Database` |

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tokio::runtime::Runtime;
use tracing::{info, instrument};
use uuid::Uuid;

use carlot_core::{CarId, SnapshotId};
use carlot_inventory::{Car, CarTotals, InventorySnapshot};

use super::{CarStore, StoreError};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS cars (
        id          UUID PRIMARY KEY,
        model       TEXT NOT NULL,
        brand       TEXT NOT NULL,
        model_year  INTEGER NOT NULL,
        value       NUMERIC(14, 2) NOT NULL CHECK (value >= 0),
        bio         TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inventory_snapshots (
        id           UUID PRIMARY KEY,
        cars_count   BIGINT NOT NULL CHECK (cars_count >= 0),
        cars_value   NUMERIC,
        recorded_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS inventory_snapshots_recorded_at_idx
        ON inventory_snapshots (recorded_at, id)
    "#,
];

/// Postgres-backed [`CarStore`].
#[derive(Debug, Clone)]
pub struct PostgresCarStore {
    pool: PgPool,
    runtime: Arc<Runtime>,
}

impl PostgresCarStore {
    /// Connect a pool and start the store's private runtime.
    pub fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::Database(format!("failed to start runtime: {e}")))?;

        let pool = runtime
            .block_on(
                PgPoolOptions::new()
                    .max_connections(max_connections)
                    .acquire_timeout(Duration::from_secs(5))
                    .connect(database_url),
            )
            .map_err(|e| map_sqlx_error("connect", e))?;

        info!(max_connections, "connected to postgres");

        Ok(Self {
            pool,
            runtime: Arc::new(runtime),
        })
    }

    /// Create tables if they do not exist.
    pub fn migrate(&self) -> Result<(), StoreError> {
        self.runtime.block_on(async {
            for statement in SCHEMA {
                sqlx::query(statement)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| map_sqlx_error("migrate", e))?;
            }
            Ok::<(), StoreError>(())
        })
    }
}

impl CarStore for PostgresCarStore {
    #[instrument(skip(self, car), fields(car_id = %car.id_typed()), err)]
    fn insert_car(&self, car: &Car) -> Result<(), StoreError> {
        self.runtime.block_on(async {
            sqlx::query(
                r#"
                INSERT INTO cars (id, model, brand, model_year, value, bio)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(car.id_typed().as_uuid())
            .bind(car.model())
            .bind(car.brand())
            .bind(car.model_year())
            .bind(car.value())
            .bind(car.bio())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_car", e))?;
            Ok::<(), StoreError>(())
        })
    }

    #[instrument(skip(self, car), fields(car_id = %car.id_typed()), err)]
    fn update_car(&self, car: &Car) -> Result<(), StoreError> {
        let result = self.runtime.block_on(async {
            sqlx::query(
                r#"
                UPDATE cars
                SET model = $2, brand = $3, model_year = $4, value = $5, bio = $6
                WHERE id = $1
                "#,
            )
            .bind(car.id_typed().as_uuid())
            .bind(car.model())
            .bind(car.brand())
            .bind(car.model_year())
            .bind(car.value())
            .bind(car.bio())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_car", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::CarNotFound(car.id_typed()));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(car_id = %id), err)]
    fn delete_car(&self, id: CarId) -> Result<Option<Car>, StoreError> {
        let row = self.runtime.block_on(async {
            sqlx::query(
                r#"
                DELETE FROM cars
                WHERE id = $1
                RETURNING id, model, brand, model_year, value, bio
                "#,
            )
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_car", e))
        })?;

        row.as_ref().map(car_from_row).transpose()
    }

    fn get_car(&self, id: CarId) -> Result<Option<Car>, StoreError> {
        let row = self.runtime.block_on(async {
            sqlx::query(
                r#"
                SELECT id, model, brand, model_year, value, bio
                FROM cars
                WHERE id = $1
                "#,
            )
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_car", e))
        })?;

        row.as_ref().map(car_from_row).transpose()
    }

    fn list_cars(&self) -> Result<Vec<Car>, StoreError> {
        let rows = self.runtime.block_on(async {
            sqlx::query(
                r#"
                SELECT id, model, brand, model_year, value, bio
                FROM cars
                ORDER BY id ASC
                "#,
            )
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_cars", e))
        })?;

        rows.iter().map(car_from_row).collect()
    }

    #[instrument(skip(self), err)]
    fn car_totals(&self) -> Result<CarTotals, StoreError> {
        let row = self.runtime.block_on(async {
            sqlx::query("SELECT COUNT(*) AS cars_count, SUM(value) AS cars_value FROM cars")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("car_totals", e))
        })?;

        let count: i64 = get(&row, "cars_count")?;
        let value: Option<Decimal> = get(&row, "cars_value")?;
        Ok(CarTotals {
            count: to_count(count)?,
            value,
        })
    }

    #[instrument(skip(self, snapshot), fields(snapshot_id = %snapshot.id), err)]
    fn insert_snapshot(&self, snapshot: &InventorySnapshot) -> Result<(), StoreError> {
        let count = i64::try_from(snapshot.cars_count)
            .map_err(|_| StoreError::Database("cars_count exceeds BIGINT".to_string()))?;

        self.runtime.block_on(async {
            sqlx::query(
                r#"
                INSERT INTO inventory_snapshots (id, cars_count, cars_value, recorded_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(snapshot.id.as_uuid())
            .bind(count)
            .bind(snapshot.cars_value)
            .bind(snapshot.recorded_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_snapshot", e))?;
            Ok::<(), StoreError>(())
        })
    }

    fn latest_snapshot(&self) -> Result<Option<InventorySnapshot>, StoreError> {
        let row = self.runtime.block_on(async {
            sqlx::query(
                r#"
                SELECT id, cars_count, cars_value, recorded_at
                FROM inventory_snapshots
                ORDER BY recorded_at DESC, id DESC
                LIMIT 1
                "#,
            )
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("latest_snapshot", e))
        })?;

        row.as_ref().map(snapshot_from_row).transpose()
    }

    fn list_snapshots(&self) -> Result<Vec<InventorySnapshot>, StoreError> {
        let rows = self.runtime.block_on(async {
            sqlx::query(
                r#"
                SELECT id, cars_count, cars_value, recorded_at
                FROM inventory_snapshots
                ORDER BY recorded_at ASC, id ASC
                "#,
            )
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_snapshots", e))
        })?;

        rows.iter().map(snapshot_from_row).collect()
    }
}

fn car_from_row(row: &PgRow) -> Result<Car, StoreError> {
    let id: Uuid = get(row, "id")?;
    Ok(Car::restore(
        CarId::from_uuid(id),
        get(row, "model")?,
        get(row, "brand")?,
        get(row, "model_year")?,
        get(row, "value")?,
        get(row, "bio")?,
    ))
}

fn snapshot_from_row(row: &PgRow) -> Result<InventorySnapshot, StoreError> {
    let id: Uuid = get(row, "id")?;
    let count: i64 = get(row, "cars_count")?;
    let recorded_at: DateTime<Utc> = get(row, "recorded_at")?;
    Ok(InventorySnapshot {
        id: SnapshotId::from_uuid(id),
        cars_count: to_count(count)?,
        cars_value: get(row, "cars_value")?,
        recorded_at,
    })
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Database(format!("failed to decode column `{column}`: {e}")))
}

fn to_count(count: i64) -> Result<u64, StoreError> {
    u64::try_from(count).map_err(|_| StoreError::Database(format!("negative count {count}")))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Duplicate(msg),
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Database(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Database(format!("sqlx error in {operation}: {err}")),
    }
}
