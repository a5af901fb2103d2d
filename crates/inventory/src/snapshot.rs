//! Point-in-time inventory aggregate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use carlot_core::SnapshotId;

/// Live count and total value of all cars in a store.
///
/// `value` is `None` when there are no cars, mirroring a SQL `SUM` over an
/// empty set.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarTotals {
    pub count: u64,
    pub value: Option<Decimal>,
}

impl CarTotals {
    /// Fold a sequence of car values into totals.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Decimal>,
    {
        values.into_iter().fold(Self::default(), |acc, v| Self {
            count: acc.count + 1,
            value: Some(acc.value.unwrap_or(Decimal::ZERO) + v),
        })
    }
}

/// Append-only record of inventory totals taken after a car was created or
/// deleted. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub id: SnapshotId,
    pub cars_count: u64,
    pub cars_value: Option<Decimal>,
    pub recorded_at: DateTime<Utc>,
}

impl InventorySnapshot {
    pub fn record(id: SnapshotId, totals: CarTotals, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id,
            cars_count: totals.count,
            cars_value: totals.value,
            recorded_at,
        }
    }

    pub fn totals(&self) -> CarTotals {
        CarTotals {
            count: self.cars_count,
            value: self.cars_value,
        }
    }
}
