use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use carlot_core::{CarId, DomainError, DomainResult, Entity};

/// Earliest accepted model year (first production automobile).
pub const MIN_MODEL_YEAR: i32 = 1886;

/// Latest accepted model year.
pub const MAX_MODEL_YEAR: i32 = 2100;

/// Decimal places a car value may carry (whole cents).
pub const VALUE_SCALE: u32 = 2;

/// Largest accepted car value, in cents (999 999 999 999.99).
pub const MAX_VALUE_CENTS: i64 = 99_999_999_999_999;

/// Input for creating a car record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCar {
    pub model: String,
    pub brand: String,
    pub model_year: i32,
    pub value: Decimal,
    /// Left empty (or `None`) to have a biography generated before save.
    #[serde(default)]
    pub bio: Option<String>,
}

/// Partial update for an existing car. `None` leaves a field untouched.
///
/// Setting `bio` to an empty string clears it, which makes the next save
/// generate a fresh one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarChanges {
    pub model: Option<String>,
    pub brand: Option<String>,
    pub model_year: Option<i32>,
    pub value: Option<Decimal>,
    pub bio: Option<String>,
}

impl CarChanges {
    pub fn is_empty(&self) -> bool {
        self.model.is_none()
            && self.brand.is_none()
            && self.model_year.is_none()
            && self.value.is_none()
            && self.bio.is_none()
    }
}

/// A car held in inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    id: CarId,
    model: String,
    brand: String,
    model_year: i32,
    value: Decimal,
    bio: String,
}

impl Car {
    /// Build a validated car from creation input.
    pub fn create(id: CarId, input: NewCar) -> DomainResult<Self> {
        let car = Self {
            id,
            model: input.model.trim().to_string(),
            brand: input.brand.trim().to_string(),
            model_year: input.model_year,
            value: input.value,
            bio: input.bio.unwrap_or_default(),
        };
        car.validate()?;
        Ok(car)
    }

    /// Rehydrate a car from storage without re-running validation.
    pub fn restore(
        id: CarId,
        model: String,
        brand: String,
        model_year: i32,
        value: Decimal,
        bio: String,
    ) -> Self {
        Self {
            id,
            model,
            brand,
            model_year,
            value,
            bio,
        }
    }

    pub fn id_typed(&self) -> CarId {
        self.id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn model_year(&self) -> i32 {
        self.model_year
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn bio(&self) -> &str {
        &self.bio
    }

    /// A car needs a generated biography when its `bio` is empty.
    ///
    /// Whitespace counts as content: only the empty string triggers
    /// generation.
    pub fn needs_bio(&self) -> bool {
        self.bio.is_empty()
    }

    /// Replace the biography. Stored verbatim, no length limit.
    pub fn set_bio(&mut self, bio: impl Into<String>) {
        self.bio = bio.into();
    }

    /// Apply a partial update and re-validate. On error `self` is unchanged.
    pub fn apply_changes(&mut self, changes: CarChanges) -> DomainResult<()> {
        let mut next = self.clone();
        if let Some(model) = changes.model {
            next.model = model.trim().to_string();
        }
        if let Some(brand) = changes.brand {
            next.brand = brand.trim().to_string();
        }
        if let Some(year) = changes.model_year {
            next.model_year = year;
        }
        if let Some(value) = changes.value {
            next.value = value;
        }
        if let Some(bio) = changes.bio {
            next.bio = bio;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    fn validate(&self) -> DomainResult<()> {
        if self.model.is_empty() {
            return Err(DomainError::validation("model cannot be empty"));
        }
        if self.brand.is_empty() {
            return Err(DomainError::validation("brand cannot be empty"));
        }
        if !(MIN_MODEL_YEAR..=MAX_MODEL_YEAR).contains(&self.model_year) {
            return Err(DomainError::validation(format!(
                "model_year must be between {MIN_MODEL_YEAR} and {MAX_MODEL_YEAR} (got {})",
                self.model_year
            )));
        }
        if self.value < Decimal::ZERO {
            return Err(DomainError::validation("value cannot be negative"));
        }
        if self.value.normalize().scale() > VALUE_SCALE {
            return Err(DomainError::validation(format!(
                "value must have at most {VALUE_SCALE} decimal places (got {})",
                self.value
            )));
        }
        if self.value > Decimal::new(MAX_VALUE_CENTS, VALUE_SCALE) {
            return Err(DomainError::validation(format!(
                "value cannot exceed {} (got {})",
                Decimal::new(MAX_VALUE_CENTS, VALUE_SCALE),
                self.value
            )));
        }
        Ok(())
    }
}

impl Entity for Car {
    type Id = CarId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn entity_name() -> &'static str {
        "car"
    }
}
