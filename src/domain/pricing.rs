//! Parcel pricing: volumetric weight, chargeable weight and price estimation.
//!
//! Prices are in minor currency units and always rounded to the nearest 100.
//! The tariff table is a placeholder model kept behind [`Tariff`] so it can be
//! swapped for a real rate card without touching the formula shape.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Industry divisor converting parcel volume (cm³) into kilograms.
pub const VOLUMETRIC_DIVISOR: f64 = 5000.0;

/// Upper bound accepted for the actual parcel weight.
pub const MAX_ACTUAL_WEIGHT_KG: f64 = 200.0;

/// Upper bound accepted for any single parcel dimension.
pub const MAX_DIMENSION_CM: f64 = 300.0;

/// Parcel dimensions in centimeters. All sides must be strictly positive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParcelDimensions {
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
}

/// Delivery speed class affecting the price multiplier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceTier {
    #[default]
    Standard,
    Express,
    SameDay,
}

impl ServiceTier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Express => "Express",
            Self::SameDay => "Same-day",
        }
    }
}

/// Destination region for a shipment.
///
/// The quoting form offers a closed list of region names plus an explicit
/// "Other" catch-all; anything outside that list still prices as a named
/// region rather than being rejected.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DestinationRegion {
    /// Home region of the platform; no surcharge.
    Yangon,
    /// Any other named region.
    Named(String),
    /// Catch-all for destinations outside the served regions.
    Other,
}

impl DestinationRegion {
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "Yangon" => Self::Yangon,
            "Other" => Self::Other,
            other => Self::Named(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Yangon => "Yangon",
            Self::Named(name) => name,
            Self::Other => "Other",
        }
    }
}

impl From<String> for DestinationRegion {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<DestinationRegion> for String {
    fn from(region: DestinationRegion) -> Self {
        region.name().to_string()
    }
}

/// Tariff constants used by [`estimate_price`].
///
/// `Default` reproduces the current rate card exactly; quotes produced with a
/// modified tariff are not comparable with stored ones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tariff {
    pub base_fee_minor: i64,
    pub per_kg_minor: i64,
    pub standard_multiplier: f64,
    pub express_multiplier: f64,
    pub same_day_multiplier: f64,
    pub home_region_multiplier: f64,
    pub named_region_multiplier: f64,
    pub other_region_multiplier: f64,
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            base_fee_minor: 2500,
            per_kg_minor: 1200,
            standard_multiplier: 1.0,
            express_multiplier: 1.35,
            same_day_multiplier: 1.8,
            home_region_multiplier: 1.0,
            named_region_multiplier: 1.15,
            other_region_multiplier: 1.25,
        }
    }
}

impl Tariff {
    pub fn service_multiplier(&self, tier: ServiceTier) -> f64 {
        match tier {
            ServiceTier::Standard => self.standard_multiplier,
            ServiceTier::Express => self.express_multiplier,
            ServiceTier::SameDay => self.same_day_multiplier,
        }
    }

    pub fn region_multiplier(&self, region: &DestinationRegion) -> f64 {
        match region {
            DestinationRegion::Yangon => self.home_region_multiplier,
            DestinationRegion::Named(_) => self.named_region_multiplier,
            DestinationRegion::Other => self.other_region_multiplier,
        }
    }
}

/// Validated input for a price estimate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingInput {
    pub actual_weight_kg: f64,
    pub dimensions: ParcelDimensions,
    pub service_tier: ServiceTier,
    pub destination: DestinationRegion,
}

/// Result of a price estimate. Recomputed on every input change; carries no
/// persisted identity of its own.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    pub volumetric_weight_kg: f64,
    pub chargeable_weight_kg: f64,
    pub price_minor_units: i64,
}

#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
    #[error("actual weight {value_kg} kg exceeds the {MAX_ACTUAL_WEIGHT_KG} kg limit")]
    WeightLimitExceeded { value_kg: f64 },
    #[error("{field} of {value_cm} cm exceeds the {MAX_DIMENSION_CM} cm limit")]
    DimensionLimitExceeded { field: &'static str, value_cm: f64 },
}

/// Volumetric weight in kg from dimensions in cm, floored at zero.
///
/// Total for finite non-negative input; negative input is a caller contract
/// violation and is rejected by [`estimate_with`] before reaching this point.
pub fn volumetric_weight_kg(length_cm: f64, width_cm: f64, height_cm: f64) -> f64 {
    ((length_cm * width_cm * height_cm) / VOLUMETRIC_DIVISOR).max(0.0)
}

/// Chargeable weight is the larger of actual and volumetric weight.
pub fn chargeable_weight_kg(actual_kg: f64, volumetric_kg: f64) -> f64 {
    actual_kg.max(volumetric_kg)
}

/// Price in minor units for a chargeable weight under the given tariff.
pub fn estimate_price(
    tier: ServiceTier,
    region: &DestinationRegion,
    chargeable_kg: f64,
    tariff: &Tariff,
) -> i64 {
    let raw = (tariff.base_fee_minor as f64 + tariff.per_kg_minor as f64 * chargeable_kg)
        * tariff.service_multiplier(tier)
        * tariff.region_multiplier(region);
    round_to_hundred(raw)
}

/// Nearest-100 rounding, half-up. Raw prices are non-negative, so
/// `f64::round` (half away from zero) gives half-up here.
fn round_to_hundred(raw: f64) -> i64 {
    (raw / 100.0).round() as i64 * 100
}

/// Full estimate under the default tariff.
pub fn estimate(input: &PricingInput) -> Result<PricingResult, PricingError> {
    estimate_with(input, &Tariff::default())
}

/// Full estimate: validates the input, then composes volumetric weight,
/// chargeable weight and the tariff formula.
pub fn estimate_with(input: &PricingInput, tariff: &Tariff) -> Result<PricingResult, PricingError> {
    validate(input)?;

    let dims = &input.dimensions;
    let volumetric = volumetric_weight_kg(dims.length_cm, dims.width_cm, dims.height_cm);
    let chargeable = chargeable_weight_kg(input.actual_weight_kg, volumetric);
    let price = estimate_price(input.service_tier, &input.destination, chargeable, tariff);

    Ok(PricingResult {
        volumetric_weight_kg: volumetric,
        chargeable_weight_kg: chargeable,
        price_minor_units: price,
    })
}

fn validate(input: &PricingInput) -> Result<(), PricingError> {
    let dims = &input.dimensions;
    let fields = [
        ("actual weight", input.actual_weight_kg),
        ("length", dims.length_cm),
        ("width", dims.width_cm),
        ("height", dims.height_cm),
    ];

    for (field, value) in fields {
        if !value.is_finite() {
            return Err(PricingError::NotFinite { field });
        }
        if value <= 0.0 {
            return Err(PricingError::NotPositive { field });
        }
    }

    if input.actual_weight_kg > MAX_ACTUAL_WEIGHT_KG {
        return Err(PricingError::WeightLimitExceeded {
            value_kg: input.actual_weight_kg,
        });
    }

    let dimension_fields = [
        ("length", dims.length_cm),
        ("width", dims.width_cm),
        ("height", dims.height_cm),
    ];
    for (field, value_cm) in dimension_fields {
        if value_cm > MAX_DIMENSION_CM {
            return Err(PricingError::DimensionLimitExceeded { field, value_cm });
        }
    }

    Ok(())
}
