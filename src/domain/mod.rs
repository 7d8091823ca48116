//! Domain logic for parcel quoting and shipment tracking lives here.

pub mod documents;
pub mod pricing;
pub mod profile;
pub mod quote;
pub mod shipment;

pub use documents::{required_documents, RequiredDocument};
pub use pricing::{
    chargeable_weight_kg, estimate, estimate_price, estimate_with, volumetric_weight_kg,
    DestinationRegion, ParcelDimensions, PricingError, PricingInput, PricingResult, ServiceTier,
    Tariff,
};
pub use profile::{Identity, ProfileRecord, Role, SyncState};
pub use quote::QuotationRequest;
pub use shipment::{Shipment, ShipmentStatus, TrackingEvent};
