//! Client core for a courier platform front end.
//!
//! Three pieces, all UI-free:
//! - [`domain::pricing`]: deterministic parcel price estimation.
//! - [`sync`]: the auth-to-profile synchronization state machine.
//! - [`infra::tracking`]: a typed client for the tracking REST API.

pub mod domain;
pub mod infra;
pub mod sync;

pub use domain::{PricingInput, PricingResult, SyncState};
pub use sync::{ProfileStore, ProfileSync, ProfileSyncHandle};
