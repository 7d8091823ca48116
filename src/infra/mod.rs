pub mod tracking;

pub use tracking::{TrackingClient, TrackingClientConfig, TrackingClientError};
