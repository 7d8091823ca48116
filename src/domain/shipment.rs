//! Shipment and tracking entities returned by the courier REST API.

use std::fmt;
use std::time::SystemTime;

/// Delivery lifecycle status as reported by the tracking API.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ShipmentStatus {
    #[default]
    Pending,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    Returned,
    /// Status strings this client version does not know yet.
    Unknown(String),
}

impl ShipmentStatus {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "picked_up" => Self::PickedUp,
            "in_transit" => Self::InTransit,
            "out_for_delivery" => Self::OutForDelivery,
            "delivered" => Self::Delivered,
            "returned" => Self::Returned,
            _ => Self::Unknown(name.trim().to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::PickedUp => "picked_up",
            Self::InTransit => "in_transit",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Returned => "returned",
            Self::Unknown(name) => name,
        }
    }

    /// Terminal statuses end the tracking timeline.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Returned)
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Shipment {
    pub id: String,
    pub tracking_number: String,
    pub order_id: Option<String>,
    pub status: ShipmentStatus,
    pub origin_station: Option<String>,
    pub destination_station: Option<String>,
    pub updated_at: SystemTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrackingEvent {
    pub status: ShipmentStatus,
    pub description: Option<String>,
    pub station: Option<String>,
    pub recorded_at: SystemTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing_preserves_unknown_values() {
        assert_eq!(ShipmentStatus::from_name("In_Transit"), ShipmentStatus::InTransit);
        assert_eq!(
            ShipmentStatus::from_name("held_at_customs"),
            ShipmentStatus::Unknown("held_at_customs".to_string())
        );
        assert_eq!(ShipmentStatus::from_name("held_at_customs").name(), "held_at_customs");
    }

    #[test]
    fn delivered_and_returned_are_terminal() {
        assert!(ShipmentStatus::Delivered.is_terminal());
        assert!(ShipmentStatus::Returned.is_terminal());
        assert!(!ShipmentStatus::OutForDelivery.is_terminal());
    }
}
