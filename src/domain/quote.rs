//! Quotation requests saved per customer in the document store.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::pricing::{PricingInput, PricingResult};

/// A priced quote a customer chose to keep. The id is assigned client-side
/// so the record can be created before the store round-trip completes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuotationRequest {
    pub id: Uuid,
    pub customer_uid: String,
    pub input: PricingInput,
    pub result: PricingResult,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl QuotationRequest {
    pub fn new(customer_uid: impl Into<String>, input: PricingInput, result: PricingResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_uid: customer_uid.into(),
            input,
            result,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Destination label shown in quote listings.
    pub fn destination_label(&self) -> &str {
        self.input.destination.name()
    }
}
