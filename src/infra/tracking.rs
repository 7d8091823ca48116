//! Thin asynchronous client for the courier tracking REST API.
//!
//! - Typed accessors for shipments and their tracking events.
//! - Shipment lookup tries the tracking number first and falls back to the
//!   order id, so both references printed on a receipt resolve.

use std::time::{Duration, SystemTime};

use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::domain::shipment::{Shipment, ShipmentStatus, TrackingEvent};

const USER_AGENT: &str = "courier-core/0.1.0";

/// Connection settings, passed explicitly at construction. There is no
/// ambient default base URL; the hosting application owns that decision.
#[derive(Clone, Debug)]
pub struct TrackingClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl TrackingClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum TrackingClientError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error: {0}")]
    Api(String),
    #[error("no shipment matched reference {0:?}")]
    NotFound(String),
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    status: String,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone)]
pub struct TrackingClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl TrackingClient {
    pub fn new(config: TrackingClientConfig) -> Result<Self, TrackingClientError> {
        let base_url = Url::parse(&config.base_url)?;
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url,
            api_key: config.api_key,
        })
    }

    /// Resolve a customer-entered reference to a shipment.
    ///
    /// Receipts carry both a tracking number and an order id and customers
    /// paste either one, so the lookup attempts both query strategies in
    /// order and returns the first hit.
    pub async fn find_shipment(&self, reference: &str) -> Result<Shipment, TrackingClientError> {
        let attempts = [("tracking_number", reference), ("order_id", reference)];

        let mut last_error: Option<TrackingClientError> = None;
        for (key, value) in attempts {
            let mut url = self.url("shipments")?;
            url.query_pairs_mut().append_pair(key, value);

            match self.fetch_data::<Vec<ShipmentDto>>(self.http.get(url.clone())).await {
                Ok(mut rows) if !rows.is_empty() => return Ok(rows.remove(0).into()),
                Ok(_) => {
                    tracing::debug!(key, reference, "no shipment matched, trying next strategy");
                }
                Err(error) => {
                    tracing::debug!(key, reference, %error, "shipment lookup failed, trying next strategy");
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| TrackingClientError::NotFound(reference.to_string())))
    }

    /// Tracking timeline for a shipment, oldest first as the API emits it.
    pub async fn get_tracking_events(
        &self,
        shipment_id: &str,
    ) -> Result<Vec<TrackingEvent>, TrackingClientError> {
        let mut url = self.url("tracking_events")?;
        url.query_pairs_mut().append_pair("shipment_id", shipment_id);

        let events: Vec<TrackingEventDto> = self.fetch_data(self.http.get(url)).await?;
        Ok(events.into_iter().map(TrackingEvent::from).collect())
    }

    async fn fetch_data<T>(&self, builder: reqwest::RequestBuilder) -> Result<T, TrackingClientError>
    where
        T: DeserializeOwned,
    {
        let builder = match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        };
        let response = builder.send().await?.error_for_status()?;
        let envelope: ApiEnvelope<T> = response.json().await?;
        decode_envelope(envelope)
    }

    fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }
}

fn decode_envelope<T>(envelope: ApiEnvelope<T>) -> Result<T, TrackingClientError> {
    let ApiEnvelope {
        status,
        data,
        message,
    } = envelope;

    if status.eq_ignore_ascii_case("ok") {
        data.ok_or_else(|| TrackingClientError::Api("response missing data".into()))
    } else {
        Err(TrackingClientError::Api(message.unwrap_or(status)))
    }
}

#[derive(Debug, Deserialize)]
struct ShipmentDto {
    id: String,
    tracking_number: String,
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    origin_station: Option<String>,
    #[serde(default)]
    destination_station: Option<String>,
    #[serde(default, alias = "updatedAt")]
    updated_at: Option<String>,
}

impl From<ShipmentDto> for Shipment {
    fn from(dto: ShipmentDto) -> Self {
        Self {
            id: dto.id,
            tracking_number: dto.tracking_number,
            order_id: dto.order_id,
            status: dto
                .status
                .as_deref()
                .map(ShipmentStatus::from_name)
                .unwrap_or_default(),
            origin_station: dto.origin_station,
            destination_station: dto.destination_station,
            updated_at: parse_timestamp_str(dto.updated_at.as_deref()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TrackingEventDto {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    station: Option<String>,
    #[serde(default, alias = "recordedAt")]
    recorded_at: Option<String>,
}

impl From<TrackingEventDto> for TrackingEvent {
    fn from(dto: TrackingEventDto) -> Self {
        Self {
            status: dto
                .status
                .as_deref()
                .map(ShipmentStatus::from_name)
                .unwrap_or_default(),
            description: dto.description,
            station: dto.station,
            recorded_at: parse_timestamp_str(dto.recorded_at.as_deref()),
        }
    }
}

fn parse_timestamp_str(raw: Option<&str>) -> SystemTime {
    raw.and_then(|value| {
        OffsetDateTime::parse(value, &Rfc3339).ok().and_then(|dt| {
            if dt.unix_timestamp() >= 0 {
                let secs = dt.unix_timestamp() as u64;
                let nanos = dt.nanosecond() as u64;
                SystemTime::UNIX_EPOCH
                    .checked_add(Duration::from_secs(secs))
                    .and_then(|time| time.checked_add(Duration::from_nanos(nanos)))
            } else {
                None
            }
        })
    })
    .unwrap_or_else(SystemTime::now)
}
