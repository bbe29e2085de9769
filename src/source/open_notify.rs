use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::error::FetchError;
use super::PositionSource;
use crate::tracker::{in_range, Fix};

pub const DEFAULT_URL: &str = "http://api.open-notify.org/iss-now.json";

#[derive(Debug, Deserialize)]
struct NowResponse {
    message: String,
    #[serde(default)]
    timestamp: Option<i64>,
    iss_position: Option<RawPosition>,
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    latitude: Coordinate,
    longitude: Coordinate,
}

/// The API sends coordinates as decimal strings; accept plain numbers too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Text(String),
    Number(f64),
}

impl Coordinate {
    fn value(&self, name: &str) -> Result<f64, FetchError> {
        match self {
            Coordinate::Number(v) => Ok(*v),
            Coordinate::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| FetchError::Payload(format!("invalid {name}: {s:?}"))),
        }
    }
}

/// Polls the Open Notify "ISS location now" endpoint.
pub struct OpenNotifySource {
    client: Client,
    url: String,
}

impl OpenNotifySource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl PositionSource for OpenNotifySource {
    async fn fetch(&self) -> Result<Fix, FetchError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let bytes = response.bytes().await?;
        log::debug!("Position payload: {}", String::from_utf8_lossy(&bytes));
        parse_payload(&bytes, Utc::now())
    }
}

/// Decodes a payload, using `received` when it carries no usable timestamp.
pub fn parse_payload(bytes: &[u8], received: DateTime<Utc>) -> Result<Fix, FetchError> {
    let response: NowResponse = serde_json::from_slice(bytes)?;
    if response.message != "success" {
        return Err(FetchError::Payload(format!(
            "api message {:?}",
            response.message
        )));
    }
    let position = response
        .iss_position
        .ok_or_else(|| FetchError::Payload("missing iss_position".into()))?;

    let latitude = position.latitude.value("latitude")?;
    let longitude = position.longitude.value("longitude")?;
    if !in_range(latitude, longitude) {
        return Err(FetchError::OutOfRange {
            latitude,
            longitude,
        });
    }

    let timestamp = response
        .timestamp
        .and_then(|t| DateTime::from_timestamp(t, 0))
        .unwrap_or(received);

    Ok(Fix::new(latitude, longitude, timestamp))
}
