//! Forward geocoding: free-text address to coordinates.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    config::Config,
    error::{ForecastError, truncate_body},
    model::Coordinate,
};

/// Maps an address to a single coordinate pair.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn resolve(&self, address: &str) -> Result<Coordinate, ForecastError>;
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(&config.geocoder_url, &config.user_agent, config.timeout())
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, address: &str) -> Result<Coordinate, ForecastError> {
        let query = address.trim();
        if query.is_empty() {
            return Err(ForecastError::AddressNotFound {
                address: address.to_string(),
            });
        }

        let url = format!("{}/search", self.base_url);
        tracing::debug!(%url, address = query, "Geocoding address");

        let res = self
            .http
            .get(&url)
            .query(&[("q", query), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| ForecastError::geocoding(address, e))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| ForecastError::geocoding(address, e))?;

        if !status.is_success() {
            tracing::debug!(%status, "Geocoding service returned an error");
            return Err(ForecastError::geocoding(
                address,
                format!("status {status}: {}", truncate_body(&body)),
            ));
        }

        let places: Vec<NominatimPlace> = serde_json::from_str(&body).map_err(|e| {
            ForecastError::geocoding(address, format!("malformed response ({e})"))
        })?;

        let Some(place) = places.into_iter().next() else {
            tracing::info!(address = query, "No geocoding match");
            return Err(ForecastError::AddressNotFound {
                address: address.to_string(),
            });
        };

        let coordinate = parse_coordinate(&place).ok_or_else(|| {
            ForecastError::geocoding(
                address,
                format!("invalid coordinates lat={} lon={}", place.lat, place.lon),
            )
        })?;

        tracing::info!(
            address = query,
            matched = place.display_name.as_deref().unwrap_or("?"),
            %coordinate,
            "Geocoded address"
        );
        Ok(coordinate)
    }
}

fn parse_coordinate(place: &NominatimPlace) -> Option<Coordinate> {
    let lat = place.lat.trim().parse::<f64>().ok()?;
    let lon = place.lon.trim().parse::<f64>().ok()?;
    Coordinate::new(lat, lon)
}
