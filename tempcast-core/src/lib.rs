//! Core library for the `tempcast` CLI.
//!
//! This crate defines:
//! - Configuration handling
//! - The geocoding and forecast clients, behind traits
//! - Strict validation of forecast payloads into typed results
//!
//! It is used by `tempcast-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod forecast;
pub mod geocode;
pub mod model;
pub mod pipeline;
pub mod schema;

pub use config::Config;
pub use error::{ErrorKind, ForecastError, SchemaViolation};
pub use forecast::{FetchState, ForecastProvider, OpenMeteoProvider};
pub use geocode::{Geocoder, NominatimGeocoder};
pub use model::{
    Coordinate, HourlySeries, HourlyUnits, TemperatureUnit, TimestampForm, WeatherResult,
};
pub use pipeline::{Forecast, Pipeline};
