use crate::{
    config::Config,
    error::ForecastError,
    forecast::{ForecastProvider, OpenMeteoProvider},
    geocode::{Geocoder, NominatimGeocoder},
    model::{Coordinate, WeatherResult},
};

/// Outcome of one successful run.
#[derive(Debug, Clone)]
pub struct Forecast {
    pub address: String,
    pub coordinate: Coordinate,
    pub weather: WeatherResult,
}

/// Geocode, then fetch. Each step finishes before the next one starts and
/// the first failure ends the run.
#[derive(Debug)]
pub struct Pipeline {
    geocoder: Box<dyn Geocoder>,
    provider: Box<dyn ForecastProvider>,
}

impl Pipeline {
    pub fn new(geocoder: Box<dyn Geocoder>, provider: Box<dyn ForecastProvider>) -> Self {
        Self { geocoder, provider }
    }

    /// Nominatim + Open-Meteo, configured from `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            Box::new(NominatimGeocoder::from_config(config)?),
            Box::new(OpenMeteoProvider::from_config(config)?),
        ))
    }

    pub async fn run(&self, address: &str) -> Result<Forecast, ForecastError> {
        tracing::info!(address, "Resolving address");
        let coordinate = self.geocoder.resolve(address).await?;

        tracing::info!(%coordinate, "Fetching forecast");
        let weather = self.provider.fetch_forecast(coordinate).await?;

        Ok(Forecast {
            address: address.to_string(),
            coordinate,
            weather,
        })
    }
}
