use std::{fmt, fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::{
    config::Config,
    error::{ForecastError, truncate_body},
    model::{Coordinate, TEMPERATURE_FIELD, TemperatureUnit, WeatherResult},
    schema,
};

/// Fetches and validates an hourly forecast for one coordinate.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch_forecast(&self, coord: Coordinate) -> Result<WeatherResult, ForecastError>;
}

/// Lifecycle of a single forecast request. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Requesting,
    Validating,
    Done,
    Failed,
}

impl FetchState {
    /// Next state after a step either succeeded or failed.
    pub fn advance(self, ok: bool) -> FetchState {
        match (self, ok) {
            (FetchState::Idle, true) => FetchState::Requesting,
            (FetchState::Requesting, true) => FetchState::Validating,
            (FetchState::Validating, true) => FetchState::Done,
            (FetchState::Done, _) => FetchState::Done,
            (_, _) => FetchState::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FetchState::Done | FetchState::Failed)
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchState::Idle => "idle",
            FetchState::Requesting => "requesting",
            FetchState::Validating => "validating",
            FetchState::Done => "done",
            FetchState::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    model: String,
    unit: TemperatureUnit,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(
        base_url: &str,
        model: &str,
        unit: TemperatureUnit,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.to_string(),
            model: model.to_string(),
            unit,
            http,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(
            &config.forecast_url,
            &config.model,
            config.temperature_unit,
            config.timeout(),
        )
    }

    /// Query parameters in the order Open-Meteo documents them.
    pub fn query(&self, coord: Coordinate) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", coord.latitude().to_string()),
            ("longitude", coord.longitude().to_string()),
            ("hourly", TEMPERATURE_FIELD.to_string()),
            ("models", self.model.clone()),
            ("temperature_unit", self.unit.as_str().to_string()),
        ]
    }

    async fn request(&self, coord: Coordinate) -> Result<Value, ForecastError> {
        tracing::debug!(url = %self.base_url, %coord, model = %self.model, "Requesting forecast");

        let res = self
            .http
            .get(&self.base_url)
            .query(&self.query(coord))
            .send()
            .await
            .map_err(|e| transport("failed to reach forecast service", e))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| transport("failed to read forecast body", e))?;

        if !status.is_success() {
            return Err(ForecastError::Transport(format!(
                "forecast request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| transport("forecast body is not valid JSON", e))
    }
}

fn transport(context: &str, err: impl fmt::Display) -> ForecastError {
    ForecastError::Transport(format!("{context}: {err}"))
}

#[async_trait]
impl ForecastProvider for OpenMeteoProvider {
    async fn fetch_forecast(&self, coord: Coordinate) -> Result<WeatherResult, ForecastError> {
        let mut state = FetchState::Idle.advance(true);
        tracing::debug!(%state, "Forecast request state");

        let payload = self.request(coord).await;
        state = state.advance(payload.is_ok());
        tracing::debug!(%state, "Forecast request state");
        if let Err(e) = &payload {
            tracing::debug!(error = %e, "Forecast request failed");
        }
        let payload = payload?;

        let result = schema::validate(&payload).map_err(ForecastError::from);
        state = state.advance(result.is_ok());
        tracing::debug!(%state, "Forecast request state");
        if let Err(e) = &result {
            tracing::debug!(error = %e, "Forecast payload rejected");
        }
        let result = result?;

        debug_assert!(state.is_terminal());
        tracing::info!(
            hours = result.hourly().len(),
            timezone = result.timezone(),
            "Forecast validated"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::ErrorKind;

    fn paris() -> Coordinate {
        Coordinate::new(48.8566, 2.3522).unwrap()
    }

    fn provider(server: &MockServer) -> OpenMeteoProvider {
        OpenMeteoProvider::new(
            &format!("{}/v1/forecast", server.uri()),
            "gfs_seamless",
            TemperatureUnit::Fahrenheit,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn payload() -> Value {
        json!({
            "hourly": {
                "temperature_2m": [60.1, 61.0],
                "time": ["2024-01-01T00:00", "2024-01-01T01:00"]
            },
            "hourly_units": {"temperature_2m": "°F", "time": "iso8601"},
            "elevation": 35.0,
            "latitude": 48.86,
            "longitude": 2.35,
            "timezone": "Europe/Paris",
            "timezone_abbreviation": "CET",
            "utc_offset_seconds": 3600,
            "generationtime_ms": 0.5
        })
    }

    #[test]
    fn state_machine_transitions() {
        let s = FetchState::Idle.advance(true);
        assert_eq!(s, FetchState::Requesting);
        assert_eq!(s.advance(false), FetchState::Failed);
        assert_eq!(s.advance(true).advance(true), FetchState::Done);
        assert_eq!(FetchState::Validating.advance(false), FetchState::Failed);
        assert_eq!(FetchState::Failed.advance(true), FetchState::Failed);
        assert!(FetchState::Done.is_terminal());
        assert!(!FetchState::Requesting.is_terminal());
    }

    #[test]
    fn query_parameters_follow_the_configuration() {
        let offline = OpenMeteoProvider::new(
            "http://localhost/v1/forecast",
            "icon_seamless",
            TemperatureUnit::Celsius,
            Duration::from_secs(1),
        )
        .unwrap();

        let query = offline.query(paris());
        assert_eq!(
            query,
            vec![
                ("latitude", "48.8566".to_string()),
                ("longitude", "2.3522".to_string()),
                ("hourly", "temperature_2m".to_string()),
                ("models", "icon_seamless".to_string()),
                ("temperature_unit", "celsius".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn fetch_forecast_validates_the_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "48.8566"))
            .and(query_param("longitude", "2.3522"))
            .and(query_param("hourly", "temperature_2m"))
            .and(query_param("models", "gfs_seamless"))
            .and(query_param("temperature_unit", "fahrenheit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = provider(&mock_server);
        let result = provider.fetch_forecast(paris()).await.unwrap();

        assert_eq!(result.hourly().len(), 2);
        assert_eq!(result.temperature_unit_label(), "°F");
        assert_eq!(result.timezone(), "Europe/Paris");
    }

    #[tokio::test]
    async fn http_500_is_transport_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = provider(&mock_server);
        let err = provider.fetch_forecast(paris()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TransportError);
        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("internal error"));
    }

    #[tokio::test]
    async fn invalid_json_is_transport_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"hourly\":"))
            .mount(&mock_server)
            .await;

        let provider = provider(&mock_server);
        let err = provider.fetch_forecast(paris()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportError);
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[tokio::test]
    async fn schema_violation_propagates_unchanged() {
        let mock_server = MockServer::start().await;
        let body = json!({"hourly": "not a dict"});

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&mock_server)
            .await;

        let provider = provider(&mock_server);
        let err = provider.fetch_forecast(paris()).await.unwrap_err();

        match err {
            ForecastError::Schema(violation) => {
                assert_eq!(violation.path, "hourly");
                assert_eq!(violation.expected, "object");
            }
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_service_times_out_as_transport_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(payload())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let provider = OpenMeteoProvider::new(
            &format!("{}/v1/forecast", mock_server.uri()),
            "gfs_seamless",
            TemperatureUnit::Fahrenheit,
            Duration::from_millis(200),
        )
        .unwrap();

        let err = provider.fetch_forecast(paris()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportError);
    }
}
