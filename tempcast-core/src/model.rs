use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};

/// Timestamp layout used by Open-Meteo for `timeformat=iso8601`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// ISO-8601 layout with an explicit seconds component.
pub const TIMESTAMP_FORMAT_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

/// Name of the single hourly variable requested from the forecast API.
pub const TEMPERATURE_FIELD: &str = "temperature_2m";

/// Name of the hourly timestamp column.
pub const TIME_FIELD: &str = "time";

/// A point on the globe, latitude and longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Returns `None` when either component is outside its valid range or NaN.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if Self::valid_latitude(latitude) && Self::valid_longitude(longitude) {
            Some(Self {
                latitude,
                longitude,
            })
        } else {
            None
        }
    }

    pub fn valid_latitude(value: f64) -> bool {
        (-90.0..=90.0).contains(&value)
    }

    pub fn valid_longitude(value: f64) -> bool {
        (-180.0..=180.0).contains(&value)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Temperature unit requested from the forecast API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    Celsius,
    #[default]
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
        }
    }

    pub const fn all() -> &'static [TemperatureUnit] {
        &[TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit]
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "celsius" | "c" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(anyhow::anyhow!(
                "Unknown temperature unit '{value}'. Supported units: celsius, fahrenheit."
            )),
        }
    }
}

/// How a timestamp was written in the payload, so it can be written back the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampForm {
    /// `2024-01-01T00:00`
    Minutes,
    /// `2024-01-01T00:00:15`
    Seconds,
    /// Seconds since the epoch, UTC.
    UnixSeconds,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Unix(i64),
}

impl TimestampForm {
    fn render(self, timestamp: NaiveDateTime) -> RawTimestamp {
        match self {
            TimestampForm::Minutes => {
                RawTimestamp::Text(timestamp.format(TIMESTAMP_FORMAT).to_string())
            }
            TimestampForm::Seconds => {
                RawTimestamp::Text(timestamp.format(TIMESTAMP_FORMAT_SECONDS).to_string())
            }
            TimestampForm::UnixSeconds => RawTimestamp::Unix(timestamp.and_utc().timestamp()),
        }
    }
}

/// Hourly timestamps and the matching temperatures.
///
/// Both columns always have the same length and timestamps are strictly
/// ascending; the validator is the only producer.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySeries {
    temperatures: Vec<f64>,
    timestamps: Vec<NaiveDateTime>,
    forms: Vec<TimestampForm>,
}

impl HourlySeries {
    pub(crate) fn new(
        timestamps: Vec<NaiveDateTime>,
        forms: Vec<TimestampForm>,
        temperatures: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(timestamps.len(), temperatures.len());
        debug_assert_eq!(timestamps.len(), forms.len());
        Self {
            temperatures,
            timestamps,
            forms,
        }
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    /// How each timestamp was written in the source payload.
    pub fn timestamp_forms(&self) -> &[TimestampForm] {
        &self.forms
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Iterate `(timestamp, temperature)` pairs in time order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.temperatures.iter().copied())
    }
}

impl Serialize for HourlySeries {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let times: Vec<RawTimestamp> = self
            .timestamps
            .iter()
            .zip(&self.forms)
            .map(|(t, form)| form.render(*t))
            .collect();

        let mut state = serializer.serialize_struct("HourlySeries", 2)?;
        state.serialize_field(TEMPERATURE_FIELD, &self.temperatures)?;
        state.serialize_field(TIME_FIELD, &times)?;
        state.end()
    }
}

/// Unit labels for each hourly column, e.g. `°F` and `iso8601`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyUnits {
    pub temperature_2m: String,
    pub time: String,
}

/// A validated forecast response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherResult {
    hourly: HourlySeries,
    hourly_units: HourlyUnits,
    elevation: f64,
    #[serde(flatten)]
    coordinate: Coordinate,
    timezone: String,
    timezone_abbreviation: String,
    utc_offset_seconds: i32,
    generationtime_ms: f64,
}

/// Field-by-field input for [`WeatherResult`]; only the validator builds one.
pub(crate) struct WeatherParts {
    pub hourly: HourlySeries,
    pub hourly_units: HourlyUnits,
    pub elevation: f64,
    pub coordinate: Coordinate,
    pub timezone: String,
    pub timezone_abbreviation: String,
    pub utc_offset_seconds: i32,
    pub generationtime_ms: f64,
}

impl WeatherResult {
    pub(crate) fn from_parts(parts: WeatherParts) -> Self {
        Self {
            hourly: parts.hourly,
            hourly_units: parts.hourly_units,
            elevation: parts.elevation,
            coordinate: parts.coordinate,
            timezone: parts.timezone,
            timezone_abbreviation: parts.timezone_abbreviation,
            utc_offset_seconds: parts.utc_offset_seconds,
            generationtime_ms: parts.generationtime_ms,
        }
    }

    pub fn hourly(&self) -> &HourlySeries {
        &self.hourly
    }

    pub fn hourly_units(&self) -> &HourlyUnits {
        &self.hourly_units
    }

    pub fn elevation(&self) -> f64 {
        self.elevation
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    pub fn timezone_abbreviation(&self) -> &str {
        &self.timezone_abbreviation
    }

    pub fn utc_offset_seconds(&self) -> i32 {
        self.utc_offset_seconds
    }

    pub fn generationtime_ms(&self) -> f64 {
        self.generationtime_ms
    }

    /// Temperature unit label as reported by the API, e.g. `°F`.
    pub fn temperature_unit_label(&self) -> &str {
        &self.hourly_units.temperature_2m
    }
}
