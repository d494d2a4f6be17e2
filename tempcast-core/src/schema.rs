//! Strict validation of Open-Meteo forecast payloads.
//!
//! The decoded JSON is walked field by field in a fixed order and the first
//! mismatch aborts the whole payload. Numeric-looking values (JSON numbers and
//! numeric strings) are coerced to the declared type only when the conversion
//! is exact.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDateTime};
use serde_json::{Map, Value};

use crate::{
    error::SchemaViolation,
    model::{
        Coordinate, HourlySeries, HourlyUnits, TEMPERATURE_FIELD, TIME_FIELD, TIMESTAMP_FORMAT,
        TIMESTAMP_FORMAT_SECONDS, TimestampForm, WeatherParts, WeatherResult,
    },
};

type Result<T> = std::result::Result<T, SchemaViolation>;

/// Accepted textual layouts for hourly timestamps, tried in order.
const TIMESTAMP_LAYOUTS: &[(&str, TimestampForm)] = &[
    (TIMESTAMP_FORMAT, TimestampForm::Minutes),
    (TIMESTAMP_FORMAT_SECONDS, TimestampForm::Seconds),
];

/// 2^53; larger integers do not survive conversion to f64.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Validate a decoded forecast payload into a [`WeatherResult`].
pub fn validate(payload: &Value) -> Result<WeatherResult> {
    let root = as_object(payload, "$")?;

    let hourly_value = required(root, "", "hourly", "object")?;
    let hourly_obj = as_object(hourly_value, "hourly")?;
    let hourly = hourly_series(hourly_obj)?;

    let units_value = required(root, "", "hourly_units", "object")?;
    let units_obj = as_object(units_value, "hourly_units")?;
    let hourly_units = hourly_units(units_obj)?;
    check_unit_keys(hourly_obj, units_obj)?;

    let elevation = as_f64(required(root, "", "elevation", "number")?, "elevation")?;

    let latitude = as_f64(required(root, "", "latitude", "number")?, "latitude")?;
    if !Coordinate::valid_latitude(latitude) {
        return Err(SchemaViolation::new(
            "latitude",
            "latitude between -90 and 90",
            latitude.to_string(),
        ));
    }
    let longitude = as_f64(required(root, "", "longitude", "number")?, "longitude")?;
    let coordinate = Coordinate::new(latitude, longitude).ok_or_else(|| {
        SchemaViolation::new(
            "longitude",
            "longitude between -180 and 180",
            longitude.to_string(),
        )
    })?;

    let timezone = as_string(required(root, "", "timezone", "string")?, "timezone")?;
    let timezone_abbreviation = as_string(
        required(root, "", "timezone_abbreviation", "string")?,
        "timezone_abbreviation",
    )?;
    let utc_offset_seconds = as_i32(
        required(root, "", "utc_offset_seconds", "integer")?,
        "utc_offset_seconds",
    )?;
    let generationtime_ms = as_f64(
        required(root, "", "generationtime_ms", "number")?,
        "generationtime_ms",
    )?;

    Ok(WeatherResult::from_parts(WeatherParts {
        hourly,
        hourly_units,
        elevation,
        coordinate,
        timezone,
        timezone_abbreviation,
        utc_offset_seconds,
        generationtime_ms,
    }))
}

/// Decode `body` as JSON and validate it.
pub fn validate_str(body: &str) -> Result<WeatherResult> {
    let payload: Value = serde_json::from_str(body).map_err(|e| {
        SchemaViolation::new("$", "a JSON document", format!("invalid JSON ({e})"))
    })?;
    validate(&payload)
}

fn hourly_series(hourly: &Map<String, Value>) -> Result<HourlySeries> {
    let temps_path = join("hourly", TEMPERATURE_FIELD);
    let temps_value = required(hourly, "hourly", TEMPERATURE_FIELD, "array")?;
    let temperatures = as_array(temps_value, &temps_path)?
        .iter()
        .enumerate()
        .map(|(i, v)| as_f64(v, &index(&temps_path, i)))
        .collect::<Result<Vec<_>>>()?;

    let time_path = join("hourly", TIME_FIELD);
    let times_value = required(hourly, "hourly", TIME_FIELD, "array")?;
    let (timestamps, forms): (Vec<_>, Vec<_>) = as_array(times_value, &time_path)?
        .iter()
        .enumerate()
        .map(|(i, v)| as_timestamp(v, &index(&time_path, i)))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .unzip();

    if timestamps.len() != temperatures.len() {
        return Err(SchemaViolation::new(
            time_path,
            format!("{} entries to match {temps_path}", temperatures.len()),
            format!("{} entries", timestamps.len()),
        ));
    }

    for (i, pair) in timestamps.windows(2).enumerate() {
        if pair[1] <= pair[0] {
            let previous = pair[0].format(TIMESTAMP_FORMAT_SECONDS);
            return Err(SchemaViolation::new(
                index(&time_path, i + 1),
                format!("a timestamp after {previous}"),
                pair[1].format(TIMESTAMP_FORMAT_SECONDS).to_string(),
            ));
        }
    }

    Ok(HourlySeries::new(timestamps, forms, temperatures))
}

fn hourly_units(units: &Map<String, Value>) -> Result<HourlyUnits> {
    let temperature_2m = as_string(
        required(units, "hourly_units", TEMPERATURE_FIELD, "string")?,
        &join("hourly_units", TEMPERATURE_FIELD),
    )?;
    let time = as_string(
        required(units, "hourly_units", TIME_FIELD, "string")?,
        &join("hourly_units", TIME_FIELD),
    )?;
    Ok(HourlyUnits {
        temperature_2m,
        time,
    })
}

/// Every hourly column needs a unit label and every unit label needs a column.
fn check_unit_keys(hourly: &Map<String, Value>, units: &Map<String, Value>) -> Result<()> {
    let hourly_keys: BTreeSet<&String> = hourly.keys().collect();
    let unit_keys: BTreeSet<&String> = units.keys().collect();

    if let Some(key) = hourly_keys.difference(&unit_keys).next() {
        return Err(SchemaViolation::missing(join("hourly_units", key), "string"));
    }
    if let Some(key) = unit_keys.difference(&hourly_keys).next() {
        return Err(SchemaViolation::missing(join("hourly", key), "array"));
    }
    Ok(())
}

fn required<'a>(
    obj: &'a Map<String, Value>,
    parent: &str,
    key: &str,
    expected: &str,
) -> Result<&'a Value> {
    obj.get(key)
        .ok_or_else(|| SchemaViolation::missing(join(parent, key), expected))
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| SchemaViolation::new(path, "object", describe(value)))
}

fn as_array<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| SchemaViolation::new(path, "array", describe(value)))
}

fn as_string(value: &Value, path: &str) -> Result<String> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| SchemaViolation::new(path, "string", describe(value)))
}

fn as_f64(value: &Value, path: &str) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if (n.is_i64() || n.is_u64()) && f.abs() > MAX_EXACT_INTEGER => {
                return Err(SchemaViolation::new(
                    path,
                    "number representable as f64",
                    n.to_string(),
                ));
            }
            f => f,
        },
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(f) if f.is_finite() => Ok(f),
        _ => Err(SchemaViolation::new(path, "number", describe(value))),
    }
}

fn as_i32(value: &Value, path: &str) -> Result<i32> {
    let wide: Option<i64> = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    };

    let Some(wide) = wide else {
        return Err(SchemaViolation::new(path, "integer", describe(value)));
    };
    i32::try_from(wide)
        .map_err(|_| SchemaViolation::new(path, "integer in i32 range", wide.to_string()))
}

/// `Some` only when `f` is a whole number that fits in an i64.
fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Parses one hourly timestamp and remembers how it was written.
fn as_timestamp(value: &Value, path: &str) -> Result<(NaiveDateTime, TimestampForm)> {
    let parsed = match value {
        Value::String(s) => parse_text_timestamp(s),
        // `timeformat=unixtime` responses carry seconds since the epoch in UTC.
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| (dt.naive_utc(), TimestampForm::UnixSeconds)),
        _ => None,
    };

    parsed
        .ok_or_else(|| SchemaViolation::new(path, "ISO-8601 date-time", describe(value)))
}

fn parse_text_timestamp(text: &str) -> Option<(NaiveDateTime, TimestampForm)> {
    for (layout, form) in TIMESTAMP_LAYOUTS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(text, layout) {
            return Some((timestamp, *form));
        }
    }
    None
}

/// Short human description of a JSON value for error messages.
fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) if s.chars().count() > 40 => {
            let head: String = s.chars().take(40).collect();
            format!("string \"{head}...\"")
        }
        Value::String(s) => format!("string \"{s}\""),
        Value::Array(items) => format!("array of {} items", items.len()),
        Value::Object(_) => "object".to_string(),
    }
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn index(path: &str, i: usize) -> String {
    format!("{path}[{i}]")
}
