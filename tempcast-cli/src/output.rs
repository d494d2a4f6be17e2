use tempcast_core::{Forecast, WeatherResult};

const TIME_LAYOUT: &str = "%Y-%m-%d %H:%M";

/// Human-readable forecast summary followed by the first `hours` readings.
pub fn summary(forecast: &Forecast, hours: usize) -> String {
    let weather = &forecast.weather;
    let unit = weather.temperature_unit_label();
    let hourly = weather.hourly();

    let current = hourly
        .temperatures()
        .first()
        .map(|t| format!("{t}{unit}"))
        .unwrap_or_else(|| "N/A".to_string());
    let timezone = format!(
        "{} ({}, {})",
        weather.timezone(),
        weather.timezone_abbreviation(),
        utc_offset(weather.utc_offset_seconds())
    );
    let shown = hours.min(hourly.len());

    let mut lines = vec![
        format!("Weather for: {}", forecast.address),
        format!("Coordinates: {}", forecast.coordinate),
        format!("Current Temperature: {current}"),
        format!("Timezone: {timezone}"),
        format!("Elevation: {}m", weather.elevation()),
        String::new(),
        format!("Temperature Forecast (next {shown} hours):"),
    ];
    for (time, temp) in hourly.iter().take(shown) {
        lines.push(format!("{}: {temp}{unit}", time.format(TIME_LAYOUT)));
    }

    lines.push(String::new());
    lines.join("\n")
}

/// Short report for a payload that passed validation.
pub fn validation_report(source: &str, weather: &WeatherResult) -> String {
    let hourly = weather.hourly();
    let unit = weather.temperature_unit_label();

    let mut lines = vec![
        format!("{source}: valid forecast payload"),
        format!("  - {} hourly readings ({unit})", hourly.len()),
        format!("  - Location: {}", weather.coordinate()),
        format!("  - Timezone: {}", weather.timezone()),
    ];
    let timestamps = hourly.timestamps();
    if let (Some(first), Some(last)) = (timestamps.first(), timestamps.last()) {
        let (first, last) = (first.format(TIME_LAYOUT), last.format(TIME_LAYOUT));
        lines.push(format!("  - Range: {first} .. {last}"));
    }

    lines.push(String::new());
    lines.join("\n")
}

/// Formats an offset in seconds as `UTC+HH:MM`.
fn utc_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let abs = seconds.unsigned_abs();
    format!("UTC{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60)
}
