use std::{
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Select, Text};
use tempcast_core::{Config, Pipeline, TemperatureUnit, config::KNOWN_MODELS, schema};

use crate::{chart, output};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "tempcast", version, about = "Hourly temperature forecast charts")]
pub struct Cli {
    /// Print debug logs to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively configure forecast model, unit and timeout.
    Configure,

    /// Show the hourly temperature forecast for an address.
    Show {
        /// Address or "city, country". Prompted for when omitted.
        address: Option<String>,

        /// Where to write the SVG chart.
        #[arg(short, long, default_value = "forecast.svg")]
        output: PathBuf,

        /// Number of hours to list and chart.
        #[arg(long, default_value_t = 24, value_parser = clap::value_parser!(u16).range(1..))]
        hours: u16,

        /// Skip chart rendering.
        #[arg(long)]
        no_chart: bool,

        /// Print the validated forecast payload as JSON instead of a summary.
        #[arg(long)]
        json: bool,

        /// Override the configured temperature unit (celsius or fahrenheit).
        #[arg(long)]
        unit: Option<String>,

        /// Override the configured forecast model, e.g. "icon_seamless".
        #[arg(long)]
        model: Option<String>,
    },

    /// Validate a forecast payload read from FILE (or stdin).
    Validate {
        /// Payload file; stdin is read when omitted.
        file: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                address,
                output,
                hours,
                no_chart,
                json,
                unit,
                model,
            } => {
                let mut config = Config::load()?;
                if let Some(unit) = unit {
                    config.temperature_unit = TemperatureUnit::try_from(unit.as_str())?;
                }
                if let Some(model) = model {
                    config.model = model;
                }

                let address = match address {
                    Some(a) => a,
                    None => prompt_address()?,
                };

                let opts = ShowOptions {
                    output,
                    hours: usize::from(hours),
                    no_chart,
                    json,
                };
                show(&config, &address, &opts).await
            }
            Command::Validate { file } => validate(file.as_deref()),
        }
    }
}

struct ShowOptions {
    output: PathBuf,
    hours: usize,
    no_chart: bool,
    json: bool,
}

async fn show(config: &Config, address: &str, opts: &ShowOptions) -> Result<()> {
    let pipeline = Pipeline::from_config(config)?;
    let forecast = pipeline
        .run(address)
        .await
        .with_context(|| format!("Could not get a forecast for '{address}'"))?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&forecast.weather)?);
    } else {
        print!("{}", output::summary(&forecast, opts.hours));
    }

    if !opts.no_chart {
        let hourly = forecast.weather.hourly();
        let n = opts.hours.min(hourly.len());
        chart::render(
            &opts.output,
            &hourly.timestamps()[..n],
            &hourly.temperatures()[..n],
            address,
            forecast.weather.temperature_unit_label(),
        )
        .with_context(|| format!("Failed to render chart to {}", opts.output.display()))?;

        // Keep stdout clean for JSON consumers.
        if opts.json {
            eprintln!("Chart written to {}", opts.output.display());
        } else {
            println!("\nChart written to {}", opts.output.display());
        }
    }

    Ok(())
}

fn prompt_address() -> Result<String> {
    let address = Text::new("Please enter your location (address or city, country):")
        .with_placeholder("e.g. London, England")
        .with_validator(inquire::required!("Please enter a location"))
        .prompt()
        .context("No address entered")?;

    Ok(address.trim().to_string())
}

fn validate(file: Option<&Path>) -> Result<()> {
    let (source, body) = match file {
        Some(path) => (
            path.display().to_string(),
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            ("<stdin>".to_string(), buf)
        }
    };

    let result = schema::validate_str(&body)
        .with_context(|| format!("Forecast payload from {source} is invalid"))?;

    print!("{}", output::validation_report(&source, &result));
    Ok(())
}

fn configure() -> Result<()> {
    let path = Config::config_file_path()?;
    let mut config = Config::load()?;

    let cursor = KNOWN_MODELS
        .iter()
        .position(|m| *m == config.model)
        .unwrap_or(0);
    config.model = Select::new("Forecast model:", KNOWN_MODELS.to_vec())
        .with_starting_cursor(cursor)
        .prompt()
        .context("Model selection aborted")?
        .to_string();

    let units = TemperatureUnit::all().to_vec();
    let cursor = units
        .iter()
        .position(|u| *u == config.temperature_unit)
        .unwrap_or(0);
    config.temperature_unit = Select::new("Temperature unit:", units)
        .with_starting_cursor(cursor)
        .prompt()
        .context("Unit selection aborted")?;

    config.timeout_secs = CustomType::<u64>::new("Network timeout (seconds):")
        .with_default(config.timeout_secs)
        .with_error_message("Please enter a whole number of seconds")
        .prompt()
        .context("Timeout entry aborted")?;

    config.validate()?;
    config.save()?;

    println!("Configuration saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("tempcast").chain(args.iter().copied()))
    }

    #[test]
    fn show_defaults() {
        let cli = parse(&["show", "Paris, France"]).unwrap();

        match cli.command {
            Command::Show {
                address,
                output,
                hours,
                no_chart,
                json,
                unit,
                model,
            } => {
                assert_eq!(address.as_deref(), Some("Paris, France"));
                assert_eq!(output, PathBuf::from("forecast.svg"));
                assert_eq!(hours, 24);
                assert!(!no_chart);
                assert!(!json);
                assert!(unit.is_none());
                assert!(model.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn show_without_address_parses() {
        let cli = parse(&["-v", "show", "--no-chart"]).unwrap();
        assert!(cli.verbose);

        match cli.command {
            Command::Show {
                address: None,
                no_chart: true,
                ..
            } => {}
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn zero_hours_is_rejected() {
        assert!(parse(&["show", "Paris", "--hours", "0"]).is_err());
    }

    #[test]
    fn validate_reads_payload_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.json");
        let body = serde_json::json!({
            "hourly": {"temperature_2m": [1.0], "time": ["2024-01-01T00:00"]},
            "hourly_units": {"temperature_2m": "°C", "time": "iso8601"},
            "elevation": 1.0,
            "latitude": 0.0,
            "longitude": 0.0,
            "timezone": "GMT",
            "timezone_abbreviation": "GMT",
            "utc_offset_seconds": 0,
            "generationtime_ms": 0.1
        })
        .to_string();
        std::fs::write(&path, body).unwrap();

        assert!(validate(Some(&path)).is_ok());
    }

    #[test]
    fn validate_reports_schema_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.json");
        let body = r#"{"hourly": "not a dict"}"#;
        std::fs::write(&path, body).unwrap();

        let err = validate(Some(&path)).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("is invalid"));
        assert!(msg.contains("`hourly`"));
    }
}
