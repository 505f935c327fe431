//! GSOD observation dataset acquisition
//!
//! Downloads global-summary-of-the-day CSV files for a set of stations and
//! years, labels every station-day, keeps the trainable rows and caches the
//! processed sample so later runs skip the network entirely.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use csv::StringRecord;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use tracing::{debug, info, instrument, warn};

use crate::PredictorError;
use crate::cache::PersistentCache;
use crate::config::DatasetConfig;
use crate::models::{ObservationRecord, TrainingRow, WeatherIndicatorCode};
use crate::weather::{estimate_humidity, fahrenheit_to_celsius, label, retain_trainable};

/// Past-year station files never change once published
const STATION_FILE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);
const PROCESSED_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

// GSOD missing-value sentinels
const MISSING_TEMPERATURE: f64 = 9999.9;
const MISSING_PRESSURE: f64 = 9999.9;
const MISSING_WIND: f64 = 999.9;
const MISSING_PRECIPITATION: f64 = 99.99;

/// Column positions of the fields we read from a station file
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    temperature: usize,
    dew_point: usize,
    sea_level_pressure: usize,
    wind_speed: usize,
    precipitation: usize,
    indicators: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| PredictorError::dataset(format!("Station file has no '{name}' column")))
        };
        Ok(Self {
            temperature: find("TEMP")?,
            dew_point: find("DEWP")?,
            sea_level_pressure: find("SLP")?,
            wind_speed: find("WDSP")?,
            precipitation: find("PRCP")?,
            indicators: find("FRSHTT")?,
        })
    }
}

/// Parse one GSOD station CSV into Celsius observations.
///
/// Rows with an empty, unparsable or sentinel value in any numeric column
/// are dropped. An empty `FRSHTT` cell is kept as an absent code.
pub fn parse_station_csv(text: &str) -> Result<Vec<ObservationRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers().context("Station file has no header row")?.clone();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut observations = Vec::new();
    let mut dropped = 0usize;
    for record in reader.records() {
        let record = record.context("Malformed station file row")?;
        match observation_from_record(&record, columns) {
            Some(observation) => observations.push(observation),
            None => dropped += 1,
        }
    }

    debug!(kept = observations.len(), dropped, "Parsed station file");
    Ok(observations)
}

fn observation_from_record(record: &StringRecord, columns: ColumnIndex) -> Option<ObservationRecord> {
    let number = |index: usize, sentinel: f64| -> Option<f64> {
        let value: f64 = record.get(index)?.parse().ok()?;
        ((value - sentinel).abs() > 1e-6 && value.is_finite()).then_some(value)
    };

    let indicators = record
        .get(columns.indicators)
        .filter(|cell| !cell.is_empty())
        .map(WeatherIndicatorCode::from_csv_cell);

    Some(ObservationRecord {
        temperature: fahrenheit_to_celsius(number(columns.temperature, MISSING_TEMPERATURE)?),
        dew_point: fahrenheit_to_celsius(number(columns.dew_point, MISSING_TEMPERATURE)?),
        sea_level_pressure: number(columns.sea_level_pressure, MISSING_PRESSURE)?,
        wind_speed: number(columns.wind_speed, MISSING_WIND)?,
        precipitation: number(columns.precipitation, MISSING_PRECIPITATION)?,
        indicators,
    })
}

/// Label observations, drop the untrainable ones and derive humidity
pub fn build_training_rows(observations: &[ObservationRecord]) -> Vec<TrainingRow> {
    let mut rows: Vec<TrainingRow> = observations
        .iter()
        .map(|obs| TrainingRow {
            temperature: obs.temperature,
            humidity: estimate_humidity(obs.temperature, obs.dew_point),
            pressure: obs.sea_level_pressure,
            wind_speed: obs.wind_speed,
            precipitation: obs.precipitation,
            weather_type: label(obs.indicators.as_ref(), obs.precipitation, obs.temperature),
        })
        .collect();

    let dropped = retain_trainable(&mut rows);
    if dropped > 0 {
        debug!(dropped, "Dropped rows labelled Unknown, Severe or Hail");
    }
    rows
}

/// Keep at most `sample_size` rows, chosen by a seeded shuffle
pub fn sample_rows(mut rows: Vec<TrainingRow>, sample_size: usize, seed: u64) -> Vec<TrainingRow> {
    if rows.len() > sample_size {
        rows.shuffle(&mut StdRng::seed_from_u64(seed));
        rows.truncate(sample_size);
    }
    rows
}

/// The `count` full calendar years preceding `current_year`, oldest first
#[must_use]
pub fn years_window(current_year: i32, count: u32) -> Vec<i32> {
    let count = i32::try_from(count).unwrap_or(i32::MAX);
    (current_year.saturating_sub(count)..current_year).collect()
}

/// [`years_window`] anchored on the local calendar year, the same clock the
/// forecast uses for weekday names
#[must_use]
pub fn current_years(count: u32) -> Vec<i32> {
    years_window(Local::now().year(), count)
}

#[must_use]
pub fn station_url(base_url: &str, year: i32, station: &str) -> String {
    format!("{}/{year}/{station}.csv", base_url.trim_end_matches('/'))
}

/// GSOD downloader backed by the persistent cache
pub struct GsodDatasetLoader {
    client: ClientWithMiddleware,
    cache: PersistentCache,
    config: DatasetConfig,
    seed: u64,
}

impl GsodDatasetLoader {
    /// Create a loader with a retrying HTTP client
    pub fn new(config: DatasetConfig, seed: u64, cache: PersistentCache) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("weather-predictor/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            cache,
            config,
            seed,
        })
    }

    /// Load the processed training rows, downloading station files as needed
    #[instrument(skip(self), fields(stations = self.config.stations.len(), years = self.config.years))]
    pub async fn load(&self) -> Result<Vec<TrainingRow>> {
        let years = current_years(self.config.years);
        let key = self.processed_key(&years);

        if let Some(rows) = self.cache.get::<Vec<TrainingRow>>(&key).await? {
            info!(rows = rows.len(), "Loaded processed dataset from cache");
            return Ok(rows);
        }

        let mut observations = Vec::new();
        let mut files = 0usize;
        for station in &self.config.stations {
            for &year in &years {
                let text = match self.station_file(year, station).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Failed to download {station} data for {year}: {e:#}");
                        continue;
                    }
                };
                match parse_station_csv(&text) {
                    Ok(parsed) => {
                        files += 1;
                        observations.extend(parsed);
                    }
                    Err(e) => warn!("Error processing {station}-{year}: {e:#}"),
                }
            }
        }

        if files == 0 {
            return Err(PredictorError::dataset("Failed to download any weather data").into());
        }

        let rows = build_training_rows(&observations);
        info!(
            files,
            observations = observations.len(),
            labelled = rows.len(),
            "Processed station files"
        );
        let rows = sample_rows(rows, self.config.sample_size, self.seed);

        self.cache.put(&key, rows.clone(), PROCESSED_TTL).await?;
        info!(rows = rows.len(), "Processed dataset cached");
        Ok(rows)
    }

    async fn station_file(&self, year: i32, station: &str) -> Result<String> {
        let key = format!("gsod:{station}:{year}");
        if let Some(text) = self.cache.get::<String>(&key).await? {
            return Ok(text);
        }

        let url = station_url(&self.config.base_url, year, station);
        info!("Downloading {station} data for {year}");
        let text = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?
            .error_for_status()?
            .text()
            .await?;

        self.cache.put(&key, text.clone(), STATION_FILE_TTL).await?;
        Ok(text)
    }

    fn processed_key(&self, years: &[i32]) -> String {
        format!(
            "dataset:{}:{}:{}:{}",
            self.config.stations.join(","),
            years.iter().map(ToString::to_string).collect::<Vec<_>>().join(","),
            self.config.sample_size,
            self.seed
        )
    }
}
