use crate::error::SourceError;
use crate::signals::{FetchOutcome, Reading, SignalType};
use crate::sources::SignalSource;
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Real-time solar wind plasma, rows of `[time, density, speed, temperature]`
pub const SOLAR_WIND_URL: &str =
    "https://services.swpc.noaa.gov/products/solar-wind/plasma-7-day.json";

/// GOES integral proton flux, one object per energy band and time step
pub const RADIATION_URL: &str =
    "https://services.swpc.noaa.gov/json/goes/primary/integral-protons-1-day.json";

/// Planetary K-index, rows of `[time, Kp, a_running, station_count]`
pub const PLANETARY_INDEX_URL: &str =
    "https://services.swpc.noaa.gov/products/noaa-planetary-k-index.json";

/// Energy band reported as the radiation signal
const PROTON_ENERGY_BAND: &str = ">=10 MeV";

/// Source backed by one NOAA SWPC JSON product
///
/// Fetches the product, extracts the most recent value for its signal and
/// rounds it to the precision the feed is meaningful at.
pub struct NoaaSource {
    client: Client,
    signal: SignalType,
    url: String,
}

impl NoaaSource {
    /// Create a source for `signal` reading from `url`
    ///
    /// # Arguments
    /// * `signal` - Signal the product at `url` carries
    /// * `url` - Product URL
    /// * `timeout` - Per-request timeout
    pub fn new(signal: SignalType, url: String, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                SourceError::RequestFailed(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            signal,
            url,
        })
    }

    /// Source for a signal at its public NOAA URL
    pub fn with_default_url(signal: SignalType, timeout: Duration) -> Result<Self, SourceError> {
        Self::new(signal, Self::default_url(signal).to_string(), timeout)
    }

    pub fn default_url(signal: SignalType) -> &'static str {
        match signal {
            SignalType::SolarWind => SOLAR_WIND_URL,
            SignalType::Radiation => RADIATION_URL,
            SignalType::PlanetaryIndex => PLANETARY_INDEX_URL,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_value(&self) -> Result<f64, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SourceError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::BadStatus(response.status().as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SourceError::ParseError(e.to_string()))?;

        extract_value(self.signal, &body)
    }
}

impl SignalSource for NoaaSource {
    fn signal(&self) -> SignalType {
        self.signal
    }

    fn fetch<'a>(&'a self) -> Pin<Box<dyn Future<Output = FetchOutcome> + Send + 'a>> {
        Box::pin(async move {
            match self.fetch_value().await {
                Ok(value) => {
                    debug!("{} fetched from {}: {}", self.signal, self.url, value);
                    FetchOutcome::Data(Reading::new(self.signal, value, self.signal.unit()))
                }
                Err(e) => {
                    warn!("{} fetch failed: {}", self.signal, e);
                    FetchOutcome::NoData
                }
            }
        })
    }
}

/// Extract the latest value of `signal` from its NOAA product body
pub fn extract_value(signal: SignalType, body: &Value) -> Result<f64, SourceError> {
    match signal {
        SignalType::SolarWind => extract_solar_wind(body),
        SignalType::Radiation => extract_radiation(body),
        SignalType::PlanetaryIndex => extract_planetary_index(body),
    }
}

fn rows(body: &Value) -> Result<&Vec<Value>, SourceError> {
    body.as_array()
        .ok_or_else(|| SourceError::ParseError("expected a JSON array".to_string()))
}

/// Numbers arrive either as JSON numbers or as strings; null and "" are missing
fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn extract_solar_wind(body: &Value) -> Result<f64, SourceError> {
    let latest = rows(body)?.last().ok_or(SourceError::Empty)?;
    let speed = latest.get(2).and_then(as_number).ok_or(SourceError::Empty)?;

    if speed <= 0.0 {
        return Err(SourceError::Empty);
    }
    Ok(round_to(speed, 1))
}

fn extract_radiation(body: &Value) -> Result<f64, SourceError> {
    let entries = rows(body)?;

    // Prefer the >=10 MeV band; older feeds carry a single band without a label
    let latest = entries
        .iter()
        .rev()
        .find(|entry| entry.get("energy").and_then(Value::as_str) == Some(PROTON_ENERGY_BAND))
        .or_else(|| {
            entries
                .last()
                .filter(|entry| entry.get("energy").is_none())
        })
        .ok_or(SourceError::Empty)?;

    let flux = latest.get("flux").and_then(as_number).ok_or(SourceError::Empty)?;
    if flux <= 0.0 {
        return Err(SourceError::Empty);
    }
    Ok(round_to(flux, 4))
}

fn extract_planetary_index(body: &Value) -> Result<f64, SourceError> {
    let latest = rows(body)?.last().ok_or(SourceError::Empty)?;

    let kp = match latest {
        Value::Array(columns) => columns.get(1).and_then(as_number),
        Value::Object(fields) => ["Kp", "kp_index", "kp"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(as_number)),
        _ => None,
    }
    .ok_or(SourceError::Empty)?;

    Ok(round_to(kp, 2))
}
