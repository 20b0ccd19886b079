//! HTTP fetcher for `GET {base}?lat=..&lng=..&date=YYYY-MM-DD`.
//!
//! Expected body:
//! `{"status": "OK", "results": {"sunrise": "6:42:13 AM", "sunset": "8:01:55 PM", ...}}`

use super::{SunTimesFetcher, Unavailable};
use crate::model::location::Location;
use crate::model::sun_times::{format_iso_date, ClockTime, SunTimes};
use chrono::NaiveDate;
use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

/// Public endpoint used by the reference deployment.
pub const DEFAULT_API_BASE_URL: &str = "https://api.sunrisesunset.io/json";
const STATUS_OK: &str = "OK";

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    status: Option<String>,
    // Error responses carry `""` here, so decode only after the status check.
    results: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ApiResults {
    sunrise: Option<String>,
    sunset: Option<String>,
}

/// Blocking HTTP implementation of [`SunTimesFetcher`].
pub struct HttpSunTimesFetcher {
    client: Client,
    base_url: String,
}

impl HttpSunTimesFetcher {
    /// Builds a fetcher with a per-request timeout.
    ///
    /// # Errors
    /// - Returns the client builder error when TLS/backend setup fails.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("suntrack/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn request_body(&self, location: Location, date: NaiveDate) -> Result<String, Unavailable> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", location.latitude.to_string()),
                ("lng", location.longitude.to_string()),
                ("date", format_iso_date(date)),
            ])
            .send()
            .map_err(|err| Unavailable::new(format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Unavailable::new(format!("http status {}", status.as_u16())));
        }

        response
            .text()
            .map_err(|err| Unavailable::new(format!("body read failed: {err}")))
    }
}

impl SunTimesFetcher for HttpSunTimesFetcher {
    fn fetch(&self, location: Location, date: NaiveDate) -> Result<SunTimes, Unavailable> {
        debug!(
            "event=fetch_request module=fetch status=start date={}",
            format_iso_date(date)
        );
        let body = self.request_body(location, date)?;
        parse_payload(&body)
    }
}

/// Extracts sun times from a response body.
///
/// # Errors
/// - `Unavailable` for malformed JSON, a status other than `OK`, or missing
///   or unparsable `results.sunrise` / `results.sunset`.
pub fn parse_payload(body: &str) -> Result<SunTimes, Unavailable> {
    let envelope: ApiEnvelope = serde_json::from_str(body)
        .map_err(|err| Unavailable::new(format!("malformed payload: {err}")))?;

    match envelope.status.as_deref() {
        Some(STATUS_OK) => {}
        Some(other) => return Err(Unavailable::new(format!("service status `{other}`"))),
        None => return Err(Unavailable::new("service status missing")),
    }

    let results = envelope
        .results
        .ok_or_else(|| Unavailable::new("results missing"))?;
    let results: ApiResults = serde_json::from_value(results)
        .map_err(|err| Unavailable::new(format!("malformed results: {err}")))?;
    let sunrise = parse_field(results.sunrise.as_deref(), "sunrise")?;
    let sunset = parse_field(results.sunset.as_deref(), "sunset")?;

    Ok(SunTimes::new(sunrise, sunset))
}

fn parse_field(value: Option<&str>, name: &str) -> Result<ClockTime, Unavailable> {
    let value = value.ok_or_else(|| Unavailable::new(format!("{name} missing")))?;
    ClockTime::parse_12h(value).map_err(|err| Unavailable::new(format!("{name}: {err}")))
}
