use anyhow::{Context, Result};
use reqwest::blocking::{Client as HttpClient, Request};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;

use crate::config::load_config;
use crate::request::{EndpointCall, Location, TimeBound, TimeWindow, UnitSystem};
use crate::response::ClimacellResponse;
use crate::util::{redact_key, urljoin};

pub const DEFAULT_BASE_URL: &str = "https://api.climacell.co/v3";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base API URL, typically `https://api.climacell.co/v3`.
    pub url: String,
    /// API key, sent as the `apikey` query parameter.
    pub key: String,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

/// Blocking ClimaCell client. Each endpoint method issues exactly one GET.
///
/// Unit systems default to [`UnitSystem::Si`] on every endpoint when callers
/// pass `UnitSystem::default()`.
#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    key: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    /// Creates a client for the default base URL.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        Self::from_config(ClientConfig {
            url: DEFAULT_BASE_URL.to_string(),
            key: key.into(),
            verify: true,
        })
    }

    /// Creates a client from `CLIMACELL_URL` / `CLIMACELL_KEY` and/or
    /// `.climacellrc`.
    ///
    /// The rc file is an optional convenience; [`Client::new`] with a key
    /// string needs no file or environment at all.
    pub fn from_env() -> Result<Self> {
        Self::from_config(load_config(None, None, None)?)
    }

    pub fn from_config(cfg: ClientConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("climacell-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("climacell-rs")),
        );

        let mut builder = HttpClient::builder().default_headers(default_headers);
        if !cfg.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            url: cfg.url,
            key: cfg.key,
            timeout: Duration::from_secs(60),
            http,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Up-to-the-minute observations for a location.
    pub fn realtime<S: AsRef<str>>(
        &self,
        location: Location,
        fields: &[S],
        units: UnitSystem,
    ) -> Result<ClimacellResponse> {
        self.send(&EndpointCall::realtime(location, fields, units))
    }

    /// Minute-by-minute forecast, up to 360 minutes ahead. `timestep` is in
    /// minutes. `end_time` is not sent when the window has no end.
    pub fn nowcast<S: AsRef<str>>(
        &self,
        location: Location,
        timestep: u32,
        fields: &[S],
        window: TimeWindow,
        units: UnitSystem,
    ) -> Result<ClimacellResponse> {
        self.send(&EndpointCall::nowcast(location, timestep, fields, window, units))
    }

    /// Hourly forecast, up to 96 hours ahead.
    pub fn forecast_hourly<S: AsRef<str>>(
        &self,
        location: Location,
        fields: &[S],
        window: TimeWindow,
        units: UnitSystem,
    ) -> Result<ClimacellResponse> {
        self.send(&EndpointCall::forecast_hourly(location, fields, window, units))
    }

    /// Daily forecast, up to 15 days ahead. Decodes to daily observations.
    pub fn forecast_daily<S: AsRef<str>>(
        &self,
        location: Location,
        fields: &[S],
        window: TimeWindow,
        units: UnitSystem,
    ) -> Result<ClimacellResponse> {
        self.send(&EndpointCall::forecast_daily(location, fields, window, units))
    }

    /// Historical ClimaCell model data, up to 6 hours back. `end` defaults to
    /// `now`.
    pub fn historical_climacell<S: AsRef<str>>(
        &self,
        location: Location,
        fields: &[S],
        timestep: u32,
        start: impl Into<TimeBound>,
        end: Option<TimeBound>,
        units: UnitSystem,
    ) -> Result<ClimacellResponse> {
        self.send(&EndpointCall::historical_climacell(
            location, fields, timestep, start, end, units,
        ))
    }

    /// Historical weather-station data, up to 4 weeks back. `end` defaults
    /// to `now`.
    pub fn historical_station<S: AsRef<str>>(
        &self,
        location: Location,
        fields: &[S],
        start: impl Into<TimeBound>,
        end: Option<TimeBound>,
        units: UnitSystem,
    ) -> Result<ClimacellResponse> {
        self.send(&EndpointCall::historical_station(
            location, fields, start, end, units,
        ))
    }

    pub fn insights_fire_index(&self, location: Location) -> Result<ClimacellResponse> {
        self.send(&EndpointCall::fire_index(location))
    }

    /// Sends a prepared call. Non-200 responses are returned, not raised.
    pub fn send(&self, call: &EndpointCall) -> Result<ClimacellResponse> {
        let request = self.build_request(call)?;
        let shown = redact_key(request.url().as_str());
        log::debug!("GET {}", shown);

        let resp = self
            .http
            .execute(request)
            // reqwest errors carry the full URL, API key included.
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("request to {} failed", shown))?;

        let status = resp.status();
        let url = resp.url().to_string();
        let headers = resp.headers().clone();
        let body = resp
            .text()
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("failed to read response body from {}", shown))?;

        if status.is_success() {
            log::debug!("{} -> HTTP {}", shown, status);
        } else {
            log::warn!("{} -> HTTP {}", shown, status);
        }

        Ok(
            ClimacellResponse::from_parts(status, body, call.fields(), call.endpoint().shape())
                .with_transport(url, headers),
        )
    }

    fn build_request(&self, call: &EndpointCall) -> Result<Request> {
        let url = urljoin(&self.url, call.endpoint().path());
        self.http
            .get(&url)
            .query(call.params())
            .query(&[("apikey", self.key.as_str())])
            .timeout(self.timeout)
            .build()
            .with_context(|| format!("failed to build request for {}", url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn query(request: &Request) -> Vec<(String, String)> {
        request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn realtime_request_carries_fields_units_and_key() {
        let client = Client::new("KEY").unwrap();
        let call = EndpointCall::realtime(
            Location::new(12.0, 13.0),
            &["wind_gust", "temp"],
            UnitSystem::Us,
        );
        let req = client.build_request(&call).unwrap();

        assert_eq!(req.url().path(), "/v3/weather/realtime");
        let q = query(&req);
        assert!(q.contains(&("fields".into(), "wind_gust,temp".into())));
        assert!(q.contains(&("unit_system".into(), "us".into())));
        assert!(q.contains(&("lat".into(), "12".into())));
        assert_eq!(q.last(), Some(&("apikey".into(), "KEY".into())));
    }

    #[test]
    fn nowcast_request_without_end_has_no_end_time() {
        let client = Client::new("KEY")
            .unwrap()
            .with_base_url("http://localhost:9999/v3/");
        let call = EndpointCall::nowcast(
            Location::new(40.0, 80.0),
            30,
            &["wind_gust"],
            TimeWindow::from_now(),
            UnitSystem::Si,
        );
        let req = client.build_request(&call).unwrap();

        assert_eq!(req.url().host_str(), Some("localhost"));
        assert_eq!(req.url().path(), "/v3/weather/nowcast");
        let q = query(&req);
        assert!(q.iter().all(|(k, _)| k != "end_time"));
        assert!(q.contains(&("start_time".into(), "now".into())));
    }

    #[test]
    fn window_end_is_encoded() {
        let client = Client::new("KEY").unwrap();
        let start = Utc.with_ymd_and_hms(2020, 6, 22, 23, 0, 0).unwrap();
        let call = EndpointCall::nowcast(
            Location::new(40.0, 80.0),
            30,
            &["wind_gust"],
            TimeWindow::between(start, TimeBound::from(start + chrono::Duration::minutes(60))),
            UnitSystem::Si,
        );
        let q = query(&client.build_request(&call).unwrap());
        assert!(q.contains(&("end_time".into(), "2020-06-23T00:00:00Z".into())));
    }

    #[test]
    fn transport_error_does_not_expose_key() {
        let client = Client::new("SUPERSECRET")
            .unwrap()
            .with_base_url("http://127.0.0.1:9")
            .with_timeout(Duration::from_secs(5));
        let err = client
            .realtime(Location::new(12.0, 13.0), &["temp"], UnitSystem::Si)
            .unwrap_err();

        let shown = format!("{:#} {:?}", err, err);
        assert!(!shown.contains("SUPERSECRET"), "{}", shown);
        assert!(shown.contains("apikey=***"));
    }

    #[test]
    fn historical_request_sends_start_and_end() {
        let client = Client::new("KEY").unwrap();
        let start = Utc.with_ymd_and_hms(2020, 6, 22, 18, 0, 0).unwrap();
        let call = EndpointCall::historical_climacell(
            Location::new(40.0, 80.0),
            &["temp"],
            5,
            start,
            None,
            UnitSystem::Si,
        );
        let q = query(&client.build_request(&call).unwrap());
        assert!(q.contains(&("start_time".into(), "2020-06-22T18:00:00Z".into())));
        assert!(q.contains(&("end_time".into(), "now".into())));
        assert!(q.contains(&("timestep".into(), "5".into())));
    }

    #[test]
    fn fire_index_request_has_no_fields_or_units() {
        let client = Client::new("KEY").unwrap();
        let req = client
            .build_request(&EndpointCall::fire_index(Location::new(1.0, 2.0)))
            .unwrap();
        let keys: Vec<String> = query(&req).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["lat", "lon", "apikey"]);
        assert_eq!(req.timeout(), Some(&Duration::from_secs(60)));
    }
}
