use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};

use crate::data::Shape;

/// A point on the globe, in decimal degrees.
///
/// Coordinates are not range-checked locally; the API rejects out-of-range
/// values with a `BadRequest` error payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<(f64, f64)> for Location {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

/// Unit system of the returned measurements.
///
/// The default is [`UnitSystem::Si`] for every endpoint, realtime included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnitSystem {
    /// Metric units (`si`).
    #[default]
    Si,
    /// US customary units (`us`).
    Us,
}

impl UnitSystem {
    pub fn as_str(self) -> &'static str {
        match self {
            UnitSystem::Si => "si",
            UnitSystem::Us => "us",
        }
    }
}

/// One end of a request time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeBound {
    /// The literal `now`, resolved by the API.
    #[default]
    Now,
    At(DateTime<FixedOffset>),
}

impl TimeBound {
    pub(crate) fn to_param(self) -> String {
        match self {
            TimeBound::Now => "now".to_string(),
            TimeBound::At(t) => t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

impl From<DateTime<Utc>> for TimeBound {
    fn from(t: DateTime<Utc>) -> Self {
        TimeBound::At(t.fixed_offset())
    }
}

impl From<DateTime<FixedOffset>> for TimeBound {
    fn from(t: DateTime<FixedOffset>) -> Self {
        TimeBound::At(t)
    }
}

/// Start and optional end of a time-series request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: TimeBound,
    pub end: Option<TimeBound>,
}

impl TimeWindow {
    /// Starts now, lets the API pick the end.
    pub fn from_now() -> Self {
        Self::default()
    }

    pub fn starting(start: impl Into<TimeBound>) -> Self {
        Self {
            start: start.into(),
            end: None,
        }
    }

    pub fn between(start: impl Into<TimeBound>, end: impl Into<TimeBound>) -> Self {
        Self {
            start: start.into(),
            end: Some(end.into()),
        }
    }
}

/// The endpoint families exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Realtime,
    Nowcast,
    ForecastHourly,
    ForecastDaily,
    HistoricalClimacell,
    HistoricalStation,
    FireIndex,
}

impl Endpoint {
    /// Path suffix appended to the base URL.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Realtime => "/weather/realtime",
            Endpoint::Nowcast => "/weather/nowcast",
            Endpoint::ForecastHourly => "/weather/forecast/hourly",
            Endpoint::ForecastDaily => "/weather/forecast/daily",
            Endpoint::HistoricalClimacell => "/weather/historical/climacell",
            Endpoint::HistoricalStation => "/weather/historical/station",
            Endpoint::FireIndex => "/insights/fire-index",
        }
    }

    /// How a successful response body of this endpoint is laid out.
    pub fn shape(self) -> Shape {
        match self {
            Endpoint::Realtime => Shape::Realtime,
            Endpoint::ForecastDaily => Shape::DailySeries,
            Endpoint::FireIndex => Shape::FireIndex,
            Endpoint::Nowcast
            | Endpoint::ForecastHourly
            | Endpoint::HistoricalClimacell
            | Endpoint::HistoricalStation => Shape::Series,
        }
    }
}

/// A single, fully marshaled API call: endpoint plus its query parameters.
///
/// The API key is not part of the call; [`crate::Client`] appends it when
/// sending.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointCall {
    endpoint: Endpoint,
    fields: Vec<String>,
    params: Vec<(&'static str, String)>,
}

impl EndpointCall {
    pub fn realtime<S: AsRef<str>>(location: Location, fields: &[S], units: UnitSystem) -> Self {
        Self::with_fields(Endpoint::Realtime, location, fields, units)
    }

    /// Minute-by-minute forecast. The API caps the window at 360 minutes.
    pub fn nowcast<S: AsRef<str>>(
        location: Location,
        timestep: u32,
        fields: &[S],
        window: TimeWindow,
        units: UnitSystem,
    ) -> Self {
        let mut call = Self::with_fields(Endpoint::Nowcast, location, fields, units);
        call.push("timestep", timestep.to_string());
        call.push_forecast_window(window);
        call
    }

    pub fn forecast_hourly<S: AsRef<str>>(
        location: Location,
        fields: &[S],
        window: TimeWindow,
        units: UnitSystem,
    ) -> Self {
        let mut call = Self::with_fields(Endpoint::ForecastHourly, location, fields, units);
        call.push_forecast_window(window);
        call
    }

    pub fn forecast_daily<S: AsRef<str>>(
        location: Location,
        fields: &[S],
        window: TimeWindow,
        units: UnitSystem,
    ) -> Self {
        let mut call = Self::with_fields(Endpoint::ForecastDaily, location, fields, units);
        call.push_forecast_window(window);
        call
    }

    /// Historical model data. `start` is required; a missing `end` is sent
    /// as `now`.
    pub fn historical_climacell<S: AsRef<str>>(
        location: Location,
        fields: &[S],
        timestep: u32,
        start: impl Into<TimeBound>,
        end: Option<TimeBound>,
        units: UnitSystem,
    ) -> Self {
        let mut call = Self::with_fields(Endpoint::HistoricalClimacell, location, fields, units);
        call.push("timestep", timestep.to_string());
        call.push_historical_window(start.into(), end);
        call
    }

    /// Historical station data. `start` is required; a missing `end` is sent
    /// as `now`.
    pub fn historical_station<S: AsRef<str>>(
        location: Location,
        fields: &[S],
        start: impl Into<TimeBound>,
        end: Option<TimeBound>,
        units: UnitSystem,
    ) -> Self {
        let mut call = Self::with_fields(Endpoint::HistoricalStation, location, fields, units);
        call.push_historical_window(start.into(), end);
        call
    }

    pub fn fire_index(location: Location) -> Self {
        let mut call = Self {
            endpoint: Endpoint::FireIndex,
            fields: Vec::new(),
            params: Vec::new(),
        };
        call.push_location(location);
        call
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Requested field names, in request order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Query parameters in the order they are sent, without `apikey`.
    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    fn with_fields<S: AsRef<str>>(
        endpoint: Endpoint,
        location: Location,
        fields: &[S],
        units: UnitSystem,
    ) -> Self {
        let fields: Vec<String> = fields.iter().map(|f| f.as_ref().to_string()).collect();
        let joined = fields.join(",");
        let mut call = Self {
            endpoint,
            fields,
            params: Vec::new(),
        };
        call.push_location(location);
        call.push("unit_system", units.as_str().to_string());
        call.push("fields", joined);
        call
    }

    fn push(&mut self, name: &'static str, value: String) {
        self.params.push((name, value));
    }

    fn push_location(&mut self, location: Location) {
        self.push("lat", location.lat.to_string());
        self.push("lon", location.lon.to_string());
    }

    fn push_forecast_window(&mut self, window: TimeWindow) {
        self.push("start_time", window.start.to_param());
        if let Some(end) = window.end {
            self.push("end_time", end.to_param());
        }
    }

    fn push_historical_window(&mut self, start: TimeBound, end: Option<TimeBound>) {
        self.push("start_time", start.to_param());
        self.push("end_time", end.unwrap_or(TimeBound::Now).to_param());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn here() -> Location {
        Location::new(40.0, 80.0)
    }

    #[test]
    fn forecast_without_end_omits_end_time() {
        let call = EndpointCall::nowcast(
            here(),
            30,
            &["wind_gust", "precipitation_type"],
            TimeWindow::from_now(),
            UnitSystem::Us,
        );
        assert_eq!(call.param("start_time"), Some("now"));
        assert_eq!(call.param("end_time"), None);
        assert!(call.params().iter().all(|(k, _)| *k != "end_time"));
        assert_eq!(call.param("timestep"), Some("30"));
        assert_eq!(call.param("fields"), Some("wind_gust,precipitation_type"));
    }

    #[test]
    fn forecast_with_end_sends_rfc3339() {
        let start = Utc.with_ymd_and_hms(2020, 6, 22, 23, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2020, 6, 23, 0, 0, 0).unwrap();
        let call = EndpointCall::forecast_hourly(
            here(),
            &["temp"],
            TimeWindow::between(start, end),
            UnitSystem::Si,
        );
        assert_eq!(call.param("start_time"), Some("2020-06-22T23:00:00Z"));
        assert_eq!(call.param("end_time"), Some("2020-06-23T00:00:00Z"));
    }

    #[test]
    fn historical_defaults_end_to_now() {
        let start = Utc.with_ymd_and_hms(2020, 6, 20, 0, 0, 0).unwrap();
        let call = EndpointCall::historical_station(
            here(),
            &["temp"],
            start,
            None,
            UnitSystem::Si,
        );
        assert_eq!(call.param("start_time"), Some("2020-06-20T00:00:00Z"));
        assert_eq!(call.param("end_time"), Some("now"));
        assert_eq!(call.endpoint().path(), "/weather/historical/station");
    }

    #[test]
    fn unit_system_follows_argument_on_every_endpoint() {
        let fields = ["temp"];
        let start = Utc.with_ymd_and_hms(2020, 6, 22, 18, 0, 0).unwrap();
        let calls = [
            EndpointCall::realtime(here(), &fields, UnitSystem::Us),
            EndpointCall::nowcast(here(), 5, &fields, TimeWindow::default(), UnitSystem::Us),
            EndpointCall::forecast_daily(here(), &fields, TimeWindow::default(), UnitSystem::Us),
            EndpointCall::historical_climacell(
                here(),
                &fields,
                5,
                start,
                Some(TimeBound::Now),
                UnitSystem::Us,
            ),
            EndpointCall::historical_station(here(), &fields, start, None, UnitSystem::Us),
        ];
        for call in &calls {
            assert_eq!(call.param("unit_system"), Some("us"), "{:?}", call.endpoint());
        }
        assert_eq!(calls[3].param("start_time"), Some("2020-06-22T18:00:00Z"));
        assert_eq!(calls[3].param("end_time"), Some("now"));
        assert_eq!(UnitSystem::default(), UnitSystem::Si);
    }

    #[test]
    fn fire_index_sends_only_location() {
        let call = EndpointCall::fire_index(Location::new(12.5, -13.0));
        assert_eq!(
            call.params(),
            &[("lat", "12.5".to_string()), ("lon", "-13".to_string())]
        );
        assert!(call.fields().is_empty());
        assert_eq!(call.endpoint().shape(), Shape::FireIndex);
    }

    #[test]
    fn shapes_per_endpoint() {
        assert_eq!(Endpoint::Realtime.shape(), Shape::Realtime);
        assert_eq!(Endpoint::ForecastDaily.shape(), Shape::DailySeries);
        assert_eq!(Endpoint::Nowcast.shape(), Shape::Series);
        assert_eq!(Endpoint::HistoricalClimacell.shape(), Shape::Series);
    }
}
