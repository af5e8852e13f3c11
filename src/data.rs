//! Typed views over ClimaCell response bodies.
//!
//! Views keep the JSON they were decoded from and compute their accessors on
//! every call; nothing is cached.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::DecodeError;

/// Layout of a successful response body, fixed per endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Shape {
    /// A single observation object.
    Realtime,
    /// A list of observation objects.
    #[default]
    Series,
    /// A list of daily objects whose fields may carry min/max entries.
    DailySeries,
    /// A one-element list carrying `fire_index`.
    FireIndex,
}

/// The decoded form of one response. Exactly one variant per decode.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    Error(ErrorData),
    Observation(ObservationData),
    Series(Vec<ObservationData>),
    DailySeries(Vec<DailyObservationData>),
    FireIndex(FireIndexData),
}

impl ResponseData {
    pub fn is_error(&self) -> bool {
        matches!(self, ResponseData::Error(_))
    }

    pub fn as_error(&self) -> Option<&ErrorData> {
        match self {
            ResponseData::Error(e) => Some(e),
            _ => None,
        }
    }
}

/// Error payload returned with any non-200 status.
///
/// Every field is optional and read on its own, so a non-JSON body or a key
/// of an unexpected type only blanks that key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorData {
    pub status_code: Option<u16>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

impl ErrorData {
    pub(crate) fn from_body(body: &str) -> Self {
        let Ok(json) = serde_json::from_str::<Value>(body) else {
            return Self::default();
        };
        let text = |key: &str| json.get(key).and_then(Value::as_str).map(str::to_owned);
        Self {
            status_code: json
                .get("statusCode")
                .and_then(Value::as_u64)
                .and_then(|c| u16::try_from(c).ok()),
            error_code: text("errorCode"),
            error_message: text("message"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MeasurementValue {
    Number(f64),
    Text(String),
}

impl MeasurementValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MeasurementValue::Number(n) => Some(*n),
            MeasurementValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MeasurementValue::Text(s) => Some(s),
            MeasurementValue::Number(_) => None,
        }
    }
}

/// A value with its unit. `observation_time` is only set for daily extremes.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub value: Option<MeasurementValue>,
    pub units: Option<String>,
    pub observation_time: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Extremum {
    Min,
    Max,
}

impl Extremum {
    pub fn as_str(self) -> &'static str {
        match self {
            Extremum::Min => "min",
            Extremum::Max => "max",
        }
    }
}

/// A daily field: either a plain measurement or its min and/or max.
#[derive(Debug, Clone, PartialEq)]
pub enum DailyMeasurement {
    Single(Measurement),
    Extremes(BTreeMap<Extremum, Measurement>),
}

impl DailyMeasurement {
    pub fn single(&self) -> Option<&Measurement> {
        match self {
            DailyMeasurement::Single(m) => Some(m),
            DailyMeasurement::Extremes(_) => None,
        }
    }

    pub fn extreme(&self, kind: Extremum) -> Option<&Measurement> {
        match self {
            DailyMeasurement::Extremes(map) => map.get(&kind),
            DailyMeasurement::Single(_) => None,
        }
    }
}

/// One observation or forecast point.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationData {
    raw: Value,
    fields: Vec<String>,
}

impl ObservationData {
    pub(crate) fn new(raw: Value, fields: &[String]) -> Self {
        Self {
            raw,
            fields: fields.to_vec(),
        }
    }

    pub fn lat(&self) -> Option<f64> {
        self.raw.get("lat").and_then(Value::as_f64)
    }

    pub fn lon(&self) -> Option<f64> {
        self.raw.get("lon").and_then(Value::as_f64)
    }

    pub fn observation_time(&self) -> Result<DateTime<FixedOffset>, DecodeError> {
        parse_timestamp(observation_time_value(&self.raw)?)
    }

    /// One entry per requested field. A requested field absent from the body
    /// is an error.
    pub fn measurements(&self) -> Result<BTreeMap<String, Measurement>, DecodeError> {
        let mut out = BTreeMap::new();
        for f in &self.fields {
            let m = measurement(f, required_field(&self.raw, f)?)?;
            out.insert(f.clone(), m);
        }
        Ok(out)
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

/// One day of a daily forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyObservationData {
    raw: Value,
    fields: Vec<String>,
}

impl DailyObservationData {
    pub(crate) fn new(raw: Value, fields: &[String]) -> Self {
        Self {
            raw,
            fields: fields.to_vec(),
        }
    }

    pub fn lat(&self) -> Option<f64> {
        self.raw.get("lat").and_then(Value::as_f64)
    }

    pub fn lon(&self) -> Option<f64> {
        self.raw.get("lon").and_then(Value::as_f64)
    }

    /// Daily bodies carry a bare date (`2020-06-23`) as their observation time.
    pub fn observation_date(&self) -> Result<NaiveDate, DecodeError> {
        let value = observation_time_value(&self.raw)?;
        match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(d) => Ok(d),
            Err(_) => parse_timestamp(value).map(|t| t.date_naive()),
        }
    }

    pub fn measurements(&self) -> Result<BTreeMap<String, DailyMeasurement>, DecodeError> {
        let mut out = BTreeMap::new();
        for f in &self.fields {
            let raw = required_field(&self.raw, f)?;
            let m = match raw {
                Value::Array(entries) => DailyMeasurement::Extremes(extremes(f, entries)?),
                other => DailyMeasurement::Single(measurement(f, other)?),
            };
            out.insert(f.clone(), m);
        }
        Ok(out)
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FireIndexData {
    pub fire_index: Option<f64>,
}

pub(crate) fn decode(
    status: StatusCode,
    body: &str,
    fields: &[String],
    shape: Shape,
) -> Result<ResponseData, DecodeError> {
    if status != StatusCode::OK {
        // Error bodies are not guaranteed to be JSON (gateway pages etc.).
        return Ok(ResponseData::Error(ErrorData::from_body(body)));
    }

    let json: Value = serde_json::from_str(body).map_err(DecodeError::InvalidJson)?;

    match shape {
        Shape::Realtime => {
            if !json.is_object() {
                return Err(DecodeError::UnexpectedShape {
                    expected: "an object",
                });
            }
            Ok(ResponseData::Observation(ObservationData::new(json, fields)))
        }
        Shape::FireIndex => {
            let first = list(json)?.into_iter().next().ok_or(DecodeError::EmptyBody)?;
            let fire_index = match first.get("fire_index") {
                None | Some(Value::Null) => None,
                Some(v) => Some(v.as_f64().ok_or_else(|| DecodeError::InvalidValue {
                    field: "fire_index".to_string(),
                })?),
            };
            Ok(ResponseData::FireIndex(FireIndexData { fire_index }))
        }
        Shape::DailySeries => Ok(ResponseData::DailySeries(
            objects(json)?
                .into_iter()
                .map(|o| DailyObservationData::new(o, fields))
                .collect(),
        )),
        Shape::Series => Ok(ResponseData::Series(
            objects(json)?
                .into_iter()
                .map(|o| ObservationData::new(o, fields))
                .collect(),
        )),
    }
}

/// Parses an ISO-8601 timestamp. Timestamps without an offset are UTC.
pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, DecodeError> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|e| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|t| t.and_utc().fixed_offset())
                .map_err(|_| e)
        })
        .map_err(|source| DecodeError::InvalidTimestamp {
            value: value.to_string(),
            source,
        })
}

fn list(json: Value) -> Result<Vec<Value>, DecodeError> {
    match json {
        Value::Array(items) => Ok(items),
        _ => Err(DecodeError::UnexpectedShape { expected: "a list" }),
    }
}

fn objects(json: Value) -> Result<Vec<Value>, DecodeError> {
    let items = list(json)?;
    if items.iter().any(|i| !i.is_object()) {
        return Err(DecodeError::UnexpectedShape {
            expected: "a list of objects",
        });
    }
    Ok(items)
}

fn required_field<'a>(raw: &'a Value, field: &str) -> Result<&'a Value, DecodeError> {
    raw.get(field).ok_or_else(|| DecodeError::MissingField {
        field: field.to_string(),
    })
}

fn observation_time_value(raw: &Value) -> Result<&str, DecodeError> {
    raw.get("observation_time")
        .and_then(|t| t.get("value"))
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError::MissingField {
            field: "observation_time".to_string(),
        })
}

fn measurement(field: &str, raw: &Value) -> Result<Measurement, DecodeError> {
    if !raw.is_object() {
        return Err(DecodeError::InvalidValue {
            field: field.to_string(),
        });
    }

    let value = match raw.get("value") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64().map(MeasurementValue::Number),
        Some(Value::String(s)) => Some(MeasurementValue::Text(s.clone())),
        Some(_) => {
            return Err(DecodeError::InvalidValue {
                field: field.to_string(),
            });
        }
    };

    Ok(Measurement {
        value,
        units: raw.get("units").and_then(Value::as_str).map(str::to_owned),
        observation_time: None,
    })
}

fn extremes(
    field: &str,
    entries: &[Value],
) -> Result<BTreeMap<Extremum, Measurement>, DecodeError> {
    let mut out = BTreeMap::new();
    for entry in entries {
        let kind = if entry.get("max").is_some() {
            Extremum::Max
        } else if entry.get("min").is_some() {
            Extremum::Min
        } else {
            return Err(DecodeError::InvalidExtremum {
                field: field.to_string(),
            });
        };

        let time = entry
            .get("observation_time")
            .and_then(Value::as_str)
            .ok_or_else(|| DecodeError::MissingField {
                field: format!("{}.observation_time", field),
            })?;

        let mut m = measurement(field, &entry[kind.as_str()])?;
        m.observation_time = Some(parse_timestamp(time)?);
        if out.insert(kind, m).is_some() {
            return Err(DecodeError::DuplicateExtremum {
                field: field.to_string(),
                kind: kind.as_str(),
            });
        }
    }
    Ok(out)
}
