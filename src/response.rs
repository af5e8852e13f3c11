use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::data::{ErrorData, ResponseData, Shape, decode};
use crate::error::{DecodeError, format_api_error};

/// A ClimaCell HTTP response plus what is needed to decode it.
///
/// The body is kept as received. [`ClimacellResponse::data`] parses it anew on
/// every call, so the envelope can be shared and decoded repeatedly.
#[derive(Debug, Clone)]
pub struct ClimacellResponse {
    status: StatusCode,
    url: String,
    headers: HeaderMap,
    body: String,
    fields: Vec<String>,
    shape: Shape,
}

impl ClimacellResponse {
    /// Builds an envelope from a status and body, e.g. a recorded response.
    pub fn from_parts(
        status: StatusCode,
        body: impl Into<String>,
        fields: &[impl AsRef<str>],
        shape: Shape,
    ) -> Self {
        Self {
            status,
            url: String::new(),
            headers: HeaderMap::new(),
            body: body.into(),
            fields: fields.iter().map(|f| f.as_ref().to_string()).collect(),
            shape,
        }
    }

    pub(crate) fn with_transport(mut self, url: String, headers: HeaderMap) -> Self {
        self.url = url;
        self.headers = headers;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// Final request URL, including the API key. Empty for envelopes built
    /// with [`ClimacellResponse::from_parts`].
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The body exactly as received.
    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.body).context("response body is not valid JSON")
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Decodes the body into a typed view.
    ///
    /// Any status other than 200 yields [`ResponseData::Error`]; otherwise the
    /// variant follows [`ClimacellResponse::shape`].
    pub fn data(&self) -> std::result::Result<ResponseData, DecodeError> {
        decode(self.status, &self.body, &self.fields, self.shape)
    }

    /// Turns a non-200 response into an error with a readable message.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let payload = ErrorData::from_body(&self.body);
        Err(format_api_error(
            self.status,
            &crate::util::redact_key(&self.url),
            &payload,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REALTIME: &str = r#"{"lat":12,"lon":13,
        "observation_time":{"value":"2020-06-09T18:53:12.746Z"},
        "temp":{"units":"F","value":102.2}}"#;

    #[test]
    fn decoding_leaves_body_untouched_and_is_repeatable() {
        let resp =
            ClimacellResponse::from_parts(StatusCode::OK, REALTIME, &["temp"], Shape::Realtime);
        let first = resp.data().unwrap();
        let second = resp.data().unwrap();
        assert_eq!(first, second);
        assert_eq!(resp.text(), REALTIME);
        assert_eq!(resp.json().unwrap()["temp"]["units"], "F");
    }

    #[test]
    fn error_for_status_passes_success_through() {
        let resp =
            ClimacellResponse::from_parts(StatusCode::OK, REALTIME, &["temp"], Shape::Realtime);
        assert!(resp.error_for_status().is_ok());

        let resp = ClimacellResponse::from_parts(
            StatusCode::BAD_REQUEST,
            r#"{"statusCode":400,"errorCode":"BadRequest","message":"lon must be in the range -180..180"}"#,
            &["temp"],
            Shape::Realtime,
        )
        .with_transport(
            "https://api.climacell.co/v3/weather/realtime?lat=12&apikey=secret".to_string(),
            HeaderMap::new(),
        );
        let err = resp.error_for_status().unwrap_err().to_string();
        assert!(err.contains("BadRequest"));
        assert!(!err.contains("secret"));
    }
}
