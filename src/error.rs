use anyhow::anyhow;
use reqwest::StatusCode;
use thiserror::Error;

use crate::data::ErrorData;

/// A successful response that does not match what was requested.
///
/// API errors (non-200 responses) are not reported through this type; they
/// decode into [`ErrorData`].
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("response body is not valid JSON")]
    InvalidJson(#[source] serde_json::Error),

    #[error("expected {expected} in response body")]
    UnexpectedShape { expected: &'static str },

    #[error("field '{field}' missing from response")]
    MissingField { field: String },

    #[error("invalid timestamp '{value}'")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("field '{field}' has a value of an unexpected type")]
    InvalidValue { field: String },

    #[error("field '{field}' has a daily entry without 'min' or 'max'")]
    InvalidExtremum { field: String },

    #[error("field '{field}' has more than one '{kind}' entry")]
    DuplicateExtremum { field: String, kind: &'static str },

    #[error("response list is empty")]
    EmptyBody,
}

pub(crate) fn format_api_error(status: StatusCode, url: &str, e: &ErrorData) -> anyhow::Error {
    let code = e.error_code.as_deref().unwrap_or("");
    let message = e.error_message.as_deref().unwrap_or("");
    let status_in_body = e.status_code.unwrap_or(status.as_u16());

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return anyhow!(
            "ClimaCell authentication failed (HTTP {}).\n- Check the API key passed to Client::new or set in CLIMACELL_KEY / .climacellrc\n- Ensure the key is enabled for this endpoint\n\nServer message: {} {}\nrequest: {}",
            status_in_body,
            code,
            message,
            url
        );
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return anyhow!(
            "ClimaCell rate limit reached (HTTP 429).\n- The plan quota for this key is exhausted; wait and call again\n\nServer message: {}\nrequest: {}",
            message,
            url
        );
    }

    anyhow!(
        "API request failed: HTTP {} for url ({})\n{}: {}",
        status_in_body,
        url,
        if code.is_empty() { "error" } else { code },
        message
    )
}
