//! The platform's uniform `{code, message, data}` response wrapper.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{CatalogError, Result};
use crate::transport::ApiResponse;

/// Response envelope, generic over the payload.
///
/// Some endpoints report their text in `msg` instead of `message` (and a few
/// send both), so both are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub msg: String,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// The non-empty one of `message` and `msg`.
    pub fn text(&self) -> &str {
        if self.message.is_empty() {
            &self.msg
        } else {
            &self.message
        }
    }
}

/// Decode a response body into `T`.
///
/// * a non-zero code is a [`CatalogError::Remote`], whatever the HTTP status
/// * code 0 with a null or missing payload yields `T::default()`
/// * a body that is not an envelope is [`CatalogError::HttpStatus`] on a
///   non-success status and [`CatalogError::Decode`] otherwise
pub fn decode<T>(endpoint: &str, response: &ApiResponse) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let envelope = parse_envelope(endpoint, response)?;
    if !envelope.is_success() {
        warn!(
            endpoint,
            code = envelope.code,
            message = envelope.text(),
            "Remote service reported failure"
        );
        return Err(CatalogError::remote(envelope.code, envelope.text()));
    }

    match envelope.data {
        None | Some(Value::Null) => Ok(T::default()),
        Some(data) => serde_json::from_value(data).map_err(|e| CatalogError::decode(endpoint, e)),
    }
}

/// Parse only the envelope, leaving the payload as JSON.
pub(crate) fn parse_envelope(endpoint: &str, response: &ApiResponse) -> Result<ApiEnvelope<Value>> {
    serde_json::from_slice::<ApiEnvelope<Value>>(&response.body).map_err(|e| {
        if response.is_success() {
            CatalogError::decode(endpoint, e)
        } else {
            CatalogError::HttpStatus {
                status: response.status,
                endpoint: endpoint.to_string(),
            }
        }
    })
}
