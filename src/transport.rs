use serde_json::Value;

use crate::api::ApiRequest;

/// Synchronous destination for Bot API calls made by the handler.
///
/// Implementations perform exactly one HTTP round trip per call. The
/// handler calls `post` on the thread that emitted the record and never
/// retries.
pub trait Transport: Send + Sync {
    /// Perform the request and decode the JSON response body.
    ///
    /// **Parameters**
    /// - `request`: fully-built [`ApiRequest`] including URL and timeout.
    ///
    /// **Returns**
    /// - `Ok(body)` for a 2xx response with a JSON body. The body may
    ///   still report `"ok": false`.
    /// - `Err(..)` on connection failure, timeout, non-2xx status or an
    ///   undecodable body.
    fn post(&self, request: &ApiRequest) -> Result<Value, TransportError>;
}

/// Failure of a single Bot API call.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid proxy url {url:?}: {source}")]
    InvalidProxy {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP client could not be set up for this request")]
    ClientUnavailable,

    #[error("delivery thread panicked")]
    DeliveryThreadPanicked,

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("server responded with status {status}")]
    Status { status: u16, body: String },

    #[error("response body is not valid JSON: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("invalid document attachment: {0}")]
    Document(#[source] reqwest::Error),
}

impl TransportError {
    /// Response body captured for a non-success status, if any.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            TransportError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}
