use serde_json::{json, Value};

use crate::api::ApiRequest;
use crate::transport::{Transport, TransportError};

/// A transport that answers every call with `{"ok": true, "result": {}}`
/// without touching the network.
///
/// Useful for measuring the overhead of formatting and dispatch without
/// any external I/O, and for tests that don't care about delivery.
#[derive(Clone, Default)]
pub struct NoopTransport;

impl Transport for NoopTransport {
    fn post(&self, _request: &ApiRequest) -> Result<Value, TransportError> {
        Ok(json!({"ok": true, "result": {}}))
    }
}
