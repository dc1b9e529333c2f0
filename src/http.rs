use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Proxy;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;
use std::thread;
use tokio::runtime::Handle;

use crate::api::{ApiRequest, Payload};
use crate::transport::{Transport, TransportError};

/// Proxy URLs per request scheme, in the shape of a `requests` proxies map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Proxies {
    pub http: Option<String>,
    pub https: Option<String>,
}

/// [`Transport`] backed by a blocking `reqwest` client.
///
/// Proxies are fixed when the transport is built; the timeout is taken from
/// each [`ApiRequest`]. The client is created on first use. When the caller
/// runs on a tokio runtime thread, the round trip, client setup and client
/// teardown happen on a helper thread; the blocking client must never be
/// used or dropped inside a runtime.
#[derive(Clone)]
pub struct HttpTransport {
    proxies: Proxies,
    client: OnceLock<Client>,
}

impl HttpTransport {
    /// Validate `proxies` for a transport routing requests through them.
    ///
    /// **Returns**
    /// - `Err(TransportError::InvalidProxy)` when a proxy URL does not parse.
    pub fn new(proxies: &Proxies) -> Result<Self, TransportError> {
        parse_proxies(proxies)?;
        Ok(Self {
            proxies: proxies.clone(),
            client: OnceLock::new(),
        })
    }

    fn client(&self) -> Result<&Client, TransportError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let mut builder = Client::builder();
        for proxy in parse_proxies(&self.proxies)? {
            builder = builder.proxy(proxy);
        }
        let client = builder.build().map_err(TransportError::Client)?;
        // A concurrent caller may have won; the spare client is dropped here,
        // off any runtime thread.
        let _ = self.client.set(client);
        self.client.get().ok_or(TransportError::ClientUnavailable)
    }

    fn send(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        let builder = self.client()?.post(&request.url).timeout(request.timeout);
        let builder = self.with_payload(builder, &request.payload)?;

        let resp = builder.send().map_err(TransportError::Request)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_else(|_| "<no body>".to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        resp.json::<Value>().map_err(TransportError::Decode)
    }

    fn with_payload(&self, builder: RequestBuilder, payload: &Payload) -> Result<RequestBuilder, TransportError> {
        match payload {
            Payload::Empty => Ok(builder),
            Payload::Json(body) => Ok(builder.json(body)),
            Payload::Multipart { fields, document } => {
                let mut form = Form::new();
                for (name, value) in fields {
                    form = form.text(name.clone(), value.clone());
                }
                let part = Part::bytes(document.content.clone())
                    .file_name(document.file_name.clone())
                    .mime_str(&document.mime)
                    .map_err(TransportError::Document)?;
                Ok(builder.multipart(form.part("document", part)))
            }
        }
    }
}

impl Transport for HttpTransport {
    fn post(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        if !on_runtime_thread() {
            return self.send(request);
        }
        thread::scope(|scope| {
            scope
                .spawn(|| self.send(request))
                .join()
                .unwrap_or(Err(TransportError::DeliveryThreadPanicked))
        })
    }
}

impl Drop for HttpTransport {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            if on_runtime_thread() {
                let _ = thread::spawn(move || drop(client)).join();
            }
        }
    }
}

fn on_runtime_thread() -> bool {
    Handle::try_current().is_ok()
}

fn parse_proxies(proxies: &Proxies) -> Result<Vec<Proxy>, TransportError> {
    let mut parsed = Vec::new();
    if let Some(url) = &proxies.http {
        parsed.push(Proxy::http(url).map_err(|source| TransportError::InvalidProxy {
            url: url.clone(),
            source,
        })?);
    }
    if let Some(url) = &proxies.https {
        parsed.push(Proxy::https(url).map_err(|source| TransportError::InvalidProxy {
            url: url.clone(),
            source,
        })?);
    }
    Ok(parsed)
}
