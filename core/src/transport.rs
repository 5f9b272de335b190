//! Blocking HTTP transport backed by a `ureq` agent.

use std::fmt;

use tracing::debug;
use ureq::{Agent, Proxy, RequestBuilder};

use crate::error::{PlantUmlError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// Maximum response body accepted from the server (64 MB).
pub const MAX_RESPONSE_SIZE: u64 = 64 * 1024 * 1024;

/// Production [`Transport`].
///
/// Status codes are returned as data, never as errors. The proxy is fixed
/// when the transport is built; the agent does not look at the environment.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new(proxy: Option<&str>) -> Result<Self, PlantUmlError> {
        let proxy = proxy
            .map(|uri| {
                Proxy::new(uri).map_err(|e| PlantUmlError::Config(format!("invalid proxy {uri:?}: {e}")))
            })
            .transpose()?;

        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .proxy(proxy)
            .build()
            .new_agent();

        Ok(Self { agent })
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let url = request.url.as_str();
        let body = request.body.as_deref();
        let result = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(url), &request.headers).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(url), &request.headers).call(),
            HttpMethod::Post => send(with_headers(self.agent.post(url), &request.headers), body),
            HttpMethod::Put => send(with_headers(self.agent.put(url), &request.headers), body),
        };
        let mut response = result.map_err(|e| TransportError::new(url, e))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_RESPONSE_SIZE)
            .read_to_vec()
            .map_err(|e| TransportError::new(url, e))?;

        debug!(status = status.as_u16(), bytes = body.len(), "received response");
        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send(
    builder: RequestBuilder<ureq::typestate::WithBody>,
    body: Option<&str>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}
