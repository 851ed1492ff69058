//! Executes `HttpRequest` values against the network.
//!
//! # Design
//! `Transport` is the only I/O seam of the crate. `UreqTransport` is the
//! blocking implementation; it returns 4xx/5xx responses as data so status
//! interpretation stays in the client, and reports only "no response
//! received" conditions as errors.

use std::fmt;

use ureq::Agent;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Sends one request and returns whatever response the server produced.
pub trait Transport: Send + Sync {
    /// Returns `Err` only when no response was received.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport on a `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
    user_agent: String,
    max_response_bytes: u64,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("user_agent", &self.user_agent)
            .field("max_response_bytes", &self.max_response_bytes)
            .finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .build()
            .new_agent();
        Self {
            agent,
            user_agent: config.user_agent.clone(),
            max_response_bytes: config.max_response_bytes,
        }
    }

    fn decorate<B>(
        &self,
        builder: ureq::RequestBuilder<B>,
        request: &HttpRequest,
    ) -> ureq::RequestBuilder<B> {
        let mut builder = builder.header("user-agent", self.user_agent.as_str());
        for (key, value) in &request.query {
            builder = builder.query(key, value);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        builder
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.url.as_str();
        let result = match request.method {
            HttpMethod::Get => self.decorate(self.agent.get(url), request).call(),
            HttpMethod::Delete => self.decorate(self.agent.delete(url), request).call(),
            HttpMethod::Post => send_body(self.decorate(self.agent.post(url), request), request),
            HttpMethod::Put => send_body(self.decorate(self.agent.put(url), request), request),
        };
        let mut response = result.map_err(|e| ApiError::transport(&request.endpoint, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_response_bytes)
            .read_to_string()
            .map_err(|e| ApiError::transport(&request.endpoint, e))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn send_body(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    request: &HttpRequest,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match &request.body {
        Some(body) => builder.send(body.as_str()),
        None => builder.send_empty(),
    }
}
