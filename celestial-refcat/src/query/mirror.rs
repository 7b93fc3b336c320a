//! Ordered failover across redundant service endpoints.
//!
//! [`MirrorClient::fetch`] tries each URL of a [`MirrorRequest`] once, in list
//! order, with the request's own timeout on every attempt. The caller decides
//! what counts as a usable answer:
//!
//! | Attempt result | Not the last mirror | Last mirror |
//! |----------------|---------------------|-------------|
//! | accepted body | return it | return it |
//! | body rejected by `accept` | next mirror | [`FetchOutcome::Empty`] |
//! | connect / timeout / HTTP status error | warn, next mirror | [`RefCatError::Transport`] |

use crate::errors::{RefCatError, RefCatResult};
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Parameters go in the query string.
    Get,
    /// Parameters go in a form-encoded body.
    Post,
}

/// One logical request, replayable against every mirror.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorRequest {
    /// Service name used in logs and errors.
    pub service: &'static str,
    pub mirrors: Vec<String>,
    pub method: HttpMethod,
    /// Ordered parameters; keys may repeat (VizieR `-out`).
    pub params: Vec<(String, String)>,
    /// Applies to each attempt separately.
    pub timeout: Duration,
}

impl MirrorRequest {
    pub fn new(
        service: &'static str,
        mirrors: &[String],
        method: HttpMethod,
        timeout: Duration,
    ) -> Self {
        Self {
            service,
            mirrors: mirrors.to_vec(),
            method,
            params: Vec::new(),
            timeout,
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Value of the first parameter named `key`.
    #[cfg(test)]
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched { mirror: String, body: String },
    /// Every mirror answered but none with a usable payload.
    Empty,
}

/// Blocking HTTP client shared by all adapters of a resolver.
///
/// Holds no per-request state; timeouts travel with each [`MirrorRequest`].
#[derive(Debug, Clone)]
pub struct MirrorClient {
    http: Client,
}

impl MirrorClient {
    pub fn new(user_agent: &str) -> RefCatResult<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| RefCatError::config(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    /// Try the request's mirrors in order until `accept` approves a body.
    ///
    /// # Errors
    /// [`RefCatError::Transport`] if the last mirror could not be reached or
    /// answered with a non-success status. [`RefCatError::Config`] if the
    /// mirror list is empty.
    pub fn fetch<F>(&self, request: &MirrorRequest, accept: F) -> RefCatResult<FetchOutcome>
    where
        F: Fn(&str) -> bool,
    {
        let count = request.mirrors.len();
        if count == 0 {
            return Err(RefCatError::config(format!(
                "no mirrors configured for {}",
                request.service
            )));
        }

        for (i, url) in request.mirrors.iter().enumerate() {
            debug!(
                service = request.service,
                mirror = %url,
                attempt = i + 1,
                of = count,
                "querying mirror"
            );
            match self.attempt(url, request) {
                Ok(body) if accept(&body) => {
                    return Ok(FetchOutcome::Fetched {
                        mirror: url.clone(),
                        body,
                    });
                }
                Ok(_) => {
                    debug!(service = request.service, mirror = %url, "no usable payload");
                }
                Err(message) if i + 1 == count => {
                    return Err(RefCatError::transport(
                        request.service,
                        format!("{}: {}", url, message),
                    ));
                }
                Err(message) => {
                    warn!(service = request.service, mirror = %url, "{}", message);
                }
            }
        }

        Ok(FetchOutcome::Empty)
    }

    fn attempt(&self, url: &str, request: &MirrorRequest) -> Result<String, String> {
        let builder = match request.method {
            HttpMethod::Get => self.http.get(url).query(&request.params),
            HttpMethod::Post => self.http.post(url).form(&request.params),
        };

        let response = builder
            .timeout(request.timeout)
            .send()
            .map_err(|e| format!("request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("HTTP status {}", response.status()));
        }

        response
            .text()
            .map_err(|e| format!("failed to read response: {}", e))
    }
}
