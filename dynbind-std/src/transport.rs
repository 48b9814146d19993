//! HTTP remote transport.
//!
//! Forwards a [`RemoteCall`] as `POST {endpoint}/{interface}/{method}` with
//! the bundled arguments as a JSON array body.

use dynbind_core::{BoxError, RemoteCall, RemoteTransport};
use serde_json::Value;
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use thiserror::Error;
use tracing::debug;

/// Correlation id header. The value is `{caller correlation id}.{n}`.
pub const CORRELATION_HEADER: &str = "x-dynbind-crid";
/// Name of the forwarding instance.
pub const PROXY_HEADER: &str = "x-dynbind-proxy";
/// Set by the remote side when the call failed; the value is the message.
pub const ERROR_HEADER: &str = "x-dynbind-error";

/// Caller headers that are never forwarded.
const SKIPPED_HEADERS: &[&str] = &["cookie", "date"];

/// Errors of [`HttpTransport`].
#[derive(Error, Debug)]
pub enum HttpError {
    /// The request could not be performed.
    #[error("request to {url} failed: {source}")]
    Request {
        /// Target URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: Box<ureq::Error>,
    },

    /// The remote side reported a failure.
    #[error("remote error: {0}")]
    Remote(String),

    /// The response body could not be read.
    #[error("response body could not be read: {0}")]
    Body(#[from] std::io::Error),
}

/// A blocking HTTP transport.
pub struct HttpTransport {
    agent: ureq::Agent,
    sequence: AtomicU64,
}

impl HttpTransport {
    /// Default request timeout in seconds (can be overridden by env).
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    /// Default connect timeout in seconds (can be overridden by env).
    const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

    fn default_timeouts() -> (Duration, Duration) {
        let timeout_secs = std::env::var("DYNBIND_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(Self::DEFAULT_TIMEOUT_SECS);
        let connect_secs = std::env::var("DYNBIND_HTTP_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(Self::DEFAULT_CONNECT_TIMEOUT_SECS);
        (
            Duration::from_secs(timeout_secs),
            Duration::from_secs(connect_secs),
        )
    }

    /// Create a transport with the default timeouts.
    pub fn new() -> Self {
        let (timeout, connect_timeout) = Self::default_timeouts();
        Self::with_timeouts(timeout, connect_timeout)
    }

    /// Create a transport with explicit timeouts.
    pub fn with_timeouts(timeout: Duration, connect_timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(timeout)
                .timeout_connect(connect_timeout)
                .build(),
            sequence: AtomicU64::new(0),
        }
    }

    fn send(&self, call: &RemoteCall) -> Result<Value, HttpError> {
        let url = target_url(call);
        let mut request = self.agent.post(&url);

        let mut correlation = "undefined";
        if let Some(context) = &call.context {
            for (name, value) in &context.headers {
                if !SKIPPED_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                    request = request.set(name, value);
                }
            }
            if let Some(cookie) = &context.session_cookie {
                request = request.set("Cookie", cookie);
            }
            if let Some(origin) = &context.origin {
                request = request.set(PROXY_HEADER, origin);
            }
            if let Some(id) = &context.correlation_id {
                correlation = id.as_str();
            }
        }

        let n = self.sequence.fetch_add(1, Ordering::Relaxed);
        request = request.set(CORRELATION_HEADER, &format!("{correlation}.{n}"));

        debug!(%url, args = call.args.len(), "sending remote call");
        // A failing remote answers with an error status and the error header.
        let response = match request.send_json(&call.args) {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) if response.header(ERROR_HEADER).is_some() => {
                response
            }
            Err(source) => {
                return Err(HttpError::Request {
                    url,
                    source: Box::new(source),
                });
            }
        };

        if let Some(message) = response.header(ERROR_HEADER) {
            return Err(HttpError::Remote(message.to_string()));
        }

        if response.content_type().contains("json") {
            Ok(response.into_json()?)
        } else {
            Ok(Value::String(response.into_string()?))
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteTransport for HttpTransport {
    fn invoke(&self, call: &RemoteCall) -> Result<Value, BoxError> {
        Ok(self.send(call)?)
    }
}

fn target_url(call: &RemoteCall) -> String {
    format!(
        "{}/{}/{}",
        call.endpoint.as_str().trim_end_matches('/'),
        call.interface,
        call.method
    )
}
