//! Blocking HTTP client for the WP Engine API.
//!
//! One [`RemoteClient`] call is one HTTP round trip. Non-2xx responses are
//! classified into the reconcile error taxonomy with their body attached;
//! nothing is retried here.

use crate::endpoint::Endpoint;
use reconcile::{AttributeSet, Error, RemoteClient, ResourceKind, Result};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use ureq::Body;
use ureq::http::Response;

/// Production API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.wpengineapi.com/v1";

/// Timeout for a whole request, connect to last body byte.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// WP Engine API client.
///
/// Holds no per-call state, so one client can serve concurrent
/// reconciliations.
///
/// # Example
///
/// ```no_run
/// use reconcile::{attrs, Reconciler, ResourceInstance};
/// use wpengine::{ApiClient, kinds};
///
/// let client = ApiClient::new("api-token");
/// let mut key = ResourceInstance::new(
///     &kinds::SSH_KEY,
///     attrs! { "public_key" => "ssh-ed25519 AAAA..." },
/// );
/// Reconciler::new(&client).reconcile(&mut key).unwrap();
/// ```
pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// Create a client for the production API.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    /// Create a client with a custom API base (for testing or proxies).
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            agent: build_agent(DEFAULT_TIMEOUT),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("token", &"***")
            .finish_non_exhaustive()
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    // Error statuses are read as normal responses so their bodies survive.
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build();
    ureq::Agent::new_with_config(config)
}

fn endpoint(kind: &ResourceKind) -> Result<Endpoint> {
    Endpoint::for_kind(kind.name)
        .ok_or_else(|| Error::validation(kind.name, "kind is not served by the WP Engine API"))
}

impl RemoteClient for ApiClient {
    fn create(&self, kind: &ResourceKind, attributes: &AttributeSet) -> Result<AttributeSet> {
        let (path, body) = endpoint(kind)?.collection_path(kind, attributes)?;
        let url = self.url(&path);

        log::debug!("POST {url}");
        let result = self
            .agent
            .post(&url)
            .header("Authorization", self.authorization())
            .header("Accept", "application/json")
            .send_json(&body);

        let body = finish(kind, None, result)?;
        decode_created(kind, &body)
    }

    fn read(&self, kind: &ResourceKind, remote_id: &str) -> Result<AttributeSet> {
        let url = self.url(&endpoint(kind)?.item_path(kind, remote_id)?);

        log::debug!("GET {url}");
        let result = self
            .agent
            .get(&url)
            .header("Authorization", self.authorization())
            .header("Accept", "application/json")
            .call();

        let body = finish(kind, Some(remote_id), result)?;
        decode(kind, Some(remote_id), &body)
    }

    fn update(
        &self,
        kind: &ResourceKind,
        remote_id: &str,
        changes: &AttributeSet,
    ) -> Result<AttributeSet> {
        let url = self.url(&endpoint(kind)?.item_path(kind, remote_id)?);

        log::debug!("PUT {url}");
        let result = self
            .agent
            .put(&url)
            .header("Authorization", self.authorization())
            .header("Accept", "application/json")
            .send_json(changes);

        let body = finish(kind, Some(remote_id), result)?;
        decode(kind, Some(remote_id), &body)
    }

    fn delete(&self, kind: &ResourceKind, remote_id: &str) -> Result<()> {
        let url = self.url(&endpoint(kind)?.item_path(kind, remote_id)?);

        log::debug!("DELETE {url}");
        let result = self
            .agent
            .delete(&url)
            .header("Authorization", self.authorization())
            .call();

        finish(kind, Some(remote_id), result).map(|_| ())
    }
}

/// Read the response body and fail on non-2xx statuses.
///
/// The body is read as bytes; only I/O failures are transport errors.
fn finish(
    kind: &ResourceKind,
    remote_id: Option<&str>,
    result: std::result::Result<Response<Body>, ureq::Error>,
) -> Result<Vec<u8>> {
    let mut response = result.map_err(|e| transport_error(kind.name, remote_id, &e))?;
    let status = response.status();
    let body = response
        .body_mut()
        .read_to_vec()
        .map_err(|e| transport_error(kind.name, remote_id, &e))?;

    log::debug!("{} -> HTTP {}", kind.name, status.as_u16());
    if status.is_success() {
        Ok(body)
    } else {
        let text = String::from_utf8_lossy(&body).into_owned();
        Err(classify(kind.name, remote_id, status.as_u16(), text))
    }
}

fn transport_error(kind: &str, remote_id: Option<&str>, err: &ureq::Error) -> Error {
    match err {
        ureq::Error::StatusCode(code) => classify(kind, remote_id, *code, String::new()),
        other => Error::Transport {
            kind: kind.to_string(),
            remote_id: remote_id.map(str::to_string),
            status: None,
            message: other.to_string(),
        },
    }
}

/// Map a non-2xx status to an error category.
///
/// 404 is `NotFound`; 429 and 5xx are transient `Transport` failures; other
/// 4xx are `Conflict`. Anything else is not a status this API should return.
#[must_use]
pub fn classify(kind: &str, remote_id: Option<&str>, status: u16, body: String) -> Error {
    let kind = kind.to_string();
    let remote_id = remote_id.map(str::to_string);
    match status {
        404 => Error::NotFound {
            kind,
            remote_id: remote_id.unwrap_or_default(),
        },
        429 | 500..=599 => Error::Transport {
            kind,
            remote_id,
            status: Some(status),
            message: if body.is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {body}")
            },
        },
        400..=499 => Error::Conflict {
            kind,
            remote_id,
            status,
            body,
        },
        _ => Error::Protocol {
            kind,
            remote_id,
            message: format!("unexpected HTTP status {status}"),
            body,
        },
    }
}

fn protocol_error(
    kind: &ResourceKind,
    remote_id: Option<&str>,
    message: String,
    body: &[u8],
) -> Error {
    let err = Error::protocol(kind.name, message, String::from_utf8_lossy(body));
    match remote_id {
        Some(id) => err.with_remote_id(id),
        None => err,
    }
}

/// Decode a 2xx body into an attribute set.
fn decode(kind: &ResourceKind, remote_id: Option<&str>, body: &[u8]) -> Result<AttributeSet> {
    let protocol = |message: String| protocol_error(kind, remote_id, message, body);

    let text = std::str::from_utf8(body).map_err(|e| protocol(format!("invalid UTF-8: {e}")))?;
    if text.trim().is_empty() {
        return Err(protocol("empty response body".to_string()));
    }
    let value: Value =
        serde_json::from_str(text).map_err(|e| protocol(format!("invalid JSON: {e}")))?;
    AttributeSet::from_value(value).ok_or_else(|| protocol("expected a JSON object".to_string()))
}

/// Decode a create response, which must carry the new identifier.
fn decode_created(kind: &ResourceKind, body: &[u8]) -> Result<AttributeSet> {
    let created = decode(kind, None, body)?;
    if created.identifier(kind.id_attribute).is_none() {
        return Err(protocol_error(
            kind,
            None,
            format!("create response has no '{}'", kind.id_attribute),
            body,
        ));
    }
    Ok(created)
}
