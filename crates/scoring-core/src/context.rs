//! Per-call request context.
//!
//! The [`RequestContext`] is filled in while a method call is dispatched and
//! handed back to the transport, which logs it once the response is known.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, so ids sort by arrival in the logs.
///
/// # Example
///
/// ```
/// use scoring_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parses a caller-supplied id, typically the `x-request-id` header.
    ///
    /// Returns `None` unless the value is a well-formed UUID.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value.trim()).ok().map(Self)
    }

    /// Returns the caller-supplied id if it parses, otherwise a fresh one.
    #[must_use]
    pub fn from_header_or_new(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or_default()
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Mutable record of one method call.
///
/// Dispatch writes into it; only the transport reads it back, for logging
/// and metrics.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    method: Option<String>,
    has: Option<Vec<String>>,
    nclients: Option<usize>,
    code: Option<u16>,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with the given request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            method: None,
            has: None,
            nclients: None,
            code: None,
            started_at: Instant::now(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the method name once the envelope was validated.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Records the method name.
    pub fn set_method(&mut self, method: impl Into<String>) {
        self.method = Some(method.into());
    }

    /// Returns the argument names supplied to `online_score`.
    #[must_use]
    pub fn has(&self) -> Option<&[String]> {
        self.has.as_deref()
    }

    /// Records the argument names supplied to `online_score`.
    pub fn set_has(&mut self, has: Vec<String>) {
        self.has = Some(has);
    }

    /// Returns the number of clients requested from `clients_interests`.
    #[must_use]
    pub const fn nclients(&self) -> Option<usize> {
        self.nclients
    }

    /// Records the number of clients requested from `clients_interests`.
    pub fn set_nclients(&mut self, nclients: usize) {
        self.nclients = Some(nclients);
    }

    /// Returns the final response code.
    #[must_use]
    pub const fn code(&self) -> Option<u16> {
        self.code
    }

    /// Records the final response code.
    pub fn set_code(&mut self, code: u16) {
        self.code = Some(code);
    }

    /// Returns the time elapsed since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
