//! Error types for reconciliation.
//!
//! Every failure the engine or a remote client can produce is one of six
//! categories. Categories decide what the orchestration layer may do next:
//! retry, re-create, ask for replacement, or give up.

use std::fmt;

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of reconciliation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Desired state rejected before any remote call.
    Validation,
    /// Remote entity does not exist.
    NotFound,
    /// Remote rejected the request (4xx other than 404).
    Conflict,
    /// Network, timeout or transient server failure.
    Transport,
    /// Response did not have the expected shape.
    Protocol,
    /// A non-mutable attribute changed.
    RequiresReplacement,
}

impl ErrorCategory {
    /// Whether the same call may be retried unchanged.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Validation => "Invalid configuration",
            Self::NotFound => "Remote resource not found",
            Self::Conflict => "Request rejected by the remote API",
            Self::Transport => "Network or server issue",
            Self::Protocol => "Unexpected response from the remote API",
            Self::RequiresReplacement => "Change requires replacement",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Validation => "Fix the resource attributes in the configuration",
            Self::NotFound => "The resource will be re-created on the next apply",
            Self::Conflict => "Resolve the conflict reported by the API and apply again",
            Self::Transport => "Check connectivity and try again",
            Self::Protocol => "Inspect the response body; the API may have changed",
            Self::RequiresReplacement => "Re-run apply with --replace to delete and re-create",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while reconciling a resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Desired state is missing a required attribute or breaks a constraint.
    #[error("invalid {kind}: {message}")]
    Validation {
        /// Resource kind name.
        kind: String,
        /// What was wrong.
        message: String,
    },

    /// Remote entity is absent.
    #[error("{kind} {remote_id} not found")]
    NotFound {
        /// Resource kind name.
        kind: String,
        /// Identifier that was looked up.
        remote_id: String,
    },

    /// Remote API rejected the request.
    #[error("{kind} request rejected with HTTP {status}: {body}")]
    Conflict {
        /// Resource kind name.
        kind: String,
        /// Identifier, if the call targeted an existing entity.
        remote_id: Option<String>,
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Network failure, timeout or transient server error.
    #[error("transport failure for {kind}: {message}")]
    Transport {
        /// Resource kind name.
        kind: String,
        /// Identifier, if known.
        remote_id: Option<String>,
        /// HTTP status code for server-side failures.
        status: Option<u16>,
        /// Error message.
        message: String,
    },

    /// Malformed or unexpected response.
    #[error("unexpected response for {kind}: {message}")]
    Protocol {
        /// Resource kind name.
        kind: String,
        /// Identifier, if known.
        remote_id: Option<String>,
        /// What was wrong with the response.
        message: String,
        /// Raw response body.
        body: String,
    },

    /// Non-mutable attributes differ from the observed state.
    #[error("{kind} requires replacement, immutable attributes changed: {}", .attributes.join(", "))]
    RequiresReplacement {
        /// Resource kind name.
        kind: String,
        /// Identifier of the entity that would be replaced.
        remote_id: Option<String>,
        /// Attributes whose change forces replacement.
        attributes: Vec<String>,
    },
}

impl Error {
    /// Create a validation error.
    pub fn validation(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(kind: impl Into<String>, remote_id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            remote_id: remote_id.into(),
        }
    }

    /// Create a transport error without an HTTP status.
    pub fn transport(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            kind: kind.into(),
            remote_id: None,
            status: None,
            message: message.into(),
        }
    }

    /// Create a protocol error carrying the offending body.
    pub fn protocol(
        kind: impl Into<String>,
        message: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::Protocol {
            kind: kind.into(),
            remote_id: None,
            message: message.into(),
            body: body.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Validation { .. } => ErrorCategory::Validation,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Conflict { .. } => ErrorCategory::Conflict,
            Error::Transport { .. } => ErrorCategory::Transport,
            Error::Protocol { .. } => ErrorCategory::Protocol,
            Error::RequiresReplacement { .. } => ErrorCategory::RequiresReplacement,
        }
    }

    /// Whether this error is transient and the call may be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Whether the remote entity is gone.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Resource kind the error belongs to.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Error::Validation { kind, .. }
            | Error::NotFound { kind, .. }
            | Error::Conflict { kind, .. }
            | Error::Transport { kind, .. }
            | Error::Protocol { kind, .. }
            | Error::RequiresReplacement { kind, .. } => kind,
        }
    }

    /// Remote identifier the error refers to, when known.
    #[must_use]
    pub fn remote_id(&self) -> Option<&str> {
        match self {
            Error::Validation { .. } => None,
            Error::NotFound { remote_id, .. } => Some(remote_id),
            Error::Conflict { remote_id, .. }
            | Error::Transport { remote_id, .. }
            | Error::Protocol { remote_id, .. }
            | Error::RequiresReplacement { remote_id, .. } => remote_id.as_deref(),
        }
    }

    /// HTTP status reported by the remote, when there was one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Conflict { status, .. } => Some(*status),
            Error::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Raw response body, when there was one.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::Conflict { body, .. } | Error::Protocol { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Attach a remote identifier if the error does not carry one yet.
    #[must_use]
    pub fn with_remote_id(mut self, id: &str) -> Self {
        match &mut self {
            Error::Conflict { remote_id, .. }
            | Error::Transport { remote_id, .. }
            | Error::Protocol { remote_id, .. }
            | Error::RequiresReplacement { remote_id, .. } => {
                if remote_id.is_none() {
                    *remote_id = Some(id.to_string());
                }
            }
            Error::Validation { .. } | Error::NotFound { .. } => {}
        }
        self
    }
}
