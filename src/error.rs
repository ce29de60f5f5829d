//! Error types for the quote and lead flows.
//!
//! Two layers live here. [`FlowError`] is the error *kind* recorded in a flow's
//! lifecycle and is what the presentation layer renders. [`AfriShipError`] is the
//! crate-wide error returned from fallible operations; it wraps a [`FlowError`]
//! when a flow settles badly and adds the controller-level conditions (busy,
//! shut down, bad configuration).

use serde::Serialize;
use thiserror::Error;

use crate::domain::attempt::Flow;

/// Result type alias using the crate error type.
pub type Result<T> = std::result::Result<T, AfriShipError>;

/// Form field a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Weight,
    PackageType,
    Email,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Weight => "weight",
            Field::PackageType => "package_type",
            Field::Email => "email",
        }
    }
}

/// Client-side validation failure. Raised before any network call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Weight is empty, non-numeric, or not strictly positive.
    #[error("invalid weight")]
    InvalidWeight,

    /// No package type selected.
    #[error("missing package type")]
    MissingPackageType,

    /// Email is empty or has no '@'.
    #[error("invalid email")]
    InvalidEmail,
}

impl ValidationError {
    /// The form field this error refers to.
    pub fn field(&self) -> Field {
        match self {
            ValidationError::InvalidWeight => Field::Weight,
            ValidationError::MissingPackageType => Field::PackageType,
            ValidationError::InvalidEmail => Field::Email,
        }
    }
}

/// Why a flow ended up without a result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    /// Input rejected locally; no request was issued.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Server unreachable, request timed out, or the reply could not be understood.
    #[error("cannot reach server: {0}")]
    Transport(String),

    /// Server answered with a non-success status.
    ///
    /// `message` carries the server-supplied reason when there was one.
    #[error("server rejected request with status {status}")]
    Server { status: u16, message: Option<String> },
}

impl FlowError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowError::Validation(_) => "validation",
            FlowError::Transport(_) => "transport",
            FlowError::Server { .. } => "server",
        }
    }
}

/// Main error type for the controller.
#[derive(Error, Debug)]
pub enum AfriShipError {
    /// A flow settled (or was rejected) with an error.
    #[error(transparent)]
    Flow(#[from] FlowError),

    /// The flow already has a request in flight; the trigger is disabled.
    #[error("{0} request already in flight")]
    Busy(Flow),

    /// The controller was torn down; results are no longer applied.
    #[error("controller is shut down")]
    Shutdown,

    /// A newer attempt replaced this one before it settled.
    #[error("{0} attempt was superseded")]
    Superseded(Flow),

    /// Configuration could not be used (e.g. malformed base URL).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP client error
    #[error("HTTP request failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// General error from anyhow
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ValidationError> for AfriShipError {
    fn from(err: ValidationError) -> Self {
        AfriShipError::Flow(FlowError::Validation(err))
    }
}

impl AfriShipError {
    /// The flow error behind this error, if it is one.
    pub fn flow_error(&self) -> Option<&FlowError> {
        match self {
            AfriShipError::Flow(err) => Some(err),
            _ => None,
        }
    }

    /// The validation error behind this error, if it is one.
    pub fn validation_error(&self) -> Option<ValidationError> {
        match self {
            AfriShipError::Flow(FlowError::Validation(err)) => Some(*err),
            _ => None,
        }
    }
}
