//! Lifecycle types for quote and lead attempts.
//!
//! Each attempt progresses through distinct states, modelled with the typestate
//! pattern: an `Attempt<Pending>` can only be settled, and settling consumes it.
//! [`FlowState`] is the tagged union a flow actually stores, so impossible
//! combinations such as "loading and succeeded" cannot be represented.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{FlowError, ValidationError};

/// The two independent flows driven by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Quote,
    Lead,
}

impl Flow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::Quote => "quote",
            Flow::Lead => "lead",
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one attempt of one flow.
///
/// Sequence numbers increase monotonically per flow, so a settlement can be
/// matched against the attempt that is currently pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AttemptId {
    flow: Flow,
    seq: u64,
}

impl AttemptId {
    pub fn new(flow: Flow, seq: u64) -> Self {
        Self { flow, seq }
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.flow, self.seq)
    }
}

/// Marker trait for valid attempt states.
pub trait AttemptState: Send + Sync {}

/// One request attempt of a flow.
///
/// The generic parameter `T` represents the current state of the attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt<T: AttemptState> {
    pub id: AttemptId,
    pub state: T,
}

// ============================================================================
// Attempt States
// ============================================================================

/// Request issued, response not yet received.
#[derive(Debug, Clone, PartialEq)]
pub struct Pending {
    pub started_at: DateTime<Utc>,
}

impl AttemptState for Pending {}

/// Server accepted the request.
#[derive(Debug, Clone, PartialEq)]
pub struct Succeeded {
    pub started_at: DateTime<Utc>,
    pub settled_at: DateTime<Utc>,
}

impl AttemptState for Succeeded {}

/// Request failed in transport or was rejected by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Failed {
    pub error: FlowError,
    pub started_at: DateTime<Utc>,
    pub settled_at: DateTime<Utc>,
}

impl AttemptState for Failed {}

// ============================================================================
// Flow-level State
// ============================================================================

/// Current lifecycle of a flow.
///
/// `Invalid` is the settled state of a trigger that never got past validation:
/// no attempt id was allocated and nothing was sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FlowState {
    #[default]
    Idle,
    Invalid(ValidationError),
    Pending(Attempt<Pending>),
    Succeeded(Attempt<Succeeded>),
    Failed(Attempt<Failed>),
}

impl FlowState {
    /// Name of the current variant, for logs.
    pub fn variant(&self) -> &'static str {
        match self {
            FlowState::Idle => "Idle",
            FlowState::Invalid(_) => "Invalid",
            FlowState::Pending(_) => "Pending",
            FlowState::Succeeded(_) => "Succeeded",
            FlowState::Failed(_) => "Failed",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, FlowState::Pending(_))
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, FlowState::Succeeded(_))
    }

    /// Succeeded, failed, or rejected by validation.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            FlowState::Invalid(_) | FlowState::Succeeded(_) | FlowState::Failed(_)
        )
    }

    /// The error to show for this flow, if any.
    pub fn error(&self) -> Option<FlowError> {
        match self {
            FlowState::Invalid(err) => Some(FlowError::Validation(*err)),
            FlowState::Failed(attempt) => Some(attempt.state.error.clone()),
            _ => None,
        }
    }

    /// Id of the attempt this state belongs to, if one was issued.
    pub fn attempt_id(&self) -> Option<AttemptId> {
        match self {
            FlowState::Pending(attempt) => Some(attempt.id),
            FlowState::Succeeded(attempt) => Some(attempt.id),
            FlowState::Failed(attempt) => Some(attempt.id),
            FlowState::Idle | FlowState::Invalid(_) => None,
        }
    }

    /// True if `id` is the attempt currently awaiting its response.
    pub fn is_current(&self, id: AttemptId) -> bool {
        matches!(self, FlowState::Pending(attempt) if attempt.id == id)
    }
}

impl From<Attempt<Pending>> for FlowState {
    fn from(attempt: Attempt<Pending>) -> Self {
        FlowState::Pending(attempt)
    }
}

impl From<Attempt<Succeeded>> for FlowState {
    fn from(attempt: Attempt<Succeeded>) -> Self {
        FlowState::Succeeded(attempt)
    }
}

impl From<Attempt<Failed>> for FlowState {
    fn from(attempt: Attempt<Failed>) -> Self {
        FlowState::Failed(attempt)
    }
}
