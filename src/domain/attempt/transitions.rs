//! State transitions for flow attempts.
//!
//! ```text
//!                   ┌──reject()──> FlowState::Invalid          (validation failed, nothing sent)
//! FlowState ────────┤
//!                   └──begin()───> Attempt<Pending> ──succeed()──> Attempt<Succeeded>
//!                                        │
//!                                        └──fail()─────> Attempt<Failed>
//! ```
//!
//! Settlements are matched by [`AttemptId`]: [`FlowState::settle`] only
//! applies a result if its attempt is still the flow's pending one. Anything
//! else is a stale response and is dropped.

use chrono::Utc;
use metrics::counter;

use crate::error::{FlowError, ValidationError};

use super::state::{Attempt, AttemptId, Failed, Flow, FlowState, Pending, Succeeded};

impl Attempt<Pending> {
    pub fn start(id: AttemptId) -> Self {
        counter!("afriship_flow_attempts_total", "flow" => id.flow().as_str()).increment(1);
        Attempt {
            id,
            state: Pending {
                started_at: Utc::now(),
            },
        }
    }

    pub fn succeed(self) -> Attempt<Succeeded> {
        counter!(
            "afriship_flow_settlements_total",
            "flow" => self.id.flow().as_str(),
            "outcome" => "success"
        )
        .increment(1);
        Attempt {
            id: self.id,
            state: Succeeded {
                started_at: self.state.started_at,
                settled_at: Utc::now(),
            },
        }
    }

    pub fn fail(self, error: FlowError) -> Attempt<Failed> {
        counter!(
            "afriship_flow_settlements_total",
            "flow" => self.id.flow().as_str(),
            "outcome" => error.kind()
        )
        .increment(1);
        Attempt {
            id: self.id,
            state: Failed {
                error,
                started_at: self.state.started_at,
                settled_at: Utc::now(),
            },
        }
    }
}

impl FlowState {
    /// Record a validation failure. Replaces whatever outcome was shown before.
    pub fn reject(&mut self, flow: Flow, error: ValidationError) {
        counter!(
            "afriship_flow_validation_failures_total",
            "flow" => flow.as_str(),
            "field" => error.field().as_str()
        )
        .increment(1);
        tracing::debug!(
            flow = %flow,
            field = error.field().as_str(),
            previous = self.variant(),
            "Input rejected before sending"
        );
        *self = FlowState::Invalid(error);
    }

    /// Enter `Pending` for a freshly allocated attempt.
    pub fn begin(&mut self, id: AttemptId) {
        tracing::info!(attempt = %id, previous = self.variant(), "Attempt started");
        *self = Attempt::start(id).into();
    }

    /// Apply the outcome of attempt `id`.
    ///
    /// Returns `false` and leaves the state untouched if `id` is not the
    /// attempt currently pending.
    pub fn settle(&mut self, id: AttemptId, outcome: Result<(), FlowError>) -> bool {
        let attempt = match std::mem::take(self) {
            FlowState::Pending(attempt) if attempt.id == id => attempt,
            other => {
                counter!("afriship_flow_discarded_total", "flow" => id.flow().as_str())
                    .increment(1);
                tracing::warn!(
                    attempt = %id,
                    current = other.variant(),
                    current_attempt = ?other.attempt_id(),
                    "Discarding stale settlement"
                );
                *self = other;
                return false;
            }
        };

        let elapsed_ms = (Utc::now() - attempt.state.started_at).num_milliseconds();
        *self = match outcome {
            Ok(()) => {
                tracing::info!(attempt = %id, elapsed_ms, "Attempt succeeded");
                attempt.succeed().into()
            }
            Err(error) => {
                tracing::info!(
                    attempt = %id,
                    elapsed_ms,
                    kind = error.kind(),
                    error = %error,
                    "Attempt failed"
                );
                attempt.fail(error).into()
            }
        };
        true
    }
}
