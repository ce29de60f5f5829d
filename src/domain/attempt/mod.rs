//! Attempt aggregate - the per-flow request lifecycle.
//!
//! This module contains:
//! - Attempt types and states (typestate pattern)
//! - The flow-level state enum holding whichever attempt is current
//! - State transition methods

pub mod state;
pub mod transitions;

pub use state::*;
