//! Core domain types for the quote and lead flows.
//!
//! This module contains pure domain types with no I/O:
//! - Shared form state and the package catalogue
//! - Wire payloads for the two endpoints
//! - The per-flow attempt lifecycle

pub mod attempt;
pub mod form;
pub mod payload;
