//! Comprobante emission state machine and document payloads.
//!
//! The lifecycle is `Pending -> Sent -> {Accepted, Rejected}`. The legal
//! transitions are enumerated in one place ([`ComprobanteStatus::can_transition`])
//! so illegal moves are rejected by construction rather than by scattered
//! `if` checks.

mod payload;
mod state;

pub use payload::{CustomerSnapshot, DocumentPayload};
pub use state::{ComprobanteStatus, InvalidTransition};
