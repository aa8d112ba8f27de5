//! Core business logic for Emisor.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `document` - Document types, series mapping, and fiscal derivations
//! - `emission` - Comprobante status state machine and document payloads
//! - `authority` - Tax authority submission capability

pub mod authority;
pub mod document;
pub mod emission;
