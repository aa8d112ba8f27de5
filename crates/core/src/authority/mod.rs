//! Tax authority submission capability.
//!
//! The authority is an opaque external service that legally validates
//! comprobantes. Everything behind [`AuthorityClient`] is exchangeable:
//! the production implementation is [`SunatClient`], tests script their
//! own impls.

mod sunat;

pub use sunat::SunatClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::emission::DocumentPayload;

/// Outcome of a submission the authority actually answered.
///
/// Rejection is a terminal business outcome, not a transport error: the
/// comprobante keeps its sequence number forever either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Document accepted; the signed artifact is returned.
    Accepted {
        /// Signed XML artifact.
        artifact_xml: String,
        /// Authority-side tracking identifier, when provided.
        tracking_id: Option<String>,
    },
    /// Document rejected with a reason.
    Rejected {
        /// Human-readable rejection reason.
        reason: String,
    },
}

/// Errors raised by the authority capability.
#[derive(Debug, Error)]
pub enum AuthorityError {
    /// Transport-level failure (timeout, connect, 5xx). The submission
    /// may or may not have been received; the caller must keep the
    /// comprobante in SENT and retry via resend.
    #[error("Authority unreachable: {0}")]
    Unreachable(String),

    /// The authority answered with something we cannot interpret.
    /// Treated like a transport failure: never fabricate acceptance.
    #[error("Uninterpretable authority response: {0}")]
    InvalidResponse(String),
}

/// The external tax-validation capability.
#[async_trait]
pub trait AuthorityClient: Send + Sync {
    /// Submits a document for legal validation.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError`] only for transport-level or protocol
    /// failures; an in-band rejection is an `Ok(SubmissionOutcome::Rejected)`.
    async fn submit(&self, payload: &DocumentPayload) -> Result<SubmissionOutcome, AuthorityError>;
}
