//! Application-wide error types.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Every variant carries a stable machine-readable kind (see
/// [`AppError::error_code`]) so clients can distinguish retryable
/// failures from terminal ones.
#[derive(Debug, Error)]
pub enum AppError {
    /// Document type string is not FACTURA or BOLETA.
    #[error("Invalid document type: {0}")]
    InvalidDocumentType(String),

    /// Request parameters failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Sale does not exist.
    #[error("Sale not found: {0}")]
    SaleNotFound(Uuid),

    /// Comprobante does not exist.
    #[error("Comprobante not found: {0}")]
    ComprobanteNotFound(Uuid),

    /// Sale already has a comprobante.
    #[error("Sale {0} already has an emitted comprobante")]
    AlreadyEmitted(Uuid),

    /// A submission for this comprobante or sale is already running.
    #[error("A submission is already in flight for {0}")]
    EmissionInFlight(Uuid),

    /// Illegal status transition.
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// Artifact requested before the comprobante was accepted.
    #[error("Artifact for comprobante {0} is not ready")]
    ArtifactNotReady(Uuid),

    /// Tax authority could not be reached; the comprobante stays SENT.
    #[error("Tax authority unreachable for comprobante {comprobante_id}: {detail}")]
    AuthorityUnreachable {
        /// Comprobante that keeps its reserved number and can be resent.
        comprobante_id: Uuid,
        /// Transport-level detail.
        detail: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidDocumentType(_) | Self::Validation(_) => 400,
            Self::SaleNotFound(_) | Self::ComprobanteNotFound(_) => 404,
            Self::AlreadyEmitted(_) | Self::EmissionInFlight(_) => 409,
            Self::InvalidStateTransition { .. } | Self::ArtifactNotReady(_) => 422,
            Self::AuthorityUnreachable { .. } => 502,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDocumentType(_) => "INVALID_DOCUMENT_TYPE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::SaleNotFound(_) => "SALE_NOT_FOUND",
            Self::ComprobanteNotFound(_) => "COMPROBANTE_NOT_FOUND",
            Self::AlreadyEmitted(_) => "ALREADY_EMITTED",
            Self::EmissionInFlight(_) => "EMISSION_IN_FLIGHT",
            Self::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::ArtifactNotReady(_) => "ARTIFACT_NOT_READY",
            Self::AuthorityUnreachable { .. } => "AUTHORITY_UNREACHABLE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the client may retry the operation (via resend).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::AuthorityUnreachable { .. } | Self::EmissionInFlight(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let id = Uuid::new_v4();
        assert_eq!(AppError::InvalidDocumentType(String::new()).status_code(), 400);
        assert_eq!(AppError::Validation(String::new()).status_code(), 400);
        assert_eq!(AppError::SaleNotFound(id).status_code(), 404);
        assert_eq!(AppError::ComprobanteNotFound(id).status_code(), 404);
        assert_eq!(AppError::AlreadyEmitted(id).status_code(), 409);
        assert_eq!(AppError::EmissionInFlight(id).status_code(), 409);
        assert_eq!(
            AppError::InvalidStateTransition {
                from: "accepted".into(),
                to: "sent".into(),
            }
            .status_code(),
            422
        );
        assert_eq!(AppError::ArtifactNotReady(id).status_code(), 422);
        assert_eq!(
            AppError::AuthorityUnreachable {
                comprobante_id: id,
                detail: String::new(),
            }
            .status_code(),
            502
        );
        assert_eq!(AppError::Database(String::new()).status_code(), 500);
        assert_eq!(AppError::Internal(String::new()).status_code(), 500);
    }

    #[test]
    fn test_error_codes_are_stable() {
        let id = Uuid::new_v4();
        assert_eq!(
            AppError::InvalidDocumentType(String::new()).error_code(),
            "INVALID_DOCUMENT_TYPE"
        );
        assert_eq!(AppError::SaleNotFound(id).error_code(), "SALE_NOT_FOUND");
        assert_eq!(AppError::AlreadyEmitted(id).error_code(), "ALREADY_EMITTED");
        assert_eq!(
            AppError::ArtifactNotReady(id).error_code(),
            "ARTIFACT_NOT_READY"
        );
        assert_eq!(
            AppError::AuthorityUnreachable {
                comprobante_id: id,
                detail: String::new(),
            }
            .error_code(),
            "AUTHORITY_UNREACHABLE"
        );
    }

    #[test]
    fn test_retryable_flags() {
        let id = Uuid::new_v4();
        assert!(
            AppError::AuthorityUnreachable {
                comprobante_id: id,
                detail: "timeout".into(),
            }
            .is_retryable()
        );
        assert!(AppError::EmissionInFlight(id).is_retryable());
        assert!(!AppError::AlreadyEmitted(id).is_retryable());
        assert!(
            !AppError::InvalidStateTransition {
                from: "rejected".into(),
                to: "sent".into(),
            }
            .is_retryable()
        );
    }
}
