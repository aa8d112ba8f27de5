//! API route definitions.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;

use emisor_shared::AppError;

use crate::AppState;

pub mod comprobantes;
pub mod health;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(comprobantes::routes())
}

/// Maps an application error onto the response envelope.
///
/// Every error body carries a stable `code`, a human-readable message,
/// and a `retryable` flag; transport failures against the authority
/// additionally expose the comprobante id so clients can resend.
pub(crate) fn error_response(error: &AppError) -> Response {
    let status = StatusCode::from_u16(error.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut body = json!({
        "success": false,
        "error": {
            "code": error.error_code(),
            "message": error.to_string(),
            "retryable": error.is_retryable(),
        }
    });
    if let AppError::AuthorityUnreachable { comprobante_id, .. } = error {
        body["error"]["comprobante_id"] = json!(comprobante_id);
    }

    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_response_status_mapping() {
        let id = Uuid::new_v4();

        let cases = [
            (AppError::InvalidDocumentType("NOTA".into()), 400),
            (AppError::SaleNotFound(id), 404),
            (AppError::AlreadyEmitted(id), 409),
            (AppError::EmissionInFlight(id), 409),
            (
                AppError::InvalidStateTransition {
                    from: "rejected".into(),
                    to: "sent".into(),
                },
                422,
            ),
            (AppError::ArtifactNotReady(id), 422),
            (
                AppError::AuthorityUnreachable {
                    comprobante_id: id,
                    detail: "timeout".into(),
                },
                502,
            ),
            (AppError::Internal("boom".into()), 500),
        ];

        for (error, expected) in cases {
            let response = error_response(&error);
            assert_eq!(
                response.status().as_u16(),
                expected,
                "wrong status for {}",
                error.error_code()
            );
        }
    }
}
