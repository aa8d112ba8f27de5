//! Comprobante emission and ledger routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use emisor_core::document::{self, DocumentType};
use emisor_core::emission::ComprobanteStatus;
use emisor_db::ComprobanteRepository;
use emisor_db::entities::comprobantes;
use emisor_db::repositories::ledger::{ComprobanteFilter, LedgerQuery};
use emisor_shared::AppError;
use emisor_shared::types::{PageRequest, PageResponse};

use crate::{AppState, routes::error_response};

/// Creates the comprobante routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/comprobantes", get(list_comprobantes))
        .route("/comprobantes/emitir/{sale_id}", post(emit_comprobante))
        .route("/comprobantes/siguiente-numero", post(next_number))
        .route("/comprobantes/{id}", get(get_comprobante))
        .route("/comprobantes/{id}/reenviar", post(resend_comprobante))
        .route("/comprobantes/{id}/xml", get(download_artifact))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing comprobantes.
#[derive(Debug, Deserialize)]
pub struct ListComprobantesQuery {
    /// Filter by document type (`FACTURA` | `BOLETA`).
    pub tipo: Option<String>,
    /// Filter by status (`pending` | `sent` | `accepted` | `rejected`).
    pub estado: Option<String>,
    /// Inclusive lower bound on the submission date (YYYY-MM-DD).
    pub fecha_desde: Option<NaiveDate>,
    /// Inclusive upper bound on the submission date (YYYY-MM-DD).
    pub fecha_hasta: Option<NaiveDate>,
    /// Substring search over customer name and serie-numero.
    pub search: Option<String>,
    /// Page number (1-indexed).
    pub pagina: Option<u64>,
    /// Page size.
    pub limite: Option<u64>,
}

/// Request body for previewing the next number.
#[derive(Debug, Deserialize)]
pub struct NextNumberRequest {
    /// Document type (`FACTURA` | `BOLETA`).
    pub tipo: String,
}

/// Response for a comprobante, snapshot plus derived fields.
#[derive(Debug, Serialize)]
pub struct ComprobanteResponse {
    /// Comprobante ID.
    pub id: Uuid,
    /// Owning sale ID.
    pub sale_id: Uuid,
    /// Document type (`FACTURA` | `BOLETA`).
    pub tipo: &'static str,
    /// Series code.
    pub serie: String,
    /// Sequence number.
    pub numero: i64,
    /// Zero-padded sequence number.
    pub correlativo: String,
    /// Display form, e.g. `F001-00000001`.
    pub serie_numero: String,
    /// Lifecycle status.
    pub estado: &'static str,
    /// Customer name snapshot.
    pub customer_name: String,
    /// Customer identity document type snapshot.
    pub customer_document_type: String,
    /// Customer identity document number snapshot.
    pub customer_document_number: String,
    /// Sale total.
    pub total: Decimal,
    /// IGV derived from the total (presentation only, never stored).
    pub igv: Decimal,
    /// Issue date.
    pub issue_date: String,
    /// First submission attempt timestamp.
    pub sent_at: Option<String>,
    /// Rejection reason, for rejected documents.
    pub rejection_reason: Option<String>,
    /// Whether the signed artifact can be downloaded.
    pub artifact_available: bool,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<comprobantes::Model> for ComprobanteResponse {
    fn from(model: comprobantes::Model) -> Self {
        let document_type: DocumentType = model.document_type.into();
        let status: ComprobanteStatus = model.status.into();

        Self {
            id: model.id,
            sale_id: model.sale_id,
            tipo: document_type.as_str(),
            correlativo: document::format_correlativo(model.sequence_number),
            serie_numero: document::format_serie_numero(&model.series, model.sequence_number),
            serie: model.series,
            numero: model.sequence_number,
            estado: status.as_str(),
            customer_name: model.customer_name,
            customer_document_type: model.customer_document_type,
            customer_document_number: model.customer_document_number,
            total: model.total,
            igv: document::igv_amount(model.total),
            issue_date: model.issue_date.to_string(),
            sent_at: model.sent_at.map(|t| t.to_rfc3339()),
            rejection_reason: model.rejection_reason,
            artifact_available: status == ComprobanteStatus::Accepted
                && model.artifact_xml.is_some(),
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/comprobantes/emitir/{sale_id}` - Emit a comprobante for a sale.
async fn emit_comprobante(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> Response {
    match state.coordinator.emit(sale_id).await {
        Ok(model) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "comprobante": ComprobanteResponse::from(model)
            })),
        )
            .into_response(),
        Err(e) => {
            let error = AppError::from(e);
            if error.status_code() >= 500 {
                error!(%sale_id, error = %error, "Emission failed");
            }
            error_response(&error)
        }
    }
}

/// POST `/comprobantes/{id}/reenviar` - Resend a comprobante stuck in SENT.
async fn resend_comprobante(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.coordinator.resend(id).await {
        Ok(model) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "comprobante": ComprobanteResponse::from(model)
            })),
        )
            .into_response(),
        Err(e) => {
            let error = AppError::from(e);
            if error.status_code() >= 500 {
                error!(comprobante_id = %id, error = %error, "Resend failed");
            }
            error_response(&error)
        }
    }
}

/// GET `/comprobantes` - List comprobantes with filters and pagination.
async fn list_comprobantes(
    State(state): State<AppState>,
    Query(query): Query<ListComprobantesQuery>,
) -> Response {
    let filter = match build_filter(&query) {
        Ok(filter) => filter,
        Err(e) => return error_response(&e),
    };
    let page = PageRequest {
        page: query.pagina.unwrap_or(1).max(1),
        per_page: query.limite.unwrap_or(10),
    };

    let ledger = LedgerQuery::new((*state.db).clone());
    match ledger.list(&filter, &page).await {
        Ok(result) => {
            let items: Vec<ComprobanteResponse> = result
                .items
                .into_iter()
                .map(ComprobanteResponse::from)
                .collect();
            let body = PageResponse::new(items, page.page, page.limit(), result.total);

            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "comprobantes": body.data,
                    "meta": body.meta
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list comprobantes");
            error_response(&AppError::Database(e.to_string()))
        }
    }
}

/// GET `/comprobantes/{id}` - Comprobante detail.
async fn get_comprobante(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let repo = ComprobanteRepository::new((*state.db).clone());

    match repo.find_by_id(id).await {
        Ok(Some(model)) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "comprobante": ComprobanteResponse::from(model)
            })),
        )
            .into_response(),
        Ok(None) => error_response(&AppError::ComprobanteNotFound(id)),
        Err(e) => {
            error!(comprobante_id = %id, error = %e, "Failed to load comprobante");
            error_response(&AppError::Database(e.to_string()))
        }
    }
}

/// GET `/comprobantes/{id}/xml` - Download the signed artifact.
async fn download_artifact(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let repo = ComprobanteRepository::new((*state.db).clone());

    match repo.get_artifact(id).await {
        Ok(xml) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/xml".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"comprobante-{id}.xml\""),
                ),
            ],
            xml,
        )
            .into_response(),
        Err(e) => error_response(&e.into()),
    }
}

/// POST `/comprobantes/siguiente-numero` - Preview the next number without
/// consuming it.
async fn next_number(
    State(state): State<AppState>,
    Json(payload): Json<NextNumberRequest>,
) -> Response {
    let document_type = match DocumentType::parse(&payload.tipo) {
        Ok(t) => t,
        Err(e) => return error_response(&AppError::InvalidDocumentType(e.0)),
    };

    let repo = ComprobanteRepository::new((*state.db).clone());
    match repo.peek_next(document_type).await {
        Ok(next) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "tipo": next.document_type.as_str(),
                "serie": next.series,
                "numero": next.sequence_number,
                "correlativo": next.correlativo,
                "serie_numero": next.serie_numero
            })),
        )
            .into_response(),
        Err(e) => {
            error!(tipo = %document_type, error = %e, "Failed to preview next number");
            error_response(&e.into())
        }
    }
}

/// Validates and converts the raw query parameters into a ledger filter.
fn build_filter(query: &ListComprobantesQuery) -> Result<ComprobanteFilter, AppError> {
    let document_type = query
        .tipo
        .as_deref()
        .map(DocumentType::parse)
        .transpose()
        .map_err(|e| AppError::InvalidDocumentType(e.0))?;

    let status = query
        .estado
        .as_deref()
        .map(|s| {
            ComprobanteStatus::parse(s)
                .ok_or_else(|| AppError::Validation(format!("Unknown status: {s}")))
        })
        .transpose()?;

    if let (Some(from), Some(to)) = (query.fecha_desde, query.fecha_hasta) {
        if from > to {
            return Err(AppError::Validation(
                "fecha_desde must not be after fecha_hasta".to_string(),
            ));
        }
    }

    Ok(ComprobanteFilter {
        document_type,
        status,
        date_from: query.fecha_desde,
        date_to: query.fecha_hasta,
        search: query
            .search
            .clone()
            .filter(|s| !s.trim().is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use emisor_db::entities::sea_orm_active_enums;
    use rust_decimal_macros::dec;

    fn sample_model() -> comprobantes::Model {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap().into();
        comprobantes::Model {
            id: Uuid::new_v4(),
            sale_id: Uuid::new_v4(),
            document_type: sea_orm_active_enums::DocumentType::Invoice,
            series: "F001".to_string(),
            sequence_number: 7,
            status: sea_orm_active_enums::ComprobanteStatus::Accepted,
            sent_at: Some(now),
            artifact_xml: Some("<Invoice/>".to_string()),
            rejection_reason: None,
            customer_name: "ACME SAC".to_string(),
            customer_document_type: "RUC".to_string(),
            customer_document_number: "20123456789".to_string(),
            total: dec!(118.00),
            issue_date: chrono::NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_response_derives_display_fields() {
        let response = ComprobanteResponse::from(sample_model());

        assert_eq!(response.tipo, "FACTURA");
        assert_eq!(response.serie, "F001");
        assert_eq!(response.numero, 7);
        assert_eq!(response.correlativo, "00000007");
        assert_eq!(response.serie_numero, "F001-00000007");
        assert_eq!(response.estado, "accepted");
        assert_eq!(response.igv, dec!(21.24));
        assert!(response.artifact_available);
    }

    #[test]
    fn test_artifact_not_available_before_acceptance() {
        let mut model = sample_model();
        model.status = sea_orm_active_enums::ComprobanteStatus::Sent;
        model.artifact_xml = None;

        let response = ComprobanteResponse::from(model);
        assert_eq!(response.estado, "sent");
        assert!(!response.artifact_available);
    }

    #[test]
    fn test_build_filter_parses_wire_names() {
        let query = ListComprobantesQuery {
            tipo: Some("boleta".to_string()),
            estado: Some("ACCEPTED".to_string()),
            fecha_desde: None,
            fecha_hasta: None,
            search: Some("  ".to_string()),
            pagina: None,
            limite: None,
        };

        let filter = build_filter(&query).unwrap();
        assert_eq!(filter.document_type, Some(DocumentType::Receipt));
        assert_eq!(filter.status, Some(ComprobanteStatus::Accepted));
        // Blank search collapses to no filter
        assert_eq!(filter.search, None);
    }

    #[test]
    fn test_build_filter_rejects_bad_input() {
        let query = ListComprobantesQuery {
            tipo: Some("NOTA_CREDITO".to_string()),
            estado: None,
            fecha_desde: None,
            fecha_hasta: None,
            search: None,
            pagina: None,
            limite: None,
        };
        assert!(matches!(
            build_filter(&query),
            Err(AppError::InvalidDocumentType(_))
        ));

        let query = ListComprobantesQuery {
            tipo: None,
            estado: None,
            fecha_desde: chrono::NaiveDate::from_ymd_opt(2026, 3, 2),
            fecha_hasta: chrono::NaiveDate::from_ymd_opt(2026, 3, 1),
            search: None,
            pagina: None,
            limite: None,
        };
        assert!(matches!(build_filter(&query), Err(AppError::Validation(_))));
    }
}
