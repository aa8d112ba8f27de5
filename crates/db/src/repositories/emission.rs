//! Emission coordinator: drives a comprobante through the state machine
//! against the store and the tax authority.
//!
//! Concurrency rules:
//! - at most one in-flight submission per sale/comprobante id; a second
//!   concurrent call is rejected, not queued
//! - SENT is persisted before the authority is invoked, so a crash or a
//!   transport failure can never leave an attempted submission looking
//!   un-attempted
//! - the allocator is called exactly once per logical emission; resend
//!   reuses the reserved number on every path

use std::sync::Arc;

use dashmap::DashMap;
use sea_orm::{DatabaseConnection, DbErr};
use tracing::{info, warn};
use uuid::Uuid;

use emisor_core::authority::{AuthorityClient, SubmissionOutcome};
use emisor_core::document::DocumentType;
use emisor_core::emission::{
    ComprobanteStatus, CustomerSnapshot, DocumentPayload, InvalidTransition,
};
use emisor_shared::AppError;

use super::comprobante::{ComprobanteError, ComprobanteRepository};
use super::sale::SaleRepository;
use crate::entities::comprobantes;

/// Error types for emission operations.
#[derive(Debug, thiserror::Error)]
pub enum EmissionError {
    /// Sale does not exist.
    #[error("Sale not found: {0}")]
    SaleNotFound(Uuid),

    /// Sale already owns a comprobante.
    #[error("Sale {0} already has an emitted comprobante")]
    AlreadyEmitted(Uuid),

    /// Another submission for this id is already running.
    #[error("A submission is already in flight for {0}")]
    InFlight(Uuid),

    /// Comprobante not found.
    #[error("Comprobante not found: {0}")]
    ComprobanteNotFound(Uuid),

    /// Illegal status transition (e.g. resend of a terminal document).
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// Allocation kept losing the race after the retry budget.
    #[error("Could not allocate a sequence number after {attempts} attempts")]
    AllocationContention {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// The authority could not be reached; the comprobante stays SENT
    /// and can be resent.
    #[error("Authority unreachable for comprobante {comprobante_id}: {detail}")]
    AuthorityUnreachable {
        /// The comprobante that keeps its reserved number.
        comprobante_id: Uuid,
        /// Transport-level detail.
        detail: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ComprobanteError> for EmissionError {
    fn from(value: ComprobanteError) -> Self {
        match value {
            ComprobanteError::AlreadyEmitted(id) => Self::AlreadyEmitted(id),
            ComprobanteError::AllocationContention { attempts } => {
                Self::AllocationContention { attempts }
            }
            ComprobanteError::NotFound(id) => Self::ComprobanteNotFound(id),
            // The coordinator never reads artifacts; treat it like a
            // transition fault if it ever surfaces here.
            ComprobanteError::ArtifactNotReady(id) => Self::ComprobanteNotFound(id),
            ComprobanteError::InvalidTransition(e) => Self::InvalidTransition(e),
            ComprobanteError::Database(e) => Self::Database(e),
        }
    }
}

impl From<EmissionError> for AppError {
    fn from(value: EmissionError) -> Self {
        match value {
            EmissionError::SaleNotFound(id) => Self::SaleNotFound(id),
            EmissionError::AlreadyEmitted(id) => Self::AlreadyEmitted(id),
            EmissionError::InFlight(id) => Self::EmissionInFlight(id),
            EmissionError::ComprobanteNotFound(id) => Self::ComprobanteNotFound(id),
            EmissionError::InvalidTransition(e) => Self::InvalidStateTransition {
                from: e.from.to_string(),
                to: e.to.to_string(),
            },
            EmissionError::AllocationContention { attempts } => Self::Internal(format!(
                "sequence allocation contention persisted after {attempts} attempts"
            )),
            EmissionError::AuthorityUnreachable {
                comprobante_id,
                detail,
            } => Self::AuthorityUnreachable {
                comprobante_id,
                detail,
            },
            EmissionError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Emission coordinator.
pub struct EmissionCoordinator {
    comprobantes: ComprobanteRepository,
    sales: SaleRepository,
    authority: Arc<dyn AuthorityClient>,
    in_flight: DashMap<Uuid, ()>,
}

impl EmissionCoordinator {
    /// Creates a coordinator over a connection pool and an authority client.
    #[must_use]
    pub fn new(db: DatabaseConnection, authority: Arc<dyn AuthorityClient>) -> Self {
        Self {
            comprobantes: ComprobanteRepository::new(db.clone()),
            sales: SaleRepository::new(db),
            authority,
            in_flight: DashMap::new(),
        }
    }

    /// Emits a comprobante for a sale.
    ///
    /// Validates the sale, derives the document type from the customer's
    /// identity document, reserves the next sequence number, and submits
    /// the document. On acceptance or rejection the returned model is
    /// terminal; on a transport failure the model stays SENT and the
    /// error carries its id for a later resend.
    ///
    /// # Errors
    ///
    /// Returns an error if validation, allocation, persistence, or the
    /// authority call fails.
    pub async fn emit(&self, sale_id: Uuid) -> Result<comprobantes::Model, EmissionError> {
        let _guard = self.begin_flight(sale_id)?;

        let sale = self
            .sales
            .find_by_id(sale_id)
            .await?
            .ok_or(EmissionError::SaleNotFound(sale_id))?;

        if self.comprobantes.find_by_sale(sale_id).await?.is_some() {
            return Err(EmissionError::AlreadyEmitted(sale_id));
        }

        let document_type = DocumentType::for_customer_document(&sale.customer_document_type);
        let comprobante = self.comprobantes.allocate(&sale, document_type).await?;

        // Register the new comprobante id as well: once the row is
        // visible a resend could race this submission, and it must see
        // the document as in flight rather than submit a second time.
        let _comprobante_guard = self.begin_flight(comprobante.id)?;

        info!(
            %sale_id,
            comprobante_id = %comprobante.id,
            serie = %comprobante.series,
            numero = comprobante.sequence_number,
            tipo = %document_type,
            "Comprobante created, submitting"
        );

        self.submit(comprobante).await
    }

    /// Re-submits a comprobante stuck in SENT.
    ///
    /// Permitted only from SENT; the reserved sequence number is reused,
    /// never re-allocated. Resending a terminal document fails with an
    /// invalid-transition error.
    ///
    /// # Errors
    ///
    /// Returns an error if the comprobante is missing, not in SENT, or
    /// the authority call fails again.
    pub async fn resend(
        &self,
        comprobante_id: Uuid,
    ) -> Result<comprobantes::Model, EmissionError> {
        let _guard = self.begin_flight(comprobante_id)?;

        let comprobante = self
            .comprobantes
            .find_by_id(comprobante_id)
            .await?
            .ok_or(EmissionError::ComprobanteNotFound(comprobante_id))?;

        let status: ComprobanteStatus = comprobante.status.into();
        if status != ComprobanteStatus::Sent {
            return Err(InvalidTransition {
                from: status,
                to: ComprobanteStatus::Sent,
            }
            .into());
        }

        info!(
            %comprobante_id,
            serie = %comprobante.series,
            numero = comprobante.sequence_number,
            "Resending comprobante"
        );

        self.submit(comprobante).await
    }

    /// Persists SENT, invokes the authority, and persists the outcome.
    async fn submit(
        &self,
        comprobante: comprobantes::Model,
    ) -> Result<comprobantes::Model, EmissionError> {
        // SENT is recorded before the call: the submission was attempted
        // even if the transport fails mid-flight.
        let comprobante = self.comprobantes.mark_sent(comprobante).await?;
        let payload = build_payload(&comprobante);

        match self.authority.submit(&payload).await {
            Ok(SubmissionOutcome::Accepted {
                artifact_xml,
                tracking_id,
            }) => {
                info!(
                    comprobante_id = %comprobante.id,
                    serie_numero = %payload.serie_numero,
                    tracking_id = tracking_id.as_deref().unwrap_or("-"),
                    "Comprobante accepted"
                );
                Ok(self
                    .comprobantes
                    .mark_accepted(comprobante, artifact_xml)
                    .await?)
            }
            Ok(SubmissionOutcome::Rejected { reason }) => {
                warn!(
                    comprobante_id = %comprobante.id,
                    serie_numero = %payload.serie_numero,
                    %reason,
                    "Comprobante rejected"
                );
                Ok(self.comprobantes.mark_rejected(comprobante, reason).await?)
            }
            Err(e) => {
                // Never revert to PENDING (risks re-allocating a number)
                // and never fabricate acceptance: the row stays SENT.
                warn!(
                    comprobante_id = %comprobante.id,
                    error = %e,
                    "Authority unreachable, comprobante stays sent"
                );
                Err(EmissionError::AuthorityUnreachable {
                    comprobante_id: comprobante.id,
                    detail: e.to_string(),
                })
            }
        }
    }

    /// Registers an in-flight submission for `key`, rejecting overlap.
    fn begin_flight(&self, key: Uuid) -> Result<FlightGuard<'_>, EmissionError> {
        use dashmap::mapref::entry::Entry;

        match self.in_flight.entry(key) {
            Entry::Occupied(_) => Err(EmissionError::InFlight(key)),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(FlightGuard {
                    map: &self.in_flight,
                    key,
                })
            }
        }
    }
}

/// Clears the in-flight mark on every exit path.
struct FlightGuard<'a> {
    map: &'a DashMap<Uuid, ()>,
    key: Uuid,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.map.remove(&self.key);
    }
}

/// Builds the submission payload from the reserved comprobante snapshot.
fn build_payload(comprobante: &comprobantes::Model) -> DocumentPayload {
    DocumentPayload::build(
        comprobante.document_type.into(),
        comprobante.sequence_number,
        comprobante.issue_date,
        CustomerSnapshot {
            name: comprobante.customer_name.clone(),
            document_type: comprobante.customer_document_type.clone(),
            document_number: comprobante.customer_document_number.clone(),
        },
        comprobante.total,
    )
}
