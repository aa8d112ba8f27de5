//! Comprobante persistence: sequence allocation, status transitions,
//! and artifact access.
//!
//! The allocator is the serialization point for the per-(type, series)
//! numbering space. Writers take a transaction-scoped advisory lock on
//! the numbering key, so concurrent allocations wait instead of burning
//! conflict retries; `max + 1` and the owning insert then commit
//! together. `uq_comprobantes_numbering` stays as the last line of
//! defense, and a loser of that race retries from a fresh read.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, FromQueryResult, QueryFilter, QuerySelect, Set, SqlErr, Statement,
    TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use emisor_core::document::{self, DocumentType};
use emisor_core::emission::{ComprobanteStatus, InvalidTransition};
use emisor_shared::AppError;

use crate::entities::{comprobantes, sales, sea_orm_active_enums};

/// Bounded retry budget for allocation conflicts. The advisory lock
/// turns contention into waiting, so hitting this budget means
/// something is systematically wrong, not a transient race.
const MAX_ALLOCATION_ATTEMPTS: u32 = 5;

/// Error types for comprobante persistence.
#[derive(Debug, thiserror::Error)]
pub enum ComprobanteError {
    /// The sale already owns a comprobante.
    #[error("Sale {0} already has an emitted comprobante")]
    AlreadyEmitted(Uuid),

    /// Allocation kept losing the race after the retry budget.
    #[error("Could not allocate a sequence number after {attempts} attempts")]
    AllocationContention {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// Comprobante not found.
    #[error("Comprobante not found: {0}")]
    NotFound(Uuid),

    /// Artifact requested before acceptance.
    #[error("Artifact for comprobante {0} is not ready")]
    ArtifactNotReady(Uuid),

    /// Illegal status transition.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ComprobanteError> for AppError {
    fn from(value: ComprobanteError) -> Self {
        match value {
            ComprobanteError::AlreadyEmitted(id) => Self::AlreadyEmitted(id),
            ComprobanteError::AllocationContention { attempts } => Self::Internal(format!(
                "sequence allocation contention persisted after {attempts} attempts"
            )),
            ComprobanteError::NotFound(id) => Self::ComprobanteNotFound(id),
            ComprobanteError::ArtifactNotReady(id) => Self::ArtifactNotReady(id),
            ComprobanteError::InvalidTransition(e) => Self::InvalidStateTransition {
                from: e.from.to_string(),
                to: e.to.to_string(),
            },
            ComprobanteError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Preview of the next number for a (type, series) pair.
///
/// Produced by [`ComprobanteRepository::peek_next`]; consumes nothing.
#[derive(Debug, Clone)]
pub struct NextNumber {
    /// Document type.
    pub document_type: DocumentType,
    /// Series code.
    pub series: String,
    /// Next sequence number (would-be, not reserved).
    pub sequence_number: i64,
    /// Zero-padded correlativo, e.g. `"00000004"`.
    pub correlativo: String,
    /// Display form, e.g. `"F001-00000004"`.
    pub serie_numero: String,
}

/// Comprobante repository.
#[derive(Debug, Clone)]
pub struct ComprobanteRepository {
    db: DatabaseConnection,
}

#[derive(Debug, FromQueryResult)]
struct MaxSequenceRow {
    max_seq: Option<i64>,
}

/// What a failed insert during allocation means.
enum InsertConflict {
    /// Lost the numbering race; safe to retry with a fresh read.
    Numbering,
    /// Another request emitted this sale first.
    Sale,
    /// Anything else; not retryable here.
    Other,
}

impl ComprobanteRepository {
    /// Creates a new comprobante repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Reserves the next sequence number for the sale's document type
    /// and creates the owning comprobante row in PENDING status.
    ///
    /// The read-max and the insert run in one transaction holding the
    /// numbering advisory lock: concurrent allocators queue on the lock
    /// rather than fight over the unique constraint. If the transaction
    /// fails, the number was never issued. Customer fields are
    /// snapshotted from the sale and immutable afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The sale already owns a comprobante (`AlreadyEmitted`)
    /// - Contention outlives the retry budget (`AllocationContention`)
    /// - The database operation fails
    pub async fn allocate(
        &self,
        sale: &sales::Model,
        document_type: DocumentType,
    ) -> Result<comprobantes::Model, ComprobanteError> {
        let series = document_type.series();

        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let txn = self.db.begin().await?;

            // Held until commit/rollback; serializes writers of this
            // (type, series) numbering space.
            txn.execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT pg_advisory_xact_lock($1)",
                [numbering_lock_key(document_type).into()],
            ))
            .await?;

            let sequence_number = self.next_sequence(&txn, document_type).await?;
            let now = Utc::now().into();

            let row = comprobantes::ActiveModel {
                id: Set(Uuid::new_v4()),
                sale_id: Set(sale.id),
                document_type: Set(document_type.into()),
                series: Set(series.to_string()),
                sequence_number: Set(sequence_number),
                status: Set(ComprobanteStatus::Pending.into()),
                sent_at: Set(None),
                artifact_xml: Set(None),
                rejection_reason: Set(None),
                customer_name: Set(sale.customer_name.clone()),
                customer_document_type: Set(sale.customer_document_type.clone()),
                customer_document_number: Set(sale.customer_document_number.clone()),
                total: Set(sale.total),
                issue_date: Set(sale.sale_date),
                created_at: Set(now),
                updated_at: Set(now),
            };

            match row.insert(&txn).await {
                Ok(model) => {
                    txn.commit().await?;
                    debug!(
                        sale_id = %sale.id,
                        serie_numero = %document::format_serie_numero(series, sequence_number),
                        attempt,
                        "Reserved sequence number"
                    );
                    return Ok(model);
                }
                Err(e) => {
                    let conflict = classify_insert_error(&e);
                    txn.rollback().await?;
                    match conflict {
                        InsertConflict::Numbering => {
                            debug!(
                                sale_id = %sale.id,
                                sequence_number,
                                attempt,
                                "Lost allocation race, retrying"
                            );
                        }
                        InsertConflict::Sale => {
                            return Err(ComprobanteError::AlreadyEmitted(sale.id));
                        }
                        InsertConflict::Other => return Err(e.into()),
                    }
                }
            }
        }

        Err(ComprobanteError::AllocationContention {
            attempts: MAX_ALLOCATION_ATTEMPTS,
        })
    }

    /// Previews the next number for a document type without reserving it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn peek_next(
        &self,
        document_type: DocumentType,
    ) -> Result<NextNumber, ComprobanteError> {
        let sequence_number = self.next_sequence(&self.db, document_type).await?;
        let series = document_type.series().to_string();

        Ok(NextNumber {
            document_type,
            serie_numero: document::format_serie_numero(&series, sequence_number),
            correlativo: document::format_correlativo(sequence_number),
            series,
            sequence_number,
        })
    }

    /// Computes `1 + max(sequence_number)` for the (type, series) pair.
    async fn next_sequence<C: ConnectionTrait>(
        &self,
        conn: &C,
        document_type: DocumentType,
    ) -> Result<i64, DbErr> {
        let row = comprobantes::Entity::find()
            .select_only()
            .column_as(comprobantes::Column::SequenceNumber.max(), "max_seq")
            .filter(
                comprobantes::Column::DocumentType
                    .eq(sea_orm_active_enums::DocumentType::from(document_type)),
            )
            .filter(comprobantes::Column::Series.eq(document_type.series()))
            .into_model::<MaxSequenceRow>()
            .one(conn)
            .await?;

        Ok(row.and_then(|r| r.max_seq).unwrap_or(0) + 1)
    }

    /// Finds a comprobante by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<comprobantes::Model>, DbErr> {
        comprobantes::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds the comprobante owned by a sale, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_sale(
        &self,
        sale_id: Uuid,
    ) -> Result<Option<comprobantes::Model>, DbErr> {
        comprobantes::Entity::find()
            .filter(comprobantes::Column::SaleId.eq(sale_id))
            .one(&self.db)
            .await
    }

    /// Marks a submission attempt: status becomes SENT and `sent_at` is
    /// refreshed. Legal from PENDING (first attempt) and from SENT
    /// (resend); the reserved sequence number is untouched.
    ///
    /// # Errors
    ///
    /// Returns an error on an illegal transition or database failure.
    pub async fn mark_sent(
        &self,
        comprobante: comprobantes::Model,
    ) -> Result<comprobantes::Model, ComprobanteError> {
        let id = comprobante.id;
        let expected = comprobante.status;
        let current: ComprobanteStatus = expected.into();
        current.ensure_transition(ComprobanteStatus::Sent)?;

        let now = Utc::now().into();
        let mut active: comprobantes::ActiveModel = comprobante.into();
        active.status = Set(ComprobanteStatus::Sent.into());
        active.sent_at = Set(Some(now));
        active.updated_at = Set(now);

        self.apply_transition(id, expected, active, ComprobanteStatus::Sent)
            .await
    }

    /// Persists acceptance: terminal ACCEPTED status plus the signed
    /// artifact. This is the only path that writes `artifact_xml`.
    ///
    /// # Errors
    ///
    /// Returns an error on an illegal transition or database failure.
    pub async fn mark_accepted(
        &self,
        comprobante: comprobantes::Model,
        artifact_xml: String,
    ) -> Result<comprobantes::Model, ComprobanteError> {
        let id = comprobante.id;
        let expected = comprobante.status;
        let current: ComprobanteStatus = expected.into();
        current.ensure_transition(ComprobanteStatus::Accepted)?;

        let mut active: comprobantes::ActiveModel = comprobante.into();
        active.status = Set(ComprobanteStatus::Accepted.into());
        active.artifact_xml = Set(Some(artifact_xml));
        active.updated_at = Set(Utc::now().into());

        self.apply_transition(id, expected, active, ComprobanteStatus::Accepted)
            .await
    }

    /// Persists rejection: terminal REJECTED status plus the reason.
    /// The sequence number stays consumed; it is never reused.
    ///
    /// # Errors
    ///
    /// Returns an error on an illegal transition or database failure.
    pub async fn mark_rejected(
        &self,
        comprobante: comprobantes::Model,
        reason: String,
    ) -> Result<comprobantes::Model, ComprobanteError> {
        let id = comprobante.id;
        let expected = comprobante.status;
        let current: ComprobanteStatus = expected.into();
        current.ensure_transition(ComprobanteStatus::Rejected)?;

        let mut active: comprobantes::ActiveModel = comprobante.into();
        active.status = Set(ComprobanteStatus::Rejected.into());
        active.rejection_reason = Set(Some(reason));
        active.updated_at = Set(Utc::now().into());

        self.apply_transition(id, expected, active, ComprobanteStatus::Rejected)
            .await
    }

    /// Applies a validated transition as a compare-and-set.
    ///
    /// The UPDATE lands only if the row still holds the status the
    /// caller saw, so a slower worker (including one in another
    /// process, where the in-flight guard cannot reach) can never
    /// overwrite an outcome that was persisted first. Zero affected
    /// rows means the row moved underneath us; the error reports the
    /// status it actually holds now.
    async fn apply_transition(
        &self,
        id: Uuid,
        expected: sea_orm_active_enums::ComprobanteStatus,
        active: comprobantes::ActiveModel,
        to: ComprobanteStatus,
    ) -> Result<comprobantes::Model, ComprobanteError> {
        let result = comprobantes::Entity::update_many()
            .set(active)
            .filter(comprobantes::Column::Id.eq(id))
            .filter(comprobantes::Column::Status.eq(expected))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            let from = self
                .find_by_id(id)
                .await?
                .ok_or(ComprobanteError::NotFound(id))?
                .status
                .into();
            return Err(InvalidTransition { from, to }.into());
        }

        self.find_by_id(id)
            .await?
            .ok_or(ComprobanteError::NotFound(id))
    }

    /// Retrieves the signed artifact for an accepted comprobante.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing comprobante and
    /// `ArtifactNotReady` when the document has not been accepted yet.
    pub async fn get_artifact(&self, id: Uuid) -> Result<String, ComprobanteError> {
        let comprobante = self
            .find_by_id(id)
            .await?
            .ok_or(ComprobanteError::NotFound(id))?;

        let status: ComprobanteStatus = comprobante.status.into();
        if status != ComprobanteStatus::Accepted {
            return Err(ComprobanteError::ArtifactNotReady(id));
        }

        comprobante
            .artifact_xml
            .ok_or(ComprobanteError::ArtifactNotReady(id))
    }
}

fn classify_insert_error(e: &DbErr) -> InsertConflict {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => {
            if message.contains("uq_comprobantes_sale") {
                InsertConflict::Sale
            } else {
                InsertConflict::Numbering
            }
        }
        _ => InsertConflict::Other,
    }
}

/// Advisory lock key for a (type, series) numbering space.
///
/// FNV-1a over the series tag: stable across processes, one key per
/// numbering space so invoices and receipts never block each other.
fn numbering_lock_key(document_type: DocumentType) -> i64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in document_type.series().bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    i64::from_ne_bytes(hash.to_ne_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbering_lock_keys_partition_by_series() {
        assert_eq!(
            numbering_lock_key(DocumentType::Invoice),
            numbering_lock_key(DocumentType::Invoice)
        );
        assert_ne!(
            numbering_lock_key(DocumentType::Invoice),
            numbering_lock_key(DocumentType::Receipt)
        );
    }
}
