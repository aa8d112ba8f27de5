//! Postgres enum mappings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fiscal document type (`document_type` enum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "document_type")]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// FACTURA.
    #[sea_orm(string_value = "invoice")]
    Invoice,
    /// BOLETA.
    #[sea_orm(string_value = "receipt")]
    Receipt,
}

/// Comprobante lifecycle status (`comprobante_status` enum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "comprobante_status")]
#[serde(rename_all = "lowercase")]
pub enum ComprobanteStatus {
    /// Number reserved, not yet submitted.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Submission attempted.
    #[sea_orm(string_value = "sent")]
    Sent,
    /// Accepted by the authority.
    #[sea_orm(string_value = "accepted")]
    Accepted,
    /// Rejected by the authority.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl From<emisor_core::document::DocumentType> for DocumentType {
    fn from(value: emisor_core::document::DocumentType) -> Self {
        match value {
            emisor_core::document::DocumentType::Invoice => Self::Invoice,
            emisor_core::document::DocumentType::Receipt => Self::Receipt,
        }
    }
}

impl From<DocumentType> for emisor_core::document::DocumentType {
    fn from(value: DocumentType) -> Self {
        match value {
            DocumentType::Invoice => Self::Invoice,
            DocumentType::Receipt => Self::Receipt,
        }
    }
}

impl From<emisor_core::emission::ComprobanteStatus> for ComprobanteStatus {
    fn from(value: emisor_core::emission::ComprobanteStatus) -> Self {
        match value {
            emisor_core::emission::ComprobanteStatus::Pending => Self::Pending,
            emisor_core::emission::ComprobanteStatus::Sent => Self::Sent,
            emisor_core::emission::ComprobanteStatus::Accepted => Self::Accepted,
            emisor_core::emission::ComprobanteStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<ComprobanteStatus> for emisor_core::emission::ComprobanteStatus {
    fn from(value: ComprobanteStatus) -> Self {
        match value {
            ComprobanteStatus::Pending => Self::Pending,
            ComprobanteStatus::Sent => Self::Sent,
            ComprobanteStatus::Accepted => Self::Accepted,
            ComprobanteStatus::Rejected => Self::Rejected,
        }
    }
}
