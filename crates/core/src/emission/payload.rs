//! Document payload construction for authority submissions.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::document::{self, DocumentType};

/// Customer display fields captured at emission time.
///
/// The snapshot is immutable once written so the ledger stays stable for
/// audit even if the customer record later changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    /// Customer display name or razon social.
    pub name: String,
    /// Identity document kind (RUC, DNI, ...).
    pub document_type: String,
    /// Identity document number.
    pub document_number: String,
}

/// The document submitted to the tax authority.
///
/// Built from the reserved comprobante and the originating sale; the
/// derived fields (`serie_numero`, `igv`) are computed here so every
/// submission path shares one derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPayload {
    /// Document type.
    pub document_type: DocumentType,
    /// Series code (fixed per type).
    pub series: String,
    /// Reserved sequence number.
    pub sequence_number: i64,
    /// Display form, e.g. `"F001-00000001"`.
    pub serie_numero: String,
    /// Issue date of the underlying sale.
    pub issue_date: NaiveDate,
    /// Customer snapshot.
    pub customer: CustomerSnapshot,
    /// Sale total, tax inclusive.
    pub total: Decimal,
    /// Derived IGV amount.
    pub igv: Decimal,
}

impl DocumentPayload {
    /// Builds a payload for a reserved (series, sequence number) pair.
    #[must_use]
    pub fn build(
        document_type: DocumentType,
        sequence_number: i64,
        issue_date: NaiveDate,
        customer: CustomerSnapshot,
        total: Decimal,
    ) -> Self {
        let series = document_type.series().to_string();
        let serie_numero = document::format_serie_numero(&series, sequence_number);
        let igv = document::igv_amount(total);

        Self {
            document_type,
            series,
            sequence_number,
            serie_numero,
            issue_date,
            customer,
            total,
            igv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot() -> CustomerSnapshot {
        CustomerSnapshot {
            name: "ACME S.A.C.".to_string(),
            document_type: "RUC".to_string(),
            document_number: "20123456789".to_string(),
        }
    }

    #[test]
    fn test_build_derives_display_fields() {
        let payload = DocumentPayload::build(
            DocumentType::Invoice,
            1,
            NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            snapshot(),
            dec!(118.00),
        );

        assert_eq!(payload.series, "F001");
        assert_eq!(payload.serie_numero, "F001-00000001");
        assert_eq!(payload.igv, dec!(21.24));
        assert_eq!(payload.customer.name, "ACME S.A.C.");
    }

    #[test]
    fn test_build_uses_receipt_series() {
        let payload = DocumentPayload::build(
            DocumentType::Receipt,
            42,
            NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
            CustomerSnapshot {
                name: "Juan Perez".to_string(),
                document_type: "DNI".to_string(),
                document_number: "45678912".to_string(),
            },
            dec!(50.00),
        );

        assert_eq!(payload.series, "B001");
        assert_eq!(payload.serie_numero, "B001-00000042");
        assert_eq!(payload.igv, dec!(9.00));
    }
}
