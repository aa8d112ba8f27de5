//! Document types, series mapping, and fiscal derivations.
//!
//! A comprobante is either an invoice (FACTURA) or a receipt (BOLETA).
//! The series is fixed per document type and never user-supplied; the
//! sequence number is zero-padded to 8 digits in all display contexts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// IGV (sales tax) rate applied over sale totals.
pub const IGV_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);

/// Width of the zero-padded sequence number in display form.
pub const SEQUENCE_PAD_WIDTH: usize = 8;

/// Fiscal document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentType {
    /// FACTURA - issued to customers identified by RUC.
    #[serde(rename = "FACTURA")]
    Invoice,
    /// BOLETA - issued to everyone else.
    #[serde(rename = "BOLETA")]
    Receipt,
}

impl DocumentType {
    /// Returns the fixed series for this document type.
    ///
    /// The mapping partitions the numbering space: sequence numbers are
    /// unique and strictly increasing within each (type, series) pair.
    #[must_use]
    pub const fn series(self) -> &'static str {
        match self {
            Self::Invoice => "F001",
            Self::Receipt => "B001",
        }
    }

    /// Returns the public API string for this document type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invoice => "FACTURA",
            Self::Receipt => "BOLETA",
        }
    }

    /// Parses a document type from its public API string.
    ///
    /// Accepts the Spanish names used on the wire and their English
    /// aliases, case-insensitively.
    pub fn parse(s: &str) -> Result<Self, UnknownDocumentType> {
        match s.to_uppercase().as_str() {
            "FACTURA" | "INVOICE" => Ok(Self::Invoice),
            "BOLETA" | "RECEIPT" => Ok(Self::Receipt),
            _ => Err(UnknownDocumentType(s.to_string())),
        }
    }

    /// Derives the document type from the customer's identity document.
    ///
    /// Customers identified by RUC get a FACTURA; everyone else (DNI,
    /// passport, unidentified) gets a BOLETA.
    #[must_use]
    pub fn for_customer_document(customer_document_type: &str) -> Self {
        if customer_document_type.eq_ignore_ascii_case("RUC") {
            Self::Invoice
        } else {
            Self::Receipt
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for document type strings that are neither FACTURA nor BOLETA.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown document type: {0}")]
pub struct UnknownDocumentType(pub String);

/// Formats the display form of a series + sequence number pair.
///
/// The first invoice is `"F001-00000001"`.
#[must_use]
pub fn format_serie_numero(series: &str, sequence_number: i64) -> String {
    format!("{series}-{sequence_number:0SEQUENCE_PAD_WIDTH$}")
}

/// Formats the zero-padded correlativo without the series prefix.
#[must_use]
pub fn format_correlativo(sequence_number: i64) -> String {
    format!("{sequence_number:0SEQUENCE_PAD_WIDTH$}")
}

/// Derives the IGV amount from a sale total, rounded to 2 decimal places.
///
/// This is a presentation derivation, never stored state.
#[must_use]
pub fn igv_amount(total: Decimal) -> Decimal {
    (total * IGV_RATE).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_series_mapping_is_fixed() {
        assert_eq!(DocumentType::Invoice.series(), "F001");
        assert_eq!(DocumentType::Receipt.series(), "B001");
    }

    #[rstest]
    #[case("FACTURA", DocumentType::Invoice)]
    #[case("BOLETA", DocumentType::Receipt)]
    #[case("factura", DocumentType::Invoice)]
    #[case("invoice", DocumentType::Invoice)]
    #[case("Receipt", DocumentType::Receipt)]
    fn test_parse_accepts_wire_names(#[case] input: &str, #[case] expected: DocumentType) {
        assert_eq!(DocumentType::parse(input).unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_unknown_types() {
        let err = DocumentType::parse("NOTA_CREDITO").unwrap_err();
        assert_eq!(err, UnknownDocumentType("NOTA_CREDITO".to_string()));
        assert!(DocumentType::parse("").is_err());
    }

    #[test]
    fn test_type_derivation_from_customer_document() {
        assert_eq!(
            DocumentType::for_customer_document("RUC"),
            DocumentType::Invoice
        );
        assert_eq!(
            DocumentType::for_customer_document("ruc"),
            DocumentType::Invoice
        );
        assert_eq!(
            DocumentType::for_customer_document("DNI"),
            DocumentType::Receipt
        );
        assert_eq!(
            DocumentType::for_customer_document("PASAPORTE"),
            DocumentType::Receipt
        );
        assert_eq!(DocumentType::for_customer_document(""), DocumentType::Receipt);
    }

    #[test]
    fn test_serie_numero_zero_padding() {
        assert_eq!(format_serie_numero("F001", 1), "F001-00000001");
        assert_eq!(format_serie_numero("B001", 123), "B001-00000123");
        assert_eq!(format_serie_numero("F001", 99_999_999), "F001-99999999");
        // Numbers beyond the pad width are never truncated
        assert_eq!(format_serie_numero("F001", 100_000_000), "F001-100000000");
    }

    #[test]
    fn test_correlativo_format() {
        assert_eq!(format_correlativo(7), "00000007");
    }

    #[test]
    fn test_igv_amount() {
        assert_eq!(igv_amount(dec!(100.00)), dec!(18.00));
        assert_eq!(igv_amount(dec!(0)), dec!(0.00));
        // Rounds to 2 decimal places
        assert_eq!(igv_amount(dec!(10.55)), dec!(1.90));
        assert_eq!(igv_amount(dec!(33.33)), dec!(6.00));
    }

    #[test]
    fn test_serde_wire_names() {
        assert_eq!(
            serde_json::to_string(&DocumentType::Invoice).unwrap(),
            r#""FACTURA""#
        );
        let parsed: DocumentType = serde_json::from_str(r#""BOLETA""#).unwrap();
        assert_eq!(parsed, DocumentType::Receipt);
    }
}
