//! Paginated, filterable queries over the comprobante ledger.
//!
//! The count query and the page query share one predicate constructor,
//! so `total` can never be computed under a different filter shape than
//! the items.

use chrono::NaiveDate;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Condition, Expr, NullOrdering};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use emisor_core::document::DocumentType;
use emisor_core::emission::ComprobanteStatus;
use emisor_shared::types::PageRequest;

use crate::entities::{comprobantes, sea_orm_active_enums};

/// Independently optional, conjunctive filters for the ledger.
#[derive(Debug, Clone, Default)]
pub struct ComprobanteFilter {
    /// Filter by document type.
    pub document_type: Option<DocumentType>,
    /// Filter by status.
    pub status: Option<ComprobanteStatus>,
    /// Inclusive lower bound on the submission date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the submission date.
    pub date_to: Option<NaiveDate>,
    /// Case-insensitive substring match over the customer name and the
    /// formatted series-number string.
    pub search: Option<String>,
}

/// One page of the ledger plus the total under the same predicate.
#[derive(Debug, Clone)]
pub struct ComprobantePage {
    /// Items of the requested page, newest submission first.
    pub items: Vec<comprobantes::Model>,
    /// Total matching rows across all pages.
    pub total: u64,
}

/// Ledger query engine.
#[derive(Debug, Clone)]
pub struct LedgerQuery {
    db: DatabaseConnection,
}

impl LedgerQuery {
    /// Creates a new ledger query engine.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists comprobantes under the filter with 1-based pagination.
    ///
    /// Ordering is newest submission first (`sent_at DESC NULLS LAST`),
    /// ties broken by ascending sequence number. Out-of-range pages
    /// return an empty item list with the true total.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn list(
        &self,
        filter: &ComprobanteFilter,
        page: &PageRequest,
    ) -> Result<ComprobantePage, DbErr> {
        let condition = filter_condition(filter);

        let total = comprobantes::Entity::find()
            .filter(condition.clone())
            .count(&self.db)
            .await?;

        let items = comprobantes::Entity::find()
            .filter(condition)
            .order_by_with_nulls(comprobantes::Column::SentAt, Order::Desc, NullOrdering::Last)
            .order_by_asc(comprobantes::Column::SequenceNumber)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(ComprobantePage { items, total })
    }
}

/// Builds the shared predicate for both the count and the page query.
fn filter_condition(filter: &ComprobanteFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(document_type) = filter.document_type {
        condition = condition.add(
            comprobantes::Column::DocumentType
                .eq(sea_orm_active_enums::DocumentType::from(document_type)),
        );
    }

    if let Some(status) = filter.status {
        condition = condition.add(
            comprobantes::Column::Status
                .eq(sea_orm_active_enums::ComprobanteStatus::from(status)),
        );
    }

    if let Some(date_from) = filter.date_from {
        condition = condition.add(Expr::cust_with_values("DATE(sent_at) >= ?", [date_from]));
    }

    if let Some(date_to) = filter.date_to {
        condition = condition.add(Expr::cust_with_values("DATE(sent_at) <= ?", [date_to]));
    }

    if let Some(search) = filter.search.as_deref() {
        let pattern = format!("%{search}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col(comprobantes::Column::CustomerName).ilike(pattern.clone()))
                .add(Expr::cust_with_values(
                    "(series || '-' || lpad(sequence_number::text, 8, '0')) ILIKE ?",
                    [pattern],
                )),
        );
    }

    condition
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    fn sql_for(filter: &ComprobanteFilter) -> String {
        comprobantes::Entity::find()
            .filter(filter_condition(filter))
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn test_empty_filter_has_no_predicate() {
        let sql = sql_for(&ComprobanteFilter::default());
        assert!(!sql.contains("WHERE"), "unexpected predicate: {sql}");
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let filter = ComprobanteFilter {
            document_type: Some(DocumentType::Invoice),
            status: Some(ComprobanteStatus::Accepted),
            date_from: Some(chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()),
            date_to: Some(chrono::NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()),
            search: None,
        };
        let sql = sql_for(&filter);

        assert!(sql.contains("\"document_type\" = "), "missing type: {sql}");
        assert!(sql.contains("\"status\" = "), "missing status: {sql}");
        assert!(sql.contains("DATE(sent_at) >= "), "missing from: {sql}");
        assert!(sql.contains("DATE(sent_at) <= "), "missing to: {sql}");
        assert!(sql.contains(" AND "), "filters must be conjunctive: {sql}");
    }

    #[test]
    fn test_search_matches_name_and_serie_numero() {
        let filter = ComprobanteFilter {
            search: Some("acme".to_string()),
            ..ComprobanteFilter::default()
        };
        let sql = sql_for(&filter);

        assert!(sql.contains("\"customer_name\" ILIKE "), "missing name match: {sql}");
        assert!(
            sql.contains("lpad(sequence_number::text, 8, '0')) ILIKE "),
            "missing serie-numero match: {sql}"
        );
        assert!(sql.contains(" OR "), "search arms must be disjunctive: {sql}");
    }

    #[test]
    fn test_count_and_page_share_one_predicate() {
        let filter = ComprobanteFilter {
            document_type: Some(DocumentType::Receipt),
            search: Some("B001".to_string()),
            ..ComprobanteFilter::default()
        };

        // Both queries are built from the same constructor; their WHERE
        // clauses are identical by construction.
        let count_sql = comprobantes::Entity::find()
            .filter(filter_condition(&filter))
            .build(DbBackend::Postgres)
            .to_string();
        let page_sql = sql_for(&filter);

        let where_of = |sql: &str| sql.split_once("WHERE").map(|(_, w)| w.to_string());
        assert_eq!(where_of(&count_sql), where_of(&page_sql));
    }
}
