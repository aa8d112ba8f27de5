//! `SeaORM` Entity for the comprobantes table.
//!
//! `(document_type, series, sequence_number)` carries a unique
//! constraint (`uq_comprobantes_numbering`) that backs the sequence
//! allocator; `sale_id` is unique (`uq_comprobantes_sale`) so a sale is
//! emitted at most once. Rows are never deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{ComprobanteStatus, DocumentType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comprobantes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sale_id: Uuid,
    pub document_type: DocumentType,
    pub series: String,
    pub sequence_number: i64,
    pub status: ComprobanteStatus,
    pub sent_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Text", nullable)]
    pub artifact_xml: Option<String>,
    pub rejection_reason: Option<String>,
    pub customer_name: String,
    pub customer_document_type: String,
    pub customer_document_number: String,
    pub total: Decimal,
    pub issue_date: Date,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sales::Entity",
        from = "Column::SaleId",
        to = "super::sales::Column::Id"
    )]
    Sales,
}

impl Related<super::sales::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
