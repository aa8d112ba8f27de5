//! `SeaORM` Entity for the sales table.
//!
//! Sales are produced by the (out-of-scope) cart workflow; this layer
//! only reads them when a comprobante is emitted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_name: String,
    pub customer_document_type: String,
    pub customer_document_number: String,
    pub total: Decimal,
    pub sale_date: Date,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::comprobantes::Entity")]
    Comprobantes,
}

impl Related<super::comprobantes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comprobantes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
