//! `SeaORM` entity definitions.

pub mod comprobantes;
pub mod sales;
pub mod sea_orm_active_enums;
