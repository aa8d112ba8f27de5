//! Sale lookups.
//!
//! The sales workflow itself lives elsewhere; emission only needs to
//! resolve a sale and read its totals and customer fields.

use sea_orm::{DatabaseConnection, DbErr, EntityTrait};
use uuid::Uuid;

use crate::entities::sales;

/// Read-only sale repository.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    db: DatabaseConnection,
}

impl SaleRepository {
    /// Creates a new sale repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a sale by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<sales::Model>, DbErr> {
        sales::Entity::find_by_id(id).one(&self.db).await
    }
}
