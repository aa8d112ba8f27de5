//! Initial database migration.
//!
//! Creates the enums, the sales and comprobantes tables, and the unique
//! constraints that back sequence allocation.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(SALES_SQL).await?;
        db.execute_unprepared(COMPROBANTES_SQL).await?;
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Fiscal document types
CREATE TYPE document_type AS ENUM (
    'invoice',
    'receipt'
);

-- Comprobante lifecycle
CREATE TYPE comprobante_status AS ENUM (
    'pending',
    'sent',
    'accepted',
    'rejected'
);
";

const SALES_SQL: &str = r"
CREATE TABLE sales (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    customer_name TEXT NOT NULL,
    customer_document_type TEXT NOT NULL,
    customer_document_number TEXT NOT NULL,
    total NUMERIC(14, 2) NOT NULL CHECK (total >= 0),
    sale_date DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const COMPROBANTES_SQL: &str = r"
CREATE TABLE comprobantes (
    id UUID PRIMARY KEY,
    sale_id UUID NOT NULL REFERENCES sales(id),
    document_type document_type NOT NULL,
    series TEXT NOT NULL,
    sequence_number BIGINT NOT NULL CHECK (sequence_number > 0),
    status comprobante_status NOT NULL DEFAULT 'pending',
    sent_at TIMESTAMPTZ,
    artifact_xml TEXT,
    rejection_reason TEXT,
    customer_name TEXT NOT NULL,
    customer_document_type TEXT NOT NULL,
    customer_document_number TEXT NOT NULL,
    total NUMERIC(14, 2) NOT NULL,
    issue_date DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    -- Last line of defense for the allocator: a number is never issued
    -- twice within a (type, series) pair, no matter what races.
    CONSTRAINT uq_comprobantes_numbering
        UNIQUE (document_type, series, sequence_number),

    -- One comprobante per sale.
    CONSTRAINT uq_comprobantes_sale UNIQUE (sale_id)
);

CREATE INDEX idx_comprobantes_sent_at
    ON comprobantes (sent_at DESC NULLS LAST, sequence_number ASC);
CREATE INDEX idx_comprobantes_status ON comprobantes (status);
CREATE INDEX idx_comprobantes_customer_name ON comprobantes (customer_name);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_comprobantes_updated_at
    BEFORE UPDATE ON comprobantes
    FOR EACH ROW
    EXECUTE FUNCTION set_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TRIGGER IF EXISTS trg_comprobantes_updated_at ON comprobantes;
DROP FUNCTION IF EXISTS set_updated_at();
DROP TABLE IF EXISTS comprobantes;
DROP TABLE IF EXISTS sales;
DROP TYPE IF EXISTS comprobante_status;
DROP TYPE IF EXISTS document_type;
";
