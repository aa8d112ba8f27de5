//! Database seeder for Emisor development and testing.
//!
//! Seeds a handful of demo sales (RUC and DNI customers) so emission can
//! be exercised locally without the upstream sales workflow.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use emisor_db::entities::sales;

/// Demo sales with stable ids so repeated runs stay idempotent.
const DEMO_SALES: &[(&str, &str, &str, &str, &str)] = &[
    (
        "00000000-0000-0000-0000-000000000101",
        "Comercial Andina S.A.C.",
        "RUC",
        "20123456789",
        "1180.00",
    ),
    (
        "00000000-0000-0000-0000-000000000102",
        "Distribuidora El Sol E.I.R.L.",
        "RUC",
        "20601030013",
        "354.00",
    ),
    (
        "00000000-0000-0000-0000-000000000103",
        "María Fernanda Quispe",
        "DNI",
        "45678912",
        "118.00",
    ),
    (
        "00000000-0000-0000-0000-000000000104",
        "Jorge Luis Huamán",
        "DNI",
        "08765432",
        "59.00",
    ),
    (
        "00000000-0000-0000-0000-000000000105",
        "Cliente Varios",
        "SIN_DOCUMENTO",
        "-",
        "23.60",
    ),
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = emisor_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding demo sales...");
    seed_demo_sales(&db).await;

    println!("Seeding complete!");
}

/// Seeds the demo sales, skipping ids that already exist.
async fn seed_demo_sales(db: &DatabaseConnection) {
    for (id, name, document_type, document_number, total) in DEMO_SALES {
        let sale_id = Uuid::parse_str(id).expect("invalid demo sale id");

        if sales::Entity::find_by_id(sale_id)
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some()
        {
            println!("  Sale {name} already exists, skipping...");
            continue;
        }

        let total: Decimal = total.parse().expect("invalid demo sale total");
        let sale = sales::ActiveModel {
            id: Set(sale_id),
            customer_name: Set((*name).to_string()),
            customer_document_type: Set((*document_type).to_string()),
            customer_document_number: Set((*document_number).to_string()),
            total: Set(total),
            sale_date: Set(Utc::now().date_naive()),
            created_at: Set(Utc::now().into()),
        };

        if let Err(e) = sale.insert(db).await {
            eprintln!("Failed to insert sale {name}: {e}");
        } else {
            println!("  Created sale: {name} ({document_type})");
        }
    }
}
