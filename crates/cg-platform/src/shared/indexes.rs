//! MongoDB Index Initialization
//!
//! Creates indexes for all collections on application startup. Uniqueness
//! of both collections rides the mandatory `_id` index (the principal id is
//! the document key), so only lookup-support indexes are created here.

use mongodb::{Database, IndexModel, bson::doc, options::IndexOptions};
use tracing::info;

/// Initialize all MongoDB indexes
pub async fn initialize_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    info!("Initializing MongoDB indexes...");

    create_account_indexes(db).await?;
    create_ledger_indexes(db).await?;

    info!("MongoDB indexes initialized successfully");
    Ok(())
}

async fn create_account_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let accounts = db.collection::<mongodb::bson::Document>("accounts");

    // Contact email lookup (sparse: not every IdP discloses one)
    accounts.create_index(
        IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder()
                .sparse(true)
                .background(true)
                .build())
            .build(),
    ).await?;

    info!("Created indexes on accounts");
    Ok(())
}

async fn create_ledger_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let balances = db.collection::<mongodb::bson::Document>("credit_balances");

    // Recency scans for ops tooling
    balances.create_index(
        IndexModel::builder()
            .keys(doc! { "createdAt": 1 })
            .options(IndexOptions::builder().background(true).build())
            .build(),
    ).await?;

    info!("Created indexes on credit_balances");
    Ok(())
}
