//! Credit Ledger
//!
//! Persistence seam for credit balances. Creation is an idempotent
//! insert-if-absent: the seeded value is identical regardless of which
//! concurrent caller wins, so a lost race is success, not an error.

use async_trait::async_trait;
use bson::Document;
use mongodb::{Collection, Database, bson::doc};
use tracing::warn;

use crate::account::repository::is_duplicate_key_error;
use crate::ledger::entity::LedgerLookup;
use crate::shared::error::Result;

/// Persistence operations for credit balances
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Shape-checked read of a principal's balance entry.
    async fn find_by_principal(&self, principal_id: &str) -> Result<LedgerLookup>;

    /// Seed a balance entry if none exists. Idempotent; an existing entry
    /// (including one created concurrently) is left untouched.
    async fn create_if_absent(&self, principal_id: &str, initial_balance: i64) -> Result<()>;
}

/// MongoDB-backed credit ledger
///
/// The collection is read as raw documents so that entries of unexpected
/// shape surface as `Malformed` instead of a deserialization failure.
pub struct MongoCreditLedger {
    collection: Collection<Document>,
}

impl MongoCreditLedger {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("credit_balances"),
        }
    }
}

#[async_trait]
impl CreditLedger for MongoCreditLedger {
    async fn find_by_principal(&self, principal_id: &str) -> Result<LedgerLookup> {
        let Some(doc) = self.collection.find_one(doc! { "_id": principal_id }).await? else {
            return Ok(LedgerLookup::Absent);
        };

        let lookup = LedgerLookup::from_document(principal_id, &doc);
        if matches!(lookup, LedgerLookup::Malformed) {
            warn!(principal_id, "malformed credit balance entry");
        }
        Ok(lookup)
    }

    async fn create_if_absent(&self, principal_id: &str, initial_balance: i64) -> Result<()> {
        let result = self.collection
            .update_one(
                doc! { "_id": principal_id },
                doc! { "$setOnInsert": {
                    "balance": initial_balance,
                    "createdAt": bson::DateTime::now(),
                } },
            )
            .upsert(true)
            .await;

        match result {
            Ok(_) => Ok(()),
            // Two upserts for the same new principal can still collide on
            // the _id index; the other caller's seed is identical
            Err(e) if is_duplicate_key_error(&e) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
