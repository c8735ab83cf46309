//! Account Store
//!
//! Persistence seam for account records. The write path matters here: the
//! insert must be uniqueness-enforcing so that a lost creation race surfaces
//! as `AlreadyExists` instead of silently overwriting the winner's
//! credential.

use async_trait::async_trait;
use mongodb::{Collection, Database, bson::doc};

use crate::account::entity::Account;
use crate::shared::error::{PlatformError, Result};

/// Outcome of a uniqueness-enforcing insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The record was inserted by this caller
    Created,
    /// A record for this principal already exists; nothing was written
    AlreadyExists,
}

/// Persistence operations for account records
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_principal(&self, principal_id: &str) -> Result<Option<Account>>;

    /// Insert a new account record. Never overwrites: a concurrent winner
    /// for the same principal is reported as `AlreadyExists`.
    async fn create(&self, account: &Account) -> Result<CreateOutcome>;

    /// Replace the stored credential (rotation).
    async fn update_api_key(&self, principal_id: &str, api_key: &str) -> Result<()>;
}

/// MongoDB-backed account store
pub struct MongoAccountStore {
    collection: Collection<Account>,
}

impl MongoAccountStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("accounts"),
        }
    }
}

#[async_trait]
impl AccountStore for MongoAccountStore {
    async fn find_by_principal(&self, principal_id: &str) -> Result<Option<Account>> {
        Ok(self.collection.find_one(doc! { "_id": principal_id }).await?)
    }

    async fn create(&self, account: &Account) -> Result<CreateOutcome> {
        match self.collection.insert_one(account).await {
            Ok(_) => Ok(CreateOutcome::Created),
            // The _id index rejects a second insert for the same principal
            Err(e) if is_duplicate_key_error(&e) => Ok(CreateOutcome::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_api_key(&self, principal_id: &str, api_key: &str) -> Result<()> {
        let result = self.collection
            .update_one(
                doc! { "_id": principal_id },
                doc! { "$set": { "apiKey": api_key } },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(PlatformError::not_found("Account", principal_id));
        }
        Ok(())
    }
}

/// True if the error is a MongoDB duplicate-key write error (code 11000)
pub(crate) fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref write_error)) if write_error.code == 11000
    )
}
