//! In-memory account store
//!
//! Backs local development (`CG_STORE=memory`) and the integration tests.
//! The map mutex makes create atomic, so the uniqueness contract holds under
//! concurrent callers exactly as it does with the real store.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::account::entity::Account;
use crate::account::repository::{AccountStore, CreateOutcome};
use crate::shared::error::{PlatformError, Result};

#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records (test observability)
    pub fn len(&self) -> usize {
        self.accounts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.lock().is_empty()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_principal(&self, principal_id: &str) -> Result<Option<Account>> {
        Ok(self.accounts.lock().get(principal_id).cloned())
    }

    async fn create(&self, account: &Account) -> Result<CreateOutcome> {
        let mut accounts = self.accounts.lock();
        if accounts.contains_key(&account.principal_id) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        accounts.insert(account.principal_id.clone(), account.clone());
        Ok(CreateOutcome::Created)
    }

    async fn update_api_key(&self, principal_id: &str, api_key: &str) -> Result<()> {
        let mut accounts = self.accounts.lock();
        match accounts.get_mut(principal_id) {
            Some(account) => {
                account.api_key = api_key.to_string();
                Ok(())
            }
            None => Err(PlatformError::not_found("Account", principal_id)),
        }
    }
}
