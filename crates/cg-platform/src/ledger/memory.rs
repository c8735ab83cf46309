//! In-memory credit ledger for local development and tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::ledger::entity::{CreditBalance, LedgerLookup};
use crate::ledger::repository::CreditLedger;
use crate::shared::error::Result;

#[derive(Default)]
pub struct MemoryCreditLedger {
    balances: Mutex<HashMap<String, CreditBalance>>,
}

impl MemoryCreditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.balances.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.lock().is_empty()
    }
}

#[async_trait]
impl CreditLedger for MemoryCreditLedger {
    async fn find_by_principal(&self, principal_id: &str) -> Result<LedgerLookup> {
        Ok(match self.balances.lock().get(principal_id) {
            Some(entry) => LedgerLookup::Present(entry.clone()),
            None => LedgerLookup::Absent,
        })
    }

    async fn create_if_absent(&self, principal_id: &str, initial_balance: i64) -> Result<()> {
        self.balances
            .lock()
            .entry(principal_id.to_string())
            .or_insert_with(|| CreditBalance::new(principal_id, initial_balance));
        Ok(())
    }
}
