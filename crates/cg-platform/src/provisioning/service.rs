//! Provisioning Service
//!
//! The read-or-create protocol over the account store and the credit
//! ledger. Correctness under concurrent first-time requests for the same
//! principal rests on three things: the store's uniqueness-enforcing
//! insert, the ledger's idempotent seed, and the mandatory re-read that
//! projects whichever writer actually won. No locking, no cross-request
//! caching, no retry loop beyond the single create-then-reread.

use std::sync::Arc;
use tracing::{debug, info};

use crate::account::entity::Account;
use crate::account::repository::{AccountStore, CreateOutcome};
use crate::auth::verifier::VerifiedPrincipal;
use crate::ledger::entity::LedgerLookup;
use crate::ledger::repository::CreditLedger;
use crate::shared::credential::{ApiKeyGenerator, DEFAULT_API_KEY_BYTES};
use crate::shared::error::{PlatformError, Result};

/// Default credits seeded into a fresh ledger entry (minor units)
pub const DEFAULT_SEED_CREDITS: i64 = 1000;

/// Flat projection returned to callers, assembled fresh on every call from
/// the persisted pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    pub api_key: String,
    pub balance: i64,
}

/// Coordinates lazy creation of the account record and its ledger entry.
///
/// Sole writer of both entities; the endpoint layer only ever observes the
/// [`AccountState`] projection.
pub struct ProvisioningService {
    accounts: Arc<dyn AccountStore>,
    ledger: Arc<dyn CreditLedger>,
    seed_credits: i64,
    api_key_bytes: usize,
}

impl ProvisioningService {
    pub fn new(accounts: Arc<dyn AccountStore>, ledger: Arc<dyn CreditLedger>) -> Self {
        Self {
            accounts,
            ledger,
            seed_credits: DEFAULT_SEED_CREDITS,
            api_key_bytes: DEFAULT_API_KEY_BYTES,
        }
    }

    pub fn with_seed_credits(mut self, seed_credits: i64) -> Self {
        self.seed_credits = seed_credits;
        self
    }

    pub fn with_api_key_bytes(mut self, api_key_bytes: usize) -> Self {
        self.api_key_bytes = api_key_bytes;
        self
    }

    /// Return the principal's provisioned state, creating the account
    /// record and ledger entry together if either is missing.
    pub async fn get_or_create(&self, principal: &VerifiedPrincipal) -> Result<AccountState> {
        // Fast path for returning principals
        if let Some(state) = self.read_pair(&principal.subject).await? {
            return Ok(state);
        }

        self.create_pair(principal).await?;

        // Mandatory re-read: the persisted credential may be another
        // concurrent caller's, not the one generated above
        self.read_pair(&principal.subject).await?
            .ok_or_else(|| PlatformError::provisioning_failed(&principal.subject))
    }

    /// Issue a replacement API key for the principal and persist it.
    ///
    /// The principal is provisioned first if needed, so rotation can never
    /// produce a credential with no backing account record.
    pub async fn rotate_api_key(&self, principal: &VerifiedPrincipal) -> Result<String> {
        self.get_or_create(principal).await?;

        let api_key = ApiKeyGenerator::generate(self.api_key_bytes)?;
        self.accounts.update_api_key(&principal.subject, &api_key).await?;
        info!(principal_id = %principal.subject, "rotated api key");
        Ok(api_key)
    }

    /// Read both entities and assemble the projection, or None if the pair
    /// is incomplete (no account, or ledger entry missing/malformed).
    async fn read_pair(&self, principal_id: &str) -> Result<Option<AccountState>> {
        let Some(account) = self.accounts.find_by_principal(principal_id).await? else {
            return Ok(None);
        };

        match self.ledger.find_by_principal(principal_id).await? {
            LedgerLookup::Present(entry) => Ok(Some(AccountState {
                api_key: account.api_key,
                balance: entry.balance,
            })),
            LedgerLookup::Absent | LedgerLookup::Malformed => Ok(None),
        }
    }

    /// Creation path: write the account record, then seed the ledger.
    ///
    /// A concurrent winner on the account insert is benign; the subsequent
    /// re-read picks up whatever was persisted. Partial progress left by an
    /// aborted request is completed here on the next call.
    async fn create_pair(&self, principal: &VerifiedPrincipal) -> Result<()> {
        let api_key = ApiKeyGenerator::generate(self.api_key_bytes)?;

        let mut account = Account::new(&principal.subject, api_key);
        if let Some(email) = &principal.email {
            account = account.with_email(email);
        }

        match self.accounts.create(&account).await? {
            CreateOutcome::Created => {
                info!(principal_id = %principal.subject, "provisioned new account");
            }
            CreateOutcome::AlreadyExists => {
                debug!(principal_id = %principal.subject, "account created concurrently");
            }
        }

        self.ledger.create_if_absent(&principal.subject, self.seed_credits).await
    }
}
