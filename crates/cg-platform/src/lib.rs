//! CreditGate Platform
//!
//! Core platform providing:
//! - Lazy account provisioning (one API key per authenticated principal)
//! - Credit ledger seeding (one balance entry, created in lockstep)
//! - Race-safe read-or-create protocol over both entities
//! - Credential rotation
//! - Identity verification against the upstream IdP
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities
//! - `repository` - Data access seam plus the MongoDB backend
//! - `memory` - In-process backend for local dev and tests
//! - `api` / `service` - REST endpoints and coordination (where applicable)

// Core aggregates
pub mod account;
pub mod ledger;
pub mod provisioning;

// Authentication
pub mod auth;

// Shared infrastructure
pub mod shared;

// Re-export common types from shared
pub use shared::error::{PlatformError, Result};
pub use shared::credential::{ApiKeyGenerator, DEFAULT_API_KEY_BYTES};

// Re-export main entity types for convenience
pub use account::entity::Account;
pub use ledger::entity::{CreditBalance, LedgerLookup};
pub use auth::verifier::{IdentityClaims, IdentityVerifier, JwtIdentityVerifier, VerifiedPrincipal, VerifierConfig};

// Re-export store seams and backends
pub use account::repository::{AccountStore, CreateOutcome, MongoAccountStore};
pub use account::memory::MemoryAccountStore;
pub use ledger::repository::{CreditLedger, MongoCreditLedger};
pub use ledger::memory::MemoryCreditLedger;

// Re-export services
pub use provisioning::service::{AccountState, ProvisioningService, DEFAULT_SEED_CREDITS};

/// API state and router exports
pub mod api {
    pub use crate::shared::middleware::{Authenticated, AppState, AuthLayer};
    pub use crate::shared::api_common::ApiError;
    pub use crate::provisioning::api::{account_router, AccountApiState, AccountApiDoc};
}
