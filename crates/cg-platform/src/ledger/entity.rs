//! Credit Ledger Entity

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use bson::{Bson, Document};

/// Credit balance entry, one per provisioned principal.
///
/// The balance is seeded once at creation and never reassigned by this
/// service; consumption is the metering pipeline's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBalance {
    /// Principal identifier (unique key)
    #[serde(rename = "_id")]
    pub principal_id: String,

    /// Remaining credits in minor units, never negative
    pub balance: i64,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl CreditBalance {
    pub fn new(principal_id: impl Into<String>, balance: i64) -> Self {
        Self {
            principal_id: principal_id.into(),
            balance,
            created_at: Utc::now(),
        }
    }
}

/// Result of a shape-checked ledger read.
///
/// An entry whose balance field is missing, non-integer, or negative is
/// unusable and must not be projected to callers. It is kept distinct from
/// a clean miss so callers can log it before re-provisioning.
#[derive(Debug, Clone)]
pub enum LedgerLookup {
    Present(CreditBalance),
    Absent,
    Malformed,
}

impl LedgerLookup {
    /// Validate a raw stored document into a ledger lookup result.
    pub fn from_document(principal_id: &str, doc: &Document) -> Self {
        let balance = match doc.get("balance") {
            Some(Bson::Int64(v)) => *v,
            Some(Bson::Int32(v)) => i64::from(*v),
            _ => return LedgerLookup::Malformed,
        };

        if balance < 0 {
            return LedgerLookup::Malformed;
        }

        let created_at = match doc.get("createdAt") {
            Some(Bson::DateTime(dt)) => dt.to_chrono(),
            _ => chrono::Utc::now(),
        };

        LedgerLookup::Present(CreditBalance {
            principal_id: principal_id.to_string(),
            balance,
            created_at,
        })
    }

    pub fn is_present(&self) -> bool {
        matches!(self, LedgerLookup::Present(_))
    }
}
