//! Account Entity
//!
//! One durable API credential per principal, created lazily on first access.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

/// Account record keyed by the IdP's stable principal identifier.
///
/// The principal id doubles as the document `_id`, so the store itself
/// enforces at-most-one record per principal. The api_key is immutable for
/// the record's lifetime except through the explicit rotation operation,
/// which replaces it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Principal identifier (unique key)
    #[serde(rename = "_id")]
    pub principal_id: String,

    /// Opaque secret credential (lowercase hex)
    pub api_key: String,

    /// Contact email disclosed by the IdP, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Audit fields
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(principal_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            principal_id: principal_id.into(),
            api_key: api_key.into(),
            email: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_builder() {
        let account = Account::new("user-1", "abcd").with_email("user@example.com");
        assert_eq!(account.principal_id, "user-1");
        assert_eq!(account.api_key, "abcd");
        assert_eq!(account.email.as_deref(), Some("user@example.com"));
    }
}
