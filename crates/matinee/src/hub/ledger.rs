//! The provisioning ledger: user accounts and child-bot records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamps in the ledger are for display only.
pub const CREATED_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    #[serde(rename = "Oddiy")]
    Ordinary,
    Premium,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Ordinary => write!(f, "Oddiy"),
            AccountStatus::Premium => write!(f, "Premium"),
        }
    }
}

/// Created lazily on first access; never deleted. `donations` only grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub balance: u64,
    pub status: AccountStatus,
    pub donations: u64,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            balance: 0,
            status: AccountStatus::Ordinary,
            donations: 0,
        }
    }
}

/// One provisioned child bot. Records are soft-disabled via `active`,
/// never deleted. Username uniqueness across owners is not enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotRecord {
    pub bot_token: String,
    pub username: String,
    pub owner_id: i64,
    pub created_date: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_status_round_trips_localized_names() {
        let json = serde_json::to_string(&Account::default()).unwrap();
        assert!(json.contains(r#""status":"Oddiy""#));
        let back: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status, AccountStatus::Ordinary);
    }

    #[test]
    fn bot_record_without_active_flag_defaults_to_true() {
        let record: BotRecord = serde_json::from_str(
            r#"{
                "bot_token": "123456:ABCDEF",
                "username": "my_bot",
                "owner_id": 7,
                "created_date": "01-08-2025 10:00:00"
            }"#,
        )
        .unwrap();
        assert!(record.active);
    }
}
