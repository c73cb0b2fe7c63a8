//! Common types used across Herodex

use serde::{Deserialize, Serialize};

/// Account lifecycle state, stored as a Postgres enum on `users.status`.
///
/// New accounts start as `Pending` and become `Active` once the email
/// verification link is consumed. `Inactive` and `Suspended` accounts are
/// rejected by the authorization gate even when they present a valid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
    Pending,
    Suspended,
}

impl AccountStatus {
    /// True for states that must never pass the authorization gate.
    pub fn is_blocked(self) -> bool {
        matches!(self, AccountStatus::Inactive | AccountStatus::Suspended)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Pending => "pending",
            AccountStatus::Suspended => "suspended",
        }
    }
}

/// Role names as stored on `users.role`.
pub mod roles {
    pub const ADMIN: &str = "ADMIN";
    pub const USER: &str = "USER";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_states() {
        assert!(AccountStatus::Inactive.is_blocked());
        assert!(AccountStatus::Suspended.is_blocked());
        assert!(!AccountStatus::Active.is_blocked());
        assert!(!AccountStatus::Pending.is_blocked());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&AccountStatus::Suspended).unwrap();
        assert_eq!(json, "\"suspended\"");
        let back: AccountStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(back, AccountStatus::Pending);
    }
}
