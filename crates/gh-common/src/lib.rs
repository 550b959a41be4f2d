use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod logging;

// ============================================================================
// Roles
// ============================================================================

/// Account role, closed set.
///
/// Every role→behavior decision (dashboard routing, access checks) lives in
/// `gh-client::routes`; other code carries a `Role` around without matching
/// on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform administrator
    Admin,
    /// Individual donor
    Donor,
    /// Charity account
    Charity,
}

impl Role {
    /// Wire name, as the API serializes it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Donor => "donor",
            Role::Charity => "charity",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Users
// ============================================================================

/// Authenticated principal as the platform reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Opaque identifier. The API emits it both as a number and as a string
    /// (token subjects are stringified); accept either.
    #[serde(deserialize_with = "de_opaque_id")]
    pub id: String,

    pub name: String,

    pub email: String,

    pub role: Role,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Charity owned by this user, if they ever applied for one.
    /// Drives the donor→charity dashboard promotion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_charity: Option<OwnedCharity>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
            created_at: None,
            owned_charity: None,
        }
    }

    pub fn with_owned_charity(mut self, charity: OwnedCharity) -> Self {
        self.owned_charity = Some(charity);
        self
    }
}

/// Reference to a charity the user owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedCharity {
    pub id: i64,
    pub status: CharityStatus,
}

impl OwnedCharity {
    pub fn is_approved(&self) -> bool {
        self.status == CharityStatus::Approved
    }
}

fn de_opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Num(i64),
        Text(String),
    }

    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Num(n) => n.to_string(),
        IdRepr::Text(s) => s,
    })
}

// ============================================================================
// Charities
// ============================================================================

/// Charity application / listing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharityStatus {
    Pending,
    Approved,
    Rejected,
}

/// Charity record from the public listing or admin views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charity {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Fundraising goal in whole currency units.
    #[serde(default)]
    pub goal: i64,
    pub status: CharityStatus,
    /// Aggregates computed server-side over completed donations.
    #[serde(default)]
    pub raised: i64,
    #[serde(default)]
    pub donors: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Donations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Pending,
    Complete,
    Failed,
}

/// A donation as the history endpoint returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub id: i64,
    pub user_id: i64,
    pub charity_id: i64,
    /// Decimal amount; the API serializes it as a string.
    pub amount: String,
    #[serde(default)]
    pub recurring: bool,
    pub status: DonationStatus,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

// ============================================================================
// Stories
// ============================================================================

/// Impact story published by a charity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: i64,
    pub charity_id: i64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Charity applications (admin surface)
// ============================================================================

/// Application to convert a donor account into a charity, awaiting an
/// admin decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharityApplication {
    pub id: i64,
    pub user_id: i64,
    pub organization_name: String,
    pub mission: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub goal: i64,
    pub status: CharityStatus,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_wire_names_are_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::from_str::<Role>("\"charity\"").unwrap(), Role::Charity);
    }

    #[test]
    fn unknown_role_fails_to_parse() {
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
    }

    #[test]
    fn user_id_accepts_number_or_string() {
        let from_num: User =
            serde_json::from_str(r#"{"id":7,"name":"A","email":"a@b.c","role":"donor"}"#).unwrap();
        let from_str: User =
            serde_json::from_str(r#"{"id":"7","name":"A","email":"a@b.c","role":"donor"}"#).unwrap();
        assert_eq!(from_num.id, "7");
        assert_eq!(from_num.id, from_str.id);
    }

    #[test]
    fn owned_charity_approval() {
        let owned = OwnedCharity { id: 3, status: CharityStatus::Pending };
        assert!(!owned.is_approved());
        let owned = OwnedCharity { id: 3, status: CharityStatus::Approved };
        assert!(owned.is_approved());
    }
}
