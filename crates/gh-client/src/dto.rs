//! Request and response payloads for the platform API.

use gh_common::{Charity, CharityApplication, Donation, Story, User};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

// ============================================================================
// Requests
// ============================================================================

/// Login request body.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Registration request body.
///
/// The platform decides the account role from the payload: a charity name
/// registers a charity account, a first/last name pair registers a donor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charity_name: Option<String>,
    pub email: String,
    pub password: String,
}

impl Registration {
    /// Register a donor account.
    pub fn donor(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            charity_name: None,
            email: email.into(),
            password: password.into(),
        }
    }

    /// Register a charity account.
    pub fn charity(
        charity_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            first_name: None,
            last_name: None,
            charity_name: Some(charity_name.into()),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Donor application to open a charity.
#[derive(Debug, Clone, Serialize)]
pub struct CharityApplicationRequest {
    pub organization_name: String,
    pub mission: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<i64>,
}

/// New donation request body.
#[derive(Debug, Clone, Serialize)]
pub struct NewDonation {
    pub charity_id: i64,
    pub amount: f64,
    pub recurring: bool,
    pub is_anonymous: bool,
    /// Payment channel reference; the payment itself happens out of band.
    pub payment_method: String,
    pub transaction_id: String,
}

/// New impact story request body.
#[derive(Debug, Clone, Serialize)]
pub struct NewStory {
    pub title: String,
    pub content: String,
}

/// Partial profile update.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

/// A freshly established session: the bearer token and the user it
/// authenticates, as returned by login and register.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

/// Login/register response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthEnvelope {
    #[serde(default)]
    pub success: bool,
    pub token: Option<String>,
    pub user: Option<User>,
    pub error: Option<String>,
}

impl AuthEnvelope {
    /// A 2xx body that still flags failure (or lacks the token/user pair)
    /// is a failed transaction, not a malformed response.
    pub fn into_session(self, fallback: &str) -> Result<AuthSession> {
        match (self.success, self.token, self.user) {
            (true, Some(token), Some(user)) => Ok(AuthSession { token, user }),
            (_, _, _) => Err(ApiError::Other(
                self.error.unwrap_or_else(|| fallback.to_string()),
            )),
        }
    }
}

/// Profile and user-update response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    #[serde(default)]
    pub success: bool,
    pub user: Option<User>,
    pub error: Option<String>,
}

impl UserEnvelope {
    pub fn into_user(self) -> Result<User> {
        match (self.success, self.user) {
            (true, Some(user)) => Ok(user),
            (_, _) => Err(ApiError::Other(
                self.error.unwrap_or_else(|| "User not found".to_string()),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CharitiesEnvelope {
    pub charities: Vec<Charity>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CharityEnvelope {
    pub charity: Charity,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StoriesEnvelope {
    pub stories: Vec<Story>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StoryEnvelope {
    pub story: Story,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DonationEnvelope {
    pub donation: Donation,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplicationEnvelope {
    pub application: CharityApplication,
}

/// Error body; the API uses `error` on auth routes and `message` elsewhere.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gh_common::Role;

    #[test]
    fn registration_payload_shapes() {
        let donor = Registration::donor("Jane", "Doe", "j@d.com", "pw");
        let json = serde_json::to_value(&donor).unwrap();
        assert_eq!(json["firstName"], "Jane");
        assert!(json.get("charityName").is_none());

        let charity = Registration::charity("Clean Water", "cw@org.com", "pw");
        let json = serde_json::to_value(&charity).unwrap();
        assert_eq!(json["charityName"], "Clean Water");
        assert!(json.get("firstName").is_none());
    }

    #[test]
    fn auth_envelope_success() {
        let env: AuthEnvelope = serde_json::from_str(
            r#"{"success":true,"token":"t1","user":{"id":1,"name":"A","email":"a@b.c","role":"donor"},"message":"Login successful"}"#,
        )
        .unwrap();
        let session = env.into_session("Login failed").unwrap();
        assert_eq!(session.token, "t1");
        assert_eq!(session.user.role, Role::Donor);
    }

    #[test]
    fn auth_envelope_failure_carries_error() {
        let env: AuthEnvelope =
            serde_json::from_str(r#"{"success":false,"error":"Invalid credentials"}"#).unwrap();
        let err = env.into_session("Login failed").unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[test]
    fn auth_envelope_missing_token_is_failure() {
        let env: AuthEnvelope = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(env.into_session("Login failed").is_err());
    }

    #[test]
    fn error_body_prefers_error_key() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"nope","message":"other"}"#).unwrap();
        assert_eq!(body.into_message().unwrap(), "nope");

        let body: ErrorBody = serde_json::from_str(r#"{"message":"Charity not found"}"#).unwrap();
        assert_eq!(body.into_message().unwrap(), "Charity not found");
    }
}
