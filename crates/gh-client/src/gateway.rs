//! API Gateway
//!
//! The single chokepoint for remote calls. Every operation reads the bearer
//! token from the Credential Store immediately before sending, so a logout
//! anywhere in the application is reflected on the very next request. Every
//! failure — transport, HTTP status, body shape — normalizes to `ApiError`.
//!
//! The gateway never mutates the store. A 401 comes back as
//! `ApiError::Unauthorized` like any other failed result; deciding whether
//! that ends the session is the Session Controller's call.

use gh_common::{Charity, CharityApplication, Donation, Story, User};
use gh_config::ApiConfig;
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::dto::{
    ApplicationEnvelope, AuthEnvelope, AuthSession, CharitiesEnvelope, CharityApplicationRequest,
    CharityEnvelope, Credentials, DonationEnvelope, ErrorBody, NewDonation, NewStory, Registration,
    StoriesEnvelope, StoryEnvelope, UserEnvelope, UserUpdate,
};
use crate::error::{ApiError, Result};
use crate::store::CredentialStore;

/// GiveHub platform API client.
#[derive(Debug, Clone)]
pub struct ApiGateway {
    http: reqwest::Client,
    base_url: String,
    retry_attempts: u32,
    retry_delay: Duration,
    store: Arc<dyn CredentialStore>,
}

impl ApiGateway {
    pub fn new(config: &ApiConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry_attempts: config.retry_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request, attaching whatever token the store holds right now.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method, url);
        if let Some(token) = self.store.token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Execute with bounded retries for retryable failures.
    ///
    /// `make` builds a fresh request per attempt, which also re-reads the
    /// token per attempt.
    async fn execute<T, F>(&self, make: F) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut last_error = None;

        for attempt in 0..self.retry_attempts {
            if attempt > 0 {
                let delay = self.retry_delay * (1 << (attempt - 1));
                debug!(attempt, ?delay, "Retrying request");
                tokio::time::sleep(delay).await;
            }

            match make().send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response.json::<T>().await?);
                    }

                    let body = response.text().await.unwrap_or_default();
                    let message = serde_json::from_str::<ErrorBody>(&body)
                        .ok()
                        .and_then(ErrorBody::into_message)
                        .unwrap_or_default();
                    let error = ApiError::from_status(status, message);

                    if !error.is_retryable() {
                        return Err(error);
                    }
                    last_error = Some(error);
                }
                Err(e) => {
                    let error = ApiError::Http(e);
                    if !error.is_retryable() {
                        return Err(error);
                    }
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ApiError::Other("Request failed".to_string())))
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    /// POST `/auth/login`
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let payload = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let envelope: AuthEnvelope = self
            .execute(|| self.request(Method::POST, "/auth/login").json(&payload))
            .await?;
        envelope.into_session("Login failed")
    }

    /// POST `/auth/register`
    pub async fn register(&self, registration: &Registration) -> Result<AuthSession> {
        let envelope: AuthEnvelope = self
            .execute(|| self.request(Method::POST, "/auth/register").json(registration))
            .await?;
        envelope.into_session("Registration failed")
    }

    /// GET `/auth/profile`
    pub async fn get_profile(&self) -> Result<User> {
        let envelope: UserEnvelope = self
            .execute(|| self.request(Method::GET, "/auth/profile"))
            .await?;
        envelope.into_user()
    }

    /// PUT `/users/{id}`
    pub async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<User> {
        let path = format!("/users/{}", id);
        let envelope: UserEnvelope = self
            .execute(|| self.request(Method::PUT, &path).json(update))
            .await?;
        envelope.into_user()
    }

    // ------------------------------------------------------------------
    // Charities
    // ------------------------------------------------------------------

    /// GET `/charities/`
    pub async fn list_charities(&self) -> Result<Vec<Charity>> {
        let envelope: CharitiesEnvelope = self
            .execute(|| self.request(Method::GET, "/charities/"))
            .await?;
        Ok(envelope.charities)
    }

    /// GET `/charities/{id}`
    pub async fn charity_details(&self, id: i64) -> Result<Charity> {
        let path = format!("/charities/{}", id);
        let envelope: CharityEnvelope = self.execute(|| self.request(Method::GET, &path)).await?;
        Ok(envelope.charity)
    }

    /// POST `/charities/apply`
    pub async fn apply_for_charity(
        &self,
        application: &CharityApplicationRequest,
    ) -> Result<CharityApplication> {
        let envelope: ApplicationEnvelope = self
            .execute(|| self.request(Method::POST, "/charities/apply").json(application))
            .await?;
        Ok(envelope.application)
    }

    // ------------------------------------------------------------------
    // Donations
    // ------------------------------------------------------------------

    /// POST `/donations/`
    pub async fn make_donation(&self, donation: &NewDonation) -> Result<Donation> {
        let envelope: DonationEnvelope = self
            .execute(|| self.request(Method::POST, "/donations/").json(donation))
            .await?;
        Ok(envelope.donation)
    }

    /// GET `/donations/history` — plain array response
    pub async fn donation_history(&self) -> Result<Vec<Donation>> {
        self.execute(|| self.request(Method::GET, "/donations/history"))
            .await
    }

    // ------------------------------------------------------------------
    // Stories
    // ------------------------------------------------------------------

    /// GET `/stories/`
    pub async fn list_stories(&self) -> Result<Vec<Story>> {
        let envelope: StoriesEnvelope = self
            .execute(|| self.request(Method::GET, "/stories/"))
            .await?;
        Ok(envelope.stories)
    }

    /// GET `/stories/{id}`
    pub async fn story_details(&self, id: i64) -> Result<Story> {
        let path = format!("/stories/{}", id);
        let envelope: StoryEnvelope = self.execute(|| self.request(Method::GET, &path)).await?;
        Ok(envelope.story)
    }

    /// POST `/stories/` — charity accounts only
    pub async fn post_story(&self, story: &NewStory) -> Result<Story> {
        let envelope: StoryEnvelope = self
            .execute(|| self.request(Method::POST, "/stories/").json(story))
            .await?;
        Ok(envelope.story)
    }

    // ------------------------------------------------------------------
    // Admin
    // ------------------------------------------------------------------

    /// GET `/charities/applications` — plain array response
    pub async fn pending_applications(&self) -> Result<Vec<CharityApplication>> {
        self.execute(|| self.request(Method::GET, "/charities/applications"))
            .await
    }

    /// POST `/charities/applications/{id}/approve`
    pub async fn approve_application(&self, id: i64) -> Result<CharityApplication> {
        let path = format!("/charities/applications/{}/approve", id);
        let envelope: ApplicationEnvelope =
            self.execute(|| self.request(Method::POST, &path)).await?;
        Ok(envelope.application)
    }

    /// POST `/charities/applications/{id}/reject`
    pub async fn reject_application(&self, id: i64) -> Result<CharityApplication> {
        let path = format!("/charities/applications/{}/reject", id);
        let envelope: ApplicationEnvelope =
            self.execute(|| self.request(Method::POST, &path)).await?;
        Ok(envelope.application)
    }
}
