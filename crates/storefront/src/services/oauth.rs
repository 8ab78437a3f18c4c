//! OAuth 2.0 identity provider client.
//!
//! Implements the authorization-code flow:
//!
//! 1. Generate an authorization URL with `authorization_url()`; the `state`
//!    value is stored in the session first
//! 2. The provider redirects back with an authorization code
//! 3. Exchange the code for an access token with `exchange_code()`
//! 4. Fetch the signed-in identity with `user_info()`

use std::sync::Arc;

use rand::distr::{Alphanumeric, SampleString};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::OAuthConfig;

/// Length of the generated CSRF `state` value.
const STATE_LENGTH: usize = 32;

/// Errors from the identity provider.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The token endpoint rejected the code.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// The userinfo endpoint rejected the token.
    #[error("userinfo request failed: {0}")]
    UserInfo(String),

    /// The provider did not return an email.
    #[error("provider returned no email")]
    MissingEmail,

    /// The provider reports the email as unverified.
    #[error("provider email is not verified")]
    UnverifiedEmail,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// The identity returned by the userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl UserInfo {
    /// The verified email address.
    ///
    /// Providers that omit `email_verified` are trusted.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is missing or flagged unverified.
    pub fn verified_email(&self) -> Result<&str, OAuthError> {
        let email = self
            .email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or(OAuthError::MissingEmail)?;
        if self.email_verified == Some(false) {
            return Err(OAuthError::UnverifiedEmail);
        }
        Ok(email)
    }
}

/// Client for the configured identity provider.
#[derive(Clone)]
pub struct OAuthClient {
    inner: Arc<OAuthClientInner>,
}

struct OAuthClientInner {
    client: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
    authorize_url: String,
    token_url: String,
    userinfo_url: String,
}

impl OAuthClient {
    /// Create a new provider client.
    #[must_use]
    pub fn new(config: &OAuthConfig) -> Self {
        Self {
            inner: Arc::new(OAuthClientInner {
                client: reqwest::Client::new(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                authorize_url: config.authorize_url.clone(),
                token_url: config.token_url.clone(),
                userinfo_url: config.userinfo_url.clone(),
            }),
        }
    }

    /// Build the URL to send the browser to.
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> String {
        let separator = if self.inner.authorize_url.contains('?') {
            '&'
        } else {
            '?'
        };
        format!(
            "{}{separator}\
            client_id={}&\
            response_type=code&\
            redirect_uri={}&\
            scope=openid%20email%20profile&\
            state={}",
            self.inner.authorize_url,
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange fails.
    #[instrument(skip_all)]
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, OAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.inner.client_id.as_str()),
            ("client_secret", self.inner.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .inner
            .client
            .post(&self.inner.token_url)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OAuthError::TokenExchange(text));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Fetch the signed-in identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip_all)]
    pub async fn user_info(&self, access_token: &str) -> Result<UserInfo, OAuthError> {
        let response = self
            .inner
            .client
            .get(&self.inner.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OAuthError::UserInfo(response.status().to_string()));
        }

        Ok(response.json().await?)
    }
}

/// Random value for the `state` parameter.
#[must_use]
pub fn generate_state() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), STATE_LENGTH)
}
