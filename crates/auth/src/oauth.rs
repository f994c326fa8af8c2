//! # Google OAuth 2.0
//!
//! Authorization URL construction, code exchange and userinfo lookup. Endpoint
//! URLs are part of the config so tests can point them at a mock server.

use error::AppError;
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::warn;

use crate::Result;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Google OAuth client settings.
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id:     String,
    pub client_secret: SecretString,
    pub redirect_uri:  String,
    pub auth_url:      String,
    pub token_url:     String,
    pub userinfo_url:  String,
}

/// Token endpoint response. Only the access token is used.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    #[serde(default)]
    pub id_token:     Option<String>,
    #[serde(default)]
    pub expires_in:   Option<u64>,
}

/// OpenID Connect userinfo.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    pub sub:            String,
    pub email:          String,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub given_name:     Option<String>,
    #[serde(default)]
    pub family_name:    Option<String>,
    #[serde(default)]
    pub name:           Option<String>,
}

impl GoogleUserInfo {
    /// Part of the email after `@`, lowercased.
    pub fn domain(&self) -> String {
        self.email
            .rsplit_once('@')
            .map(|(_, domain)| domain.to_lowercase())
            .unwrap_or_default()
    }

    /// Given and family name, falling back to the display name split on the
    /// first space.
    pub fn names(&self) -> (String, String) {
        match (&self.given_name, &self.family_name) {
            (Some(first), last) => (first.clone(), last.clone().unwrap_or_default()),
            (None, _) => {
                let full = self.name.clone().unwrap_or_default();
                match full.split_once(' ') {
                    Some((first, last)) => (first.to_string(), last.to_string()),
                    None => (full, String::new()),
                }
            },
        }
    }
}

impl GoogleOAuthConfig {
    /// Config against Google's public endpoints.
    pub fn new(client_id: impl Into<String>, client_secret: SecretString, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            redirect_uri: redirect_uri.into(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }

    /// Override the token and userinfo endpoints.
    pub fn with_endpoints(mut self, token_url: impl Into<String>, userinfo_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self.userinfo_url = userinfo_url.into();
        self
    }

    /// URL the browser is sent to, carrying `state`.
    pub fn authorization_url(&self, state: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("access_type", "online"),
                ("prompt", "select_account"),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::config(format!("Invalid OAuth authorization URL: {}", e)))?;
        Ok(url.to_string())
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, http: &reqwest::Client, code: &str) -> Result<OAuthTokens> {
        let response = http
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose_secret()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("OAuth token request failed: {}", e)))?;

        let status = response.status();
        if status.is_client_error() {
            warn!(status = status.as_u16(), "OAuth code exchange rejected");
            return Err(AppError::unauthorized("Invalid authorization code"));
        }
        if !status.is_success() {
            return Err(AppError::upstream(format!(
                "OAuth token endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("Invalid OAuth token response: {}", e)))
    }

    /// Fetch the signed-in user's profile.
    pub async fn fetch_userinfo(&self, http: &reqwest::Client, access_token: &str) -> Result<GoogleUserInfo> {
        let response = http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("OAuth userinfo request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::upstream(format!(
                "OAuth userinfo endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        let info: GoogleUserInfo = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("Invalid OAuth userinfo response: {}", e)))?;

        if info.email_verified == Some(false) {
            return Err(AppError::forbidden("Email address is not verified"));
        }
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GoogleOAuthConfig {
        GoogleOAuthConfig::new(
            "client-123",
            SecretString::from("shh".to_string()),
            "http://localhost:5173/auth/callback",
        )
    }

    #[test]
    fn test_authorization_url_is_encoded() {
        let url = config().authorization_url("abc.def").unwrap();
        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A5173%2Fauth%2Fcallback"));
        assert!(url.contains("scope=openid+email+profile"));
        assert!(url.contains("state=abc.def"));
    }

    #[test]
    fn test_userinfo_names() {
        let info: GoogleUserInfo = serde_json::from_value(serde_json::json!({
            "sub": "1", "email": "Ada@Acme.TEST", "name": "Ada King Lovelace"
        }))
        .unwrap();
        assert_eq!(info.domain(), "acme.test");
        assert_eq!(
            info.names(),
            ("Ada".to_string(), "King Lovelace".to_string())
        );
    }
}
