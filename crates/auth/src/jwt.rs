//! # JWT Token Management
//!
//! HS256 access tokens carrying the tenant and role, plus short-lived signed
//! state tokens for the OAuth round trip.

use std::time::{Duration, SystemTime};

use cuid2::CuidConstructor;
use error::AppError;
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{Result, Role};

/// Value of the `type` claim on access tokens.
pub const ACCESS_TOKEN_TYPE: &str = "access";

/// Audience of OAuth state tokens; keeps them from passing as access tokens.
pub const STATE_AUDIENCE: &str = "oauth-state";

/// Lifetime of an OAuth state token.
pub const STATE_TTL_SECONDS: u64 = 600;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Base64-encoded HMAC secret
    pub secret:             SecretString,
    /// Access token lifetime
    pub access_ttl_seconds: u64,
    pub issuer:             String,
    pub audience:           String,
}

impl JwtConfig {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            access_ttl_seconds: 1800,
            issuer: "workledger".to_string(),
            audience: "workledger-api".to_string(),
        }
    }

    fn encoding_key(&self) -> Result<EncodingKey> {
        EncodingKey::from_base64_secret(self.secret.expose_secret())
            .map_err(|e| AppError::config(format!("Invalid JWT secret: {}", e)))
    }

    fn decoding_key(&self) -> Result<DecodingKey> {
        DecodingKey::from_base64_secret(self.secret.expose_secret())
            .map_err(|e| AppError::config(format!("Invalid JWT secret: {}", e)))
    }

    fn validation(&self, audience: &str) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[audience]);
        validation.leeway = 0;
        validation
    }
}

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub:        String,
    pub email:      String,
    pub company_id: i32,
    pub role:       Role,
    #[serde(rename = "type")]
    pub token_type: String,
    pub iss:        String,
    pub aud:        String,
    pub iat:        u64,
    pub exp:        u64,
    /// Unique token ID
    pub jti:        String,
}

impl Claims {
    /// User id as stored in the database.
    pub fn user_id(&self) -> Result<i32> { self.sub.parse().map_err(|_| AppError::JwtInvalidToken) }
}

/// OAuth state claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateClaims {
    pub nonce:    String,
    /// Client platform the login started from (`web`, `desktop`)
    pub platform: String,
    pub iss:      String,
    pub aud:      String,
    pub iat:      u64,
    pub exp:      u64,
}

fn now_secs() -> Result<u64> {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| AppError::internal(format!("Failed to get current time: {}", e)))
}

fn new_jti() -> String { CuidConstructor::new().with_length(32).create_id() }

fn decode<T: DeserializeOwned>(config: &JwtConfig, token: &str, audience: &str) -> Result<T> {
    let key = config.decoding_key()?;
    jsonwebtoken::decode::<T>(token, &key, &config.validation(audience))
        .map(|data| data.claims)
        .map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::JwtExpired,
                _ => AppError::JwtInvalidToken,
            }
        })
}

/// Creates a new access token for a user of `company_id`.
pub fn create_access_token(
    config: &JwtConfig,
    user_id: i32,
    email: &str,
    company_id: i32,
    role: Role,
) -> Result<String> {
    let issued_at = now_secs()?;
    let expires_at = Duration::from_secs(issued_at) + Duration::from_secs(config.access_ttl_seconds);

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        company_id,
        role,
        token_type: ACCESS_TOKEN_TYPE.to_string(),
        iss: config.issuer.clone(),
        aud: config.audience.clone(),
        iat: issued_at,
        exp: expires_at.as_secs(),
        jti: new_jti(),
    };

    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &config.encoding_key()?)
        .map_err(|e| AppError::internal(format!("Failed to encode token: {}", e)))
}

/// Validates an access token and returns its claims.
///
/// Expired tokens map to [`AppError::JwtExpired`]; every other failure,
/// including a token of the wrong type, maps to [`AppError::JwtInvalidToken`].
pub fn validate_token(config: &JwtConfig, token: &str) -> Result<Claims> {
    let claims: Claims = decode(config, token, &config.audience)?;
    if claims.token_type != ACCESS_TOKEN_TYPE {
        return Err(AppError::JwtInvalidToken);
    }
    Ok(claims)
}

/// Signs the state parameter of an OAuth login.
pub fn create_state_token(config: &JwtConfig, platform: &str) -> Result<String> {
    let issued_at = now_secs()?;
    let claims = StateClaims {
        nonce:    new_jti(),
        platform: platform.to_string(),
        iss:      config.issuer.clone(),
        aud:      STATE_AUDIENCE.to_string(),
        iat:      issued_at,
        exp:      issued_at + STATE_TTL_SECONDS,
    };

    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &config.encoding_key()?)
        .map_err(|e| AppError::internal(format!("Failed to encode state: {}", e)))
}

/// Verifies an OAuth state parameter.
pub fn validate_state_token(config: &JwtConfig, state: &str) -> Result<StateClaims> {
    decode(config, state, STATE_AUDIENCE).map_err(|_| AppError::bad_request("Invalid or expired OAuth state"))
}

/// Extracts the Bearer token from the Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<String> {
    let token = auth_header.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        return None;
    }

    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use base64::Engine;

    use super::*;

    fn config() -> JwtConfig {
        let secret = base64::engine::general_purpose::STANDARD.encode("test-secret-key-that-is-at-least-32-bytes-long");
        JwtConfig::new(SecretString::from(secret))
    }

    fn encode_claims<T: Serialize>(config: &JwtConfig, claims: &T) -> String {
        jsonwebtoken::encode(&Header::default(), claims, &config.encoding_key().unwrap()).unwrap()
    }

    #[test]
    fn test_create_and_validate_token() {
        let config = config();
        let token = create_access_token(&config, 42, "ada@acme.test", 7, Role::Manager).unwrap();

        let claims = validate_token(&config, &token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.company_id, 7);
        assert_eq!(claims.role, Role::Manager);
        assert_eq!(claims.token_type, "access");
        assert_eq!(claims.exp - claims.iat, 1800);
        assert_eq!(claims.jti.len(), 32);
    }

    #[test]
    fn test_expired_token() {
        let config = config();
        let now = now_secs().unwrap();
        let claims = Claims {
            sub:        "1".to_string(),
            email:      "ada@acme.test".to_string(),
            company_id: 1,
            role:       Role::Admin,
            token_type: "access".to_string(),
            iss:        config.issuer.clone(),
            aud:        config.audience.clone(),
            iat:        now - 120,
            exp:        now - 60,
            jti:        "x".to_string(),
        };

        let err = validate_token(&config, &encode_claims(&config, &claims)).unwrap_err();
        assert!(matches!(err, AppError::JwtExpired));
    }

    #[test]
    fn test_malformed_and_foreign_tokens() {
        let config = config();
        assert!(matches!(
            validate_token(&config, "not.a.jwt").unwrap_err(),
            AppError::JwtInvalidToken
        ));

        let other = JwtConfig::new(SecretString::from(
            base64::engine::general_purpose::STANDARD.encode("another-secret-key-also-32-bytes-long!!"),
        ));
        let token = create_access_token(&other, 1, "ada@acme.test", 1, Role::User).unwrap();
        assert!(matches!(
            validate_token(&config, &token).unwrap_err(),
            AppError::JwtInvalidToken
        ));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let config = config();
        let now = now_secs().unwrap();
        let claims = Claims {
            sub:        "1".to_string(),
            email:      "ada@acme.test".to_string(),
            company_id: 1,
            role:       Role::Admin,
            token_type: "refresh".to_string(),
            iss:        config.issuer.clone(),
            aud:        config.audience.clone(),
            iat:        now,
            exp:        now + 600,
            jti:        "x".to_string(),
        };

        assert!(validate_token(&config, &encode_claims(&config, &claims)).is_err());
    }

    #[test]
    fn test_state_token_round_trip() {
        let config = config();
        let state = create_state_token(&config, "desktop").unwrap();
        let claims = validate_state_token(&config, &state).unwrap();
        assert_eq!(claims.platform, "desktop");

        // A state token is not an access token
        assert!(validate_token(&config, &state).is_err());

        let access = create_access_token(&config, 1, "ada@acme.test", 1, Role::User).unwrap();
        assert_eq!(
            validate_state_token(&config, &access).unwrap_err().code(),
            "BAD_REQUEST"
        );
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123".to_string()));
        assert_eq!(extract_bearer_token("Bearer   abc123   "), Some("abc123".to_string()));
        assert!(extract_bearer_token("Basic abc123").is_none());
        assert!(extract_bearer_token("Bearer").is_none());
        assert!(extract_bearer_token("").is_none());
    }
}
