//! # Authentication Service
//!
//! Building blocks for Workledger authentication:
//! - Roles and role checks
//! - JWT access tokens and signed OAuth state
//! - Refresh token generation and hashing
//! - Google OAuth 2.0 helpers
//!
//! Database access lives in the server crate; everything here is pure or
//! talks only to the OAuth provider.

pub mod jwt;
pub mod oauth;
pub mod refresh;
pub mod roles;

pub use jwt::{
    create_access_token,
    create_state_token,
    extract_bearer_token,
    validate_state_token,
    validate_token,
    Claims,
    JwtConfig,
    StateClaims,
};
pub use oauth::{GoogleOAuthConfig, GoogleUserInfo, OAuthTokens};
pub use refresh::{generate_refresh_token, hash_refresh_token};
pub use roles::Role;
pub use secrecy;

/// Convenience type alias for Result with AppError.
pub type Result<T, E = error::AppError> = std::result::Result<T, E>;
