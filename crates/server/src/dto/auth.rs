//! # Authentication Data Transfer Objects
//!
//! Request and response types for authentication and invitation endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query for `GET /api/auth/login`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginQuery {
    /// Client platform, echoed back through the OAuth state
    pub platform: Option<String>,
}

/// Response carrying the Google authorization URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginUrlResponse {
    pub authorization_url: String,
    pub state:             String,
}

/// Query for `GET /api/auth/callback`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CallbackQuery {
    #[validate(length(min = 1, message = "Authorization code is required"))]
    pub code:  String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
}

/// Request body for token refresh
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Request body for logout; without a token every session is revoked
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

/// Request body for development login
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DevLoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// Public user representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResponse {
    pub id:            i32,
    pub email:         String,
    pub first_name:    String,
    pub last_name:     String,
    pub role:          String,
    pub team_id:       Option<i32>,
    pub is_active:     bool,
    pub created_at:    DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<entity::users::Model> for UserResponse {
    fn from(user: entity::users::Model) -> Self {
        Self {
            id:            user.id,
            email:         user.email,
            first_name:    user.first_name,
            last_name:     user.last_name,
            role:          user.role,
            team_id:       user.team_id,
            is_active:     user.is_active,
            created_at:    user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyResponse {
    pub id:     i32,
    pub name:   String,
    pub domain: Option<String>,
}

impl From<entity::companies::Model> for CompanyResponse {
    fn from(company: entity::companies::Model) -> Self {
        Self {
            id:     company.id,
            name:   company.name,
            domain: company.domain,
        }
    }
}

/// Response containing authentication tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenResponse {
    pub access_token:  String,
    pub refresh_token: String,
    /// Always `bearer`
    pub token_type:    String,
    /// Access token lifetime in seconds
    pub expires_in:    u64,
    pub user:          UserResponse,
    pub company:       CompanyResponse,
}

/// Response for `GET /api/auth/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeResponse {
    pub user:    UserResponse,
    pub company: CompanyResponse,
}

/// Response for `GET /api/auth/config`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthConfigResponse {
    pub oauth_enabled: bool,
    pub dev_mode:      bool,
}

/// Request to invite someone into the caller's company
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    /// ADMIN, MANAGER or USER; defaults to USER
    pub role:  Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvitationResponse {
    pub id:         i32,
    pub email:      String,
    pub role:       String,
    pub status:     String,
    pub token:      String,
    pub invited_by: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<entity::invitations::Model> for InvitationResponse {
    fn from(invitation: entity::invitations::Model) -> Self {
        use sea_orm::ActiveEnum;

        Self {
            id:         invitation.id,
            email:      invitation.email,
            role:       invitation.role,
            status:     invitation.status.to_value(),
            token:      invitation.token,
            invited_by: invitation.invited_by,
            expires_at: invitation.expires_at,
            created_at: invitation.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvitationListResponse {
    pub invitations: Vec<InvitationResponse>,
}
