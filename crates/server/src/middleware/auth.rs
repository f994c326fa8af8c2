//! # Authentication Middleware
//!
//! JWT authentication middleware for protecting API endpoints.

use auth::{extract_bearer_token, validate_token, Role};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use entity::users::{Column as UserColumn, Entity as UsersEntity};
use error::{AppError, Result};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tracing::debug;

use crate::AppState;

/// User information extracted from JWT token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id:         i32,
    pub email:      String,
    /// Tenant every query of this request is scoped to
    pub company_id: i32,
    pub role:       Role,
}

impl AuthenticatedUser {
    pub fn require_admin(&self) -> Result<()> { self.role.require_admin() }

    pub fn require_manager(&self) -> Result<()> { self.role.require_manager() }
}

/// Authentication middleware
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates signature, issuer, audience, expiry and token type
/// 3. Loads the user, rejecting unknown or inactive accounts
/// 4. Adds [`AuthenticatedUser`] to request extensions
///
/// The role comes from the database so role changes apply without a new token.
pub async fn auth_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?
        .to_str()
        .map_err(|_| AppError::unauthorized("Invalid authorization header encoding"))?;

    let token = extract_bearer_token(auth_header)
        .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))?;

    let claims = validate_token(&state.jwt_config, &token)?;
    let user_id = claims.user_id()?;

    let user = UsersEntity::find_by_id(user_id)
        .filter(UserColumn::CompanyId.eq(claims.company_id))
        .one(&state.db)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::unauthorized("User not found or inactive"))?;

    let role = Role::from_string(&user.role).unwrap_or(Role::User);
    debug!(user_id = user.id, company_id = user.company_id, role = %role, "Authenticated request");

    request.extensions_mut().insert(AuthenticatedUser {
        id: user.id,
        email: user.email,
        company_id: user.company_id,
        role,
    });

    Ok(next.run(request).await)
}
