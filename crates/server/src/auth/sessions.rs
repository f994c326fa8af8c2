//! # Refresh Sessions
//!
//! Storage of refresh tokens. The raw token is handed to the client once; only
//! its BLAKE3 hash is persisted in `sessions`.

use ::auth::{generate_refresh_token, hash_refresh_token};
use chrono::{Duration, Utc};
use entity::sessions::{Column, Entity as SessionsEntity};
use error::{AppError, Result};
use sea_orm::{prelude::*, sea_query::Expr, ActiveModelTrait, ConnectionTrait, Set};
use tracing::{debug, info};

/// Creates a session for `user` and returns the raw refresh token.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn create_session<C: ConnectionTrait>(
    db: &C,
    user: &entity::users::Model,
    ttl_days: i64,
) -> Result<String> {
    let token = generate_refresh_token();
    let now = Utc::now();

    entity::sessions::ActiveModel {
        user_id: Set(user.id),
        company_id: Set(user.company_id),
        refresh_token_hash: Set(hash_refresh_token(&token)),
        expires_at: Set(now + Duration::days(ttl_days)),
        created_at: Set(now),
        revoked_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| AppError::database(format!("Failed to create session: {}", e)))?;

    debug!(user_id = user.id, "Session created");
    Ok(token)
}

/// Looks up the live session for a raw refresh token.
///
/// Unknown, revoked and expired tokens are all reported as 401.
pub async fn find_active_session<C: ConnectionTrait>(db: &C, token: &str) -> Result<entity::sessions::Model> {
    let session = SessionsEntity::find()
        .filter(Column::RefreshTokenHash.eq(hash_refresh_token(token)))
        .one(db)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;

    if session.revoked_at.is_some() {
        return Err(AppError::unauthorized("Refresh token has been revoked"));
    }
    if session.expires_at <= Utc::now() {
        return Err(AppError::unauthorized("Refresh token has expired"));
    }

    Ok(session)
}

/// Revokes `session` and issues a replacement for `user`.
///
/// The revocation only applies to a session that is still live, so a token
/// refreshed twice at once yields one new session and one 401.
pub async fn rotate_session<C: ConnectionTrait>(
    db: &C,
    session: entity::sessions::Model,
    user: &entity::users::Model,
    ttl_days: i64,
) -> Result<String> {
    let session_id = session.id;
    let result = SessionsEntity::update_many()
        .col_expr(Column::RevokedAt, Expr::value(Some(Utc::now())))
        .filter(Column::Id.eq(session_id))
        .filter(Column::RevokedAt.is_null())
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::unauthorized("Refresh token has been revoked"));
    }

    let token = create_session(db, user, ttl_days).await?;
    info!(user_id = user.id, old_session_id = session_id, "Refresh token rotated");
    Ok(token)
}

/// Revokes the session behind a raw token. Returns whether a live session was
/// found.
pub async fn revoke_session<C: ConnectionTrait>(db: &C, user_id: i32, token: &str) -> Result<bool> {
    let result = SessionsEntity::update_many()
        .col_expr(Column::RevokedAt, Expr::value(Some(Utc::now())))
        .filter(Column::RefreshTokenHash.eq(hash_refresh_token(token)))
        .filter(Column::UserId.eq(user_id))
        .filter(Column::RevokedAt.is_null())
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

/// Revokes every live session of a user.
pub async fn revoke_all_user_sessions<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<u64> {
    let result = SessionsEntity::update_many()
        .col_expr(Column::RevokedAt, Expr::value(Some(Utc::now())))
        .filter(Column::UserId.eq(user_id))
        .filter(Column::RevokedAt.is_null())
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Deletes expired sessions. Called once at startup.
pub async fn cleanup_expired_sessions<C: ConnectionTrait>(db: &C) -> Result<u64> {
    let result = SessionsEntity::delete_many()
        .filter(Column::ExpiresAt.lt(Utc::now()))
        .exec(db)
        .await
        .map_err(|e| AppError::database(format!("Failed to cleanup expired sessions: {}", e)))?;

    if result.rows_affected > 0 {
        info!(deleted = result.rows_affected, "Expired sessions removed");
    }
    Ok(result.rows_affected)
}
