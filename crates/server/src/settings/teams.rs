//! # Team Handlers

use std::collections::HashMap;

use axum::Json;
use chrono::Utc;
use entity::{
    teams::{Column as TeamColumn, Entity as TeamsEntity},
    users::{Column as UserColumn, Entity as UsersEntity},
};
use error::{AppError, Result};
use sea_orm::{
    prelude::Expr,
    ActiveModelTrait,
    ColumnTrait,
    EntityTrait,
    PaginatorTrait,
    QueryFilter,
    QueryOrder,
    Set,
    TransactionTrait,
};
use tracing::info;
use validator::Validate;

use crate::{
    dto::{
        settings::{TeamListResponse, TeamRequest, TeamResponse},
        SuccessResponse,
    },
    middleware::auth::AuthenticatedUser,
    AppState,
};

fn team_to_response(team: entity::teams::Model, member_count: u64) -> TeamResponse {
    TeamResponse {
        id: team.id,
        name: team.name,
        member_count,
        created_at: team.created_at,
    }
}

async fn ensure_unique_name(state: &AppState, company_id: i32, name: &str, except: Option<i32>) -> Result<()> {
    let mut query = TeamsEntity::find()
        .filter(TeamColumn::CompanyId.eq(company_id))
        .filter(TeamColumn::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(TeamColumn::Id.ne(id));
    }

    if query.count(&state.db).await? > 0 {
        return Err(AppError::conflict("A team with this name already exists"));
    }
    Ok(())
}

pub async fn list_teams_handler(state: &AppState, user: AuthenticatedUser) -> Result<Json<TeamListResponse>> {
    let teams = TeamsEntity::find()
        .filter(TeamColumn::CompanyId.eq(user.company_id))
        .order_by_asc(TeamColumn::Name)
        .all(&state.db)
        .await?;

    let members = UsersEntity::find()
        .filter(UserColumn::CompanyId.eq(user.company_id))
        .filter(UserColumn::TeamId.is_not_null())
        .all(&state.db)
        .await?;
    let mut counts: HashMap<i32, u64> = HashMap::new();
    for team_id in members.iter().filter_map(|m| m.team_id) {
        *counts.entry(team_id).or_default() += 1;
    }

    Ok(Json(TeamListResponse {
        teams: teams
            .into_iter()
            .map(|team| {
                let count = counts.get(&team.id).copied().unwrap_or(0);
                team_to_response(team, count)
            })
            .collect(),
    }))
}

pub async fn create_team_handler(
    state: &AppState,
    user: AuthenticatedUser,
    req: TeamRequest,
) -> Result<Json<TeamResponse>> {
    user.require_admin()?;
    req.validate()?;

    let name = req.name.trim().to_string();
    ensure_unique_name(state, user.company_id, &name, None).await?;

    let team = entity::teams::ActiveModel {
        company_id: Set(user.company_id),
        name: Set(name),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(team_id = team.id, company_id = user.company_id, "Team created");
    Ok(Json(team_to_response(team, 0)))
}

pub async fn update_team_handler(
    state: &AppState,
    user: AuthenticatedUser,
    team_id: i32,
    req: TeamRequest,
) -> Result<Json<TeamResponse>> {
    user.require_admin()?;
    req.validate()?;

    let team = TeamsEntity::find_by_id(team_id)
        .filter(TeamColumn::CompanyId.eq(user.company_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("Team not found"))?;

    let name = req.name.trim().to_string();
    ensure_unique_name(state, user.company_id, &name, Some(team_id)).await?;

    let mut active: entity::teams::ActiveModel = team.into();
    active.name = Set(name);
    let team = active.update(&state.db).await?;

    let member_count = UsersEntity::find()
        .filter(UserColumn::CompanyId.eq(user.company_id))
        .filter(UserColumn::TeamId.eq(team_id))
        .count(&state.db)
        .await?;

    info!(team_id, company_id = user.company_id, "Team renamed");
    Ok(Json(team_to_response(team, member_count)))
}

/// Deletes a team after unassigning its members.
pub async fn delete_team_handler(
    state: &AppState,
    user: AuthenticatedUser,
    team_id: i32,
) -> Result<Json<SuccessResponse>> {
    user.require_admin()?;

    let team = TeamsEntity::find_by_id(team_id)
        .filter(TeamColumn::CompanyId.eq(user.company_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("Team not found"))?;

    let txn = state.db.begin().await?;
    let unassigned = UsersEntity::update_many()
        .col_expr(UserColumn::TeamId, Expr::value(Option::<i32>::None))
        .filter(UserColumn::CompanyId.eq(user.company_id))
        .filter(UserColumn::TeamId.eq(team.id))
        .exec(&txn)
        .await?
        .rows_affected;
    TeamsEntity::delete_by_id(team.id).exec(&txn).await?;
    txn.commit().await?;

    info!(team_id, company_id = user.company_id, unassigned, "Team deleted");
    Ok(Json(SuccessResponse::new("Team deleted")))
}
