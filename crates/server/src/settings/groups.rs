//! # Complementary Group Handlers
//!
//! A complementary group marks JIRA instances that track the same work. The
//! dashboard counts only the primary member of each group.

use std::collections::{HashMap, HashSet};

use axum::Json;
use chrono::Utc;
use entity::{
    complementary_group_members::{Column as MemberColumn, Entity as MembersEntity},
    complementary_groups::{Column, Entity as GroupsEntity},
    jira_instances::{Column as InstanceColumn, Entity as JiraInstancesEntity},
};
use error::{AppError, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use tracing::info;
use validator::Validate;

use crate::{
    dto::{
        settings::{
            ComplementaryGroupListResponse,
            ComplementaryGroupResponse,
            CreateComplementaryGroupRequest,
            GroupInstanceResponse,
        },
        SuccessResponse,
    },
    middleware::auth::AuthenticatedUser,
    AppState,
};

pub async fn list_groups_handler(
    state: &AppState,
    user: AuthenticatedUser,
) -> Result<Json<ComplementaryGroupListResponse>> {
    let groups = GroupsEntity::find()
        .filter(Column::CompanyId.eq(user.company_id))
        .order_by_asc(Column::Name)
        .all(&state.db)
        .await?;
    let group_ids: Vec<i32> = groups.iter().map(|g| g.id).collect();

    let members = MembersEntity::find()
        .filter(MemberColumn::GroupId.is_in(group_ids))
        .all(&state.db)
        .await?;
    let instance_names: HashMap<i32, String> = JiraInstancesEntity::find()
        .filter(InstanceColumn::CompanyId.eq(user.company_id))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|i| (i.id, i.name))
        .collect();

    let mut by_group: HashMap<i32, Vec<GroupInstanceResponse>> = HashMap::new();
    for member in members {
        if let Some(name) = instance_names.get(&member.instance_id) {
            by_group
                .entry(member.group_id)
                .or_default()
                .push(GroupInstanceResponse {
                    id:   member.instance_id,
                    name: name.clone(),
                });
        }
    }

    Ok(Json(ComplementaryGroupListResponse {
        groups: groups
            .into_iter()
            .map(|group| {
                let mut instances = by_group.remove(&group.id).unwrap_or_default();
                instances.sort_by_key(|i| i.id);
                ComplementaryGroupResponse {
                    id: group.id,
                    name: group.name,
                    primary_instance_id: group.primary_instance_id,
                    instances,
                }
            })
            .collect(),
    }))
}

/// Creates a group. Every instance must belong to the caller's company and
/// may only be in one group; the primary must be one of the members.
pub async fn create_group_handler(
    state: &AppState,
    user: AuthenticatedUser,
    req: CreateComplementaryGroupRequest,
) -> Result<Json<ComplementaryGroupResponse>> {
    user.require_admin()?;
    req.validate()?;

    let requested: HashSet<i32> = req.instance_ids.iter().copied().collect();
    if requested.len() < 2 {
        return Err(AppError::validation("A group needs at least two distinct instances"));
    }

    let instances = JiraInstancesEntity::find()
        .filter(InstanceColumn::CompanyId.eq(user.company_id))
        .filter(InstanceColumn::Id.is_in(requested.iter().copied()))
        .order_by_asc(InstanceColumn::Id)
        .all(&state.db)
        .await?;
    if instances.len() != requested.len() {
        return Err(AppError::not_found("JIRA instance not found"));
    }

    if let Some(primary) = req.primary_instance_id {
        if !requested.contains(&primary) {
            return Err(AppError::validation("Primary instance must be a member of the group"));
        }
    }

    let taken = MembersEntity::find()
        .filter(MemberColumn::InstanceId.is_in(requested.iter().copied()))
        .one(&state.db)
        .await?;
    if let Some(member) = taken {
        return Err(AppError::conflict(format!(
            "JIRA instance {} already belongs to a complementary group",
            member.instance_id
        )));
    }

    let txn = state.db.begin().await?;
    let group = entity::complementary_groups::ActiveModel {
        company_id: Set(user.company_id),
        name: Set(req.name.trim().to_string()),
        primary_instance_id: Set(req.primary_instance_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    MembersEntity::insert_many(instances.iter().map(|instance| {
        entity::complementary_group_members::ActiveModel {
            group_id:    Set(group.id),
            instance_id: Set(instance.id),
        }
    }))
    .exec_without_returning(&txn)
    .await?;
    txn.commit().await?;

    info!(group_id = group.id, company_id = user.company_id, members = instances.len(), "Complementary group created");

    Ok(Json(ComplementaryGroupResponse {
        id:                  group.id,
        name:                group.name,
        primary_instance_id: group.primary_instance_id,
        instances:           instances
            .into_iter()
            .map(|i| {
                GroupInstanceResponse {
                    id:   i.id,
                    name: i.name,
                }
            })
            .collect(),
    }))
}

pub async fn delete_group_handler(
    state: &AppState,
    user: AuthenticatedUser,
    group_id: i32,
) -> Result<Json<SuccessResponse>> {
    user.require_admin()?;

    let group = GroupsEntity::find_by_id(group_id)
        .filter(Column::CompanyId.eq(user.company_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("Complementary group not found"))?;

    let txn = state.db.begin().await?;
    MembersEntity::delete_many()
        .filter(MemberColumn::GroupId.eq(group.id))
        .exec(&txn)
        .await?;
    GroupsEntity::delete_by_id(group.id).exec(&txn).await?;
    txn.commit().await?;

    info!(group_id, company_id = user.company_id, "Complementary group deleted");
    Ok(Json(SuccessResponse::new("Complementary group deleted")))
}
