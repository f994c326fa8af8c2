//! Complementary-group folding.
//!
//! Instances in one group record the same work twice. Without an instance
//! filter only the group's primary (or, lacking one, its lowest-id member) is
//! counted, so the group shows up once.

use std::collections::{HashMap, HashSet};

use entity::{
    complementary_group_members::{Column as MemberColumn, Entity as MembersEntity},
    complementary_groups::{Column as GroupColumn, Entity as GroupsEntity},
    jira_instances::{Column as InstanceColumn, Entity as JiraInstancesEntity},
};
use error::Result;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

/// A group as seen by the folding rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMembership {
    pub primary_instance_id: Option<i32>,
    pub member_ids:          Vec<i32>,
}

impl GroupMembership {
    /// The member whose worklogs are counted.
    pub fn counted_member(&self) -> Option<i32> {
        self.primary_instance_id
            .filter(|p| self.member_ids.contains(p))
            .or_else(|| self.member_ids.iter().min().copied())
    }
}

/// Instance ids excluded from unfiltered aggregates.
pub fn excluded_instance_ids(groups: &[GroupMembership]) -> HashSet<i32> {
    groups
        .iter()
        .flat_map(|group| {
            let counted = group.counted_member();
            group
                .member_ids
                .iter()
                .copied()
                .filter(move |id| Some(*id) != counted)
        })
        .collect()
}

/// Names of the instances whose worklogs are excluded for `company_id`.
pub async fn excluded_instance_names<C: ConnectionTrait>(db: &C, company_id: i32) -> Result<HashSet<String>> {
    let groups = GroupsEntity::find()
        .filter(GroupColumn::CompanyId.eq(company_id))
        .all(db)
        .await?;
    if groups.is_empty() {
        return Ok(HashSet::new());
    }

    let members = MembersEntity::find()
        .filter(MemberColumn::GroupId.is_in(groups.iter().map(|g| g.id)))
        .all(db)
        .await?;
    let mut by_group: HashMap<i32, Vec<i32>> = HashMap::new();
    for member in members {
        by_group.entry(member.group_id).or_default().push(member.instance_id);
    }

    let memberships: Vec<GroupMembership> = groups
        .into_iter()
        .map(|g| {
            GroupMembership {
                primary_instance_id: g.primary_instance_id,
                member_ids:          by_group.remove(&g.id).unwrap_or_default(),
            }
        })
        .collect();
    let excluded = excluded_instance_ids(&memberships);
    if excluded.is_empty() {
        return Ok(HashSet::new());
    }

    Ok(JiraInstancesEntity::find()
        .filter(InstanceColumn::CompanyId.eq(company_id))
        .filter(InstanceColumn::Id.is_in(excluded))
        .all(db)
        .await?
        .into_iter()
        .map(|i| i.name)
        .collect())
}
