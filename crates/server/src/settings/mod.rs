//! # Settings Module
//!
//! Per-company configuration: teams, users and their JIRA accounts, JIRA
//! instances, complementary groups and holidays. Reads are open to every
//! role; mutations require ADMIN.

pub mod groups;
pub mod holidays;
pub mod jira_instances;
pub mod teams;
pub mod users;
