//! Entity definitions for Workledger
//!
//! Sea-ORM entity definitions for the database models. Every table except
//! `companies` carries a `company_id` and is only ever queried through it.

pub mod sea_orm_active_enums;

pub mod billing_clients;
pub use billing_clients::Entity as BillingClients;
pub mod billing_project_mappings;
pub use billing_project_mappings::Entity as BillingProjectMappings;
pub mod billing_projects;
pub use billing_projects::Entity as BillingProjects;
pub mod billing_rates;
pub use billing_rates::Entity as BillingRates;
pub mod billing_worklog_classifications;
pub use billing_worklog_classifications::Entity as BillingWorklogClassifications;
pub mod companies;
pub use companies::Entity as Companies;
pub mod complementary_group_members;
pub use complementary_group_members::Entity as ComplementaryGroupMembers;
pub mod complementary_groups;
pub use complementary_groups::Entity as ComplementaryGroups;
pub mod holidays;
pub use holidays::Entity as Holidays;
pub mod invitations;
pub use invitations::Entity as Invitations;
pub mod invoice_line_items;
pub use invoice_line_items::Entity as InvoiceLineItems;
pub mod invoices;
pub use invoices::Entity as Invoices;
pub mod jira_instances;
pub use jira_instances::Entity as JiraInstances;
pub mod sessions;
pub use sessions::Entity as Sessions;
pub mod sync_history;
pub use sync_history::Entity as SyncHistory;
pub mod teams;
pub use teams::Entity as Teams;
pub mod user_jira_accounts;
pub use user_jira_accounts::Entity as UserJiraAccounts;
pub mod users;
pub use users::Entity as Users;
pub mod worklogs;
pub use worklogs::Entity as Worklogs;
