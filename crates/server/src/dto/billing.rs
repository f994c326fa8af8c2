//! # Billing Data Transfer Objects
//!
//! Catalog (clients, projects, mappings, rates, classifications), preview and
//! invoices.

use chrono::{DateTime, NaiveDate, Utc};
use entity::sea_orm_active_enums::InvoiceStatus;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::double_option;

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct CreateClientRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name:                String,
    #[validate(length(equal = 3, message = "Currency must be a three-letter code"))]
    pub billing_currency:    Option<String>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub default_hourly_rate: Option<f64>,
}

/// Partial client update; `default_hourly_rate: null` clears the rate
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
pub struct UpdateClientRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name:                Option<String>,
    #[validate(length(equal = 3, message = "Currency must be a three-letter code"))]
    pub billing_currency:    Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub default_hourly_rate: Option<Option<f64>>,
}

impl UpdateClientRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.billing_currency.is_none() && self.default_hourly_rate.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientResponse {
    pub id:                  i32,
    pub name:                String,
    pub billing_currency:    String,
    pub default_hourly_rate: Option<f64>,
    pub created_at:          DateTime<Utc>,
}

impl From<entity::billing_clients::Model> for ClientResponse {
    fn from(client: entity::billing_clients::Model) -> Self {
        Self {
            id:                  client.id,
            name:                client.name,
            billing_currency:    client.billing_currency,
            default_hourly_rate: client.default_hourly_rate,
            created_at:          client.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientListResponse {
    pub clients: Vec<ClientResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectListQuery {
    pub client_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct CreateProjectRequest {
    pub client_id:           i32,
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name:                String,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub default_hourly_rate: Option<f64>,
}

/// Partial project update; `default_hourly_rate: null` clears the rate
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name:                Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub default_hourly_rate: Option<Option<f64>>,
}

impl UpdateProjectRequest {
    pub fn is_empty(&self) -> bool { self.name.is_none() && self.default_hourly_rate.is_none() }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectResponse {
    pub id:                  i32,
    pub client_id:           i32,
    pub name:                String,
    pub default_hourly_rate: Option<f64>,
    pub created_at:          DateTime<Utc>,
}

impl From<entity::billing_projects::Model> for ProjectResponse {
    fn from(project: entity::billing_projects::Model) -> Self {
        Self {
            id:                  project.id,
            client_id:           project.client_id,
            name:                project.name,
            default_hourly_rate: project.default_hourly_rate,
            created_at:          project.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct CreateMappingRequest {
    #[validate(length(min = 1, message = "JIRA instance is required"))]
    pub jira_instance:    String,
    #[validate(length(min = 1, max = 50, message = "Project key must be between 1 and 50 characters"))]
    pub jira_project_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingResponse {
    pub id:               i32,
    pub project_id:       i32,
    pub jira_instance:    String,
    pub jira_project_key: String,
}

impl From<entity::billing_project_mappings::Model> for MappingResponse {
    fn from(mapping: entity::billing_project_mappings::Model) -> Self {
        Self {
            id:               mapping.id,
            project_id:       mapping.project_id,
            jira_instance:    mapping.jira_instance,
            jira_project_key: mapping.jira_project_key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingListResponse {
    pub mappings: Vec<MappingResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateListQuery {
    pub project_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct CreateRateRequest {
    pub project_id:  i32,
    #[validate(email(message = "Invalid email format"))]
    pub user_email:  Option<String>,
    #[validate(length(min = 1, max = 50, message = "Issue type must be between 1 and 50 characters"))]
    pub issue_type:  Option<String>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub hourly_rate: f64,
    pub valid_from:  Option<NaiveDate>,
    pub valid_to:    Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateResponse {
    pub id:          i32,
    pub project_id:  i32,
    pub user_email:  Option<String>,
    pub issue_type:  Option<String>,
    pub hourly_rate: f64,
    pub valid_from:  Option<NaiveDate>,
    pub valid_to:    Option<NaiveDate>,
}

impl From<entity::billing_rates::Model> for RateResponse {
    fn from(rate: entity::billing_rates::Model) -> Self {
        Self {
            id:          rate.id,
            project_id:  rate.project_id,
            user_email:  rate.user_email,
            issue_type:  rate.issue_type,
            hourly_rate: rate.hourly_rate,
            valid_from:  rate.valid_from,
            valid_to:    rate.valid_to,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateListResponse {
    pub rates: Vec<RateResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassificationListQuery {
    pub jira_instance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct UpsertClassificationRequest {
    #[validate(length(min = 1, message = "Worklog id is required"))]
    pub worklog_id:           String,
    #[validate(length(min = 1, message = "JIRA instance is required"))]
    pub jira_instance:        String,
    #[serde(default = "default_true")]
    pub is_billable:          bool,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub override_hourly_rate: Option<f64>,
    #[validate(length(max = 1000, message = "Note must not exceed 1000 characters"))]
    pub note:                 Option<String>,
}

fn default_true() -> bool { true }

/// One worklog, identified the way it is stored
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
pub struct WorklogRef {
    #[validate(length(min = 1, message = "Worklog id is required"))]
    pub worklog_id:    String,
    #[validate(length(min = 1, message = "JIRA instance is required"))]
    pub jira_instance: String,
}

/// Request body for `POST /api/billing/classifications/bulk`
///
/// Sets billability and note on every listed worklog; rate overrides are kept.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct BulkClassificationRequest {
    #[validate(
        length(min = 1, max = 1000, message = "Between 1 and 1000 worklogs per request"),
        nested
    )]
    pub worklogs:    Vec<WorklogRef>,
    #[serde(default = "default_true")]
    pub is_billable: bool,
    #[validate(length(max = 1000, message = "Note must not exceed 1000 characters"))]
    pub note:        Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkClassificationResponse {
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResponse {
    pub id:                   i32,
    pub worklog_id:           String,
    pub jira_instance:        String,
    pub is_billable:          bool,
    pub override_hourly_rate: Option<f64>,
    pub note:                 Option<String>,
    pub updated_at:           DateTime<Utc>,
}

impl From<entity::billing_worklog_classifications::Model> for ClassificationResponse {
    fn from(row: entity::billing_worklog_classifications::Model) -> Self {
        Self {
            id:                   row.id,
            worklog_id:           row.worklog_id,
            jira_instance:        row.jira_instance,
            is_billable:          row.is_billable,
            override_hourly_rate: row.override_hourly_rate,
            note:                 row.note,
            updated_at:           row.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationListResponse {
    pub classifications: Vec<ClassificationResponse>,
}

/// How preview and invoice lines are grouped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Project,
    User,
    Issue,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Project => "project",
            GroupBy::User => "user",
            GroupBy::Issue => "issue",
        }
    }
}

/// Request body for `POST /api/billing/preview`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BillingPreviewRequest {
    pub client_id:  i32,
    pub project_id: Option<i32>,
    pub start_date: NaiveDate,
    pub end_date:   NaiveDate,
    #[serde(default)]
    pub group_by:   GroupBy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewLineItem {
    pub group_key:      String,
    pub description:    String,
    pub quantity_hours: f64,
    pub hourly_rate:    f64,
    pub amount:         f64,
    pub metadata:       serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnratedWorklog {
    pub worklog_id:    String,
    pub jira_instance: String,
    pub issue_key:     String,
    pub author_email:  String,
    pub hours:         f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingPreviewResponse {
    pub client_id:          i32,
    pub project_id:         Option<i32>,
    pub start_date:         NaiveDate,
    pub end_date:           NaiveDate,
    pub group_by:           GroupBy,
    pub currency:           String,
    pub line_items:         Vec<PreviewLineItem>,
    pub subtotal_amount:    f64,
    pub billable_hours:     f64,
    pub non_billable_hours: f64,
    pub unrated_hours:      f64,
    pub unrated_worklogs:   Vec<UnratedWorklog>,
}

/// Request body for `POST /api/billing/invoices`
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    pub client_id:    i32,
    pub project_id:   Option<i32>,
    pub start_date:   NaiveDate,
    pub end_date:     NaiveDate,
    #[serde(default)]
    pub group_by:     GroupBy,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub taxes_amount: Option<f64>,
}

impl CreateInvoiceRequest {
    pub fn preview_request(&self) -> BillingPreviewRequest {
        BillingPreviewRequest {
            client_id:  self.client_id,
            project_id: self.project_id,
            start_date: self.start_date,
            end_date:   self.end_date,
            group_by:   self.group_by,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceListQuery {
    pub client_id: Option<i32>,
    pub status:    Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceLineItemResponse {
    pub id:             i32,
    pub line_type:      String,
    pub group_key:      String,
    pub description:    String,
    pub quantity_hours: f64,
    pub hourly_rate:    f64,
    pub amount:         f64,
    pub sort_order:     i32,
    pub metadata:       Option<serde_json::Value>,
}

impl From<entity::invoice_line_items::Model> for InvoiceLineItemResponse {
    fn from(item: entity::invoice_line_items::Model) -> Self {
        Self {
            metadata:       item
                .metadata
                .as_deref()
                .and_then(|m| serde_json::from_str(m).ok()),
            id:             item.id,
            line_type:      item.line_type,
            group_key:      item.group_key,
            description:    item.description,
            quantity_hours: item.quantity_hours,
            hourly_rate:    item.hourly_rate,
            amount:         item.amount,
            sort_order:     item.sort_order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceResponse {
    pub id:              i32,
    pub client_id:       i32,
    pub project_id:      Option<i32>,
    pub period_start:    NaiveDate,
    pub period_end:      NaiveDate,
    pub status:          InvoiceStatus,
    pub currency:        String,
    pub subtotal_amount: f64,
    pub taxes_amount:    f64,
    pub total_amount:    f64,
    pub group_by:        String,
    pub issued_at:       Option<DateTime<Utc>>,
    pub voided_at:       Option<DateTime<Utc>>,
    pub created_by:      i32,
    pub created_at:      DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_items:      Option<Vec<InvoiceLineItemResponse>>,
}

impl From<entity::invoices::Model> for InvoiceResponse {
    fn from(invoice: entity::invoices::Model) -> Self {
        Self {
            id:              invoice.id,
            client_id:       invoice.client_id,
            project_id:      invoice.project_id,
            period_start:    invoice.period_start,
            period_end:      invoice.period_end,
            status:          invoice.status,
            currency:        invoice.currency,
            subtotal_amount: invoice.subtotal_amount,
            taxes_amount:    invoice.taxes_amount,
            total_amount:    invoice.total_amount,
            group_by:        invoice.group_by,
            issued_at:       invoice.issued_at,
            voided_at:       invoice.voided_at,
            created_by:      invoice.created_by,
            created_at:      invoice.created_at,
            line_items:      None,
        }
    }
}

impl InvoiceResponse {
    pub fn with_line_items(mut self, items: Vec<entity::invoice_line_items::Model>) -> Self {
        self.line_items = Some(items.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceListResponse {
    pub invoices: Vec<InvoiceResponse>,
}
