//! # API Router Configuration
//!
//! Every handler takes `&AppState` and an [`AuthenticatedUser`]; the wrappers
//! here adapt them to axum extractors. Public routes are the health check and
//! the login half of `/api/auth`; everything else passes through
//! [`auth_middleware`].

use axum::{
    extract::{Extension, State as AxumState},
    middleware,
    response::Response,
    routing::{get, post, put},
    Json,
    Router,
};
use error::Result;
use logging::request_id_middleware;

use crate::{
    dto::{analytics::*, auth::*, billing::*, settings::*, sync::*, worklogs::*, HealthResponse, SuccessResponse},
    extract::{ApiJson, ApiPath, ApiQuery},
    middleware::auth::{auth_middleware, AuthenticatedUser},
    AppState,
};

type User = Extension<AuthenticatedUser>;

/// Creates the `/api` router with all routes
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        // Auth
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/auth/me", get(me_handler))
        .route(
            "/api/invitations",
            get(list_invitations_handler).post(create_invitation_handler),
        )
        .route("/api/invitations/:id", axum::routing::delete(revoke_invitation_handler))
        // Settings
        .route("/api/settings/teams", get(list_teams_handler).post(create_team_handler))
        .route(
            "/api/settings/teams/:id",
            put(update_team_handler).delete(delete_team_handler),
        )
        .route("/api/settings/users", get(list_users_handler).post(create_user_handler))
        .route(
            "/api/settings/users/:id",
            get(get_user_handler)
                .put(update_user_handler)
                .delete(delete_user_handler),
        )
        .route("/api/settings/users/:id/jira-accounts", put(set_jira_account_handler))
        .route(
            "/api/settings/jira-instances",
            get(list_instances_handler).post(create_instance_handler),
        )
        .route(
            "/api/settings/jira-instances/:id",
            put(update_instance_handler).delete(delete_instance_handler),
        )
        .route("/api/settings/jira-instances/:id/test", post(test_connection_handler))
        .route(
            "/api/settings/jira-instances/:id/fetch-accounts",
            post(fetch_accounts_handler),
        )
        .route(
            "/api/settings/complementary-groups",
            get(list_groups_handler).post(create_group_handler),
        )
        .route(
            "/api/settings/complementary-groups/:id",
            axum::routing::delete(delete_group_handler),
        )
        .route(
            "/api/settings/holidays",
            get(list_holidays_handler).post(create_holiday_handler),
        )
        .route("/api/settings/holidays/:id", axum::routing::delete(delete_holiday_handler))
        // Sync and worklogs
        .route("/api/sync", post(run_sync_handler))
        .route("/api/sync/history", get(sync_history_handler))
        .route("/api/sync/status", get(sync_status_handler))
        .route("/api/sync/defaults", get(sync_defaults_handler))
        .route("/api/worklogs", get(list_worklogs_handler).delete(delete_worklogs_handler))
        // Analytics
        .route("/api/dashboard", get(dashboard_handler))
        .route("/api/epics", get(epics_handler))
        .route("/api/epics/:key", get(epic_detail_handler))
        .route("/api/teams", get(team_summaries_handler))
        .route("/api/teams/:name", get(team_report_handler))
        .route("/api/users", get(user_reports_handler))
        .route("/api/users/:id", get(user_report_handler))
        .route("/api/issues/:key", get(issue_detail_handler))
        // Billing
        .route("/api/billing/preview", post(preview_handler))
        .route(
            "/api/billing/clients",
            get(list_clients_handler).post(create_client_handler),
        )
        .route(
            "/api/billing/clients/:id",
            put(update_client_handler).delete(delete_client_handler),
        )
        .route(
            "/api/billing/projects",
            get(list_projects_handler).post(create_project_handler),
        )
        .route(
            "/api/billing/projects/:id",
            put(update_project_handler).delete(delete_project_handler),
        )
        .route(
            "/api/billing/projects/:id/mappings",
            get(list_mappings_handler).post(create_mapping_handler),
        )
        .route("/api/billing/mappings/:id", axum::routing::delete(delete_mapping_handler))
        .route("/api/billing/rates", get(list_rates_handler).post(create_rate_handler))
        .route("/api/billing/rates/:id", axum::routing::delete(delete_rate_handler))
        .route(
            "/api/billing/classifications",
            get(list_classifications_handler).put(upsert_classification_handler),
        )
        .route("/api/billing/classifications/bulk", post(bulk_classification_handler))
        .route(
            "/api/billing/invoices",
            get(list_invoices_handler).post(create_invoice_handler),
        )
        .route(
            "/api/billing/invoices/:id",
            get(get_invoice_handler).delete(delete_invoice_handler),
        )
        .route("/api/billing/invoices/:id/issue", post(issue_invoice_handler))
        .route("/api/billing/invoices/:id/void", post(void_invoice_handler))
        .route("/api/billing/invoices/:id/export.csv", get(export_invoice_handler))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let public_routes = Router::new()
        .route("/api/auth/login", get(login_handler))
        .route("/api/auth/callback", get(callback_handler))
        .route("/api/auth/refresh", post(refresh_handler))
        .route("/api/auth/dev/login", post(dev_login_handler))
        .route("/api/auth/config", get(config_handler));

    public_routes.merge(protected_routes).with_state(state)
}

// Auth

async fn login_handler(
    AxumState(state): AxumState<AppState>,
    ApiQuery(query): ApiQuery<LoginQuery>,
) -> Result<Json<LoginUrlResponse>> {
    crate::auth::handlers::login_handler(&state, query).await
}

async fn callback_handler(
    AxumState(state): AxumState<AppState>,
    ApiQuery(query): ApiQuery<CallbackQuery>,
) -> Result<Json<TokenResponse>> {
    crate::auth::handlers::callback_handler(&state, query).await
}

async fn refresh_handler(
    AxumState(state): AxumState<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> Result<Json<TokenResponse>> {
    crate::auth::handlers::refresh_handler(&state, req).await
}

async fn dev_login_handler(
    AxumState(state): AxumState<AppState>,
    req: Option<ApiJson<DevLoginRequest>>,
) -> Result<Json<TokenResponse>> {
    let req = req.map(|ApiJson(req)| req).unwrap_or_default();
    crate::auth::handlers::dev_login_handler(&state, req).await
}

async fn config_handler(AxumState(state): AxumState<AppState>) -> Result<Json<AuthConfigResponse>> {
    crate::auth::handlers::config_handler(&state).await
}

async fn logout_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    req: Option<ApiJson<LogoutRequest>>,
) -> Result<Json<SuccessResponse>> {
    let req = req.map(|ApiJson(req)| req).unwrap_or_default();
    crate::auth::handlers::logout_handler(&state, user, req).await
}

async fn me_handler(AxumState(state): AxumState<AppState>, Extension(user): User) -> Result<Json<MeResponse>> {
    crate::auth::handlers::me_handler(&state, user).await
}

async fn create_invitation_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiJson(req): ApiJson<CreateInvitationRequest>,
) -> Result<Json<InvitationResponse>> {
    crate::auth::invitations::create_invitation_handler(&state, user, req).await
}

async fn list_invitations_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
) -> Result<Json<InvitationListResponse>> {
    crate::auth::invitations::list_invitations_handler(&state, user).await
}

async fn revoke_invitation_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<SuccessResponse>> {
    crate::auth::invitations::revoke_invitation_handler(&state, user, id).await
}

// Settings

async fn list_teams_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
) -> Result<Json<TeamListResponse>> {
    crate::settings::teams::list_teams_handler(&state, user).await
}

async fn create_team_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiJson(req): ApiJson<TeamRequest>,
) -> Result<Json<TeamResponse>> {
    crate::settings::teams::create_team_handler(&state, user, req).await
}

async fn update_team_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<TeamRequest>,
) -> Result<Json<TeamResponse>> {
    crate::settings::teams::update_team_handler(&state, user, id, req).await
}

async fn delete_team_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<SuccessResponse>> {
    crate::settings::teams::delete_team_handler(&state, user, id).await
}

async fn list_users_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<Json<UserListResponse>> {
    crate::settings::users::list_users_handler(&state, user, query).await
}

async fn get_user_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<UserDetailResponse>> {
    crate::settings::users::get_user_handler(&state, user, id).await
}

async fn create_user_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<Json<UserDetailResponse>> {
    crate::settings::users::create_user_handler(&state, user, req).await
}

async fn update_user_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserDetailResponse>> {
    crate::settings::users::update_user_handler(&state, user, id, req).await
}

async fn delete_user_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<SuccessResponse>> {
    crate::settings::users::delete_user_handler(&state, user, id).await
}

async fn set_jira_account_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<JiraAccountRequest>,
) -> Result<Json<UserDetailResponse>> {
    crate::settings::users::set_jira_account_handler(&state, user, id, req).await
}

async fn list_instances_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
) -> Result<Json<JiraInstanceListResponse>> {
    crate::settings::jira_instances::list_instances_handler(&state, user).await
}

async fn create_instance_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiJson(req): ApiJson<CreateJiraInstanceRequest>,
) -> Result<Json<JiraInstanceResponse>> {
    crate::settings::jira_instances::create_instance_handler(&state, user, req).await
}

async fn update_instance_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<UpdateJiraInstanceRequest>,
) -> Result<Json<JiraInstanceResponse>> {
    crate::settings::jira_instances::update_instance_handler(&state, user, id, req).await
}

async fn delete_instance_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<SuccessResponse>> {
    crate::settings::jira_instances::delete_instance_handler(&state, user, id).await
}

async fn test_connection_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ConnectionTestResponse>> {
    crate::settings::jira_instances::test_connection_handler(&state, user, id).await
}

async fn fetch_accounts_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<FetchAccountsResponse>> {
    crate::settings::jira_instances::fetch_accounts_handler(&state, user, id).await
}

async fn list_groups_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
) -> Result<Json<ComplementaryGroupListResponse>> {
    crate::settings::groups::list_groups_handler(&state, user).await
}

async fn create_group_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiJson(req): ApiJson<CreateComplementaryGroupRequest>,
) -> Result<Json<ComplementaryGroupResponse>> {
    crate::settings::groups::create_group_handler(&state, user, req).await
}

async fn delete_group_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<SuccessResponse>> {
    crate::settings::groups::delete_group_handler(&state, user, id).await
}

async fn list_holidays_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiQuery(query): ApiQuery<HolidayListQuery>,
) -> Result<Json<HolidayListResponse>> {
    crate::settings::holidays::list_holidays_handler(&state, user, query).await
}

async fn create_holiday_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiJson(req): ApiJson<CreateHolidayRequest>,
) -> Result<Json<HolidayResponse>> {
    crate::settings::holidays::create_holiday_handler(&state, user, req).await
}

async fn delete_holiday_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<SuccessResponse>> {
    crate::settings::holidays::delete_holiday_handler(&state, user, id).await
}

// Sync and worklogs

async fn run_sync_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiJson(req): ApiJson<SyncRequest>,
) -> Result<Json<SyncResponse>> {
    crate::sync::run_sync_handler(&state, user, req).await
}

async fn sync_history_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiQuery(query): ApiQuery<SyncHistoryQuery>,
) -> Result<Json<SyncHistoryResponse>> {
    crate::sync::sync_history_handler(&state, user, query).await
}

async fn sync_status_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
) -> Result<Json<SyncStatusResponse>> {
    crate::sync::sync_status_handler(&state, user).await
}

async fn sync_defaults_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
) -> Result<Json<SyncDefaultsResponse>> {
    crate::sync::sync_defaults_handler(&state, user).await
}

async fn list_worklogs_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiQuery(query): ApiQuery<WorklogListQuery>,
) -> Result<Json<WorklogListResponse>> {
    crate::worklogs::list_worklogs_handler(&state, user, query).await
}

async fn delete_worklogs_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiQuery(query): ApiQuery<WorklogDeleteQuery>,
) -> Result<Json<WorklogDeleteResponse>> {
    crate::worklogs::delete_worklogs_handler(&state, user, query).await
}

// Analytics

async fn dashboard_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<Json<DashboardResponse>> {
    crate::analytics::dashboard_handler(&state, user, query).await
}

async fn epics_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<Json<EpicListResponse>> {
    crate::analytics::epics_handler(&state, user, query).await
}

async fn epic_detail_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(key): ApiPath<String>,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<Json<EpicDetailResponse>> {
    crate::analytics::epic_detail_handler(&state, user, key, query).await
}

async fn team_summaries_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
) -> Result<Json<TeamSummaryListResponse>> {
    crate::analytics::team_summaries_handler(&state, user).await
}

async fn team_report_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(name): ApiPath<String>,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<Json<TeamReportResponse>> {
    crate::analytics::team_report_handler(&state, user, name, query).await
}

async fn user_reports_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiQuery(query): ApiQuery<UserReportQuery>,
) -> Result<Json<UserReportListResponse>> {
    crate::analytics::user_reports_handler(&state, user, query).await
}

async fn user_report_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<Json<UserReportResponse>> {
    crate::analytics::user_report_handler(&state, user, id, query).await
}

async fn issue_detail_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(key): ApiPath<String>,
    ApiQuery(query): ApiQuery<IssueReportQuery>,
) -> Result<Json<IssueDetailResponse>> {
    crate::analytics::issue_detail_handler(&state, user, key, query).await
}

// Billing

async fn preview_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiJson(req): ApiJson<BillingPreviewRequest>,
) -> Result<Json<BillingPreviewResponse>> {
    crate::billing::preview::preview_handler(&state, user, req).await
}

async fn list_clients_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
) -> Result<Json<ClientListResponse>> {
    crate::billing::catalog::list_clients_handler(&state, user).await
}

async fn create_client_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiJson(req): ApiJson<CreateClientRequest>,
) -> Result<Json<ClientResponse>> {
    crate::billing::catalog::create_client_handler(&state, user, req).await
}

async fn update_client_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<UpdateClientRequest>,
) -> Result<Json<ClientResponse>> {
    crate::billing::catalog::update_client_handler(&state, user, id, req).await
}

async fn delete_client_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<SuccessResponse>> {
    crate::billing::catalog::delete_client_handler(&state, user, id).await
}

async fn list_projects_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiQuery(query): ApiQuery<ProjectListQuery>,
) -> Result<Json<ProjectListResponse>> {
    crate::billing::catalog::list_projects_handler(&state, user, query).await
}

async fn create_project_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> Result<Json<ProjectResponse>> {
    crate::billing::catalog::create_project_handler(&state, user, req).await
}

async fn update_project_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>> {
    crate::billing::catalog::update_project_handler(&state, user, id, req).await
}

async fn delete_project_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<SuccessResponse>> {
    crate::billing::catalog::delete_project_handler(&state, user, id).await
}

async fn list_mappings_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<MappingListResponse>> {
    crate::billing::catalog::list_mappings_handler(&state, user, id).await
}

async fn create_mapping_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<CreateMappingRequest>,
) -> Result<Json<MappingResponse>> {
    crate::billing::catalog::create_mapping_handler(&state, user, id, req).await
}

async fn delete_mapping_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<SuccessResponse>> {
    crate::billing::catalog::delete_mapping_handler(&state, user, id).await
}

async fn list_rates_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiQuery(query): ApiQuery<RateListQuery>,
) -> Result<Json<RateListResponse>> {
    crate::billing::catalog::list_rates_handler(&state, user, query).await
}

async fn create_rate_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiJson(req): ApiJson<CreateRateRequest>,
) -> Result<Json<RateResponse>> {
    crate::billing::catalog::create_rate_handler(&state, user, req).await
}

async fn delete_rate_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<SuccessResponse>> {
    crate::billing::catalog::delete_rate_handler(&state, user, id).await
}

async fn list_classifications_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiQuery(query): ApiQuery<ClassificationListQuery>,
) -> Result<Json<ClassificationListResponse>> {
    crate::billing::catalog::list_classifications_handler(&state, user, query).await
}

async fn upsert_classification_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiJson(req): ApiJson<UpsertClassificationRequest>,
) -> Result<Json<ClassificationResponse>> {
    crate::billing::catalog::upsert_classification_handler(&state, user, req).await
}

async fn bulk_classification_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiJson(req): ApiJson<BulkClassificationRequest>,
) -> Result<Json<BulkClassificationResponse>> {
    crate::billing::catalog::bulk_classification_handler(&state, user, req).await
}

async fn create_invoice_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiJson(req): ApiJson<CreateInvoiceRequest>,
) -> Result<Json<InvoiceResponse>> {
    crate::billing::invoices::create_invoice_handler(&state, user, req).await
}

async fn list_invoices_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiQuery(query): ApiQuery<InvoiceListQuery>,
) -> Result<Json<InvoiceListResponse>> {
    crate::billing::invoices::list_invoices_handler(&state, user, query).await
}

async fn get_invoice_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<InvoiceResponse>> {
    crate::billing::invoices::get_invoice_handler(&state, user, id).await
}

async fn issue_invoice_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<InvoiceResponse>> {
    crate::billing::invoices::issue_invoice_handler(&state, user, id).await
}

async fn void_invoice_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<InvoiceResponse>> {
    crate::billing::invoices::void_invoice_handler(&state, user, id).await
}

async fn delete_invoice_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<SuccessResponse>> {
    crate::billing::invoices::delete_invoice_handler(&state, user, id).await
}

async fn export_invoice_handler(
    AxumState(state): AxumState<AppState>,
    Extension(user): User,
    ApiPath(id): ApiPath<i32>,
) -> Result<Response> {
    crate::billing::export::export_invoice_handler(&state, user, id).await
}

/// Liveness probe with build version and uptime
async fn health_handler(AxumState(state): AxumState<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status:         "ok",
        version:        env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// Creates the health check router
pub fn create_health_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Creates the main application router
///
/// Health checks plus the API, all wrapped by the request-id middleware.
pub fn create_app_router(state: AppState) -> Router {
    Router::new()
        .merge(create_health_router(state.clone()))
        .merge(create_router(state))
        .layer(middleware::from_fn(request_id_middleware))
}
