//! # Common Test Utilities
//!
//! In-memory SQLite database with the full schema, tenant fixtures, token
//! minting and a one-shot request helper for the router.

#![allow(dead_code)]

use std::{sync::Once, time::Duration};

use ::auth::{create_access_token, JwtConfig, Role};
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use entity::sea_orm_active_enums::InvoiceStatus;
use integrations::{RawWorklog, RetryConfig};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DbConn, Set};
use secrecy::SecretString;
use serde_json::Value;
use server::{create_app_router, http_client, AppState, ServerSettings};
use tower::ServiceExt;

static INIT: Once = Once::new();

/// Initialize test logging (run once per test binary)
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

pub fn jwt_config() -> JwtConfig {
    JwtConfig::new(SecretString::from(
        BASE64.encode(b"workledger-test-secret-32-bytes!"),
    ))
}

/// Fresh database with every migration applied.
///
/// A single connection keeps every query on the same in-memory database.
pub async fn test_db() -> DbConn {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub struct TestApp {
    pub state:  AppState,
    pub router: Router,
}

impl TestApp {
    pub async fn new() -> Self { Self::with(|state| state).await }

    pub async fn with_settings(settings: ServerSettings) -> Self {
        Self::with(|state| state.with_settings(settings)).await
    }

    /// Builds the app from a state adjusted by `configure`.
    pub async fn with(configure: impl FnOnce(AppState) -> AppState) -> Self {
        init_test_env();
        let http = http_client(Duration::from_secs(5)).unwrap();
        let state = AppState::new(test_db().await, jwt_config(), http).with_retry(
            RetryConfig::default()
                .with_max_retries(1)
                .with_initial_delay(Duration::from_millis(5))
                .with_jitter(false),
        );
        let state = configure(state);
        let router = create_app_router(state.clone());
        Self {
            state,
            router,
        }
    }

    pub fn db(&self) -> &DbConn { &self.state.db }

    pub fn token(&self, user: &entity::users::Model) -> String {
        let role = Role::from_string(&user.role).unwrap_or(Role::User);
        create_access_token(&self.state.jwt_config, user.id, &user.email, user.company_id, role).unwrap()
    }

    /// Sends one request and returns the status and the JSON body
    /// (`Value::Null` when the body is empty).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => {
                builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap()
            },
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        }
        else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// GET returning the headers and the body as text, for non-JSON responses.
    pub async fn get_raw(&self, uri: &str, token: &str) -> (StatusCode, HeaderMap, String) {
        let request = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }
}

pub async fn seed_company(db: &DbConn, name: &str) -> entity::companies::Model {
    entity::companies::ActiveModel {
        name: Set(name.to_string()),
        domain: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_user(db: &DbConn, company_id: i32, email: &str, role: Role) -> entity::users::Model {
    entity::users::ActiveModel {
        company_id: Set(company_id),
        email: Set(email.to_string()),
        first_name: Set("Test".to_string()),
        last_name: Set("User".to_string()),
        role: Set(role.as_str().to_string()),
        team_id: Set(None),
        google_id: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        last_login_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_instance(db: &DbConn, company_id: i32, name: &str, url: &str) -> entity::jira_instances::Model {
    entity::jira_instances::ActiveModel {
        company_id: Set(company_id),
        name: Set(name.to_string()),
        url: Set(url.to_string()),
        email: Set("bot@acme.test".to_string()),
        api_token: Set("jira-token".to_string()),
        tempo_api_token: Set(None),
        billing_client_id: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

/// A worklog already carrying its issue key and hierarchy.
pub fn raw_worklog(id: &str, instance: &str, issue_key: &str, author: &str, seconds: i64, started: &str) -> RawWorklog {
    RawWorklog {
        id:                  id.to_string(),
        jira_instance:       instance.to_string(),
        issue_key:           issue_key.to_string(),
        issue_id:            None,
        issue_summary:       format!("Work on {}", issue_key),
        author_email:        author.to_string(),
        author_display_name: String::new(),
        author_account_id:   None,
        time_spent_seconds:  seconds,
        started:             at(started),
        epic_key:            None,
        epic_name:           None,
        parent_key:          None,
        parent_name:         None,
        parent_type:         None,
    }
}

pub async fn seed_worklogs(db: &DbConn, company_id: i32, worklogs: Vec<RawWorklog>) {
    server::worklogs::upsert_worklogs(db, company_id, worklogs)
        .await
        .unwrap();
}

pub fn status_of(value: &Value) -> Option<InvoiceStatus> { serde_json::from_value(value["status"].clone()).ok() }
