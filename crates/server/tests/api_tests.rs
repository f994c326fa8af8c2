//! # API Tests
//!
//! Authentication, role checks, tenant isolation and the worklog store,
//! exercised through the full router.

mod common;

use ::auth::Role;
use axum::http::{Method, StatusCode};
use common::*;
use serde_json::json;

#[cfg(test)]
mod authentication_tests {
    use ::auth::{Claims, JwtConfig};
    use jsonwebtoken::{EncodingKey, Header};
    use secrecy::ExposeSecret;

    use super::*;

    fn expired_token(config: &JwtConfig, user: &entity::users::Model) -> String {
        let claims = Claims {
            sub:        user.id.to_string(),
            email:      user.email.clone(),
            company_id: user.company_id,
            role:       Role::Admin,
            token_type: "access".to_string(),
            iss:        config.issuer.clone(),
            aud:        config.audience.clone(),
            iat:        1_600_000_000,
            exp:        1_600_000_600,
            jti:        "expired-token-id".to_string(),
        };
        let key = EncodingKey::from_base64_secret(config.secret.expose_secret()).unwrap();
        jsonwebtoken::encode(&Header::default(), &claims, &key).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = TestApp::new().await;
        let (status, body) = app.request(Method::GET, "/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["version"].is_string());
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = TestApp::new().await;
        let (status, body) = app
            .request(Method::GET, "/api/settings/teams", None, None)
            .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], "error");
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_malformed_token_is_unauthorized() {
        let app = TestApp::new().await;
        let (status, _) = app.get("/api/settings/teams", "not-a-jwt").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .request(Method::GET, "/api/worklogs?start_date=2024-01-01&end_date=2024-01-31", Some(""), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_token_is_unauthorized() {
        let app = TestApp::new().await;
        let company = seed_company(app.db(), "Acme").await;
        let admin = seed_user(app.db(), company.id, "admin@acme.test", Role::Admin).await;

        let token = expired_token(&app.state.jwt_config, &admin);
        let (status, body) = app.get("/api/settings/teams", &token).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "JWT_EXPIRED");
    }

    #[tokio::test]
    async fn test_state_token_is_not_an_access_token() {
        let app = TestApp::new().await;
        let state_token = ::auth::create_state_token(&app.state.jwt_config, "web").unwrap();

        let (status, _) = app.get("/api/auth/me", &state_token).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_deactivated_user_is_rejected() {
        let app = TestApp::new().await;
        let company = seed_company(app.db(), "Acme").await;
        let admin = seed_user(app.db(), company.id, "admin@acme.test", Role::Admin).await;
        let user = seed_user(app.db(), company.id, "gone@acme.test", Role::User).await;
        let user_token = app.token(&user);

        let (status, _) = app
            .put(
                &format!("/api/settings/users/{}", user.id),
                &app.token(&admin),
                json!({ "is_active": false }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app.get("/api/auth/me", &user_token).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_dev_login_only_in_dev_mode() {
        let app = TestApp::new().await;
        let (status, _) = app
            .request(Method::POST, "/api/auth/dev/login", None, Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let app = TestApp::with_settings(server::ServerSettings {
            dev_mode: true,
            ..Default::default()
        })
        .await;
        let (status, body) = app
            .request(Method::POST, "/api/auth/dev/login", None, Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::OK);
        let access = body["access_token"].as_str().unwrap().to_string();

        let (status, me) = app.get("/api/auth/me", &access).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["user"]["role"], "ADMIN");

        let refresh = body["refresh_token"].as_str().unwrap();
        let (status, rotated) = app
            .request(
                Method::POST,
                "/api/auth/refresh",
                None,
                Some(json!({ "refresh_token": refresh })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(rotated["refresh_token"], body["refresh_token"]);

        // The rotated-out token is revoked
        let (status, _) = app
            .request(
                Method::POST,
                "/api/auth/refresh",
                None,
                Some(json!({ "refresh_token": refresh })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[cfg(test)]
mod role_tests {
    use super::*;

    #[tokio::test]
    async fn test_user_cannot_call_admin_endpoint() {
        let app = TestApp::new().await;
        let company = seed_company(app.db(), "Acme").await;
        let admin = seed_user(app.db(), company.id, "admin@acme.test", Role::Admin).await;
        let user = seed_user(app.db(), company.id, "user@acme.test", Role::User).await;

        let (status, body) = app
            .post("/api/settings/teams", &app.token(&user), json!({ "name": "Platform" }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");

        let (status, body) = app
            .post("/api/settings/teams", &app.token(&admin), json!({ "name": "Platform" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Platform");
        assert_eq!(body["member_count"], 0);
    }

    #[tokio::test]
    async fn test_manager_can_sync_but_not_administer() {
        let app = TestApp::new().await;
        let company = seed_company(app.db(), "Acme").await;
        let manager = seed_user(app.db(), company.id, "pm@acme.test", Role::Manager).await;
        let user = seed_user(app.db(), company.id, "user@acme.test", Role::User).await;
        let token = app.token(&manager);

        let (status, _) = app
            .post(
                "/api/billing/clients",
                &token,
                json!({ "name": "Globex" }),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Manager passes the role check and fails on missing instances instead
        let body = json!({ "start_date": "2024-01-01", "end_date": "2024-01-31" });
        let (status, _) = app.post("/api/sync", &token, body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app.post("/api/sync", &app.token(&user), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_role_is_read_from_database() {
        let app = TestApp::new().await;
        let company = seed_company(app.db(), "Acme").await;
        let admin = seed_user(app.db(), company.id, "admin@acme.test", Role::Admin).await;
        let user = seed_user(app.db(), company.id, "user@acme.test", Role::User).await;
        let user_token = app.token(&user);

        let (status, _) = app
            .put(
                &format!("/api/settings/users/{}", user.id),
                &app.token(&admin),
                json!({ "role": "ADMIN" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .post("/api/settings/teams", &user_token, json!({ "name": "Ops" }))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_cannot_demote_self() {
        let app = TestApp::new().await;
        let company = seed_company(app.db(), "Acme").await;
        let admin = seed_user(app.db(), company.id, "admin@acme.test", Role::Admin).await;

        let (status, _) = app
            .put(
                &format!("/api/settings/users/{}", admin.id),
                &app.token(&admin),
                json!({ "role": "USER" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[cfg(test)]
mod tenant_isolation_tests {
    use super::*;

    #[tokio::test]
    async fn test_resources_are_invisible_across_tenants() {
        let app = TestApp::new().await;
        let acme = seed_company(app.db(), "Acme").await;
        let globex = seed_company(app.db(), "Globex").await;
        let acme_admin = app.token(&seed_user(app.db(), acme.id, "admin@acme.test", Role::Admin).await);
        let globex_admin = app.token(&seed_user(app.db(), globex.id, "admin@globex.test", Role::Admin).await);

        let (_, team) = app
            .post("/api/settings/teams", &acme_admin, json!({ "name": "Platform" }))
            .await;
        let (_, client) = app
            .post("/api/billing/clients", &acme_admin, json!({ "name": "Initech" }))
            .await;
        let team_id = team["id"].as_i64().unwrap();
        let client_id = client["id"].as_i64().unwrap();

        let (status, teams) = app.get("/api/settings/teams", &globex_admin).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(teams["teams"].as_array().unwrap().len(), 0);

        let (status, clients) = app.get("/api/billing/clients", &globex_admin).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(clients["clients"].as_array().unwrap().len(), 0);

        let (status, _) = app
            .put(
                &format!("/api/settings/teams/{}", team_id),
                &globex_admin,
                json!({ "name": "Hijacked" }),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .delete(&format!("/api/billing/clients/{}", client_id), &globex_admin)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Same name is free in the other tenant
        let (status, _) = app
            .post("/api/billing/clients", &globex_admin, json!({ "name": "Initech" }))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cross_tenant_user_and_team_references() {
        let app = TestApp::new().await;
        let acme = seed_company(app.db(), "Acme").await;
        let globex = seed_company(app.db(), "Globex").await;
        let acme_admin = app.token(&seed_user(app.db(), acme.id, "admin@acme.test", Role::Admin).await);
        let globex_user = seed_user(app.db(), globex.id, "user@globex.test", Role::User).await;
        let globex_admin = app.token(&seed_user(app.db(), globex.id, "admin@globex.test", Role::Admin).await);

        let (status, _) = app
            .get(&format!("/api/settings/users/{}", globex_user.id), &acme_admin)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, team) = app
            .post("/api/settings/teams", &globex_admin, json!({ "name": "Globex Ops" }))
            .await;
        let (status, _) = app
            .post(
                "/api/settings/users",
                &acme_admin,
                json!({
                    "email": "new@acme.test",
                    "first_name": "New",
                    "last_name": "Hire",
                    "team_id": team["id"]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_worklogs_are_scoped_to_tenant() {
        let app = TestApp::new().await;
        let acme = seed_company(app.db(), "Acme").await;
        let globex = seed_company(app.db(), "Globex").await;
        let acme_user = app.token(&seed_user(app.db(), acme.id, "ada@acme.test", Role::User).await);
        let globex_user = app.token(&seed_user(app.db(), globex.id, "bob@globex.test", Role::User).await);

        seed_worklogs(
            app.db(),
            acme.id,
            vec![raw_worklog("acme_1", "acme", "ACME-1", "ada@acme.test", 3600, "2024-01-10T09:00:00Z")],
        )
        .await;
        // Same source id and instance name under another tenant is a distinct row
        seed_worklogs(
            app.db(),
            globex.id,
            vec![raw_worklog("acme_1", "acme", "GLX-9", "bob@globex.test", 7200, "2024-01-10T09:00:00Z")],
        )
        .await;

        let uri = "/api/worklogs?start_date=2024-01-01&end_date=2024-01-31";
        let (_, acme_list) = app.get(uri, &acme_user).await;
        let (_, globex_list) = app.get(uri, &globex_user).await;

        assert_eq!(acme_list["pagination"]["total_items"], 1);
        assert_eq!(acme_list["worklogs"][0]["issue_key"], "ACME-1");
        assert_eq!(globex_list["pagination"]["total_items"], 1);
        assert_eq!(globex_list["worklogs"][0]["issue_key"], "GLX-9");
    }
}

#[cfg(test)]
mod worklog_store_tests {
    use entity::worklogs::Entity as WorklogsEntity;
    use sea_orm::{EntityTrait, PaginatorTrait};
    use server::worklogs::upsert_worklogs;

    use super::*;

    #[tokio::test]
    async fn test_duplicate_pairs_store_distinct_rows() {
        let app = TestApp::new().await;
        let company = seed_company(app.db(), "Acme").await;

        let batch = vec![
            raw_worklog("acme_1", "acme", "ACME-1", "ada@acme.test", 3600, "2024-01-10T09:00:00Z"),
            raw_worklog("acme_2", "acme", "ACME-1", "ada@acme.test", 1800, "2024-01-11T09:00:00Z"),
            raw_worklog("acme_1", "acme", "ACME-1", "ada@acme.test", 5400, "2024-01-10T09:00:00Z"),
            raw_worklog("acme_1", "beta", "BETA-1", "ada@acme.test", 900, "2024-01-12T09:00:00Z"),
            raw_worklog("acme_2", "acme", "ACME-1", "ada@acme.test", 1800, "2024-01-11T09:00:00Z"),
        ];

        let stats = upsert_worklogs(app.db(), company.id, batch.clone())
            .await
            .unwrap();
        assert_eq!(stats.inserted, 3);
        assert_eq!(stats.updated, 0);
        assert_eq!(WorklogsEntity::find().count(app.db()).await.unwrap(), 3);

        let stats = upsert_worklogs(app.db(), company.id, batch).await.unwrap();
        assert_eq!(stats.inserted, 0);
        assert_eq!(stats.updated, 3);
        assert_eq!(WorklogsEntity::find().count(app.db()).await.unwrap(), 3);

        // The last duplicate wins
        let row = WorklogsEntity::find_by_id((company.id, "acme_1".to_string(), "acme".to_string()))
            .one(app.db())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.time_spent_seconds, 5400);
    }

    #[tokio::test]
    async fn test_list_validates_and_paginates() {
        let app = TestApp::new().await;
        let company = seed_company(app.db(), "Acme").await;
        let user = app.token(&seed_user(app.db(), company.id, "ada@acme.test", Role::User).await);

        let worklogs = (1 ..= 5)
            .map(|day| {
                raw_worklog(
                    &format!("acme_{}", day),
                    "acme",
                    "ACME-1",
                    "Ada@Acme.test",
                    3600,
                    &format!("2024-01-0{}T09:00:00Z", day),
                )
            })
            .collect();
        seed_worklogs(app.db(), company.id, worklogs).await;

        let (status, body) = app
            .get("/api/worklogs?start_date=2024-01-01&end_date=2024-01-31&per_page=2&page=2", &user)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["total_items"], 5);
        assert_eq!(body["pagination"]["total_pages"], 3);
        assert_eq!(body["worklogs"].as_array().unwrap().len(), 2);
        // Newest first: page 2 holds the 3rd and 2nd
        assert_eq!(body["worklogs"][0]["id"], "acme_3");
        assert_eq!(body["worklogs"][0]["author_email"], "ada@acme.test");

        let (status, body) = app
            .get("/api/worklogs?start_date=2024-02-01&end_date=2024-01-01", &user)
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = app.get("/api/worklogs?start_date=yesterday", &user).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_bulk_delete_is_admin_only() {
        let app = TestApp::new().await;
        let company = seed_company(app.db(), "Acme").await;
        let admin = app.token(&seed_user(app.db(), company.id, "admin@acme.test", Role::Admin).await);
        let user = app.token(&seed_user(app.db(), company.id, "ada@acme.test", Role::User).await);

        seed_worklogs(
            app.db(),
            company.id,
            vec![
                raw_worklog("acme_1", "acme", "ACME-1", "ada@acme.test", 3600, "2024-01-10T09:00:00Z"),
                raw_worklog("beta_1", "beta", "BETA-1", "ada@acme.test", 3600, "2024-01-10T09:00:00Z"),
            ],
        )
        .await;

        let uri = "/api/worklogs?start_date=2024-01-01&end_date=2024-01-31&jira_instance=acme";
        let (status, _) = app.delete(uri, &user).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app.delete(uri, &admin).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], 1);
        assert_eq!(WorklogsEntity::find().count(app.db()).await.unwrap(), 1);
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_field_is_unprocessable() {
        let app = TestApp::new().await;
        let company = seed_company(app.db(), "Acme").await;
        let admin = app.token(&seed_user(app.db(), company.id, "admin@acme.test", Role::Admin).await);

        let (status, body) = app.post("/api/settings/teams", &admin, json!({})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "Missing required field: name");
    }

    #[tokio::test]
    async fn test_duplicates_conflict() {
        let app = TestApp::new().await;
        let company = seed_company(app.db(), "Acme").await;
        let admin = app.token(&seed_user(app.db(), company.id, "admin@acme.test", Role::Admin).await);

        let (status, _) = app
            .post("/api/settings/teams", &admin, json!({ "name": "Platform" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app
            .post("/api/settings/teams", &admin, json!({ "name": "Platform" }))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let holiday = json!({ "name": "New Year", "holiday_date": "2024-01-01" });
        let (status, body) = app.post("/api/settings/holidays", &admin, holiday.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["country"], "ES");
        let (status, _) = app.post("/api/settings/holidays", &admin, holiday).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_empty_update_is_bad_request() {
        let app = TestApp::new().await;
        let company = seed_company(app.db(), "Acme").await;
        let admin = seed_user(app.db(), company.id, "admin@acme.test", Role::Admin).await;
        let user = seed_user(app.db(), company.id, "ada@acme.test", Role::User).await;

        let (status, _) = app
            .put(&format!("/api/settings/users/{}", user.id), &app.token(&admin), json!({}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[cfg(test)]
mod oauth_callback_tests {
    use ::auth::GoogleOAuthConfig;
    use chrono::{Duration, Utc};
    use entity::invitations::Entity as InvitationsEntity;
    use sea_orm::{ActiveModelTrait, EntityTrait, Set};
    use secrecy::SecretString;
    use serde_json::Value;
    use wiremock::{
        matchers::{method, path},
        Mock,
        MockServer,
        ResponseTemplate,
    };

    use super::*;

    /// Google endpoints answering for one identity, and an app wired to them.
    async fn google_app(email: &str) -> (MockServer, TestApp) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "google-access",
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": format!("google-{}", email),
                "email": email,
                "given_name": "Grace",
                "family_name": "Hopper"
            })))
            .mount(&server)
            .await;

        let oauth = GoogleOAuthConfig::new(
            "client-123",
            SecretString::from("client-secret".to_string()),
            "http://localhost:8000/api/auth/callback",
        )
        .with_endpoints(
            format!("{}/token", server.uri()),
            format!("{}/userinfo", server.uri()),
        );
        let app = TestApp::with(|state| state.with_oauth(Some(oauth))).await;
        (server, app)
    }

    async fn callback(app: &TestApp) -> (StatusCode, Value) {
        let (status, login) = app
            .request(Method::GET, "/api/auth/login", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let state = login["state"].as_str().unwrap();
        app.request(
            Method::GET,
            &format!("/api/auth/callback?code=auth-code&state={}", state),
            None,
            None,
        )
        .await
    }

    async fn invite(app: &TestApp, admin: &str, email: &str, role: &str) -> Value {
        let (status, invitation) = app
            .post("/api/invitations", admin, json!({ "email": email, "role": role }))
            .await;
        assert_eq!(status, StatusCode::OK, "{}", invitation);
        invitation
    }

    #[tokio::test]
    async fn test_first_login_bootstraps_company() {
        let (_server, app) = google_app("founder@initech.test").await;

        let (status, body) = callback(&app).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["company"]["name"], "initech.test Organization");
        assert_eq!(body["company"]["domain"], "initech.test");
        assert_eq!(body["user"]["role"], "ADMIN");
        assert_eq!(body["user"]["first_name"], "Grace");
        assert!(body["refresh_token"].is_string());

        let (status, me) = app
            .get("/api/auth/me", body["access_token"].as_str().unwrap())
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["user"]["email"], "founder@initech.test");
    }

    #[tokio::test]
    async fn test_pending_invitation_is_accepted() {
        let (_server, app) = google_app("Grace@Acme.test").await;
        let company = seed_company(app.db(), "Acme").await;
        let admin = app.token(&seed_user(app.db(), company.id, "admin@acme.test", Role::Admin).await);
        invite(&app, &admin, "grace@acme.test", "MANAGER").await;

        let (status, body) = callback(&app).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["company"]["id"], company.id);
        assert_eq!(body["user"]["email"], "grace@acme.test");
        assert_eq!(body["user"]["role"], "MANAGER");

        let (_, listed) = app.get("/api/invitations", &admin).await;
        assert_eq!(listed["invitations"][0]["status"], "ACCEPTED");

        // A returning user logs in without an invitation
        let (status, again) = callback(&app).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(again["user"]["id"], body["user"]["id"]);
    }

    #[tokio::test]
    async fn test_expired_invitation_is_forbidden() {
        let (_server, app) = google_app("grace@acme.test").await;
        let company = seed_company(app.db(), "Acme").await;
        let admin = app.token(&seed_user(app.db(), company.id, "admin@acme.test", Role::Admin).await);
        let invitation = invite(&app, &admin, "grace@acme.test", "USER").await;

        let stored = InvitationsEntity::find_by_id(invitation["id"].as_i64().unwrap() as i32)
            .one(app.db())
            .await
            .unwrap()
            .unwrap();
        let mut expired: entity::invitations::ActiveModel = stored.into();
        expired.expires_at = Set(Utc::now() - Duration::hours(1));
        expired.update(app.db()).await.unwrap();

        let (status, body) = callback(&app).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Invitation has expired");

        let (_, listed) = app.get("/api/invitations", &admin).await;
        assert_eq!(listed["invitations"][0]["status"], "PENDING");
    }

    #[tokio::test]
    async fn test_stranger_needs_invitation() {
        let (_server, app) = google_app("stranger@else.test").await;
        seed_company(app.db(), "Acme").await;

        let (status, body) = callback(&app).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Invitation required to join");
    }

    #[tokio::test]
    async fn test_forged_state_is_rejected() {
        let (_server, app) = google_app("founder@initech.test").await;

        let (status, _) = app
            .request(
                Method::GET,
                "/api/auth/callback?code=auth-code&state=not-a-token",
                None,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[cfg(test)]
mod invitation_tests {
    use super::*;

    #[tokio::test]
    async fn test_invitation_conflicts_and_revoke() {
        let app = TestApp::new().await;
        let company = seed_company(app.db(), "Acme").await;
        let admin = app.token(&seed_user(app.db(), company.id, "admin@acme.test", Role::Admin).await);
        let member = app.token(&seed_user(app.db(), company.id, "ada@acme.test", Role::User).await);

        let (status, _) = app
            .post("/api/invitations", &admin, json!({ "email": "ADA@acme.test" }))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, invitation) = app
            .post("/api/invitations", &admin, json!({ "email": "grace@acme.test" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(invitation["role"], "USER");
        assert_eq!(invitation["status"], "PENDING");

        let (status, body) = app
            .post("/api/invitations", &admin, json!({ "email": "grace@acme.test" }))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "A pending invitation already exists for this email");

        let (status, _) = app
            .post("/api/invitations", &member, json!({ "email": "bob@acme.test" }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let uri = format!("/api/invitations/{}", invitation["id"]);
        let (status, _) = app.delete(&uri, &admin).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.delete(&uri, &admin).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Revoking frees the email for a new invitation
        let (status, _) = app
            .post("/api/invitations", &admin, json!({ "email": "grace@acme.test" }))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, listed) = app.get("/api/invitations", &admin).await;
        let statuses: Vec<&str> = listed["invitations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["status"].as_str().unwrap())
            .collect();
        assert_eq!(statuses.len(), 2);
        assert!(statuses.contains(&"REVOKED"));
        assert!(statuses.contains(&"PENDING"));

        let other = seed_company(app.db(), "Globex").await;
        let outsider = app.token(&seed_user(app.db(), other.id, "admin@globex.test", Role::Admin).await);
        let (status, _) = app.delete(&uri, &outsider).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_role_is_rejected() {
        let app = TestApp::new().await;
        let company = seed_company(app.db(), "Acme").await;
        let admin = app.token(&seed_user(app.db(), company.id, "admin@acme.test", Role::Admin).await);

        let (status, _) = app
            .post("/api/invitations", &admin, json!({ "email": "grace@acme.test", "role": "OWNER" }))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[cfg(test)]
mod session_tests {
    use server::auth::sessions::{create_session, find_active_session, rotate_session};

    use super::*;

    #[tokio::test]
    async fn test_stale_session_cannot_rotate_twice() {
        let app = TestApp::new().await;
        let company = seed_company(app.db(), "Acme").await;
        let user = seed_user(app.db(), company.id, "ada@acme.test", Role::User).await;

        let token = create_session(app.db(), &user, 30).await.unwrap();
        let stale = find_active_session(app.db(), &token).await.unwrap();

        let (status, _) = app
            .request(
                Method::POST,
                "/api/auth/refresh",
                None,
                Some(json!({ "refresh_token": token })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        // A copy read before the refresh no longer revokes anything
        let err = rotate_session(app.db(), stale, &user, 30).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
