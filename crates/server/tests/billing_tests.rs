//! # Billing Tests
//!
//! Rate resolution through the preview endpoint, classifications, the
//! invoice lifecycle and its export.

mod common;

use ::auth::Role;
use axum::http::StatusCode;
use common::*;
use entity::sea_orm_active_enums::InvoiceStatus;
use serde_json::{json, Value};

/// A tenant with one client/project mapped to the `acme` instance's `ACME`
/// project, plus worklogs by two authors.
struct BillingFixture {
    app:        TestApp,
    admin:      String,
    user:       String,
    client_id:  i64,
    project_id: i64,
}

impl BillingFixture {
    async fn new(project_rate: Option<f64>) -> Self {
        let app = TestApp::new().await;
        let company = seed_company(app.db(), "Acme").await;
        let admin = app.token(&seed_user(app.db(), company.id, "admin@acme.test", Role::Admin).await);
        let user = app.token(&seed_user(app.db(), company.id, "ada@acme.test", Role::User).await);
        seed_instance(app.db(), company.id, "acme", "https://acme.atlassian.net").await;

        let (status, client) = app
            .post("/api/billing/clients", &admin, json!({ "name": "Initech" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(client["billing_currency"], "EUR");
        let client_id = client["id"].as_i64().unwrap();

        let (status, project) = app
            .post(
                "/api/billing/projects",
                &admin,
                json!({ "client_id": client_id, "name": "Portal", "default_hourly_rate": project_rate }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let project_id = project["id"].as_i64().unwrap();

        let (status, mapping) = app
            .post(
                &format!("/api/billing/projects/{}/mappings", project_id),
                &admin,
                json!({ "jira_instance": "acme", "jira_project_key": "acme" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mapping["jira_project_key"], "ACME");

        let mut bug = raw_worklog("acme_3", "acme", "ACME-2", "bob@acme.test", 3600, "2024-01-11T09:00:00Z");
        bug.parent_type = Some("Bug".to_string());
        seed_worklogs(
            app.db(),
            company.id,
            vec![
                raw_worklog("acme_1", "acme", "ACME-1", "ada@acme.test", 7200, "2024-01-10T09:00:00Z"),
                raw_worklog("acme_2", "acme", "ACME-1", "ada@acme.test", 3600, "2024-01-12T09:00:00Z"),
                bug,
                // Unmapped project key
                raw_worklog("acme_4", "acme", "OPS-1", "ada@acme.test", 3600, "2024-01-10T09:00:00Z"),
                // Outside the period
                raw_worklog("acme_5", "acme", "ACME-1", "ada@acme.test", 3600, "2024-02-01T09:00:00Z"),
            ],
        )
        .await;

        Self {
            app,
            admin,
            user,
            client_id,
            project_id,
        }
    }

    async fn add_rate(&self, body: Value) -> Value {
        let mut body = body;
        body["project_id"] = json!(self.project_id);
        let (status, rate) = self.app.post("/api/billing/rates", &self.admin, body).await;
        assert_eq!(status, StatusCode::OK, "{}", rate);
        rate
    }

    async fn preview(&self, group_by: &str) -> Value {
        let (status, body) = self
            .app
            .post(
                "/api/billing/preview",
                &self.admin,
                json!({
                    "client_id": self.client_id,
                    "start_date": "2024-01-01",
                    "end_date": "2024-01-31",
                    "group_by": group_by
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body
    }
}

fn line<'a>(preview: &'a Value, key: &str) -> &'a Value {
    preview["line_items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["group_key"] == key)
        .unwrap_or_else(|| panic!("no line {} in {}", key, preview))
}

#[cfg(test)]
mod preview_tests {
    use super::*;

    #[tokio::test]
    async fn test_more_specific_rate_wins() {
        let fx = BillingFixture::new(Some(50.0)).await;
        fx.add_rate(json!({ "hourly_rate": 80.0 })).await;
        fx.add_rate(json!({ "hourly_rate": 120.0, "user_email": "ADA@acme.test" }))
            .await;
        fx.add_rate(json!({ "hourly_rate": 95.0, "issue_type": "bug" })).await;

        let preview = fx.preview("user").await;

        // ada: 3h at the user rate; bob: 1h on a Bug at the issue-type rate
        let ada = line(&preview, "ada@acme.test");
        assert_eq!(ada["quantity_hours"], 3.0);
        assert_eq!(ada["hourly_rate"], 120.0);
        assert_eq!(ada["amount"], 360.0);
        let bob = line(&preview, "bob@acme.test");
        assert_eq!(bob["amount"], 95.0);

        assert_eq!(preview["subtotal_amount"], 455.0);
        assert_eq!(preview["billable_hours"], 4.0);
        assert_eq!(preview["currency"], "EUR");
        assert_eq!(preview["line_items"][0]["group_key"], "ada@acme.test");
    }

    #[tokio::test]
    async fn test_project_default_applies_without_rules() {
        let fx = BillingFixture::new(Some(50.0)).await;
        let preview = fx.preview("project").await;

        let items = preview["line_items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["group_key"], fx.project_id.to_string());
        assert_eq!(items[0]["description"], "Portal");
        assert_eq!(items[0]["amount"], 200.0);
        assert_eq!(items[0]["metadata"]["worklog_count"], 3);
    }

    #[tokio::test]
    async fn test_unrated_worklogs_are_flagged_not_billed() {
        let fx = BillingFixture::new(None).await;
        fx.add_rate(json!({ "hourly_rate": 100.0, "user_email": "ada@acme.test" }))
            .await;

        let preview = fx.preview("issue").await;

        assert_eq!(preview["subtotal_amount"], 300.0);
        assert_eq!(preview["unrated_hours"], 1.0);
        let unrated = preview["unrated_worklogs"].as_array().unwrap();
        assert_eq!(unrated.len(), 1);
        assert_eq!(unrated[0]["worklog_id"], "acme_3");
        assert_eq!(unrated[0]["author_email"], "bob@acme.test");
        assert!(line(&preview, "ACME-1")["description"]
            .as_str()
            .unwrap()
            .starts_with("ACME-1: "));
    }

    #[tokio::test]
    async fn test_classification_excludes_and_overrides() {
        let fx = BillingFixture::new(Some(50.0)).await;

        let (status, _) = fx
            .app
            .put(
                "/api/billing/classifications",
                &fx.admin,
                json!({ "worklog_id": "acme_3", "jira_instance": "acme", "is_billable": false }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = fx
            .app
            .put(
                "/api/billing/classifications",
                &fx.admin,
                json!({ "worklog_id": "acme_2", "jira_instance": "acme", "override_hourly_rate": 10.0 }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let preview = fx.preview("project").await;
        assert_eq!(preview["non_billable_hours"], 1.0);
        assert_eq!(preview["billable_hours"], 3.0);
        // 2h at 50 plus 1h override at 10
        assert_eq!(preview["subtotal_amount"], 110.0);

        let (status, _) = fx
            .app
            .put(
                "/api/billing/classifications",
                &fx.admin,
                json!({ "worklog_id": "missing", "jira_instance": "acme", "is_billable": false }),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bulk_classification_is_all_or_nothing() {
        let fx = BillingFixture::new(Some(50.0)).await;

        let (status, body) = fx
            .app
            .post(
                "/api/billing/classifications/bulk",
                &fx.admin,
                json!({
                    "worklogs": [
                        { "worklog_id": "acme_1", "jira_instance": "acme" },
                        { "worklog_id": "missing", "jira_instance": "acme" }
                    ],
                    "is_billable": false
                }),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", body);
        let (_, listed) = fx.app.get("/api/billing/classifications", &fx.admin).await;
        assert_eq!(listed["classifications"].as_array().unwrap().len(), 0);

        let (status, body) = fx
            .app
            .post(
                "/api/billing/classifications/bulk",
                &fx.admin,
                json!({
                    "worklogs": [
                        { "worklog_id": "acme_1", "jira_instance": "acme" },
                        { "worklog_id": "acme_3", "jira_instance": "acme" },
                        { "worklog_id": "acme_1", "jira_instance": "acme" }
                    ],
                    "is_billable": false,
                    "note": "internal"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);

        let preview = fx.preview("project").await;
        assert_eq!(preview["non_billable_hours"], 3.0);
        assert_eq!(preview["billable_hours"], 1.0);
        assert_eq!(preview["subtotal_amount"], 50.0);

        let (status, _) = fx
            .app
            .post(
                "/api/billing/classifications/bulk",
                &fx.user,
                json!({ "worklogs": [{ "worklog_id": "acme_2", "jira_instance": "acme" }] }),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = fx
            .app
            .post("/api/billing/classifications/bulk", &fx.admin, json!({ "worklogs": [] }))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_project_update() {
        let fx = BillingFixture::new(Some(50.0)).await;
        let uri = format!("/api/billing/projects/{}", fx.project_id);

        let (status, project) = fx
            .app
            .put(&uri, &fx.admin, json!({ "name": "Portal v2", "default_hourly_rate": 70.0 }))
            .await;
        assert_eq!(status, StatusCode::OK, "{}", project);
        assert_eq!(project["name"], "Portal v2");
        assert_eq!(project["default_hourly_rate"], 70.0);
        assert_eq!(fx.preview("project").await["subtotal_amount"], 280.0);

        // An explicit null clears the default rate
        let (status, project) = fx.app.put(&uri, &fx.admin, json!({ "default_hourly_rate": null })).await;
        assert_eq!(status, StatusCode::OK);
        assert!(project["default_hourly_rate"].is_null());
        assert_eq!(project["name"], "Portal v2");

        let (status, _) = fx.app.put(&uri, &fx.admin, json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = fx.app.put(&uri, &fx.admin, json!({ "default_hourly_rate": -5.0 })).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let (status, _) = fx.app.put(&uri, &fx.user, json!({ "name": "Nope" })).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let other = seed_company(fx.app.db(), "Globex").await;
        let outsider = fx
            .app
            .token(&seed_user(fx.app.db(), other.id, "admin@globex.test", Role::Admin).await);
        let (status, _) = fx.app.put(&uri, &outsider, json!({ "name": "Stolen" })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_preview_rejects_foreign_project_and_users() {
        let fx = BillingFixture::new(Some(50.0)).await;
        let (_, other) = fx
            .app
            .post("/api/billing/clients", &fx.admin, json!({ "name": "Hooli" }))
            .await;

        let body = json!({
            "client_id": other["id"],
            "project_id": fx.project_id,
            "start_date": "2024-01-01",
            "end_date": "2024-01-31"
        });
        let (status, _) = fx
            .app
            .post("/api/billing/preview", &fx.admin, body.clone())
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = fx.app.post("/api/billing/preview", &fx.user, body).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = fx
            .app
            .post(
                "/api/billing/preview",
                &fx.admin,
                json!({ "client_id": 9999, "start_date": "2024-01-01", "end_date": "2024-01-31" }),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rate_validation() {
        let fx = BillingFixture::new(None).await;

        let (status, _) = fx
            .app
            .post(
                "/api/billing/rates",
                &fx.admin,
                json!({ "project_id": fx.project_id, "hourly_rate": -1.0 }),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = fx
            .app
            .post(
                "/api/billing/rates",
                &fx.admin,
                json!({
                    "project_id": fx.project_id,
                    "hourly_rate": 10.0,
                    "valid_from": "2024-02-01",
                    "valid_to": "2024-01-01"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, rates) = fx.app.get("/api/billing/rates", &fx.user).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rates["rates"].as_array().unwrap().len(), 0);
    }
}

#[cfg(test)]
mod invoice_tests {
    use super::*;

    async fn create_invoice(fx: &BillingFixture) -> Value {
        let (status, invoice) = fx
            .app
            .post(
                "/api/billing/invoices",
                &fx.admin,
                json!({
                    "client_id": fx.client_id,
                    "start_date": "2024-01-01",
                    "end_date": "2024-01-31",
                    "taxes_amount": 42.0
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", invoice);
        invoice
    }

    #[tokio::test]
    async fn test_draft_snapshots_preview() {
        let fx = BillingFixture::new(Some(50.0)).await;
        let invoice = create_invoice(&fx).await;

        assert_eq!(status_of(&invoice), Some(InvoiceStatus::Draft));
        assert_eq!(invoice["subtotal_amount"], 200.0);
        assert_eq!(invoice["taxes_amount"], 42.0);
        assert_eq!(invoice["total_amount"], 242.0);
        assert_eq!(invoice["group_by"], "project");
        let items = invoice["line_items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["line_type"], "work");
        assert_eq!(items[0]["metadata"]["worklog_count"], 3);

        // Later rate changes do not touch the snapshot
        fx.add_rate(json!({ "hourly_rate": 500.0 })).await;
        let (_, fetched) = fx
            .app
            .get(&format!("/api/billing/invoices/{}", invoice["id"]), &fx.user)
            .await;
        assert_eq!(fetched["total_amount"], 242.0);
        assert_eq!(fetched["line_items"][0]["amount"], 200.0);
    }

    #[tokio::test]
    async fn test_lifecycle_draft_issued_void() {
        let fx = BillingFixture::new(Some(50.0)).await;
        let invoice = create_invoice(&fx).await;
        let base = format!("/api/billing/invoices/{}", invoice["id"]);

        let (status, _) = fx.app.post(&format!("{}/issue", base), &fx.user, json!({})).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, issued) = fx.app.post(&format!("{}/issue", base), &fx.admin, json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(status_of(&issued), Some(InvoiceStatus::Issued));
        assert!(issued["issued_at"].is_string());

        let (status, _) = fx.app.post(&format!("{}/issue", base), &fx.admin, json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = fx.app.delete(&base, &fx.admin).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, voided) = fx.app.post(&format!("{}/void", base), &fx.admin, json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(status_of(&voided), Some(InvoiceStatus::Void));
        assert!(voided["voided_at"].is_string());

        let (status, _) = fx.app.post(&format!("{}/void", base), &fx.admin, json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = fx.app.post(&format!("{}/issue", base), &fx.admin, json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, listed) = fx.app.get("/api/billing/invoices?status=void", &fx.user).await;
        assert_eq!(listed["invoices"].as_array().unwrap().len(), 1);
        let (_, listed) = fx.app.get("/api/billing/invoices?status=draft", &fx.user).await;
        assert_eq!(listed["invoices"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_stale_transition_is_refused() {
        use entity::invoices::Entity as InvoicesEntity;
        use sea_orm::EntityTrait;
        use server::billing::invoices::apply_transition;

        let fx = BillingFixture::new(Some(50.0)).await;
        let invoice = create_invoice(&fx).await;
        let id = invoice["id"].as_i64().unwrap() as i32;
        let draft = InvoicesEntity::find_by_id(id)
            .one(fx.app.db())
            .await
            .unwrap()
            .unwrap();

        let (status, _) = fx
            .app
            .post(&format!("/api/billing/invoices/{}/issue", id), &fx.admin, json!({}))
            .await;
        assert_eq!(status, StatusCode::OK);

        // DRAFT -> VOID is allowed, but the stored row is no longer a draft
        let err = apply_transition(fx.app.db(), &draft, InvoiceStatus::Void)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let (_, fetched) = fx.app.get(&format!("/api/billing/invoices/{}", id), &fx.user).await;
        assert_eq!(status_of(&fetched), Some(InvoiceStatus::Issued));
        assert!(fetched["voided_at"].is_null());
    }

    #[tokio::test]
    async fn test_draft_can_be_voided_or_deleted() {
        let fx = BillingFixture::new(Some(50.0)).await;

        let first = create_invoice(&fx).await;
        let (status, voided) = fx
            .app
            .post(&format!("/api/billing/invoices/{}/void", first["id"]), &fx.admin, json!({}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(status_of(&voided), Some(InvoiceStatus::Void));

        let second = create_invoice(&fx).await;
        let uri = format!("/api/billing/invoices/{}", second["id"]);
        let (status, _) = fx.app.delete(&uri, &fx.admin).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = fx.app.get(&uri, &fx.admin).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_client_with_invoices_cannot_be_deleted() {
        let fx = BillingFixture::new(Some(50.0)).await;
        create_invoice(&fx).await;

        let (status, _) = fx
            .app
            .delete(&format!("/api/billing/clients/{}", fx.client_id), &fx.admin)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_export_is_csv_attachment() {
        let fx = BillingFixture::new(Some(50.0)).await;
        let invoice = create_invoice(&fx).await;
        let uri = format!("/api/billing/invoices/{}/export.csv", invoice["id"]);

        let (status, headers, body) = fx.app.get_raw(&uri, &fx.user).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["content-type"], "text/csv; charset=utf-8");
        let disposition = headers["content-disposition"].to_str().unwrap();
        assert_eq!(
            disposition,
            format!("attachment; filename=\"invoice_{}_Initech.csv\"", invoice["id"])
        );

        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines[0], format!("Invoice,{}", invoice["id"]));
        assert_eq!(lines[1], "Client,Initech");
        assert_eq!(lines[3], "Status,DRAFT");
        assert_eq!(lines[6], "1,Portal,4.00,50.00,200.00");
        assert_eq!(lines.last().copied(), Some("Total,242.00"));

        let other = seed_company(fx.app.db(), "Globex").await;
        let outsider = fx
            .app
            .token(&seed_user(fx.app.db(), other.id, "ada@globex.test", Role::User).await);
        let (status, _, _) = fx.app.get_raw(&uri, &outsider).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_status_filter_is_unprocessable() {
        let fx = BillingFixture::new(Some(50.0)).await;
        let (status, _) = fx.app.get("/api/billing/invoices?status=paid", &fx.user).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
