//! # Invoice Handlers
//!
//! Invoices are DRAFT snapshots of a preview. The only transitions are
//! DRAFT -> ISSUED, DRAFT -> VOID and ISSUED -> VOID.

use axum::Json;
use chrono::Utc;
use entity::{
    invoice_line_items::{Column as LineItemColumn, Entity as LineItemsEntity},
    invoices::{Column as InvoiceColumn, Entity as InvoicesEntity},
    sea_orm_active_enums::InvoiceStatus,
};
use error::{AppError, Result};
use sea_orm::{
    sea_query::Expr,
    ActiveModelTrait,
    ColumnTrait,
    ConnectionTrait,
    EntityTrait,
    QueryFilter,
    QueryOrder,
    Set,
    TransactionTrait,
};
use tracing::info;
use validator::Validate;

use super::preview::build_preview;
use crate::{
    dto::{
        billing::{CreateInvoiceRequest, InvoiceListQuery, InvoiceListResponse, InvoiceResponse},
        SuccessResponse,
    },
    middleware::auth::AuthenticatedUser,
    utils::round2,
    AppState,
};

/// Line type of every snapshot line; other kinds are reserved for manual lines.
const WORK_LINE: &str = "work";

async fn find_invoice<C: ConnectionTrait>(db: &C, company_id: i32, invoice_id: i32) -> Result<entity::invoices::Model> {
    InvoicesEntity::find_by_id(invoice_id)
        .filter(InvoiceColumn::CompanyId.eq(company_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Invoice not found"))
}

async fn line_items<C: ConnectionTrait>(db: &C, invoice_id: i32) -> Result<Vec<entity::invoice_line_items::Model>> {
    Ok(LineItemsEntity::find()
        .filter(LineItemColumn::InvoiceId.eq(invoice_id))
        .order_by_asc(LineItemColumn::SortOrder)
        .all(db)
        .await?)
}

/// Target status of a transition, or the 400 explaining why it is refused.
fn transition(from: InvoiceStatus, to: InvoiceStatus) -> Result<InvoiceStatus> {
    match (from, to) {
        (InvoiceStatus::Draft, InvoiceStatus::Issued) |
        (InvoiceStatus::Draft, InvoiceStatus::Void) |
        (InvoiceStatus::Issued, InvoiceStatus::Void) => Ok(to),
        (InvoiceStatus::Void, _) => Err(AppError::bad_request("Invoice is void")),
        (_, InvoiceStatus::Issued) => Err(AppError::bad_request("Only draft invoices can be issued")),
        _ => {
            Err(AppError::bad_request(format!(
                "Invalid invoice transition from {:?} to {:?}",
                from, to
            )))
        },
    }
}

pub async fn create_invoice_handler(
    state: &AppState,
    user: AuthenticatedUser,
    req: CreateInvoiceRequest,
) -> Result<Json<InvoiceResponse>> {
    user.require_manager()?;
    req.validate()?;

    let txn = state.db.begin().await?;
    let preview = build_preview(&txn, user.company_id, &req.preview_request()).await?;

    let taxes = round2(req.taxes_amount.unwrap_or(0.0));
    let invoice = entity::invoices::ActiveModel {
        company_id: Set(user.company_id),
        client_id: Set(preview.client_id),
        project_id: Set(preview.project_id),
        period_start: Set(preview.start_date),
        period_end: Set(preview.end_date),
        status: Set(InvoiceStatus::Draft),
        currency: Set(preview.currency.clone()),
        subtotal_amount: Set(preview.subtotal_amount),
        taxes_amount: Set(taxes),
        total_amount: Set(round2(preview.subtotal_amount + taxes)),
        group_by: Set(preview.group_by.as_str().to_string()),
        issued_at: Set(None),
        voided_at: Set(None),
        created_by: Set(user.id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if !preview.line_items.is_empty() {
        LineItemsEntity::insert_many(preview.line_items.iter().enumerate().map(|(index, line)| {
            entity::invoice_line_items::ActiveModel {
                invoice_id: Set(invoice.id),
                line_type: Set(WORK_LINE.to_string()),
                group_key: Set(line.group_key.clone()),
                description: Set(line.description.clone()),
                quantity_hours: Set(line.quantity_hours),
                hourly_rate: Set(line.hourly_rate),
                amount: Set(line.amount),
                sort_order: Set(index as i32),
                metadata: Set(Some(line.metadata.to_string())),
                ..Default::default()
            }
        }))
        .exec_without_returning(&txn)
        .await?;
    }

    let items = line_items(&txn, invoice.id).await?;
    txn.commit().await?;

    info!(
        invoice_id = invoice.id,
        company_id = user.company_id,
        client_id = invoice.client_id,
        total = invoice.total_amount,
        unrated = preview.unrated_worklogs.len(),
        "Draft invoice created"
    );
    Ok(Json(InvoiceResponse::from(invoice).with_line_items(items)))
}

pub async fn list_invoices_handler(
    state: &AppState,
    user: AuthenticatedUser,
    query: InvoiceListQuery,
) -> Result<Json<InvoiceListResponse>> {
    let mut select = InvoicesEntity::find().filter(InvoiceColumn::CompanyId.eq(user.company_id));
    if let Some(client_id) = query.client_id {
        select = select.filter(InvoiceColumn::ClientId.eq(client_id));
    }
    if let Some(status) = query.status.as_deref() {
        let status = InvoiceStatus::from_string(status)
            .ok_or_else(|| AppError::validation(format!("Unknown invoice status: {}", status)))?;
        select = select.filter(InvoiceColumn::Status.eq(status));
    }

    let invoices = select
        .order_by_desc(InvoiceColumn::CreatedAt)
        .order_by_desc(InvoiceColumn::Id)
        .all(&state.db)
        .await?;

    Ok(Json(InvoiceListResponse {
        invoices: invoices.into_iter().map(Into::into).collect(),
    }))
}

pub async fn get_invoice_handler(
    state: &AppState,
    user: AuthenticatedUser,
    invoice_id: i32,
) -> Result<Json<InvoiceResponse>> {
    let invoice = find_invoice(&state.db, user.company_id, invoice_id).await?;
    let items = line_items(&state.db, invoice.id).await?;
    Ok(Json(InvoiceResponse::from(invoice).with_line_items(items)))
}

/// Moves `invoice` to `to`, provided its stored status still matches the one
/// read. A concurrent transition turns into a 400.
pub async fn apply_transition<C: ConnectionTrait>(
    db: &C,
    invoice: &entity::invoices::Model,
    to: InvoiceStatus,
) -> Result<entity::invoices::Model> {
    let status = transition(invoice.status, to)?;

    let now = Utc::now();
    let mut update = InvoicesEntity::update_many()
        .col_expr(InvoiceColumn::Status, Expr::value(status));
    match status {
        InvoiceStatus::Issued => update = update.col_expr(InvoiceColumn::IssuedAt, Expr::value(Some(now))),
        InvoiceStatus::Void => update = update.col_expr(InvoiceColumn::VoidedAt, Expr::value(Some(now))),
        InvoiceStatus::Draft => {},
    }
    let result = update
        .filter(InvoiceColumn::Id.eq(invoice.id))
        .filter(InvoiceColumn::CompanyId.eq(invoice.company_id))
        .filter(InvoiceColumn::Status.eq(invoice.status))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::bad_request("Invoice status changed concurrently"));
    }

    find_invoice(db, invoice.company_id, invoice.id).await
}

async fn move_invoice(
    state: &AppState,
    user: &AuthenticatedUser,
    invoice_id: i32,
    to: InvoiceStatus,
) -> Result<Json<InvoiceResponse>> {
    user.require_admin()?;

    let invoice = find_invoice(&state.db, user.company_id, invoice_id).await?;
    let from = invoice.status;
    let invoice = apply_transition(&state.db, &invoice, to).await?;

    info!(
        invoice_id = invoice.id,
        company_id = user.company_id,
        from = ?from,
        to = ?invoice.status,
        "Invoice status changed"
    );
    let items = line_items(&state.db, invoice.id).await?;
    Ok(Json(InvoiceResponse::from(invoice).with_line_items(items)))
}

pub async fn issue_invoice_handler(
    state: &AppState,
    user: AuthenticatedUser,
    invoice_id: i32,
) -> Result<Json<InvoiceResponse>> {
    move_invoice(state, &user, invoice_id, InvoiceStatus::Issued).await
}

pub async fn void_invoice_handler(
    state: &AppState,
    user: AuthenticatedUser,
    invoice_id: i32,
) -> Result<Json<InvoiceResponse>> {
    move_invoice(state, &user, invoice_id, InvoiceStatus::Void).await
}

pub async fn delete_invoice_handler(
    state: &AppState,
    user: AuthenticatedUser,
    invoice_id: i32,
) -> Result<Json<SuccessResponse>> {
    user.require_admin()?;

    let invoice = find_invoice(&state.db, user.company_id, invoice_id).await?;
    if invoice.status != InvoiceStatus::Draft {
        return Err(AppError::bad_request("Only draft invoices can be deleted"));
    }

    let txn = state.db.begin().await?;
    LineItemsEntity::delete_many()
        .filter(LineItemColumn::InvoiceId.eq(invoice.id))
        .exec(&txn)
        .await?;
    let deleted = InvoicesEntity::delete_many()
        .filter(InvoiceColumn::Id.eq(invoice.id))
        .filter(InvoiceColumn::Status.eq(InvoiceStatus::Draft))
        .exec(&txn)
        .await?;
    if deleted.rows_affected == 0 {
        return Err(AppError::bad_request("Only draft invoices can be deleted"));
    }
    txn.commit().await?;

    info!(invoice_id, company_id = user.company_id, "Draft invoice deleted");
    Ok(Json(SuccessResponse::new("Invoice deleted")))
}
