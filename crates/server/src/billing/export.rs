//! # Invoice Export
//!
//! Renders an invoice and its line items as a CSV sheet: a header block,
//! the line table, then the totals. Rows have different widths.

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use entity::{
    billing_clients::Entity as ClientsEntity,
    invoice_line_items::{Column as LineItemColumn, Entity as LineItemsEntity},
    invoices::{Column as InvoiceColumn, Entity as InvoicesEntity},
};
use error::{AppError, Result};
use sea_orm::{ActiveEnum, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::info;

use crate::{middleware::auth::AuthenticatedUser, AppState};

fn amount(value: f64) -> String { format!("{:.2}", value) }

/// CSV bytes for one invoice.
pub fn invoice_csv(
    invoice: &entity::invoices::Model,
    client_name: &str,
    items: &[entity::invoice_line_items::Model],
) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    let csv_error = |e: csv::Error| AppError::internal(format!("Failed to write invoice CSV: {}", e));

    let header_rows = [
        ["Invoice".to_string(), invoice.id.to_string()],
        ["Client".to_string(), client_name.to_string()],
        [
            "Period".to_string(),
            format!("{} - {}", invoice.period_start, invoice.period_end),
        ],
        ["Status".to_string(), invoice.status.to_value()],
        ["Currency".to_string(), invoice.currency.clone()],
    ];
    for row in &header_rows {
        writer.write_record(row).map_err(csv_error)?;
    }

    writer
        .write_record(["#", "Description", "Hours", "Hourly rate", "Amount"])
        .map_err(csv_error)?;
    for (index, item) in items.iter().enumerate() {
        writer
            .write_record([
                (index + 1).to_string(),
                item.description.clone(),
                amount(item.quantity_hours),
                amount(item.hourly_rate),
                amount(item.amount),
            ])
            .map_err(csv_error)?;
    }

    for (label, value) in [
        ("Subtotal", invoice.subtotal_amount),
        ("Taxes", invoice.taxes_amount),
        ("Total", invoice.total_amount),
    ] {
        writer
            .write_record([label.to_string(), amount(value)])
            .map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::internal(format!("Failed to flush invoice CSV: {}", e)))
}

/// File name offered to the browser, reduced to characters safe in a header.
fn file_name(invoice_id: i32, client_name: &str) -> String {
    let client: String = client_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("invoice_{}_{}.csv", invoice_id, client)
}

pub async fn export_invoice_handler(state: &AppState, user: AuthenticatedUser, invoice_id: i32) -> Result<Response> {
    let invoice = InvoicesEntity::find_by_id(invoice_id)
        .filter(InvoiceColumn::CompanyId.eq(user.company_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("Invoice not found"))?;
    let client = ClientsEntity::find_by_id(invoice.client_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("Billing client not found"))?;
    let items = LineItemsEntity::find()
        .filter(LineItemColumn::InvoiceId.eq(invoice.id))
        .order_by_asc(LineItemColumn::SortOrder)
        .all(&state.db)
        .await?;

    let body = invoice_csv(&invoice, &client.name, &items)?;
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        file_name(invoice.id, &client.name)
    ))
    .map_err(|e| AppError::internal(format!("Invalid export file name: {}", e)))?;

    info!(invoice_id, company_id = user.company_id, bytes = body.len(), "Invoice exported");
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
