//! # Holiday Handlers
//!
//! Company holidays reduce the expected hours on the dashboard.

use axum::Json;
use chrono::NaiveDate;
use entity::holidays::{Column, Entity as HolidaysEntity};
use error::{AppError, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use tracing::info;
use validator::Validate;

use crate::{
    dto::{
        settings::{CreateHolidayRequest, HolidayListQuery, HolidayListResponse, HolidayResponse},
        SuccessResponse,
    },
    middleware::auth::AuthenticatedUser,
    AppState,
};

const DEFAULT_COUNTRY: &str = "ES";

pub async fn list_holidays_handler(
    state: &AppState,
    user: AuthenticatedUser,
    query: HolidayListQuery,
) -> Result<Json<HolidayListResponse>> {
    let mut select = HolidaysEntity::find().filter(Column::CompanyId.eq(user.company_id));

    if let Some(year) = query.year {
        let (first, last) = NaiveDate::from_ymd_opt(year, 1, 1)
            .zip(NaiveDate::from_ymd_opt(year, 12, 31))
            .ok_or_else(|| AppError::validation(format!("Invalid year: {}", year)))?;
        select = select
            .filter(Column::HolidayDate.gte(first))
            .filter(Column::HolidayDate.lte(last));
    }

    let holidays = select
        .order_by_asc(Column::HolidayDate)
        .all(&state.db)
        .await?;

    Ok(Json(HolidayListResponse {
        holidays: holidays.into_iter().map(Into::into).collect(),
    }))
}

pub async fn create_holiday_handler(
    state: &AppState,
    user: AuthenticatedUser,
    req: CreateHolidayRequest,
) -> Result<Json<HolidayResponse>> {
    user.require_admin()?;
    req.validate()?;

    let existing = HolidaysEntity::find()
        .filter(Column::CompanyId.eq(user.company_id))
        .filter(Column::HolidayDate.eq(req.holiday_date))
        .count(&state.db)
        .await?;
    if existing > 0 {
        return Err(AppError::conflict(format!(
            "A holiday already exists on {}",
            req.holiday_date
        )));
    }

    let holiday = entity::holidays::ActiveModel {
        company_id: Set(user.company_id),
        name: Set(req.name.trim().to_string()),
        holiday_date: Set(req.holiday_date),
        country: Set(req
            .country
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string())),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(holiday_id = holiday.id, company_id = user.company_id, date = %holiday.holiday_date, "Holiday created");
    Ok(Json(holiday.into()))
}

pub async fn delete_holiday_handler(
    state: &AppState,
    user: AuthenticatedUser,
    holiday_id: i32,
) -> Result<Json<SuccessResponse>> {
    user.require_admin()?;

    let holiday = HolidaysEntity::find_by_id(holiday_id)
        .filter(Column::CompanyId.eq(user.company_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("Holiday not found"))?;

    HolidaysEntity::delete_by_id(holiday.id)
        .exec(&state.db)
        .await?;

    info!(holiday_id, company_id = user.company_id, "Holiday deleted");
    Ok(Json(SuccessResponse::new("Holiday deleted")))
}
