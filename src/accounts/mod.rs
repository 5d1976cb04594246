use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use bigdecimal::{BigDecimal, FromPrimitive};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::shared::schema::{billing_accounts, customers, plans};
use crate::shared::state::AppState;
use crate::shared::utils::{
    api_error, created, db_conn, internal_error, not_found, ok_data, ok_message, validation_error,
    ApiError,
};

/// Billing status enumeration carried over from the operations platform.
/// Values are stored raw and checked ad hoc at each call site; there is no
/// state machine.
pub mod billing_status {
    pub const ACTIVE: i32 = 1;
    pub const INACTIVE: i32 = 2;
    pub const SUSPENDED: i32 = 3;
    pub const DISCONNECTED: i32 = 4;
    pub const PULLOUT: i32 = 5;

    pub fn label(id: i32) -> &'static str {
        match id {
            ACTIVE => "Active",
            INACTIVE => "Inactive",
            SUSPENDED => "Suspended",
            DISCONNECTED => "Disconnected",
            PULLOUT => "Pullout",
            _ => "Unknown",
        }
    }

    pub fn is_valid(id: i32) -> bool {
        (ACTIVE..=PULLOUT).contains(&id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = billing_accounts)]
pub struct BillingAccount {
    pub id: Uuid,
    pub account_no: String,
    pub customer_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub billing_status_id: i32,
    pub pppoe_username: Option<String>,
    pub billing_day: i32,
    pub balance: BigDecimal,
    pub date_installed: Option<NaiveDate>,
    pub created_by_user_id: Option<Uuid>,
    pub updated_by_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = plans)]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub download_mbps: i32,
    pub upload_mbps: i32,
    pub monthly_fee: BigDecimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    pub customer_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub pppoe_username: Option<String>,
    #[validate(range(min = 1, max = 28, message = "The billing_day must be between 1 and 28"))]
    pub billing_day: i32,
    pub date_installed: Option<NaiveDate>,
    pub created_by_user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAccountRequest {
    pub plan_id: Option<Uuid>,
    pub pppoe_username: Option<String>,
    #[validate(range(min = 1, max = 28, message = "The billing_day must be between 1 and 28"))]
    pub billing_day: Option<i32>,
    pub date_installed: Option<NaiveDate>,
    pub updated_by_user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeBillingStatusRequest {
    pub billing_status_id: i32,
    pub updated_by_user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlanRequest {
    #[validate(length(min = 1, message = "The name field is required"))]
    pub name: String,
    #[validate(range(min = 1, message = "The download_mbps must be at least 1"))]
    pub download_mbps: i32,
    #[validate(range(min = 1, message = "The upload_mbps must be at least 1"))]
    pub upload_mbps: i32,
    #[validate(range(min = 0.0, message = "The monthly_fee must not be negative"))]
    pub monthly_fee: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlanRequest {
    pub name: Option<String>,
    pub download_mbps: Option<i32>,
    pub upload_mbps: Option<i32>,
    pub monthly_fee: Option<f64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub billing_status_id: Option<i32>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let limit = query.limit.unwrap_or(50);
    let offset = query.offset.unwrap_or(0);

    let mut q = billing_accounts::table.into_boxed();

    if let Some(status_id) = query.billing_status_id {
        q = q.filter(billing_accounts::billing_status_id.eq(status_id));
    }

    if let Some(search) = query.search {
        let pattern = format!("%{search}%");
        q = q.filter(billing_accounts::account_no.ilike(pattern));
    }

    let rows: Vec<BillingAccount> = q
        .order(billing_accounts::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
        .map_err(|e| internal_error("Failed to list billing accounts", e))?;

    Ok(ok_data(rows))
}

pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let account: BillingAccount = billing_accounts::table
        .filter(billing_accounts::id.eq(id))
        .first(&mut conn)
        .map_err(|_| not_found("Billing account"))?;

    Ok(ok_data(account))
}

pub async fn get_account_by_account_no(
    State(state): State<Arc<AppState>>,
    Path(account_no): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let account: BillingAccount = billing_accounts::table
        .filter(billing_accounts::account_no.eq(account_no))
        .first(&mut conn)
        .map_err(|_| not_found("Billing account"))?;

    Ok(ok_data(account))
}

pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    req.validate().map_err(|e| validation_error(&e))?;

    let mut conn = db_conn(&state)?;

    // The billing account inherits the customer's account number.
    let account_no: String = customers::table
        .filter(customers::id.eq(req.customer_id))
        .select(customers::account_no)
        .first(&mut conn)
        .map_err(|_| not_found("Customer"))?;

    let now = Utc::now();
    let account = BillingAccount {
        id: Uuid::new_v4(),
        account_no,
        customer_id: req.customer_id,
        plan_id: req.plan_id,
        billing_status_id: billing_status::INACTIVE,
        pppoe_username: req.pppoe_username,
        billing_day: req.billing_day,
        balance: BigDecimal::from(0),
        date_installed: req.date_installed,
        created_by_user_id: req.created_by_user_id,
        updated_by_user_id: None,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(billing_accounts::table)
        .values(&account)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to create billing account", e))?;

    Ok(created(account))
}

pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<Value>, ApiError> {
    req.validate().map_err(|e| validation_error(&e))?;

    let mut conn = db_conn(&state)?;
    let now = Utc::now();

    diesel::update(billing_accounts::table.filter(billing_accounts::id.eq(id)))
        .set(billing_accounts::updated_at.eq(now))
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to update billing account", e))?;

    if let Some(plan_id) = req.plan_id {
        diesel::update(billing_accounts::table.filter(billing_accounts::id.eq(id)))
            .set(billing_accounts::plan_id.eq(Some(plan_id)))
            .execute(&mut conn)
            .map_err(|e| internal_error("Failed to update billing account", e))?;
    }

    if let Some(username) = req.pppoe_username {
        diesel::update(billing_accounts::table.filter(billing_accounts::id.eq(id)))
            .set(billing_accounts::pppoe_username.eq(Some(username)))
            .execute(&mut conn)
            .map_err(|e| internal_error("Failed to update billing account", e))?;
    }

    if let Some(day) = req.billing_day {
        diesel::update(billing_accounts::table.filter(billing_accounts::id.eq(id)))
            .set(billing_accounts::billing_day.eq(day))
            .execute(&mut conn)
            .map_err(|e| internal_error("Failed to update billing account", e))?;
    }

    if let Some(date) = req.date_installed {
        diesel::update(billing_accounts::table.filter(billing_accounts::id.eq(id)))
            .set(billing_accounts::date_installed.eq(Some(date)))
            .execute(&mut conn)
            .map_err(|e| internal_error("Failed to update billing account", e))?;
    }

    if let Some(user_id) = req.updated_by_user_id {
        diesel::update(billing_accounts::table.filter(billing_accounts::id.eq(id)))
            .set(billing_accounts::updated_by_user_id.eq(Some(user_id)))
            .execute(&mut conn)
            .map_err(|e| internal_error("Failed to update billing account", e))?;
    }

    let account: BillingAccount = billing_accounts::table
        .filter(billing_accounts::id.eq(id))
        .first(&mut conn)
        .map_err(|_| not_found("Billing account"))?;

    Ok(ok_data(account))
}

pub async fn change_billing_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeBillingStatusRequest>,
) -> Result<Json<Value>, ApiError> {
    if !billing_status::is_valid(req.billing_status_id) {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Unknown billing status id {}", req.billing_status_id),
        ));
    }

    let mut conn = db_conn(&state)?;

    let updated = diesel::update(billing_accounts::table.filter(billing_accounts::id.eq(id)))
        .set((
            billing_accounts::billing_status_id.eq(req.billing_status_id),
            billing_accounts::updated_by_user_id.eq(req.updated_by_user_id),
            billing_accounts::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to change billing status", e))?;

    if updated == 0 {
        return Err(not_found("Billing account"));
    }

    Ok(ok_message(format!(
        "Billing status set to {}",
        billing_status::label(req.billing_status_id)
    )))
}

pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let deleted = diesel::delete(billing_accounts::table.filter(billing_accounts::id.eq(id)))
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to delete billing account", e))?;

    if deleted == 0 {
        return Err(not_found("Billing account"));
    }

    Ok(ok_message("Billing account deleted"))
}

pub async fn list_plans(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let rows: Vec<Plan> = plans::table
        .filter(plans::is_active.eq(true))
        .order(plans::monthly_fee.asc())
        .load(&mut conn)
        .map_err(|e| internal_error("Failed to list plans", e))?;

    Ok(ok_data(rows))
}

pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePlanRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    req.validate().map_err(|e| validation_error(&e))?;

    let mut conn = db_conn(&state)?;
    let now = Utc::now();

    let plan = Plan {
        id: Uuid::new_v4(),
        name: req.name,
        download_mbps: req.download_mbps,
        upload_mbps: req.upload_mbps,
        monthly_fee: BigDecimal::from_f64(req.monthly_fee).unwrap_or_else(|| BigDecimal::from(0)),
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(plans::table)
        .values(&plan)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to create plan", e))?;

    Ok(created(plan))
}

pub async fn update_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePlanRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let existing: Plan = plans::table
        .filter(plans::id.eq(id))
        .first(&mut conn)
        .map_err(|_| not_found("Plan"))?;

    let updated = Plan {
        name: req.name.unwrap_or(existing.name),
        download_mbps: req.download_mbps.unwrap_or(existing.download_mbps),
        upload_mbps: req.upload_mbps.unwrap_or(existing.upload_mbps),
        monthly_fee: req
            .monthly_fee
            .and_then(BigDecimal::from_f64)
            .unwrap_or(existing.monthly_fee),
        is_active: req.is_active.unwrap_or(existing.is_active),
        updated_at: Utc::now(),
        ..existing
    };

    diesel::update(plans::table.filter(plans::id.eq(id)))
        .set(&updated)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to update plan", e))?;

    Ok(ok_data(updated))
}

pub async fn deactivate_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let updated = diesel::update(plans::table.filter(plans::id.eq(id)))
        .set((plans::is_active.eq(false), plans::updated_at.eq(Utc::now())))
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to deactivate plan", e))?;

    if updated == 0 {
        return Err(not_found("Plan"));
    }

    Ok(ok_message("Plan deactivated"))
}

pub fn configure_account_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/accounts", get(list_accounts).post(create_account))
        .route(
            "/api/accounts/:id",
            get(get_account).put(update_account).delete(delete_account),
        )
        .route(
            "/api/accounts/account/:account_no",
            get(get_account_by_account_no),
        )
        .route("/api/accounts/:id/billing-status", put(change_billing_status))
        .route("/api/plans", get(list_plans).post(create_plan))
        .route("/api/plans/:id", put(update_plan).delete(deactivate_plan))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_status_labels_match_platform_ids() {
        assert_eq!(billing_status::label(1), "Active");
        assert_eq!(billing_status::label(4), "Disconnected");
        assert_eq!(billing_status::label(5), "Pullout");
        assert_eq!(billing_status::label(9), "Unknown");
    }

    #[test]
    fn billing_status_validity_bounds() {
        assert!(billing_status::is_valid(1));
        assert!(billing_status::is_valid(5));
        assert!(!billing_status::is_valid(0));
        assert!(!billing_status::is_valid(6));
    }

    #[test]
    fn billing_day_outside_cycle_is_rejected() {
        let req = CreateAccountRequest {
            customer_id: Uuid::new_v4(),
            plan_id: None,
            pppoe_username: None,
            billing_day: 31,
            date_installed: None,
            created_by_user_id: None,
        };
        assert!(req.validate().is_err());
    }
}
