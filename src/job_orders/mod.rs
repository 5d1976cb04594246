use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::accounts::billing_status;
use crate::network::occupy_port;
use crate::shared::schema::{billing_accounts, job_orders};
use crate::shared::state::AppState;
use crate::shared::utils::{
    api_error, created, db_conn, internal_error, not_found, ok_data, ok_message, validation_error,
    ApiError, DbConn,
};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = job_orders)]
pub struct JobOrder {
    pub id: Uuid,
    pub jo_number: String,
    pub account_no: String,
    pub customer_id: Option<Uuid>,
    pub order_type: String,
    pub status: String,
    pub installation_address: Option<String>,
    pub lcp_id: Option<Uuid>,
    pub nap_id: Option<Uuid>,
    pub port_no: Option<i32>,
    pub onu_serial: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub assigned_team: Option<String>,
    pub created_by_user_id: Option<Uuid>,
    pub updated_by_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobOrderRequest {
    #[validate(length(min = 1, message = "The account_no field is required"))]
    pub account_no: String,
    pub customer_id: Option<Uuid>,
    #[validate(length(min = 1, message = "The order_type field is required"))]
    pub order_type: String,
    pub installation_address: Option<String>,
    pub lcp_id: Option<Uuid>,
    pub nap_id: Option<Uuid>,
    pub port_no: Option<i32>,
    pub onu_serial: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub assigned_team: Option<String>,
    pub created_by_user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJobOrderRequest {
    pub status: Option<String>,
    pub installation_address: Option<String>,
    pub lcp_id: Option<Uuid>,
    pub nap_id: Option<Uuid>,
    pub port_no: Option<i32>,
    pub onu_serial: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub assigned_team: Option<String>,
    pub updated_by_user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub order_type: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn generate_jo_number(conn: &mut DbConn) -> String {
    let count: i64 = job_orders::table.count().get_result(conn).unwrap_or(0);
    format!("JO-{:06}", count + 1)
}

pub async fn list_job_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let limit = query.limit.unwrap_or(50);
    let offset = query.offset.unwrap_or(0);

    let mut q = job_orders::table.into_boxed();

    if let Some(status) = query.status {
        q = q.filter(job_orders::status.eq(status));
    }

    if let Some(order_type) = query.order_type {
        q = q.filter(job_orders::order_type.eq(order_type));
    }

    if let Some(search) = query.search {
        let pattern = format!("%{search}%");
        q = q.filter(
            job_orders::jo_number
                .ilike(pattern.clone())
                .or(job_orders::account_no.ilike(pattern)),
        );
    }

    let rows: Vec<JobOrder> = q
        .order(job_orders::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
        .map_err(|e| internal_error("Failed to list job orders", e))?;

    Ok(ok_data(rows))
}

pub async fn get_job_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let order: JobOrder = job_orders::table
        .filter(job_orders::id.eq(id))
        .first(&mut conn)
        .map_err(|_| not_found("Job order"))?;

    Ok(ok_data(order))
}

pub async fn create_job_order(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateJobOrderRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    req.validate().map_err(|e| validation_error(&e))?;

    let mut conn = db_conn(&state)?;
    let now = Utc::now();
    let jo_number = generate_jo_number(&mut conn);

    let order = JobOrder {
        id: Uuid::new_v4(),
        jo_number,
        account_no: req.account_no,
        customer_id: req.customer_id,
        order_type: req.order_type,
        status: "Pending".to_string(),
        installation_address: req.installation_address,
        lcp_id: req.lcp_id,
        nap_id: req.nap_id,
        port_no: req.port_no,
        onu_serial: req.onu_serial,
        scheduled_at: req.scheduled_at,
        completed_at: None,
        assigned_team: req.assigned_team,
        created_by_user_id: req.created_by_user_id,
        updated_by_user_id: None,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(job_orders::table)
        .values(&order)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to create job order", e))?;

    Ok(created(order))
}

pub async fn update_job_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateJobOrderRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let existing: JobOrder = job_orders::table
        .filter(job_orders::id.eq(id))
        .first(&mut conn)
        .map_err(|_| not_found("Job order"))?;

    let updated = JobOrder {
        status: req.status.unwrap_or(existing.status),
        installation_address: req.installation_address.or(existing.installation_address),
        lcp_id: req.lcp_id.or(existing.lcp_id),
        nap_id: req.nap_id.or(existing.nap_id),
        port_no: req.port_no.or(existing.port_no),
        onu_serial: req.onu_serial.or(existing.onu_serial),
        scheduled_at: req.scheduled_at.or(existing.scheduled_at),
        assigned_team: req.assigned_team.or(existing.assigned_team),
        updated_by_user_id: req.updated_by_user_id.or(existing.updated_by_user_id),
        updated_at: Utc::now(),
        ..existing
    };

    diesel::update(job_orders::table.filter(job_orders::id.eq(id)))
        .set(&updated)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to update job order", e))?;

    Ok(ok_data(updated))
}

/// Completion is the installation hand-off: the job order closes, the NAP
/// port it was provisioned against becomes occupied, and the billing
/// account goes live. The three writes commit together.
pub async fn complete_job_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let order: JobOrder = job_orders::table
        .filter(job_orders::id.eq(id))
        .first(&mut conn)
        .map_err(|_| not_found("Job order"))?;

    if order.status == "Done" {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Job order is already completed",
        ));
    }

    let pppoe_username = state.radius.derive_username(&order.account_no);
    let now = Utc::now();
    let today = now.date_naive();

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::update(job_orders::table.filter(job_orders::id.eq(id)))
            .set((
                job_orders::status.eq("Done"),
                job_orders::completed_at.eq(Some(now)),
                job_orders::updated_at.eq(now),
            ))
            .execute(conn)?;

        if let (Some(nap_id), Some(port_no)) = (order.nap_id, order.port_no) {
            occupy_port(conn, nap_id, port_no, &order.account_no)?;
        }

        diesel::update(
            billing_accounts::table.filter(billing_accounts::account_no.eq(&order.account_no)),
        )
        .set((
            billing_accounts::billing_status_id.eq(billing_status::ACTIVE),
            billing_accounts::updated_at.eq(now),
        ))
        .execute(conn)?;

        diesel::update(
            billing_accounts::table
                .filter(billing_accounts::account_no.eq(&order.account_no))
                .filter(billing_accounts::date_installed.is_null()),
        )
        .set(billing_accounts::date_installed.eq(Some(today)))
        .execute(conn)?;

        diesel::update(
            billing_accounts::table
                .filter(billing_accounts::account_no.eq(&order.account_no))
                .filter(billing_accounts::pppoe_username.is_null()),
        )
        .set(billing_accounts::pppoe_username.eq(Some(pppoe_username)))
        .execute(conn)?;

        Ok(())
    })
    .map_err(|e| internal_error("Failed to complete job order", e))?;

    Ok(ok_message(format!("Job order {} completed", order.jo_number)))
}

pub async fn delete_job_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let deleted = diesel::delete(job_orders::table.filter(job_orders::id.eq(id)))
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to delete job order", e))?;

    if deleted == 0 {
        return Err(not_found("Job order"));
    }

    Ok(ok_message("Job order deleted"))
}

pub fn configure_job_order_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/job-orders", get(list_job_orders).post(create_job_order))
        .route(
            "/api/job-orders/:id",
            get(get_job_order)
                .put(update_job_order)
                .delete(delete_job_order),
        )
        .route("/api/job-orders/:id/complete", put(complete_job_order))
}
