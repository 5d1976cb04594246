pub mod lifecycle;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::service_orders::lifecycle::{run_operation, TriggeredOperation};
use crate::shared::schema::service_orders;
use crate::shared::state::AppState;
use crate::shared::utils::{
    created, db_conn, internal_error, not_found, ok_data, ok_message, validation_error, ApiError,
    DbConn,
};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = service_orders)]
pub struct ServiceOrder {
    pub id: Uuid,
    pub ticket_no: String,
    pub account_no: String,
    pub customer_id: Option<Uuid>,
    pub concern: String,
    pub concern_details: Option<String>,
    pub support_status: String,
    pub visit_status: Option<String>,
    pub repair_category: Option<String>,
    pub repair_details: Option<String>,
    pub assigned_team: Option<String>,
    pub visit_by: Option<String>,
    pub visit_schedule: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_by_user_id: Option<Uuid>,
    pub updated_by_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateServiceOrderRequest {
    #[validate(length(min = 1, message = "The account_no field is required"))]
    pub account_no: String,
    pub customer_id: Option<Uuid>,
    #[validate(length(min = 1, message = "The concern field is required"))]
    pub concern: String,
    pub concern_details: Option<String>,
    pub assigned_team: Option<String>,
    pub visit_by: Option<String>,
    pub visit_schedule: Option<DateTime<Utc>>,
    pub created_by_user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateServiceOrderRequest {
    pub concern: Option<String>,
    pub concern_details: Option<String>,
    pub support_status: Option<String>,
    pub visit_status: Option<String>,
    pub repair_category: Option<String>,
    pub repair_details: Option<String>,
    pub assigned_team: Option<String>,
    pub visit_by: Option<String>,
    pub visit_schedule: Option<DateTime<Utc>>,
    pub updated_by_user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub support_status: Option<String>,
    pub visit_status: Option<String>,
    pub concern: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn generate_ticket_no(conn: &mut DbConn) -> String {
    let count: i64 = service_orders::table.count().get_result(conn).unwrap_or(0);
    format!("SO-{:06}", count + 1)
}

pub async fn list_service_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let limit = query.limit.unwrap_or(50);
    let offset = query.offset.unwrap_or(0);

    let mut q = service_orders::table.into_boxed();

    if let Some(status) = query.support_status {
        q = q.filter(service_orders::support_status.eq(status));
    }

    if let Some(status) = query.visit_status {
        q = q.filter(service_orders::visit_status.eq(status));
    }

    if let Some(concern) = query.concern {
        q = q.filter(service_orders::concern.eq(concern));
    }

    if let Some(search) = query.search {
        let pattern = format!("%{search}%");
        q = q.filter(
            service_orders::ticket_no
                .ilike(pattern.clone())
                .or(service_orders::account_no.ilike(pattern)),
        );
    }

    let rows: Vec<ServiceOrder> = q
        .order(service_orders::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
        .map_err(|e| internal_error("Failed to list service orders", e))?;

    Ok(ok_data(rows))
}

pub async fn get_service_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let order: ServiceOrder = service_orders::table
        .filter(service_orders::id.eq(id))
        .first(&mut conn)
        .map_err(|_| not_found("Service order"))?;

    Ok(ok_data(order))
}

pub async fn create_service_order(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateServiceOrderRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    req.validate().map_err(|e| validation_error(&e))?;

    let mut conn = db_conn(&state)?;
    let now = Utc::now();
    let ticket_no = generate_ticket_no(&mut conn);

    let order = ServiceOrder {
        id: Uuid::new_v4(),
        ticket_no,
        account_no: req.account_no,
        customer_id: req.customer_id,
        concern: req.concern,
        concern_details: req.concern_details,
        support_status: "Open".to_string(),
        visit_status: None,
        repair_category: None,
        repair_details: None,
        assigned_team: req.assigned_team,
        visit_by: req.visit_by,
        visit_schedule: req.visit_schedule,
        resolved_at: None,
        created_by_user_id: req.created_by_user_id,
        updated_by_user_id: None,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(service_orders::table)
        .values(&order)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to create service order", e))?;

    Ok(created(order))
}

/// Applies the field updates, then checks whether the resulting
/// (concern, support_status) or (repair_category, visit_status) pair
/// triggers a network operation. The operation runs after the row is
/// committed; its outcome string rides along in the response and nothing
/// is rolled back when it fails.
pub async fn update_service_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateServiceOrderRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let before: ServiceOrder = service_orders::table
        .filter(service_orders::id.eq(id))
        .first(&mut conn)
        .map_err(|_| not_found("Service order"))?;

    let now = Utc::now();

    diesel::update(service_orders::table.filter(service_orders::id.eq(id)))
        .set(service_orders::updated_at.eq(now))
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to update service order", e))?;

    if let Some(concern) = req.concern {
        diesel::update(service_orders::table.filter(service_orders::id.eq(id)))
            .set(service_orders::concern.eq(concern))
            .execute(&mut conn)
            .map_err(|e| internal_error("Failed to update service order", e))?;
    }

    if let Some(details) = req.concern_details {
        diesel::update(service_orders::table.filter(service_orders::id.eq(id)))
            .set(service_orders::concern_details.eq(details))
            .execute(&mut conn)
            .map_err(|e| internal_error("Failed to update service order", e))?;
    }

    if let Some(status) = &req.support_status {
        diesel::update(service_orders::table.filter(service_orders::id.eq(id)))
            .set(service_orders::support_status.eq(status))
            .execute(&mut conn)
            .map_err(|e| internal_error("Failed to update service order", e))?;

        if status == "Resolved" {
            diesel::update(service_orders::table.filter(service_orders::id.eq(id)))
                .set(service_orders::resolved_at.eq(Some(now)))
                .execute(&mut conn)
                .map_err(|e| internal_error("Failed to update service order", e))?;
        }
    }

    if let Some(status) = req.visit_status {
        diesel::update(service_orders::table.filter(service_orders::id.eq(id)))
            .set(service_orders::visit_status.eq(status))
            .execute(&mut conn)
            .map_err(|e| internal_error("Failed to update service order", e))?;
    }

    if let Some(category) = req.repair_category {
        diesel::update(service_orders::table.filter(service_orders::id.eq(id)))
            .set(service_orders::repair_category.eq(category))
            .execute(&mut conn)
            .map_err(|e| internal_error("Failed to update service order", e))?;
    }

    if let Some(details) = req.repair_details {
        diesel::update(service_orders::table.filter(service_orders::id.eq(id)))
            .set(service_orders::repair_details.eq(details))
            .execute(&mut conn)
            .map_err(|e| internal_error("Failed to update service order", e))?;
    }

    if let Some(team) = req.assigned_team {
        diesel::update(service_orders::table.filter(service_orders::id.eq(id)))
            .set(service_orders::assigned_team.eq(team))
            .execute(&mut conn)
            .map_err(|e| internal_error("Failed to update service order", e))?;
    }

    if let Some(visit_by) = req.visit_by {
        diesel::update(service_orders::table.filter(service_orders::id.eq(id)))
            .set(service_orders::visit_by.eq(visit_by))
            .execute(&mut conn)
            .map_err(|e| internal_error("Failed to update service order", e))?;
    }

    if let Some(schedule) = req.visit_schedule {
        diesel::update(service_orders::table.filter(service_orders::id.eq(id)))
            .set(service_orders::visit_schedule.eq(Some(schedule)))
            .execute(&mut conn)
            .map_err(|e| internal_error("Failed to update service order", e))?;
    }

    if let Some(user_id) = req.updated_by_user_id {
        diesel::update(service_orders::table.filter(service_orders::id.eq(id)))
            .set(service_orders::updated_by_user_id.eq(Some(user_id)))
            .execute(&mut conn)
            .map_err(|e| internal_error("Failed to update service order", e))?;
    }

    let order: ServiceOrder = service_orders::table
        .filter(service_orders::id.eq(id))
        .first(&mut conn)
        .map_err(|_| not_found("Service order"))?;

    drop(conn);

    let status_changed = before.support_status != order.support_status
        || before.visit_status != order.visit_status;

    let trigger = TriggeredOperation::detect(
        &order.concern,
        &order.support_status,
        order.repair_category.as_deref(),
        order.visit_status.as_deref(),
    );

    if let (true, Some(operation)) = (status_changed, trigger) {
        let outcome = run_operation(&state, operation, &order.account_no).await;
        return Ok(Json(json!({
            "success": true,
            "data": order,
            "operation": operation.as_str(),
            "operation_result": outcome.as_str(),
        })));
    }

    Ok(ok_data(order))
}

pub async fn delete_service_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let deleted = diesel::delete(service_orders::table.filter(service_orders::id.eq(id)))
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to delete service order", e))?;

    if deleted == 0 {
        return Err(not_found("Service order"));
    }

    Ok(ok_message("Service order deleted"))
}

pub async fn service_order_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let total: i64 = service_orders::table
        .count()
        .get_result(&mut conn)
        .unwrap_or(0);

    let open: i64 = service_orders::table
        .filter(service_orders::support_status.eq("Open"))
        .count()
        .get_result(&mut conn)
        .unwrap_or(0);

    let resolved: i64 = service_orders::table
        .filter(service_orders::support_status.eq("Resolved"))
        .count()
        .get_result(&mut conn)
        .unwrap_or(0);

    Ok(ok_data(json!({
        "total": total,
        "open": open,
        "resolved": resolved,
    })))
}

pub fn configure_service_order_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/service-orders",
            get(list_service_orders).post(create_service_order),
        )
        .route("/api/service-orders/stats", get(service_order_stats))
        .route(
            "/api/service-orders/:id",
            get(get_service_order)
                .put(update_service_order)
                .delete(delete_service_order),
        )
}
