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

use crate::shared::schema::inventory_items;
use crate::shared::state::AppState;
use crate::shared::utils::{
    created, db_conn, internal_error, not_found, ok_data, ok_message, validation_error, ApiError,
};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = inventory_items)]
pub struct InventoryItem {
    pub id: Uuid,
    pub item_code: String,
    pub name: String,
    pub category: String,
    pub serial_no: Option<String>,
    pub quantity: i32,
    pub unit: Option<String>,
    pub status: String,
    pub assigned_account_no: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, message = "The item_code field is required"))]
    pub item_code: String,
    #[validate(length(min = 1, message = "The name field is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "The category field is required"))]
    pub category: String,
    pub serial_no: Option<String>,
    #[validate(range(min = 0, message = "The quantity must not be negative"))]
    pub quantity: i32,
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub serial_no: Option<String>,
    pub quantity: Option<i32>,
    pub unit: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignItemRequest {
    pub account_no: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let limit = query.limit.unwrap_or(50);
    let offset = query.offset.unwrap_or(0);

    let mut q = inventory_items::table.into_boxed();

    if let Some(category) = query.category {
        q = q.filter(inventory_items::category.eq(category));
    }

    if let Some(status) = query.status {
        q = q.filter(inventory_items::status.eq(status));
    }

    if let Some(search) = query.search {
        let pattern = format!("%{search}%");
        q = q.filter(
            inventory_items::name
                .ilike(pattern.clone())
                .or(inventory_items::item_code.ilike(pattern.clone()))
                .or(inventory_items::serial_no.ilike(pattern)),
        );
    }

    let rows: Vec<InventoryItem> = q
        .order(inventory_items::item_code.asc())
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
        .map_err(|e| internal_error("Failed to list inventory items", e))?;

    Ok(ok_data(rows))
}

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let item: InventoryItem = inventory_items::table
        .filter(inventory_items::id.eq(id))
        .first(&mut conn)
        .map_err(|_| not_found("Inventory item"))?;

    Ok(ok_data(item))
}

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    req.validate().map_err(|e| validation_error(&e))?;

    let mut conn = db_conn(&state)?;
    let now = Utc::now();

    let item = InventoryItem {
        id: Uuid::new_v4(),
        item_code: req.item_code,
        name: req.name,
        category: req.category,
        serial_no: req.serial_no,
        quantity: req.quantity,
        unit: req.unit,
        status: "in_stock".to_string(),
        assigned_account_no: None,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(inventory_items::table)
        .values(&item)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to create inventory item", e))?;

    Ok(created(item))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let existing: InventoryItem = inventory_items::table
        .filter(inventory_items::id.eq(id))
        .first(&mut conn)
        .map_err(|_| not_found("Inventory item"))?;

    let updated = InventoryItem {
        name: req.name.unwrap_or(existing.name),
        category: req.category.unwrap_or(existing.category),
        serial_no: req.serial_no.or(existing.serial_no),
        quantity: req.quantity.unwrap_or(existing.quantity),
        unit: req.unit.or(existing.unit),
        status: req.status.unwrap_or(existing.status),
        updated_at: Utc::now(),
        ..existing
    };

    diesel::update(inventory_items::table.filter(inventory_items::id.eq(id)))
        .set(&updated)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to update inventory item", e))?;

    Ok(ok_data(updated))
}

/// Assigning hands the item to an account and flips its status; quantity
/// tracking stays manual, matching warehouse practice.
pub async fn assign_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignItemRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let updated = diesel::update(inventory_items::table.filter(inventory_items::id.eq(id)))
        .set((
            inventory_items::assigned_account_no.eq(Some(req.account_no.clone())),
            inventory_items::status.eq("deployed"),
            inventory_items::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to assign inventory item", e))?;

    if updated == 0 {
        return Err(not_found("Inventory item"));
    }

    Ok(ok_message(format!("Item assigned to {}", req.account_no)))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let deleted = diesel::delete(inventory_items::table.filter(inventory_items::id.eq(id)))
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to delete inventory item", e))?;

    if deleted == 0 {
        return Err(not_found("Inventory item"));
    }

    Ok(ok_message("Inventory item deleted"))
}

pub fn configure_inventory_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/inventory", get(list_items).post(create_item))
        .route(
            "/api/inventory/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/api/inventory/:id/assign", put(assign_item))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_quantity_is_rejected() {
        let req = CreateItemRequest {
            item_code: "ONU-100".to_string(),
            name: "ONU router".to_string(),
            category: "cpe".to_string(),
            serial_no: None,
            quantity: -1,
            unit: None,
        };
        assert!(req.validate().is_err());
    }
}
