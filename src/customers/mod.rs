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

use crate::shared::schema::customers;
use crate::shared::state::AppState;
use crate::shared::utils::{
    created, db_conn, internal_error, not_found, ok_data, ok_message, validation_error, ApiError,
    DbConn,
};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = customers)]
pub struct Customer {
    pub id: Uuid,
    pub account_no: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: Option<String>,
    pub mobile_no: Option<String>,
    pub address: Option<String>,
    pub barangay: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub status: String,
    pub created_by_user_id: Option<Uuid>,
    pub updated_by_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, message = "The first_name field is required"))]
    pub first_name: String,
    pub middle_name: Option<String>,
    #[validate(length(min = 1, message = "The last_name field is required"))]
    pub last_name: String,
    #[validate(email(message = "The email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 10, max = 13, message = "The mobile_no must be a valid number"))]
    pub mobile_no: Option<String>,
    pub address: Option<String>,
    pub barangay: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub created_by_user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email(message = "The email must be a valid email address"))]
    pub email: Option<String>,
    pub mobile_no: Option<String>,
    pub address: Option<String>,
    pub barangay: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub status: Option<String>,
    pub updated_by_user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub city: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn generate_account_no(conn: &mut DbConn) -> String {
    let count: i64 = customers::table.count().get_result(conn).unwrap_or(0);
    format!("ACC-{:06}", count + 1)
}

pub async fn list_customers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let limit = query.limit.unwrap_or(50);
    let offset = query.offset.unwrap_or(0);

    let mut q = customers::table.into_boxed();

    if let Some(status) = query.status {
        q = q.filter(customers::status.eq(status));
    }

    if let Some(city) = query.city {
        q = q.filter(customers::city.eq(city));
    }

    if let Some(search) = query.search {
        let pattern = format!("%{search}%");
        q = q.filter(
            customers::first_name
                .ilike(pattern.clone())
                .or(customers::last_name.ilike(pattern.clone()))
                .or(customers::account_no.ilike(pattern)),
        );
    }

    let rows: Vec<Customer> = q
        .order(customers::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
        .map_err(|e| internal_error("Failed to list customers", e))?;

    Ok(ok_data(rows))
}

pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let customer: Customer = customers::table
        .filter(customers::id.eq(id))
        .first(&mut conn)
        .map_err(|_| not_found("Customer"))?;

    Ok(ok_data(customer))
}

pub async fn get_customer_by_account(
    State(state): State<Arc<AppState>>,
    Path(account_no): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let customer: Customer = customers::table
        .filter(customers::account_no.eq(account_no))
        .first(&mut conn)
        .map_err(|_| not_found("Customer"))?;

    Ok(ok_data(customer))
}

pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    req.validate().map_err(|e| validation_error(&e))?;

    let mut conn = db_conn(&state)?;
    let now = Utc::now();
    let account_no = generate_account_no(&mut conn);

    let customer = Customer {
        id: Uuid::new_v4(),
        account_no,
        first_name: req.first_name,
        middle_name: req.middle_name,
        last_name: req.last_name,
        email: req.email,
        mobile_no: req.mobile_no,
        address: req.address,
        barangay: req.barangay,
        city: req.city,
        province: req.province,
        status: "active".to_string(),
        created_by_user_id: req.created_by_user_id,
        updated_by_user_id: None,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(customers::table)
        .values(&customer)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to create customer", e))?;

    Ok(created(customer))
}

pub async fn update_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCustomerRequest>,
) -> Result<Json<Value>, ApiError> {
    req.validate().map_err(|e| validation_error(&e))?;

    let mut conn = db_conn(&state)?;

    let existing: Customer = customers::table
        .filter(customers::id.eq(id))
        .first(&mut conn)
        .map_err(|_| not_found("Customer"))?;

    let updated = Customer {
        first_name: req.first_name.unwrap_or(existing.first_name),
        middle_name: req.middle_name.or(existing.middle_name),
        last_name: req.last_name.unwrap_or(existing.last_name),
        email: req.email.or(existing.email),
        mobile_no: req.mobile_no.or(existing.mobile_no),
        address: req.address.or(existing.address),
        barangay: req.barangay.or(existing.barangay),
        city: req.city.or(existing.city),
        province: req.province.or(existing.province),
        status: req.status.unwrap_or(existing.status),
        updated_by_user_id: req.updated_by_user_id.or(existing.updated_by_user_id),
        updated_at: Utc::now(),
        ..existing
    };

    diesel::update(customers::table.filter(customers::id.eq(id)))
        .set(&updated)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to update customer", e))?;

    Ok(ok_data(updated))
}

pub async fn delete_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let deleted = diesel::delete(customers::table.filter(customers::id.eq(id)))
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to delete customer", e))?;

    if deleted == 0 {
        return Err(not_found("Customer"));
    }

    Ok(ok_message("Customer deleted"))
}

pub async fn customer_stats(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let total: i64 = customers::table
        .count()
        .get_result(&mut conn)
        .unwrap_or(0);

    let active: i64 = customers::table
        .filter(customers::status.eq("active"))
        .count()
        .get_result(&mut conn)
        .unwrap_or(0);

    Ok(ok_data(json!({ "total": total, "active": active })))
}

pub fn configure_customer_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/customers",
            get(list_customers).post(create_customer),
        )
        .route("/api/customers/stats", get(customer_stats))
        .route(
            "/api/customers/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route(
            "/api/customers/account/:account_no",
            get(get_customer_by_account),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_requires_names() {
        let req = CreateCustomerRequest {
            first_name: String::new(),
            middle_name: None,
            last_name: "Reyes".to_string(),
            email: None,
            mobile_no: None,
            address: None,
            barangay: None,
            city: None,
            province: None,
            created_by_user_id: None,
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("first_name"));
    }

    #[test]
    fn create_request_rejects_bad_email() {
        let req = CreateCustomerRequest {
            first_name: "Ana".to_string(),
            middle_name: None,
            last_name: "Reyes".to_string(),
            email: Some("not-an-email".to_string()),
            mobile_no: None,
            address: None,
            barangay: None,
            city: None,
            province: None,
            created_by_user_id: None,
        };
        assert!(req.validate().is_err());
    }
}
