use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::shared::schema::{barangays, cities, provinces};
use crate::shared::state::AppState;
use crate::shared::utils::{
    created, db_conn, internal_error, not_found, ok_data, ok_message, validation_error, ApiError,
};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = provinces)]
pub struct Province {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = cities)]
pub struct City {
    pub id: Uuid,
    pub province_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = barangays)]
pub struct Barangay {
    pub id: Uuid,
    pub city_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProvinceRequest {
    #[validate(length(min = 1, message = "The name field is required"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCityRequest {
    pub province_id: Uuid,
    #[validate(length(min = 1, message = "The name field is required"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBarangayRequest {
    pub city_id: Uuid,
    #[validate(length(min = 1, message = "The name field is required"))]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CityListQuery {
    pub province_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct BarangayListQuery {
    pub city_id: Option<Uuid>,
}

pub async fn list_provinces(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let rows: Vec<Province> = provinces::table
        .order(provinces::name.asc())
        .load(&mut conn)
        .map_err(|e| internal_error("Failed to list provinces", e))?;

    Ok(ok_data(rows))
}

pub async fn create_province(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProvinceRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    req.validate().map_err(|e| validation_error(&e))?;

    let mut conn = db_conn(&state)?;

    let province = Province {
        id: Uuid::new_v4(),
        name: req.name,
        created_at: Utc::now(),
    };

    diesel::insert_into(provinces::table)
        .values(&province)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to create province", e))?;

    Ok(created(province))
}

/// Deleting a province removes its cities and their barangays in one
/// transaction, so a failure midway leaves the hierarchy intact.
pub async fn delete_province(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let deleted = conn
        .transaction::<_, diesel::result::Error, _>(|conn| {
            let city_ids: Vec<Uuid> = cities::table
                .filter(cities::province_id.eq(id))
                .select(cities::id)
                .load(conn)?;

            diesel::delete(barangays::table.filter(barangays::city_id.eq_any(&city_ids)))
                .execute(conn)?;
            diesel::delete(cities::table.filter(cities::province_id.eq(id))).execute(conn)?;
            diesel::delete(provinces::table.filter(provinces::id.eq(id))).execute(conn)
        })
        .map_err(|e| internal_error("Failed to delete province", e))?;

    if deleted == 0 {
        return Err(not_found("Province"));
    }

    Ok(ok_message("Province and dependent locations deleted"))
}

pub async fn list_cities(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CityListQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let mut q = cities::table.into_boxed();
    if let Some(province_id) = query.province_id {
        q = q.filter(cities::province_id.eq(province_id));
    }

    let rows: Vec<City> = q
        .order(cities::name.asc())
        .load(&mut conn)
        .map_err(|e| internal_error("Failed to list cities", e))?;

    Ok(ok_data(rows))
}

pub async fn create_city(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCityRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    req.validate().map_err(|e| validation_error(&e))?;

    let mut conn = db_conn(&state)?;

    let province_exists: i64 = provinces::table
        .filter(provinces::id.eq(req.province_id))
        .count()
        .get_result(&mut conn)
        .unwrap_or(0);
    if province_exists == 0 {
        return Err(not_found("Province"));
    }

    let city = City {
        id: Uuid::new_v4(),
        province_id: req.province_id,
        name: req.name,
        created_at: Utc::now(),
    };

    diesel::insert_into(cities::table)
        .values(&city)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to create city", e))?;

    Ok(created(city))
}

pub async fn delete_city(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let deleted = conn
        .transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::delete(barangays::table.filter(barangays::city_id.eq(id))).execute(conn)?;
            diesel::delete(cities::table.filter(cities::id.eq(id))).execute(conn)
        })
        .map_err(|e| internal_error("Failed to delete city", e))?;

    if deleted == 0 {
        return Err(not_found("City"));
    }

    Ok(ok_message("City and dependent barangays deleted"))
}

pub async fn list_barangays(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BarangayListQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let mut q = barangays::table.into_boxed();
    if let Some(city_id) = query.city_id {
        q = q.filter(barangays::city_id.eq(city_id));
    }

    let rows: Vec<Barangay> = q
        .order(barangays::name.asc())
        .load(&mut conn)
        .map_err(|e| internal_error("Failed to list barangays", e))?;

    Ok(ok_data(rows))
}

pub async fn create_barangay(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBarangayRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    req.validate().map_err(|e| validation_error(&e))?;

    let mut conn = db_conn(&state)?;

    let city_exists: i64 = cities::table
        .filter(cities::id.eq(req.city_id))
        .count()
        .get_result(&mut conn)
        .unwrap_or(0);
    if city_exists == 0 {
        return Err(not_found("City"));
    }

    let barangay = Barangay {
        id: Uuid::new_v4(),
        city_id: req.city_id,
        name: req.name,
        created_at: Utc::now(),
    };

    diesel::insert_into(barangays::table)
        .values(&barangay)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to create barangay", e))?;

    Ok(created(barangay))
}

pub async fn delete_barangay(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let deleted = diesel::delete(barangays::table.filter(barangays::id.eq(id)))
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to delete barangay", e))?;

    if deleted == 0 {
        return Err(not_found("Barangay"));
    }

    Ok(ok_message("Barangay deleted"))
}

pub fn configure_location_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/provinces", get(list_provinces).post(create_province))
        .route(
            "/api/provinces/:id",
            axum::routing::delete(delete_province),
        )
        .route("/api/cities", get(list_cities).post(create_city))
        .route("/api/cities/:id", axum::routing::delete(delete_city))
        .route("/api/barangays", get(list_barangays).post(create_barangay))
        .route("/api/barangays/:id", axum::routing::delete(delete_barangay))
}
