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

use crate::shared::schema::{lcps, nap_ports, naps, vlans};
use crate::shared::state::AppState;
use crate::shared::utils::{
    api_error, created, db_conn, internal_error, not_found, ok_data, ok_message, validation_error,
    ApiError,
};

pub const PORT_FREE: &str = "free";
pub const PORT_OCCUPIED: &str = "occupied";
pub const PORT_RESERVED: &str = "reserved";

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = lcps)]
pub struct Lcp {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub barangay: Option<String>,
    pub port_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = naps)]
pub struct Nap {
    pub id: Uuid,
    pub lcp_id: Uuid,
    pub code: String,
    pub port_count: i32,
    pub location: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = nap_ports)]
pub struct NapPort {
    pub id: Uuid,
    pub nap_id: Uuid,
    pub port_no: i32,
    pub status: String,
    pub account_no: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = vlans)]
pub struct Vlan {
    pub id: Uuid,
    pub vlan_no: i32,
    pub description: Option<String>,
    pub site: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLcpRequest {
    #[validate(length(min = 1, message = "The code field is required"))]
    pub code: String,
    #[validate(length(min = 1, message = "The name field is required"))]
    pub name: String,
    pub barangay: Option<String>,
    #[validate(range(min = 1, max = 256, message = "The port_count must be between 1 and 256"))]
    pub port_count: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLcpRequest {
    pub name: Option<String>,
    pub barangay: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNapRequest {
    pub lcp_id: Uuid,
    #[validate(length(min = 1, message = "The code field is required"))]
    pub code: String,
    #[validate(range(min = 1, max = 64, message = "The port_count must be between 1 and 64"))]
    pub port_count: i32,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNapRequest {
    pub location: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AssignPortRequest {
    pub account_no: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVlanRequest {
    #[validate(range(min = 1, max = 4094, message = "The vlan_no must be between 1 and 4094"))]
    pub vlan_no: i32,
    pub description: Option<String>,
    pub site: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NapListQuery {
    pub lcp_id: Option<Uuid>,
}

/// Marks a NAP port occupied by an account. Shared with job-order
/// completion, which runs it inside the caller's transaction.
pub fn occupy_port(
    conn: &mut PgConnection,
    nap_id: Uuid,
    port_no: i32,
    account_no: &str,
) -> QueryResult<usize> {
    diesel::update(
        nap_ports::table
            .filter(nap_ports::nap_id.eq(nap_id))
            .filter(nap_ports::port_no.eq(port_no))
            .filter(nap_ports::status.ne(PORT_OCCUPIED)),
    )
    .set((
        nap_ports::status.eq(PORT_OCCUPIED),
        nap_ports::account_no.eq(Some(account_no.to_string())),
        nap_ports::updated_at.eq(Utc::now()),
    ))
    .execute(conn)
}

/// Frees every port held by an account; used on pullout.
pub fn release_ports_for_account(conn: &mut PgConnection, account_no: &str) -> QueryResult<usize> {
    diesel::update(nap_ports::table.filter(nap_ports::account_no.eq(account_no)))
        .set((
            nap_ports::status.eq(PORT_FREE),
            nap_ports::account_no.eq(None::<String>),
            nap_ports::updated_at.eq(Utc::now()),
        ))
        .execute(conn)
}

pub async fn list_lcps(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let rows: Vec<Lcp> = lcps::table
        .order(lcps::code.asc())
        .load(&mut conn)
        .map_err(|e| internal_error("Failed to list LCPs", e))?;

    Ok(ok_data(rows))
}

pub async fn create_lcp(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateLcpRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    req.validate().map_err(|e| validation_error(&e))?;

    let mut conn = db_conn(&state)?;
    let now = Utc::now();

    let lcp = Lcp {
        id: Uuid::new_v4(),
        code: req.code,
        name: req.name,
        barangay: req.barangay,
        port_count: req.port_count,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(lcps::table)
        .values(&lcp)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to create LCP", e))?;

    Ok(created(lcp))
}

pub async fn update_lcp(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateLcpRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let existing: Lcp = lcps::table
        .filter(lcps::id.eq(id))
        .first(&mut conn)
        .map_err(|_| not_found("LCP"))?;

    let updated = Lcp {
        name: req.name.unwrap_or(existing.name),
        barangay: req.barangay.or(existing.barangay),
        is_active: req.is_active.unwrap_or(existing.is_active),
        updated_at: Utc::now(),
        ..existing
    };

    diesel::update(lcps::table.filter(lcps::id.eq(id)))
        .set(&updated)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to update LCP", e))?;

    Ok(ok_data(updated))
}

pub async fn delete_lcp(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let dependent_naps: i64 = naps::table
        .filter(naps::lcp_id.eq(id))
        .count()
        .get_result(&mut conn)
        .unwrap_or(0);

    if dependent_naps > 0 {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "LCP still has NAPs attached",
        ));
    }

    let deleted = diesel::delete(lcps::table.filter(lcps::id.eq(id)))
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to delete LCP", e))?;

    if deleted == 0 {
        return Err(not_found("LCP"));
    }

    Ok(ok_message("LCP deleted"))
}

pub async fn list_naps(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NapListQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let mut q = naps::table.into_boxed();
    if let Some(lcp_id) = query.lcp_id {
        q = q.filter(naps::lcp_id.eq(lcp_id));
    }

    let rows: Vec<Nap> = q
        .order(naps::code.asc())
        .load(&mut conn)
        .map_err(|e| internal_error("Failed to list NAPs", e))?;

    Ok(ok_data(rows))
}

/// Creating a NAP also seeds one `nap_ports` row per physical port, all
/// free, in the same transaction.
pub async fn create_nap(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateNapRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    req.validate().map_err(|e| validation_error(&e))?;

    let mut conn = db_conn(&state)?;

    let lcp_exists: i64 = lcps::table
        .filter(lcps::id.eq(req.lcp_id))
        .count()
        .get_result(&mut conn)
        .unwrap_or(0);
    if lcp_exists == 0 {
        return Err(not_found("LCP"));
    }

    let now = Utc::now();
    let nap = Nap {
        id: Uuid::new_v4(),
        lcp_id: req.lcp_id,
        code: req.code,
        port_count: req.port_count,
        location: req.location,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    let ports: Vec<NapPort> = (1..=req.port_count)
        .map(|port_no| NapPort {
            id: Uuid::new_v4(),
            nap_id: nap.id,
            port_no,
            status: PORT_FREE.to_string(),
            account_no: None,
            updated_at: now,
        })
        .collect();

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::insert_into(naps::table).values(&nap).execute(conn)?;
        diesel::insert_into(nap_ports::table)
            .values(&ports)
            .execute(conn)?;
        Ok(())
    })
    .map_err(|e| internal_error("Failed to create NAP", e))?;

    Ok(created(nap))
}

pub async fn update_nap(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateNapRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let existing: Nap = naps::table
        .filter(naps::id.eq(id))
        .first(&mut conn)
        .map_err(|_| not_found("NAP"))?;

    let updated = Nap {
        location: req.location.or(existing.location),
        is_active: req.is_active.unwrap_or(existing.is_active),
        updated_at: Utc::now(),
        ..existing
    };

    diesel::update(naps::table.filter(naps::id.eq(id)))
        .set(&updated)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to update NAP", e))?;

    Ok(ok_data(updated))
}

pub async fn delete_nap(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let occupied: i64 = nap_ports::table
        .filter(nap_ports::nap_id.eq(id))
        .filter(nap_ports::status.eq(PORT_OCCUPIED))
        .count()
        .get_result(&mut conn)
        .unwrap_or(0);

    if occupied > 0 {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "NAP still has occupied ports",
        ));
    }

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::delete(nap_ports::table.filter(nap_ports::nap_id.eq(id))).execute(conn)?;
        diesel::delete(naps::table.filter(naps::id.eq(id))).execute(conn)
    })
    .map_err(|e| internal_error("Failed to delete NAP", e))?;

    Ok(ok_message("NAP deleted"))
}

pub async fn list_nap_ports(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let rows: Vec<NapPort> = nap_ports::table
        .filter(nap_ports::nap_id.eq(id))
        .order(nap_ports::port_no.asc())
        .load(&mut conn)
        .map_err(|e| internal_error("Failed to list NAP ports", e))?;

    Ok(ok_data(rows))
}

pub async fn assign_port(
    State(state): State<Arc<AppState>>,
    Path((id, port_no)): Path<(Uuid, i32)>,
    Json(req): Json<AssignPortRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let updated = occupy_port(&mut conn, id, port_no, &req.account_no)
        .map_err(|e| internal_error("Failed to assign port", e))?;

    if updated == 0 {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Port is already occupied or does not exist",
        ));
    }

    Ok(ok_message(format!(
        "Port {port_no} assigned to {}",
        req.account_no
    )))
}

pub async fn release_port(
    State(state): State<Arc<AppState>>,
    Path((id, port_no)): Path<(Uuid, i32)>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let updated = diesel::update(
        nap_ports::table
            .filter(nap_ports::nap_id.eq(id))
            .filter(nap_ports::port_no.eq(port_no)),
    )
    .set((
        nap_ports::status.eq(PORT_FREE),
        nap_ports::account_no.eq(None::<String>),
        nap_ports::updated_at.eq(Utc::now()),
    ))
    .execute(&mut conn)
    .map_err(|e| internal_error("Failed to release port", e))?;

    if updated == 0 {
        return Err(not_found("Port"));
    }

    Ok(ok_message(format!("Port {port_no} released")))
}

pub async fn list_vlans(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let rows: Vec<Vlan> = vlans::table
        .filter(vlans::is_active.eq(true))
        .order(vlans::vlan_no.asc())
        .load(&mut conn)
        .map_err(|e| internal_error("Failed to list VLANs", e))?;

    Ok(ok_data(rows))
}

pub async fn create_vlan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateVlanRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    req.validate().map_err(|e| validation_error(&e))?;

    let mut conn = db_conn(&state)?;

    let vlan = Vlan {
        id: Uuid::new_v4(),
        vlan_no: req.vlan_no,
        description: req.description,
        site: req.site,
        is_active: true,
        created_at: Utc::now(),
    };

    diesel::insert_into(vlans::table)
        .values(&vlan)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to create VLAN", e))?;

    Ok(created(vlan))
}

pub async fn delete_vlan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let deleted = diesel::delete(vlans::table.filter(vlans::id.eq(id)))
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to delete VLAN", e))?;

    if deleted == 0 {
        return Err(not_found("VLAN"));
    }

    Ok(ok_message("VLAN deleted"))
}

pub fn configure_network_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/lcps", get(list_lcps).post(create_lcp))
        .route(
            "/api/lcps/:id",
            axum::routing::put(update_lcp).delete(delete_lcp),
        )
        .route("/api/naps", get(list_naps).post(create_nap))
        .route(
            "/api/naps/:id",
            axum::routing::put(update_nap).delete(delete_nap),
        )
        .route("/api/naps/:id/ports", get(list_nap_ports))
        .route("/api/naps/:id/ports/:port_no/assign", put(assign_port))
        .route("/api/naps/:id/ports/:port_no/release", put(release_port))
        .route("/api/vlans", get(list_vlans).post(create_vlan))
        .route("/api/vlans/:id", axum::routing::delete(delete_vlan))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nap_request_rejects_zero_ports() {
        let req = CreateNapRequest {
            lcp_id: Uuid::new_v4(),
            code: "NAP-01".to_string(),
            port_count: 0,
            location: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn vlan_request_rejects_out_of_range_tag() {
        let req = CreateVlanRequest {
            vlan_no: 5000,
            description: None,
            site: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn seeded_ports_cover_every_port_number() {
        let now = Utc::now();
        let nap_id = Uuid::new_v4();
        let ports: Vec<NapPort> = (1..=8)
            .map(|port_no| NapPort {
                id: Uuid::new_v4(),
                nap_id,
                port_no,
                status: PORT_FREE.to_string(),
                account_no: None,
                updated_at: now,
            })
            .collect();
        assert_eq!(ports.len(), 8);
        assert_eq!(ports.first().map(|p| p.port_no), Some(1));
        assert_eq!(ports.last().map(|p| p.port_no), Some(8));
        assert!(ports.iter().all(|p| p.status == PORT_FREE));
    }
}
