use axum::http::StatusCode;
use axum::Json;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::PgConnection;
use rand::{distributions::Alphanumeric, Rng};
use serde_json::{json, Value};

use crate::shared::state::AppState;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<PgConnection>>;

/// Error half of every handler: status code plus the JSON envelope body.
pub type ApiError = (StatusCode, Json<Value>);

pub fn create_conn(database_url: &str) -> Result<DbPool, diesel::r2d2::PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder().build(manager)
}

pub fn db_conn(state: &AppState) -> Result<DbConn, ApiError> {
    state.conn.get().map_err(|e| {
        log::error!("Failed to get database connection: {e}");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}"))
    })
}

pub fn ok_data<T: serde::Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

pub fn ok_message(message: impl Into<String>) -> Json<Value> {
    Json(json!({ "success": true, "message": message.into() }))
}

pub fn created<T: serde::Serialize>(data: T) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": data })),
    )
}

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(json!({ "success": false, "message": message.into() })),
    )
}

pub fn not_found(what: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, format!("{what} not found"))
}

pub fn internal_error(context: &str, err: impl std::fmt::Display) -> ApiError {
    log::error!("{context}: {err}");
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("{context}: {err}"),
    )
}

/// Map `validator` failures to the 422 envelope the frontend expects:
/// `{"success": false, "message": "Validation failed", "errors": {field: [msgs]}}`.
pub fn validation_error(errors: &validator::ValidationErrors) -> ApiError {
    let mut fields = serde_json::Map::new();
    for (field, errs) in errors.field_errors() {
        let messages: Vec<Value> = errs
            .iter()
            .map(|e| {
                Value::String(
                    e.message
                        .clone()
                        .map(|m| m.into_owned())
                        .unwrap_or_else(|| format!("The {field} field is invalid")),
                )
            })
            .collect();
        fields.insert(field.to_string(), Value::Array(messages));
    }
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "success": false,
            "message": "Validation failed",
            "errors": Value::Object(fields),
        })),
    )
}

/// Payment reference: account number plus a random 6-char uppercase suffix.
/// The suffix keeps references unique across repeated portal attempts for
/// the same account.
pub fn generate_reference_no(account_no: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("{account_no}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_no_keeps_account_prefix() {
        let reference = generate_reference_no("ACC-000123");
        assert!(reference.starts_with("ACC-000123-"));
    }

    #[test]
    fn reference_no_suffix_is_six_uppercase_alphanumerics() {
        let reference = generate_reference_no("ACC-000123");
        let suffix = reference.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn validation_error_collects_field_messages() {
        use validator::Validate;

        #[derive(Validate)]
        struct Probe {
            #[validate(length(min = 1, message = "The name field is required"))]
            name: String,
        }

        let errors = Probe {
            name: String::new(),
        }
        .validate()
        .unwrap_err();
        let (status, Json(body)) = validation_error(&errors);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"]["name"][0], "The name field is required");
    }
}
