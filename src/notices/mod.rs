use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::shared::schema::notices;
use crate::shared::state::AppState;
use crate::shared::utils::{
    created, db_conn, internal_error, ok_data, validation_error, ApiError,
};

pub const CHANNEL_SMS: &str = "sms";
pub const CHANNEL_EMAIL: &str = "email";

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = notices)]
pub struct Notice {
    pub id: Uuid,
    pub account_no: Option<String>,
    pub channel: String,
    pub recipient: String,
    pub subject: Option<String>,
    pub body: String,
    pub status: String,
    pub error: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendSmsRequest {
    pub account_no: Option<String>,
    #[validate(length(min = 10, max = 13, message = "The recipient must be a valid mobile number"))]
    pub recipient: String,
    #[validate(length(min = 1, max = 459, message = "The message must fit in three SMS segments"))]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendEmailRequest {
    pub account_no: Option<String>,
    #[validate(email(message = "The recipient must be a valid email address"))]
    pub recipient: String,
    #[validate(length(min = 1, message = "The subject field is required"))]
    pub subject: String,
    #[validate(length(min = 1, message = "The body field is required"))]
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub channel: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Sends an SMS and records the outcome as a notice row. Provider failures
/// land on the row, not in the response; callers treat this as
/// best-effort.
pub async fn dispatch_sms(
    state: &AppState,
    account_no: Option<&str>,
    recipient: &str,
    message: &str,
) -> Notice {
    let result = state.sms.send(recipient, message).await;

    let (status, error, sent_at) = match result {
        Ok(_) => ("sent", None, Some(Utc::now())),
        Err(e) => {
            log::warn!("SMS to {recipient} failed: {e}");
            ("failed", Some(e.to_string()), None)
        }
    };

    let notice = Notice {
        id: Uuid::new_v4(),
        account_no: account_no.map(|a| a.to_string()),
        channel: CHANNEL_SMS.to_string(),
        recipient: recipient.to_string(),
        subject: None,
        body: message.to_string(),
        status: status.to_string(),
        error,
        sent_at,
        created_at: Utc::now(),
    };

    persist_notice(state, &notice);
    notice
}

/// Email counterpart of [`dispatch_sms`].
pub async fn dispatch_email(
    state: &AppState,
    account_no: Option<&str>,
    recipient: &str,
    subject: &str,
    body: &str,
) -> Notice {
    let result = state.mailer.send(recipient, subject, body);

    let (status, error, sent_at) = match result {
        Ok(()) => ("sent", None, Some(Utc::now())),
        Err(e) => {
            log::warn!("Email to {recipient} failed: {e}");
            ("failed", Some(e), None)
        }
    };

    let notice = Notice {
        id: Uuid::new_v4(),
        account_no: account_no.map(|a| a.to_string()),
        channel: CHANNEL_EMAIL.to_string(),
        recipient: recipient.to_string(),
        subject: Some(subject.to_string()),
        body: body.to_string(),
        status: status.to_string(),
        error,
        sent_at,
        created_at: Utc::now(),
    };

    persist_notice(state, &notice);
    notice
}

fn persist_notice(state: &AppState, notice: &Notice) {
    let Ok(mut conn) = state.conn.get() else {
        log::error!("Notice for {} not recorded: no database connection", notice.recipient);
        return;
    };
    if let Err(e) = diesel::insert_into(notices::table)
        .values(notice)
        .execute(&mut conn)
    {
        log::error!("Failed to record notice: {e}");
    }
}

pub async fn list_notices_for_account(
    State(state): State<Arc<AppState>>,
    Path(account_no): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let limit = query.limit.unwrap_or(50);
    let offset = query.offset.unwrap_or(0);

    let mut q = notices::table
        .filter(notices::account_no.eq(account_no))
        .into_boxed();

    if let Some(channel) = query.channel {
        q = q.filter(notices::channel.eq(channel));
    }

    if let Some(status) = query.status {
        q = q.filter(notices::status.eq(status));
    }

    let rows: Vec<Notice> = q
        .order(notices::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
        .map_err(|e| internal_error("Failed to list notices", e))?;

    Ok(ok_data(rows))
}

pub async fn send_sms_notice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendSmsRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    req.validate().map_err(|e| validation_error(&e))?;

    let notice = dispatch_sms(&state, req.account_no.as_deref(), &req.recipient, &req.message).await;
    Ok(created(notice))
}

pub async fn send_email_notice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendEmailRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    req.validate().map_err(|e| validation_error(&e))?;

    let notice = dispatch_email(
        &state,
        req.account_no.as_deref(),
        &req.recipient,
        &req.subject,
        &req.body,
    )
    .await;
    Ok(created(notice))
}

pub fn configure_notice_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/notices/sms", post(send_sms_notice))
        .route("/api/notices/email", post(send_email_notice))
        .route(
            "/api/notices/account/:account_no",
            get(list_notices_for_account),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sms_request_rejects_short_recipient() {
        let req = SendSmsRequest {
            account_no: None,
            recipient: "0917".to_string(),
            message: "Your account has been reconnected.".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn email_request_requires_subject_and_valid_address() {
        let req = SendEmailRequest {
            account_no: Some("ACC-000123".to_string()),
            recipient: "nope".to_string(),
            subject: String::new(),
            body: "b".to_string(),
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("recipient"));
        assert!(fields.contains_key("subject"));
    }
}
