use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use bigdecimal::{BigDecimal, FromPrimitive};
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::integrations::xendit::{self, CreateInvoiceParams};
use crate::shared::schema::{billing_accounts, customers, pending_payments};
use crate::shared::state::AppState;
use crate::shared::utils::{
    created, db_conn, generate_reference_no, internal_error, not_found, ok_data, validation_error,
    ApiError,
};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = pending_payments)]
pub struct PendingPayment {
    pub id: Uuid,
    pub reference_no: String,
    pub account_no: String,
    pub amount: BigDecimal,
    pub payment_status: String,
    pub xendit_invoice_id: Option<String>,
    pub invoice_url: Option<String>,
    pub payment_channel: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    #[validate(length(min = 1, message = "The account_no field is required"))]
    pub account_no: String,
    #[validate(range(min = 100.0, message = "The amount must be at least 100"))]
    pub amount: f64,
    #[validate(email(message = "The payer_email must be a valid email address"))]
    pub payer_email: Option<String>,
    pub description: Option<String>,
}

/// A pending payment left unpaid this long is treated as abandoned and
/// flipped to EXPIRED on the next read.
pub const PENDING_EXPIRY_HOURS: i64 = 24;

pub fn is_stale(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - created_at > Duration::hours(PENDING_EXPIRY_HOURS)
}

pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    req.validate().map_err(|e| validation_error(&e))?;

    let mut conn = db_conn(&state)?;

    let account_exists: i64 = billing_accounts::table
        .filter(billing_accounts::account_no.eq(&req.account_no))
        .count()
        .get_result(&mut conn)
        .unwrap_or(0);
    if account_exists == 0 {
        return Err(not_found("Billing account"));
    }

    // Fall back to the customer's email on record when the portal does not
    // supply one.
    let payer_email = match req.payer_email {
        Some(email) => Some(email),
        None => customers::table
            .filter(customers::account_no.eq(&req.account_no))
            .select(customers::email)
            .first::<Option<String>>(&mut conn)
            .unwrap_or(None),
    };

    let reference_no = generate_reference_no(&req.account_no);
    let description = req
        .description
        .unwrap_or_else(|| format!("Payment for account {}", req.account_no));

    let invoice = state
        .xendit
        .create_invoice(CreateInvoiceParams {
            external_id: reference_no.clone(),
            amount: req.amount,
            description,
            payer_email,
            success_redirect_url: state.config.xendit.success_redirect_url.clone(),
        })
        .await
        .map_err(|e| internal_error("Failed to create payment invoice", e))?;

    let now = Utc::now();
    let payment = PendingPayment {
        id: Uuid::new_v4(),
        reference_no,
        account_no: req.account_no,
        amount: BigDecimal::from_f64(req.amount).unwrap_or_else(|| BigDecimal::from(0)),
        payment_status: xendit::STATUS_PENDING.to_string(),
        xendit_invoice_id: Some(invoice.id),
        invoice_url: Some(invoice.invoice_url.clone()),
        payment_channel: None,
        paid_at: None,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(pending_payments::table)
        .values(&payment)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to store pending payment", e))?;

    Ok(created(json!({
        "reference_no": payment.reference_no,
        "invoice_url": invoice.invoice_url,
        "amount": req.amount,
        "payment_status": payment.payment_status,
    })))
}

/// Latest live pending payment for an account. Rows past the 24-hour
/// expiry are flipped to EXPIRED here rather than by a background job, so
/// a stale invoice is never reported as payable.
pub async fn check_pending_payment(
    State(state): State<Arc<AppState>>,
    Path(account_no): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let pending: Option<PendingPayment> = pending_payments::table
        .filter(pending_payments::account_no.eq(&account_no))
        .filter(pending_payments::payment_status.eq(xendit::STATUS_PENDING))
        .order(pending_payments::created_at.desc())
        .first(&mut conn)
        .optional()
        .map_err(|e| internal_error("Failed to check pending payment", e))?;

    let Some(payment) = pending else {
        return Err(not_found("Pending payment"));
    };

    if is_stale(payment.created_at, Utc::now()) {
        diesel::update(pending_payments::table.filter(pending_payments::id.eq(payment.id)))
            .set((
                pending_payments::payment_status.eq(xendit::STATUS_EXPIRED),
                pending_payments::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .map_err(|e| internal_error("Failed to expire pending payment", e))?;
        return Err(not_found("Pending payment"));
    }

    Ok(ok_data(payment))
}

pub async fn check_payment_status(
    State(state): State<Arc<AppState>>,
    Path(reference_no): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let payment: PendingPayment = pending_payments::table
        .filter(pending_payments::reference_no.eq(&reference_no))
        .first(&mut conn)
        .map_err(|_| not_found("Payment"))?;

    Ok(ok_data(json!({
        "reference_no": payment.reference_no,
        "payment_status": payment.payment_status,
        "payment_channel": payment.payment_channel,
        "paid_at": payment.paid_at,
    })))
}

pub fn configure_payment_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/payments", post(create_payment))
        .route("/api/payments/webhook", post(super::webhook::handle_webhook))
        .route(
            "/api/payments/pending/:account_no",
            get(check_pending_payment),
        )
        .route(
            "/api/payments/status/:reference_no",
            get(check_payment_status),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_under_minimum_is_rejected() {
        let req = CreatePaymentRequest {
            account_no: "ACC-000123".to_string(),
            amount: 50.0,
            payer_email: None,
            description: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn staleness_boundary_is_exactly_24_hours() {
        let now = Utc::now();
        assert!(!is_stale(now - Duration::hours(23), now));
        assert!(!is_stale(now - Duration::hours(24), now));
        assert!(is_stale(now - Duration::hours(24) - Duration::seconds(1), now));
    }
}
