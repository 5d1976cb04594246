use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use std::sync::Arc;

use crate::billing::payments::PendingPayment;
use crate::integrations::xendit::{self, map_webhook_status, XenditWebhookPayload};
use crate::shared::schema::pending_payments;
use crate::shared::state::AppState;
use crate::shared::utils::{
    api_error, db_conn, internal_error, not_found, ok_message, ApiError,
};

/// A PAID row never changes again, whatever the callback carries.
pub fn is_final(payment_status: &str) -> bool {
    payment_status == xendit::STATUS_PAID
}

/// Xendit invoice callback. Authenticated by the static
/// `x-callback-token` header; there is no signature or replay scheme
/// beyond it, so the token check is the whole gate.
pub async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<XenditWebhookPayload>,
) -> Result<Json<Value>, ApiError> {
    let token = headers
        .get("x-callback-token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !state.xendit.verify_callback_token(token) {
        log::warn!(
            "Rejected payment webhook for {} with bad callback token",
            payload.external_id
        );
        return Err(api_error(
            StatusCode::FORBIDDEN,
            "Invalid callback token",
        ));
    }

    let Some(new_status) = map_webhook_status(&payload.status) else {
        tracing::debug!(
            "Ignoring webhook status {} for {}",
            payload.status,
            payload.external_id
        );
        return Ok(ok_message("Event ignored"));
    };

    let mut conn = db_conn(&state)?;

    let payment: PendingPayment = pending_payments::table
        .filter(pending_payments::reference_no.eq(&payload.external_id))
        .first(&mut conn)
        .map_err(|_| not_found("Pending payment"))?;

    // A settled payment is final; late or duplicate callbacks must not
    // downgrade it.
    if is_final(&payment.payment_status) {
        return Ok(ok_message("Payment already processed"));
    }

    let paid_at = if new_status == xendit::STATUS_PAID {
        Some(
            payload
                .paid_at
                .as_deref()
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or_else(Utc::now),
        )
    } else {
        None
    };

    diesel::update(pending_payments::table.filter(pending_payments::id.eq(payment.id)))
        .set((
            pending_payments::payment_status.eq(new_status),
            pending_payments::payment_channel.eq(payload.payment_channel.clone()),
            pending_payments::paid_at.eq(paid_at),
            pending_payments::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to update pending payment", e))?;

    log::info!(
        "Payment {} marked {new_status} via webhook",
        payload.external_id
    );

    Ok(ok_message("Payment status updated"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paid_rows_are_final() {
        assert!(is_final(xendit::STATUS_PAID));
        assert!(!is_final(xendit::STATUS_PENDING));
        assert!(!is_final(xendit::STATUS_EXPIRED));
        assert!(!is_final(xendit::STATUS_FAILED));
    }
}
