pub mod payments;
pub mod webhook;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};

use bigdecimal::{BigDecimal, FromPrimitive};
use chrono::{DateTime, Months, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::shared::schema::{billing_accounts, installment_schedules, invoices};
use crate::shared::state::AppState;
use crate::shared::utils::{
    api_error, created, db_conn, internal_error, not_found, ok_data, validation_error, ApiError,
    DbConn,
};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = invoices)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_no: String,
    pub account_no: String,
    pub amount: BigDecimal,
    pub amount_paid: BigDecimal,
    pub due_date: NaiveDate,
    pub status: String,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = installment_schedules)]
pub struct InstallmentSchedule {
    pub id: Uuid,
    pub account_no: String,
    pub seq_no: i32,
    pub amount: BigDecimal,
    pub due_date: NaiveDate,
    pub status: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    #[validate(length(min = 1, message = "The account_no field is required"))]
    pub account_no: String,
    #[validate(range(min = 0.01, message = "The amount must be greater than zero"))]
    pub amount: f64,
    pub due_date: NaiveDate,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    #[validate(range(min = 0.01, message = "The amount must be greater than zero"))]
    pub amount: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateInstallmentsRequest {
    #[validate(length(min = 1, message = "The account_no field is required"))]
    pub account_no: String,
    #[validate(range(min = 1.0, message = "The total_amount must be at least 1"))]
    pub total_amount: f64,
    #[validate(range(min = 2, max = 24, message = "The months must be between 2 and 24"))]
    pub months: i32,
    pub start_date: NaiveDate,
    pub description: Option<String>,
}

fn generate_invoice_no(conn: &mut DbConn) -> String {
    let count: i64 = invoices::table.count().get_result(conn).unwrap_or(0);
    format!("INV-{:06}", count + 1)
}

/// Splits a total into equal monthly rows, two-decimal money. Rounding
/// drift is absorbed by the final row so the rows always sum to the total.
pub fn build_schedule(
    account_no: &str,
    total: &BigDecimal,
    months: i32,
    start_date: NaiveDate,
    description: Option<&str>,
) -> Vec<InstallmentSchedule> {
    let now = Utc::now();
    let monthly = (total / BigDecimal::from(months)).with_scale(2);
    let mut rows = Vec::with_capacity(months as usize);

    for seq in 1..=months {
        let amount = if seq == months {
            total - &monthly * BigDecimal::from(months - 1)
        } else {
            monthly.clone()
        };
        let due_date = start_date
            .checked_add_months(Months::new((seq - 1) as u32))
            .unwrap_or(start_date);
        rows.push(InstallmentSchedule {
            id: Uuid::new_v4(),
            account_no: account_no.to_string(),
            seq_no: seq,
            amount,
            due_date,
            status: "unpaid".to_string(),
            description: description.map(|d| d.to_string()),
            created_at: now,
        });
    }

    rows
}

pub async fn list_invoices_for_account(
    State(state): State<Arc<AppState>>,
    Path(account_no): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let rows: Vec<Invoice> = invoices::table
        .filter(invoices::account_no.eq(account_no))
        .order(invoices::due_date.desc())
        .load(&mut conn)
        .map_err(|e| internal_error("Failed to list invoices", e))?;

    Ok(ok_data(rows))
}

pub async fn get_invoice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let invoice: Invoice = invoices::table
        .filter(invoices::id.eq(id))
        .first(&mut conn)
        .map_err(|_| not_found("Invoice"))?;

    Ok(ok_data(invoice))
}

pub async fn create_invoice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateInvoiceRequest>,
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

    let now = Utc::now();
    let invoice = Invoice {
        id: Uuid::new_v4(),
        invoice_no: generate_invoice_no(&mut conn),
        account_no: req.account_no,
        amount: BigDecimal::from_f64(req.amount).unwrap_or_else(|| BigDecimal::from(0)),
        amount_paid: BigDecimal::from(0),
        due_date: req.due_date,
        status: "unpaid".to_string(),
        period_start: req.period_start,
        period_end: req.period_end,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(invoices::table)
        .values(&invoice)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to create invoice", e))?;

    Ok(created(invoice))
}

pub async fn record_invoice_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<RecordPaymentRequest>,
) -> Result<Json<Value>, ApiError> {
    req.validate().map_err(|e| validation_error(&e))?;

    let mut conn = db_conn(&state)?;

    let invoice: Invoice = invoices::table
        .filter(invoices::id.eq(id))
        .first(&mut conn)
        .map_err(|_| not_found("Invoice"))?;

    if invoice.status == "paid" {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invoice is already settled",
        ));
    }

    let payment = BigDecimal::from_f64(req.amount).unwrap_or_else(|| BigDecimal::from(0));
    let amount_paid = &invoice.amount_paid + &payment;
    let status = if amount_paid >= invoice.amount {
        "paid"
    } else {
        "partial"
    };

    let updated = Invoice {
        amount_paid,
        status: status.to_string(),
        updated_at: Utc::now(),
        ..invoice
    };

    diesel::update(invoices::table.filter(invoices::id.eq(id)))
        .set(&updated)
        .execute(&mut conn)
        .map_err(|e| internal_error("Failed to record invoice payment", e))?;

    // Account balance is kept in step outside any transaction, matching the
    // platform's single-statement write style.
    diesel::update(
        billing_accounts::table.filter(billing_accounts::account_no.eq(&updated.account_no)),
    )
    .set((
        billing_accounts::balance.eq(billing_accounts::balance - payment),
        billing_accounts::updated_at.eq(Utc::now()),
    ))
    .execute(&mut conn)
    .map_err(|e| internal_error("Failed to adjust account balance", e))?;

    Ok(ok_data(updated))
}

pub async fn generate_installments(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateInstallmentsRequest>,
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

    let total = BigDecimal::from_f64(req.total_amount).unwrap_or_else(|| BigDecimal::from(0));
    let rows = build_schedule(
        &req.account_no,
        &total,
        req.months,
        req.start_date,
        req.description.as_deref(),
    );

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::delete(
            installment_schedules::table
                .filter(installment_schedules::account_no.eq(&req.account_no))
                .filter(installment_schedules::status.eq("unpaid")),
        )
        .execute(conn)?;
        diesel::insert_into(installment_schedules::table)
            .values(&rows)
            .execute(conn)
    })
    .map_err(|e| internal_error("Failed to generate installment schedule", e))?;

    Ok(created(rows))
}

pub async fn list_installments_for_account(
    State(state): State<Arc<AppState>>,
    Path(account_no): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut conn = db_conn(&state)?;

    let rows: Vec<InstallmentSchedule> = installment_schedules::table
        .filter(installment_schedules::account_no.eq(account_no))
        .order(installment_schedules::seq_no.asc())
        .load(&mut conn)
        .map_err(|e| internal_error("Failed to list installments", e))?;

    Ok(ok_data(rows))
}

pub fn configure_billing_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/invoices", post(create_invoice))
        .route(
            "/api/invoices/account/:account_no",
            get(list_invoices_for_account),
        )
        .route("/api/invoices/:id", get(get_invoice))
        .route("/api/invoices/:id/payment", put(record_invoice_payment))
        .route("/api/installments/generate", post(generate_installments))
        .route(
            "/api/installments/account/:account_no",
            get(list_installments_for_account),
        )
        .merge(payments::configure_payment_routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn schedule_has_one_row_per_month() {
        let total = BigDecimal::from_str("12000").unwrap();
        let start = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let rows = build_schedule("ACC-000001", &total, 12, start, None);
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].seq_no, 1);
        assert_eq!(rows[11].seq_no, 12);
    }

    #[test]
    fn schedule_rows_sum_to_total() {
        let total = BigDecimal::from_str("1000").unwrap();
        let start = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let rows = build_schedule("ACC-000001", &total, 3, start, None);
        let sum: BigDecimal = rows.iter().map(|r| r.amount.clone()).sum();
        assert_eq!(sum, total);
    }

    #[test]
    fn schedule_due_dates_advance_monthly() {
        let total = BigDecimal::from_str("3000").unwrap();
        let start = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let rows = build_schedule("ACC-000001", &total, 3, start, None);
        assert_eq!(rows[0].due_date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert_eq!(rows[1].due_date, NaiveDate::from_ymd_opt(2025, 2, 15).unwrap());
        assert_eq!(rows[2].due_date, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
    }

    #[test]
    fn month_end_start_dates_clamp_instead_of_skipping() {
        let total = BigDecimal::from_str("200").unwrap();
        let start = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let rows = build_schedule("ACC-000001", &total, 2, start, None);
        // January 31 + 1 month clamps to February 28.
        assert_eq!(rows[1].due_date, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }
}
