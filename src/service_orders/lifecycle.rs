use diesel::prelude::*;
use serde::Serialize;

use crate::accounts::{billing_status, BillingAccount};
use crate::network::release_ports_for_account;
use crate::notices::{dispatch_email, dispatch_sms};
use crate::shared::schema::{billing_accounts, customers, plans};
use crate::shared::state::AppState;

/// Network-side operation a service-order transition can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggeredOperation {
    Reconnection,
    Disconnection,
    Pullout,
    Migration,
}

impl TriggeredOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reconnection => "reconnection",
            Self::Disconnection => "disconnection",
            Self::Pullout => "pullout",
            Self::Migration => "migration",
        }
    }

    /// Matches the transition pairs the field teams actually set. Concern
    /// and repair category values come from free-text dropdowns, so they
    /// compare case-insensitively; the status values are fixed vocabulary.
    pub fn detect(
        concern: &str,
        support_status: &str,
        repair_category: Option<&str>,
        visit_status: Option<&str>,
    ) -> Option<Self> {
        if support_status == "Resolved" {
            if concern.eq_ignore_ascii_case("reconnect") {
                return Some(Self::Reconnection);
            }
            if concern.eq_ignore_ascii_case("disconnect") {
                return Some(Self::Disconnection);
            }
        }

        if visit_status == Some("Done") {
            match repair_category {
                Some(rc) if rc.eq_ignore_ascii_case("pullout") => return Some(Self::Pullout),
                Some(rc) if rc.eq_ignore_ascii_case("migration") => return Some(Self::Migration),
                _ => {}
            }
        }

        None
    }
}

/// What a triggered operation reduced to. The caller embeds the string in
/// the update response; nothing is rolled back on the failing variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationOutcome {
    Success,
    Failed,
    Exception,
    NoUsername,
    NoPlan,
}

impl OperationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Exception => "exception",
            Self::NoUsername => "no_username",
            Self::NoPlan => "no_plan",
        }
    }
}

pub async fn run_operation(
    state: &AppState,
    operation: TriggeredOperation,
    account_no: &str,
) -> OperationOutcome {
    let outcome = match operation {
        TriggeredOperation::Reconnection => attempt_reconnection(state, account_no).await,
        TriggeredOperation::Disconnection => attempt_disconnection(state, account_no).await,
        TriggeredOperation::Pullout => attempt_pullout(state, account_no).await,
        TriggeredOperation::Migration => attempt_migration(state, account_no).await,
    };
    log::info!(
        "{} for {account_no} finished: {}",
        operation.as_str(),
        outcome.as_str()
    );
    outcome
}

fn load_account(state: &AppState, account_no: &str) -> Result<BillingAccount, OperationOutcome> {
    let mut conn = state
        .conn
        .get()
        .map_err(|_| OperationOutcome::Exception)?;
    billing_accounts::table
        .filter(billing_accounts::account_no.eq(account_no))
        .first(&mut conn)
        .map_err(|_| OperationOutcome::Failed)
}

fn pppoe_username(account: &BillingAccount) -> Result<String, OperationOutcome> {
    account
        .pppoe_username
        .clone()
        .filter(|u| !u.is_empty())
        .ok_or(OperationOutcome::NoUsername)
}

fn plan_profile(state: &AppState, account: &BillingAccount) -> Result<String, OperationOutcome> {
    let plan_id = account.plan_id.ok_or(OperationOutcome::NoPlan)?;
    let mut conn = state
        .conn
        .get()
        .map_err(|_| OperationOutcome::Exception)?;
    plans::table
        .filter(plans::id.eq(plan_id))
        .select(plans::name)
        .first(&mut conn)
        .map_err(|_| OperationOutcome::NoPlan)
}

fn set_billing_status(state: &AppState, account_no: &str, status_id: i32) -> bool {
    let Ok(mut conn) = state.conn.get() else {
        return false;
    };
    diesel::update(billing_accounts::table.filter(billing_accounts::account_no.eq(account_no)))
        .set((
            billing_accounts::billing_status_id.eq(status_id),
            billing_accounts::updated_at.eq(chrono::Utc::now()),
        ))
        .execute(&mut conn)
        .is_ok()
}

/// Best-effort customer notification over both channels. Missing contact
/// details just skip that channel.
async fn notify_customer(state: &AppState, account_no: &str, subject: &str, message: &str) {
    let Ok(mut conn) = state.conn.get() else {
        return;
    };

    let contact: Option<(Option<String>, Option<String>)> = customers::table
        .filter(customers::account_no.eq(account_no))
        .select((customers::mobile_no, customers::email))
        .first(&mut conn)
        .optional()
        .unwrap_or(None);

    drop(conn);

    let Some((mobile_no, email)) = contact else {
        return;
    };

    if let Some(mobile) = mobile_no.filter(|m| !m.is_empty()) {
        dispatch_sms(state, Some(account_no), &mobile, message).await;
    }

    if let Some(email) = email.filter(|e| !e.is_empty()) {
        dispatch_email(state, Some(account_no), &email, subject, message).await;
    }
}

async fn attempt_reconnection(state: &AppState, account_no: &str) -> OperationOutcome {
    let account = match load_account(state, account_no) {
        Ok(account) => account,
        Err(outcome) => return outcome,
    };
    let username = match pppoe_username(&account) {
        Ok(username) => username,
        Err(outcome) => return outcome,
    };
    let profile = match plan_profile(state, &account) {
        Ok(profile) => profile,
        Err(outcome) => return outcome,
    };

    match state.radius.reconnect(&username, &profile).await {
        Ok(result) if result.success => {
            if !set_billing_status(state, account_no, billing_status::ACTIVE) {
                return OperationOutcome::Exception;
            }
            notify_customer(
                state,
                account_no,
                "Service reconnected",
                "Good news! Your internet service has been reconnected.",
            )
            .await;
            OperationOutcome::Success
        }
        Ok(result) => {
            log::warn!(
                "RADIUS refused reconnection for {username}: {}",
                result.message.unwrap_or_default()
            );
            OperationOutcome::Failed
        }
        Err(e) => {
            log::error!("Reconnection of {username} raised: {e}");
            OperationOutcome::Exception
        }
    }
}

async fn attempt_disconnection(state: &AppState, account_no: &str) -> OperationOutcome {
    let account = match load_account(state, account_no) {
        Ok(account) => account,
        Err(outcome) => return outcome,
    };
    let username = match pppoe_username(&account) {
        Ok(username) => username,
        Err(outcome) => return outcome,
    };

    match state.radius.disconnect(&username).await {
        Ok(result) if result.success => {
            if !set_billing_status(state, account_no, billing_status::DISCONNECTED) {
                return OperationOutcome::Exception;
            }
            notify_customer(
                state,
                account_no,
                "Service disconnected",
                "Your internet service has been disconnected. Please settle your balance to restore it.",
            )
            .await;
            OperationOutcome::Success
        }
        Ok(result) => {
            log::warn!(
                "RADIUS refused disconnection for {username}: {}",
                result.message.unwrap_or_default()
            );
            OperationOutcome::Failed
        }
        Err(e) => {
            log::error!("Disconnection of {username} raised: {e}");
            OperationOutcome::Exception
        }
    }
}

async fn attempt_pullout(state: &AppState, account_no: &str) -> OperationOutcome {
    let account = match load_account(state, account_no) {
        Ok(account) => account,
        Err(outcome) => return outcome,
    };
    let username = match pppoe_username(&account) {
        Ok(username) => username,
        Err(outcome) => return outcome,
    };

    match state.radius.remove(&username).await {
        Ok(result) if result.success => {
            if !set_billing_status(state, account_no, billing_status::PULLOUT) {
                return OperationOutcome::Exception;
            }
            // The physical port is recoverable the moment the drop wire is
            // pulled; a failure here is logged, not rolled back.
            if let Ok(mut conn) = state.conn.get() {
                if let Err(e) = release_ports_for_account(&mut conn, account_no) {
                    log::error!("Failed to release ports for {account_no}: {e}");
                }
            }
            notify_customer(
                state,
                account_no,
                "Service ended",
                "Your internet service has been terminated and the equipment pulled out. Thank you for staying with us.",
            )
            .await;
            OperationOutcome::Success
        }
        Ok(result) => {
            log::warn!(
                "RADIUS refused pullout for {username}: {}",
                result.message.unwrap_or_default()
            );
            OperationOutcome::Failed
        }
        Err(e) => {
            log::error!("Pullout of {username} raised: {e}");
            OperationOutcome::Exception
        }
    }
}

async fn attempt_migration(state: &AppState, account_no: &str) -> OperationOutcome {
    let account = match load_account(state, account_no) {
        Ok(account) => account,
        Err(outcome) => return outcome,
    };
    let username = match pppoe_username(&account) {
        Ok(username) => username,
        Err(outcome) => return outcome,
    };
    let profile = match plan_profile(state, &account) {
        Ok(profile) => profile,
        Err(outcome) => return outcome,
    };

    match state.radius.change_profile(&username, &profile).await {
        Ok(result) if result.success => {
            // Migration keeps the account live; the status write refreshes
            // the audit timestamp alongside it.
            if !set_billing_status(state, account_no, billing_status::ACTIVE) {
                return OperationOutcome::Exception;
            }
            notify_customer(
                state,
                account_no,
                "Service migrated",
                "Your internet service has been migrated. Please restart your router to pick up the new line.",
            )
            .await;
            OperationOutcome::Success
        }
        Ok(result) => {
            log::warn!(
                "RADIUS refused migration for {username}: {}",
                result.message.unwrap_or_default()
            );
            OperationOutcome::Failed
        }
        Err(e) => {
            log::error!("Migration of {username} raised: {e}");
            OperationOutcome::Exception
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnection_needs_both_concern_and_resolved_status() {
        assert_eq!(
            TriggeredOperation::detect("Reconnect", "Resolved", None, None),
            Some(TriggeredOperation::Reconnection)
        );
        assert_eq!(
            TriggeredOperation::detect("RECONNECT", "Resolved", None, None),
            Some(TriggeredOperation::Reconnection)
        );
        assert_eq!(TriggeredOperation::detect("Reconnect", "Open", None, None), None);
        assert_eq!(
            TriggeredOperation::detect("Slow connection", "Resolved", None, None),
            None
        );
    }

    #[test]
    fn disconnection_follows_the_same_pair_shape() {
        assert_eq!(
            TriggeredOperation::detect("disconnect", "Resolved", None, None),
            Some(TriggeredOperation::Disconnection)
        );
        assert_eq!(
            TriggeredOperation::detect("disconnect", "Pending", None, None),
            None
        );
    }

    #[test]
    fn pullout_and_migration_key_off_repair_visit_pair() {
        assert_eq!(
            TriggeredOperation::detect("Repair", "Open", Some("Pullout"), Some("Done")),
            Some(TriggeredOperation::Pullout)
        );
        assert_eq!(
            TriggeredOperation::detect("Repair", "Open", Some("migration"), Some("Done")),
            Some(TriggeredOperation::Migration)
        );
        assert_eq!(
            TriggeredOperation::detect("Repair", "Open", Some("Pullout"), Some("Scheduled")),
            None
        );
        assert_eq!(
            TriggeredOperation::detect("Repair", "Open", None, Some("Done")),
            None
        );
    }

    #[test]
    fn resolved_concern_wins_over_repair_pair() {
        // A resolved reconnect ticket that also carries repair fields only
        // fires the reconnection.
        assert_eq!(
            TriggeredOperation::detect("Reconnect", "Resolved", Some("Pullout"), Some("Done")),
            Some(TriggeredOperation::Reconnection)
        );
    }

    #[test]
    fn outcome_strings_match_the_api_contract() {
        assert_eq!(OperationOutcome::Success.as_str(), "success");
        assert_eq!(OperationOutcome::Failed.as_str(), "failed");
        assert_eq!(OperationOutcome::Exception.as_str(), "exception");
        assert_eq!(OperationOutcome::NoUsername.as_str(), "no_username");
        assert_eq!(OperationOutcome::NoPlan.as_str(), "no_plan");
    }
}
