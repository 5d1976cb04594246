//! Combines every module's REST routes into one router, mounted by main.

use axum::Router;
use std::sync::Arc;

use crate::shared::state::AppState;

pub fn configure_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(crate::customers::configure_customer_routes())
        .merge(crate::accounts::configure_account_routes())
        .merge(crate::service_orders::configure_service_order_routes())
        .merge(crate::job_orders::configure_job_order_routes())
        .merge(crate::billing::configure_billing_routes())
        .merge(crate::inventory::configure_inventory_routes())
        .merge(crate::network::configure_network_routes())
        .merge(crate::locations::configure_location_routes())
        .merge(crate::notices::configure_notice_routes())
}
