pub mod accounts;
pub mod api_router;
pub mod billing;
pub mod config;
pub mod customers;
pub mod integrations;
pub mod inventory;
pub mod job_orders;
pub mod locations;
pub mod network;
pub mod notices;
pub mod service_orders;
pub mod shared;
