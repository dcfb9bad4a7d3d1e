pub mod auth;
pub mod deriver;
pub mod pricing;
pub mod redaction;
pub mod status;
pub mod work_order_service;
pub mod workflow;
