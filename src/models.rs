pub mod assignment;
pub mod auth;
pub mod rbac;
pub mod request;
pub mod structured;
pub mod views;
pub mod work_order;
