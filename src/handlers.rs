pub mod assignments;
pub mod rbac;
pub mod work_orders;
