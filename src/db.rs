pub mod store;
pub use store::WorkOrderStore;
pub mod work_order_repo;
pub use work_order_repo::WorkOrderRepository;

#[cfg(test)]
pub mod memory;
