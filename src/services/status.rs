// src/services/status.rs

use crate::models::work_order::WorkOrderStatus;

/// Status inicial da OS: executor > mestre > nova.
pub fn initial_status(has_executor_assignments: bool, master_id: Option<i64>) -> WorkOrderStatus {
    if has_executor_assignments {
        WorkOrderStatus::AssignedToExecutor
    } else if master_id.is_some() {
        WorkOrderStatus::AssignedToMaster
    } else {
        WorkOrderStatus::New
    }
}

/// Após uma edição só os estados anteriores à execução são reavaliados.
pub fn status_after_edit(
    current: WorkOrderStatus,
    has_executor_assignments: bool,
    master_id: Option<i64>,
) -> WorkOrderStatus {
    match current {
        WorkOrderStatus::New | WorkOrderStatus::AssignedToMaster => {
            initial_status(has_executor_assignments, master_id)
        }
        other => other,
    }
}
