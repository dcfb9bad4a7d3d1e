// src/db/memory.rs
//
// Store em memória para os testes do serviço. Mesma semântica do Postgres
// para o que o motor observa (numeração, filtros, pagas preservadas).

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::store::WorkOrderStore,
    models::{
        assignment::{Assignment, CandidateAssignment, TaskMetadata, WorkType},
        request::Request,
        work_order::{WorkOrder, WorkOrderDraft, WorkOrderFilter},
    },
};

#[derive(Default)]
struct State {
    requests: BTreeMap<i64, Request>,
    orders: BTreeMap<i64, WorkOrder>,
    assignments: BTreeMap<i64, Assignment>,
    next_order_id: i64,
    next_assignment_id: i64,
    order_number_seq: i64,
}

impl State {
    fn insert_assignment(&mut self, work_order_id: i64, candidate: CandidateAssignment) -> Assignment {
        self.next_assignment_id += 1;
        let assignment = Assignment {
            id: self.next_assignment_id,
            work_order_id,
            executor_id: candidate.executor_id,
            work_type: candidate.work_type,
            service_type: candidate.service_type,
            amount: candidate.amount,
            description: candidate.description,
            metadata: candidate.metadata,
            is_paid: false,
            paid_amount: Decimal::ZERO,
            created_at: Utc::now(),
        };
        self.assignments.insert(assignment.id, assignment.clone());
        assignment
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_request(&self, request: Request) {
        self.lock().requests.insert(request.id, request);
    }

    /// Atalho de teste: marca uma atribuição como paga direto no "banco".
    pub fn mark_paid(&self, assignment_id: i64) {
        if let Some(a) = self.lock().assignments.get_mut(&assignment_id) {
            a.is_paid = true;
            a.paid_amount = a.amount;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl WorkOrderStore for MemoryStore {
    async fn find_request(&self, request_id: i64) -> Result<Option<Request>, AppError> {
        Ok(self.lock().requests.get(&request_id).cloned())
    }

    async fn create_work_order(
        &self,
        draft: WorkOrderDraft,
        assignments: Vec<CandidateAssignment>,
    ) -> Result<(WorkOrder, Vec<Assignment>), AppError> {
        let mut state = self.lock();
        if let Some(request_id) = draft.request_id {
            if !state.requests.contains_key(&request_id) {
                return Err(AppError::NotFound("request".into()));
            }
        }

        state.next_order_id += 1;
        state.order_number_seq += 1;
        let id = state.next_order_id;
        let order_number = format!("WO-{:06}", state.order_number_seq);
        if state.orders.values().any(|o| o.order_number == order_number) {
            return Err(AppError::Conflict(order_number));
        }

        let order = WorkOrder::from_draft(id, order_number, draft, Utc::now());
        state.orders.insert(id, order.clone());

        let saved = assignments
            .into_iter()
            .map(|candidate| state.insert_assignment(id, candidate))
            .collect();

        Ok((order, saved))
    }

    async fn find_work_order(&self, id: i64) -> Result<Option<WorkOrder>, AppError> {
        Ok(self.lock().orders.get(&id).cloned())
    }

    async fn list_work_orders(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, AppError> {
        let state = self.lock();
        let owns = |order: &WorkOrder, executor_id: i64| {
            order.executor_id == Some(executor_id)
                || state
                    .assignments
                    .values()
                    .any(|a| a.work_order_id == order.id && a.executor_id == executor_id)
        };

        Ok(state
            .orders
            .values()
            .rev()
            .filter(|o| filter.status.is_none_or(|s| o.status == s))
            .filter(|o| filter.manager_id.is_none_or(|m| o.manager_id == m))
            .filter(|o| filter.master_id.is_none_or(|m| o.master_id == Some(m)))
            .filter(|o| filter.visible_to_executor.is_none_or(|e| owns(o, e)))
            .cloned()
            .collect())
    }

    async fn save_work_order(&self, order: &WorkOrder) -> Result<WorkOrder, AppError> {
        let mut state = self.lock();
        let stored = state
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| AppError::NotFound(format!("work order {}", order.id)))?;

        let mut updated = order.clone();
        updated.order_number = stored.order_number.clone();
        updated.created_at = stored.created_at;
        updated.updated_at = Utc::now();
        *stored = updated.clone();
        Ok(updated)
    }

    async fn list_assignments(&self, work_order_id: i64) -> Result<Vec<Assignment>, AppError> {
        Ok(self
            .lock()
            .assignments
            .values()
            .filter(|a| a.work_order_id == work_order_id)
            .cloned()
            .collect())
    }

    async fn list_assignments_for_orders(&self, work_order_ids: &[i64]) -> Result<Vec<Assignment>, AppError> {
        Ok(self
            .lock()
            .assignments
            .values()
            .filter(|a| work_order_ids.contains(&a.work_order_id))
            .cloned()
            .collect())
    }

    async fn list_assignments_by_executor(&self, executor_id: i64) -> Result<Vec<Assignment>, AppError> {
        Ok(self
            .lock()
            .assignments
            .values()
            .filter(|a| a.executor_id == executor_id)
            .cloned()
            .collect())
    }

    async fn find_assignment(&self, id: i64) -> Result<Option<Assignment>, AppError> {
        Ok(self.lock().assignments.get(&id).cloned())
    }

    async fn replace_unpaid_assignments(
        &self,
        work_order_id: i64,
        work_type: WorkType,
        assignments: Vec<CandidateAssignment>,
    ) -> Result<(), AppError> {
        let mut state = self.lock();
        state
            .assignments
            .retain(|_, a| !(a.work_order_id == work_order_id && a.work_type == work_type && !a.is_paid));
        for candidate in assignments {
            state.insert_assignment(work_order_id, candidate);
        }
        Ok(())
    }

    async fn reprice_assignments(
        &self,
        work_order_id: i64,
        work_type: WorkType,
        amount: Decimal,
    ) -> Result<(), AppError> {
        let mut state = self.lock();
        state
            .assignments
            .values_mut()
            .filter(|a| a.work_order_id == work_order_id && a.work_type == work_type)
            .for_each(|a| a.amount = amount);
        Ok(())
    }

    async fn update_assignment_metadata(&self, id: i64, metadata: &TaskMetadata) -> Result<Assignment, AppError> {
        let mut state = self.lock();
        let stored = state
            .assignments
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("assignment {}", id)))?;
        stored.metadata = metadata.clone();
        Ok(stored.clone())
    }

    async fn add_payment(&self, id: i64, amount: Decimal) -> Result<Option<Assignment>, AppError> {
        let mut state = self.lock();
        let Some(stored) = state.assignments.get_mut(&id) else {
            return Ok(None);
        };
        if stored.paid_amount + amount > stored.amount {
            return Ok(None);
        }
        stored.paid_amount += amount;
        stored.is_paid = stored.paid_amount >= stored.amount;
        Ok(Some(stored.clone()))
    }
}
