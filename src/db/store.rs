// src/db/store.rs

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    models::{
        assignment::{Assignment, CandidateAssignment, TaskMetadata, WorkType},
        request::Request,
        work_order::{WorkOrder, WorkOrderDraft, WorkOrderFilter},
    },
};

/// O que o motor exige da persistência. Postgres em produção
/// (`WorkOrderRepository`), memória nos testes.
#[async_trait]
pub trait WorkOrderStore: Send + Sync {
    async fn find_request(&self, request_id: i64) -> Result<Option<Request>, AppError>;

    /// Gera o número, grava a OS e as atribuições numa única transação.
    async fn create_work_order(
        &self,
        draft: WorkOrderDraft,
        assignments: Vec<CandidateAssignment>,
    ) -> Result<(WorkOrder, Vec<Assignment>), AppError>;

    async fn find_work_order(&self, id: i64) -> Result<Option<WorkOrder>, AppError>;

    async fn list_work_orders(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, AppError>;

    /// Grava todos os campos mutáveis (o número e a data de criação não mudam).
    async fn save_work_order(&self, order: &WorkOrder) -> Result<WorkOrder, AppError>;

    async fn list_assignments(&self, work_order_id: i64) -> Result<Vec<Assignment>, AppError>;

    async fn list_assignments_for_orders(&self, work_order_ids: &[i64]) -> Result<Vec<Assignment>, AppError>;

    async fn list_assignments_by_executor(&self, executor_id: i64) -> Result<Vec<Assignment>, AppError>;

    async fn find_assignment(&self, id: i64) -> Result<Option<Assignment>, AppError>;

    /// Apaga as não pagas de `work_type` e insere as novas, atomicamente.
    async fn replace_unpaid_assignments(
        &self,
        work_order_id: i64,
        work_type: WorkType,
        assignments: Vec<CandidateAssignment>,
    ) -> Result<(), AppError>;

    /// Reprecifica todas (pagas ou não) de um tipo. Usado só pela armatura.
    async fn reprice_assignments(
        &self,
        work_order_id: i64,
        work_type: WorkType,
        amount: Decimal,
    ) -> Result<(), AppError>;

    /// Grava só o `metadata`; valor e pagamento da linha não são tocados.
    async fn update_assignment_metadata(&self, id: i64, metadata: &TaskMetadata) -> Result<Assignment, AppError>;

    /// Soma `amount` ao pago numa única escrita, se couber no saldo.
    /// `None`: a linha não existe ou o pagamento excede o saldo.
    async fn add_payment(&self, id: i64, amount: Decimal) -> Result<Option<Assignment>, AppError>;
}
