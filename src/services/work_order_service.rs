// src/services/work_order_service.rs

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use rust_decimal::Decimal;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::WorkOrderStore,
    models::{
        assignment::{Assignment, CandidateAssignment, TaskStatus, WorkType},
        auth::{Caller, Role},
        rbac::Permission,
        structured::{ArmaturaStage, WorkInput},
        views::{AssignmentView, BoardColumn, ExecutorPayroll, WorkOrderView},
        work_order::{
            CreateWorkOrderPayload, FinalStage, UpdateWorkOrderPayload, WorkOrder, WorkOrderDraft,
            WorkOrderFilter, WorkOrderListQuery, WorkOrderStatus,
        },
    },
    services::{
        deriver, pricing,
        redaction::{redact, redact_assignment},
        status,
        workflow::{self, WorkflowAction},
    },
};

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn reject_negative_amounts(work: &WorkInput) -> Result<(), AppError> {
    match work.negative_amount() {
        Some(field) => Err(AppError::InvalidInput(format!("{} não pode ser negativo", field))),
        None => Ok(()),
    }
}

#[derive(Clone)]
pub struct WorkOrderService {
    store: Arc<dyn WorkOrderStore>,
}

impl WorkOrderService {
    pub fn new(store: Arc<dyn WorkOrderStore>) -> Self {
        Self { store }
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    fn view(caller: &Caller, order: &WorkOrder, assignments: &[Assignment]) -> WorkOrderView {
        redact(order, assignments, caller.role, caller.id, caller.can_view_finance())
    }

    fn can_view(caller: &Caller, order: &WorkOrder, assignments: &[Assignment]) -> bool {
        if caller.can(Permission::WorkOrdersViewAll) {
            return true;
        }
        caller.can(Permission::WorkOrdersViewOwn)
            && (order.executor_id == Some(caller.id) || assignments.iter().any(|a| a.executor_id == caller.id))
    }

    /// Carrega a OS; sem visibilidade é indistinguível de inexistente.
    async fn load_visible(&self, caller: &Caller, id: i64) -> Result<(WorkOrder, Vec<Assignment>), AppError> {
        let not_found = || AppError::NotFound(format!("work order {}", id));

        let order = self.store.find_work_order(id).await?.ok_or_else(not_found)?;
        let assignments = self.store.list_assignments(id).await?;

        if !Self::can_view(caller, &order, &assignments) {
            return Err(not_found());
        }
        Ok((order, assignments))
    }

    pub async fn get(&self, caller: &Caller, id: i64) -> Result<WorkOrderView, AppError> {
        let (order, assignments) = self.load_visible(caller, id).await?;
        Ok(Self::view(caller, &order, &assignments))
    }

    pub async fn list(&self, caller: &Caller, query: WorkOrderListQuery) -> Result<Vec<WorkOrderView>, AppError> {
        let mut filter = WorkOrderFilter::from(query);
        if !caller.can(Permission::WorkOrdersViewAll) {
            if !caller.can(Permission::WorkOrdersViewOwn) {
                return Err(AppError::Forbidden("sem permissão para ver ordens de serviço".into()));
            }
            filter.visible_to_executor = Some(caller.id);
        }

        let orders = self.store.list_work_orders(&filter).await?;
        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();

        let mut by_order: HashMap<i64, Vec<Assignment>> = HashMap::new();
        for assignment in self.store.list_assignments_for_orders(&ids).await? {
            by_order.entry(assignment.work_order_id).or_default().push(assignment);
        }

        Ok(orders
            .iter()
            .map(|order| {
                let assignments = by_order.remove(&order.id).unwrap_or_default();
                Self::view(caller, order, &assignments)
            })
            .collect())
    }

    /// Quadro de carga: uma coluna por status, na ordem do fluxo.
    pub async fn board(&self, caller: &Caller) -> Result<Vec<BoardColumn>, AppError> {
        let views = self.list(caller, WorkOrderListQuery::default()).await?;

        let mut columns: Vec<BoardColumn> = WorkOrderStatus::ALL
            .iter()
            .map(|status| BoardColumn {
                status: *status,
                orders: Vec::new(),
            })
            .collect();
        for view in views {
            if let Some(column) = columns.iter_mut().find(|c| c.status == view.status) {
                column.orders.push(view);
            }
        }
        Ok(columns)
    }

    // =========================================================================
    //  CRIAÇÃO
    // =========================================================================

    pub async fn create(&self, caller: &Caller, payload: CreateWorkOrderPayload) -> Result<WorkOrderView, AppError> {
        if !caller.can(Permission::WorkOrdersEditAll) {
            return Err(AppError::Forbidden("sem permissão para criar ordens de serviço".into()));
        }
        payload.validate()?;
        reject_negative_amounts(&payload.work)?;

        let request = match payload.request_id {
            Some(request_id) => Some(
                self.store
                    .find_request(request_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("request {}", request_id)))?,
            ),
            None => None,
        };

        // O que não veio no payload é herdado do lead
        let lead = request.as_ref();
        let manager_id = payload
            .manager_id
            .or_else(|| lead.and_then(|r| r.manager_id))
            .ok_or_else(|| AppError::InvalidInput("managerId é obrigatório".into()))?;
        let car_brand = non_empty(payload.car_brand.or_else(|| lead.and_then(|r| r.car_brand.clone())))
            .ok_or_else(|| AppError::InvalidInput("carBrand é obrigatório".into()))?;
        let car_model = non_empty(payload.car_model.or_else(|| lead.and_then(|r| r.car_model.clone())))
            .ok_or_else(|| AppError::InvalidInput("carModel é obrigatório".into()))?;
        let customer_name = non_empty(payload.customer_name.or_else(|| lead.and_then(|r| r.customer_name.clone())));
        let customer_phone =
            non_empty(payload.customer_phone.or_else(|| lead.and_then(|r| r.customer_phone.clone())));

        let work = payload.work;
        let candidates = deriver::derive(&work, payload.total_amount);
        let initial = status::initial_status(!candidates.is_empty(), payload.master_id);

        let armatura_executors = work.armatura_executors.unwrap_or_default();
        let draft = WorkOrderDraft {
            total_amount: payload.total_amount,
            payment_method: payload.payment_method,
            manager_id,
            master_id: payload.master_id,
            executor_id: payload.executor_id,
            request_id: payload.request_id,
            customer_name,
            customer_phone,
            car_brand,
            car_model,
            vin: payload.vin,
            car_condition: payload.car_condition,
            legacy: pricing::legacy_projection(&armatura_executors, payload.total_amount),
            armatura_executors,
            fixed_services: work.fixed_services.unwrap_or_default(),
            body_parts_data: work.body_parts_data.unwrap_or_default(),
            services_data: work.services_data.unwrap_or_default(),
            additional_services: work.additional_services.unwrap_or_default(),
            status: initial,
            photos_before: payload.photos_before,
            photos_after: payload.photos_after,
        };

        let (order, assignments) = self.store.create_work_order(draft, candidates).await?;

        tracing::info!(
            "🧾 OS {} criada por {} com {} atribuições (status {:?})",
            order.order_number,
            caller.id,
            assignments.len(),
            order.status
        );

        Ok(Self::view(caller, &order, &assignments))
    }

    // =========================================================================
    //  EDIÇÃO + RECONCILIAÇÃO
    // =========================================================================

    pub async fn update(
        &self,
        caller: &Caller,
        id: i64,
        mut payload: UpdateWorkOrderPayload,
    ) -> Result<WorkOrderView, AppError> {
        payload.validate()?;
        reject_negative_amounts(&payload.work)?;
        let (mut order, _) = self.load_visible(caller, id).await?;

        let can_edit = caller.can(Permission::WorkOrdersEditAll)
            || (caller.can(Permission::WorkOrdersEditAssigned) && order.master_id == Some(caller.id));
        if !can_edit {
            return Err(AppError::Forbidden("sem permissão para editar esta OS".into()));
        }
        if payload.touches_finance() && !caller.can_view_finance() {
            return Err(AppError::Forbidden("sem permissão para alterar dados financeiros".into()));
        }
        // Quem recebeu os serviços sem valores não pode zerá-los nem trocá-los
        if !caller.can_view_finance() {
            payload
                .work
                .keep_prices_of(&order.services_data, &order.additional_services);
        }

        let previous_total = order.total_amount;

        if let Some(total) = payload.total_amount {
            order.total_amount = total;
        }
        if let Some(method) = payload.payment_method {
            order.payment_method = method;
        }
        if let Some(name) = payload.customer_name {
            order.customer_name = Some(name);
        }
        if let Some(phone) = payload.customer_phone {
            order.customer_phone = Some(phone);
        }
        if let Some(brand) = payload.car_brand {
            order.car_brand = brand;
        }
        if let Some(model) = payload.car_model {
            order.car_model = model;
        }
        if let Some(vin) = payload.vin {
            order.vin = Some(vin);
        }
        if let Some(condition) = payload.car_condition {
            order.car_condition = condition;
        }
        if let Some(photos) = payload.photos_before {
            order.photos_before = photos;
        }
        if let Some(photos) = payload.photos_after {
            order.photos_after = photos;
        }

        order.apply_input(&payload.work);
        order.legacy = pricing::legacy_projection(&order.armatura_executors, order.total_amount);

        let touched = payload.work.touched_work_types();
        if !touched.is_empty() {
            let candidates = deriver::derive(&payload.work, order.total_amount);
            self.reconcile(order.id, candidates, &touched).await?;
        }

        // Correção de preço: vale também para as já pagas
        if order.total_amount != previous_total {
            self.reprice_armatura(order.id, order.total_amount).await?;
        }

        let assignments = self.store.list_assignments(order.id).await?;
        order.status = status::status_after_edit(order.status, !assignments.is_empty(), order.master_id);

        let order = self.store.save_work_order(&order).await?;

        tracing::info!(
            "✏️ OS {} editada por {} (grupos tocados: {}, total {} -> {})",
            order.order_number,
            caller.id,
            touched.len(),
            previous_total,
            order.total_amount
        );

        Ok(Self::view(caller, &order, &assignments))
    }

    /// Para cada tipo tocado: remove as não pagas e insere as novas.
    /// Cada tipo é atômico por si; tipos não tocados ficam como estão.
    pub async fn reconcile(
        &self,
        work_order_id: i64,
        candidates: Vec<CandidateAssignment>,
        touched: &[WorkType],
    ) -> Result<(), AppError> {
        for work_type in touched {
            let group: Vec<CandidateAssignment> = candidates
                .iter()
                .filter(|c| c.work_type == *work_type)
                .cloned()
                .collect();

            tracing::debug!("OS {}: {:?} -> {} novas", work_order_id, work_type, group.len());

            self.store
                .replace_unpaid_assignments(work_order_id, *work_type, group)
                .await?;
        }
        Ok(())
    }

    async fn reprice_armatura(&self, work_order_id: i64, total_amount: Decimal) -> Result<(), AppError> {
        for stage in ArmaturaStage::ALL {
            self.store
                .reprice_assignments(work_order_id, stage.work_type(), pricing::armatura_amount(stage, total_amount))
                .await?;
        }
        Ok(())
    }

    // =========================================================================
    //  FLUXO
    // =========================================================================

    fn owns_assignment(caller: &Caller, assignments: &[Assignment]) -> bool {
        assignments.iter().any(|a| a.executor_id == caller.id)
    }

    pub async fn assign_master(&self, caller: &Caller, id: i64, master_id: i64) -> Result<WorkOrderView, AppError> {
        let (mut order, assignments) = self.load_visible(caller, id).await?;
        let edge = workflow::authorize(WorkflowAction::AssignMaster, &order, caller, false)?;

        order.master_id = Some(master_id);
        order.status = workflow::target_status(edge, order.status, None)?;
        let order = self.store.save_work_order(&order).await?;

        tracing::info!("👷 OS {}: mestre {} designado", order.order_number, master_id);
        Ok(Self::view(caller, &order, &assignments))
    }

    pub async fn assign_executor(
        &self,
        caller: &Caller,
        id: i64,
        executor_id: i64,
    ) -> Result<WorkOrderView, AppError> {
        let (mut order, assignments) = self.load_visible(caller, id).await?;
        let edge = workflow::authorize(WorkflowAction::AssignExecutor, &order, caller, false)?;

        order.executor_id = Some(executor_id);
        order.status = workflow::target_status(edge, order.status, None)?;
        let order = self.store.save_work_order(&order).await?;

        tracing::info!("🔧 OS {}: executor {} designado", order.order_number, executor_id);
        Ok(Self::view(caller, &order, &assignments))
    }

    pub async fn start(&self, caller: &Caller, id: i64) -> Result<WorkOrderView, AppError> {
        let (mut order, assignments) = self.load_visible(caller, id).await?;
        let owns = Self::owns_assignment(caller, &assignments);
        let edge = workflow::authorize(WorkflowAction::Start, &order, caller, owns)?;

        let now = Utc::now();
        order.status = workflow::target_status(edge, order.status, None)?;
        order.started_at.get_or_insert(now);
        let order = self.store.save_work_order(&order).await?;

        if caller.role == Role::Executor {
            for assignment in assignments.iter().filter(|a| a.executor_id == caller.id) {
                if assignment.metadata.started_at.is_none() {
                    let mut metadata = assignment.metadata.clone();
                    metadata.started_at = Some(now);
                    self.store.update_assignment_metadata(assignment.id, &metadata).await?;
                }
            }
        }

        tracing::info!("▶️ OS {} iniciada por {}", order.order_number, caller.id);

        let assignments = self.store.list_assignments(order.id).await?;
        Ok(Self::view(caller, &order, &assignments))
    }

    /// Só registra a entrega da parte do executor; o status da OS não muda.
    pub async fn submit_review(&self, caller: &Caller, id: i64) -> Result<WorkOrderView, AppError> {
        let (order, assignments) = self.load_visible(caller, id).await?;
        let owns = Self::owns_assignment(caller, &assignments);
        workflow::authorize(WorkflowAction::SubmitReview, &order, caller, owns)?;

        tracing::info!("📨 OS {}: executor {} enviou sua parte", order.order_number, caller.id);
        Ok(Self::view(caller, &order, &assignments))
    }

    pub async fn approve(&self, caller: &Caller, id: i64) -> Result<WorkOrderView, AppError> {
        self.review_decision(caller, id, WorkflowAction::Approve).await
    }

    pub async fn request_revision(&self, caller: &Caller, id: i64) -> Result<WorkOrderView, AppError> {
        self.review_decision(caller, id, WorkflowAction::RequestRevision).await
    }

    async fn review_decision(
        &self,
        caller: &Caller,
        id: i64,
        action: WorkflowAction,
    ) -> Result<WorkOrderView, AppError> {
        let (mut order, assignments) = self.load_visible(caller, id).await?;
        let edge = workflow::authorize(action, &order, caller, false)?;

        order.status = workflow::target_status(edge, order.status, None)?;
        let order = self.store.save_work_order(&order).await?;
        Ok(Self::view(caller, &order, &assignments))
    }

    pub async fn complete(
        &self,
        caller: &Caller,
        id: i64,
        final_stage: Option<FinalStage>,
    ) -> Result<WorkOrderView, AppError> {
        let final_stage =
            final_stage.ok_or_else(|| AppError::InvalidInput("finalStage é obrigatório".into()))?;

        let (mut order, assignments) = self.load_visible(caller, id).await?;
        let edge = workflow::authorize(WorkflowAction::Complete, &order, caller, false)?;

        order.status = workflow::target_status(edge, order.status, Some(final_stage))?;
        order.completed_at = Some(Utc::now());
        let order = self.store.save_work_order(&order).await?;

        tracing::info!("✅ OS {} concluída como {:?}", order.order_number, order.status);
        Ok(Self::view(caller, &order, &assignments))
    }

    /// PENDING -> DONE da própria atribuição. Quando todas ficam DONE,
    /// a OS volta para o mestre (uma vez só).
    pub async fn update_task_status(
        &self,
        caller: &Caller,
        assignment_id: i64,
        new_status: TaskStatus,
    ) -> Result<WorkOrderView, AppError> {
        if caller.role != Role::Executor {
            return Err(AppError::Forbidden("apenas o executor atualiza suas tarefas".into()));
        }
        if new_status != TaskStatus::Done {
            return Err(AppError::InvalidInput("a tarefa só pode ir de PENDING para DONE".into()));
        }

        let assignment = self
            .store
            .find_assignment(assignment_id)
            .await?
            .filter(|a| a.executor_id == caller.id)
            .ok_or_else(|| AppError::NotFound(format!("assignment {}", assignment_id)))?;

        let (mut order, _) = self.load_visible(caller, assignment.work_order_id).await?;

        if !assignment.is_done() {
            let mut metadata = assignment.metadata.clone();
            metadata.status = TaskStatus::Done;
            metadata.finished_at = Some(Utc::now());
            self.store.update_assignment_metadata(assignment.id, &metadata).await?;

            // Relê tudo: outros executores podem ter concluído em paralelo
            let fresh = self.store.list_assignments(order.id).await?;
            if fresh.iter().all(Assignment::is_done) && order.status != WorkOrderStatus::AssignedToMaster {
                order.status = WorkOrderStatus::AssignedToMaster;
                order = self.store.save_work_order(&order).await?;
                tracing::info!("🏁 OS {}: todas as tarefas concluídas, volta ao mestre", order.order_number);
            }
        }

        let assignments = self.store.list_assignments(order.id).await?;
        Ok(Self::view(caller, &order, &assignments))
    }

    // =========================================================================
    //  FOLHA DE PAGAMENTO
    // =========================================================================

    pub async fn record_payment(
        &self,
        caller: &Caller,
        assignment_id: i64,
        amount: Decimal,
    ) -> Result<AssignmentView, AppError> {
        if !(caller.can_view_finance() && caller.can(Permission::WorkOrdersEditAll)) {
            return Err(AppError::Forbidden("sem permissão para registrar pagamentos".into()));
        }
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidInput("o valor do pagamento deve ser positivo".into()));
        }

        // Conferência do saldo e soma acontecem na mesma escrita
        let Some(assignment) = self.store.add_payment(assignment_id, amount).await? else {
            let assignment = self
                .store
                .find_assignment(assignment_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("assignment {}", assignment_id)))?;
            return Err(AppError::InvalidInput(format!(
                "o pagamento excede o saldo de {}",
                assignment.outstanding()
            )));
        };

        tracing::info!(
            "💸 Pagamento de {} na atribuição {} (executor {}, quitada: {})",
            amount,
            assignment.id,
            assignment.executor_id,
            assignment.is_paid
        );

        Ok(redact_assignment(&assignment, true))
    }

    pub async fn executor_payroll(&self, caller: &Caller, executor_id: i64) -> Result<ExecutorPayroll, AppError> {
        if !caller.can_view_finance() {
            return Err(AppError::Forbidden("sem permissão para ver a folha".into()));
        }

        let assignments = self.store.list_assignments_by_executor(executor_id).await?;
        let earned = assignments.iter().map(|a| a.amount).sum();
        let paid = assignments.iter().map(|a| a.paid_amount).sum();
        let outstanding = assignments.iter().map(Assignment::outstanding).sum();

        Ok(ExecutorPayroll {
            executor_id,
            earned,
            paid,
            outstanding,
            assignments: assignments.iter().map(|a| redact_assignment(a, true)).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::db::memory::MemoryStore;
    use crate::models::{
        assignment::TaskMetadata,
        request::Request,
        structured::{ArmaturaExecutors, ServiceEntry, ServiceKind, ServicesData, WorkInput},
    };

    const MANAGER: Caller = Caller { id: 2, role: Role::Manager };
    const MASTER: Caller = Caller { id: 3, role: Role::Master };

    fn executor(id: i64) -> Caller {
        Caller::new(id, Role::Executor)
    }

    fn service() -> (WorkOrderService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (WorkOrderService::new(store.clone()), store)
    }

    fn payload(total: i64, work: WorkInput) -> CreateWorkOrderPayload {
        CreateWorkOrderPayload {
            total_amount: Decimal::from(total),
            manager_id: Some(MANAGER.id),
            car_brand: Some("Toyota".into()),
            car_model: Some("Land Cruiser".into()),
            work,
            ..Default::default()
        }
    }

    fn armatura(executors: ArmaturaExecutors) -> WorkInput {
        WorkInput {
            armatura_executors: Some(executors),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn armature_only_order_is_assigned_to_executor() {
        let (svc, _) = service();
        let view = svc
            .create(
                &MANAGER,
                payload(10_000, armatura(ArmaturaExecutors { dismantling: Some(5), ..Default::default() })),
            )
            .await
            .unwrap();

        assert_eq!(view.order_number, "WO-000001");
        assert_eq!(view.status, WorkOrderStatus::AssignedToExecutor);
        assert_eq!(view.assignments.len(), 1);
        let a = &view.assignments[0];
        assert_eq!(a.work_type, WorkType::ArmaturaDismantling);
        assert_eq!(a.executor_id, 5);
        assert_eq!(a.amount, Some(Decimal::from(700)));
        assert_eq!(a.description, "Демонтаж");
        assert!(view.legacy.dismantling);
    }

    #[tokio::test]
    async fn initial_status_without_executor_categories() {
        let (svc, _) = service();

        let plain = svc.create(&MANAGER, payload(5_000, WorkInput::default())).await.unwrap();
        assert_eq!(plain.status, WorkOrderStatus::New);

        let mut with_master = payload(5_000, WorkInput::default());
        with_master.master_id = Some(MASTER.id);
        let view = svc.create(&MANAGER, with_master).await.unwrap();
        assert_eq!(view.status, WorkOrderStatus::AssignedToMaster);
        assert_eq!(view.order_number, "WO-000002");
    }

    #[tokio::test]
    async fn manager_is_required_or_inherited_from_request() {
        let (svc, store) = service();

        let mut orphan = payload(1_000, WorkInput::default());
        orphan.manager_id = None;
        let err = svc.create(&MANAGER, orphan).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        store.add_request(Request {
            id: 40,
            manager_id: Some(8),
            customer_name: Some("Пётр".into()),
            customer_phone: Some("+7 900 000-00-00".into()),
            car_brand: Some("Porsche".into()),
            car_model: Some("Cayenne".into()),
            created_at: Utc::now(),
        });
        let from_lead = CreateWorkOrderPayload {
            total_amount: Decimal::from(1_000),
            request_id: Some(40),
            ..Default::default()
        };
        let view = svc.create(&MANAGER, from_lead).await.unwrap();
        assert_eq!(view.manager_id, 8);
        assert_eq!(view.car_brand, "Porsche");
        assert_eq!(view.customer_name.as_deref(), Some("Пётр"));

        let missing = CreateWorkOrderPayload {
            request_id: Some(999),
            ..payload(1_000, WorkInput::default())
        };
        assert!(matches!(svc.create(&MANAGER, missing).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn only_office_creates_orders() {
        let (svc, _) = service();
        let err = svc.create(&MASTER, payload(1_000, WorkInput::default())).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn edit_preserves_paid_row() {
        let (svc, store) = service();
        let created = svc
            .create(
                &MANAGER,
                payload(10_000, armatura(ArmaturaExecutors { mounting: Some(5), ..Default::default() })),
            )
            .await
            .unwrap();
        let paid_id = created.assignments[0].id;
        store.mark_paid(paid_id);

        let update = UpdateWorkOrderPayload {
            work: armatura(ArmaturaExecutors { mounting: Some(6), ..Default::default() }),
            ..Default::default()
        };
        let view = svc.update(&MANAGER, created.id, update).await.unwrap();

        let mounting: Vec<_> = view
            .assignments
            .iter()
            .filter(|a| a.work_type == WorkType::ArmaturaMounting)
            .collect();
        assert_eq!(mounting.len(), 2);

        let old = mounting.iter().find(|a| a.id == paid_id).unwrap();
        assert_eq!(old.executor_id, 5);
        assert_eq!(old.amount, Some(Decimal::from(700)));
        assert_eq!(old.is_paid, Some(true));
        assert_eq!(old.paid_amount, Some(Decimal::from(700)));

        let new = mounting.iter().find(|a| a.id != paid_id).unwrap();
        assert_eq!(new.executor_id, 6);
        assert_eq!(new.amount, Some(Decimal::from(700)));
        assert_eq!(new.is_paid, Some(false));
    }

    #[tokio::test]
    async fn unpaid_rows_of_touched_type_are_replaced_and_others_kept() {
        let (svc, _) = service();
        let work = WorkInput {
            armatura_executors: Some(ArmaturaExecutors { dismantling: Some(5), ..Default::default() }),
            services_data: Some(ServicesData {
                film: Some(ServiceEntry { executor_id: Some(7), amount: Some(Decimal::from(9_000)) }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let created = svc.create(&MANAGER, payload(10_000, work)).await.unwrap();
        let film_before = created
            .assignments
            .iter()
            .find(|a| a.work_type == WorkType::ServiceFilm)
            .unwrap()
            .clone();

        let update = UpdateWorkOrderPayload {
            work: armatura(ArmaturaExecutors { assembly: Some(8), ..Default::default() }),
            ..Default::default()
        };
        let view = svc.update(&MANAGER, created.id, update).await.unwrap();

        let types: Vec<WorkType> = view.assignments.iter().map(|a| a.work_type).collect();
        assert!(!types.contains(&WorkType::ArmaturaDismantling));
        assert!(types.contains(&WorkType::ArmaturaAssembly));

        let film_after = view.assignments.iter().find(|a| a.work_type == WorkType::ServiceFilm).unwrap();
        assert_eq!(film_after.id, film_before.id);
        assert_eq!(film_after.amount, film_before.amount);
    }

    #[tokio::test]
    async fn total_change_reprices_armature_only() {
        let (svc, store) = service();
        let work = WorkInput {
            armatura_executors: Some(ArmaturaExecutors {
                dismantling: Some(5),
                mounting: Some(5),
                ..Default::default()
            }),
            services_data: Some(ServicesData {
                polishing: Some(ServiceEntry { executor_id: Some(7), amount: Some(Decimal::from(3_000)) }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let created = svc.create(&MANAGER, payload(10_000, work)).await.unwrap();
        let paid_mounting = created
            .assignments
            .iter()
            .find(|a| a.work_type == WorkType::ArmaturaMounting)
            .unwrap()
            .id;
        store.mark_paid(paid_mounting);
        let polishing_before = store
            .list_assignments(created.id)
            .await
            .unwrap()
            .into_iter()
            .find(|a| a.work_type == WorkType::ServicePolishing)
            .unwrap();

        let update = UpdateWorkOrderPayload {
            total_amount: Some(Decimal::from(20_000)),
            ..Default::default()
        };
        let view = svc.update(&MANAGER, created.id, update).await.unwrap();

        let amount_of = |wt: WorkType| view.assignments.iter().find(|a| a.work_type == wt).unwrap().amount;
        assert_eq!(amount_of(WorkType::ArmaturaDismantling), Some(Decimal::from(1_400)));
        // Paga também é reprecificada (correção de preço), mas continua paga
        let mounting = view.assignments.iter().find(|a| a.id == paid_mounting).unwrap();
        assert_eq!(mounting.amount, Some(Decimal::from(1_400)));
        assert_eq!(mounting.is_paid, Some(true));
        assert_eq!(mounting.paid_amount, Some(Decimal::from(700)));

        let polishing_after = store.find_assignment(polishing_before.id).await.unwrap().unwrap();
        assert_eq!(polishing_after, polishing_before);

        assert_eq!(view.legacy.dismantling_price, Some(Decimal::from(1_400)));
        assert_eq!(view.total_amount, Some(Decimal::from(20_000)));
    }

    #[tokio::test]
    async fn master_cannot_touch_finance_fields() {
        let (svc, _) = service();
        let mut p = payload(10_000, WorkInput::default());
        p.master_id = Some(MASTER.id);
        let created = svc.create(&MANAGER, p).await.unwrap();

        let update = UpdateWorkOrderPayload {
            total_amount: Some(Decimal::from(1)),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(&MASTER, created.id, update).await,
            Err(AppError::Forbidden(_))
        ));

        let update = UpdateWorkOrderPayload {
            car_model: Some("LC 300".into()),
            ..Default::default()
        };
        let view = svc.update(&MASTER, created.id, update).await.unwrap();
        assert_eq!(view.car_model, "LC 300");
        assert_eq!(view.total_amount, None);
    }

    #[tokio::test]
    async fn edit_promotes_new_order_once_executors_appear() {
        let (svc, _) = service();
        let created = svc.create(&MANAGER, payload(10_000, WorkInput::default())).await.unwrap();
        assert_eq!(created.status, WorkOrderStatus::New);

        let update = UpdateWorkOrderPayload {
            work: armatura(ArmaturaExecutors { dismantling: Some(5), ..Default::default() }),
            ..Default::default()
        };
        let view = svc.update(&MANAGER, created.id, update).await.unwrap();
        assert_eq!(view.status, WorkOrderStatus::AssignedToExecutor);
    }

    #[tokio::test]
    async fn start_stamps_order_and_own_assignments() {
        let (svc, store) = service();
        let created = svc
            .create(
                &MANAGER,
                payload(10_000, armatura(ArmaturaExecutors {
                    dismantling: Some(5),
                    mounting: Some(6),
                    ..Default::default()
                })),
            )
            .await
            .unwrap();

        assert!(matches!(svc.start(&executor(77), created.id).await, Err(AppError::NotFound(_))));

        let view = svc.start(&executor(5), created.id).await.unwrap();
        assert_eq!(view.status, WorkOrderStatus::InProgress);
        assert!(view.started_at.is_some());
        assert_eq!(view.assignments.len(), 1);
        assert!(view.assignments[0].metadata.started_at.is_some());

        let others = store.list_assignments(created.id).await.unwrap();
        let six = others.iter().find(|a| a.executor_id == 6).unwrap();
        assert!(six.metadata.started_at.is_none());

        // O segundo executor também pode iniciar sua parte
        let again = svc.start(&executor(6), created.id).await.unwrap();
        assert_eq!(again.started_at, view.started_at);
    }

    #[tokio::test]
    async fn all_done_advances_to_master_exactly_once() {
        let (svc, store) = service();
        let created = svc
            .create(
                &MANAGER,
                payload(10_000, armatura(ArmaturaExecutors {
                    dismantling: Some(5),
                    mounting: Some(6),
                    ..Default::default()
                })),
            )
            .await
            .unwrap();
        svc.start(&MANAGER, created.id).await.unwrap();

        let all = store.list_assignments(created.id).await.unwrap();
        let of = |executor_id: i64| all.iter().find(|a| a.executor_id == executor_id).unwrap().id;

        let view = svc.update_task_status(&executor(5), of(5), TaskStatus::Done).await.unwrap();
        assert_eq!(view.status, WorkOrderStatus::InProgress);
        assert_eq!(view.assignments[0].metadata.status, TaskStatus::Done);
        assert!(view.assignments[0].metadata.finished_at.is_some());

        let view = svc.update_task_status(&executor(6), of(6), TaskStatus::Done).await.unwrap();
        assert_eq!(view.status, WorkOrderStatus::AssignedToMaster);

        svc.complete(&MANAGER, created.id, Some(FinalStage::Issued)).await.unwrap();

        // Repetir depois de tudo DONE não dá erro nem dispara de novo
        let view = svc.update_task_status(&executor(6), of(6), TaskStatus::Done).await.unwrap();
        assert_eq!(view.status, WorkOrderStatus::Issued);
    }

    #[tokio::test]
    async fn foreign_assignment_is_not_found() {
        let (svc, store) = service();
        let created = svc
            .create(&MANAGER, payload(10_000, armatura(ArmaturaExecutors { dismantling: Some(5), ..Default::default() })))
            .await
            .unwrap();
        let id = store.list_assignments(created.id).await.unwrap()[0].id;

        assert!(matches!(
            svc.update_task_status(&executor(6), id, TaskStatus::Done).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            svc.update_task_status(&executor(5), 9_999, TaskStatus::Done).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            svc.update_task_status(&MANAGER, id, TaskStatus::Done).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn approve_and_revision_always_fail() {
        let (svc, _) = service();
        let created = svc.create(&MANAGER, payload(1_000, WorkInput::default())).await.unwrap();

        assert!(matches!(svc.approve(&MANAGER, created.id).await, Err(AppError::Forbidden(_))));
        assert!(matches!(svc.request_revision(&MANAGER, created.id).await, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn complete_needs_final_stage() {
        let (svc, _) = service();
        let created = svc.create(&MANAGER, payload(1_000, WorkInput::default())).await.unwrap();

        assert!(matches!(svc.complete(&MANAGER, created.id, None).await, Err(AppError::InvalidInput(_))));

        let view = svc.complete(&MANAGER, created.id, Some(FinalStage::Sent)).await.unwrap();
        assert_eq!(view.status, WorkOrderStatus::Sent);
        assert!(view.completed_at.is_some());
    }

    #[tokio::test]
    async fn master_flow_assign_then_complete() {
        let (svc, _) = service();
        let created = svc.create(&MANAGER, payload(1_000, WorkInput::default())).await.unwrap();

        let view = svc.assign_master(&MANAGER, created.id, MASTER.id).await.unwrap();
        assert_eq!(view.status, WorkOrderStatus::AssignedToMaster);

        let view = svc.complete(&MASTER, created.id, Some(FinalStage::Assembled)).await.unwrap();
        assert_eq!(view.status, WorkOrderStatus::Assembled);
        assert_eq!(view.total_amount, None);
    }

    #[tokio::test]
    async fn executor_visibility_and_listing() {
        let (svc, _) = service();
        let mine = svc
            .create(&MANAGER, payload(10_000, armatura(ArmaturaExecutors { dismantling: Some(5), ..Default::default() })))
            .await
            .unwrap();
        let other = svc
            .create(&MANAGER, payload(10_000, armatura(ArmaturaExecutors { dismantling: Some(6), ..Default::default() })))
            .await
            .unwrap();

        assert!(matches!(svc.get(&executor(5), other.id).await, Err(AppError::NotFound(_))));

        let listed = svc.list(&executor(5), WorkOrderListQuery::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, mine.id);
        assert_eq!(listed[0].total_amount, None);

        let all = svc.list(&MANAGER, WorkOrderListQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let board = svc.board(&MANAGER).await.unwrap();
        let assigned = board
            .iter()
            .find(|c| c.status == WorkOrderStatus::AssignedToExecutor)
            .unwrap();
        assert_eq!(assigned.orders.len(), 2);
        assert_eq!(board.len(), WorkOrderStatus::ALL.len());
    }

    #[tokio::test]
    async fn payments_accumulate_until_paid() {
        let (svc, store) = service();
        let created = svc
            .create(&MANAGER, payload(10_000, armatura(ArmaturaExecutors { dismantling: Some(5), ..Default::default() })))
            .await
            .unwrap();
        let id = store.list_assignments(created.id).await.unwrap()[0].id;

        let partial = svc.record_payment(&MANAGER, id, Decimal::from(300)).await.unwrap();
        assert_eq!(partial.is_paid, Some(false));
        assert_eq!(partial.paid_amount, Some(Decimal::from(300)));

        assert!(matches!(
            svc.record_payment(&MANAGER, id, Decimal::from(500)).await,
            Err(AppError::InvalidInput(_))
        ));

        let full = svc.record_payment(&MANAGER, id, Decimal::from(400)).await.unwrap();
        assert_eq!(full.is_paid, Some(true));

        let payroll = svc.executor_payroll(&MANAGER, 5).await.unwrap();
        assert_eq!(payroll.earned, Decimal::from(700));
        assert_eq!(payroll.paid, Decimal::from(700));
        assert_eq!(payroll.outstanding, Decimal::ZERO);

        assert!(matches!(svc.executor_payroll(&MASTER, 5).await, Err(AppError::Forbidden(_))));
        assert!(matches!(
            svc.record_payment(&MASTER, id, Decimal::from(1)).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn negative_service_amounts_are_rejected_before_saving() {
        let (svc, store) = service();
        let work: WorkInput = serde_json::from_value(json!({
            "servicesData": { "film": { "executorId": 7, "amount": -5000 } },
            "additionalServices": [{ "name": "Тонировка", "executorId": 9, "amount": "-1500" }]
        }))
        .unwrap();

        let err = svc.create(&MANAGER, payload(10_000, work)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(ref m) if m.contains("servicesData.film")));
        assert!(store.list_work_orders(&WorkOrderFilter::default()).await.unwrap().is_empty());

        let created = svc.create(&MANAGER, payload(10_000, WorkInput::default())).await.unwrap();
        let update = UpdateWorkOrderPayload {
            work: serde_json::from_value(json!({
                "additionalServices": [{ "name": "Тонировка", "executorId": 9, "amount": "-1500" }]
            }))
            .unwrap(),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(&MANAGER, created.id, update).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(store.list_assignments(created.id).await.unwrap().is_empty());
        let stored = store.find_work_order(created.id).await.unwrap().unwrap();
        assert!(stored.additional_services.is_empty());
    }

    #[tokio::test]
    async fn master_round_trip_keeps_service_prices() {
        let (svc, store) = service();
        let mut p = payload(10_000, WorkInput {
            services_data: Some(ServicesData {
                film: Some(ServiceEntry { executor_id: Some(7), amount: Some(Decimal::from(9000)) }),
                ..Default::default()
            }),
            ..Default::default()
        });
        p.master_id = Some(MASTER.id);
        let created = svc.create(&MANAGER, p).await.unwrap();

        // O mestre recebe os serviços sem valores e devolve só trocando o executor
        let seen = svc.get(&MASTER, created.id).await.unwrap();
        let mut services = seen.services_data.clone();
        assert_eq!(services.leg(ServiceKind::Film), Some((Some(7), None)));
        services.film = Some(ServiceEntry { executor_id: Some(8), amount: None });
        services.polishing = Some(ServiceEntry { executor_id: Some(8), amount: Some(Decimal::from(1)) });

        let update = UpdateWorkOrderPayload {
            work: WorkInput {
                services_data: Some(services),
                ..Default::default()
            },
            ..Default::default()
        };
        svc.update(&MASTER, created.id, update).await.unwrap();

        let rows = store.list_assignments(created.id).await.unwrap();
        let film: Vec<(i64, Decimal)> = rows
            .iter()
            .filter(|a| a.work_type == WorkType::ServiceFilm)
            .map(|a| (a.executor_id, a.amount))
            .collect();
        assert_eq!(film, vec![(8, Decimal::from(9000))]);
        // Categoria nova sem preço do escritório não gera linha
        assert!(rows.iter().all(|a| a.work_type != WorkType::ServicePolishing));

        let stored = store.find_work_order(created.id).await.unwrap().unwrap();
        assert_eq!(stored.services_data.leg(ServiceKind::Film), Some((Some(8), Some(Decimal::from(9000)))));
        assert_eq!(stored.services_data.leg(ServiceKind::Polishing), Some((Some(8), None)));
    }

    /// Store que registra um pagamento logo depois de entregar a atribuição,
    /// como faria o escritório entre a leitura e a escrita do executor.
    struct PaymentAfterRead {
        inner: Arc<MemoryStore>,
        pending: Mutex<Option<(i64, Decimal)>>,
    }

    #[async_trait]
    impl WorkOrderStore for PaymentAfterRead {
        async fn find_request(&self, request_id: i64) -> Result<Option<Request>, AppError> {
            self.inner.find_request(request_id).await
        }

        async fn create_work_order(
            &self,
            draft: WorkOrderDraft,
            assignments: Vec<CandidateAssignment>,
        ) -> Result<(WorkOrder, Vec<Assignment>), AppError> {
            self.inner.create_work_order(draft, assignments).await
        }

        async fn find_work_order(&self, id: i64) -> Result<Option<WorkOrder>, AppError> {
            self.inner.find_work_order(id).await
        }

        async fn list_work_orders(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, AppError> {
            self.inner.list_work_orders(filter).await
        }

        async fn save_work_order(&self, order: &WorkOrder) -> Result<WorkOrder, AppError> {
            self.inner.save_work_order(order).await
        }

        async fn list_assignments(&self, work_order_id: i64) -> Result<Vec<Assignment>, AppError> {
            self.inner.list_assignments(work_order_id).await
        }

        async fn list_assignments_for_orders(&self, work_order_ids: &[i64]) -> Result<Vec<Assignment>, AppError> {
            self.inner.list_assignments_for_orders(work_order_ids).await
        }

        async fn list_assignments_by_executor(&self, executor_id: i64) -> Result<Vec<Assignment>, AppError> {
            self.inner.list_assignments_by_executor(executor_id).await
        }

        async fn find_assignment(&self, id: i64) -> Result<Option<Assignment>, AppError> {
            let found = self.inner.find_assignment(id).await?;
            let pending = self.pending.lock().unwrap().take();
            if let Some((paid_id, amount)) = pending {
                self.inner.add_payment(paid_id, amount).await?;
            }
            Ok(found)
        }

        async fn replace_unpaid_assignments(
            &self,
            work_order_id: i64,
            work_type: WorkType,
            assignments: Vec<CandidateAssignment>,
        ) -> Result<(), AppError> {
            self.inner.replace_unpaid_assignments(work_order_id, work_type, assignments).await
        }

        async fn reprice_assignments(
            &self,
            work_order_id: i64,
            work_type: WorkType,
            amount: Decimal,
        ) -> Result<(), AppError> {
            self.inner.reprice_assignments(work_order_id, work_type, amount).await
        }

        async fn update_assignment_metadata(&self, id: i64, metadata: &TaskMetadata) -> Result<Assignment, AppError> {
            self.inner.update_assignment_metadata(id, metadata).await
        }

        async fn add_payment(&self, id: i64, amount: Decimal) -> Result<Option<Assignment>, AppError> {
            self.inner.add_payment(id, amount).await
        }
    }

    #[tokio::test]
    async fn task_done_keeps_payment_made_after_read() {
        let inner = Arc::new(MemoryStore::new());
        let store = Arc::new(PaymentAfterRead { inner: inner.clone(), pending: Mutex::new(None) });
        let svc = WorkOrderService::new(store.clone());

        let created = svc
            .create(&MANAGER, payload(10_000, armatura(ArmaturaExecutors { dismantling: Some(5), ..Default::default() })))
            .await
            .unwrap();
        let id = inner.list_assignments(created.id).await.unwrap()[0].id;

        *store.pending.lock().unwrap() = Some((id, Decimal::from(700)));
        svc.update_task_status(&executor(5), id, TaskStatus::Done).await.unwrap();

        let row = inner.find_assignment(id).await.unwrap().unwrap();
        assert!(row.is_done());
        assert!(row.is_paid);
        assert_eq!(row.paid_amount, Decimal::from(700));
    }

    #[tokio::test]
    async fn concurrent_payments_never_exceed_the_amount() {
        let (svc, store) = service();
        let created = svc
            .create(&MANAGER, payload(10_000, armatura(ArmaturaExecutors { dismantling: Some(5), ..Default::default() })))
            .await
            .unwrap();
        let id = store.list_assignments(created.id).await.unwrap()[0].id;

        let (a, b) = tokio::join!(
            svc.record_payment(&MANAGER, id, Decimal::from(400)),
            svc.record_payment(&MANAGER, id, Decimal::from(400)),
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);

        let row = store.find_assignment(id).await.unwrap().unwrap();
        assert_eq!(row.paid_amount, Decimal::from(400));
        assert!(!row.is_paid);

        assert!(matches!(
            svc.record_payment(&MANAGER, 9_999, Decimal::from(1)).await,
            Err(AppError::NotFound(_))
        ));
    }
}
