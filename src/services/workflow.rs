// src/services/workflow.rs
//
// Máquina de estados da OS. Cada ação tem uma aresta: quem pode
// dispará-la, de quais estados e para onde vai.

use crate::{
    common::error::AppError,
    models::{
        auth::{Caller, Role},
        work_order::{FinalStage, WorkOrder, WorkOrderStatus},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowAction {
    AssignMaster,
    AssignExecutor,
    Start,
    SubmitReview,
    Approve,
    RequestRevision,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Enabled,
    // Aresta prevista mas desligada; falha sempre com Forbidden
    NotYetEnabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sources {
    Any,
    NotCompleted,
    Only(&'static [WorkOrderStatus]),
}

impl Sources {
    fn admits(self, status: WorkOrderStatus) -> bool {
        match self {
            Sources::Any => true,
            Sources::NotCompleted => !status.is_completed(),
            Sources::Only(list) => list.contains(&status),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    To(WorkOrderStatus),
    Unchanged,
    ChosenFinalStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub action: WorkflowAction,
    pub sources: Sources,
    pub target: Target,
    pub roles: &'static [Role],
    pub availability: Availability,
}

use WorkOrderStatus as S;

const OFFICE: &[Role] = &[Role::Admin, Role::Manager];

const ASSIGN_MASTER: Edge = Edge {
    action: WorkflowAction::AssignMaster,
    sources: Sources::Only(&[S::New]),
    target: Target::To(S::AssignedToMaster),
    roles: OFFICE,
    availability: Availability::Enabled,
};

const ASSIGN_EXECUTOR: Edge = Edge {
    action: WorkflowAction::AssignExecutor,
    sources: Sources::Any,
    target: Target::To(S::AssignedToExecutor),
    roles: &[Role::Admin, Role::Manager, Role::Master],
    availability: Availability::Enabled,
};

const START: Edge = Edge {
    action: WorkflowAction::Start,
    sources: Sources::Only(&[S::AssignedToExecutor, S::ReturnedForRevision, S::InProgress]),
    target: Target::To(S::InProgress),
    roles: &[Role::Admin, Role::Manager, Role::Executor],
    availability: Availability::Enabled,
};

const SUBMIT_REVIEW: Edge = Edge {
    action: WorkflowAction::SubmitReview,
    sources: Sources::Any,
    target: Target::Unchanged,
    roles: &[Role::Executor],
    availability: Availability::Enabled,
};

const APPROVE: Edge = Edge {
    action: WorkflowAction::Approve,
    sources: Sources::Only(&[S::UnderReview]),
    target: Target::To(S::Approved),
    roles: OFFICE,
    availability: Availability::NotYetEnabled,
};

const REQUEST_REVISION: Edge = Edge {
    action: WorkflowAction::RequestRevision,
    sources: Sources::Only(&[S::UnderReview]),
    target: Target::To(S::ReturnedForRevision),
    roles: OFFICE,
    availability: Availability::NotYetEnabled,
};

const COMPLETE: Edge = Edge {
    action: WorkflowAction::Complete,
    sources: Sources::NotCompleted,
    target: Target::ChosenFinalStage,
    roles: &[Role::Admin, Role::Manager, Role::Master],
    availability: Availability::Enabled,
};

pub fn edge(action: WorkflowAction) -> &'static Edge {
    match action {
        WorkflowAction::AssignMaster => &ASSIGN_MASTER,
        WorkflowAction::AssignExecutor => &ASSIGN_EXECUTOR,
        WorkflowAction::Start => &START,
        WorkflowAction::SubmitReview => &SUBMIT_REVIEW,
        WorkflowAction::Approve => &APPROVE,
        WorkflowAction::RequestRevision => &REQUEST_REVISION,
        WorkflowAction::Complete => &COMPLETE,
    }
}

/// Verifica papel, dono e estado de origem. Nada é alterado aqui.
/// `owns_assignment`: o chamador tem ao menos uma atribuição nesta OS.
pub fn authorize(
    action: WorkflowAction,
    order: &WorkOrder,
    caller: &Caller,
    owns_assignment: bool,
) -> Result<&'static Edge, AppError> {
    let edge = edge(action);

    if edge.availability == Availability::NotYetEnabled {
        return Err(AppError::Forbidden(format!("a transição {:?} ainda não está habilitada", action)));
    }

    if !edge.roles.contains(&caller.role) {
        return Err(AppError::Forbidden(format!("o papel {:?} não pode executar {:?}", caller.role, action)));
    }

    let is_order_master = order.master_id == Some(caller.id);
    match (action, caller.role) {
        (WorkflowAction::Start | WorkflowAction::SubmitReview, Role::Executor) if !owns_assignment => {
            return Err(AppError::Forbidden("o executor não tem atribuições nesta OS".into()));
        }
        (WorkflowAction::AssignExecutor, Role::Master) if !is_order_master => {
            return Err(AppError::Forbidden("apenas o mestre da OS pode designar executores".into()));
        }
        (WorkflowAction::Complete, Role::Master)
            if !(is_order_master && order.status == S::AssignedToMaster) =>
        {
            return Err(AppError::Forbidden(
                "o mestre só conclui OS atribuídas a ele e aguardando o mestre".into(),
            ));
        }
        _ => {}
    }

    if !edge.sources.admits(order.status) {
        return Err(AppError::Forbidden(format!(
            "{:?} não é permitido a partir do status {:?}",
            edge.action, order.status
        )));
    }

    Ok(edge)
}

/// Status de destino de uma aresta já autorizada.
pub fn target_status(
    edge: &Edge,
    current: WorkOrderStatus,
    final_stage: Option<FinalStage>,
) -> Result<WorkOrderStatus, AppError> {
    match edge.target {
        Target::To(status) => Ok(status),
        Target::Unchanged => Ok(current),
        Target::ChosenFinalStage => final_stage
            .map(WorkOrderStatus::from)
            .ok_or_else(|| AppError::InvalidInput("finalStage é obrigatório".into())),
    }
}
