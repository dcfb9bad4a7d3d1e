// src/handlers/work_orders.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermEditAll, RequirePermission},
    },
    models::{
        views::{BoardColumn, WorkOrderView},
        work_order::{CreateWorkOrderPayload, FinalStage, UpdateWorkOrderPayload, WorkOrderListQuery},
    },
};

// =============================================================================
//  1. CRUD
// =============================================================================

// POST /api/work-orders
#[utoipa::path(
    post,
    path = "/api/work-orders",
    tag = "Work Orders",
    request_body = CreateWorkOrderPayload,
    responses(
        (status = 201, description = "OS criada com as atribuições derivadas", body = WorkOrderView),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Sem permissão"),
        (status = 404, description = "Lead ou usuário referenciado não existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    _guard: RequirePermission<PermEditAll>,
    Json(payload): Json<CreateWorkOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .work_order_service
        .create(&caller, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(order)))
}

// GET /api/work-orders
#[utoipa::path(
    get,
    path = "/api/work-orders",
    tag = "Work Orders",
    params(WorkOrderListQuery),
    responses(
        (status = 200, description = "OS visíveis para quem chama (mais recentes primeiro)", body = Vec<WorkOrderView>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_work_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<WorkOrderListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = app_state
        .work_order_service
        .list(&caller, query)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(orders))
}

// GET /api/work-orders/board
#[utoipa::path(
    get,
    path = "/api/work-orders/board",
    tag = "Work Orders",
    responses(
        (status = 200, description = "Quadro de carga, uma coluna por status", body = Vec<BoardColumn>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_board(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let board = app_state
        .work_order_service
        .board(&caller)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(board))
}

// GET /api/work-orders/{id}
#[utoipa::path(
    get,
    path = "/api/work-orders/{id}",
    tag = "Work Orders",
    params(("id" = i64, Path, description = "ID da OS")),
    responses(
        (status = 200, description = "OS com as atribuições visíveis", body = WorkOrderView),
        (status = 404, description = "Não existe ou não é visível")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .work_order_service
        .get(&caller, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(order))
}

// PATCH /api/work-orders/{id}
#[utoipa::path(
    patch,
    path = "/api/work-orders/{id}",
    tag = "Work Orders",
    params(("id" = i64, Path, description = "ID da OS")),
    request_body = UpdateWorkOrderPayload,
    responses(
        (status = 200, description = "OS editada e atribuições reconciliadas", body = WorkOrderView),
        (status = 403, description = "Sem permissão para editar ou para o financeiro")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateWorkOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .work_order_service
        .update(&caller, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(order))
}

// =============================================================================
//  2. FLUXO
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignMasterPayload {
    #[schema(example = 3)]
    pub master_id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignExecutorPayload {
    #[schema(example = 5)]
    pub executor_id: i64,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletePayload {
    #[schema(example = "ISSUED")]
    pub final_stage: Option<FinalStage>,
}

// POST /api/work-orders/{id}/assign-master
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/assign-master",
    tag = "Workflow",
    params(("id" = i64, Path, description = "ID da OS")),
    request_body = AssignMasterPayload,
    responses((status = 200, description = "Mestre designado", body = WorkOrderView)),
    security(("api_jwt" = []))
)]
pub async fn assign_master(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<AssignMasterPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .work_order_service
        .assign_master(&caller, id, payload.master_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(order))
}

// POST /api/work-orders/{id}/assign-executor
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/assign-executor",
    tag = "Workflow",
    params(("id" = i64, Path, description = "ID da OS")),
    request_body = AssignExecutorPayload,
    responses((status = 200, description = "Executor principal designado", body = WorkOrderView)),
    security(("api_jwt" = []))
)]
pub async fn assign_executor(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<AssignExecutorPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .work_order_service
        .assign_executor(&caller, id, payload.executor_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(order))
}

// POST /api/work-orders/{id}/start
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/start",
    tag = "Workflow",
    params(("id" = i64, Path, description = "ID da OS")),
    responses((status = 200, description = "OS em andamento", body = WorkOrderView)),
    security(("api_jwt" = []))
)]
pub async fn start_work(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .work_order_service
        .start(&caller, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(order))
}

// POST /api/work-orders/{id}/submit-review
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/submit-review",
    tag = "Workflow",
    params(("id" = i64, Path, description = "ID da OS")),
    responses((status = 200, description = "Entrega registrada; o status não muda", body = WorkOrderView)),
    security(("api_jwt" = []))
)]
pub async fn submit_review(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .work_order_service
        .submit_review(&caller, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(order))
}

// POST /api/work-orders/{id}/approve
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/approve",
    tag = "Workflow",
    params(("id" = i64, Path, description = "ID da OS")),
    responses((status = 403, description = "Transição ainda não habilitada")),
    security(("api_jwt" = []))
)]
pub async fn approve(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .work_order_service
        .approve(&caller, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(order))
}

// POST /api/work-orders/{id}/request-revision
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/request-revision",
    tag = "Workflow",
    params(("id" = i64, Path, description = "ID da OS")),
    responses((status = 403, description = "Transição ainda não habilitada")),
    security(("api_jwt" = []))
)]
pub async fn request_revision(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .work_order_service
        .request_revision(&caller, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(order))
}

// POST /api/work-orders/{id}/complete
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/complete",
    tag = "Workflow",
    params(("id" = i64, Path, description = "ID da OS")),
    request_body = CompletePayload,
    responses(
        (status = 200, description = "OS concluída no estágio escolhido", body = WorkOrderView),
        (status = 400, description = "finalStage ausente")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<CompletePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .work_order_service
        .complete(&caller, id, payload.final_stage)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(order))
}
