// src/handlers/assignments.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermViewFinance, RequirePermission},
    },
    models::{
        assignment::TaskStatus,
        views::{AssignmentView, ExecutorPayroll, WorkOrderView},
    },
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusPayload {
    #[schema(example = "DONE")]
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    #[schema(example = "350.00")]
    pub amount: Decimal,
}

// PATCH /api/assignments/{id}/status
#[utoipa::path(
    patch,
    path = "/api/assignments/{id}/status",
    tag = "Assignments",
    params(("id" = i64, Path, description = "ID da atribuição")),
    request_body = TaskStatusPayload,
    responses(
        (status = 200, description = "Tarefa concluída; devolve a OS", body = WorkOrderView),
        (status = 404, description = "Atribuição inexistente ou de outro executor")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_task_status(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<TaskStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .work_order_service
        .update_task_status(&caller, id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(order))
}

// POST /api/assignments/{id}/payments
#[utoipa::path(
    post,
    path = "/api/assignments/{id}/payments",
    tag = "Payroll",
    params(("id" = i64, Path, description = "ID da atribuição")),
    request_body = PaymentPayload,
    responses(
        (status = 200, description = "Pagamento registrado", body = AssignmentView),
        (status = 400, description = "Valor inválido ou acima do saldo")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    _guard: RequirePermission<PermViewFinance>,
    Path(id): Path<i64>,
    Json(payload): Json<PaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let assignment = app_state
        .work_order_service
        .record_payment(&caller, id, payload.amount)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(assignment))
}

// GET /api/payroll/executors/{id}
#[utoipa::path(
    get,
    path = "/api/payroll/executors/{id}",
    tag = "Payroll",
    params(("id" = i64, Path, description = "ID do executor")),
    responses((status = 200, description = "Ganho, pago e saldo do executor", body = ExecutorPayroll)),
    security(("api_jwt" = []))
)]
pub async fn executor_payroll(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    _guard: RequirePermission<PermViewFinance>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let payroll = app_state
        .work_order_service
        .executor_payroll(&caller, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(payroll))
}
