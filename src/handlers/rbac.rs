// src/handlers/rbac.rs

use axum::{response::IntoResponse, Json};

use crate::models::rbac::{permission_table, RolePermissions};

// GET /api/permissions (para o frontend saber o que mostrar para cada papel)
#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "RBAC",
    responses(
        (status = 200, description = "Permissões de cada papel", body = Vec<RolePermissions>)
    )
)]
pub async fn list_permissions() -> impl IntoResponse {
    Json(permission_table())
}
