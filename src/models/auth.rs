// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::rbac::Permission;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Manager,
    Master,
    Executor,
}

/// Quem está chamando o motor: vem do provedor de identidade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: i64,
    pub role: Role,
}

impl Caller {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.role.has(permission)
    }

    pub fn can_view_finance(&self) -> bool {
        self.can(Permission::WorkOrdersViewFinance)
    }
}

// Estrutura de dados ("claims") dentro do JWT emitido pelo serviço de identidade
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,   // Subject (ID do usuário)
    pub role: Role,
    pub exp: usize, // Expiration time
}
