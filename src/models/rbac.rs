// src/models/rbac.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::auth::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    RequestsViewAll,
    RequestsProcess,
    WorkOrdersViewAll,
    WorkOrdersViewOwn,
    WorkOrdersEditAll,
    WorkOrdersEditAssigned,
    WorkOrdersViewFinance,
    WorkOrdersChangeStatus,
}

use Permission::*;

const ADMIN_PERMISSIONS: &[Permission] = &[
    RequestsViewAll,
    RequestsProcess,
    WorkOrdersViewAll,
    WorkOrdersViewOwn,
    WorkOrdersEditAll,
    WorkOrdersEditAssigned,
    WorkOrdersViewFinance,
    WorkOrdersChangeStatus,
];

const MANAGER_PERMISSIONS: &[Permission] = &[
    RequestsViewAll,
    RequestsProcess,
    WorkOrdersViewAll,
    WorkOrdersEditAll,
    WorkOrdersViewFinance,
    WorkOrdersChangeStatus,
];

const MASTER_PERMISSIONS: &[Permission] = &[
    WorkOrdersViewAll,
    WorkOrdersEditAssigned,
    WorkOrdersChangeStatus,
];

const EXECUTOR_PERMISSIONS: &[Permission] = &[WorkOrdersViewOwn];

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Manager, Role::Master, Role::Executor];

    pub fn permissions(self) -> &'static [Permission] {
        match self {
            Role::Admin => ADMIN_PERMISSIONS,
            Role::Manager => MANAGER_PERMISSIONS,
            Role::Master => MASTER_PERMISSIONS,
            Role::Executor => EXECUTOR_PERMISSIONS,
        }
    }

    pub fn has(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

// Resposta do GET /api/permissions (o frontend decide o que mostrar)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RolePermissions {
    pub role: Role,
    pub permissions: Vec<Permission>,
}

pub fn permission_table() -> Vec<RolePermissions> {
    Role::ALL
        .iter()
        .map(|role| RolePermissions {
            role: *role,
            permissions: role.permissions().to_vec(),
        })
        .collect()
}
