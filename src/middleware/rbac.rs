// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::rbac::Permission,
};

/// Marca de tipo para uma permissão exigida na rota.
pub trait PermissionDef: Send + Sync + 'static {
    fn permission() -> Permission;
}

/// Guardião: rejeita antes do handler se o papel não tem a permissão.
/// A tabela papel -> permissões é estática (models::rbac).
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();

        let AuthenticatedUser(caller) = parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale))?;

        let required = T::permission();
        if !caller.can(required) {
            return Err(AppError::Forbidden(format!("{:?} exige {:?}", caller.role, required))
                .to_api_error(&locale));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// PERMISSÕES USADAS NAS ROTAS
// ---

pub struct PermEditAll;
impl PermissionDef for PermEditAll {
    fn permission() -> Permission { Permission::WorkOrdersEditAll }
}

pub struct PermViewFinance;
impl PermissionDef for PermViewFinance {
    fn permission() -> Permission { Permission::WorkOrdersViewFinance }
}
