// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{common::error::AppError, config::AppState, models::auth::Caller};

// Valida o Bearer e deixa o chamador nos "extensions" da requisição
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::InvalidToken)?;

    let caller = app_state.auth_service.validate_token(bearer.token())?;
    tracing::debug!("Chamador {} ({:?})", caller.id, caller.role);

    request.extensions_mut().insert(AuthenticatedUser(caller));
    Ok(next.run(request).await)
}

// Extrator para obter o chamador autenticado diretamente nos handlers
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Caller);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or(AppError::InvalidToken)
    }
}
