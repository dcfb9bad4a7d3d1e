// src/services/auth.rs
//
// Os tokens são emitidos pelo serviço de identidade; aqui só validamos
// e extraímos quem chama.

use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::{
    common::error::AppError,
    models::auth::{Caller, Claims},
};

#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
}

impl AuthService {
    pub fn new(jwt_secret: String) -> Self {
        Self { jwt_secret }
    }

    pub fn validate_token(&self, token: &str) -> Result<Caller, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!("Token recusado: {}", e);
            AppError::InvalidToken
        })?;

        Ok(Caller::new(token_data.claims.sub, token_data.claims.role))
    }
}
