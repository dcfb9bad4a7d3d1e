use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::middleware::i18n::Locale;

// Erros de domínio. O motor só classifica; quem formata a resposta é o ApiError.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Dados inválidos: {0}")]
    InvalidInput(String),

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    #[error("Não encontrado: {0}")]
    NotFound(String),

    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// Resposta HTTP de erro (o que o cliente vê)
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidToken | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Converte o erro de domínio na resposta localizada.
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let status = self.status();
        let lang = locale.0.as_str();

        let (error, details) = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                (message(lang, "validation"), Some(Value::Object(details)))
            }
            AppError::InvalidInput(reason) => (message(lang, "validation"), Some(json!(reason))),
            AppError::Forbidden(reason) => (message(lang, "forbidden"), Some(json!(reason))),
            AppError::NotFound(what) => (format!("{}: {}", message(lang, "not_found"), what), None),
            AppError::Conflict(reason) => (message(lang, "conflict"), Some(json!(reason))),
            AppError::InvalidToken | AppError::JwtError(_) => (message(lang, "token"), None),
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (message(lang, "internal"), None)
            }
        };

        ApiError { status, error, details }
    }
}

// Fora dos handlers (middleware) não há Locale: usa o idioma padrão
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

fn message(lang: &str, key: &str) -> String {
    let text = match (lang, key) {
        ("en", "validation") => "One or more fields are invalid.",
        ("en", "forbidden") => "You are not allowed to perform this action.",
        ("en", "not_found") => "Not found",
        ("en", "conflict") => "The resource already exists.",
        ("en", "token") => "Invalid or missing authentication token.",
        ("en", _) => "An unexpected error occurred.",

        ("pt", "validation") => "Um ou mais campos são inválidos.",
        ("pt", "forbidden") => "Você não tem permissão para esta ação.",
        ("pt", "not_found") => "Não encontrado",
        ("pt", "conflict") => "O recurso já existe.",
        ("pt", "token") => "Token de autenticação inválido ou ausente.",
        ("pt", _) => "Ocorreu um erro inesperado.",

        (_, "validation") => "Одно или несколько полей заполнены неверно.",
        (_, "forbidden") => "Недостаточно прав для этого действия.",
        (_, "not_found") => "Не найдено",
        (_, "conflict") => "Такая запись уже существует.",
        (_, "token") => "Неверный или отсутствующий токен авторизации.",
        (_, _) => "Произошла непредвиденная ошибка.",
    };
    text.to_string()
}
