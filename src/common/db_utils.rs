use crate::common::error::AppError;

// ---
// Tradução de erros do Postgres para o vocabulário do domínio
// ---
/// FK violada vira "não encontrado" com o nome da referência,
/// unique violada vira conflito. O resto segue como erro de banco.
pub(crate) fn translate_db_error(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_foreign_key_violation() {
            let reference = reference_from_constraint(db_err.constraint().unwrap_or_default());
            return AppError::NotFound(reference.to_string());
        }
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unique");
            return AppError::Conflict(format!("violação de unicidade: {}", constraint));
        }
    }
    AppError::DatabaseError(e)
}

// Os nomes seguem a convenção padrão do Postgres: <tabela>_<coluna>_fkey
fn reference_from_constraint(constraint: &str) -> &'static str {
    if constraint.contains("manager_id") {
        "manager"
    } else if constraint.contains("master_id") {
        "master"
    } else if constraint.contains("executor_id") {
        "executor"
    } else if constraint.contains("request_id") {
        "request"
    } else if constraint.contains("work_order_id") {
        "work order"
    } else {
        "reference"
    }
}
