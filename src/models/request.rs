// src/models/request.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

// Lead vindo do formulário público. Aqui só lemos o que a OS herda.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: i64,
    pub manager_id: Option<i64>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub car_brand: Option<String>,
    pub car_model: Option<String>,
    pub created_at: DateTime<Utc>,
}
