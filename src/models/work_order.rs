// src/models/work_order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::models::structured::{
    AdditionalService, ArmaturaExecutors, BodyPartsData, FixedServices, ServicesData, WorkInput,
};

// --- Enums ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cash,
    NonCash,
    WithoutVat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "car_condition", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CarCondition {
    New,
    #[default]
    Used,
}

// A ordem das variantes é a ordem das colunas do quadro (kanban)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "work_order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderStatus {
    New,
    AssignedToMaster,
    AssignedToExecutor,
    InProgress,
    UnderReview,
    Approved,
    ReturnedForRevision,
    Assembled,
    Sent,
    Issued,
}

impl WorkOrderStatus {
    pub const ALL: [WorkOrderStatus; 10] = [
        WorkOrderStatus::New,
        WorkOrderStatus::AssignedToMaster,
        WorkOrderStatus::AssignedToExecutor,
        WorkOrderStatus::InProgress,
        WorkOrderStatus::UnderReview,
        WorkOrderStatus::Approved,
        WorkOrderStatus::ReturnedForRevision,
        WorkOrderStatus::Assembled,
        WorkOrderStatus::Sent,
        WorkOrderStatus::Issued,
    ];

    /// Montado / enviado / entregue contam como concluídos nos relatórios.
    pub fn is_completed(self) -> bool {
        matches!(
            self,
            WorkOrderStatus::Assembled | WorkOrderStatus::Sent | WorkOrderStatus::Issued
        )
    }
}

/// Estágio final escolhido por quem conclui a OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalStage {
    Assembled,
    Sent,
    Issued,
}

impl From<FinalStage> for WorkOrderStatus {
    fn from(stage: FinalStage) -> Self {
        match stage {
            FinalStage::Assembled => WorkOrderStatus::Assembled,
            FinalStage::Sent => WorkOrderStatus::Sent,
            FinalStage::Issued => WorkOrderStatus::Issued,
        }
    }
}

// --- Projeção legada ---

/// Colunas planas antigas (bool + preço por etapa da armatura).
/// Sempre recalculadas a partir de `armatura_executors`, nunca editadas direto.
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct LegacyArmatura {
    pub dismantling: bool,
    pub dismantling_price: Decimal,
    pub disassembly: bool,
    pub disassembly_price: Decimal,
    pub assembly: bool,
    pub assembly_price: Decimal,
    pub mounting: bool,
    pub mounting_price: Decimal,
}

// --- Structs de Operação ---

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct WorkOrder {
    pub id: i64,
    pub order_number: String,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub manager_id: i64,
    pub master_id: Option<i64>,
    pub executor_id: Option<i64>,
    pub request_id: Option<i64>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub car_brand: String,
    pub car_model: String,
    pub vin: Option<String>,
    pub car_condition: CarCondition,
    #[sqlx(json)]
    pub armatura_executors: ArmaturaExecutors,
    #[sqlx(json)]
    pub fixed_services: FixedServices,
    #[sqlx(json)]
    pub body_parts_data: BodyPartsData,
    #[sqlx(json)]
    pub services_data: ServicesData,
    #[sqlx(json)]
    pub additional_services: Vec<AdditionalService>,
    #[sqlx(flatten)]
    pub legacy: LegacyArmatura,
    pub status: WorkOrderStatus,
    pub photos_before: Vec<String>,
    pub photos_after: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl WorkOrder {
    pub fn from_draft(id: i64, order_number: String, draft: WorkOrderDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            order_number,
            total_amount: draft.total_amount,
            payment_method: draft.payment_method,
            manager_id: draft.manager_id,
            master_id: draft.master_id,
            executor_id: draft.executor_id,
            request_id: draft.request_id,
            customer_name: draft.customer_name,
            customer_phone: draft.customer_phone,
            car_brand: draft.car_brand,
            car_model: draft.car_model,
            vin: draft.vin,
            car_condition: draft.car_condition,
            armatura_executors: draft.armatura_executors,
            fixed_services: draft.fixed_services,
            body_parts_data: draft.body_parts_data,
            services_data: draft.services_data,
            additional_services: draft.additional_services,
            legacy: draft.legacy,
            status: draft.status,
            photos_before: draft.photos_before,
            photos_after: draft.photos_after,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
        }
    }

    /// Substitui apenas os grupos presentes no payload.
    pub fn apply_input(&mut self, input: &WorkInput) {
        if let Some(armatura) = &input.armatura_executors {
            self.armatura_executors = armatura.clone();
        }
        if let Some(fixed) = &input.fixed_services {
            self.fixed_services = fixed.clone();
        }
        if let Some(parts) = &input.body_parts_data {
            self.body_parts_data = parts.clone();
        }
        if let Some(services) = &input.services_data {
            self.services_data = services.clone();
        }
        if let Some(additional) = &input.additional_services {
            self.additional_services = additional.clone();
        }
    }
}

/// Dados de uma OS ainda não gravada (sem id, número e datas).
#[derive(Debug, Clone, PartialEq)]
pub struct WorkOrderDraft {
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub manager_id: i64,
    pub master_id: Option<i64>,
    pub executor_id: Option<i64>,
    pub request_id: Option<i64>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub car_brand: String,
    pub car_model: String,
    pub vin: Option<String>,
    pub car_condition: CarCondition,
    pub armatura_executors: ArmaturaExecutors,
    pub fixed_services: FixedServices,
    pub body_parts_data: BodyPartsData,
    pub services_data: ServicesData,
    pub additional_services: Vec<AdditionalService>,
    pub legacy: LegacyArmatura,
    pub status: WorkOrderStatus,
    pub photos_before: Vec<String>,
    pub photos_after: Vec<String>,
}

// --- Payloads ---

fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkOrderPayload {
    #[validate(custom(function = "validate_amount"))]
    #[schema(example = "10000.00")]
    pub total_amount: Decimal,

    #[serde(default)]
    pub payment_method: PaymentMethod,

    pub request_id: Option<i64>,
    pub manager_id: Option<i64>,
    pub master_id: Option<i64>,
    pub executor_id: Option<i64>,

    #[validate(length(max = 200, message = "Nome muito longo."))]
    pub customer_name: Option<String>,
    #[validate(length(max = 32, message = "Telefone muito longo."))]
    pub customer_phone: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Marca inválida."))]
    #[schema(example = "Mercedes-Benz")]
    pub car_brand: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Modelo inválido."))]
    #[schema(example = "G 63")]
    pub car_model: Option<String>,
    #[validate(length(equal = 17, message = "O VIN deve ter 17 caracteres."))]
    pub vin: Option<String>,
    #[serde(default)]
    pub car_condition: CarCondition,

    #[serde(default)]
    pub photos_before: Vec<String>,
    #[serde(default)]
    pub photos_after: Vec<String>,

    #[serde(flatten)]
    pub work: WorkInput,
}

/// Qualquer subconjunto dos campos. Grupos ausentes não são tocados.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkOrderPayload {
    #[validate(custom(function = "validate_amount"))]
    pub total_amount: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,

    #[validate(length(max = 200, message = "Nome muito longo."))]
    pub customer_name: Option<String>,
    #[validate(length(max = 32, message = "Telefone muito longo."))]
    pub customer_phone: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Marca inválida."))]
    pub car_brand: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Modelo inválido."))]
    pub car_model: Option<String>,
    #[validate(length(equal = 17, message = "O VIN deve ter 17 caracteres."))]
    pub vin: Option<String>,
    pub car_condition: Option<CarCondition>,

    pub photos_before: Option<Vec<String>>,
    pub photos_after: Option<Vec<String>>,

    #[serde(flatten)]
    pub work: WorkInput,
}

impl UpdateWorkOrderPayload {
    pub fn touches_finance(&self) -> bool {
        self.total_amount.is_some() || self.payment_method.is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct WorkOrderListQuery {
    pub status: Option<WorkOrderStatus>,
    pub manager_id: Option<i64>,
    pub master_id: Option<i64>,
}

/// Filtro efetivo usado pelo store (a visibilidade é imposta pelo serviço).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkOrderFilter {
    pub status: Option<WorkOrderStatus>,
    pub manager_id: Option<i64>,
    pub master_id: Option<i64>,
    pub visible_to_executor: Option<i64>,
}

impl From<WorkOrderListQuery> for WorkOrderFilter {
    fn from(query: WorkOrderListQuery) -> Self {
        Self {
            status: query.status,
            manager_id: query.manager_id,
            master_id: query.master_id,
            visible_to_executor: None,
        }
    }
}
