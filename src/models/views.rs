// src/models/views.rs
//
// O que de fato vai para o cliente. Só é construído pela redação
// (services::redaction), nunca direto a partir das linhas do banco.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{
    assignment::{ServiceType, TaskMetadata, WorkType},
    structured::{AdditionalService, ArmaturaExecutors, BodyPartsData, FixedServices, ServicesData},
    work_order::{CarCondition, PaymentMethod, WorkOrderStatus},
};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentView {
    pub id: i64,
    pub work_order_id: i64,
    pub executor_id: i64,
    pub work_type: WorkType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceType>,
    pub description: String,
    pub metadata: TaskMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "700.00")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_paid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LegacyArmaturaView {
    pub dismantling: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dismantling_price: Option<Decimal>,
    pub disassembly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disassembly_price: Option<Decimal>,
    pub assembly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assembly_price: Option<Decimal>,
    pub mounting: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mounting_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderView {
    pub id: i64,
    #[schema(example = "WO-000123")]
    pub order_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "10000.00")]
    pub total_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
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
    pub legacy: LegacyArmaturaView,
    pub status: WorkOrderStatus,
    pub photos_before: Vec<String>,
    pub photos_after: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub assignments: Vec<AssignmentView>,
}

// Coluna do quadro de carga
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub status: WorkOrderStatus,
    pub orders: Vec<WorkOrderView>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorPayroll {
    pub executor_id: i64,
    pub earned: Decimal,
    pub paid: Decimal,
    pub outstanding: Decimal,
    pub assignments: Vec<AssignmentView>,
}
