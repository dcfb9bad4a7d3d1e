// src/models/assignment.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::structured::BodyPartKind;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "work_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkType {
    ArmaturaDismantling,
    ArmaturaDisassembly,
    ArmaturaAssembly,
    ArmaturaMounting,
    ArmaturaAdditional,
    FixedBrakeCaliperRemove,
    FixedBrakeCaliperInstall,
    FixedWheelsRemove,
    FixedWheelsInstall,
    BodyPart,
    ServiceFilm,
    ServiceDryCleaning,
    ServicePolishing,
    ServiceWheelPainting,
    ServiceWheelMounting,
    ServiceCarbon,
    ServiceSoundproofing,
    ServiceBonus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "service_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    Film,
    DryCleaning,
    Polishing,
    WheelPainting,
    Carbon,
    Soundproofing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    Done,
}

// --- Metadata ---

/// Cópia do registro que originou a atribuição (peça / carbono).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentDetails {
    #[serde(rename_all = "camelCase")]
    BodyPart {
        part: BodyPartKind,
        quantity: u32,
        actual_quantity: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        letter_count: Option<u32>,
    },
    #[serde(rename_all = "camelCase")]
    Carbon {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stage: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskMetadata {
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<AssignmentDetails>,
}

impl TaskMetadata {
    pub fn with_details(details: AssignmentDetails) -> Self {
        Self {
            details: Some(details),
            ..Default::default()
        }
    }
}

// --- Atribuições ---

/// Atribuição candidata, saída pura do deriver (ainda sem OS/id).
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateAssignment {
    pub executor_id: i64,
    pub work_type: WorkType,
    pub service_type: Option<ServiceType>,
    pub amount: Decimal,
    pub description: String,
    pub metadata: TaskMetadata,
}

// O que sai do banco (Tabela work_order_executors)
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Assignment {
    pub id: i64,
    pub work_order_id: i64,
    pub executor_id: i64,
    pub work_type: WorkType,
    pub service_type: Option<ServiceType>,
    pub amount: Decimal,
    pub description: String,
    #[sqlx(json)]
    pub metadata: TaskMetadata,
    pub is_paid: bool,
    pub paid_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    pub fn is_done(&self) -> bool {
        self.metadata.status == TaskStatus::Done
    }

    pub fn outstanding(&self) -> Decimal {
        (self.amount - self.paid_amount).max(Decimal::ZERO)
    }
}
