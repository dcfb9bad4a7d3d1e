// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Work Orders ---
        handlers::work_orders::create_work_order,
        handlers::work_orders::list_work_orders,
        handlers::work_orders::get_board,
        handlers::work_orders::get_work_order,
        handlers::work_orders::update_work_order,

        // --- Workflow ---
        handlers::work_orders::assign_master,
        handlers::work_orders::assign_executor,
        handlers::work_orders::start_work,
        handlers::work_orders::submit_review,
        handlers::work_orders::approve,
        handlers::work_orders::request_revision,
        handlers::work_orders::complete,

        // --- Assignments / Payroll ---
        handlers::assignments::update_task_status,
        handlers::assignments::record_payment,
        handlers::assignments::executor_payroll,

        // --- RBAC ---
        handlers::rbac::list_permissions,
    ),
    components(
        schemas(
            // --- Work Orders ---
            models::work_order::PaymentMethod,
            models::work_order::CarCondition,
            models::work_order::WorkOrderStatus,
            models::work_order::FinalStage,
            models::work_order::CreateWorkOrderPayload,
            models::work_order::UpdateWorkOrderPayload,
            models::views::WorkOrderView,
            models::views::LegacyArmaturaView,
            models::views::BoardColumn,

            // --- Entrada estruturada ---
            models::structured::ArmaturaExecutors,
            models::structured::SideExecutors,
            models::structured::FixedServices,
            models::structured::BodyPartKind,
            models::structured::BodyPartEntry,
            models::structured::BodyPartsData,
            models::structured::ServiceEntry,
            models::structured::WheelPaintingEntry,
            models::structured::CarbonEntry,
            models::structured::ServicesData,
            models::structured::AdditionalService,

            // --- Assignments ---
            models::assignment::WorkType,
            models::assignment::ServiceType,
            models::assignment::TaskStatus,
            models::assignment::TaskMetadata,
            models::assignment::AssignmentDetails,
            models::views::AssignmentView,
            models::views::ExecutorPayroll,

            // --- RBAC ---
            models::auth::Role,
            models::rbac::Permission,
            models::rbac::RolePermissions,

            // --- Payloads ---
            handlers::work_orders::AssignMasterPayload,
            handlers::work_orders::AssignExecutorPayload,
            handlers::work_orders::CompletePayload,
            handlers::assignments::TaskStatusPayload,
            handlers::assignments::PaymentPayload,
        )
    ),
    tags(
        (name = "Work Orders", description = "Ordens de serviço e atribuições derivadas"),
        (name = "Workflow", description = "Transições de status"),
        (name = "Assignments", description = "Tarefas dos executores"),
        (name = "Payroll", description = "Pagamentos e folha dos executores"),
        (name = "RBAC", description = "Papéis e permissões")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
