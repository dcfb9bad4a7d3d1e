// src/services/redaction.rs
//
// Transformação pura de OS + atribuições na visão pública de quem chama.
// Aplicada em toda leitura: lista, item, quadro e ecos após mutações.

use rust_decimal::Decimal;

use crate::models::{
    assignment::Assignment,
    auth::Role,
    structured::AdditionalService,
    views::{AssignmentView, LegacyArmaturaView, WorkOrderView},
    work_order::{LegacyArmatura, WorkOrder},
};

pub fn redact(
    order: &WorkOrder,
    assignments: &[Assignment],
    caller_role: Role,
    caller_id: i64,
    can_view_finance: bool,
) -> WorkOrderView {
    let finance = |value: Decimal| can_view_finance.then_some(value);

    // Executor só enxerga as próprias atribuições, com ou sem financeiro
    let assignments = assignments
        .iter()
        .filter(|a| caller_role != Role::Executor || a.executor_id == caller_id)
        .map(|a| redact_assignment(a, can_view_finance))
        .collect();

    let (services_data, additional_services) = if can_view_finance {
        (order.services_data.clone(), order.additional_services.clone())
    } else {
        (
            order.services_data.without_prices(),
            order
                .additional_services
                .iter()
                .map(|s| AdditionalService { amount: None, ..s.clone() })
                .collect(),
        )
    };

    WorkOrderView {
        id: order.id,
        order_number: order.order_number.clone(),
        total_amount: finance(order.total_amount),
        payment_method: can_view_finance.then_some(order.payment_method),
        manager_id: order.manager_id,
        master_id: order.master_id,
        executor_id: order.executor_id,
        request_id: order.request_id,
        customer_name: order.customer_name.clone(),
        customer_phone: order.customer_phone.clone(),
        car_brand: order.car_brand.clone(),
        car_model: order.car_model.clone(),
        vin: order.vin.clone(),
        car_condition: order.car_condition,
        armatura_executors: order.armatura_executors.clone(),
        fixed_services: order.fixed_services.clone(),
        body_parts_data: order.body_parts_data.clone(),
        services_data,
        additional_services,
        legacy: legacy_view(&order.legacy, can_view_finance),
        status: order.status,
        photos_before: order.photos_before.clone(),
        photos_after: order.photos_after.clone(),
        created_at: order.created_at,
        started_at: order.started_at,
        completed_at: order.completed_at,
        updated_at: order.updated_at,
        assignments,
    }
}

pub fn redact_assignment(assignment: &Assignment, can_view_finance: bool) -> AssignmentView {
    AssignmentView {
        id: assignment.id,
        work_order_id: assignment.work_order_id,
        executor_id: assignment.executor_id,
        work_type: assignment.work_type,
        service_type: assignment.service_type,
        description: assignment.description.clone(),
        metadata: assignment.metadata.clone(),
        amount: can_view_finance.then_some(assignment.amount),
        is_paid: can_view_finance.then_some(assignment.is_paid),
        paid_amount: can_view_finance.then_some(assignment.paid_amount),
    }
}

fn legacy_view(legacy: &LegacyArmatura, can_view_finance: bool) -> LegacyArmaturaView {
    let price = |value: Decimal| can_view_finance.then_some(value);
    LegacyArmaturaView {
        dismantling: legacy.dismantling,
        dismantling_price: price(legacy.dismantling_price),
        disassembly: legacy.disassembly,
        disassembly_price: price(legacy.disassembly_price),
        assembly: legacy.assembly,
        assembly_price: price(legacy.assembly_price),
        mounting: legacy.mounting,
        mounting_price: price(legacy.mounting_price),
    }
}
