// src/services/deriver.rs
//
// Expande a entrada estruturada da OS nas atribuições pagáveis por executor.
// Puro e determinístico: mesma entrada + mesmo total => mesma lista.

use rust_decimal::Decimal;

use crate::{
    models::{
        assignment::{AssignmentDetails, CandidateAssignment, TaskMetadata, WorkType},
        structured::{
            AdditionalService, ArmaturaExecutors, ArmaturaStage, BodyPartKind, BodyPartsData,
            FixedServices, FixedTask, ServiceKind, ServicesData, WorkInput,
        },
    },
    services::pricing,
};

/// Deriva as candidatas de todos os grupos presentes em `input`.
/// Categorias sem executor, com quantidade zero ou serviço sem valor são
/// ignoradas sem erro.
pub fn derive(input: &WorkInput, total_amount: Decimal) -> Vec<CandidateAssignment> {
    let mut out = Vec::new();

    if let Some(armatura) = &input.armatura_executors {
        derive_armatura(armatura, total_amount, &mut out);
    }
    if let Some(fixed) = &input.fixed_services {
        derive_fixed(fixed, &mut out);
    }
    if let Some(parts) = &input.body_parts_data {
        derive_body_parts(parts, &mut out);
    }
    if let Some(services) = &input.services_data {
        derive_services(services, &mut out);
    }
    if let Some(additional) = &input.additional_services {
        derive_additional(additional, &mut out);
    }

    out
}

fn derive_armatura(executors: &ArmaturaExecutors, total_amount: Decimal, out: &mut Vec<CandidateAssignment>) {
    for stage in ArmaturaStage::ALL {
        let Some(executor_id) = executors.executor(stage) else {
            continue;
        };
        out.push(CandidateAssignment {
            executor_id,
            work_type: stage.work_type(),
            service_type: None,
            amount: pricing::armatura_amount(stage, total_amount),
            description: stage.description().to_string(),
            metadata: TaskMetadata::default(),
        });
    }
}

fn derive_fixed(fixed: &FixedServices, out: &mut Vec<CandidateAssignment>) {
    for task in FixedTask::ALL {
        let Some(executor_id) = fixed.executor(task) else {
            continue;
        };
        out.push(CandidateAssignment {
            executor_id,
            work_type: task.work_type(),
            service_type: None,
            amount: pricing::fixed_amount(task),
            description: task.description().to_string(),
            metadata: TaskMetadata::default(),
        });
    }
}

fn derive_body_parts(parts: &BodyPartsData, out: &mut Vec<CandidateAssignment>) {
    for kind in BodyPartKind::ALL {
        let Some(entry) = parts.entry(kind) else {
            continue;
        };
        let (Some(executor_id), Some(quantity)) = (entry.executor_id, entry.quantity) else {
            continue;
        };
        if quantity == 0 {
            continue;
        }

        let letter_count = match kind {
            BodyPartKind::Inscriptions => entry.letter_count,
            _ => None,
        };
        let details = AssignmentDetails::BodyPart {
            part: kind,
            quantity,
            actual_quantity: entry.actual_quantity.unwrap_or(quantity),
            letter_count,
        };

        out.push(CandidateAssignment {
            executor_id,
            work_type: WorkType::BodyPart,
            service_type: None,
            amount: pricing::body_part_amount(quantity),
            description: kind.key().to_string(),
            metadata: TaskMetadata::with_details(details),
        });
    }
}

fn derive_services(services: &ServicesData, out: &mut Vec<CandidateAssignment>) {
    for kind in ServiceKind::ALL {
        // Perna sem valor não vira atribuição de valor zero
        let Some((Some(executor_id), Some(amount))) = services.leg(kind) else {
            continue;
        };

        let metadata = match (kind, &services.carbon) {
            (ServiceKind::Carbon, Some(carbon)) => TaskMetadata::with_details(AssignmentDetails::Carbon {
                stage: carbon.stage.clone(),
                comment: carbon.comment.clone(),
            }),
            _ => TaskMetadata::default(),
        };

        out.push(CandidateAssignment {
            executor_id,
            work_type: kind.work_type(),
            service_type: kind.service_type(),
            amount,
            description: kind.description().to_string(),
            metadata,
        });
    }
}

fn derive_additional(additional: &[AdditionalService], out: &mut Vec<CandidateAssignment>) {
    for service in additional {
        let name = service.name.as_deref().map(str::trim).unwrap_or_default();
        let (Some(executor_id), Some(amount)) = (service.executor_id, service.amount) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        out.push(CandidateAssignment {
            executor_id,
            work_type: WorkType::ArmaturaAdditional,
            service_type: None,
            amount,
            description: name.to_string(),
            metadata: TaskMetadata::default(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        assignment::{ServiceType, TaskStatus},
        structured::{BodyPartEntry, CarbonEntry, ServiceEntry, SideExecutors, WheelPaintingEntry},
    };

    fn total(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn armature_only_order() {
        let input = WorkInput {
            armatura_executors: Some(ArmaturaExecutors {
                dismantling: Some(5),
                ..Default::default()
            }),
            ..Default::default()
        };

        let derived = derive(&input, total(10_000));

        assert_eq!(derived.len(), 1);
        let a = &derived[0];
        assert_eq!(a.work_type, WorkType::ArmaturaDismantling);
        assert_eq!(a.executor_id, 5);
        assert_eq!(a.amount, Decimal::from(700));
        assert_eq!(a.description, "Демонтаж");
        assert_eq!(a.metadata.status, TaskStatus::Pending);
    }

    #[test]
    fn body_part_row() {
        let input = WorkInput {
            body_parts_data: Some(BodyPartsData {
                fenders: Some(BodyPartEntry {
                    executor_id: Some(7),
                    quantity: Some(3),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let derived = derive(&input, total(50_000));

        assert_eq!(derived.len(), 1);
        let a = &derived[0];
        assert_eq!(a.work_type, WorkType::BodyPart);
        assert_eq!(a.executor_id, 7);
        assert_eq!(a.amount, Decimal::from(1200));
        assert_eq!(a.description, "fenders");
        assert_eq!(
            a.metadata.details,
            Some(AssignmentDetails::BodyPart {
                part: BodyPartKind::Fenders,
                quantity: 3,
                actual_quantity: 3,
                letter_count: None,
            })
        );
    }

    #[test]
    fn inscriptions_carry_letter_count() {
        let input = WorkInput {
            body_parts_data: Some(BodyPartsData {
                inscriptions: Some(BodyPartEntry {
                    executor_id: Some(2),
                    quantity: Some(1),
                    actual_quantity: None,
                    letter_count: Some(8),
                }),
                badges: Some(BodyPartEntry {
                    executor_id: Some(2),
                    quantity: Some(2),
                    actual_quantity: Some(1),
                    letter_count: Some(99),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let derived = derive(&input, total(0));
        assert_eq!(derived.len(), 2);

        // A ordem segue BodyPartKind::ALL: badges antes de inscriptions
        match &derived[0].metadata.details {
            Some(AssignmentDetails::BodyPart { part, actual_quantity, letter_count, .. }) => {
                assert_eq!(*part, BodyPartKind::Badges);
                assert_eq!(*actual_quantity, 1);
                assert_eq!(*letter_count, None);
            }
            other => panic!("unexpected details: {:?}", other),
        }
        match &derived[1].metadata.details {
            Some(AssignmentDetails::BodyPart { letter_count, .. }) => assert_eq!(*letter_count, Some(8)),
            other => panic!("unexpected details: {:?}", other),
        }
    }

    #[test]
    fn ad_hoc_addition() {
        let input = WorkInput {
            additional_services: Some(vec![
                AdditionalService {
                    name: Some("Тонировка".into()),
                    executor_id: Some(9),
                    amount: Some(Decimal::from(1500)),
                },
                // Sem nome: ignorado
                AdditionalService {
                    name: Some("  ".into()),
                    executor_id: Some(9),
                    amount: Some(Decimal::from(100)),
                },
                // Sem valor: ignorado
                AdditionalService {
                    name: Some("Мойка".into()),
                    executor_id: Some(9),
                    amount: None,
                },
            ]),
            ..Default::default()
        };

        let derived = derive(&input, total(10_000));

        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].work_type, WorkType::ArmaturaAdditional);
        assert_eq!(derived[0].executor_id, 9);
        assert_eq!(derived[0].amount, Decimal::from(1500));
        assert_eq!(derived[0].description, "Тонировка");
    }

    #[test]
    fn missing_executor_or_zero_quantity_is_skipped() {
        let input = WorkInput {
            armatura_executors: Some(ArmaturaExecutors::default()),
            fixed_services: Some(FixedServices {
                wheels: Some(SideExecutors::default()),
                brake_calipers: None,
            }),
            body_parts_data: Some(BodyPartsData {
                grille: Some(BodyPartEntry {
                    executor_id: Some(3),
                    quantity: Some(0),
                    ..Default::default()
                }),
                railings: Some(BodyPartEntry {
                    executor_id: None,
                    quantity: Some(2),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            services_data: Some(ServicesData {
                film: Some(ServiceEntry {
                    executor_id: None,
                    amount: Some(Decimal::from(9000)),
                }),
                ..Default::default()
            }),
            additional_services: Some(vec![]),
        };

        assert!(derive(&input, total(10_000)).is_empty());
    }

    #[test]
    fn service_leg_without_amount_is_skipped() {
        let input = WorkInput {
            services_data: Some(ServicesData {
                film: Some(ServiceEntry {
                    executor_id: Some(8),
                    amount: None,
                }),
                wheel_painting: Some(WheelPaintingEntry {
                    executor_id: Some(2),
                    amount: Some(Decimal::from(3000)),
                    mounting: Some(ServiceEntry {
                        executor_id: Some(4),
                        amount: None,
                    }),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let derived = derive(&input, total(10_000));

        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].work_type, WorkType::ServiceWheelPainting);
        assert_eq!(derived[0].amount, Decimal::from(3000));
        assert!(derived.iter().all(|a| a.amount > Decimal::ZERO));
    }

    #[test]
    fn fixed_services_are_flat() {
        let input = WorkInput {
            fixed_services: Some(FixedServices {
                brake_calipers: Some(SideExecutors {
                    remove_executor_id: Some(1),
                    install_executor_id: Some(2),
                }),
                wheels: Some(SideExecutors {
                    remove_executor_id: Some(3),
                    install_executor_id: None,
                }),
            }),
            ..Default::default()
        };

        let derived = derive(&input, total(1_000_000));
        let amounts: Vec<(WorkType, Decimal)> = derived.iter().map(|a| (a.work_type, a.amount)).collect();
        assert_eq!(
            amounts,
            vec![
                (WorkType::FixedBrakeCaliperRemove, Decimal::from(2500)),
                (WorkType::FixedBrakeCaliperInstall, Decimal::from(2500)),
                (WorkType::FixedWheelsRemove, Decimal::from(500)),
            ]
        );
    }

    #[test]
    fn services_use_stated_amounts_and_independent_wheel_legs() {
        let input = WorkInput {
            services_data: Some(ServicesData {
                wheel_painting: Some(WheelPaintingEntry {
                    executor_id: None,
                    amount: Some(Decimal::from(4000)),
                    mounting: Some(ServiceEntry {
                        executor_id: Some(11),
                        amount: Some(Decimal::from(800)),
                    }),
                }),
                carbon: Some(CarbonEntry {
                    executor_id: Some(12),
                    amount: Some(Decimal::from(15_000)),
                    stage: Some("капот".into()),
                    comment: None,
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let derived = derive(&input, total(10_000));

        assert_eq!(derived.len(), 2);
        assert_eq!(derived[0].work_type, WorkType::ServiceWheelMounting);
        assert_eq!(derived[0].service_type, Some(ServiceType::WheelPainting));
        assert_eq!(derived[0].amount, Decimal::from(800));

        assert_eq!(derived[1].work_type, WorkType::ServiceCarbon);
        assert_eq!(derived[1].amount, Decimal::from(15_000));
        assert_eq!(
            derived[1].metadata.details,
            Some(AssignmentDetails::Carbon {
                stage: Some("капот".into()),
                comment: None,
            })
        );
    }

    #[test]
    fn derivation_is_deterministic_and_only_armature_follows_total() {
        let input = WorkInput {
            armatura_executors: Some(ArmaturaExecutors {
                dismantling: Some(1),
                disassembly: Some(2),
                assembly: Some(3),
                mounting: Some(4),
            }),
            services_data: Some(ServicesData {
                polishing: Some(ServiceEntry {
                    executor_id: Some(5),
                    amount: Some(Decimal::from(3000)),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        assert_eq!(derive(&input, total(12_345)), derive(&input, total(12_345)));

        let low = derive(&input, total(10_000));
        let high = derive(&input, total(20_000));
        let rates = [7, 3, 3, 7];
        for (i, rate) in rates.iter().enumerate() {
            assert_eq!(low[i].amount, Decimal::from(100 * rate));
            assert_eq!(high[i].amount, Decimal::from(200 * rate));
        }
        assert_eq!(low[4].amount, high[4].amount);
    }
}
