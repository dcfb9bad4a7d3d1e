// src/services/pricing.rs
//
// Tabelas de preço da folha de pagamento. Funções puras.

use rust_decimal::Decimal;

use crate::models::{
    structured::{ArmaturaExecutors, ArmaturaStage, FixedTask},
    work_order::LegacyArmatura,
};

/// Tarifa por unidade de peça da carroceria.
pub const BODY_PART_UNIT_RATE: Decimal = Decimal::from_parts(400, 0, 0, false, 0);

const CALIPER_RATE: Decimal = Decimal::from_parts(2500, 0, 0, false, 0);
const WHEEL_RATE: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// Percentual do total da OS por etapa da armatura (7%, 3%, 3%, 7%).
pub fn armatura_rate(stage: ArmaturaStage) -> Decimal {
    match stage {
        ArmaturaStage::Dismantling => Decimal::new(7, 2),
        ArmaturaStage::Disassembly => Decimal::new(3, 2),
        ArmaturaStage::Assembly => Decimal::new(3, 2),
        ArmaturaStage::Mounting => Decimal::new(7, 2),
    }
}

/// Valor da etapa em centavos: NUMERIC(14,2) no banco, arredondamento
/// bancário (meio para o par) na terceira casa.
pub fn armatura_amount(stage: ArmaturaStage, total_amount: Decimal) -> Decimal {
    (total_amount * armatura_rate(stage)).round_dp(2)
}

pub fn fixed_amount(task: FixedTask) -> Decimal {
    match task {
        FixedTask::BrakeCaliperRemove | FixedTask::BrakeCaliperInstall => CALIPER_RATE,
        FixedTask::WheelsRemove | FixedTask::WheelsInstall => WHEEL_RATE,
    }
}

pub fn body_part_amount(quantity: u32) -> Decimal {
    BODY_PART_UNIT_RATE * Decimal::from(quantity)
}

/// Projeção para as colunas planas antigas.
pub fn legacy_projection(executors: &ArmaturaExecutors, total_amount: Decimal) -> LegacyArmatura {
    let leg = |stage: ArmaturaStage| match executors.executor(stage) {
        Some(_) => (true, armatura_amount(stage, total_amount)),
        None => (false, Decimal::ZERO),
    };
    let (dismantling, dismantling_price) = leg(ArmaturaStage::Dismantling);
    let (disassembly, disassembly_price) = leg(ArmaturaStage::Disassembly);
    let (assembly, assembly_price) = leg(ArmaturaStage::Assembly);
    let (mounting, mounting_price) = leg(ArmaturaStage::Mounting);

    LegacyArmatura {
        dismantling,
        dismantling_price,
        disassembly,
        disassembly_price,
        assembly,
        assembly_price,
        mounting,
        mounting_price,
    }
}
