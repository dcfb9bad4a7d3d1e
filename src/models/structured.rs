// src/models/structured.rs
//
// Entrada estruturada da OS: o que foi feito no carro e por quem.
// O JSON continua "solto" na borda (ver serde_helpers), mas aqui dentro
// cada categoria é um tipo fechado e o deriver faz match exaustivo.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::serde_helpers::{opt_count, opt_decimal, opt_id};
use crate::models::assignment::{ServiceType, WorkType};

// =============================================================================
//  ARMATURA (percentual do total)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmaturaStage {
    Dismantling,
    Disassembly,
    Assembly,
    Mounting,
}

impl ArmaturaStage {
    pub const ALL: [ArmaturaStage; 4] = [
        ArmaturaStage::Dismantling,
        ArmaturaStage::Disassembly,
        ArmaturaStage::Assembly,
        ArmaturaStage::Mounting,
    ];

    pub fn work_type(self) -> WorkType {
        match self {
            ArmaturaStage::Dismantling => WorkType::ArmaturaDismantling,
            ArmaturaStage::Disassembly => WorkType::ArmaturaDisassembly,
            ArmaturaStage::Assembly => WorkType::ArmaturaAssembly,
            ArmaturaStage::Mounting => WorkType::ArmaturaMounting,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ArmaturaStage::Dismantling => "Демонтаж",
            ArmaturaStage::Disassembly => "Разборка",
            ArmaturaStage::Assembly => "Сборка",
            ArmaturaStage::Mounting => "Монтаж",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArmaturaExecutors {
    #[serde(default, deserialize_with = "opt_id", skip_serializing_if = "Option::is_none")]
    pub dismantling: Option<i64>,
    #[serde(default, deserialize_with = "opt_id", skip_serializing_if = "Option::is_none")]
    pub disassembly: Option<i64>,
    #[serde(default, deserialize_with = "opt_id", skip_serializing_if = "Option::is_none")]
    pub assembly: Option<i64>,
    #[serde(default, deserialize_with = "opt_id", skip_serializing_if = "Option::is_none")]
    pub mounting: Option<i64>,
}

impl ArmaturaExecutors {
    pub fn executor(&self, stage: ArmaturaStage) -> Option<i64> {
        match stage {
            ArmaturaStage::Dismantling => self.dismantling,
            ArmaturaStage::Disassembly => self.disassembly,
            ArmaturaStage::Assembly => self.assembly,
            ArmaturaStage::Mounting => self.mounting,
        }
    }
}

// =============================================================================
//  SERVIÇOS FIXOS (valor fixo por lado)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedTask {
    BrakeCaliperRemove,
    BrakeCaliperInstall,
    WheelsRemove,
    WheelsInstall,
}

impl FixedTask {
    pub const ALL: [FixedTask; 4] = [
        FixedTask::BrakeCaliperRemove,
        FixedTask::BrakeCaliperInstall,
        FixedTask::WheelsRemove,
        FixedTask::WheelsInstall,
    ];

    pub fn work_type(self) -> WorkType {
        match self {
            FixedTask::BrakeCaliperRemove => WorkType::FixedBrakeCaliperRemove,
            FixedTask::BrakeCaliperInstall => WorkType::FixedBrakeCaliperInstall,
            FixedTask::WheelsRemove => WorkType::FixedWheelsRemove,
            FixedTask::WheelsInstall => WorkType::FixedWheelsInstall,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FixedTask::BrakeCaliperRemove => "Снятие суппортов",
            FixedTask::BrakeCaliperInstall => "Установка суппортов",
            FixedTask::WheelsRemove => "Снятие колёс",
            FixedTask::WheelsInstall => "Установка колёс",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SideExecutors {
    #[serde(default, deserialize_with = "opt_id", skip_serializing_if = "Option::is_none")]
    pub remove_executor_id: Option<i64>,
    #[serde(default, deserialize_with = "opt_id", skip_serializing_if = "Option::is_none")]
    pub install_executor_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FixedServices {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brake_calipers: Option<SideExecutors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wheels: Option<SideExecutors>,
}

impl FixedServices {
    pub fn executor(&self, task: FixedTask) -> Option<i64> {
        match task {
            FixedTask::BrakeCaliperRemove => self.brake_calipers.as_ref()?.remove_executor_id,
            FixedTask::BrakeCaliperInstall => self.brake_calipers.as_ref()?.install_executor_id,
            FixedTask::WheelsRemove => self.wheels.as_ref()?.remove_executor_id,
            FixedTask::WheelsInstall => self.wheels.as_ref()?.install_executor_id,
        }
    }
}

// =============================================================================
//  PEÇAS DA CARROCERIA (quantidade x tarifa)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum BodyPartKind {
    Grille,
    FogLights,
    Fenders,
    DoorHandles,
    Badges,
    Inscriptions,
    HubCaps,
    Railings,
}

impl BodyPartKind {
    pub const ALL: [BodyPartKind; 8] = [
        BodyPartKind::Grille,
        BodyPartKind::FogLights,
        BodyPartKind::Fenders,
        BodyPartKind::DoorHandles,
        BodyPartKind::Badges,
        BodyPartKind::Inscriptions,
        BodyPartKind::HubCaps,
        BodyPartKind::Railings,
    ];

    /// Chave no JSON; também vira a descrição da atribuição.
    pub fn key(self) -> &'static str {
        match self {
            BodyPartKind::Grille => "grille",
            BodyPartKind::FogLights => "fogLights",
            BodyPartKind::Fenders => "fenders",
            BodyPartKind::DoorHandles => "doorHandles",
            BodyPartKind::Badges => "badges",
            BodyPartKind::Inscriptions => "inscriptions",
            BodyPartKind::HubCaps => "hubCaps",
            BodyPartKind::Railings => "railings",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BodyPartEntry {
    #[serde(default, deserialize_with = "opt_id", skip_serializing_if = "Option::is_none")]
    pub executor_id: Option<i64>,
    #[serde(default, deserialize_with = "opt_count", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, deserialize_with = "opt_count", skip_serializing_if = "Option::is_none")]
    pub actual_quantity: Option<u32>,
    // Só faz sentido para "inscriptions"
    #[serde(default, deserialize_with = "opt_count", skip_serializing_if = "Option::is_none")]
    pub letter_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BodyPartsData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grille: Option<BodyPartEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fog_lights: Option<BodyPartEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fenders: Option<BodyPartEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub door_handles: Option<BodyPartEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badges: Option<BodyPartEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inscriptions: Option<BodyPartEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_caps: Option<BodyPartEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub railings: Option<BodyPartEntry>,
}

impl BodyPartsData {
    pub fn entry(&self, kind: BodyPartKind) -> Option<&BodyPartEntry> {
        match kind {
            BodyPartKind::Grille => self.grille.as_ref(),
            BodyPartKind::FogLights => self.fog_lights.as_ref(),
            BodyPartKind::Fenders => self.fenders.as_ref(),
            BodyPartKind::DoorHandles => self.door_handles.as_ref(),
            BodyPartKind::Badges => self.badges.as_ref(),
            BodyPartKind::Inscriptions => self.inscriptions.as_ref(),
            BodyPartKind::HubCaps => self.hub_caps.as_ref(),
            BodyPartKind::Railings => self.railings.as_ref(),
        }
    }
}

// =============================================================================
//  SERVIÇOS NOMEADOS (valor informado pelo gerente)
// =============================================================================

/// Cada "perna" pagável dos serviços nomeados.
/// Pintura de rodas tem duas pernas independentes: a pintura em si e a montagem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Film,
    DryCleaning,
    Polishing,
    WheelPainting,
    WheelMounting,
    Carbon,
    Soundproofing,
    Bonus,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 8] = [
        ServiceKind::Film,
        ServiceKind::DryCleaning,
        ServiceKind::Polishing,
        ServiceKind::WheelPainting,
        ServiceKind::WheelMounting,
        ServiceKind::Carbon,
        ServiceKind::Soundproofing,
        ServiceKind::Bonus,
    ];

    pub fn work_type(self) -> WorkType {
        match self {
            ServiceKind::Film => WorkType::ServiceFilm,
            ServiceKind::DryCleaning => WorkType::ServiceDryCleaning,
            ServiceKind::Polishing => WorkType::ServicePolishing,
            ServiceKind::WheelPainting => WorkType::ServiceWheelPainting,
            ServiceKind::WheelMounting => WorkType::ServiceWheelMounting,
            ServiceKind::Carbon => WorkType::ServiceCarbon,
            ServiceKind::Soundproofing => WorkType::ServiceSoundproofing,
            ServiceKind::Bonus => WorkType::ServiceBonus,
        }
    }

    pub fn service_type(self) -> Option<ServiceType> {
        match self {
            ServiceKind::Film => Some(ServiceType::Film),
            ServiceKind::DryCleaning => Some(ServiceType::DryCleaning),
            ServiceKind::Polishing => Some(ServiceType::Polishing),
            ServiceKind::WheelPainting | ServiceKind::WheelMounting => Some(ServiceType::WheelPainting),
            ServiceKind::Carbon => Some(ServiceType::Carbon),
            ServiceKind::Soundproofing => Some(ServiceType::Soundproofing),
            ServiceKind::Bonus => None,
        }
    }

    /// Caminho da perna dentro de `servicesData`.
    pub fn field(self) -> &'static str {
        match self {
            ServiceKind::Film => "film",
            ServiceKind::DryCleaning => "dryCleaning",
            ServiceKind::Polishing => "polishing",
            ServiceKind::WheelPainting => "wheelPainting",
            ServiceKind::WheelMounting => "wheelPainting.mounting",
            ServiceKind::Carbon => "carbon",
            ServiceKind::Soundproofing => "soundproofing",
            ServiceKind::Bonus => "bonus",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ServiceKind::Film => "Плёнка",
            ServiceKind::DryCleaning => "Химчистка",
            ServiceKind::Polishing => "Полировка",
            ServiceKind::WheelPainting => "Покраска дисков",
            ServiceKind::WheelMounting => "Монтаж дисков",
            ServiceKind::Carbon => "Карбон",
            ServiceKind::Soundproofing => "Шумоизоляция",
            ServiceKind::Bonus => "Бонус",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    #[serde(default, deserialize_with = "opt_id", skip_serializing_if = "Option::is_none")]
    pub executor_id: Option<i64>,
    #[serde(default, deserialize_with = "opt_decimal", skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WheelPaintingEntry {
    #[serde(default, deserialize_with = "opt_id", skip_serializing_if = "Option::is_none")]
    pub executor_id: Option<i64>,
    #[serde(default, deserialize_with = "opt_decimal", skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mounting: Option<ServiceEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarbonEntry {
    #[serde(default, deserialize_with = "opt_id", skip_serializing_if = "Option::is_none")]
    pub executor_id: Option<i64>,
    #[serde(default, deserialize_with = "opt_decimal", skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServicesData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub film: Option<ServiceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_cleaning: Option<ServiceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polishing: Option<ServiceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wheel_painting: Option<WheelPaintingEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbon: Option<CarbonEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soundproofing: Option<ServiceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus: Option<ServiceEntry>,
}

impl ServicesData {
    /// (executor, valor) de uma perna, se a categoria foi preenchida.
    pub fn leg(&self, kind: ServiceKind) -> Option<(Option<i64>, Option<Decimal>)> {
        let plain = |e: &ServiceEntry| (e.executor_id, e.amount);
        match kind {
            ServiceKind::Film => self.film.as_ref().map(plain),
            ServiceKind::DryCleaning => self.dry_cleaning.as_ref().map(plain),
            ServiceKind::Polishing => self.polishing.as_ref().map(plain),
            ServiceKind::WheelPainting => self.wheel_painting.as_ref().map(|e| (e.executor_id, e.amount)),
            ServiceKind::WheelMounting => self.wheel_painting.as_ref()?.mounting.as_ref().map(plain),
            ServiceKind::Carbon => self.carbon.as_ref().map(|e| (e.executor_id, e.amount)),
            ServiceKind::Soundproofing => self.soundproofing.as_ref().map(plain),
            ServiceKind::Bonus => self.bonus.as_ref().map(plain),
        }
    }

    pub fn without_prices(&self) -> Self {
        let strip = |e: &Option<ServiceEntry>| {
            e.as_ref().map(|e| ServiceEntry { amount: None, ..e.clone() })
        };
        ServicesData {
            film: strip(&self.film),
            dry_cleaning: strip(&self.dry_cleaning),
            polishing: strip(&self.polishing),
            wheel_painting: self.wheel_painting.as_ref().map(|e| WheelPaintingEntry {
                executor_id: e.executor_id,
                amount: None,
                mounting: strip(&e.mounting),
            }),
            carbon: self.carbon.as_ref().map(|e| CarbonEntry { amount: None, ..e.clone() }),
            soundproofing: strip(&self.soundproofing),
            bonus: strip(&self.bonus),
        }
    }

    /// Troca os valores de cada perna presente pelos de `previous`.
    /// Perna nova (sem valor anterior) fica sem valor.
    pub fn keep_prices_of(&mut self, previous: &ServicesData) {
        fn carry(entry: &mut Option<ServiceEntry>, previous: Option<&ServiceEntry>) {
            if let Some(entry) = entry {
                entry.amount = previous.and_then(|p| p.amount);
            }
        }

        carry(&mut self.film, previous.film.as_ref());
        carry(&mut self.dry_cleaning, previous.dry_cleaning.as_ref());
        carry(&mut self.polishing, previous.polishing.as_ref());
        carry(&mut self.soundproofing, previous.soundproofing.as_ref());
        carry(&mut self.bonus, previous.bonus.as_ref());

        if let Some(wheels) = &mut self.wheel_painting {
            let before = previous.wheel_painting.as_ref();
            wheels.amount = before.and_then(|p| p.amount);
            carry(&mut wheels.mounting, before.and_then(|p| p.mounting.as_ref()));
        }
        if let Some(carbon) = &mut self.carbon {
            carbon.amount = previous.carbon.as_ref().and_then(|p| p.amount);
        }
    }
}

// =============================================================================
//  SERVIÇOS AVULSOS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalService {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "opt_id", skip_serializing_if = "Option::is_none")]
    pub executor_id: Option<i64>,
    #[serde(default, deserialize_with = "opt_decimal", skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
}

// =============================================================================
//  AGRUPAMENTO
// =============================================================================

/// Os grupos da entrada estruturada. `None` = o grupo não veio no payload
/// (num update isso significa "não mexer", nunca "limpar").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkInput {
    #[serde(default)]
    pub armatura_executors: Option<ArmaturaExecutors>,
    #[serde(default)]
    pub fixed_services: Option<FixedServices>,
    #[serde(default)]
    pub body_parts_data: Option<BodyPartsData>,
    #[serde(default)]
    pub services_data: Option<ServicesData>,
    #[serde(default)]
    pub additional_services: Option<Vec<AdditionalService>>,
}

impl WorkInput {
    /// Tipos de trabalho cujos registros não pagos serão substituídos.
    pub fn touched_work_types(&self) -> Vec<WorkType> {
        let mut types = Vec::new();
        if self.armatura_executors.is_some() {
            types.extend(ArmaturaStage::ALL.map(ArmaturaStage::work_type));
        }
        if self.fixed_services.is_some() {
            types.extend(FixedTask::ALL.map(FixedTask::work_type));
        }
        if self.body_parts_data.is_some() {
            types.push(WorkType::BodyPart);
        }
        if self.services_data.is_some() {
            types.extend(ServiceKind::ALL.map(ServiceKind::work_type));
        }
        if self.additional_services.is_some() {
            types.push(WorkType::ArmaturaAdditional);
        }
        types
    }

    /// Primeiro valor negativo informado, como `servicesData.film`.
    pub fn negative_amount(&self) -> Option<String> {
        let negative = |amount: Option<Decimal>| amount.is_some_and(|a| a < Decimal::ZERO);

        if let Some(services) = &self.services_data {
            for kind in ServiceKind::ALL {
                if services.leg(kind).is_some_and(|(_, amount)| negative(amount)) {
                    return Some(format!("servicesData.{}", kind.field()));
                }
            }
        }
        self.additional_services
            .iter()
            .flatten()
            .position(|s| negative(s.amount))
            .map(|i| format!("additionalServices[{}].amount", i))
    }

    /// Para quem não vê o financeiro: os valores dos serviços vêm da OS
    /// gravada, nunca do payload. Avulsos casam pelo nome.
    pub fn keep_prices_of(&mut self, services: &ServicesData, additional: &[AdditionalService]) {
        if let Some(data) = &mut self.services_data {
            data.keep_prices_of(services);
        }
        if let Some(list) = &mut self.additional_services {
            let mut unused: Vec<&AdditionalService> = additional.iter().collect();
            for service in list.iter_mut() {
                let name = service.name.as_deref().map(str::trim);
                let found = unused.iter().position(|p| p.name.as_deref().map(str::trim) == name);
                service.amount = found.map(|i| unused.remove(i)).and_then(|p| p.amount);
            }
        }
    }
}
