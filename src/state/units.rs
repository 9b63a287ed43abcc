//! Zerg registry: unit-type ids, production functions and tech requirements

use serde::{Deserialize, Serialize};

use crate::infra::FunctionId;

/// Unit-type id of the neutral vespene geyser.
pub const VESPENE_GEYSER: i32 = 342;

/// Unit-type id of larva, required to train any unit.
pub const LARVA: i32 = 151;

/// How a structure comes into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// A drone builds it on a screen cell.
    Screen,
    /// An existing structure morphs in place.
    Morph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructureKind {
    Hatchery,
    Extractor,
    SpawningPool,
    EvolutionChamber,
    HydraliskDen,
    UltraliskCavern,
    RoachWarren,
    SpineCrawler,
    SporeCrawler,
    Lair,
    Hive,
}

impl StructureKind {
    pub const ALL: [StructureKind; 11] = [
        StructureKind::Hatchery,
        StructureKind::Extractor,
        StructureKind::SpawningPool,
        StructureKind::EvolutionChamber,
        StructureKind::HydraliskDen,
        StructureKind::UltraliskCavern,
        StructureKind::RoachWarren,
        StructureKind::SpineCrawler,
        StructureKind::SporeCrawler,
        StructureKind::Lair,
        StructureKind::Hive,
    ];

    pub fn unit_type_id(&self) -> i32 {
        match self {
            StructureKind::Hatchery => 86,
            StructureKind::Extractor => 88,
            StructureKind::SpawningPool => 89,
            StructureKind::EvolutionChamber => 90,
            StructureKind::HydraliskDen => 91,
            StructureKind::UltraliskCavern => 93,
            StructureKind::RoachWarren => 97,
            StructureKind::SpineCrawler => 98,
            StructureKind::SporeCrawler => 99,
            StructureKind::Lair => 100,
            StructureKind::Hive => 101,
        }
    }

    pub fn from_unit_type_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.unit_type_id() == id)
    }

    pub fn build_function(&self) -> FunctionId {
        match self {
            StructureKind::Hatchery => FunctionId::BuildHatcheryScreen,
            StructureKind::Extractor => FunctionId::BuildExtractorScreen,
            StructureKind::SpawningPool => FunctionId::BuildSpawningPoolScreen,
            StructureKind::EvolutionChamber => FunctionId::BuildEvolutionChamberScreen,
            StructureKind::HydraliskDen => FunctionId::BuildHydraliskDenScreen,
            StructureKind::UltraliskCavern => FunctionId::BuildUltraliskCavernScreen,
            StructureKind::RoachWarren => FunctionId::BuildRoachWarrenScreen,
            StructureKind::SpineCrawler => FunctionId::BuildSpineCrawlerScreen,
            StructureKind::SporeCrawler => FunctionId::BuildSporeCrawlerScreen,
            StructureKind::Lair => FunctionId::MorphLairQuick,
            StructureKind::Hive => FunctionId::MorphHiveQuick,
        }
    }

    pub fn placement(&self) -> Placement {
        match self {
            StructureKind::Lair | StructureKind::Hive => Placement::Morph,
            _ => Placement::Screen,
        }
    }

    /// The structure whose position anchors this one.
    ///
    /// Morphs anchor on the structure they morph from.
    pub fn anchor(&self) -> StructureKind {
        match self {
            StructureKind::Hive => StructureKind::Lair,
            _ => StructureKind::Hatchery,
        }
    }

    /// Screen offset from the anchor's mean position.
    pub fn offset(&self) -> (i32, i32) {
        match self {
            StructureKind::Hatchery => (0, 0),
            StructureKind::Extractor => (0, 0),
            StructureKind::SpawningPool => (12, 0),
            StructureKind::EvolutionChamber => (0, 12),
            StructureKind::HydraliskDen => (-12, 0),
            StructureKind::UltraliskCavern => (0, -12),
            StructureKind::RoachWarren => (12, 12),
            StructureKind::SpineCrawler => (16, -8),
            StructureKind::SporeCrawler => (-8, 8),
            StructureKind::Lair => (0, 0),
            StructureKind::Hive => (0, 0),
        }
    }

    /// Bit used for this kind in a structure presence mask.
    pub fn mask_bit(&self) -> u16 {
        1 << (*self as u16)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    Drone,
    Zergling,
    Overlord,
    Hydralisk,
    Ultralisk,
    Roach,
    Queen,
}

impl UnitKind {
    pub const ALL: [UnitKind; 7] = [
        UnitKind::Drone,
        UnitKind::Zergling,
        UnitKind::Overlord,
        UnitKind::Hydralisk,
        UnitKind::Ultralisk,
        UnitKind::Roach,
        UnitKind::Queen,
    ];

    pub fn unit_type_id(&self) -> i32 {
        match self {
            UnitKind::Drone => 104,
            UnitKind::Zergling => 105,
            UnitKind::Overlord => 106,
            UnitKind::Hydralisk => 107,
            UnitKind::Ultralisk => 109,
            UnitKind::Roach => 110,
            UnitKind::Queen => 126,
        }
    }

    pub fn from_unit_type_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.unit_type_id() == id)
    }

    pub fn train_function(&self) -> FunctionId {
        match self {
            UnitKind::Drone => FunctionId::TrainDroneQuick,
            UnitKind::Zergling => FunctionId::TrainZerglingQuick,
            UnitKind::Overlord => FunctionId::TrainOverlordQuick,
            UnitKind::Hydralisk => FunctionId::TrainHydraliskQuick,
            UnitKind::Ultralisk => FunctionId::TrainUltraliskQuick,
            UnitKind::Roach => FunctionId::TrainRoachQuick,
            UnitKind::Queen => FunctionId::TrainQueenQuick,
        }
    }

    /// Tech structure that must exist before this unit can be trained.
    pub fn requires(&self) -> Option<StructureKind> {
        match self {
            UnitKind::Drone | UnitKind::Overlord => None,
            UnitKind::Zergling | UnitKind::Queen => Some(StructureKind::SpawningPool),
            UnitKind::Roach => Some(StructureKind::RoachWarren),
            UnitKind::Hydralisk => Some(StructureKind::HydraliskDen),
            UnitKind::Ultralisk => Some(StructureKind::UltraliskCavern),
        }
    }

    /// Queens are trained at a hatchery; everything else hatches from larva.
    pub fn needs_larva(&self) -> bool {
        !matches!(self, UnitKind::Queen)
    }

    /// Whether this unit fights, as opposed to workers and supply.
    pub fn is_army(&self) -> bool {
        !matches!(self, UnitKind::Drone | UnitKind::Overlord)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Upgrade {
    MetabolicBoost,
    PneumatizedCarapace,
    GlialRegeneration,
    GroovedSpines,
    MuscularAugments,
    MissileWeapons,
    GroundArmor,
}

impl Upgrade {
    pub fn research_function(&self) -> FunctionId {
        match self {
            Upgrade::MetabolicBoost => FunctionId::ResearchZerglingMetabolicBoostQuick,
            Upgrade::PneumatizedCarapace => FunctionId::ResearchPneumatizedCarapaceQuick,
            Upgrade::GlialRegeneration => FunctionId::ResearchGlialRegenerationQuick,
            Upgrade::GroovedSpines => FunctionId::ResearchGroovedSpinesQuick,
            Upgrade::MuscularAugments => FunctionId::ResearchMuscularAugmentsQuick,
            Upgrade::MissileWeapons => FunctionId::ResearchZergMissileWeaponsQuick,
            Upgrade::GroundArmor => FunctionId::ResearchZergGroundArmorQuick,
        }
    }

    /// The structure that researches this upgrade.
    pub fn researched_at(&self) -> StructureKind {
        match self {
            Upgrade::MetabolicBoost => StructureKind::SpawningPool,
            Upgrade::PneumatizedCarapace => StructureKind::Hatchery,
            Upgrade::GlialRegeneration => StructureKind::RoachWarren,
            Upgrade::GroovedSpines | Upgrade::MuscularAugments => StructureKind::HydraliskDen,
            Upgrade::MissileWeapons | Upgrade::GroundArmor => StructureKind::EvolutionChamber,
        }
    }
}
