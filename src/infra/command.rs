//! Primitive commands exchanged with the simulation host

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::Position;

/// Argument value for the "not queued" flag carried by most commands.
pub const NOT_QUEUED: i32 = 0;

/// Argument value for `select_army` that replaces the current selection.
pub const SELECT_ALL: i32 = 0;

/// Identifier of a primitive function understood by the simulation host.
///
/// Serialized under the host's own function names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FunctionId {
    #[serde(rename = "no_op")]
    NoOp,
    #[serde(rename = "move_camera")]
    MoveCamera,
    #[serde(rename = "select_army")]
    SelectArmy,
    #[serde(rename = "Attack_screen")]
    AttackScreen,
    #[serde(rename = "Move_screen")]
    MoveScreen,
    #[serde(rename = "Patrol_screen")]
    PatrolScreen,
    #[serde(rename = "Cancel_Last_quick")]
    CancelLastQuick,
    #[serde(rename = "Build_Hatchery_screen")]
    BuildHatcheryScreen,
    #[serde(rename = "Build_Extractor_screen")]
    BuildExtractorScreen,
    #[serde(rename = "Build_SpawningPool_screen")]
    BuildSpawningPoolScreen,
    #[serde(rename = "Build_EvolutionChamber_screen")]
    BuildEvolutionChamberScreen,
    #[serde(rename = "Build_HydraliskDen_screen")]
    BuildHydraliskDenScreen,
    #[serde(rename = "Build_UltraliskCavern_screen")]
    BuildUltraliskCavernScreen,
    #[serde(rename = "Build_RoachWarren_screen")]
    BuildRoachWarrenScreen,
    #[serde(rename = "Build_SpineCrawler_screen")]
    BuildSpineCrawlerScreen,
    #[serde(rename = "Build_SporeCrawler_screen")]
    BuildSporeCrawlerScreen,
    #[serde(rename = "Morph_Lair_quick")]
    MorphLairQuick,
    #[serde(rename = "Morph_Hive_quick")]
    MorphHiveQuick,
    #[serde(rename = "Train_Drone_quick")]
    TrainDroneQuick,
    #[serde(rename = "Train_Zergling_quick")]
    TrainZerglingQuick,
    #[serde(rename = "Train_Overlord_quick")]
    TrainOverlordQuick,
    #[serde(rename = "Train_Roach_quick")]
    TrainRoachQuick,
    #[serde(rename = "Train_Hydralisk_quick")]
    TrainHydraliskQuick,
    #[serde(rename = "Train_Ultralisk_quick")]
    TrainUltraliskQuick,
    #[serde(rename = "Train_Queen_quick")]
    TrainQueenQuick,
    #[serde(rename = "Research_ZerglingMetabolicBoost_quick")]
    ResearchZerglingMetabolicBoostQuick,
    #[serde(rename = "Research_PneumatizedCarapace_quick")]
    ResearchPneumatizedCarapaceQuick,
    #[serde(rename = "Research_GlialRegeneration_quick")]
    ResearchGlialRegenerationQuick,
    #[serde(rename = "Research_GroovedSpines_quick")]
    ResearchGroovedSpinesQuick,
    #[serde(rename = "Research_MuscularAugments_quick")]
    ResearchMuscularAugmentsQuick,
    #[serde(rename = "Research_ZergMissileWeapons_quick")]
    ResearchZergMissileWeaponsQuick,
    #[serde(rename = "Research_ZergGroundArmor_quick")]
    ResearchZergGroundArmorQuick,
}

impl FunctionId {
    /// The host-side function name.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            FunctionId::NoOp => "no_op",
            FunctionId::MoveCamera => "move_camera",
            FunctionId::SelectArmy => "select_army",
            FunctionId::AttackScreen => "Attack_screen",
            FunctionId::MoveScreen => "Move_screen",
            FunctionId::PatrolScreen => "Patrol_screen",
            FunctionId::CancelLastQuick => "Cancel_Last_quick",
            FunctionId::BuildHatcheryScreen => "Build_Hatchery_screen",
            FunctionId::BuildExtractorScreen => "Build_Extractor_screen",
            FunctionId::BuildSpawningPoolScreen => "Build_SpawningPool_screen",
            FunctionId::BuildEvolutionChamberScreen => "Build_EvolutionChamber_screen",
            FunctionId::BuildHydraliskDenScreen => "Build_HydraliskDen_screen",
            FunctionId::BuildUltraliskCavernScreen => "Build_UltraliskCavern_screen",
            FunctionId::BuildRoachWarrenScreen => "Build_RoachWarren_screen",
            FunctionId::BuildSpineCrawlerScreen => "Build_SpineCrawler_screen",
            FunctionId::BuildSporeCrawlerScreen => "Build_SporeCrawler_screen",
            FunctionId::MorphLairQuick => "Morph_Lair_quick",
            FunctionId::MorphHiveQuick => "Morph_Hive_quick",
            FunctionId::TrainDroneQuick => "Train_Drone_quick",
            FunctionId::TrainZerglingQuick => "Train_Zergling_quick",
            FunctionId::TrainOverlordQuick => "Train_Overlord_quick",
            FunctionId::TrainRoachQuick => "Train_Roach_quick",
            FunctionId::TrainHydraliskQuick => "Train_Hydralisk_quick",
            FunctionId::TrainUltraliskQuick => "Train_Ultralisk_quick",
            FunctionId::TrainQueenQuick => "Train_Queen_quick",
            FunctionId::ResearchZerglingMetabolicBoostQuick => {
                "Research_ZerglingMetabolicBoost_quick"
            }
            FunctionId::ResearchPneumatizedCarapaceQuick => "Research_PneumatizedCarapace_quick",
            FunctionId::ResearchGlialRegenerationQuick => "Research_GlialRegeneration_quick",
            FunctionId::ResearchGroovedSpinesQuick => "Research_GroovedSpines_quick",
            FunctionId::ResearchMuscularAugmentsQuick => "Research_MuscularAugments_quick",
            FunctionId::ResearchZergMissileWeaponsQuick => "Research_ZergMissileWeapons_quick",
            FunctionId::ResearchZergGroundArmorQuick => "Research_ZergGroundArmor_quick",
        }
    }
}

/// One fully parameterized command, executable on the tick it is sent.
///
/// Arguments follow the host's nested layout: one inner list per argument,
/// e.g. `[[NOT_QUEUED], [x, y]]` for a screen-targeted command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveCommand {
    pub function: FunctionId,
    pub arguments: Vec<Vec<i32>>,
}

impl PrimitiveCommand {
    pub fn no_op() -> Self {
        Self {
            function: FunctionId::NoOp,
            arguments: Vec::new(),
        }
    }

    /// A command without a target, e.g. `Train_Drone_quick`.
    pub fn quick(function: FunctionId) -> Self {
        Self {
            function,
            arguments: vec![vec![NOT_QUEUED]],
        }
    }

    /// A command targeting a screen cell, e.g. `Attack_screen`.
    pub fn screen(function: FunctionId, target: Position) -> Self {
        Self {
            function,
            arguments: vec![vec![NOT_QUEUED], vec![target.x, target.y]],
        }
    }

    pub fn move_camera(target: Position) -> Self {
        Self {
            function: FunctionId::MoveCamera,
            arguments: vec![vec![target.x, target.y]],
        }
    }

    pub fn select_army() -> Self {
        Self {
            function: FunctionId::SelectArmy,
            arguments: vec![vec![SELECT_ALL]],
        }
    }

    pub fn is_no_op(&self) -> bool {
        self.function == FunctionId::NoOp
    }

    /// The coordinate argument, if this command carries one.
    pub fn target(&self) -> Option<Position> {
        self.arguments
            .iter()
            .rev()
            .find(|arg| arg.len() == 2)
            .map(|arg| Position::new(arg[0], arg[1]))
    }
}

impl fmt::Display for PrimitiveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.function.as_str_name(), self.arguments)
    }
}
