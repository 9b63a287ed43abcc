//! Expands an intent into the primitive commands that carry it out

use rand::Rng;
use tracing::debug;

use crate::error::AgentError;
use crate::infra::{BaseSide, Bounds, FunctionId, Position, PrimitiveCommand};
use crate::state::{Observation, Placement, PlayerRelative, UnitKind};

use super::catalog::Intent;
use super::config::AgentConfig;
use super::queues::{
    PlacementOrder, ProductionRequest, ProductionQueues, UnitRequest, town_hall_position,
};

/// Mean screen position of own army units, `None` without any.
pub fn army_centroid(observation: &Observation) -> Result<Option<Position>, AgentError> {
    let relative = observation.screen_relative()?;
    let unit_type = observation.screen_unit_type()?;

    let (mut sum_x, mut sum_y, mut n) = (0i64, 0i64, 0i64);
    for (pos, owner) in relative.iter() {
        if owner != PlayerRelative::Own as i32 {
            continue;
        }
        let is_army = unit_type
            .get(&pos)
            .and_then(UnitKind::from_unit_type_id)
            .is_some_and(|unit| unit.is_army());
        if is_army {
            sum_x += pos.x as i64;
            sum_y += pos.y as i64;
            n += 1;
        }
    }
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(Position::new((sum_x / n) as i32, (sum_y / n) as i32)))
}

/// Translates intents into command sequences.
///
/// Each call is independent: it only looks at its arguments and never at the
/// outcome of earlier commands.
#[derive(Debug, Clone)]
pub struct ActionExpander {
    screen: Bounds,
    standoff: i32,
}

impl ActionExpander {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            screen: Bounds::square(config.screen_size),
            standoff: config.standoff,
        }
    }

    /// Commands for `intent` in execution order; may be empty.
    ///
    /// Targets that cannot be grounded in the observation degrade to a single
    /// no-op and leave the queued request in place.
    pub fn expand<R: Rng + ?Sized>(
        &self,
        intent: Intent,
        observation: &Observation,
        queues: &mut ProductionQueues,
        base_side: BaseSide,
        rng: &mut R,
    ) -> Result<Vec<PrimitiveCommand>, AgentError> {
        let expanded: Result<Vec<PrimitiveCommand>, AgentError> = match intent {
            Intent::NoOp => Ok(vec![PrimitiveCommand::no_op()]),
            Intent::BuildStructure => queues
                .structures
                .dequeue(observation, rng)
                .map(|order| order.map(|o| self.placement(o)).into_iter().collect()),
            Intent::BuildUnit => queues.units.dequeue(observation, rng).map(|order| {
                order
                    .map(|unit| PrimitiveCommand::quick(unit.train_function()))
                    .into_iter()
                    .collect()
            }),
            Intent::BuildWorker => UnitRequest {
                unit: UnitKind::Drone,
            }
            .resolve(observation, rng)
            .map(|unit| vec![PrimitiveCommand::quick(unit.train_function())]),
            Intent::Research => queues.research.dequeue(observation, rng).map(|order| {
                order
                    .map(|upgrade| PrimitiveCommand::quick(upgrade.research_function()))
                    .into_iter()
                    .collect()
            }),
            Intent::Cancel => Ok(vec![PrimitiveCommand::quick(FunctionId::CancelLastQuick)]),
            Intent::Attack => army_centroid(observation).map(|anchor| {
                self.army_order(anchor, FunctionId::AttackScreen, |pos, d| {
                    base_side.toward_enemy(pos, d)
                })
            }),
            Intent::Patrol => army_centroid(observation).map(|anchor| {
                self.army_order(anchor, FunctionId::PatrolScreen, |pos, d| {
                    base_side.toward_enemy(pos, d)
                })
            }),
            Intent::Defend => town_hall_position(observation).map(|anchor| {
                self.army_order(anchor, FunctionId::AttackScreen, |pos, d| {
                    base_side.toward_enemy(pos, d)
                })
            }),
            Intent::ReturnToBase => town_hall_position(observation).map(|anchor| {
                self.army_order(anchor, FunctionId::MoveScreen, |pos, d| {
                    base_side.away_from_enemy(pos, d)
                })
            }),
            Intent::Navigate { x, y } => Ok(vec![PrimitiveCommand::move_camera(Position::new(x, y))]),
        };

        match expanded {
            Err(AgentError::UnresolvableTarget(reason)) => {
                debug!("{} falls back to no_op: {}", intent, reason);
                Ok(vec![PrimitiveCommand::no_op()])
            }
            other => other,
        }
    }

    fn placement(&self, order: PlacementOrder) -> PrimitiveCommand {
        let function = order.structure.build_function();
        match order.structure.placement() {
            Placement::Screen => PrimitiveCommand::screen(function, self.screen.clamp(order.target)),
            Placement::Morph => PrimitiveCommand::quick(function),
        }
    }

    /// Selects the army and sends it to a point `standoff` away from `anchor`.
    fn army_order(
        &self,
        anchor: Option<Position>,
        function: FunctionId,
        shift: impl Fn(Position, i32) -> Position,
    ) -> Vec<PrimitiveCommand> {
        match anchor {
            Some(anchor) => {
                let target = self.screen.clamp(shift(anchor, self.standoff));
                vec![
                    PrimitiveCommand::select_army(),
                    PrimitiveCommand::screen(function, target),
                ]
            }
            None => vec![PrimitiveCommand::no_op()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planners::rl::queues::{ResearchRequest, StructureRequest};
    use crate::state::units::{LARVA, VESPENE_GEYSER};
    use crate::state::{ObservationBuilder, StructureKind, Upgrade};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn expander() -> ActionExpander {
        ActionExpander::new(&AgentConfig::default())
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(3)
    }

    fn with_base() -> ObservationBuilder {
        ObservationBuilder::new(84, 64).unit(
            Position::new(40, 40),
            StructureKind::Hatchery.unit_type_id(),
            PlayerRelative::Own,
        )
    }

    #[test]
    fn test_no_op_intent() {
        let mut queues = ProductionQueues::new();
        let obs = with_base().build();
        let cmds = expander()
            .expand(Intent::NoOp, &obs, &mut queues, BaseSide::Left, &mut rng())
            .unwrap();
        assert_eq!(cmds, vec![PrimitiveCommand::no_op()]);
    }

    #[test]
    fn test_build_structure_with_empty_queue() {
        let mut queues = ProductionQueues::new();
        let obs = with_base().build();
        let cmds = expander()
            .expand(Intent::BuildStructure, &obs, &mut queues, BaseSide::Left, &mut rng())
            .unwrap();
        assert!(cmds.is_empty());
    }

    #[test]
    fn test_build_extractor_on_geyser() {
        let mut queues = ProductionQueues::new();
        queues
            .structures
            .enqueue(StructureRequest::new(StructureKind::Extractor));
        let obs = with_base()
            .unit(Position::new(10, 10), VESPENE_GEYSER, PlayerRelative::Neutral)
            .unit(Position::new(20, 20), VESPENE_GEYSER, PlayerRelative::Neutral)
            .build();

        let cmds = expander()
            .expand(Intent::BuildStructure, &obs, &mut queues, BaseSide::Left, &mut rng())
            .unwrap();

        let placements: Vec<_> = cmds
            .iter()
            .filter(|c| c.function == FunctionId::BuildExtractorScreen)
            .collect();
        assert_eq!(placements.len(), 1);
        let target = placements[0].target().unwrap();
        assert!(target == Position::new(10, 10) || target == Position::new(20, 20));
        assert!(queues.structures.is_empty());
    }

    #[test]
    fn test_unresolvable_structure_falls_back_and_stays_queued() {
        let mut queues = ProductionQueues::new();
        queues
            .structures
            .enqueue(StructureRequest::new(StructureKind::Extractor));
        let obs = with_base().build();

        let cmds = expander()
            .expand(Intent::BuildStructure, &obs, &mut queues, BaseSide::Left, &mut rng())
            .unwrap();
        assert_eq!(cmds, vec![PrimitiveCommand::no_op()]);
        assert_eq!(queues.structures.len(), 1);
    }

    #[test]
    fn test_morph_is_a_quick_command() {
        let mut queues = ProductionQueues::new();
        queues.structures.enqueue(StructureRequest::new(StructureKind::Lair));
        let obs = with_base().available(FunctionId::MorphLairQuick).build();
        let cmds = expander()
            .expand(Intent::BuildStructure, &obs, &mut queues, BaseSide::Left, &mut rng())
            .unwrap();
        assert_eq!(cmds, vec![PrimitiveCommand::quick(FunctionId::MorphLairQuick)]);
    }

    #[test]
    fn test_build_worker_needs_larva() {
        let mut queues = ProductionQueues::new();
        let without = with_base().available(FunctionId::TrainDroneQuick).build();
        let cmds = expander()
            .expand(Intent::BuildWorker, &without, &mut queues, BaseSide::Left, &mut rng())
            .unwrap();
        assert_eq!(cmds, vec![PrimitiveCommand::no_op()]);

        let with = with_base()
            .unit(Position::new(45, 45), LARVA, PlayerRelative::Own)
            .available(FunctionId::TrainDroneQuick)
            .build();
        let cmds = expander()
            .expand(Intent::BuildWorker, &with, &mut queues, BaseSide::Left, &mut rng())
            .unwrap();
        assert_eq!(cmds, vec![PrimitiveCommand::quick(FunctionId::TrainDroneQuick)]);
    }

    #[test]
    fn test_research_dequeues() {
        let mut queues = ProductionQueues::new();
        queues.research.enqueue(ResearchRequest {
            upgrade: Upgrade::PneumatizedCarapace,
        });
        let obs = with_base()
            .available(FunctionId::ResearchPneumatizedCarapaceQuick)
            .build();
        let cmds = expander()
            .expand(Intent::Research, &obs, &mut queues, BaseSide::Left, &mut rng())
            .unwrap();
        assert_eq!(
            cmds,
            vec![PrimitiveCommand::quick(FunctionId::ResearchPneumatizedCarapaceQuick)]
        );
        assert!(queues.research.is_empty());
    }

    #[test]
    fn test_defend_targets_standoff_from_base() {
        let mut queues = ProductionQueues::new();
        let obs = with_base().build();

        let cmds = expander()
            .expand(Intent::Defend, &obs, &mut queues, BaseSide::Left, &mut rng())
            .unwrap();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0], PrimitiveCommand::select_army());
        assert_eq!(
            cmds[1],
            PrimitiveCommand::screen(FunctionId::AttackScreen, Position::new(50, 50))
        );

        let cmds = expander()
            .expand(Intent::ReturnToBase, &obs, &mut queues, BaseSide::Left, &mut rng())
            .unwrap();
        assert_eq!(
            cmds[1],
            PrimitiveCommand::screen(FunctionId::MoveScreen, Position::new(30, 30))
        );
    }

    #[test]
    fn test_enemy_base_is_not_a_defend_anchor() {
        let mut queues = ProductionQueues::new();
        let obs = ObservationBuilder::new(84, 64)
            .unit(
                Position::new(40, 40),
                StructureKind::Hatchery.unit_type_id(),
                PlayerRelative::Hostile,
            )
            .build();

        for intent in [Intent::Defend, Intent::ReturnToBase] {
            let cmds = expander()
                .expand(intent, &obs, &mut queues, BaseSide::Left, &mut rng())
                .unwrap();
            assert_eq!(cmds, vec![PrimitiveCommand::no_op()]);
        }
    }

    #[test]
    fn test_enemy_larva_does_not_train_workers() {
        let mut queues = ProductionQueues::new();
        let obs = with_base()
            .unit(Position::new(45, 45), LARVA, PlayerRelative::Hostile)
            .available(FunctionId::TrainDroneQuick)
            .build();
        let cmds = expander()
            .expand(Intent::BuildWorker, &obs, &mut queues, BaseSide::Left, &mut rng())
            .unwrap();
        assert_eq!(cmds, vec![PrimitiveCommand::no_op()]);
    }

    #[test]
    fn test_attack_without_army_is_no_op() {
        let mut queues = ProductionQueues::new();
        let obs = with_base().build();
        let cmds = expander()
            .expand(Intent::Attack, &obs, &mut queues, BaseSide::Right, &mut rng())
            .unwrap();
        assert_eq!(cmds, vec![PrimitiveCommand::no_op()]);
    }

    #[test]
    fn test_attack_from_army_centroid() {
        let mut queues = ProductionQueues::new();
        let obs = with_base()
            .unit(Position::new(60, 20), UnitKind::Roach.unit_type_id(), PlayerRelative::Own)
            .unit(Position::new(62, 22), UnitKind::Zergling.unit_type_id(), PlayerRelative::Own)
            .unit(Position::new(5, 5), UnitKind::Drone.unit_type_id(), PlayerRelative::Own)
            .build();
        let cmds = expander()
            .expand(Intent::Attack, &obs, &mut queues, BaseSide::Right, &mut rng())
            .unwrap();
        assert_eq!(
            cmds[1],
            PrimitiveCommand::screen(FunctionId::AttackScreen, Position::new(51, 11))
        );
    }

    #[test]
    fn test_targets_are_clamped_to_screen() {
        let mut queues = ProductionQueues::new();
        let obs = ObservationBuilder::new(84, 64)
            .unit(Position::new(80, 80), StructureKind::Hatchery.unit_type_id(), PlayerRelative::Own)
            .build();
        let cmds = expander()
            .expand(Intent::Defend, &obs, &mut queues, BaseSide::Left, &mut rng())
            .unwrap();
        assert_eq!(cmds[1].target(), Some(Position::new(83, 83)));
    }

    #[test]
    fn test_navigation_ignores_map_contents() {
        let mut queues = ProductionQueues::opening();
        let obs = ObservationBuilder::new(84, 64).build();
        let cmds = expander()
            .expand(
                Intent::Navigate { x: 64, y: 64 },
                &obs,
                &mut queues,
                BaseSide::Right,
                &mut rng(),
            )
            .unwrap();
        assert_eq!(cmds, vec![PrimitiveCommand::move_camera(Position::new(64, 64))]);
        assert_eq!(queues.structures.len(), ProductionQueues::opening().structures.len());
    }
}
