//! Per-tick decision loop: drain buffered commands, otherwise decide anew

use std::collections::VecDeque;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::error::AgentError;
use crate::infra::{BaseSide, PrimitiveCommand};
use crate::state::{Observation, PlayerRelative, StateAbstractor, StateDescriptor};

use super::catalog::{ActionCatalog, Intent, MAP_SIZE, NAVIGATION_STRIDE};
use super::config::AgentConfig;
use super::expander::ActionExpander;
use super::policy::PolicyTable;
use super::queues::ProductionQueues;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// No buffered commands; the next tick selects an intent.
    AwaitingIntent,
    /// Commands from an earlier expansion are still pending.
    Draining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodePhase {
    /// The base side has not been determined for this episode yet.
    Unclassified,
    Classified(BaseSide),
}

/// Running counters over the lifetime of the agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub decisions: usize,
    pub drained: usize,
    pub classifications: usize,
}

/// Which half of the map holds the agent's units on the minimap.
///
/// Without any own cells the base is assumed to be on the right.
pub fn classify_base(observation: &Observation) -> Result<BaseSide, AgentError> {
    let minimap = observation.minimap_relative()?;
    match minimap.mean_position(PlayerRelative::Own as i32) {
        Some(pos) if pos.x <= minimap.width / 2 => Ok(BaseSide::Left),
        _ => Ok(BaseSide::Right),
    }
}

/// One agent: policy, production queues and the command buffer between ticks.
#[derive(Debug)]
pub struct AgentLoop {
    abstractor: StateAbstractor,
    policy: PolicyTable,
    expander: ActionExpander,
    opening: ProductionQueues,
    queues: ProductionQueues,
    buffer: VecDeque<PrimitiveCommand>,
    phase: LoopPhase,
    episode: EpisodePhase,
    previous: Option<(StateDescriptor, Intent)>,
    pending_reward: f64,
    last_intent: Option<Intent>,
    stats: LoopStats,
    rng: StdRng,
}

impl AgentLoop {
    /// Creates an agent whose queues start from `opening` in every episode.
    pub fn new(config: &AgentConfig, opening: ProductionQueues) -> Result<Self, AgentError> {
        config.validate()?;

        let catalog = if config.map_size == MAP_SIZE && config.navigation_stride == NAVIGATION_STRIDE
        {
            ActionCatalog::standard()
        } else {
            Arc::new(ActionCatalog::new(config.map_size, config.navigation_stride))
        };
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            abstractor: StateAbstractor::default(),
            policy: PolicyTable::new(catalog, config),
            expander: ActionExpander::new(config),
            queues: opening.clone(),
            opening,
            buffer: VecDeque::new(),
            phase: LoopPhase::AwaitingIntent,
            episode: EpisodePhase::Unclassified,
            previous: None,
            pending_reward: 0.0,
            last_intent: None,
            stats: LoopStats::default(),
            rng,
        })
    }

    /// Produces exactly one command for this tick.
    ///
    /// A malformed observation is returned as an error before any learning
    /// or selection happens; the caller should send a no-op for the tick.
    pub fn step(&mut self, observation: &Observation) -> Result<PrimitiveCommand, AgentError> {
        self.pending_reward += observation.reward;

        if self.phase == LoopPhase::Draining {
            if let Some(command) = self.buffer.pop_front() {
                if self.buffer.is_empty() {
                    self.phase = LoopPhase::AwaitingIntent;
                }
                self.stats.drained += 1;
                return Ok(command);
            }
            self.phase = LoopPhase::AwaitingIntent;
        }

        let base_side = match self.episode {
            EpisodePhase::Classified(side) => side,
            EpisodePhase::Unclassified => {
                let side = classify_base(observation)?;
                info!("Base is on the {:?} side", side);
                self.episode = EpisodePhase::Classified(side);
                self.stats.classifications += 1;
                side
            }
        };

        let state = self.abstractor.abstract_state(observation)?;

        let (prev_state, prev_intent) = match &self.previous {
            Some((prev, intent)) => (Some(prev), Some(*intent)),
            None => (None, None),
        };
        self.policy
            .learn(prev_state, &state, prev_intent, self.pending_reward)?;
        self.pending_reward = 0.0;

        self.policy.ensure_row(&state);
        let intent = self.policy.choose(&state);
        self.previous = Some((state, intent));
        self.last_intent = Some(intent);
        self.stats.decisions += 1;

        let commands =
            self.expander
                .expand(intent, observation, &mut self.queues, base_side, &mut self.rng)?;
        debug!("{} in {} expands to {} command(s)", intent, state, commands.len());

        self.buffer = commands.into();
        let command = self.buffer.pop_front().unwrap_or_else(PrimitiveCommand::no_op);
        self.phase = if self.buffer.is_empty() {
            LoopPhase::AwaitingIntent
        } else {
            LoopPhase::Draining
        };
        Ok(command)
    }

    /// Forgets everything tied to the current episode.
    ///
    /// The policy table survives; the production queues return to the opening.
    pub fn reset(&mut self) {
        if !self.buffer.is_empty() {
            debug!("Dropping {} buffered command(s) on reset", self.buffer.len());
        }
        self.buffer.clear();
        self.phase = LoopPhase::AwaitingIntent;
        self.episode = EpisodePhase::Unclassified;
        self.previous = None;
        self.pending_reward = 0.0;
        self.last_intent = None;
        self.queues = self.opening.clone();
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn episode_phase(&self) -> EpisodePhase {
        self.episode
    }

    pub fn base_side(&self) -> Option<BaseSide> {
        match self.episode {
            EpisodePhase::Classified(side) => Some(side),
            EpisodePhase::Unclassified => None,
        }
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn last_intent(&self) -> Option<Intent> {
        self.last_intent
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut PolicyTable {
        &mut self.policy
    }

    pub fn queues(&self) -> &ProductionQueues {
        &self.queues
    }

    pub fn queues_mut(&mut self) -> &mut ProductionQueues {
        &mut self.queues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{FunctionId, Position};
    use crate::state::{ObservationBuilder, StructureKind, UnitKind};

    fn greedy_config() -> AgentConfig {
        AgentConfig {
            exploration: 0.0,
            learning_rate: 0.5,
            seed: Some(11),
            ..AgentConfig::default()
        }
    }

    fn observation() -> Observation {
        ObservationBuilder::new(84, 64)
            .unit(Position::new(20, 20), StructureKind::Hatchery.unit_type_id(), PlayerRelative::Own)
            .unit(Position::new(30, 30), UnitKind::Roach.unit_type_id(), PlayerRelative::Own)
            .minimap(Position::new(10, 12), PlayerRelative::Own)
            .build()
    }

    fn agent() -> AgentLoop {
        AgentLoop::new(&greedy_config(), ProductionQueues::new()).unwrap()
    }

    /// Makes `intent` the greedy choice for the state of `obs`.
    fn prefer(agent: &mut AgentLoop, obs: &Observation, intent: Intent) {
        let state = StateAbstractor::default().abstract_state(obs).unwrap();
        agent.policy_mut().set_value(&state, &intent, 10.0).unwrap();
    }

    #[test]
    fn test_no_op_intent_stays_awaiting() {
        let mut agent = agent();
        let obs = observation();

        let command = agent.step(&obs).unwrap();
        assert!(command.is_no_op());
        assert_eq!(agent.phase(), LoopPhase::AwaitingIntent);
        assert_eq!(agent.last_intent(), Some(Intent::NoOp));
        assert_eq!(agent.buffered(), 0);
    }

    #[test]
    fn test_empty_expansion_returns_no_op() {
        let mut agent = agent();
        let obs = observation();
        prefer(&mut agent, &obs, Intent::BuildStructure);

        let command = agent.step(&obs).unwrap();
        assert_eq!(agent.last_intent(), Some(Intent::BuildStructure));
        assert!(command.is_no_op());
        assert_eq!(agent.phase(), LoopPhase::AwaitingIntent);
    }

    #[test]
    fn test_multi_command_intent_drains_in_order() {
        let mut agent = agent();
        let obs = observation();
        prefer(&mut agent, &obs, Intent::Defend);

        let first = agent.step(&obs).unwrap();
        assert_eq!(first.function, FunctionId::SelectArmy);
        assert_eq!(agent.phase(), LoopPhase::Draining);
        assert_eq!(agent.buffered(), 1);

        let second = agent.step(&obs).unwrap();
        assert_eq!(second.function, FunctionId::AttackScreen);
        assert_eq!(agent.phase(), LoopPhase::AwaitingIntent);
        assert_eq!(agent.stats().decisions, 1);
        assert_eq!(agent.stats().drained, 1);
    }

    #[test]
    fn test_base_side_is_classified_once() {
        let mut agent = agent();
        let obs = observation();
        assert_eq!(agent.base_side(), None);

        for _ in 0..5 {
            agent.step(&obs).unwrap();
        }
        assert_eq!(agent.base_side(), Some(BaseSide::Left));
        assert_eq!(agent.stats().classifications, 1);
    }

    #[test]
    fn test_reset_mid_drain() {
        let mut agent = agent();
        let obs = observation();
        prefer(&mut agent, &obs, Intent::Defend);

        let first = agent.step(&obs).unwrap();
        assert_eq!(first.function, FunctionId::SelectArmy);
        assert_eq!(agent.phase(), LoopPhase::Draining);
        assert_eq!(agent.buffered(), 1);
        assert_eq!(agent.stats().classifications, 1);

        agent.reset();
        assert_eq!(agent.buffered(), 0);
        assert_eq!(agent.phase(), LoopPhase::AwaitingIntent);
        assert_eq!(agent.episode_phase(), EpisodePhase::Unclassified);

        // A fresh expansion, not the dropped Attack_screen
        let command = agent.step(&obs).unwrap();
        assert_eq!(command.function, FunctionId::SelectArmy);
        assert_eq!(agent.stats().classifications, 2);
        assert_eq!(agent.stats().decisions, 2);
        assert_eq!(agent.stats().drained, 0);

        let command = agent.step(&obs).unwrap();
        assert_eq!(command.function, FunctionId::AttackScreen);
        assert_eq!(agent.stats().classifications, 2);
    }

    #[test]
    fn test_reset_skips_stale_transition() {
        let mut agent = agent();
        let obs = observation();
        agent.step(&obs).unwrap();
        agent.reset();

        let state = StateAbstractor::default().abstract_state(&obs).unwrap();
        let before = agent.policy().value(&state, &Intent::NoOp).unwrap();
        agent.step(&observation_with_reward(5.0)).unwrap();
        assert_eq!(agent.policy().value(&state, &Intent::NoOp).unwrap(), before);
    }

    fn observation_with_reward(reward: f64) -> Observation {
        Observation {
            reward,
            ..observation()
        }
    }

    #[test]
    fn test_reward_reaches_previous_decision() {
        let mut agent = agent();
        let obs = observation();
        let state = StateAbstractor::default().abstract_state(&obs).unwrap();

        agent.step(&obs).unwrap();
        agent.step(&observation_with_reward(2.0)).unwrap();

        // 0.5 * (2.0 + 0.9 * 0.0)
        assert_eq!(agent.policy().value(&state, &Intent::NoOp).unwrap(), Some(1.0));
    }

    #[test]
    fn test_rewards_during_drain_are_accumulated() {
        let mut agent = agent();
        let obs = observation();
        let state = StateAbstractor::default().abstract_state(&obs).unwrap();
        prefer(&mut agent, &obs, Intent::Defend);

        agent.step(&obs).unwrap();
        agent.step(&observation_with_reward(1.0)).unwrap();
        agent.step(&observation_with_reward(3.0)).unwrap();

        // 10.0 + 0.5 * (4.0 + 0.9 * 10.0 - 10.0)
        let value = agent.policy().value(&state, &Intent::Defend).unwrap().unwrap();
        assert!((value - 11.5).abs() < 1e-12);
    }

    #[test]
    fn test_malformed_observation_skips_the_tick() {
        let mut agent = agent();
        let mut obs = observation();
        obs.unit_type = None;

        let err = agent.step(&obs).unwrap_err();
        assert!(matches!(err, AgentError::MalformedObservation(_)));
        assert!(err.is_recoverable());
        assert_eq!(agent.stats().decisions, 0);
        assert!(agent.policy().is_empty());
    }

    #[test]
    fn test_reset_restores_opening() {
        let mut agent = AgentLoop::new(&greedy_config(), ProductionQueues::opening()).unwrap();
        agent.queues_mut().clear();
        agent.reset();
        assert_eq!(
            agent.queues().structures.len(),
            ProductionQueues::opening().structures.len()
        );
    }

    #[test]
    fn test_classify_base_sides() {
        let left = ObservationBuilder::new(84, 64)
            .minimap(Position::new(10, 50), PlayerRelative::Own)
            .build();
        let right = ObservationBuilder::new(84, 64)
            .minimap(Position::new(50, 10), PlayerRelative::Own)
            .build();
        let empty = ObservationBuilder::new(84, 64).build();
        assert_eq!(classify_base(&left).unwrap(), BaseSide::Left);
        assert_eq!(classify_base(&right).unwrap(), BaseSide::Right);
        assert_eq!(classify_base(&empty).unwrap(), BaseSide::Right);
    }
}
