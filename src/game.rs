use crate::error::AgentError;
use crate::infra::{GameObserver, PrimitiveCommand, Simulation, TranscriptFile};
use crate::planners::rl::AgentLoop;
use crate::state::{Observation, StepType};
use serde::Serialize;
use std::error::Error;
use std::time::Instant;
use tracing::warn;

/// What happened during one episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EpisodeStats {
    pub episode: usize,
    pub ticks: usize,
    pub decisions: usize,
    pub total_reward: f64,
    /// Ticks answered with a no-op because of a recoverable error
    pub substitutions: usize,
}

struct Episode {
    stats: EpisodeStats,
    transcript: Option<TranscriptFile>,
}

/// Drives one agent against a simulation until it runs out of observations.
pub struct Game<S: Simulation> {
    simulation: S,
    agent: AgentLoop,
    observer: Box<dyn GameObserver>,
    transcripts_folder: Option<String>,
}

impl<S: Simulation> Game<S> {
    pub fn new(simulation: S, agent: AgentLoop, observer: impl GameObserver + 'static) -> Self {
        Self {
            simulation,
            agent,
            observer: Box::new(observer),
            transcripts_folder: None,
        }
    }

    pub fn with_transcripts(mut self, transcripts_folder: impl Into<String>) -> Self {
        self.transcripts_folder = Some(transcripts_folder.into());
        self
    }

    pub fn agent(&self) -> &AgentLoop {
        &self.agent
    }

    pub fn simulation(&self) -> &S {
        &self.simulation
    }

    /// Plays every episode the simulation offers and returns their statistics.
    ///
    /// A `First` observation starts a new episode and resets the agent; `Last`
    /// closes it. Recoverable tick errors are answered with a no-op, anything
    /// else aborts the run.
    pub fn run(&mut self) -> Result<Vec<EpisodeStats>, Box<dyn Error>> {
        let mut finished = Vec::new();
        let mut current: Option<Episode> = None;

        loop {
            let observation = match self.simulation.observe() {
                Ok(Some(observation)) => observation,
                Ok(None) => break,
                Err(e) => {
                    let recoverable = e
                        .downcast_ref::<AgentError>()
                        .filter(|err| err.is_recoverable());
                    let Some(error) = recoverable else {
                        return Err(e);
                    };
                    let tick = current.as_ref().map_or(0, |episode| episode.stats.ticks);
                    self.observer.on_tick_error(tick, error);
                    if let Some(episode) = current.as_mut() {
                        episode.stats.substitutions += 1;
                    }
                    self.simulation.act(&PrimitiveCommand::no_op())?;
                    continue;
                }
            };

            let mut episode = match current.take() {
                Some(episode) if observation.step_type != StepType::First => episode,
                previous => {
                    if let Some(episode) = previous {
                        finished.push(self.finish_episode(episode));
                    }
                    self.agent.reset();
                    self.start_episode(finished.len() + 1)
                }
            };

            self.tick(&mut episode, &observation)?;

            if observation.step_type == StepType::Last {
                finished.push(self.finish_episode(episode));
            } else {
                current = Some(episode);
            }
        }

        if let Some(episode) = current {
            finished.push(self.finish_episode(episode));
        }
        Ok(finished)
    }

    fn start_episode(&mut self, number: usize) -> Episode {
        self.observer.on_episode_start(number);
        let transcript = self.transcripts_folder.as_deref().and_then(|folder| {
            TranscriptFile::new(folder, number)
                .inspect_err(|e| warn!("Not recording episode {}: {}", number, e))
                .ok()
        });
        Episode {
            stats: EpisodeStats {
                episode: number,
                ..EpisodeStats::default()
            },
            transcript,
        }
    }

    fn finish_episode(&mut self, mut episode: Episode) -> EpisodeStats {
        if let Some(transcript) = episode.transcript.as_mut()
            && let Err(e) = transcript.flush()
        {
            warn!("Failed to flush transcript: {}", e);
        }
        self.observer.on_episode_end(&episode.stats);
        episode.stats
    }

    fn tick(&mut self, episode: &mut Episode, observation: &Observation) -> Result<(), Box<dyn Error>> {
        let tick_start = Instant::now();
        episode.stats.ticks += 1;
        episode.stats.total_reward += observation.reward;
        let tick = episode.stats.ticks;

        let decisions_before = self.agent.stats().decisions;
        let command = match self.agent.step(observation) {
            Ok(command) => command,
            Err(e) if e.is_recoverable() => {
                self.observer.on_tick_error(tick, &e);
                episode.stats.substitutions += 1;
                PrimitiveCommand::no_op()
            }
            Err(e) => return Err(Box::new(e)),
        };

        let intent = if self.agent.stats().decisions > decisions_before {
            episode.stats.decisions += 1;
            self.agent.last_intent()
        } else {
            None
        };
        if let Some(intent) = intent {
            self.observer.on_intent_selected(tick, intent);
        }
        self.observer.on_command(tick, &command);

        if let Some(transcript) = episode.transcript.as_mut()
            && let Err(e) = transcript.append(tick, intent, &command)
        {
            warn!("Stopped recording episode {}: {}", episode.stats.episode, e);
            episode.transcript = None;
        }

        self.simulation.act(&command)?;

        let tick_duration = tick_start.elapsed();
        if tick_duration.as_millis() > 100 {
            warn!(
                "Tick {} took {:.2}ms (command: {})",
                tick,
                tick_duration.as_secs_f64() * 1000.0,
                command
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{DefaultObserver, Position};
    use crate::planners::rl::{AgentConfig, ProductionQueues};
    use crate::state::{ObservationBuilder, PlayerRelative, StructureKind};
    use std::collections::VecDeque;

    #[derive(Default)]
    struct ScriptedSimulation {
        observations: VecDeque<Result<Observation, AgentError>>,
        sent: Vec<PrimitiveCommand>,
    }

    impl Simulation for ScriptedSimulation {
        fn observe(&mut self) -> Result<Option<Observation>, Box<dyn Error>> {
            match self.observations.pop_front() {
                Some(Ok(observation)) => Ok(Some(observation)),
                Some(Err(e)) => Err(Box::new(e)),
                None => Ok(None),
            }
        }

        fn act(&mut self, command: &PrimitiveCommand) -> Result<(), Box<dyn Error>> {
            self.sent.push(command.clone());
            Ok(())
        }
    }

    fn observation(step_type: StepType, reward: f64) -> Observation {
        ObservationBuilder::new(84, 64)
            .unit(Position::new(20, 20), StructureKind::Hatchery.unit_type_id(), PlayerRelative::Own)
            .minimap(Position::new(50, 50), PlayerRelative::Own)
            .step_type(step_type)
            .reward(reward)
            .build()
    }

    fn game(observations: Vec<Result<Observation, AgentError>>) -> Game<ScriptedSimulation> {
        let config = AgentConfig {
            exploration: 0.0,
            seed: Some(5),
            ..AgentConfig::default()
        };
        let agent = AgentLoop::new(&config, ProductionQueues::new()).unwrap();
        let simulation = ScriptedSimulation {
            observations: observations.into(),
            sent: Vec::new(),
        };
        Game::new(simulation, agent, DefaultObserver)
    }

    #[test]
    fn test_one_command_per_observation() {
        let mut game = game(vec![
            Ok(observation(StepType::First, 0.0)),
            Ok(observation(StepType::Mid, 1.0)),
            Ok(observation(StepType::Mid, 0.0)),
            Ok(observation(StepType::Last, 2.0)),
        ]);

        let episodes = game.run().unwrap();
        assert_eq!(game.simulation().sent.len(), 4);
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].episode, 1);
        assert_eq!(episodes[0].ticks, 4);
        assert_eq!(episodes[0].decisions, 4);
        assert_eq!(episodes[0].total_reward, 3.0);
        assert_eq!(game.agent().base_side(), Some(crate::infra::BaseSide::Right));
    }

    #[test]
    fn test_first_starts_a_new_episode() {
        let mut game = game(vec![
            Ok(observation(StepType::First, 0.0)),
            Ok(observation(StepType::Mid, 0.0)),
            Ok(observation(StepType::First, 0.0)),
            Ok(observation(StepType::Mid, 0.0)),
        ]);

        let episodes = game.run().unwrap();
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].ticks, 2);
        assert_eq!(episodes[1].episode, 2);
        assert_eq!(episodes[1].ticks, 2);
        assert_eq!(game.agent().stats().classifications, 2);
    }

    #[test]
    fn test_malformed_observation_sends_no_op() {
        let mut broken = observation(StepType::Mid, 0.0);
        broken.minimap_player_relative = None;
        let mut game = game(vec![
            Ok(observation(StepType::First, 0.0)),
            Ok(broken),
            Err(AgentError::MalformedObservation("truncated line".to_string())),
            Ok(observation(StepType::Last, 0.0)),
        ]);

        let episodes = game.run().unwrap();
        assert_eq!(game.simulation().sent.len(), 4);
        assert!(game.simulation().sent[1].is_no_op());
        assert!(game.simulation().sent[2].is_no_op());
        assert_eq!(episodes[0].substitutions, 2);
        assert_eq!(episodes[0].ticks, 3);
    }

    #[test]
    fn test_fatal_error_aborts_the_run() {
        let mut game = game(vec![
            Ok(observation(StepType::First, 0.0)),
            Err(AgentError::InvalidConfig("bad".to_string())),
        ]);
        assert!(game.run().is_err());
    }

    #[test]
    fn test_transcripts_are_written_per_episode() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().to_str().unwrap().to_string();
        let mut game = game(vec![
            Ok(observation(StepType::First, 0.0)),
            Ok(observation(StepType::Last, 0.0)),
            Ok(observation(StepType::First, 0.0)),
            Ok(observation(StepType::Last, 0.0)),
        ])
        .with_transcripts(folder);

        game.run().unwrap();
        let files = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 2);
    }
}
