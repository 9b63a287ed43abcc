use crate::error::AgentError;
use crate::game::EpisodeStats;
use crate::infra::{GameObserver, PrimitiveCommand};
use crate::planners::rl::Intent;
use tracing::{debug, info, warn};

pub struct DefaultObserver;

impl GameObserver for DefaultObserver {
    fn on_episode_start(&mut self, episode: usize) {
        info!("Episode {} started", episode);
    }

    fn on_intent_selected(&mut self, tick: usize, intent: Intent) {
        info!("tick: {}, intent: {}", tick, intent);
    }

    fn on_command(&mut self, tick: usize, command: &PrimitiveCommand) {
        debug!("tick: {}, command: {}", tick, command);
    }

    fn on_tick_error(&mut self, tick: usize, error: &AgentError) {
        warn!("tick: {}, sending no_op: {}", tick, error);
    }

    fn on_episode_end(&mut self, stats: &EpisodeStats) {
        info!("Episode {} finished", stats.episode);
        info!("- ticks: {}", stats.ticks);
        info!("- decisions: {}", stats.decisions);
        info!("- total reward: {}", stats.total_reward);
        if stats.substitutions > 0 {
            info!("- no-op substitutions: {}", stats.substitutions);
        }
    }
}
