use crate::error::AgentError;
use crate::game::EpisodeStats;
use crate::infra::PrimitiveCommand;
use crate::planners::rl::Intent;

/// Trait for observing game events during execution
pub trait GameObserver {
    /// Called when a new episode starts
    fn on_episode_start(&mut self, episode: usize);

    /// Called when the agent selects a new intent
    fn on_intent_selected(&mut self, tick: usize, intent: Intent);

    /// Called with the command sent for every tick
    fn on_command(&mut self, _tick: usize, _command: &PrimitiveCommand) {
        // Default implementation does nothing
    }

    /// Called when a tick fell back to a no-op because of a recoverable error
    fn on_tick_error(&mut self, tick: usize, error: &AgentError);

    /// Called when an episode ends
    fn on_episode_end(&mut self, stats: &EpisodeStats);
}
