//! Agent configuration

use std::env;
use std::str::FromStr;

use crate::error::AgentError;

use super::catalog::{MAP_SIZE, NAVIGATION_STRIDE};

/// Learning and geometry parameters of one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Step size of the value update, in (0, 1]
    pub learning_rate: f64,
    /// Discount applied to the next state's best value, in [0, 1]
    pub discount: f64,
    /// Probability of picking a uniformly random intent, in [0, 1]
    pub exploration: f64,
    /// Side of the map coordinate space covered by navigation intents
    pub map_size: i32,
    /// Spacing of navigation intents
    pub navigation_stride: i32,
    /// Side of the square screen layers, in cells
    pub screen_size: i32,
    /// Side of the square minimap layer, in cells
    pub minimap_size: i32,
    /// Distance kept from the anchor when targeting combat commands
    pub standoff: i32,
    /// Seed for exploration and target selection; random when unset
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            discount: 0.9,
            exploration: 0.1,
            map_size: MAP_SIZE,
            navigation_stride: NAVIGATION_STRIDE,
            screen_size: 84,
            minimap_size: 64,
            standoff: 10,
            seed: None,
        }
    }
}

fn env_var<T: FromStr>(key: &str) -> Result<Option<T>, AgentError> {
    match env::var(key) {
        Ok(val) => val
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AgentError::InvalidConfig(format!("{} has an invalid value: {}", key, val))),
        Err(_) => Ok(None),
    }
}

impl AgentConfig {
    /// Defaults overridden by any `BOTTY_*` variable that is set.
    pub fn from_env() -> Result<Self, AgentError> {
        let defaults = Self::default();
        let config = Self {
            learning_rate: env_var("BOTTY_LEARNING_RATE")?.unwrap_or(defaults.learning_rate),
            discount: env_var("BOTTY_DISCOUNT")?.unwrap_or(defaults.discount),
            exploration: env_var("BOTTY_EXPLORATION")?.unwrap_or(defaults.exploration),
            map_size: env_var("BOTTY_MAP_SIZE")?.unwrap_or(defaults.map_size),
            navigation_stride: env_var("BOTTY_NAVIGATION_STRIDE")?
                .unwrap_or(defaults.navigation_stride),
            screen_size: env_var("BOTTY_SCREEN_SIZE")?.unwrap_or(defaults.screen_size),
            minimap_size: env_var("BOTTY_MINIMAP_SIZE")?.unwrap_or(defaults.minimap_size),
            standoff: env_var("BOTTY_STANDOFF")?.unwrap_or(defaults.standoff),
            seed: env_var("BOTTY_SEED")?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(AgentError::InvalidConfig(format!(
                "learning rate {} outside (0, 1]",
                self.learning_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(AgentError::InvalidConfig(format!(
                "discount {} outside [0, 1]",
                self.discount
            )));
        }
        if !(0.0..=1.0).contains(&self.exploration) {
            return Err(AgentError::InvalidConfig(format!(
                "exploration {} outside [0, 1]",
                self.exploration
            )));
        }
        if self.map_size <= 0 || self.navigation_stride <= 0 {
            return Err(AgentError::InvalidConfig(
                "map size and navigation stride must be positive".to_string(),
            ));
        }
        if self.screen_size <= 0 || self.minimap_size <= 0 {
            return Err(AgentError::InvalidConfig(
                "screen and minimap sizes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
