pub mod error;
pub mod game;
pub mod infra;
pub mod planners;
pub mod state;

// Re-export commonly used types for convenience
pub use error::AgentError;
pub use infra::{Position, PrimitiveCommand};
pub use planners::rl::{AgentConfig, AgentLoop, Intent};
pub use state::{Observation, StateDescriptor};
