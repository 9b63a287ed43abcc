//! Tabular Q-learning planner
//!
//! Each tick flows through the same pipeline:
//!
//! ```text
//! Observation
//!     │
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  StateAbstractor                                            │
//! │  - Buckets counts and sectors into a StateDescriptor        │
//! └─────────────────────────────────────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  PolicyTable                                                │
//! │  - One value per (state, intent), epsilon-greedy choice     │
//! │  - Updated once per decision with the accumulated reward    │
//! └─────────────────────────────────────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ActionExpander                                             │
//! │  - Intent → primitive commands, consulting ProductionQueues │
//! └─────────────────────────────────────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  AgentLoop                                                  │
//! │  - Buffers the commands and emits one per tick              │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod agent;
pub mod catalog;
pub mod config;
pub mod expander;
pub mod policy;
pub mod queues;

pub use agent::{AgentLoop, EpisodePhase, LoopPhase, LoopStats, classify_base};
pub use catalog::{ActionCatalog, Intent, MAP_SIZE, NAVIGATION_STRIDE};
pub use config::AgentConfig;
pub use expander::{ActionExpander, army_centroid};
pub use policy::{PolicyRow, PolicySnapshot, PolicyTable};
pub use queues::{
    PlacementOrder, ProductionQueue, ProductionQueues, ProductionRequest, ResearchRequest,
    StructureRequest, UnitRequest,
};
