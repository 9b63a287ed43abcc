mod command;
mod default_observer;
mod game_observer;
mod simulation;
mod transcript;
mod types;

pub use command::{FunctionId, NOT_QUEUED, PrimitiveCommand, SELECT_ALL};
pub use default_observer::DefaultObserver;
pub use game_observer::GameObserver;
pub use simulation::{Simulation, StdioSimulation};
pub use transcript::TranscriptFile;
pub use types::{BaseSide, Bounds, Position};
