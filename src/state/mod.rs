mod abstractor;
mod observation;
pub mod units;

pub use abstractor::{Sector, StateAbstractor, StateDescriptor};
pub use observation::{Layer, Observation, ObservationBuilder, PlayerRelative, StepType};
pub use units::{Placement, StructureKind, UnitKind, Upgrade};
