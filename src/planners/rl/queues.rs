//! Production queues for structures, units and research

use std::collections::VecDeque;
use std::fmt::Debug;

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::error::AgentError;
use crate::infra::{FunctionId, Position};
use crate::state::units::{LARVA, VESPENE_GEYSER};
use crate::state::{Observation, Placement, PlayerRelative, StructureKind, UnitKind, Upgrade};

/// A pending production item that must be grounded in an observation before
/// it can be turned into a command.
pub trait ProductionRequest: Debug + Clone {
    type Order: Debug + Clone;

    fn resolve<R: Rng + ?Sized>(
        &self,
        observation: &Observation,
        rng: &mut R,
    ) -> Result<Self::Order, AgentError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructureRequest {
    pub structure: StructureKind,
    /// Fixed placement; resolved from the observation when unset.
    pub target: Option<Position>,
}

impl StructureRequest {
    pub fn new(structure: StructureKind) -> Self {
        Self {
            structure,
            target: None,
        }
    }

    pub fn at(structure: StructureKind, target: Position) -> Self {
        Self {
            structure,
            target: Some(target),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementOrder {
    pub structure: StructureKind,
    pub target: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitRequest {
    pub unit: UnitKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResearchRequest {
    pub upgrade: Upgrade,
}

fn require_available(observation: &Observation, function: FunctionId) -> Result<(), AgentError> {
    if observation.is_available(function) {
        Ok(())
    } else {
        Err(AgentError::UnresolvableTarget(format!(
            "{} is not available",
            function.as_str_name()
        )))
    }
}

/// Mean position of the agent's main base, whichever tier it has morphed into.
pub fn town_hall_position(observation: &Observation) -> Result<Option<Position>, AgentError> {
    for kind in [StructureKind::Hatchery, StructureKind::Lair, StructureKind::Hive] {
        let pos = observation.mean_unit_position(kind.unit_type_id(), PlayerRelative::Own)?;
        if let Some(pos) = pos {
            return Ok(Some(pos));
        }
    }
    Ok(None)
}

fn anchor_position(
    observation: &Observation,
    anchor: StructureKind,
) -> Result<Option<Position>, AgentError> {
    match anchor {
        StructureKind::Hatchery => town_hall_position(observation),
        _ => observation.mean_unit_position(anchor.unit_type_id(), PlayerRelative::Own),
    }
}

fn require_structure(observation: &Observation, kind: StructureKind) -> Result<(), AgentError> {
    if anchor_position(observation, kind)?.is_some() {
        Ok(())
    } else {
        Err(AgentError::UnresolvableTarget(format!("no {:?} on screen", kind)))
    }
}

/// Picks the placement cell for `structure` from the observation.
///
/// Extractors go on a random geyser cell; everything else sits at a fixed
/// offset from the mean position of its anchor structure.
pub fn select_structure_target<R: Rng + ?Sized>(
    structure: StructureKind,
    observation: &Observation,
    rng: &mut R,
) -> Result<Position, AgentError> {
    if structure == StructureKind::Extractor {
        let geysers = observation.unit_positions(VESPENE_GEYSER, PlayerRelative::Neutral)?;
        return geysers
            .choose(rng)
            .copied()
            .ok_or_else(|| AgentError::UnresolvableTarget("no vespene geyser on screen".into()));
    }

    let anchor = structure.anchor();
    let (dx, dy) = structure.offset();
    anchor_position(observation, anchor)?
        .map(|pos| pos.offset(dx, dy))
        .ok_or_else(|| {
            AgentError::UnresolvableTarget(format!("no {:?} to place {:?} next to", anchor, structure))
        })
}

impl ProductionRequest for StructureRequest {
    type Order = PlacementOrder;

    fn resolve<R: Rng + ?Sized>(
        &self,
        observation: &Observation,
        rng: &mut R,
    ) -> Result<PlacementOrder, AgentError> {
        if self.structure.placement() == Placement::Morph {
            require_available(observation, self.structure.build_function())?;
        }
        let target = match self.target {
            Some(target) => target,
            None => select_structure_target(self.structure, observation, rng)?,
        };
        Ok(PlacementOrder {
            structure: self.structure,
            target,
        })
    }
}

impl ProductionRequest for UnitRequest {
    type Order = UnitKind;

    fn resolve<R: Rng + ?Sized>(
        &self,
        observation: &Observation,
        _rng: &mut R,
    ) -> Result<UnitKind, AgentError> {
        if self.unit.needs_larva() && !observation.has_unit(LARVA, PlayerRelative::Own)? {
            return Err(AgentError::UnresolvableTarget("no larva on screen".into()));
        }
        if let Some(required) = self.unit.requires() {
            require_structure(observation, required)?;
        }
        require_available(observation, self.unit.train_function())?;
        Ok(self.unit)
    }
}

impl ProductionRequest for ResearchRequest {
    type Order = Upgrade;

    fn resolve<R: Rng + ?Sized>(
        &self,
        observation: &Observation,
        _rng: &mut R,
    ) -> Result<Upgrade, AgentError> {
        require_structure(observation, self.upgrade.researched_at())?;
        require_available(observation, self.upgrade.research_function())?;
        Ok(self.upgrade)
    }
}

/// FIFO of pending requests of one category.
#[derive(Debug, Clone)]
pub struct ProductionQueue<T> {
    pending: VecDeque<T>,
}

impl<T> Default for ProductionQueue<T> {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }
}

impl<T: ProductionRequest> ProductionQueue<T> {
    pub fn enqueue(&mut self, request: T) {
        self.pending.push_back(request);
    }

    /// Resolves and removes the head request.
    ///
    /// `Ok(None)` when the queue is empty. When the head cannot be resolved
    /// it stays at the head and the error is returned.
    pub fn dequeue<R: Rng + ?Sized>(
        &mut self,
        observation: &Observation,
        rng: &mut R,
    ) -> Result<Option<T::Order>, AgentError> {
        let Some(head) = self.pending.front() else {
            return Ok(None);
        };
        let order = head.resolve(observation, rng)?;
        self.pending.pop_front();
        Ok(Some(order))
    }

    pub fn peek(&self) -> Option<&T> {
        self.pending.front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.pending.iter()
    }
}

/// The three independent production queues of one agent.
#[derive(Debug, Clone, Default)]
pub struct ProductionQueues {
    pub structures: ProductionQueue<StructureRequest>,
    pub units: ProductionQueue<UnitRequest>,
    pub research: ProductionQueue<ResearchRequest>,
}

impl ProductionQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// A roach-timing opening: pool, gas, warren, then the army to use them.
    pub fn opening() -> Self {
        let mut queues = Self::new();
        for structure in [
            StructureKind::SpawningPool,
            StructureKind::Extractor,
            StructureKind::RoachWarren,
            StructureKind::EvolutionChamber,
        ] {
            queues.structures.enqueue(StructureRequest::new(structure));
        }
        for unit in [
            UnitKind::Overlord,
            UnitKind::Zergling,
            UnitKind::Zergling,
            UnitKind::Queen,
            UnitKind::Roach,
            UnitKind::Roach,
            UnitKind::Overlord,
            UnitKind::Roach,
        ] {
            queues.units.enqueue(UnitRequest { unit });
        }
        for upgrade in [
            Upgrade::MetabolicBoost,
            Upgrade::GlialRegeneration,
            Upgrade::MissileWeapons,
        ] {
            queues.research.enqueue(ResearchRequest { upgrade });
        }
        queues
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty() && self.units.is_empty() && self.research.is_empty()
    }

    pub fn clear(&mut self) {
        self.structures.clear();
        self.units.clear();
        self.research.clear();
    }
}
