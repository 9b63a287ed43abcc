//! Reduces a raw observation to the compact key of the policy table

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::infra::Position;

use super::observation::{Layer, Observation, PlayerRelative};
use super::units::{LARVA, StructureKind, UnitKind};

/// Upper bounds (inclusive) of the footprint buckets, in screen cells.
const FOOTPRINT_BUCKETS: [usize; 4] = [0, 4, 16, 64];

/// A coarse cell of the minimap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sector {
    pub col: u8,
    pub row: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateDescriptor {
    /// Presence mask of own structure kinds, see [`StructureKind::mask_bit`].
    pub structures: u16,
    /// Bucketed screen footprint of own drones.
    pub workers: u8,
    /// Bucketed screen footprint of own army units.
    pub army: u8,
    pub larva: bool,
    pub own_sector: Option<Sector>,
    pub hostile_sector: Option<Sector>,
}

impl StateDescriptor {
    pub fn has_structure(&self, kind: StructureKind) -> bool {
        self.structures & kind.mask_bit() != 0
    }
}

impl fmt::Display for StateDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sector = |s: Option<Sector>| match s {
            Some(s) => format!("{}:{}", s.col, s.row),
            None => "-".to_string(),
        };
        write!(
            f,
            "[structures {:#06x}, workers {}, army {}, larva {}, own {}, hostile {}]",
            self.structures,
            self.workers,
            self.army,
            self.larva,
            sector(self.own_sector),
            sector(self.hostile_sector)
        )
    }
}

fn bucket(cells: usize) -> u8 {
    FOOTPRINT_BUCKETS
        .iter()
        .position(|&upper| cells <= upper)
        .unwrap_or(FOOTPRINT_BUCKETS.len()) as u8
}

#[derive(Debug, Clone, Copy)]
pub struct StateAbstractor {
    /// Number of sectors along each minimap axis.
    sectors: u8,
}

impl Default for StateAbstractor {
    fn default() -> Self {
        Self { sectors: 4 }
    }
}

impl StateAbstractor {
    pub fn new(sectors: u8) -> Self {
        Self {
            sectors: sectors.max(1),
        }
    }

    /// Derives the descriptor of `observation`. Depends on nothing else.
    pub fn abstract_state(&self, observation: &Observation) -> Result<StateDescriptor, AgentError> {
        let (relative, unit_type) = observation.screen_layers()?;
        let minimap = observation.minimap_relative()?;

        let own = PlayerRelative::Own as i32;
        let mut structures = 0u16;
        let mut workers = 0usize;
        let mut army = 0usize;
        let mut larva = false;

        for (pos, owner) in relative.iter() {
            if owner != own {
                continue;
            }
            let Some(id) = unit_type.get(&pos) else {
                continue;
            };
            if let Some(kind) = StructureKind::from_unit_type_id(id) {
                structures |= kind.mask_bit();
            } else if let Some(unit) = UnitKind::from_unit_type_id(id) {
                if unit == UnitKind::Drone {
                    workers += 1;
                } else if unit.is_army() {
                    army += 1;
                }
            } else if id == LARVA {
                larva = true;
            }
        }

        Ok(StateDescriptor {
            structures,
            workers: bucket(workers),
            army: bucket(army),
            larva,
            own_sector: self.sector_of(minimap, PlayerRelative::Own),
            hostile_sector: self.sector_of(minimap, PlayerRelative::Hostile),
        })
    }

    fn sector_of(&self, minimap: &Layer, owner: PlayerRelative) -> Option<Sector> {
        let Position { x, y } = minimap.mean_position(owner as i32)?;
        let sectors = self.sectors as i64;
        let col = (x as i64 * sectors / minimap.width as i64).clamp(0, sectors - 1);
        let row = (y as i64 * sectors / minimap.height as i64).clamp(0, sectors - 1);
        Some(Sector {
            col: col as u8,
            row: row as u8,
        })
    }
}
