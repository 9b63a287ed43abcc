//! The closed set of intents the policy chooses from

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

/// Side length of the map coordinate space covered by navigation intents.
pub const MAP_SIZE: i32 = 128;

/// Spacing between neighbouring navigation intents on both axes.
pub const NAVIGATION_STRIDE: i32 = 8;

/// A high-level action chosen by the policy and expanded into commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    NoOp,
    BuildStructure,
    BuildUnit,
    BuildWorker,
    Research,
    Cancel,
    Attack,
    Defend,
    Patrol,
    ReturnToBase,
    /// Recenter the viewport on a map coordinate.
    Navigate { x: i32, y: i32 },
}

impl Intent {
    /// Hand-authored intents in declaration order.
    pub const BASE: [Intent; 10] = [
        Intent::NoOp,
        Intent::BuildStructure,
        Intent::BuildUnit,
        Intent::BuildWorker,
        Intent::Research,
        Intent::Cancel,
        Intent::Attack,
        Intent::Defend,
        Intent::Patrol,
        Intent::ReturnToBase,
    ];
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::NoOp => write!(f, "no_op"),
            Intent::BuildStructure => write!(f, "build_building"),
            Intent::BuildUnit => write!(f, "build_units"),
            Intent::BuildWorker => write!(f, "build_workers"),
            Intent::Research => write!(f, "research"),
            Intent::Cancel => write!(f, "cancel"),
            Intent::Attack => write!(f, "attack"),
            Intent::Defend => write!(f, "defend"),
            Intent::Patrol => write!(f, "patrol"),
            Intent::ReturnToBase => write!(f, "return_to_base"),
            Intent::Navigate { x, y } => write!(f, "move_view_{}_{}", x, y),
        }
    }
}

static STANDARD: LazyLock<Arc<ActionCatalog>> =
    LazyLock::new(|| Arc::new(ActionCatalog::new(MAP_SIZE, NAVIGATION_STRIDE)));

/// Ordered, immutable registry of every intent.
///
/// The base intents come first, followed by one navigation intent per grid
/// point, column-major. The order is the tie-break order of the policy.
#[derive(Debug)]
pub struct ActionCatalog {
    intents: Vec<Intent>,
    indices: HashMap<Intent, usize>,
}

impl ActionCatalog {
    pub fn new(map_size: i32, stride: i32) -> Self {
        let stride = stride.max(1);
        let mut intents = Intent::BASE.to_vec();
        for x in (0..map_size).step_by(stride as usize) {
            for y in (0..map_size).step_by(stride as usize) {
                intents.push(Intent::Navigate { x, y });
            }
        }
        let indices = intents.iter().enumerate().map(|(i, &a)| (a, i)).collect();

        Self { intents, indices }
    }

    /// The process-wide catalog for the default map geometry.
    pub fn standard() -> Arc<ActionCatalog> {
        Arc::clone(&STANDARD)
    }

    pub fn all(&self) -> &[Intent] {
        &self.intents
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Intent> {
        self.intents.get(index).copied()
    }

    pub fn index_of(&self, intent: &Intent) -> Option<usize> {
        self.indices.get(intent).copied()
    }

    pub fn contains(&self, intent: &Intent) -> bool {
        self.indices.contains_key(intent)
    }

    pub fn is_navigation(&self, intent: &Intent) -> Option<(i32, i32)> {
        match intent {
            Intent::Navigate { x, y } if self.contains(intent) => Some((*x, *y)),
            _ => None,
        }
    }
}
