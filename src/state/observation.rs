use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::infra::{FunctionId, Position};

/// Owner class values of the player-relative layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerRelative {
    Background = 0,
    Own = 1,
    Ally = 2,
    Neutral = 3,
    Hostile = 4,
}

/// Where a tick sits inside its episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    First,
    #[default]
    Mid,
    Last,
}

/// A row-major grid of integer feature values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub width: i32,
    pub height: i32,
    cells: Vec<i32>,
}

impl Layer {
    pub fn new(width: i32, height: i32, cells: Vec<i32>) -> Self {
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn filled(width: i32, height: i32, value: i32) -> Self {
        let len = cell_count(width, height).unwrap_or(0);
        Self::new(width, height, vec![value; len])
    }

    /// Positive dimensions that account for exactly the stored cells.
    pub fn is_consistent(&self) -> bool {
        self.width > 0
            && self.height > 0
            && cell_count(self.width, self.height) == Some(self.cells.len())
    }

    fn index(&self, pos: &Position) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width || pos.y >= self.height {
            return None;
        }
        (pos.y as usize)
            .checked_mul(self.width as usize)?
            .checked_add(pos.x as usize)
    }

    pub fn get(&self, pos: &Position) -> Option<i32> {
        self.index(pos).and_then(|i| self.cells.get(i)).copied()
    }

    pub fn set(&mut self, pos: &Position, value: i32) {
        if let Some(i) = self.index(pos)
            && let Some(cell) = self.cells.get_mut(i)
        {
            *cell = value;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, i32)> + '_ {
        let width = usize::try_from(self.width).unwrap_or(0).max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &v)| (Position::new((i % width) as i32, (i / width) as i32), v))
    }

    /// Mean cell of `value`, truncated towards zero. `None` when absent.
    pub fn mean_position(&self, value: i32) -> Option<Position> {
        mean_of(self.iter().filter(|&(_, v)| v == value).map(|(pos, _)| pos))
    }
}

fn cell_count(width: i32, height: i32) -> Option<usize> {
    let width = usize::try_from(width).ok()?;
    let height = usize::try_from(height).ok()?;
    width.checked_mul(height)
}

/// Truncated mean of `positions`, `None` when there are none.
fn mean_of(positions: impl IntoIterator<Item = Position>) -> Option<Position> {
    let (mut sum_x, mut sum_y, mut n) = (0i64, 0i64, 0i64);
    for pos in positions {
        sum_x += pos.x as i64;
        sum_y += pos.y as i64;
        n += 1;
    }
    if n == 0 {
        return None;
    }
    Some(Position::new((sum_x / n) as i32, (sum_y / n) as i32))
}

/// Per-tick snapshot handed over by the simulation host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub step_type: StepType,
    /// Reward observed on this tick.
    #[serde(default)]
    pub reward: f64,
    /// Screen layer of owner classes, see [`PlayerRelative`].
    #[serde(default)]
    pub player_relative: Option<Layer>,
    /// Screen layer of unit-type ids.
    #[serde(default)]
    pub unit_type: Option<Layer>,
    #[serde(default)]
    pub minimap_player_relative: Option<Layer>,
    /// Functions the host accepts on this tick.
    #[serde(default)]
    pub available_actions: BTreeSet<FunctionId>,
}

impl Observation {
    fn checked<'a>(layer: &'a Option<Layer>, name: &str) -> Result<&'a Layer, AgentError> {
        match layer {
            Some(layer) if layer.is_consistent() => Ok(layer),
            Some(_) => Err(AgentError::MalformedObservation(format!(
                "{} dimensions do not match its cells",
                name
            ))),
            None => Err(AgentError::MalformedObservation(format!("{} is missing", name))),
        }
    }

    pub fn screen_relative(&self) -> Result<&Layer, AgentError> {
        Self::checked(&self.player_relative, "player_relative")
    }

    pub fn screen_unit_type(&self) -> Result<&Layer, AgentError> {
        Self::checked(&self.unit_type, "unit_type")
    }

    pub fn minimap_relative(&self) -> Result<&Layer, AgentError> {
        Self::checked(&self.minimap_player_relative, "minimap_player_relative")
    }

    pub fn is_available(&self, function: FunctionId) -> bool {
        function == FunctionId::NoOp || self.available_actions.contains(&function)
    }

    /// The owner and unit-type screen layers, checked to cover the same cells.
    pub fn screen_layers(&self) -> Result<(&Layer, &Layer), AgentError> {
        let relative = self.screen_relative()?;
        let unit_type = self.screen_unit_type()?;
        if relative.width != unit_type.width || relative.height != unit_type.height {
            return Err(AgentError::MalformedObservation(
                "screen layers differ in size".to_string(),
            ));
        }
        Ok((relative, unit_type))
    }

    /// Screen cells showing a unit of `unit_type` that belongs to `owner`.
    pub fn unit_positions(
        &self,
        unit_type: i32,
        owner: PlayerRelative,
    ) -> Result<Vec<Position>, AgentError> {
        let (relative, unit_types) = self.screen_layers()?;
        Ok(unit_types
            .iter()
            .filter(|&(pos, id)| id == unit_type && relative.get(&pos) == Some(owner as i32))
            .map(|(pos, _)| pos)
            .collect())
    }

    pub fn has_unit(&self, unit_type: i32, owner: PlayerRelative) -> Result<bool, AgentError> {
        Ok(!self.unit_positions(unit_type, owner)?.is_empty())
    }

    pub fn mean_unit_position(
        &self,
        unit_type: i32,
        owner: PlayerRelative,
    ) -> Result<Option<Position>, AgentError> {
        Ok(mean_of(self.unit_positions(unit_type, owner)?))
    }
}

/// Assembles observations cell by cell, used by tests and replays.
#[derive(Debug, Clone)]
pub struct ObservationBuilder {
    observation: Observation,
}

impl ObservationBuilder {
    pub fn new(screen_size: i32, minimap_size: i32) -> Self {
        Self {
            observation: Observation {
                step_type: StepType::Mid,
                reward: 0.0,
                player_relative: Some(Layer::filled(screen_size, screen_size, 0)),
                unit_type: Some(Layer::filled(screen_size, screen_size, 0)),
                minimap_player_relative: Some(Layer::filled(minimap_size, minimap_size, 0)),
                available_actions: BTreeSet::new(),
            },
        }
    }

    /// Places a unit of `unit_type` owned by `owner` on a screen cell.
    pub fn unit(mut self, pos: Position, unit_type: i32, owner: PlayerRelative) -> Self {
        if let Some(layer) = self.observation.unit_type.as_mut() {
            layer.set(&pos, unit_type);
        }
        if let Some(layer) = self.observation.player_relative.as_mut() {
            layer.set(&pos, owner as i32);
        }
        self
    }

    pub fn minimap(mut self, pos: Position, owner: PlayerRelative) -> Self {
        if let Some(layer) = self.observation.minimap_player_relative.as_mut() {
            layer.set(&pos, owner as i32);
        }
        self
    }

    pub fn available(mut self, function: FunctionId) -> Self {
        self.observation.available_actions.insert(function);
        self
    }

    pub fn reward(mut self, reward: f64) -> Self {
        self.observation.reward = reward;
        self
    }

    pub fn step_type(mut self, step_type: StepType) -> Self {
        self.observation.step_type = step_type;
        self
    }

    pub fn build(self) -> Observation {
        self.observation
    }
}
