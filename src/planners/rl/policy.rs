//! Tabular policy: one row of intent values per abstract state

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::AgentError;
use crate::state::StateDescriptor;

use super::catalog::{ActionCatalog, Intent};
use super::config::AgentConfig;

/// Value every entry of a freshly inserted row starts at.
pub const DEFAULT_VALUE: f64 = 0.0;

/// Serialized form of one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRow {
    pub state: StateDescriptor,
    pub values: Vec<(Intent, f64)>,
}

/// Serialized form of a whole table, rows ordered by state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    pub rows: Vec<PolicyRow>,
}

/// Epsilon-greedy Q-table over the intents of an [`ActionCatalog`].
///
/// Rows are vectors aligned with the catalog order, so ties in [`choose`]
/// resolve to the intent declared first.
///
/// [`choose`]: PolicyTable::choose
#[derive(Debug)]
pub struct PolicyTable {
    catalog: Arc<ActionCatalog>,
    rows: HashMap<StateDescriptor, Vec<f64>>,
    learning_rate: f64,
    discount: f64,
    exploration: f64,
    rng: StdRng,
}

impl PolicyTable {
    pub fn new(catalog: Arc<ActionCatalog>, config: &AgentConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(catalog, config, rng)
    }

    pub fn with_rng(catalog: Arc<ActionCatalog>, config: &AgentConfig, rng: StdRng) -> Self {
        Self {
            catalog,
            rows: HashMap::new(),
            learning_rate: config.learning_rate,
            discount: config.discount,
            exploration: config.exploration,
            rng,
        }
    }

    pub fn catalog(&self) -> &Arc<ActionCatalog> {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn set_exploration(&mut self, exploration: f64) {
        self.exploration = exploration.clamp(0.0, 1.0);
    }

    pub fn has_row(&self, state: &StateDescriptor) -> bool {
        self.rows.contains_key(state)
    }

    /// Inserts a neutral row for `state`. The state must be new.
    pub fn add_row(&mut self, state: StateDescriptor) -> Result<(), AgentError> {
        if !self.ensure_row(&state) {
            return Err(AgentError::DuplicateState(state.to_string()));
        }
        Ok(())
    }

    /// Adds a row for `state` unless it already has one. Returns whether it did.
    pub fn ensure_row(&mut self, state: &StateDescriptor) -> bool {
        if self.has_row(state) {
            return false;
        }
        debug!("New policy row for {} ({} rows)", state, self.rows.len() + 1);
        self.rows
            .insert(*state, vec![DEFAULT_VALUE; self.catalog.len()]);
        true
    }

    pub fn row(&self, state: &StateDescriptor) -> Option<&[f64]> {
        self.rows.get(state).map(|row| row.as_slice())
    }

    pub fn value(&self, state: &StateDescriptor, intent: &Intent) -> Result<Option<f64>, AgentError> {
        let index = self.index_of(intent)?;
        Ok(self.rows.get(state).map(|row| row[index]))
    }

    /// Overwrites one entry, inserting the row first if needed.
    pub fn set_value(
        &mut self,
        state: &StateDescriptor,
        intent: &Intent,
        value: f64,
    ) -> Result<(), AgentError> {
        let index = self.index_of(intent)?;
        self.ensure_row(state);
        if let Some(row) = self.rows.get_mut(state) {
            row[index] = value;
        }
        Ok(())
    }

    pub fn max_value(&self, state: &StateDescriptor) -> Option<f64> {
        self.rows
            .get(state)
            .and_then(|row| row.iter().copied().reduce(f64::max))
    }

    /// The highest-valued intent of `state`, earliest in catalog order on ties.
    pub fn best_intent(&self, state: &StateDescriptor) -> Option<Intent> {
        let row = self.rows.get(state)?;
        let mut best: Option<(usize, f64)> = None;
        for (index, &value) in row.iter().enumerate() {
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((index, value)),
            }
        }
        best.and_then(|(index, _)| self.catalog.get(index))
    }

    /// Selects an intent for `state`, exploring with the configured probability.
    pub fn choose(&mut self, state: &StateDescriptor) -> Intent {
        self.ensure_row(state);

        if self.exploration > 0.0 && self.rng.random_bool(self.exploration) {
            let index = self.rng.random_range(0..self.catalog.len());
            if let Some(intent) = self.catalog.get(index) {
                trace!("Exploring with {}", intent);
                return intent;
            }
        }

        self.best_intent(state).unwrap_or(Intent::NoOp)
    }

    /// One-step Q-learning update of `(prev_state, prev_intent)`.
    ///
    /// Does nothing until both halves of the previous decision are known.
    pub fn learn(
        &mut self,
        prev_state: Option<&StateDescriptor>,
        new_state: &StateDescriptor,
        prev_intent: Option<Intent>,
        reward: f64,
    ) -> Result<(), AgentError> {
        let (Some(prev_state), Some(prev_intent)) = (prev_state, prev_intent) else {
            return Ok(());
        };
        let index = self.index_of(&prev_intent)?;

        self.ensure_row(new_state);
        self.ensure_row(prev_state);

        let next_best = self.max_value(new_state).unwrap_or(DEFAULT_VALUE);
        let target = reward + self.discount * next_best;

        if let Some(row) = self.rows.get_mut(prev_state) {
            let current = row[index];
            row[index] = current + self.learning_rate * (target - current);
            trace!(
                "Q({}, {}) {:.4} -> {:.4} (target {:.4})",
                prev_state, prev_intent, current, row[index], target
            );
        }
        Ok(())
    }

    fn index_of(&self, intent: &Intent) -> Result<usize, AgentError> {
        self.catalog
            .index_of(intent)
            .ok_or(AgentError::UnknownIntent(*intent))
    }

    pub fn snapshot(&self) -> PolicySnapshot {
        let mut rows: Vec<PolicyRow> = self
            .rows
            .iter()
            .map(|(state, values)| PolicyRow {
                state: *state,
                values: self.catalog.all().iter().copied().zip(values.iter().copied()).collect(),
            })
            .collect();
        rows.sort_by(|a, b| a.state.cmp(&b.state));
        PolicySnapshot { rows }
    }

    /// Replaces the table contents with `snapshot`.
    ///
    /// Intents missing from a stored row start at [`DEFAULT_VALUE`].
    pub fn restore(&mut self, snapshot: PolicySnapshot) -> Result<(), AgentError> {
        let mut rows = HashMap::with_capacity(snapshot.rows.len());
        for stored in snapshot.rows {
            let mut values = vec![DEFAULT_VALUE; self.catalog.len()];
            let mut seen = HashSet::new();
            for (intent, value) in stored.values {
                let index = self.index_of(&intent)?;
                seen.insert(index);
                values[index] = value;
            }
            if rows.insert(stored.state, values).is_some() {
                return Err(AgentError::DuplicateState(stored.state.to_string()));
            }
            if seen.len() < self.catalog.len() {
                debug!(
                    "Stored row for {} covers {} of {} intents",
                    stored.state,
                    seen.len(),
                    self.catalog.len()
                );
            }
        }
        self.rows = rows;
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AgentError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, &self.snapshot())?;
        writer.flush()?;
        debug!("Saved {} policy rows to {}", self.rows.len(), path.display());
        Ok(())
    }

    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), AgentError> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let snapshot: PolicySnapshot = serde_json::from_reader(reader)?;
        self.restore(snapshot)?;
        debug!("Loaded {} policy rows from {}", self.rows.len(), path.display());
        Ok(())
    }
}
