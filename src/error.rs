use std::error::Error;
use std::fmt;
use std::io;

use crate::planners::rl::Intent;

#[derive(Debug)]
pub enum AgentError {
    /// A required observation field is missing or inconsistent.
    MalformedObservation(String),
    /// An intent is not part of the action catalog.
    UnknownIntent(Intent),
    /// A policy row was inserted for a state that already has one.
    DuplicateState(String),
    /// A production or combat target could not be grounded in the observation.
    UnresolvableTarget(String),
    InvalidConfig(String),
    Persistence(PersistenceError),
}

#[derive(Debug)]
pub enum PersistenceError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl AgentError {
    /// Whether the tick loop may carry on after this error by sending a no-op.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AgentError::MalformedObservation(_) | AgentError::UnresolvableTarget(_)
        )
    }
}

impl fmt::Display for AgentError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AgentError::MalformedObservation(field) => {
                write!(formatter, "Malformed observation: {}", field)
            }
            AgentError::UnknownIntent(intent) => {
                write!(formatter, "Intent {} is not in the action catalog", intent)
            }
            AgentError::DuplicateState(state) => {
                write!(formatter, "Policy table already has a row for {}", state)
            }
            AgentError::UnresolvableTarget(reason) => {
                write!(formatter, "Unresolvable target: {}", reason)
            }
            AgentError::InvalidConfig(reason) => {
                write!(formatter, "Invalid configuration: {}", reason)
            }
            AgentError::Persistence(PersistenceError::Io(err)) => {
                write!(formatter, "Policy storage failed: {}", err)
            }
            AgentError::Persistence(PersistenceError::Json(err)) => {
                write!(formatter, "Policy encoding failed: {}", err)
            }
        }
    }
}

impl Error for AgentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AgentError::Persistence(PersistenceError::Io(err)) => Some(err),
            AgentError::Persistence(PersistenceError::Json(err)) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for AgentError {
    fn from(err: io::Error) -> Self {
        AgentError::Persistence(PersistenceError::Io(err))
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::Persistence(PersistenceError::Json(err))
    }
}
