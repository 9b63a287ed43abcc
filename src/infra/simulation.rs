//! Boundary between the agent and whatever runs the game

use std::error::Error;
use std::io::{BufRead, Write};

use tracing::trace;

use crate::error::AgentError;
use crate::infra::PrimitiveCommand;
use crate::state::Observation;

/// A game the agent plays: observations in, one command per observation out.
pub trait Simulation {
    /// The next observation, or `None` once the game has nothing more to send.
    fn observe(&mut self) -> Result<Option<Observation>, Box<dyn Error>>;

    fn act(&mut self, command: &PrimitiveCommand) -> Result<(), Box<dyn Error>>;
}

/// Line-delimited JSON over a reader/writer pair, typically stdin and stdout.
///
/// Blank lines are skipped. A line that does not parse as an observation is
/// reported as a recoverable [`AgentError::MalformedObservation`].
pub struct StdioSimulation<R: BufRead, W: Write> {
    reader: R,
    writer: W,
    line: String,
}

impl<R: BufRead, W: Write> StdioSimulation<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            line: String::new(),
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<R: BufRead, W: Write> Simulation for StdioSimulation<R, W> {
    fn observe(&mut self) -> Result<Option<Observation>, Box<dyn Error>> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }
            trace!("Received {} bytes", line.len());
            return serde_json::from_str(line)
                .map(Some)
                .map_err(|e| Box::new(AgentError::MalformedObservation(e.to_string())) as Box<dyn Error>);
        }
    }

    fn act(&mut self, command: &PrimitiveCommand) -> Result<(), Box<dyn Error>> {
        serde_json::to_writer(&mut self.writer, command)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
