use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use time::OffsetDateTime;
use time::format_description;

use crate::infra::PrimitiveCommand;
use crate::planners::rl::Intent;

#[derive(Serialize)]
struct TranscriptEntry<'a> {
    tick: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    intent: Option<String>,
    command: &'a PrimitiveCommand,
}

/// Records the commands of one episode as JSON lines.
pub struct TranscriptFile {
    path: PathBuf,
    file: BufWriter<File>,
}

impl TranscriptFile {
    pub fn new(transcripts_folder: &str, episode: usize) -> io::Result<Self> {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let format = format_description::parse("[year][month][day]-[hour][minute][second]")
            .map_err(io::Error::other)?;
        let date_time_str = now.format(&format).map_err(io::Error::other)?;

        let path = Path::new(transcripts_folder)
            .join(format!("botty - {} - episode {}.jsonl", date_time_str, episode));

        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = BufWriter::new(File::create(&path)?);
        Ok(TranscriptFile { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends the command sent on `tick`, with the intent chosen on that tick if any.
    pub fn append(
        &mut self,
        tick: usize,
        intent: Option<Intent>,
        command: &PrimitiveCommand,
    ) -> io::Result<()> {
        let entry = TranscriptEntry {
            tick,
            intent: intent.map(|intent| intent.to_string()),
            command,
        };
        serde_json::to_writer(&mut self.file, &entry)?;
        self.file.write_all(b"\n")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{FunctionId, Position};

    #[test]
    fn test_records_one_line_per_command() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("transcripts");
        let mut transcript = TranscriptFile::new(folder.to_str().unwrap(), 3).unwrap();

        transcript
            .append(1, Some(Intent::Defend), &PrimitiveCommand::select_army())
            .unwrap();
        transcript
            .append(
                2,
                None,
                &PrimitiveCommand::screen(FunctionId::AttackScreen, Position::new(30, 30)),
            )
            .unwrap();
        transcript.flush().unwrap();

        let name = transcript.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("botty - "));
        assert!(name.ends_with(" - episode 3.jsonl"));

        let content = std::fs::read_to_string(transcript.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            r#"{"tick":1,"intent":"defend","command":{"function":"select_army","arguments":[[0]]}}"#
        );
        assert!(!lines[1].contains("intent"));
    }
}
