use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::agent::errors::AgentError;
use crate::agent::insight_agent::Insight;

/// Prints each insight and optionally appends it to a JSON lines archive.
pub struct InsightSink<W: Write> {
    output: W,
    archive: Option<BufWriter<File>>
}

impl<W: Write> InsightSink<W> {
    pub fn new(output: W) -> Self {
        Self { output, archive: None }
    }

    pub fn with_archive(mut self, path: &Path) -> Result<Self, AgentError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        self.archive = Some(BufWriter::new(file));
        Ok(self)
    }

    pub fn publish(&mut self, insight: &Insight) -> Result<(), AgentError> {
        writeln!(
            self.output,
            "=== Insight #{} | {} rows{} | through {} ===",
            insight.tick,
            insight.rows,
            if insight.truncated { " (prompt truncated)" } else { "" },
            insight.window_end.timestamp.format("%Y-%m-%d %H:%M:%S%.6f")
        )?;
        writeln!(self.output, "{}\n", insight.summary.trim_end())?;
        self.output.flush()?;

        if let Some(archive) = self.archive.as_mut() {
            serde_json::to_writer(&mut *archive, insight)?;
            archive.write_all(b"\n")?;
            archive.flush()?;
        }

        Ok(())
    }
}
