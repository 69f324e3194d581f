//! Where a finished run's output goes. Neither implementation here talks to a database or an
//! HTTP endpoint; wiring this trait to one is genuinely external to this crate.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use rf_coverage_core::simulator::RunOutput;

use crate::error::AdapterResult;

pub trait ResultSink: Send + Sync {
    fn publish(&self, bundle: &RunOutput) -> AdapterResult<()>;
}

/// Writes the run bundle as pretty-printed JSON to a fixed path.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl ResultSink for JsonFileSink {
    fn publish(&self, bundle: &RunOutput) -> AdapterResult<()> {
        let file = File::create(&self.path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, bundle)?;
        tracing::debug!(path = %self.path.display(), "wrote run output");
        Ok(())
    }
}

/// Discards the bundle. Used in tests and benchmarks where persistence is irrelevant.
#[derive(Debug, Default)]
pub struct NullSink;

impl ResultSink for NullSink {
    fn publish(&self, _bundle: &RunOutput) -> AdapterResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn sample_output() -> RunOutput {
        RunOutput {
            received_power: vec![vec![-90.0]],
            rays: vec![(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0))],
            walls: vec![],
            skipped_rays: 0,
        }
    }

    #[test]
    fn null_sink_always_succeeds() {
        assert!(NullSink.publish(&sample_output()).is_ok());
    }

    #[test]
    fn json_file_sink_writes_a_readable_file() {
        let dir = std::env::temp_dir().join(format!("rf-coverage-sink-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("output.json");
        let sink = JsonFileSink::new(&path);

        sink.publish(&sample_output()).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("received_power"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
