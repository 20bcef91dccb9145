//! Per-step trace output.
//!
//! The dynamics engine reports every step to a [`TraceSink`]. Sinks decide
//! what to keep: nothing, an in-memory log, or two text files (the
//! order-parameter time series and the raw per-window overlaps).

use serde::Serialize;
use sparsenet_core::error::{Result, SparsenetError};
use sparsenet_core::types::{MacroscopicSummary, Step};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Column header of the time-series file.
pub const TIME_SERIES_HEADER: &str = "time, m, dm, q, dq, th, dth, hamming(%)";

/// One row of the time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TraceStep {
    pub step: Step,
    pub summary: MacroscopicSummary,
    /// Percentage of nodes that changed state during this step.
    pub hamming_percent: f64,
}

/// Receives per-step observations from the dynamics engine.
pub trait TraceSink {
    fn record_step(&mut self, step: &TraceStep) -> Result<()>;

    /// Whether per-window overlaps should be computed and passed on.
    fn wants_windows(&self) -> bool {
        false
    }

    fn record_windows(&mut self, _step: Step, _overlaps: &[f64]) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn record_step(&mut self, _step: &TraceStep) -> Result<()> {
        Ok(())
    }
}

/// Keeps the full trace in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryTraceSink {
    pub steps: Vec<TraceStep>,
    pub windows: Vec<(Step, Vec<f64>)>,
    capture_windows: bool,
}

impl MemoryTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also capture per-window overlaps.
    pub fn with_windows() -> Self {
        Self {
            capture_windows: true,
            ..Self::default()
        }
    }
}

impl TraceSink for MemoryTraceSink {
    fn record_step(&mut self, step: &TraceStep) -> Result<()> {
        self.steps.push(*step);
        Ok(())
    }

    fn wants_windows(&self) -> bool {
        self.capture_windows
    }

    fn record_windows(&mut self, step: Step, overlaps: &[f64]) -> Result<()> {
        self.windows.push((step, overlaps.to_vec()));
        Ok(())
    }
}

/// Writes `mdqintime_<name>` and, optionally, `xmi_<name>` under a directory.
pub struct FileTraceSink {
    series: BufWriter<File>,
    series_path: PathBuf,
    windows: Option<(BufWriter<File>, PathBuf)>,
}

impl FileTraceSink {
    /// Create the time-series file (and the window file when
    /// `with_windows` is set) and write the header.
    pub fn create(dir: &Path, name: &str, with_windows: bool) -> Result<Self> {
        let series_path = dir.join(format!("mdqintime_{name}"));
        let mut series = open(&series_path)?;
        writeln!(series, "{TIME_SERIES_HEADER}").map_err(|e| SparsenetError::io(&series_path, e))?;

        let windows = if with_windows {
            let path = dir.join(format!("xmi_{name}"));
            Some((open(&path)?, path))
        } else {
            None
        };

        Ok(Self {
            series,
            series_path,
            windows,
        })
    }

    pub fn series_path(&self) -> &Path {
        &self.series_path
    }

    pub fn windows_path(&self) -> Option<&Path> {
        self.windows.as_ref().map(|(_, p)| p.as_path())
    }
}

impl TraceSink for FileTraceSink {
    fn record_step(&mut self, step: &TraceStep) -> Result<()> {
        let s = &step.summary;
        writeln!(
            self.series,
            "{}, {:.6}, {:.6}, {:.6}, {:.6}, {:.6}, {:.6}, {:.6}",
            step.step,
            s.overlap,
            s.overlap_std,
            s.activity,
            s.activity_std,
            s.threshold,
            s.threshold_std,
            step.hamming_percent
        )
        .map_err(|e| SparsenetError::io(&self.series_path, e))
    }

    fn wants_windows(&self) -> bool {
        self.windows.is_some()
    }

    fn record_windows(&mut self, _step: Step, overlaps: &[f64]) -> Result<()> {
        if let Some((writer, path)) = self.windows.as_mut() {
            let line = overlaps
                .iter()
                .map(|o| format!("{o:.6}"))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(writer, "{line}").map_err(|e| SparsenetError::io(&*path, e))?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.series
            .flush()
            .map_err(|e| SparsenetError::io(&self.series_path, e))?;
        if let Some((writer, path)) = self.windows.as_mut() {
            writer.flush().map_err(|e| SparsenetError::io(&*path, e))?;
        }
        Ok(())
    }
}

fn open(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| SparsenetError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(t: Step, m: f64) -> TraceStep {
        TraceStep {
            step: t,
            summary: MacroscopicSummary {
                overlap: m,
                activity: 0.3,
                ..Default::default()
            },
            hamming_percent: 2.5,
        }
    }

    #[test]
    fn memory_sink_keeps_steps_in_order() {
        let mut sink = MemoryTraceSink::new();
        assert!(!sink.wants_windows());
        sink.record_step(&step(0, 0.5)).unwrap();
        sink.record_step(&step(1, 0.9)).unwrap();
        assert_eq!(sink.steps.len(), 2);
        assert_eq!(sink.steps[1].step, 1);
        assert!(MemoryTraceSink::with_windows().wants_windows());
    }

    #[test]
    fn file_sink_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileTraceSink::create(dir.path(), "run.txt", true).unwrap();
        sink.record_step(&step(0, 0.5)).unwrap();
        sink.record_windows(0, &[1.0, -0.25]).unwrap();
        sink.finish().unwrap();

        let series = std::fs::read_to_string(dir.path().join("mdqintime_run.txt")).unwrap();
        let mut lines = series.lines();
        assert_eq!(lines.next(), Some(TIME_SERIES_HEADER));
        assert_eq!(
            lines.next(),
            Some("0, 0.500000, 0.000000, 0.300000, 0.000000, 0.000000, 0.000000, 2.500000")
        );

        let windows = std::fs::read_to_string(dir.path().join("xmi_run.txt")).unwrap();
        assert_eq!(windows.trim_end(), "1.000000, -0.250000");
    }

    #[test]
    fn file_sink_without_windows_creates_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileTraceSink::create(dir.path(), "a", false).unwrap();
        assert!(sink.windows_path().is_none());
        assert!(!sink.wants_windows());
        assert!(!dir.path().join("xmi_a").exists());
    }
}
