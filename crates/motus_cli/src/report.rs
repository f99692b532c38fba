//! Report output model for choreography runs.

use anyhow::{bail, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Component, Path};

/// Overall result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Passed,
    Failed,
}

/// Every field value at one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub frame: u64,
    pub time: f32,
    pub values: IndexMap<String, f32>,
}

/// A marker reached during playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerHit {
    pub name: String,
    pub time: f32,
}

/// Outcome of one expectation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectationResult {
    pub at: f32,
    pub field: String,
    pub expected: f32,
    /// `None` when the field no longer exists or the time was never reached
    pub actual: Option<f32>,
    pub tolerance: f32,
    pub passed: bool,
}

/// Machine-readable result of a choreography run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub status: ReportStatus,
    pub frames: u64,
    pub seconds: f32,
    pub samples: Vec<Sample>,
    pub markers: Vec<MarkerHit>,
    pub expectations: Vec<ExpectationResult>,
    /// Animations still registered when playback stopped
    pub active_at_end: usize,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &ExpectationResult> {
        self.expectations.iter().filter(|e| !e.passed)
    }

    pub fn is_failed(&self) -> bool {
        self.status == ReportStatus::Failed
    }

    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        if path.is_absolute() || path.has_root() {
            bail!("report path must be relative and must not start with a separator");
        }
        if path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            bail!("report path cannot contain '..' or drive prefixes");
        }
        let payload = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, payload)?;
        Ok(())
    }

    pub fn write_to_writer<W: Write>(&self, writer: &mut W) -> Result<()> {
        let payload = serde_json::to_string_pretty(self)?;
        writer.write_all(payload.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        RunReport {
            status: ReportStatus::Failed,
            frames: 60,
            seconds: 1.0,
            samples: Vec::new(),
            markers: vec![MarkerHit {
                name: "halfway".into(),
                time: 0.5,
            }],
            expectations: vec![ExpectationResult {
                at: 1.0,
                field: "camera.position.z".into(),
                expected: 3.0,
                actual: Some(2.0),
                tolerance: 0.001,
                passed: false,
            }],
            active_at_end: 0,
        }
    }

    #[test]
    fn writer_output_is_json_with_snake_case_status() {
        let mut out = Vec::new();
        report().write_to_writer(&mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["markers"][0]["name"], "halfway");
        assert_eq!(report().failures().count(), 1);
    }

    #[test]
    fn rejects_escaping_paths() {
        assert!(report().write_to_path(Path::new("/tmp/report.json")).is_err());
        assert!(report().write_to_path(Path::new("../report.json")).is_err());
    }
}
