//! Motus choreographies
//!
//! A choreography is a TOML file describing a small scene of objects and the
//! tweens, color transitions and timelines that animate them. This crate
//! loads choreographies, plays them against a headless scene at a fixed frame
//! rate and produces a [`RunReport`].
//!
//! ```
//! use motus_cli::{run, Choreography, RunConfig};
//!
//! let choreo = Choreography::from_toml(r#"
//!     [objects.camera]
//!     fields = { "position.z" = 5.0 }
//!
//!     [[tweens]]
//!     target = "camera"
//!     to = { "position.z" = 3.0 }
//!     duration = 1.0
//! "#).unwrap();
//!
//! let report = run(&choreo, RunConfig { fps: 10, seconds: 1.0, sample_every: 10 }).unwrap();
//! let last = report.samples.last().unwrap();
//! assert!((last.values["camera.position.z"] - 3.0).abs() < 1e-4);
//! ```

pub mod compose;
pub mod config;
pub mod error;
pub mod report;
pub mod runner;
pub mod scene;

pub use compose::{install, Journal};
pub use config::{Choreography, RunConfig};
pub use error::{ChoreographyError, Result};
pub use report::{ExpectationResult, MarkerHit, ReportStatus, RunReport, Sample};
pub use runner::run;
pub use scene::Scene;

/// Choreography written by `motus init`
pub const SAMPLE_CHOREOGRAPHY: &str = include_str!("../choreographies/morph.toml");
