//! High-level facade crate for the `dermtrack-*` workspace.
//!
//! This crate provides:
//! - re-exports of the algorithm crates under short module names
//! - file-based entry points ([`run`]) that load images and JSON inputs,
//!   drive the pipelines and return serializable reports
//! - the `dermtrack` command-line tool (feature `cli`)
//!
//! ## Quickstart
//!
//! ```no_run
//! use dermtrack::run;
//! use dermtrack::asymmetry::AsymmetryParams;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mask = run::open_mask("lesion_mask.png")?;
//! let result = run::score_mask(&mask, AsymmetryParams::default())?;
//! println!("asymmetry: {:.4}", result.score);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `dermtrack::core`: coordinate types, conversions, minimal gray images.
//! - `dermtrack::asymmetry`: principal-axis mirrored-difference scoring.
//! - `dermtrack::correspondence`: nearest-keypoint resolution across images.
//! - `dermtrack::pipeline`: batch orchestration, tracking and collaborator traits.
//! - `dermtrack::run`: end-to-end helpers working on files.

pub use dermtrack_asymmetry as asymmetry;
pub use dermtrack_core as core;
pub use dermtrack_correspondence as correspondence;
pub use dermtrack_pipeline as pipeline;

pub use dermtrack_asymmetry::{compute_asymmetry, AsymmetryResult, AsymmetryScorer};
pub use dermtrack_core::{Detection, KeypointCorrespondence, UnitBox, UnitPoint};
pub use dermtrack_correspondence::{Assignment, CorrespondenceResolver};
pub use dermtrack_pipeline::{LesionBatchOrchestrator, LesionRecord, LesionTracker};

pub mod run;
