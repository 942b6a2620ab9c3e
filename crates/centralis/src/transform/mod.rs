//! Cleaning pipelines: the stage interpreter and its report.

mod engine;
mod report;

pub use engine::CleaningEngine;
pub use report::{CleaningReport, StageOutcome};
