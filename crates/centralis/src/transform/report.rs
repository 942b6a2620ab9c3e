//! Per-stage accounting of a cleaning run.

use serde::{Deserialize, Serialize};

use crate::schema::{EntityKind, IssueKind};

/// Result of running one entity pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Entity kind that was cleaned.
    pub entity: EntityKind,

    /// Rows in the input table.
    pub rows_in: usize,

    /// Rows in the cleaned table.
    pub rows_out: usize,

    /// Outcome of every stage, in execution order.
    pub stages: Vec<StageOutcome>,
}

/// What a single stage did to the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutcome {
    /// Stable stage name.
    pub stage: String,

    /// Human-readable description.
    pub description: String,

    /// Kind of issue the stage resolves.
    pub issue: IssueKind,

    pub rows_before: usize,
    pub rows_after: usize,

    /// Dependent values overwritten from their authoritative field.
    pub values_corrected: usize,

    /// The stage had nothing to do (optional column absent, derivation
    /// already applied).
    pub skipped: bool,
}

impl StageOutcome {
    /// Rows removed by this stage.
    pub fn rows_dropped(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

impl CleaningReport {
    /// Create an empty report.
    pub fn new(entity: EntityKind, rows_in: usize) -> Self {
        Self {
            entity,
            rows_in,
            rows_out: rows_in,
            stages: Vec::new(),
        }
    }

    /// Record a stage outcome.
    pub fn add_stage(&mut self, outcome: StageOutcome) {
        self.rows_out = outcome.rows_after;
        self.stages.push(outcome);
    }

    /// Rows removed across the whole pipeline.
    pub fn rows_dropped(&self) -> usize {
        self.rows_in.saturating_sub(self.rows_out)
    }

    /// Corrections across the whole pipeline.
    pub fn values_corrected(&self) -> usize {
        self.stages.iter().map(|s| s.values_corrected).sum()
    }

    /// Rows dropped per issue kind, omitting kinds that dropped nothing.
    pub fn dropped_by_issue(&self) -> Vec<(IssueKind, usize)> {
        let mut totals: Vec<(IssueKind, usize)> = Vec::new();
        for stage in &self.stages {
            let dropped = stage.rows_dropped();
            if dropped == 0 {
                continue;
            }
            match totals.iter_mut().find(|(kind, _)| *kind == stage.issue) {
                Some((_, total)) => *total += dropped,
                None => totals.push((stage.issue, dropped)),
            }
        }
        totals
    }
}
