//! Per-stage results and the console seam they are reported through

use super::Stage;
use std::fmt;

/// How a stage ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    Completed,
    Skipped(String),
    /// Failed, logged, and the run went on
    Recovered(String),
    Fatal(String),
}

impl StageStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, StageStatus::Recovered(_) | StageStatus::Fatal(_))
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageStatus::Completed => write!(f, "completed"),
            StageStatus::Skipped(reason) => write!(f, "skipped ({})", reason),
            StageStatus::Recovered(error) => write!(f, "failed, continued ({})", error),
            StageStatus::Fatal(error) => write!(f, "failed ({})", error),
        }
    }
}

/// Ordered record of every stage that ran
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    entries: Vec<(Stage, StageStatus)>,
}

impl RunReport {
    pub fn record(&mut self, stage: Stage, status: StageStatus) {
        self.entries.push((stage, status));
    }

    pub fn entries(&self) -> &[(Stage, StageStatus)] {
        &self.entries
    }

    pub fn status(&self, stage: Stage) -> Option<&StageStatus> {
        self.entries
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, status)| status)
    }

    /// Stages that failed but let the run continue
    pub fn recovered(&self) -> impl Iterator<Item = Stage> + '_ {
        self.entries
            .iter()
            .filter(|(_, status)| matches!(status, StageStatus::Recovered(_)))
            .map(|(stage, _)| *stage)
    }
}

/// Where the pipeline sends user-facing output
pub trait Reporter {
    fn stage_started(&self, stage: Stage);

    fn stage_finished(&self, stage: Stage, status: &StageStatus);

    fn info(&self, message: &str);

    fn warning(&self, message: &str);

    /// Final status table and numbered next steps
    fn summary(&self, report: &RunReport, next_steps: &[String]);
}
