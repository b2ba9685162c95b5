//! Errors that stop a scaffold run

use crate::pipeline::Stage;

/// A stage failed in a way the run cannot continue from
#[derive(Debug, thiserror::Error)]
pub enum ScaffoldError {
    #[error("{stage} failed: {error:#}")]
    Fatal { stage: Stage, error: anyhow::Error },

    #[error("Prompting failed: {0:#}")]
    Prompt(anyhow::Error),
}

impl ScaffoldError {
    /// Stage the run stopped at
    pub fn stage(&self) -> Stage {
        match self {
            ScaffoldError::Fatal { stage, .. } => *stage,
            ScaffoldError::Prompt(_) => Stage::CollectAnswers,
        }
    }
}
