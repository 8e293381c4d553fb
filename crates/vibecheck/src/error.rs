//! 💀 Error taxonomy — every way a job can go sideways, spelled out in the type system.
//!
//! Two stage-level errors ([`FetchError`], [`ScoreError`]) come out of the adapters.
//! The dispatcher folds them, plus timeouts and panics, into one [`AnalysisError`],
//! which is the only error a caller ever sees. Callers get a status and a generic
//! message. Operators get the full chain in the logs. Nobody gets a stack trace. 🦆

use std::fmt;

use thiserror::Error;

use crate::common::AnalysisResult;

/// 🎯 The single result published for a job. Exactly one per job, no more, no less.
pub type Outcome = Result<AnalysisResult, AnalysisError>;

/// ⏱️ The two bounded-time stages a job walks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Score,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => f.write_str("fetch"),
            Stage::Score => f.write_str("score"),
        }
    }
}

/// 📡 What the comment source can say instead of comments.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider answered, and the answer was no (unknown video, comments disabled, bad key...).
    #[error("comment provider rejected the request ({status}): {message}")]
    Provider { status: u16, message: String },
    /// We never got a usable answer: network trouble, garbage JSON, and friends.
    #[error("comment provider unreachable or unintelligible: {0:#}")]
    Transport(anyhow::Error),
}

/// 🧠 What the scoring resource can say instead of statistics.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// Nothing scoreable in the batch. Dividing by zero is not a vibe.
    #[error("unscoreable batch: {0}")]
    BadInput(String),
    /// The scorer itself fell over.
    #[error("scoring failed: {0:#}")]
    Failed(anyhow::Error),
}

/// 🏷️ The job-level error kinds. Exhaustive. If it's not here, it's `Internal`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("{stage} stage exceeded its time budget")]
    TimedOut { stage: Stage },
    #[error("comment provider rejected the video")]
    FetchFailed,
    #[error("no scoreable comments")]
    BadInput,
    #[error("scoring resource failed")]
    ScoringFailed,
    #[error("internal error")]
    Internal,
}

impl AnalysisError {
    /// 📡 HTTP status for this kind. Callers only need three buckets: slow, missing, broken.
    pub fn status_code(&self) -> u16 {
        match self {
            AnalysisError::TimedOut { .. } => 504,
            AnalysisError::FetchFailed => 404,
            AnalysisError::BadInput | AnalysisError::ScoringFailed | AnalysisError::Internal => 500,
        }
    }

    /// 💬 The caller-facing message. Deliberately boring.
    pub fn client_message(&self) -> &'static str {
        match self {
            AnalysisError::TimedOut { .. } => "Request or processing timed out",
            AnalysisError::FetchFailed => "Failed to crawl YouTube comments",
            AnalysisError::BadInput => "No comments available to analyse",
            AnalysisError::ScoringFailed | AnalysisError::Internal => {
                "Unhandled exception encountered!"
            }
        }
    }
}

impl From<FetchError> for AnalysisError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Provider { .. } => AnalysisError::FetchFailed,
            FetchError::Transport(_) => AnalysisError::Internal,
        }
    }
}

impl From<ScoreError> for AnalysisError {
    fn from(err: ScoreError) -> Self {
        match err {
            ScoreError::BadInput(_) => AnalysisError::BadInput,
            ScoreError::Failed(_) => AnalysisError::ScoringFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_every_kind_lands_in_one_of_three_buckets() {
        assert_eq!(AnalysisError::TimedOut { stage: Stage::Fetch }.status_code(), 504);
        assert_eq!(AnalysisError::TimedOut { stage: Stage::Score }.status_code(), 504);
        assert_eq!(AnalysisError::FetchFailed.status_code(), 404);
        assert_eq!(AnalysisError::BadInput.status_code(), 500);
        assert_eq!(AnalysisError::ScoringFailed.status_code(), 500);
        assert_eq!(AnalysisError::Internal.status_code(), 500);
    }

    #[test]
    fn the_one_where_stage_errors_fold_into_the_right_kind() {
        let rejected = FetchError::Provider {
            status: 403,
            message: "commentsDisabled".to_string(),
        };
        assert_eq!(AnalysisError::from(rejected), AnalysisError::FetchFailed);

        let unplugged = FetchError::Transport(anyhow::anyhow!("connection refused"));
        assert_eq!(AnalysisError::from(unplugged), AnalysisError::Internal);

        let empty = ScoreError::BadInput("zero comments".to_string());
        assert_eq!(AnalysisError::from(empty), AnalysisError::BadInput);

        let on_fire = ScoreError::Failed(anyhow::anyhow!("model exploded"));
        assert_eq!(AnalysisError::from(on_fire), AnalysisError::ScoringFailed);
    }

    #[test]
    fn the_one_where_client_messages_never_leak_the_details() {
        let the_secret = "connection refused to 10.0.0.7:443";
        let err = AnalysisError::from(FetchError::Transport(anyhow::anyhow!(the_secret)));
        assert!(!err.client_message().contains(the_secret));
        assert!(!err.to_string().contains(the_secret));
    }
}
