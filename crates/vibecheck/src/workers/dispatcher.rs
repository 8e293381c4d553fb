//! 🎬 *[a queue fills with video IDs. somewhere, a scorer waits.]*
//!
//! 🧵 The Dispatcher: the one long-lived loop that takes jobs off the queue, one at a
//! time, and drives each through `Fetching → Scoring → Publishing → Done`.
//!
//! Rules of the house:
//! - one job at a time, in submission order, no exceptions
//! - fetch and score each get their own `stage_timeout` budget
//! - any failure short-circuits straight to publishing a typed error
//! - exactly one outcome per job, then on to the next one
//! - a bad job never stops the loop; only a closed queue does
//!
//! ⚠️ Timed-out stages are abandoned, not cancelled (see `stage.rs`). An abandoned fetch
//! just burns a connection until the HTTP client's own timeout. An abandoned score keeps
//! holding the scoring permit, so the next score waits for it instead of overlapping.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::Worker;
use super::stage::{StageFailure, run_stage};
use crate::app_config::RuntimeConfig;
use crate::common::scoring_input;
use crate::error::{AnalysisError, FetchError, Outcome, ScoreError, Stage};
use crate::queue::JobReceiver;
use crate::scoring::ScoringResource;
use crate::sources::CommentSource;

/// 🔧 The handful of knobs the dispatcher cares about.
#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings {
    pub stage_timeout: Duration,
    pub max_pages: usize,
    pub rich_comments: bool,
}

impl From<&RuntimeConfig> for DispatchSettings {
    fn from(runtime: &RuntimeConfig) -> Self {
        Self {
            stage_timeout: runtime.stage_timeout(),
            max_pages: runtime.max_pages,
            rich_comments: runtime.rich_comments,
        }
    }
}

#[derive(Debug)]
pub struct Dispatcher {
    jobs: JobReceiver,
    source: Arc<dyn CommentSource>,
    scorer: ScoringResource,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(
        jobs: JobReceiver,
        source: Arc<dyn CommentSource>,
        scorer: ScoringResource,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            jobs,
            source,
            scorer,
            settings,
        }
    }

    /// 🎯 Run one job end to end. Never returns early without an outcome.
    async fn process(&self, video_id: &str) -> Outcome {
        let source = self.source.clone();
        let owned_video_id = video_id.to_string();
        let max_pages = self.settings.max_pages;
        let fetched = run_stage(self.settings.stage_timeout, async move {
            source.fetch(&owned_video_id, max_pages).await
        })
        .await;

        let comments = match fetched {
            Ok(comments) => comments,
            Err(failure) => return Err(classify_fetch_failure(video_id, failure)),
        };
        debug!("📥 Fetched {} comments for '{}'", comments.len(), video_id);

        let texts = scoring_input(&comments, self.settings.rich_comments);
        if texts.len() < comments.len() {
            debug!(
                "🧹 Left {} over-long comments out of scoring for '{}'",
                comments.len() - texts.len(),
                video_id
            );
        }

        let scorer = self.scorer.clone();
        let scored = run_stage(self.settings.stage_timeout, async move { scorer.score(texts).await }).await;
        scored.map_err(|failure| classify_score_failure(video_id, failure))
    }
}

fn classify_fetch_failure(video_id: &str, failure: StageFailure<FetchError>) -> AnalysisError {
    match failure {
        StageFailure::TimedOut => {
            warn!("⏱️ Fetch for '{}' exceeded its budget, abandoning it", video_id);
            AnalysisError::TimedOut { stage: Stage::Fetch }
        }
        StageFailure::Failed(err @ FetchError::Provider { .. }) => {
            warn!("📭 Provider rejected '{}': {}", video_id, err);
            err.into()
        }
        StageFailure::Failed(err) => {
            error!("💀 Fetch for '{}' failed: {}", video_id, err);
            AnalysisError::Internal
        }
        StageFailure::Panicked(join_error) => {
            error!("💀 Fetch for '{}' panicked: {}", video_id, join_error);
            AnalysisError::Internal
        }
    }
}

fn classify_score_failure(video_id: &str, failure: StageFailure<ScoreError>) -> AnalysisError {
    match failure {
        StageFailure::TimedOut => {
            warn!("⏱️ Scoring for '{}' exceeded its budget, abandoning it", video_id);
            AnalysisError::TimedOut { stage: Stage::Score }
        }
        StageFailure::Failed(err @ ScoreError::BadInput(_)) => {
            warn!("🕳️ Nothing to score for '{}': {}", video_id, err);
            err.into()
        }
        StageFailure::Failed(err) => {
            error!("💀 Scoring for '{}' failed: {}", video_id, err);
            AnalysisError::ScoringFailed
        }
        StageFailure::Panicked(join_error) => {
            error!("💀 Scoring for '{}' panicked: {}", video_id, join_error);
            AnalysisError::Internal
        }
    }
}

impl Worker for Dispatcher {
    fn start(self) -> JoinHandle<Result<()>> {
        tokio::spawn(async move {
            info!(
                "🚀 Dispatcher started (stage timeout {:?}, max pages {}, rich comments {})",
                self.settings.stage_timeout, self.settings.max_pages, self.settings.rich_comments
            );
            while let Some(job) = self.jobs.dequeue().await {
                let started = Instant::now();
                let waited = started.duration_since(job.enqueued_at());
                let outcome = self.process(&job.video_id).await;
                match &outcome {
                    Ok(_) => info!(
                        "✅ '{}' analysed in {:?} (queued {:?})",
                        job.video_id,
                        started.elapsed(),
                        waited
                    ),
                    Err(kind) => info!(
                        "💀 '{}' failed as {:?} after {:?} (queued {:?})",
                        job.video_id,
                        kind,
                        started.elapsed(),
                        waited
                    ),
                }
                job.publish(outcome);
            }
            info!("🏁 Dispatcher: queue closed. Shutting down.");
            Ok(())
        })
    }
}
