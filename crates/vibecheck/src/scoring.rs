//! 🧠 The scoring resource — one expensive, non-reentrant brain, shared by everybody, used by one job at a time.
//!
//! The [`Scorer`] is the opaque part: give it texts, get raw per-input predictions back.
//! [`ScoringResource`] wraps it and does the part we actually own:
//! - rejects empty batches with [`ScoreError::BadInput`] (no division by zero, ever)
//! - turns raw predictions into per-label `(avg_score, count)`, where the average divides by
//!   the **total** number of inputs, not the per-label count
//! - guarantees `positive` / `negative` / `neutral` always exist in the sentiment map
//! - holds a single permit for the whole scoring call
//!
//! ⚠️ About that permit: the dispatcher already runs one job at a time. But when a score
//! stage times out, the dispatcher stops *waiting*, it does not stop the *work*. The permit
//! lives inside the abandoned call until it really finishes, so the next job's score queues
//! behind the straggler instead of running next to it. Waiting for the permit counts
//! against the next job's stage budget.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{debug, trace};

use crate::app_config::ScoringConfig;
use crate::common::{AnalysisResult, LabelStat, Prediction};
use crate::error::ScoreError;

pub mod http;
pub mod in_mem;
pub mod pipelines;

pub use pipelines::{Classifier, ClassifierBackend, PipelineScorer};

/// 🏷️ Sentiment labels that must always be present in the output.
pub const SENTIMENT_LABELS: [&str; 3] = ["positive", "negative", "neutral"];

/// 📦 What the opaque scorer hands back for one batch.
///
/// `sentiment` and `emotion` hold the predictions the pipelines returned.
/// `sarcastic` is how many inputs were judged sarcastic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineOutput {
    pub sentiment: Vec<Prediction>,
    pub emotion: Vec<Prediction>,
    pub sarcastic: usize,
}

/// 🎭 The black box: sentiment, emotion and sarcasm over the same batch, in one call.
#[async_trait]
pub trait Scorer: Send + Sync + std::fmt::Debug {
    async fn score(&self, texts: &[String]) -> anyhow::Result<PipelineOutput>;
}

/// 🔒 The shared scoring resource. Clone it freely, every clone is the same resource.
#[derive(Debug, Clone)]
pub struct ScoringResource {
    scorer: Arc<dyn Scorer>,
    permit: Arc<Semaphore>,
}

impl ScoringResource {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        Self {
            scorer,
            permit: Arc::new(Semaphore::new(1)),
        }
    }

    /// 🏗️ Build the configured pipelines. Fails at startup, not on the first request.
    pub fn from_config(config: &ScoringConfig) -> anyhow::Result<Self> {
        let scorer = PipelineScorer::from_config(config)?;
        Ok(Self::new(Arc::new(scorer)))
    }

    /// 🎯 Score a batch and shape the statistics.
    pub async fn score(&self, texts: Vec<String>) -> Result<AnalysisResult, ScoreError> {
        if texts.is_empty() {
            return Err(ScoreError::BadInput("no comments to score".to_string()));
        }

        let _permit = self
            .permit
            .acquire()
            .await
            .map_err(|err| ScoreError::Failed(err.into()))?;
        trace!("🧠 Scoring permit acquired for {} texts", texts.len());

        let output = self.scorer.score(&texts).await.map_err(ScoreError::Failed)?;
        let result = summarize(output, texts.len())?;
        debug!(
            "📊 Scored {} texts: {} sentiment labels, {} emotion labels, sarcasm {:.3}",
            texts.len(),
            result.sentiment.len(),
            result.emotion.len(),
            result.sarcasm
        );
        Ok(result)
    }
}

/// 📊 Sum scores and counts per label, then divide each sum by `total`.
pub fn label_stats(predictions: &[Prediction], total: usize) -> BTreeMap<String, LabelStat> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for prediction in predictions {
        let entry = sums.entry(prediction.label.clone()).or_default();
        entry.0 += prediction.score;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(label, (sum, count))| {
            let stat = LabelStat {
                avg_score: sum / total as f64,
                count,
            };
            (label, stat)
        })
        .collect()
}

/// 📊 Same as [`label_stats`], plus the three sentiment labels defaulted to `(0, 0)`.
pub fn sentiment_stats(predictions: &[Prediction], total: usize) -> BTreeMap<String, LabelStat> {
    let mut stats = label_stats(predictions, total);
    for label in SENTIMENT_LABELS {
        stats.entry(label.to_string()).or_default();
    }
    stats
}

/// 🧮 Fraction of the batch judged sarcastic. Rejects a scorer that counts more sarcasm than inputs.
pub fn sarcasm_fraction(sarcastic: usize, total: usize) -> Result<f64, ScoreError> {
    if total == 0 {
        return Err(ScoreError::BadInput("no comments to score".to_string()));
    }
    if sarcastic > total {
        return Err(ScoreError::Failed(anyhow::anyhow!(
            "scorer reported {sarcastic} sarcastic inputs out of {total}"
        )));
    }
    Ok(sarcastic as f64 / total as f64)
}

fn summarize(output: PipelineOutput, total: usize) -> Result<AnalysisResult, ScoreError> {
    Ok(AnalysisResult {
        sentiment: sentiment_stats(&output.sentiment, total),
        emotion: label_stats(&output.emotion, total),
        sarcasm: sarcasm_fraction(output.sarcastic, total)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct CannedScorer(PipelineOutput);

    #[async_trait]
    impl Scorer for CannedScorer {
        async fn score(&self, _texts: &[String]) -> anyhow::Result<PipelineOutput> {
            Ok(self.0.clone())
        }
    }

    #[derive(Debug)]
    struct OnFireScorer;

    #[async_trait]
    impl Scorer for OnFireScorer {
        async fn score(&self, _texts: &[String]) -> anyhow::Result<PipelineOutput> {
            anyhow::bail!("the model has left the building")
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("comment {i}")).collect()
    }

    fn approx(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[tokio::test]
    async fn the_one_where_averages_divide_by_the_whole_batch() {
        let resource = ScoringResource::new(Arc::new(CannedScorer(PipelineOutput {
            sentiment: vec![Prediction::new("positive", 0.9), Prediction::new("negative", 0.8)],
            emotion: vec![Prediction::new("joy", 0.7)],
            sarcastic: 0,
        })));

        let result = resource.score(texts(2)).await.expect("💀 scoring should succeed");

        assert!(approx(result.sentiment["positive"].avg_score, 0.45));
        assert_eq!(result.sentiment["positive"].count, 1);
        assert!(approx(result.sentiment["negative"].avg_score, 0.4));
        assert_eq!(result.sentiment["negative"].count, 1);
        assert_eq!(result.sentiment["neutral"], LabelStat::default());
        assert_eq!(result.emotion.len(), 1);
        assert!(approx(result.emotion["joy"].avg_score, 0.35));
        assert_eq!(result.emotion["joy"].count, 1);
        assert_eq!(result.sarcasm, 0.0);
    }

    #[tokio::test]
    async fn the_one_where_an_empty_batch_is_bad_input_not_a_division_fault() {
        let resource = ScoringResource::new(Arc::new(CannedScorer(PipelineOutput::default())));
        let err = resource
            .score(Vec::new())
            .await
            .expect_err("💀 empty batch must be rejected");
        assert!(matches!(err, ScoreError::BadInput(_)));
    }

    #[tokio::test]
    async fn the_one_where_a_broken_scorer_is_a_scoring_failure() {
        let resource = ScoringResource::new(Arc::new(OnFireScorer));
        let err = resource.score(texts(1)).await.expect_err("💀 scorer error must surface");
        assert!(matches!(err, ScoreError::Failed(_)));
    }

    #[test]
    fn the_one_where_sentiment_always_has_the_big_three() {
        let stats = sentiment_stats(&[Prediction::new("mixed", 0.5)], 1);
        for label in SENTIMENT_LABELS {
            assert_eq!(stats[label], LabelStat::default(), "missing default for {label}");
        }
        assert_eq!(stats["mixed"].count, 1);
    }

    #[test]
    fn the_one_where_emotion_only_reports_what_it_saw() {
        let stats = label_stats(&[Prediction::new("anger", 0.6), Prediction::new("anger", 0.2)], 4);
        assert_eq!(stats.len(), 1);
        assert!(approx(stats["anger"].avg_score, 0.2));
        assert_eq!(stats["anger"].count, 2);
    }

    #[test]
    fn the_one_where_average_times_total_gives_back_the_raw_sum() {
        let the_predictions = vec![
            Prediction::new("positive", 0.91),
            Prediction::new("negative", 0.55),
            Prediction::new("positive", 0.13),
            Prediction::new("neutral", 0.77),
            Prediction::new("surprise", 0.42),
        ];
        for total in [5, 7, 100] {
            let stats = sentiment_stats(&the_predictions, total);
            let the_reconstructed: f64 = stats.values().map(|stat| stat.avg_score * total as f64).sum();
            let the_raw: f64 = the_predictions.iter().map(|prediction| prediction.score).sum();
            assert!(approx(the_reconstructed, the_raw), "total {total}: {the_reconstructed} != {the_raw}");
            let the_counted: usize = stats.values().map(|stat| stat.count).sum();
            assert_eq!(the_counted, the_predictions.len());
        }
    }

    #[test]
    fn the_one_where_sarcasm_stays_between_zero_and_one() {
        assert_eq!(sarcasm_fraction(0, 4).expect("💀 valid"), 0.0);
        assert_eq!(sarcasm_fraction(1, 4).expect("💀 valid"), 0.25);
        assert_eq!(sarcasm_fraction(4, 4).expect("💀 valid"), 1.0);
        assert!(matches!(sarcasm_fraction(5, 4), Err(ScoreError::Failed(_))));
        assert!(matches!(sarcasm_fraction(0, 0), Err(ScoreError::BadInput(_))));
    }
}
