//! 🎭 Classification pipelines — three single-label classifiers glued into one [`Scorer`].
//!
//! Each [`Classifier`] answers "what's the top label for each of these texts?".
//! [`PipelineScorer`] runs sentiment, emotion and sarcasm over the same batch and
//! checks that every pipeline answered once per input. A classifier that returns
//! the wrong number of answers is broken, and we say so.

use async_trait::async_trait;
use anyhow::Context;

use crate::app_config::{ClassifierConfig, ScoringConfig};
use crate::common::Prediction;
use crate::scoring::http::HttpClassifier;
use crate::scoring::in_mem::InMemoryClassifier;
use crate::scoring::{PipelineOutput, Scorer};

/// 🏷️ One text-classification pipeline. One prediction per input, in input order.
#[async_trait]
pub trait Classifier: Send + Sync + std::fmt::Debug {
    async fn classify(&self, texts: &[String]) -> anyhow::Result<Vec<Prediction>>;
}

/// 🎭 The configured classifier flavours.
#[derive(Debug)]
pub enum ClassifierBackend {
    Http(HttpClassifier),
    InMemory(InMemoryClassifier),
}

impl ClassifierBackend {
    pub fn from_config(config: &ClassifierConfig) -> anyhow::Result<Self> {
        Ok(match config {
            ClassifierConfig::Http(http) => ClassifierBackend::Http(HttpClassifier::new(http.clone())?),
            ClassifierConfig::InMemory(in_mem) => {
                ClassifierBackend::InMemory(InMemoryClassifier::new(in_mem.label.clone(), in_mem.score))
            }
        })
    }
}

#[async_trait]
impl Classifier for ClassifierBackend {
    async fn classify(&self, texts: &[String]) -> anyhow::Result<Vec<Prediction>> {
        match self {
            ClassifierBackend::Http(http) => http.classify(texts).await,
            ClassifierBackend::InMemory(in_mem) => in_mem.classify(texts).await,
        }
    }
}

/// 🧠 Sentiment + emotion + sarcasm, run one after the other over the same batch.
#[derive(Debug)]
pub struct PipelineScorer {
    sentiment: Box<dyn Classifier>,
    emotion: Box<dyn Classifier>,
    sarcasm: Box<dyn Classifier>,
    sarcastic_label: String,
}

impl PipelineScorer {
    pub fn new(
        sentiment: Box<dyn Classifier>,
        emotion: Box<dyn Classifier>,
        sarcasm: Box<dyn Classifier>,
        sarcastic_label: impl Into<String>,
    ) -> Self {
        Self {
            sentiment,
            emotion,
            sarcasm,
            sarcastic_label: sarcastic_label.into(),
        }
    }

    pub fn from_config(config: &ScoringConfig) -> anyhow::Result<Self> {
        let sentiment = ClassifierBackend::from_config(&config.sentiment)
            .context("💀 Failed to build the sentiment pipeline")?;
        let emotion = ClassifierBackend::from_config(&config.emotion)
            .context("💀 Failed to build the emotion pipeline")?;
        let sarcasm = ClassifierBackend::from_config(&config.sarcasm)
            .context("💀 Failed to build the sarcasm pipeline")?;
        Ok(Self::new(
            Box::new(sentiment),
            Box::new(emotion),
            Box::new(sarcasm),
            config.sarcastic_label.clone(),
        ))
    }
}

async fn run_pipeline(
    name: &str,
    classifier: &dyn Classifier,
    texts: &[String],
) -> anyhow::Result<Vec<Prediction>> {
    let predictions = classifier
        .classify(texts)
        .await
        .with_context(|| format!("💀 The {name} pipeline failed"))?;
    if predictions.len() != texts.len() {
        anyhow::bail!(
            "💀 The {name} pipeline returned {} predictions for {} inputs",
            predictions.len(),
            texts.len()
        );
    }
    Ok(predictions)
}

#[async_trait]
impl Scorer for PipelineScorer {
    async fn score(&self, texts: &[String]) -> anyhow::Result<PipelineOutput> {
        let sentiment = run_pipeline("sentiment", self.sentiment.as_ref(), texts).await?;
        let emotion = run_pipeline("emotion", self.emotion.as_ref(), texts).await?;
        let sarcastic = run_pipeline("sarcasm", self.sarcasm.as_ref(), texts)
            .await?
            .iter()
            .filter(|prediction| prediction.label == self.sarcastic_label)
            .count();
        Ok(PipelineOutput {
            sentiment,
            emotion,
            sarcastic,
        })
    }
}
