//! 🧪 In-memory classifier — the same label for every text, every time.
//!
//! Useful for local runs and demos where no inference endpoint exists.
//! Exactly as insightful as a magic 8-ball stuck on one answer. 🎱

use async_trait::async_trait;

use crate::common::Prediction;
use crate::scoring::Classifier;

#[derive(Debug, Clone)]
pub struct InMemoryClassifier {
    label: String,
    score: f64,
}

impl InMemoryClassifier {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

#[async_trait]
impl Classifier for InMemoryClassifier {
    async fn classify(&self, texts: &[String]) -> anyhow::Result<Vec<Prediction>> {
        Ok(texts
            .iter()
            .map(|_| Prediction::new(self.label.clone(), self.score))
            .collect())
    }
}
