//! 📡 HTTP classifier — the model lives somewhere else, we just send it texts.
//!
//! Speaks the common hosted text-classification shape:
//! `POST {url}` with `{"inputs": [..texts..]}`, optional `Authorization: Bearer <token>`.
//! The answer is one entry per input, each either a single `{label, score}` or a ranked
//! list of them. For lists we keep the top score, same as a pipeline with `top_k = 1`.
//!
//! 🔄 No retries. A failed call is a failed score, and the dispatcher moves on.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use tracing::trace;

use crate::app_config::HttpClassifierConfig;
use crate::common::Prediction;
use crate::scoring::Classifier;

#[derive(Debug)]
pub struct HttpClassifier {
    client: reqwest::Client,
    url: Url,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifierAnswer {
    Top(Prediction),
    Ranked(Vec<Prediction>),
}

impl ClassifierAnswer {
    fn into_top(self) -> Option<Prediction> {
        match self {
            ClassifierAnswer::Top(prediction) => Some(prediction),
            ClassifierAnswer::Ranked(ranked) => ranked
                .into_iter()
                .max_by(|left, right| left.score.total_cmp(&right.score)),
        }
    }
}

impl HttpClassifier {
    pub fn new(config: HttpClassifierConfig) -> anyhow::Result<Self> {
        let url = Url::parse(&config.url)
            .with_context(|| format!("💀 Classifier url '{}' is not a URL we can work with", config.url))?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .context("💀 Failed to build the HTTP client for the classifier")?;
        Ok(Self {
            client,
            url,
            api_token: config.api_token,
        })
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, texts: &[String]) -> anyhow::Result<Vec<Prediction>> {
        let body = serde_json::to_vec(&json!({ "inputs": texts }))
            .context("💀 Failed to serialize classifier request")?;
        let mut request = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json");
        if let Some(ref token) = self.api_token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        trace!("📡 Classifying {} texts at {}", texts.len(), self.url);
        let response = request
            .body(body)
            .send()
            .await
            .with_context(|| format!("💀 The classifier at {} never answered", self.url))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .context("💀 The classifier started answering and then trailed off")?;
        if !status.is_success() {
            anyhow::bail!(
                "💀 The classifier at {} said '{}': {}",
                self.url,
                status,
                String::from_utf8_lossy(&bytes)
            );
        }

        let answers: Vec<ClassifierAnswer> = serde_json::from_slice(&bytes)
            .context("💀 The classifier answered in a shape we don't recognise")?;
        answers
            .into_iter()
            .enumerate()
            .map(|(position, answer)| {
                answer
                    .into_top()
                    .with_context(|| format!("💀 The classifier returned no labels for input #{position}"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn a_classifier_at(server: &MockServer, api_token: Option<&str>) -> HttpClassifier {
        HttpClassifier::new(HttpClassifierConfig {
            url: format!("{}/models/sentiment", server.uri()),
            api_token: api_token.map(str::to_string),
        })
        .expect("💀 mock server URI should be a valid classifier url")
    }

    fn texts() -> Vec<String> {
        vec!["great video!".to_string(), "terrible, worst ever".to_string()]
    }

    #[tokio::test]
    async fn the_one_where_ranked_answers_keep_only_the_top_label() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/sentiment"))
            .and(header("authorization", "Bearer hf_secret"))
            .and(body_json(json!({ "inputs": ["great video!", "terrible, worst ever"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                [{ "label": "neutral", "score": 0.05 }, { "label": "positive", "score": 0.9 }],
                [{ "label": "negative", "score": 0.8 }, { "label": "neutral", "score": 0.15 }]
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let predictions = a_classifier_at(&server, Some("hf_secret"))
            .classify(&texts())
            .await
            .expect("💀 classification should succeed");

        assert_eq!(
            predictions,
            vec![Prediction::new("positive", 0.9), Prediction::new("negative", 0.8)]
        );
    }

    #[tokio::test]
    async fn the_one_where_flat_answers_are_taken_as_is() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/sentiment"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "label": "LABEL_1", "score": 0.7 },
                { "label": "LABEL_0", "score": 0.6 }
            ])))
            .mount(&server)
            .await;

        let predictions = a_classifier_at(&server, None)
            .classify(&texts())
            .await
            .expect("💀 classification should succeed");

        assert_eq!(
            predictions,
            vec![Prediction::new("LABEL_1", 0.7), Prediction::new("LABEL_0", 0.6)]
        );
    }

    #[tokio::test]
    async fn the_one_where_a_server_error_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model is loading"))
            .mount(&server)
            .await;

        let err = a_classifier_at(&server, None)
            .classify(&texts())
            .await
            .expect_err("💀 a 503 must not become predictions");
        assert!(format!("{err:#}").contains("model is loading"));
    }

    #[tokio::test]
    async fn the_one_where_an_empty_ranking_is_not_a_prediction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([[], []])))
            .mount(&server)
            .await;

        let err = a_classifier_at(&server, None)
            .classify(&texts())
            .await
            .expect_err("💀 no labels means no prediction");
        assert!(format!("{err:#}").contains("input #0"));
    }
}
