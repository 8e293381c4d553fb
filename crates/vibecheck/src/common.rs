//! 📦 Common data structures — the things that ride through the queue.
//!
//! 🎬 A comment is posted. Somewhere, a person typed "first!" and meant it.
//! It does not know it is about to be averaged. None of them ever do.
//!
//! This module holds the humble, load-bearing shapes that every other module
//! passes around: the [`Comment`] we fetch, the [`Prediction`] a classifier hands
//! back, and the [`AnalysisResult`] the caller finally gets to read. 🦆

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};

/// 📏 Longest comment (in characters) fed to the scorer in plain-text mode.
/// Anything longer is quietly left out, like the guy who brought a 40-slide deck to standup.
pub const MAX_SCORABLE_CHARS: usize = 512;

/// 💬 One comment, as fetched from the provider.
///
/// Only `text` is guaranteed. The rest shows up when the provider feels chatty.
/// Replies are the same shape, one level deep: a reply never has replies of its own.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<Comment>,
}

impl Comment {
    /// 🎯 A bare comment. Just words. No author, no likes, no baggage.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// 🧹 Picks the texts that actually get scored.
///
/// Plain-text mode drops anything over [`MAX_SCORABLE_CHARS`] because the scorer has an
/// input ceiling and we'd rather skip a novel than crash on it. Rich mode hands every
/// top-level text through untouched. Order is preserved either way.
pub fn scoring_input(comments: &[Comment], rich_comments: bool) -> Vec<String> {
    comments
        .iter()
        .filter(|comment| rich_comments || comment.text.chars().count() <= MAX_SCORABLE_CHARS)
        .map(|comment| comment.text.clone())
        .collect()
}

/// 🏷️ What a classifier said about one input: a label and how sure it was.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

impl Prediction {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// 📊 Per-label statistic: average score across the whole batch, plus how many inputs got this label.
///
/// Serializes as a two-element array `[avg_score, count]` because that is what the
/// browser extension indexes into. Tuples on the wire, names in the code.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LabelStat {
    pub avg_score: f64,
    pub count: usize,
}

impl Serialize for LabelStat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.avg_score, self.count).serialize(serializer)
    }
}

/// ✅ The payload a caller gets on success.
///
/// `sentiment` always carries `positive`, `negative` and `neutral`.
/// `emotion` only carries labels the scorer actually produced.
/// `sarcasm` is the fraction of inputs judged sarcastic, in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    #[serde(rename = "sentiment_analysis")]
    pub sentiment: BTreeMap<String, LabelStat>,
    #[serde(rename = "emotion_analysis")]
    pub emotion: BTreeMap<String, LabelStat>,
    #[serde(rename = "sarcasm_analysis")]
    pub sarcasm: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_plain_mode_leaves_the_essays_at_the_door() {
        let the_essay = "a".repeat(MAX_SCORABLE_CHARS + 1);
        let just_fits = "b".repeat(MAX_SCORABLE_CHARS);
        let comments = vec![
            Comment::plain("nice"),
            Comment::plain(the_essay.clone()),
            Comment::plain(just_fits.clone()),
        ];

        assert_eq!(
            scoring_input(&comments, false),
            vec!["nice".to_string(), just_fits.clone()]
        );
        assert_eq!(
            scoring_input(&comments, true),
            vec!["nice".to_string(), the_essay, just_fits]
        );
    }

    #[test]
    fn the_one_where_length_is_counted_in_characters_not_bytes() {
        // 🧪 512 emoji is 2048 bytes but still 512 characters. It stays.
        let the_emoji_wall = "🦆".repeat(MAX_SCORABLE_CHARS);
        let comments = vec![Comment::plain(the_emoji_wall.clone())];

        assert_eq!(scoring_input(&comments, false), vec![the_emoji_wall]);
    }

    #[test]
    fn the_one_where_label_stats_go_out_as_arrays() {
        let mut sentiment = BTreeMap::new();
        sentiment.insert(
            "positive".to_string(),
            LabelStat {
                avg_score: 0.5,
                count: 2,
            },
        );
        let result = AnalysisResult {
            sentiment,
            emotion: BTreeMap::new(),
            sarcasm: 0.25,
        };

        let the_wire = serde_json::to_value(&result).expect("💀 AnalysisResult must serialize");
        assert_eq!(
            the_wire,
            serde_json::json!({
                "sentiment_analysis": { "positive": [0.5, 2] },
                "emotion_analysis": {},
                "sarcasm_analysis": 0.25
            })
        );
    }

    #[test]
    fn the_one_where_rich_comments_skip_empty_fields_on_the_wire() {
        let the_comment = Comment {
            text: "hi".to_string(),
            author: Some("someone".to_string()),
            ..Comment::default()
        };

        let the_wire = serde_json::to_value(&the_comment).expect("💀 Comment must serialize");
        assert_eq!(the_wire, serde_json::json!({ "text": "hi", "author": "someone" }));
    }
}
