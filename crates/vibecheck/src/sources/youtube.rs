//! # 📺 THE YOUTUBE COMMENT SOURCE
//!
//! 🎬 COLD OPEN — INT. COMMENT SECTION — 3:47 AM
//!
//! Four thousand people have opinions about a video of a cat falling off a couch.
//! We are going to read one hundred of them. Maybe two hundred, if there's a next page.
//!
//! Talks to the YouTube Data API v3 `commentThreads` endpoint, one page at a time,
//! following `nextPageToken` until it runs out or we hit `max_pages`.
//!
//! 🧠 Knowledge graph:
//! - request: `GET {base_url}/commentThreads?part=snippet,replies&videoId=..&maxResults=..&key=..[&pageToken=..]`
//! - top-level text: `items[].snippet.topLevelComment.snippet.textOriginal`
//! - replies: `items[].replies.comments[].snippet`, one level deep
//! - non-2xx: [`FetchError::Provider`], with `error.message` from the body when present
//! - anything else that breaks: [`FetchError::Transport`]

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::app_config::YouTubeSourceConfig;
use crate::common::Comment;
use crate::error::FetchError;
use crate::sources::CommentSource;

/// 📡 The YouTube-backed comment source. Holds a pooled HTTP client, reused across jobs.
#[derive(Debug)]
pub struct YouTubeSource {
    client: reqwest::Client,
    config: YouTubeSourceConfig,
    endpoint: Url,
}

// 📦 Just enough of the API response to get what we need. serde ignores the rest.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadPage {
    #[serde(default)]
    items: Vec<CommentThread>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentThread {
    snippet: CommentThreadSnippet,
    #[serde(default)]
    replies: Option<CommentThreadReplies>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: CommentResource,
}

#[derive(Debug, Deserialize)]
struct CommentThreadReplies {
    #[serde(default)]
    comments: Vec<CommentResource>,
}

#[derive(Debug, Deserialize)]
struct CommentResource {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    text_original: String,
    #[serde(default)]
    author_display_name: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    like_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    #[serde(default)]
    message: String,
}

impl CommentSnippet {
    fn into_comment(self, replies: Vec<Comment>) -> Comment {
        Comment {
            text: self.text_original,
            author: self.author_display_name,
            published_at: self.published_at,
            like_count: self.like_count,
            replies,
        }
    }
}

impl CommentThread {
    fn into_comment(self) -> Comment {
        let replies = self
            .replies
            .map(|replies| {
                replies
                    .comments
                    .into_iter()
                    .map(|reply| reply.snippet.into_comment(Vec::new()))
                    .collect()
            })
            .unwrap_or_default();
        self.snippet.top_level_comment.snippet.into_comment(replies)
    }
}

impl YouTubeSource {
    /// 🚀 Build the client and validate the endpoint URL up front.
    ///
    /// 10s to connect, 30s to read. Like a polite person, we will wait, but not forever.
    /// The dispatcher's stage budget is usually the tighter of the two anyway.
    pub fn new(config: YouTubeSourceConfig) -> anyhow::Result<Self> {
        let endpoint = Url::parse(&format!(
            "{}/commentThreads",
            config.base_url.trim_end_matches('/')
        ))
        .with_context(|| {
            format!(
                "💀 YouTube base_url '{}' is not a URL we can work with",
                config.base_url
            )
        })?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .context("💀 Failed to build the HTTP client for YouTube")?;

        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    fn page_url(&self, video_id: &str, page_token: Option<&str>) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("part", "snippet,replies")
                .append_pair("videoId", video_id)
                .append_pair("maxResults", &self.config.page_size.to_string())
                .append_pair("key", &self.config.api_key);
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }
        url
    }

    /// 📄 One round trip, one page.
    async fn fetch_page(
        &self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> Result<CommentThreadPage, FetchError> {
        let response = self
            .client
            .get(self.page_url(video_id, page_token))
            .send()
            .await
            .context("💀 The request to YouTube never came back with an answer")
            .map_err(FetchError::Transport)?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .context("💀 YouTube started answering and then trailed off")
            .map_err(FetchError::Transport)?;

        if !status.is_success() {
            // -- the provider usually explains itself in error.message. usually.
            let message = serde_json::from_slice::<ProviderErrorBody>(&body)
                .map(|parsed| parsed.error.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(FetchError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body)
            .context("💀 YouTube said 200 OK and then sent something that isn't a comment thread page")
            .map_err(FetchError::Transport)
    }
}

#[async_trait]
impl CommentSource for YouTubeSource {
    async fn fetch(&self, video_id: &str, max_pages: usize) -> Result<Vec<Comment>, FetchError> {
        let mut page = self.fetch_page(video_id, None).await?;
        let mut next_page_token = page.next_page_token.take();
        let mut comments: Vec<Comment> = page.items.into_iter().map(CommentThread::into_comment).collect();

        let mut extra_pages = 0;
        while extra_pages < max_pages {
            let Some(token) = next_page_token.take() else {
                break;
            };
            trace!("📄 Following page token for '{}' (extra page {})", video_id, extra_pages + 1);
            let mut page = self.fetch_page(video_id, Some(&token)).await?;
            next_page_token = page.next_page_token.take();
            comments.extend(page.items.into_iter().map(CommentThread::into_comment));
            extra_pages += 1;
        }

        debug!(
            "✅ Finished fetching comments for '{}'. {} comment threads found.",
            video_id,
            comments.len()
        );
        Ok(comments)
    }
}
