//! 🔌 Comment sources — where the comments come from before we judge them.
//!
//! 🎭 This module is the casting agency. Need comments from YouTube? Got it.
//! Need comments from a hardcoded map for a demo on a plane with no WiFi? Also got it.
//!
//! # Contract
//! - `fetch(video_id, max_pages)` returns comments in page order, first page first.
//! - Follow the provider's continuation token for at most `max_pages` extra pages,
//!   stop early when there isn't one.
//! - Zero comments is a perfectly good answer. A provider error is not, and must be
//!   reported as [`FetchError::Provider`], distinct from transport trouble.

use async_trait::async_trait;

use crate::app_config::SourceConfig;
use crate::common::Comment;
use crate::error::FetchError;

pub mod in_mem;
pub mod youtube;

pub use in_mem::InMemorySource;
pub use youtube::YouTubeSource;

/// 🚰 Something that can turn a video ID into comments.
///
/// `Send + Sync` because the dispatcher hands it to a spawned stage task.
/// Implementations must tolerate an abandoned call still running in the background.
#[async_trait]
pub trait CommentSource: Send + Sync + std::fmt::Debug {
    async fn fetch(&self, video_id: &str, max_pages: usize) -> Result<Vec<Comment>, FetchError>;
}

/// 🎭 The many faces of a comment source, picked by config.
#[derive(Debug)]
pub enum SourceBackend {
    YouTube(YouTubeSource),
    InMemory(InMemorySource),
}

impl SourceBackend {
    /// 🏗️ Build the configured backend. Fails fast, at startup, not on the first request.
    pub fn from_config(config: &SourceConfig) -> anyhow::Result<Self> {
        Ok(match config {
            SourceConfig::YouTube(youtube) => SourceBackend::YouTube(YouTubeSource::new(youtube.clone())?),
            SourceConfig::InMemory(in_mem) => {
                SourceBackend::InMemory(InMemorySource::new(in_mem.videos.clone()))
            }
        })
    }
}

#[async_trait]
impl CommentSource for SourceBackend {
    async fn fetch(&self, video_id: &str, max_pages: usize) -> Result<Vec<Comment>, FetchError> {
        match self {
            SourceBackend::YouTube(youtube) => youtube.fetch(video_id, max_pages).await,
            SourceBackend::InMemory(in_mem) => in_mem.fetch(video_id, max_pages).await,
        }
    }
}
