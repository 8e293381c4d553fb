//! 🧪 In-memory comment source — canned comments, zero network, zero drama.
//!
//! Unknown video IDs get a provider-style rejection so the 404 path is reachable
//! without a real API key. ⚠️ This is for demos and tests. Not for prod. 🦆

use std::collections::HashMap;

use async_trait::async_trait;

use crate::common::Comment;
use crate::error::FetchError;
use crate::sources::CommentSource;

#[derive(Debug, Default, Clone)]
pub struct InMemorySource {
    videos: HashMap<String, Vec<String>>,
}

impl InMemorySource {
    pub fn new(videos: HashMap<String, Vec<String>>) -> Self {
        Self { videos }
    }
}

#[async_trait]
impl CommentSource for InMemorySource {
    /// 📄 One page, always. `max_pages` has nothing to page through here.
    async fn fetch(&self, video_id: &str, _max_pages: usize) -> Result<Vec<Comment>, FetchError> {
        match self.videos.get(video_id) {
            Some(texts) => Ok(texts.iter().map(Comment::plain).collect()),
            None => Err(FetchError::Provider {
                status: 404,
                message: format!("video '{video_id}' not found"),
            }),
        }
    }
}
