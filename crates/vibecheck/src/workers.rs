//! 🧵 Workers: the backbone of vibecheck, the ones who actually do the work
//! while the HTTP handlers take all the credit in the sprint retro.
//!
//! There is exactly one of them right now, the [`Dispatcher`], and that is the point. 🦆

use anyhow::Result;
use tokio::task::JoinHandle;

mod dispatcher;
mod stage;

pub use dispatcher::{DispatchSettings, Dispatcher};

/// 🏗️ Something that runs on its own task until its input dries up.
pub trait Worker {
    /// 🚀 Consume the worker and spawn it. The handle resolves when the loop ends.
    fn start(self) -> JoinHandle<Result<()>>;
}
