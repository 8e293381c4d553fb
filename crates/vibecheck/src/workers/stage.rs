//! ⏱️ Bounded-time stages.
//!
//! A stage runs on its own task and the dispatcher waits at most `budget` for it.
//! On timeout the task is **abandoned, not cancelled**: the JoinHandle is dropped,
//! the task keeps running to completion in the background, and its result goes nowhere.
//! Anything an abandoned stage touches must stay safe to touch from the next job.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinError;

/// 💀 How a stage can fail to produce a value.
#[derive(Debug)]
pub(crate) enum StageFailure<E> {
    TimedOut,
    Failed(E),
    Panicked(JoinError),
}

pub(crate) async fn run_stage<T, E, F>(budget: Duration, work: F) -> Result<T, StageFailure<E>>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let handle = tokio::spawn(work);
    match tokio::time::timeout(budget, handle).await {
        Err(_elapsed) => Err(StageFailure::TimedOut),
        Ok(Err(join_error)) => Err(StageFailure::Panicked(join_error)),
        Ok(Ok(Err(err))) => Err(StageFailure::Failed(err)),
        Ok(Ok(Ok(value))) => Ok(value),
    }
}
