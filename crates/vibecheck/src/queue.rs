//! 📬 The job queue — where requests take a number and wait their turn.
//!
//! Any number of request handlers push [`Job`]s in. Exactly one dispatcher pulls them
//! out, strictly first-in first-out. The queue is unbounded: `enqueue` never blocks and
//! never drops. Each job carries its own one-shot reply channel, used once and thrown away.
//!
//! 🧠 Knowledge graph:
//! - producers: [`JobQueue`] (Clone, one per handler if you like)
//! - consumer: [`JobReceiver`] (not Clone, there is only one reader)
//! - transport: `async_channel::unbounded`, reply: `tokio::sync::oneshot`

use std::time::Instant;

use async_channel::{Receiver, Sender};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::{AnalysisError, Outcome};

/// 🎟️ One unit of work: which video, and where to send the verdict.
#[derive(Debug)]
pub struct Job {
    pub video_id: String,
    enqueued_at: Instant,
    reply: oneshot::Sender<Outcome>,
}

impl Job {
    /// 🏗️ A fresh job plus the receiving end of its reply channel.
    pub fn new(video_id: impl Into<String>) -> (Self, oneshot::Receiver<Outcome>) {
        let (reply, verdict) = oneshot::channel();
        let job = Self {
            video_id: video_id.into(),
            enqueued_at: Instant::now(),
            reply,
        };
        (job, verdict)
    }

    /// ⏱️ When the job entered the queue. Diagnostics only.
    pub fn enqueued_at(&self) -> Instant {
        self.enqueued_at
    }

    /// 📮 Publish the one and only outcome. Consumes the job, so there is no second time.
    ///
    /// Returns `false` if the requester already hung up. Not our problem, but we note it.
    pub fn publish(self, outcome: Outcome) -> bool {
        let video_id = self.video_id;
        match self.reply.send(outcome) {
            Ok(()) => true,
            Err(_) => {
                debug!("📭 Requester for '{}' left before the verdict arrived", video_id);
                false
            }
        }
    }
}

/// 🚪 The queue shut its doors: the dispatcher is gone.
#[derive(Debug, Error)]
#[error("job queue is closed, dispatcher is no longer running")]
pub struct QueueClosed(pub Job);

/// 📥 Producer side of the queue. Cheap to clone, safe to share.
#[derive(Debug, Clone)]
pub struct JobQueue {
    tx: Sender<Job>,
}

/// 📤 Consumer side of the queue. Single reader by construction.
#[derive(Debug)]
pub struct JobReceiver {
    rx: Receiver<Job>,
}

/// 🏗️ Build a connected queue pair.
pub fn job_queue() -> (JobQueue, JobReceiver) {
    let (tx, rx) = async_channel::unbounded();
    (JobQueue { tx }, JobReceiver { rx })
}

impl JobQueue {
    /// ➕ Append to the tail. Never blocks. Only fails if the dispatcher is gone.
    pub fn enqueue(&self, job: Job) -> Result<(), QueueClosed> {
        self.tx
            .try_send(job)
            .map_err(|err| QueueClosed(err.into_inner()))
    }

    /// 🎯 Enqueue a job for `video_id` and wait for its outcome.
    ///
    /// If the queue is closed, or the reply channel is dropped without a verdict,
    /// the caller still gets a well-formed `Internal` outcome.
    pub async fn submit(&self, video_id: impl Into<String>) -> Outcome {
        let (job, verdict) = Job::new(video_id);
        if let Err(QueueClosed(job)) = self.enqueue(job) {
            warn!("💀 Rejected job for '{}': dispatcher is not running", job.video_id);
            return Err(AnalysisError::Internal);
        }
        match verdict.await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("💀 Reply channel dropped without an outcome");
                Err(AnalysisError::Internal)
            }
        }
    }

    /// 📊 Jobs waiting, not counting the one being worked on.
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

impl JobReceiver {
    /// ⏳ Wait for the next job. `None` once every producer is gone and the queue is drained.
    pub async fn dequeue(&self) -> Option<Job> {
        self.rx.recv().await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::AnalysisResult;
    use std::collections::BTreeMap;

    fn an_empty_result() -> AnalysisResult {
        AnalysisResult {
            sentiment: BTreeMap::new(),
            emotion: BTreeMap::new(),
            sarcasm: 0.0,
        }
    }

    #[tokio::test]
    async fn the_one_where_jobs_come_out_in_the_order_they_went_in() {
        let (queue, jobs) = job_queue();
        for video_id in ["first", "second", "third"] {
            let (job, _verdict) = Job::new(video_id);
            queue.enqueue(job).expect("💀 open queue should accept jobs");
        }
        assert_eq!(queue.len(), 3);

        let mut the_lineup = Vec::new();
        for _ in 0..3 {
            let job = jobs.dequeue().await.expect("💀 three jobs went in");
            the_lineup.push(job.video_id);
        }
        assert_eq!(the_lineup, vec!["first", "second", "third"]);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn the_one_where_dequeue_returns_none_after_the_last_producer_leaves() {
        let (queue, jobs) = job_queue();
        let (job, _verdict) = Job::new("last-call");
        queue.enqueue(job).expect("💀 open queue should accept jobs");
        drop(queue);

        // 🧪 queued work still drains before the door closes
        assert_eq!(
            jobs.dequeue().await.map(|job| job.video_id),
            Some("last-call".to_string())
        );
        assert!(jobs.dequeue().await.is_none());
    }

    #[tokio::test]
    async fn the_one_where_submit_gets_the_published_outcome() {
        let (queue, jobs) = job_queue();
        let worker = tokio::spawn(async move {
            let job = jobs.dequeue().await.expect("💀 a job should arrive");
            assert!(job.publish(Ok(an_empty_result())));
        });

        let outcome = queue.submit("abc").await;
        assert_eq!(outcome, Ok(an_empty_result()));
        worker.await.expect("💀 worker task panicked");
    }

    #[tokio::test]
    async fn the_one_where_a_dead_dispatcher_still_yields_a_typed_outcome() {
        let (queue, jobs) = job_queue();
        drop(jobs);

        assert_eq!(queue.submit("abc").await, Err(AnalysisError::Internal));
    }

    #[tokio::test]
    async fn the_one_where_a_dropped_job_still_yields_a_typed_outcome() {
        let (queue, jobs) = job_queue();
        let worker = tokio::spawn(async move {
            // 🗑️ take the job and lose it, like a sock in the dryer
            drop(jobs.dequeue().await);
        });

        assert_eq!(queue.submit("abc").await, Err(AnalysisError::Internal));
        worker.await.expect("💀 worker task panicked");
    }

    #[test]
    fn the_one_where_publishing_to_a_departed_requester_is_not_fatal() {
        let (job, verdict) = Job::new("ghost");
        drop(verdict);
        assert!(!job.publish(Err(AnalysisError::Internal)));
    }
}
