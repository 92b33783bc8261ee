//! Deferred end-of-media restart
//!
//! Backends raise end-of-media from inside their own event dispatch, where
//! issuing stop/play re-entrantly can deadlock. The control thread hands the
//! [`RestartPlan`] to this worker, which waits out a grace delay and posts
//! the plan back to be executed as an ordinary control-thread message.

use crate::error::{EngineError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use looper_playback::RestartPlan;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Worker thread that delays restart plans
pub struct RestartWorker {
    request_tx: Option<Sender<RestartPlan>>,
    handle: Option<JoinHandle<()>>,
}

impl RestartWorker {
    /// Spawn the worker; delayed plans are delivered on `done_tx`
    pub fn spawn(grace: Duration, done_tx: Sender<RestartPlan>) -> Result<Self> {
        let (request_tx, request_rx) = unbounded();

        let handle = thread::Builder::new()
            .name("looper-restart".to_string())
            .spawn(move || Self::run(grace, &request_rx, &done_tx))
            .map_err(EngineError::Spawn)?;

        Ok(Self {
            request_tx: Some(request_tx),
            handle: Some(handle),
        })
    }

    fn run(grace: Duration, request_rx: &Receiver<RestartPlan>, done_tx: &Sender<RestartPlan>) {
        for plan in request_rx {
            thread::sleep(grace);

            tracing::debug!(generation = plan.generation, "Posting restart");
            if done_tx.send(plan).is_err() {
                break;
            }
        }
    }

    /// Queue a plan for delayed execution
    pub fn schedule(&self, plan: RestartPlan) {
        if let Some(tx) = &self.request_tx {
            if tx.send(plan).is_err() {
                tracing::warn!("Restart worker is gone, dropping restart");
            }
        }
    }

    /// Stop accepting plans and join the thread
    pub fn shutdown(&mut self) {
        self.request_tx = None;

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Restart worker panicked");
            }
        }
    }
}

impl Drop for RestartWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn plan(generation: u64) -> RestartPlan {
        RestartPlan {
            generation,
            position: Duration::ZERO,
            segment_loop: None,
        }
    }

    #[test]
    fn plan_is_posted_after_grace() {
        let (done_tx, done_rx) = unbounded();
        let mut worker = RestartWorker::spawn(Duration::from_millis(30), done_tx).unwrap();

        let started = Instant::now();
        worker.schedule(plan(7));

        let posted = done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(posted, plan(7));
        assert!(started.elapsed() >= Duration::from_millis(30));

        worker.shutdown();
    }

    #[test]
    fn shutdown_joins_idle_worker() {
        let (done_tx, done_rx) = unbounded();
        let mut worker = RestartWorker::spawn(Duration::from_millis(10), done_tx).unwrap();

        worker.shutdown();
        worker.schedule(plan(1));

        assert!(done_rx.recv_timeout(Duration::from_millis(50)).is_err());
    }
}
