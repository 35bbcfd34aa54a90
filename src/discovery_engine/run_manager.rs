//! Registry of background discovery runs
//!
//! Runs are spawned onto the tokio runtime and tracked by run id; finished
//! runs stay queryable for a few minutes, then a cleanup task drops them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::engine::DiscoveryEngine;
use super::types::{RunPlan, RunStatus, RunSummary, StopHandle};

const RUN_REGISTRY_INITIAL_CAPACITY: usize = 16;

/// How long terminal runs stay queryable
const TERMINAL_RETENTION: Duration = Duration::from_secs(5 * 60);

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Externally visible state of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub patch_id: String,
    pub topic: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub summary: Option<RunSummary>,
    pub error: Option<String>,
}

struct TrackedRun {
    record: RunRecord,
    stop: StopHandle,
}

#[derive(Clone)]
pub struct RunManager {
    runs: Arc<Mutex<HashMap<String, TrackedRun>>>,
}

impl RunManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            runs: Arc::new(Mutex::new(HashMap::with_capacity(
                RUN_REGISTRY_INITIAL_CAPACITY,
            ))),
        }
    }

    /// Start `plan` in the background and return its run id.
    pub async fn spawn(&self, engine: Arc<DiscoveryEngine>, plan: RunPlan) -> String {
        let run_id = Uuid::new_v4().to_string();
        let stop = StopHandle::new();
        let record = RunRecord {
            run_id: run_id.clone(),
            patch_id: plan.config.patch_id().to_string(),
            topic: plan.config.topic().to_string(),
            status: RunStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            summary: None,
            error: None,
        };
        self.runs.lock().await.insert(
            run_id.clone(),
            TrackedRun {
                record,
                stop: stop.clone(),
            },
        );

        let runs = Arc::clone(&self.runs);
        let id = run_id.clone();
        tokio::spawn(async move {
            let outcome = engine.run(id.clone(), plan, stop).await;
            let mut runs = runs.lock().await;
            let Some(tracked) = runs.get_mut(&id) else {
                warn!("Run {id} finished after it was removed from the registry");
                return;
            };
            tracked.record.finished_at = Some(Utc::now());
            match outcome {
                Ok(summary) => {
                    tracked.record.status = summary.status;
                    tracked.record.summary = Some(summary);
                }
                Err(e) => {
                    tracked.record.status = RunStatus::Failed;
                    tracked.record.error = Some(e.to_string());
                }
            }
        });

        info!("Spawned discovery run {run_id}");
        run_id
    }

    pub async fn status(&self, run_id: &str) -> Option<RunRecord> {
        self.runs
            .lock()
            .await
            .get(run_id)
            .map(|tracked| tracked.record.clone())
    }

    /// Request a cooperative stop. False when the run is unknown or already
    /// finished.
    pub async fn stop(&self, run_id: &str) -> bool {
        let runs = self.runs.lock().await;
        match runs.get(run_id) {
            Some(tracked) if !tracked.record.status.is_terminal() => {
                tracked.stop.stop();
                info!("Stop requested for run {run_id}");
                true
            }
            _ => false,
        }
    }

    /// Ids of runs still in progress
    pub async fn list_active(&self) -> Vec<String> {
        self.runs
            .lock()
            .await
            .values()
            .filter(|tracked| !tracked.record.status.is_terminal())
            .map(|tracked| tracked.record.run_id.clone())
            .collect()
    }

    pub async fn remove(&self, run_id: &str) -> Option<RunRecord> {
        self.runs
            .lock()
            .await
            .remove(run_id)
            .map(|tracked| tracked.record)
    }

    /// Drop terminal runs that finished more than `retention` ago.
    pub async fn cleanup(&self, retention: Duration) -> usize {
        let now = Utc::now();
        let mut runs = self.runs.lock().await;
        let before = runs.len();

        runs.retain(|run_id, tracked| {
            let Some(finished) = tracked.record.finished_at else {
                return true;
            };
            let age = now
                .signed_duration_since(finished)
                .to_std()
                .unwrap_or(Duration::ZERO);
            let keep = !tracked.record.status.is_terminal() || age < retention;
            if !keep {
                debug!("Removing finished run {run_id} ({})", tracked.record.status);
            }
            keep
        });

        let removed = before - runs.len();
        if removed > 0 {
            debug!("Cleaned up {removed} finished runs");
        }
        removed
    }

    /// Spawn the periodic cleanup loop. Call once after wrapping in `Arc`.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                self.cleanup(TERMINAL_RETENTION).await;
            }
        });
    }
}

impl Default for RunManager {
    fn default() -> Self {
        Self::new()
    }
}
