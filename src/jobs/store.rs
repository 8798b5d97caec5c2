use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

use crate::jobs::job::Job;

/// In-memory job map. State lives only for the process lifetime; every
/// mutation goes through a short mutex-guarded critical section, and a
/// missing id makes updates a no-op so a job expiring under an in-flight
/// file can never panic the scheduler.
#[derive(Clone, Default)]
pub struct JobStore {
    inner: Arc<Mutex<HashMap<String, Job>>>,
}

impl JobStore {
    pub fn insert(&self, job: Job) {
        self.inner.lock().unwrap().insert(job.id.clone(), job);
    }

    /// Clone of the current record, for status views and the scheduler.
    pub fn snapshot(&self, id: &str) -> Option<Job> {
        self.inner.lock().unwrap().get(id).cloned()
    }

    /// Apply a mutation if the job still exists. Returns false when the
    /// record is already gone (expired).
    pub fn update<F>(&self, id: &str, mutate: F) -> bool
    where
        F: FnOnce(&mut Job),
    {
        match self.inner.lock().unwrap().get_mut(id) {
            Some(job) => {
                mutate(job);
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: &str) -> Option<Job> {
        self.inner.lock().unwrap().remove(id)
    }

    /// Drop the record and its on-disk artifacts once the TTL elapses,
    /// whatever state the job is in at that point.
    pub fn schedule_expiry(&self, id: String, ttl: Duration) {
        let store = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(job) = store.remove(&id) {
                info!(job = %id, status = ?job.status, "job expired");
                if let Err(e) = tokio::fs::remove_dir_all(&job.root_dir).await {
                    warn!(job = %id, error = %e, "failed to remove expired job directory");
                }
            }
        });
    }
}
