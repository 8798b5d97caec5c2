use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::av::cmd::CliRunner;
use crate::av::pipeline::{self, ProcessConfig};
use crate::av::AvResult;
use crate::jobs::job::Status;
use crate::jobs::store::JobStore;

/// Maximum number of jobs simultaneously in processing.
pub const DEFAULT_CONCURRENT_JOBS: usize = 2;

/// Turns one uploaded file into one output file. Abstracted so the
/// scheduler's admission and state machine can be tested without ffmpeg.
#[async_trait]
pub trait FileProcessor: Send + Sync + 'static {
    /// Process `input` into `output_dir`, returning the output file name.
    async fn process(
        &self,
        input: &Path,
        output_dir: &Path,
        original_name: &str,
    ) -> AvResult<String>;
}

/// The real processor: silence analysis and re-encode through ffmpeg.
pub struct MediaProcessor {
    runner: CliRunner,
    config: ProcessConfig,
}

impl MediaProcessor {
    pub fn new(config: ProcessConfig) -> Self {
        Self {
            runner: CliRunner,
            config,
        }
    }
}

#[async_trait]
impl FileProcessor for MediaProcessor {
    async fn process(
        &self,
        input: &Path,
        output_dir: &Path,
        original_name: &str,
    ) -> AvResult<String> {
        let output_name = cut_name(original_name);
        let output_path = output_dir.join(&output_name);
        pipeline::process_file(&self.runner, &self.config, input, &output_path).await?;
        Ok(output_name)
    }
}

/// Output file name for an input: `talk.mp4` becomes `talk_cut.mp4`.
pub fn cut_name(original_name: &str) -> String {
    let path = Path::new(original_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("media");
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{}_cut.{}", stem, ext),
        None => format!("{}_cut", stem),
    }
}

enum SchedulerMsg {
    Submit(String),
    Finished(String),
}

/// Admission queue for jobs. All queue and active-count mutation happens
/// inside a single owning loop fed over a channel, so admission needs no
/// locks and is idempotent: every message re-runs it, and it is a no-op
/// when nothing is queued or the limit is reached.
#[derive(Clone)]
pub struct Scheduler {
    tx: mpsc::UnboundedSender<SchedulerMsg>,
}

impl Scheduler {
    pub fn start(store: JobStore, processor: Arc<dyn FileProcessor>, limit: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_loop(store, processor, limit, rx, tx.clone()));
        Self { tx }
    }

    pub fn submit(&self, job_id: &str) {
        let _ = self.tx.send(SchedulerMsg::Submit(job_id.to_string()));
    }
}

async fn run_loop(
    store: JobStore,
    processor: Arc<dyn FileProcessor>,
    limit: usize,
    mut rx: mpsc::UnboundedReceiver<SchedulerMsg>,
    tx: mpsc::UnboundedSender<SchedulerMsg>,
) {
    let mut pending: VecDeque<String> = VecDeque::new();
    let mut active: usize = 0;

    while let Some(msg) = rx.recv().await {
        match msg {
            SchedulerMsg::Submit(id) => pending.push_back(id),
            SchedulerMsg::Finished(_) => active = active.saturating_sub(1),
        }

        while active < limit {
            let Some(id) = pending.pop_front() else { break };

            // a job can expire while still queued; skip it without a slot
            if !store.update(&id, |job| job.status = Status::Processing) {
                warn!(job = %id, "queued job expired before admission");
                continue;
            }

            active += 1;
            info!(job = %id, active, "job admitted");
            tokio::spawn(run_job(
                store.clone(),
                processor.clone(),
                id,
                tx.clone(),
            ));
        }
    }
}

/// Advance one job's files strictly in upload order. The first failure
/// marks the file and the job as errored and skips the remaining files;
/// the finished message is sent either way so draining never stalls.
async fn run_job(
    store: JobStore,
    processor: Arc<dyn FileProcessor>,
    job_id: String,
    tx: mpsc::UnboundedSender<SchedulerMsg>,
) {
    let file_count = store.snapshot(&job_id).map(|job| job.files.len());

    if let Some(file_count) = file_count {
        let mut failed = false;

        for index in 0..file_count {
            let Some(job) = store.snapshot(&job_id) else {
                // expired mid-job; in-flight paths are gone, stop quietly
                break;
            };
            let file = job.files[index].clone();

            store.update(&job_id, |job| {
                job.files[index].status = Status::Processing;
            });

            match processor
                .process(&file.input_path, &job.output_dir, &file.original_name)
                .await
            {
                Ok(output_name) => {
                    store.update(&job_id, |job| {
                        job.files[index].status = Status::Done;
                        job.files[index].output_name = Some(output_name);
                    });
                    // the input is not needed once the output exists
                    if let Err(e) = tokio::fs::remove_file(&file.input_path).await {
                        warn!(job = %job_id, file = %file.original_name, error = %e,
                            "could not remove processed input");
                    }
                }
                Err(e) => {
                    error!(job = %job_id, file = %file.original_name, error = %e,
                        "file processing failed");
                    store.update(&job_id, |job| {
                        job.files[index].status = Status::Error;
                        job.files[index].error = Some(e.to_string());
                        job.status = Status::Error;
                    });
                    failed = true;
                    break;
                }
            }
        }

        if !failed {
            store.update(&job_id, |job| {
                if job.status == Status::Processing {
                    job.status = Status::Done;
                }
            });
        }
    }

    let _ = tx.send(SchedulerMsg::Finished(job_id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::av::AvError;
    use crate::jobs::job::{FileTask, Job};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    fn make_job(id: &str, file_names: &[&str]) -> Job {
        let root = PathBuf::from(format!("/tmp/jumpcut-test/{}", id));
        let upload_dir = root.join("uploads");
        let output_dir = root.join("out");
        let files = file_names
            .iter()
            .map(|name| FileTask::new(*name, upload_dir.join(name)))
            .collect();
        Job::new(id, root, upload_dir, output_dir, files)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    /// Blocks every process() call until the test releases a permit.
    struct GatedProcessor {
        gate: Semaphore,
    }

    #[async_trait]
    impl FileProcessor for GatedProcessor {
        async fn process(
            &self,
            _input: &Path,
            _output_dir: &Path,
            original_name: &str,
        ) -> AvResult<String> {
            let permit = self.gate.acquire().await.expect("gate closed");
            permit.forget();
            Ok(cut_name(original_name))
        }
    }

    /// Fails any file whose name contains "bad"; tracks per-call overlap.
    struct TrackingProcessor {
        active: AtomicUsize,
        max_active: AtomicUsize,
        order: Mutex<Vec<String>>,
    }

    impl TrackingProcessor {
        fn new() -> Self {
            Self {
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                order: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl FileProcessor for TrackingProcessor {
        async fn process(
            &self,
            _input: &Path,
            _output_dir: &Path,
            original_name: &str,
        ) -> AvResult<String> {
            self.order.lock().unwrap().push(original_name.to_string());
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);

            if original_name.contains("bad") {
                Err(AvError::EmptyResult)
            } else {
                Ok(cut_name(original_name))
            }
        }
    }

    #[tokio::test]
    async fn test_third_job_waits_for_a_slot() {
        let store = JobStore::default();
        let gate = Arc::new(GatedProcessor {
            gate: Semaphore::new(0),
        });
        let scheduler = Scheduler::start(store.clone(), gate.clone(), 2);

        for id in ["j1", "j2", "j3"] {
            store.insert(make_job(id, &["a.mp4"]));
            scheduler.submit(id);
        }
        settle().await;

        assert_eq!(store.snapshot("j1").unwrap().status, Status::Processing);
        assert_eq!(store.snapshot("j2").unwrap().status, Status::Processing);
        assert_eq!(store.snapshot("j3").unwrap().status, Status::Queued);

        // one slot frees, the third job is admitted immediately
        gate.gate.add_permits(1);
        settle().await;

        let done = ["j1", "j2"]
            .iter()
            .filter(|id| store.snapshot(id).unwrap().status == Status::Done)
            .count();
        assert_eq!(done, 1);
        assert_eq!(store.snapshot("j3").unwrap().status, Status::Processing);

        gate.gate.add_permits(2);
        settle().await;
        for id in ["j1", "j2", "j3"] {
            assert_eq!(store.snapshot(id).unwrap().status, Status::Done);
        }
    }

    #[tokio::test]
    async fn test_files_within_a_job_never_overlap() {
        let store = JobStore::default();
        let tracker = Arc::new(TrackingProcessor::new());
        let scheduler = Scheduler::start(store.clone(), tracker.clone(), 2);

        store.insert(make_job("j1", &["a.mp4", "b.mp4", "c.mp4"]));
        scheduler.submit("j1");
        settle().await;

        assert_eq!(store.snapshot("j1").unwrap().status, Status::Done);
        assert_eq!(tracker.max_active.load(Ordering::SeqCst), 1);
        assert_eq!(
            *tracker.order.lock().unwrap(),
            vec!["a.mp4", "b.mp4", "c.mp4"]
        );
    }

    #[tokio::test]
    async fn test_file_failure_aborts_remaining_files() {
        let store = JobStore::default();
        let tracker = Arc::new(TrackingProcessor::new());
        let scheduler = Scheduler::start(store.clone(), tracker.clone(), 2);

        store.insert(make_job("j1", &["a.mp4", "bad.mp4", "c.mp4"]));
        scheduler.submit("j1");
        settle().await;

        let job = store.snapshot("j1").unwrap();
        assert_eq!(job.status, Status::Error);
        assert_eq!(job.files[0].status, Status::Done);
        assert_eq!(job.files[1].status, Status::Error);
        assert!(job.files[1].error.is_some());
        // never attempted
        assert_eq!(job.files[2].status, Status::Queued);
        assert!(!tracker
            .order
            .lock()
            .unwrap()
            .contains(&"c.mp4".to_string()));
    }

    #[tokio::test]
    async fn test_errored_job_still_frees_its_slot() {
        let store = JobStore::default();
        let tracker = Arc::new(TrackingProcessor::new());
        let scheduler = Scheduler::start(store.clone(), tracker.clone(), 1);

        store.insert(make_job("j1", &["bad.mp4"]));
        store.insert(make_job("j2", &["a.mp4"]));
        scheduler.submit("j1");
        scheduler.submit("j2");
        settle().await;

        assert_eq!(store.snapshot("j1").unwrap().status, Status::Error);
        assert_eq!(store.snapshot("j2").unwrap().status, Status::Done);
    }

    #[tokio::test]
    async fn test_expiry_mid_processing_does_not_wedge_the_queue() {
        let store = JobStore::default();
        let gate = Arc::new(GatedProcessor {
            gate: Semaphore::new(0),
        });
        let scheduler = Scheduler::start(store.clone(), gate.clone(), 1);

        store.insert(make_job("j1", &["a.mp4", "b.mp4"]));
        scheduler.submit("j1");
        settle().await;
        assert_eq!(store.snapshot("j1").unwrap().status, Status::Processing);

        // TTL fires while the first file is still in flight
        store.remove("j1");
        gate.gate.add_permits(2);
        settle().await;

        // the slot is free again: a later job runs to completion
        store.insert(make_job("j2", &["a.mp4"]));
        scheduler.submit("j2");
        gate.gate.add_permits(1);
        settle().await;
        assert_eq!(store.snapshot("j2").unwrap().status, Status::Done);
        assert!(store.snapshot("j1").is_none());
    }

    #[tokio::test]
    async fn test_job_expired_while_queued_is_skipped() {
        let store = JobStore::default();
        let tracker = Arc::new(TrackingProcessor::new());
        let scheduler = Scheduler::start(store.clone(), tracker.clone(), 1);

        // never inserted into the store: stands in for an expired record
        scheduler.submit("ghost");
        store.insert(make_job("j1", &["a.mp4"]));
        scheduler.submit("j1");
        settle().await;

        assert_eq!(store.snapshot("j1").unwrap().status, Status::Done);
    }

    #[test]
    fn test_cut_name_keeps_extension() {
        assert_eq!(cut_name("talk.mp4"), "talk_cut.mp4");
        assert_eq!(cut_name("a.b.wav"), "a.b_cut.wav");
        assert_eq!(cut_name("noext"), "noext_cut");
    }
}
