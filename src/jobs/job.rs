use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

/// Lifecycle state shared by jobs and their files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Queued,
    Processing,
    Done,
    Error,
}

/// One uploaded file inside a job. Mutated only through the store by the
/// scheduler's thread of control; `output_name` is set exactly once, on
/// success.
#[derive(Debug, Clone)]
pub struct FileTask {
    pub original_name: String,
    pub input_path: PathBuf,
    pub output_name: Option<String>,
    pub status: Status,
    pub error: Option<String>,
}

impl FileTask {
    pub fn new(original_name: impl Into<String>, input_path: PathBuf) -> Self {
        Self {
            original_name: original_name.into(),
            input_path,
            output_name: None,
            status: Status::Queued,
            error: None,
        }
    }
}

/// One upload batch, processed under a shared lifecycle and expiry.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub status: Status,
    pub files: Vec<FileTask>,
    /// Per-job directory holding `uploads/` and `out/`; removed on expiry.
    pub root_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub created_at: Instant,
}

impl Job {
    pub fn new(
        id: impl Into<String>,
        root_dir: PathBuf,
        upload_dir: PathBuf,
        output_dir: PathBuf,
        files: Vec<FileTask>,
    ) -> Self {
        Self {
            id: id.into(),
            status: Status::Queued,
            files,
            root_dir,
            upload_dir,
            output_dir,
            created_at: Instant::now(),
        }
    }
}
