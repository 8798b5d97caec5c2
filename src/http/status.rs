use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::http::AppState;
use crate::jobs::{Job, Status};

#[derive(Debug, Serialize)]
pub struct JobView {
    pub id: String,
    pub status: Status,
    pub files: Vec<FileView>,
}

#[derive(Debug, Serialize)]
pub struct FileView {
    pub name: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<String>,
}

impl JobView {
    pub fn from_job(job: &Job) -> Self {
        let files = job
            .files
            .iter()
            .map(|file| FileView {
                name: file.original_name.clone(),
                status: file.status,
                error: file.error.clone(),
                download: file
                    .output_name
                    .as_ref()
                    .map(|output| format!("/jobs/{}/files/{}", job.id, output)),
            })
            .collect();
        Self {
            id: job.id.clone(),
            status: job.status,
            files,
        }
    }
}

/// Per-file status for one job, or 404 once the job is unknown or expired.
pub async fn job_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobView>, (StatusCode, String)> {
    match state.store.snapshot(&id) {
        Some(job) => Ok(Json(JobView::from_job(&job))),
        None => Err((StatusCode::NOT_FOUND, "expired".to_string())),
    }
}
