use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::http::upload::file_name_is_safe;
use crate::http::AppState;

/// Stream one finished output file. Only names the job actually produced
/// are served, so nothing outside the job's output directory is reachable.
pub async fn download_file(
    State(state): State<AppState>,
    Path((id, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if !file_name_is_safe(&name) {
        return Err((StatusCode::BAD_REQUEST, "invalid file name".to_string()));
    }

    let job = state
        .store
        .snapshot(&id)
        .ok_or((StatusCode::NOT_FOUND, "expired".to_string()))?;

    let known = job
        .files
        .iter()
        .any(|file| file.output_name.as_deref() == Some(name.as_str()));
    if !known {
        return Err((StatusCode::NOT_FOUND, "file not found".to_string()));
    }

    let path = job.output_dir.join(&name);
    let file = File::open(&path)
        .await
        .map_err(|_| (StatusCode::NOT_FOUND, "file not found".to_string()))?;

    let headers = [
        (
            header::CONTENT_TYPE,
            "application/octet-stream".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", name),
        ),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))))
}
