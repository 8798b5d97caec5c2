use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, Redirect},
    BoxError,
};
use futures::{Stream, TryStreamExt};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::{fs::File, io::BufWriter};
use tokio_util::io::StreamReader;
use tracing::info;
use uuid::Uuid;

use crate::http::AppState;
use crate::jobs::{FileTask, Job};

/// Upper bound on files accepted in one upload batch.
pub const MAX_FILES_PER_JOB: usize = 10;

/// Accept a multipart upload, stream each file to the job's upload
/// directory, and submit the job for processing.
pub async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, (StatusCode, String)> {
    let job_id = Uuid::new_v4().to_string();
    let root_dir = state.config.work_dir.join(&job_id);
    let upload_dir = root_dir.join("uploads");
    let output_dir = root_dir.join("out");

    for dir in [&upload_dir, &output_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    }

    let mut files: Vec<FileTask> = Vec::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        // fields without a filename are not uploads
        let file_name = match field.file_name() {
            Some(name) => name.to_owned(),
            None => continue,
        };

        if files.len() >= MAX_FILES_PER_JOB {
            return Err(reject(
                &root_dir,
                StatusCode::BAD_REQUEST,
                format!("at most {} files per upload", MAX_FILES_PER_JOB),
            )
            .await);
        }
        if !file_name_is_safe(&file_name) {
            return Err(reject(
                &root_dir,
                StatusCode::BAD_REQUEST,
                format!("invalid file name: {}", file_name),
            )
            .await);
        }

        let path = upload_dir.join(&file_name);
        info!(job = %job_id, file = %file_name, "saving upload");
        if let Err(e) = stream_to_file(&path, field).await {
            let _ = tokio::fs::remove_dir_all(&root_dir).await;
            return Err(e);
        }
        files.push(FileTask::new(file_name, path));
    }

    if files.is_empty() {
        return Err(reject(
            &root_dir,
            StatusCode::BAD_REQUEST,
            "no files uploaded".to_string(),
        )
        .await);
    }

    let job = Job::new(job_id.clone(), root_dir, upload_dir, output_dir, files);
    state.store.insert(job);
    state
        .store
        .schedule_expiry(job_id.clone(), Duration::from_secs(state.config.job_ttl_secs));
    state.scheduler.submit(&job_id);

    Ok(Redirect::to(&format!("/jobs/{}", job_id)))
}

async fn reject(root_dir: &Path, code: StatusCode, message: String) -> (StatusCode, String) {
    let _ = tokio::fs::remove_dir_all(root_dir).await;
    (code, message)
}

// Save a `Stream` to a file
async fn stream_to_file<S, E>(path: &PathBuf, stream: S) -> Result<(), (StatusCode, String)>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
{
    async {
        let body_with_io_error = stream.map_err(|err| io::Error::new(io::ErrorKind::Other, err));
        let body_reader = StreamReader::new(body_with_io_error);
        futures::pin_mut!(body_reader);

        let mut file = BufWriter::new(File::create(path).await?);
        tokio::io::copy(&mut body_reader, &mut file).await?;

        Ok::<_, io::Error>(())
    }
    .await
    .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
}

/// A stored name must be a single normal path component - no separators,
/// no parent references.
pub fn file_name_is_safe(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

pub async fn index() -> Html<&'static str> {
    Html(
        r#"
        <!doctype html>
        <html>
            <head>
                <title>Cut the silence</title>
            </head>
            <body>
                <h1>Upload audio or video files</h1>
                <p>Silent gaps are removed and the trimmed files offered for download.</p>
                <form action="/upload" method="post" enctype="multipart/form-data">
                    <div>
                        <label>
                            Files:
                            <input type="file" name="file" multiple>
                        </label>
                    </div>
                    <div>
                        <input type="submit" value="Upload">
                    </div>
                </form>
            </body>
        </html>
        "#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;
    use std::fs;
    use tempfile::tempdir;
    use tokio;

    #[tokio::test]
    async fn test_stream_to_file() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("test_file.txt");

        type E = std::io::Error;

        let test_data = "Hello, world!";
        let mock_stream = stream::iter(vec![Ok::<bytes::Bytes, E>(Bytes::from(test_data))]);

        let result = stream_to_file(&file_path, mock_stream).await;
        assert!(result.is_ok());

        let file_contents = fs::read_to_string(file_path).unwrap();
        assert_eq!(file_contents, test_data);
    }

    #[tokio::test]
    async fn test_stream_to_file_error() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("test_file.txt");

        let mock_stream = stream::iter(vec![Err("Test error")]);

        let result = stream_to_file(&file_path, mock_stream).await;
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err(),
            (StatusCode::INTERNAL_SERVER_ERROR, "Test error".to_string())
        );
    }

    #[test]
    fn test_plain_file_name_is_safe() {
        assert!(file_name_is_safe("video.mp4"));
        assert!(file_name_is_safe("with spaces.wav"));
    }

    #[test]
    fn test_parent_reference_is_rejected() {
        assert!(!file_name_is_safe("../escape.mp4"));
        assert!(!file_name_is_safe(".."));
    }

    #[test]
    fn test_nested_path_is_rejected() {
        assert!(!file_name_is_safe("dir/file.mp4"));
        assert!(!file_name_is_safe("/etc/passwd"));
    }

    #[test]
    fn test_empty_name_is_rejected() {
        assert!(!file_name_is_safe(""));
    }
}
