use std::io;
use std::process::{Output, Stdio};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::warn;

use crate::av::{AvError, AvResult};

/// Gateway to the external media binaries. Analysis and encode logic only
/// ever sees argument lists and captured output, so it can be exercised
/// against canned traces in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaRunner: Send + Sync {
    async fn run_ffmpeg(&self, args: &[String]) -> io::Result<Output>;
    async fn run_ffprobe(&self, args: &[String]) -> io::Result<Output>;
}

/// Spawns the real binaries from PATH.
pub struct CliRunner;

#[async_trait]
impl MediaRunner for CliRunner {
    async fn run_ffmpeg(&self, args: &[String]) -> io::Result<Output> {
        Command::new("ffmpeg")
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
    }

    async fn run_ffprobe(&self, args: &[String]) -> io::Result<Output> {
        Command::new("ffprobe")
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
    }
}

/// Map a non-zero exit into a tool error carrying the tail of stderr.
pub fn expect_success(tool: &'static str, output: &Output) -> AvResult<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(AvError::tool(
        tool,
        format!(
            "exit status {}: {}",
            output.status,
            stderr.lines().last().unwrap_or("no output")
        ),
    ))
}

/// Report missing binaries at startup instead of failing the first job.
pub fn check_tools() {
    for tool in ["ffmpeg", "ffprobe"] {
        if which::which(tool).is_err() {
            warn!("{} not found in PATH, processing will fail", tool);
        }
    }
}
