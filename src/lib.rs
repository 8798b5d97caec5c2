//! Jumpcut - silence removal for uploaded audio/video
//!
//! - av/: media analysis and encoding through the external ffmpeg/ffprobe
//!   binaries (silence detection, keep-segment planning, filter graphs)
//! - jobs/: in-memory job lifecycle, bounded-concurrency scheduler, TTL expiry
//! - http/: upload, status and download handlers
//! - config: environment configuration

pub mod av;
pub mod config;
pub mod http;
pub mod jobs;
