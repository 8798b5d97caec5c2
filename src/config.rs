//! Environment configuration with local-development defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::av::pipeline::ProcessConfig;
use crate::av::planner::{PlanConfig, TrailingSilence};
use crate::jobs::scheduler::DEFAULT_CONCURRENT_JOBS;

#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Directory holding the per-job upload and output directories
    pub work_dir: PathBuf,
    /// Seconds from creation until a job and its files are removed
    pub job_ttl_secs: u64,
    /// Maximum number of jobs processing at once
    pub max_concurrent_jobs: usize,
    /// Noise floor for silence analysis, in dBFS
    pub noise_floor_db: f64,
    /// Minimum silence length the analysis reports, in seconds
    pub min_silence_secs: f64,
    /// Seconds kept before speech resumes after a gap
    pub pre_buffer_secs: f64,
    /// Seconds kept after speech ends before a gap
    pub post_buffer_secs: f64,
    /// Audible ranges shorter than this are discarded
    pub min_keep_secs: f64,
    /// Leave trailing silence with no end marker in the output
    pub keep_trailing_silence: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            addr: env::var("ADDR").unwrap_or_else(|_| String::from("127.0.0.1")),
            port: env::var("PORT").unwrap_or_else(|_| String::from("3000")),
            work_dir: PathBuf::from(
                env::var("WORK_DIR").unwrap_or_else(|_| String::from("./jobs")),
            ),
            job_ttl_secs: parsed("JOB_TTL_SECS", 3600),
            max_concurrent_jobs: parsed("MAX_CONCURRENT_JOBS", DEFAULT_CONCURRENT_JOBS),
            noise_floor_db: parsed("NOISE_FLOOR_DB", -35.0),
            min_silence_secs: parsed("MIN_SILENCE_SECS", 0.5),
            pre_buffer_secs: parsed("PRE_BUFFER_SECS", 0.25),
            post_buffer_secs: parsed("POST_BUFFER_SECS", 0.25),
            min_keep_secs: parsed("MIN_KEEP_SECS", 0.2),
            keep_trailing_silence: parsed("KEEP_TRAILING_SILENCE", false),
        }
    }

    /// Analysis and planning settings handed to the processing pipeline.
    pub fn process(&self) -> ProcessConfig {
        ProcessConfig {
            noise_floor_db: self.noise_floor_db,
            min_silence_secs: self.min_silence_secs,
            plan: PlanConfig {
                pre_buffer: self.pre_buffer_secs,
                post_buffer: self.post_buffer_secs,
                min_keep: self.min_keep_secs,
                trailing_silence: if self.keep_trailing_silence {
                    TrailingSilence::Keep
                } else {
                    TrailingSilence::Trim
                },
            },
        }
    }
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
