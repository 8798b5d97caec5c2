use thiserror::Error;

pub type AvResult<T> = Result<T, AvError>;

/// Errors from analyzing or encoding a media file.
#[derive(Debug, Error)]
pub enum AvError {
    /// The external tool could not be started or exited non-zero.
    #[error("{tool} failed: {detail}")]
    ToolInvocation { tool: &'static str, detail: String },

    /// Expected markers were absent or malformed in the tool's output.
    #[error("unparsable tool output: {0}")]
    TraceParse(String),

    /// Planning kept nothing; the file has no detectable speech.
    #[error("no audible content left to keep")]
    EmptyResult,

    /// I/O failure reading input or writing output, including a job
    /// expiring out from under an in-flight file.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl AvError {
    pub fn tool(tool: &'static str, detail: impl Into<String>) -> Self {
        Self::ToolInvocation {
            tool,
            detail: detail.into(),
        }
    }
}
