//! Shell stream error types.

/// Errors that can occur while spawning, writing to, or filtering a shell stream.
#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    /// The program was not found.
    #[error("Program not found: {0}")]
    NotFound(String),

    /// Permission denied when spawning.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Other I/O error while spawning.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The child exited before a write.
    #[error("Process has exited")]
    ProcessExited,

    /// The child's stdin was closed or never piped.
    #[error("Process stdin is closed")]
    StdinClosed,

    /// Writing or flushing the child's stdin failed.
    #[error("Failed to write to process stdin: {0}")]
    Write(#[source] std::io::Error),

    /// The child was spawned without a piped stdout.
    #[error("Process stdout not available")]
    NoStdout,

    /// A pattern matcher failed to compile.
    #[error("Invalid matcher pattern {pattern:?}: {source}")]
    InvalidMatcher {
        pattern: String,
        source: regex::Error,
    },
}

impl StreamError {
    /// Create a `StreamError` from a spawn failure, classifying common cases.
    pub(crate) fn from_spawn(program: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(program.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(program.to_string()),
            _ => Self::Io(err),
        }
    }
}
