//! Configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How writes to the child's stdin are flushed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BufferMode {
    /// Flush whenever the written data contains a newline.
    #[default]
    Line,
    /// Flush after every write.
    Unbuffered,
    /// Flush only on explicit request or when the buffer fills.
    Block,
}

impl BufferMode {
    /// Whether a write of `data` should be followed by a flush.
    #[must_use]
    pub fn flushes_after(self, data: &[u8]) -> bool {
        match self {
            Self::Line => data.contains(&b'\n'),
            Self::Unbuffered => true,
            Self::Block => false,
        }
    }
}

/// Settings for a spawned shell stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StreamConfig {
    /// Stdin flushing discipline.
    pub buffer_mode: BufferMode,
    /// How long a drain waits for a line before re-checking liveness.
    pub poll_interval_ms: u64,
    /// How long a drain keeps waiting for in-flight output after the child exits.
    pub exit_grace_ms: u64,
}

impl StreamConfig {
    /// Poll interval as a `Duration`.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Exit grace period as a `Duration`.
    #[must_use]
    pub fn exit_grace(&self) -> Duration {
        Duration::from_millis(self.exit_grace_ms)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_mode: BufferMode::Line,
            poll_interval_ms: 10,
            exit_grace_ms: 100,
        }
    }
}
