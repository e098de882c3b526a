//! Child process spawning for shell streams.
//!
//! This module provides a builder for configuring the program, arguments and
//! environment of a child process, and spawns it with all three standard
//! streams piped.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::{ShellStream, StreamError};
use crate::config::{BufferMode, StreamConfig};

/// Builder for configuring and spawning a [`ShellStream`].
#[derive(Debug, Clone, Default)]
pub struct ShellStreamBuilder {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    working_dir: Option<PathBuf>,
    config: StreamConfig,
}

impl ShellStreamBuilder {
    /// Create a new builder for the given program.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Append a single argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Set the working directory for the child.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Replace all stream settings with a loaded configuration.
    #[must_use]
    pub fn config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the stdin flushing discipline.
    #[must_use]
    pub fn buffer_mode(mut self, mode: BufferMode) -> Self {
        self.config.buffer_mode = mode;
        self
    }

    /// Set how long a drain waits per liveness check.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval_ms = duration_millis(interval);
        self
    }

    /// Set how long a drain waits for trailing output after exit.
    #[must_use]
    pub fn exit_grace(mut self, grace: Duration) -> Self {
        self.config.exit_grace_ms = duration_millis(grace);
        self
    }

    /// Get the program.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Get the arguments.
    #[must_use]
    pub fn build_args(&self) -> &[String] {
        &self.args
    }

    /// Get the working directory, if set.
    #[must_use]
    pub fn get_working_dir(&self) -> Option<&PathBuf> {
        self.working_dir.as_ref()
    }

    /// Get the stream settings.
    #[must_use]
    pub fn get_config(&self) -> &StreamConfig {
        &self.config
    }

    /// Spawn the child and start streaming its stdout.
    ///
    /// Stdin, stdout and stderr are piped; stderr is never read. The child
    /// is killed if the returned stream is dropped while it is running.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `StreamError` if the process fails to spawn.
    pub fn spawn(&self) -> Result<ShellStream, StreamError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd
            .spawn()
            .map_err(|e| StreamError::from_spawn(&self.program, e))?;

        tracing::debug!(
            program = %self.program,
            args = ?self.args,
            pid = ?child.id(),
            buffer_mode = ?self.config.buffer_mode,
            "Spawned child process"
        );

        ShellStream::new(child, &self.config)
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
