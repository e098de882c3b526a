//! Consumer side of a shell stream.
//!
//! [`ShellStream`] owns the child process, its stdin, and the queue filled by
//! the [`LineProducer`]. Reads come from the queue, writes go straight to the
//! child's stdin.

use std::time::Duration;

use futures_core::Stream;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::process::{Child, ChildStdin};
use tokio::sync::mpsc::error::TryRecvError;

use super::matcher::{after_match, Matcher};
use super::producer::{LineProducer, LineQueue};
use super::StreamError;
use crate::config::{BufferMode, StreamConfig};

/// Outcome of a single [`ShellStream::read_line`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadLine {
    /// The line read, including its newline. Empty on timeout.
    pub line: String,
    /// Set when no line arrived within the timeout.
    pub timed_out: bool,
}

impl ReadLine {
    fn received(line: String) -> Self {
        Self {
            line,
            timed_out: false,
        }
    }

    fn empty() -> Self {
        Self {
            line: String::new(),
            timed_out: true,
        }
    }

    /// The line, or `None` if the read timed out.
    #[must_use]
    pub fn into_line(self) -> Option<String> {
        (!self.timed_out).then_some(self.line)
    }
}

/// A running child process with a line-oriented view of its stdout.
///
/// The stream is exhausted once the child has exited and every queued line
/// has been read; exit alone never ends it.
#[derive(Debug)]
pub struct ShellStream {
    child: Child,
    stdin: Option<BufWriter<ChildStdin>>,
    queue: LineQueue,
    buffer_mode: BufferMode,
    poll_interval: Duration,
    exit_grace: Duration,
}

impl ShellStream {
    /// Wrap an already spawned child.
    ///
    /// Takes the child's stdout and starts the background line producer.
    /// Stdin is optional; without it every write fails with `StdinClosed`.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::NoStdout` if stdout was not piped.
    pub fn new(mut child: Child, config: &StreamConfig) -> Result<Self, StreamError> {
        let stdout = child.stdout.take().ok_or(StreamError::NoStdout)?;
        let queue = LineProducer::spawn(stdout);
        let stdin = child.stdin.take().map(BufWriter::new);

        Ok(Self {
            child,
            stdin,
            queue,
            buffer_mode: config.buffer_mode,
            poll_interval: config.poll_interval(),
            exit_grace: config.exit_grace(),
        })
    }

    /// Get the process ID, if still running.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Check whether the child is still running, without blocking.
    ///
    /// A status that cannot be queried is reported as not running.
    pub fn is_running(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(_)) => false,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to query process status");
                false
            }
        }
    }

    /// The exit status, once the child has exited.
    pub fn exit_status(&mut self) -> Option<std::process::ExitStatus> {
        self.child.try_wait().ok().flatten()
    }

    /// Write raw data to the child's stdin.
    ///
    /// Flushing follows the configured [`BufferMode`]. This may wait if the
    /// pipe is full.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::ProcessExited` if the child has exited,
    /// `StreamError::StdinClosed` if stdin was closed, or
    /// `StreamError::Write` if the pipe rejects the data.
    pub async fn write(&mut self, data: impl AsRef<[u8]>) -> Result<(), StreamError> {
        self.write_lines([data]).await
    }

    /// Write each item to the child's stdin, in order.
    ///
    /// No separators are added; include newlines in the items.
    ///
    /// # Errors
    ///
    /// Same as [`ShellStream::write`].
    pub async fn write_lines<I, T>(&mut self, lines: I) -> Result<(), StreamError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        if !self.is_running() {
            return Err(StreamError::ProcessExited);
        }
        let stdin = self.stdin.as_mut().ok_or(StreamError::StdinClosed)?;

        let mut needs_flush = false;
        for line in lines {
            let data = line.as_ref();
            stdin.write_all(data).await.map_err(StreamError::Write)?;
            needs_flush |= self.buffer_mode.flushes_after(data);
        }

        if needs_flush {
            stdin.flush().await.map_err(StreamError::Write)?;
        }
        Ok(())
    }

    /// Flush buffered stdin data to the child.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::StdinClosed` if stdin was closed, or
    /// `StreamError::Write` if the flush fails.
    pub async fn flush(&mut self) -> Result<(), StreamError> {
        let stdin = self.stdin.as_mut().ok_or(StreamError::StdinClosed)?;
        stdin.flush().await.map_err(StreamError::Write)
    }

    /// Flush and close the child's stdin so it observes EOF.
    ///
    /// Closing an already closed stdin is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Write` if the final flush fails. Stdin is closed
    /// either way.
    pub async fn close_stdin(&mut self) -> Result<(), StreamError> {
        let Some(mut stdin) = self.stdin.take() else {
            return Ok(());
        };
        tracing::debug!(pid = ?self.id(), "Closing process stdin");
        stdin.shutdown().await.map_err(StreamError::Write)
    }

    /// Read one line, waiting at most `timeout`.
    ///
    /// `Some(Duration::ZERO)` polls without waiting; `None` waits until a line
    /// arrives or the producer has finished. A read that yields no line is
    /// reported with `timed_out` set, including when the output is closed.
    pub async fn read_line(&mut self, timeout: Option<Duration>) -> ReadLine {
        let received = match timeout {
            None => self.queue.recv().await,
            Some(t) if t.is_zero() => self.queue.try_recv().ok(),
            Some(t) => tokio::time::timeout(t, self.queue.recv())
                .await
                .ok()
                .flatten(),
        };
        received.map_or_else(ReadLine::empty, ReadLine::received)
    }

    /// Check for at least one queued line without consuming it.
    #[must_use]
    pub fn has_next_line(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Yield every line until the child has exited and the queue is empty.
    ///
    /// Each call returns a fresh single-pass stream over whatever has not
    /// been read yet.
    pub fn drain(&mut self) -> impl Stream<Item = String> + '_ {
        futures_util::stream::unfold(self, |this| async move {
            let line = this.next_drained_line().await?;
            Some((line, this))
        })
    }

    /// Drop lines until `matcher` holds, then yield the rest of the drain.
    ///
    /// The matching line is included only if `include_match` is set.
    pub fn filter_after_match(
        &mut self,
        matcher: impl Into<Matcher>,
        include_match: bool,
    ) -> impl Stream<Item = String> + '_ {
        after_match(self.drain(), matcher.into(), include_match)
    }

    /// Like [`ShellStream::filter_after_match`] with a regex pattern.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::InvalidMatcher` before any line is consumed if
    /// the pattern does not compile.
    pub fn filter_after_pattern(
        &mut self,
        pattern: &str,
        include_match: bool,
    ) -> Result<impl Stream<Item = String> + '_, StreamError> {
        let matcher = Matcher::pattern(pattern)?;
        Ok(self.filter_after_match(matcher, include_match))
    }

    async fn next_drained_line(&mut self) -> Option<String> {
        loop {
            match self.queue.try_recv() {
                Ok(line) => return Some(line),
                Err(TryRecvError::Disconnected) => {
                    if !self.is_running() {
                        return None;
                    }
                    // Stdout closed but the child lives on.
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(TryRecvError::Empty) => {
                    if !self.is_running() {
                        // Output may still be in the pipe after exit.
                        return tokio::time::timeout(self.exit_grace, self.queue.recv())
                            .await
                            .ok()
                            .flatten();
                    }
                    if let Ok(Some(line)) =
                        tokio::time::timeout(self.poll_interval, self.queue.recv()).await
                    {
                        return Some(line);
                    }
                }
            }
        }
    }
}
