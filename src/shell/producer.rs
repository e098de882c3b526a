//! Background task that moves child output into the line queue.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

/// Receiving side of the line queue.
pub type LineQueue = mpsc::UnboundedReceiver<String>;

/// Reads a child's output line by line into an unbounded queue.
///
/// The task is detached: it ends on its own when the reader reaches EOF or
/// fails, and dropping the sender closes the queue once it is drained. A read
/// error and a clean EOF look the same to the consumer.
#[derive(Debug)]
pub struct LineProducer;

impl LineProducer {
    /// Start draining `reader` in the background and return the queue.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<R>(reader: R) -> LineQueue
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(Self::run(reader, tx));
        rx
    }

    async fn run<R>(reader: R, tx: mpsc::UnboundedSender<String>)
    where
        R: AsyncRead + Unpin,
    {
        tracing::debug!("Line producer started");
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let mut count: u64 = 0;

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    tracing::trace!(line = %line.trim_end(), "Queued line");
                    if tx.send(line).is_err() {
                        // Consumer is gone.
                        break;
                    }
                    count += 1;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Read failed, ending line producer");
                    break;
                }
            }
        }

        tracing::debug!(lines = count, "Line producer finished");
    }
}
