//! Shell stream: spawn a child process and consume its stdout line by line.

mod error;
mod launcher;
mod matcher;
mod producer;
mod stream;

pub use error::StreamError;
pub use launcher::ShellStreamBuilder;
pub use matcher::{after_match, Matcher};
pub use producer::{LineProducer, LineQueue};
pub use stream::{ReadLine, ShellStream};
