//! Shell stream tests.

mod stream_test;

use std::time::Duration;

use shellstream::shell::{ShellStream, ShellStreamBuilder};

/// Spawn `sh -c script`.
pub fn sh(script: &str) -> ShellStream {
    ShellStreamBuilder::new("sh")
        .args(["-c", script])
        .spawn()
        .unwrap()
}

/// Poll until the child has exited.
pub async fn wait_for_exit(stream: &mut ShellStream) {
    for _ in 0..500 {
        if !stream.is_running() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("process did not exit in time");
}

/// Verify the public types are exported from the library.
#[tokio::test]
async fn test_all_shell_types_exported() {
    use shellstream::config::{BufferMode, ConfigLoader, StreamConfig};
    use shellstream::shell::{
        after_match, LineProducer, LineQueue, Matcher, ReadLine, StreamError,
    };

    let _ = ConfigLoader::new();
    let _ = StreamConfig::default();
    let _ = BufferMode::Line;
    let _ = Matcher::exact("x");
    let _ = ReadLine::default();
    let _: fn() -> StreamError = || StreamError::StdinClosed;
    let _: fn(tokio::io::DuplexStream) -> LineQueue = LineProducer::spawn;
    let _ = after_match(
        futures_util::stream::empty::<String>(),
        Matcher::exact("x"),
        false,
    );
}
