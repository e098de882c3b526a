//! Tests for reading, writing and filtering a live shell stream.

use std::time::{Duration, Instant};

use futures_util::StreamExt;
use shellstream::config::BufferMode;
use shellstream::shell::{Matcher, ShellStreamBuilder, StreamError};
use tokio_test::{assert_err, assert_ok};

use super::{sh, wait_for_exit};

#[tokio::test]
async fn drain_yields_lines_in_order() {
    let mut stream = sh("i=1; while [ $i -le 200 ]; do echo \"line $i\"; i=$((i+1)); done");

    let lines: Vec<String> = stream.drain().collect().await;

    let expected: Vec<String> = (1..=200).map(|i| format!("line {i}\n")).collect();
    assert_eq!(lines, expected);
}

#[tokio::test]
async fn drain_waits_for_delayed_output() {
    let mut stream = sh("echo first; sleep 0.3; echo second");

    let lines: Vec<String> = stream.drain().collect().await;

    assert_eq!(lines, vec!["first\n", "second\n"]);
}

#[tokio::test]
async fn drain_ends_after_exit_and_queue_empty() {
    let mut stream = sh("echo only");

    let lines: Vec<String> = stream.drain().collect().await;
    assert_eq!(lines, vec!["only\n"]);

    assert!(!stream.is_running());
    assert!(!stream.has_next_line());

    // A fresh drain on an exhausted stream ends immediately.
    let again: Vec<String> = stream.drain().collect().await;
    assert!(again.is_empty());
}

#[tokio::test]
async fn drain_keeps_lines_queued_before_exit() {
    let mut stream = sh("printf 'a\\nb\\nc\\n'");
    wait_for_exit(&mut stream).await;

    let lines: Vec<String> = stream.drain().collect().await;
    assert_eq!(lines, vec!["a\n", "b\n", "c\n"]);
}

#[tokio::test]
async fn drain_ignores_stderr() {
    let mut stream = sh("echo out; echo err >&2; echo more");

    let lines: Vec<String> = stream.drain().collect().await;
    assert_eq!(lines, vec!["out\n", "more\n"]);
}

#[tokio::test]
async fn read_line_zero_timeout_does_not_block() {
    let mut stream = sh("sleep 5");

    let start = Instant::now();
    let read = stream.read_line(Some(Duration::ZERO)).await;

    assert!(read.timed_out);
    assert_eq!(read.line, "");
    assert!(start.elapsed() < Duration::from_millis(200));
    assert!(stream.is_running());
}

#[tokio::test]
async fn read_line_times_out_on_silent_process() {
    let mut stream = sh("sleep 5");

    let read = stream.read_line(Some(Duration::from_millis(50))).await;

    assert!(read.timed_out);
    assert!(read.into_line().is_none());
}

#[tokio::test]
async fn read_line_without_timeout_waits_for_line() {
    let mut stream = sh("sleep 0.1; echo late");

    let read = stream.read_line(None).await;

    assert!(!read.timed_out);
    assert_eq!(read.into_line().as_deref(), Some("late\n"));
}

#[tokio::test]
async fn read_line_without_timeout_returns_when_output_closes() {
    let mut stream = sh("true");

    let read = stream.read_line(None).await;

    assert!(read.timed_out);
}

#[tokio::test]
async fn has_next_line_does_not_consume() {
    let mut stream = sh("echo one; echo two");
    wait_for_exit(&mut stream).await;
    // Give the producer time to move both lines into the queue.
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(stream.has_next_line());
    assert!(stream.has_next_line());
    assert_eq!(stream.read_line(Some(Duration::ZERO)).await.line, "one\n");
    assert_eq!(stream.read_line(Some(Duration::ZERO)).await.line, "two\n");
    assert!(!stream.has_next_line());
}

#[tokio::test]
async fn is_running_is_idempotent() {
    let mut stream = sh("sleep 5");
    assert!(stream.is_running());
    assert!(stream.is_running());
    assert!(stream.exit_status().is_none());

    let mut stream = sh("exit 3");
    wait_for_exit(&mut stream).await;
    assert!(!stream.is_running());
    assert!(!stream.is_running());
    assert_eq!(stream.exit_status().and_then(|s| s.code()), Some(3));
}

#[tokio::test]
async fn write_round_trips_through_cat() {
    let mut stream = ShellStreamBuilder::new("cat").spawn().unwrap();

    assert_ok!(stream.write("hello\n").await);
    let read = stream.read_line(Some(Duration::from_secs(5))).await;

    assert_eq!(read.line, "hello\n");
}

#[tokio::test]
async fn write_lines_then_close_ends_stream() {
    let mut stream = ShellStreamBuilder::new("cat").spawn().unwrap();

    assert_ok!(stream.write_lines(["a\n", "b\n"]).await);
    assert_ok!(stream.write_lines(vec![b"c\n".to_vec()]).await);
    assert_ok!(stream.close_stdin().await);
    assert_ok!(stream.close_stdin().await);

    let lines: Vec<String> = stream.drain().collect().await;
    assert_eq!(lines, vec!["a\n", "b\n", "c\n"]);
}

#[tokio::test]
async fn block_mode_holds_writes_until_flush() {
    let mut stream = ShellStreamBuilder::new("cat")
        .buffer_mode(BufferMode::Block)
        .spawn()
        .unwrap();

    assert_ok!(stream.write("held\n").await);
    let read = stream.read_line(Some(Duration::from_millis(200))).await;
    assert!(read.timed_out);

    assert_ok!(stream.flush().await);
    let read = stream.read_line(Some(Duration::from_secs(5))).await;
    assert_eq!(read.line, "held\n");
}

#[tokio::test]
async fn line_mode_waits_for_newline() {
    let mut stream = ShellStreamBuilder::new("cat").spawn().unwrap();

    assert_ok!(stream.write("par").await);
    assert!(stream.read_line(Some(Duration::from_millis(200))).await.timed_out);

    assert_ok!(stream.write("tial\n").await);
    let read = stream.read_line(Some(Duration::from_secs(5))).await;
    assert_eq!(read.line, "partial\n");
}

#[tokio::test]
async fn write_after_exit_fails() {
    let mut stream = sh("true");
    wait_for_exit(&mut stream).await;

    let err = assert_err!(stream.write("too late\n").await);
    assert!(matches!(err, StreamError::ProcessExited));
}

#[tokio::test]
async fn write_after_close_fails() {
    let mut stream = ShellStreamBuilder::new("cat").spawn().unwrap();
    assert_ok!(stream.close_stdin().await);

    // cat may still be running; either way the write must fail.
    let err = assert_err!(stream.write("x\n").await);
    assert!(matches!(
        err,
        StreamError::StdinClosed | StreamError::ProcessExited
    ));
    assert!(matches!(
        stream.flush().await,
        Err(StreamError::StdinClosed)
    ));
}

#[tokio::test]
async fn filter_excludes_match() {
    let mut stream = sh("printf 'a\\nMATCH\\nb\\nc\\n'");

    let lines: Vec<String> = stream
        .filter_after_match(Matcher::exact("MATCH"), false)
        .collect()
        .await;

    assert_eq!(lines, vec!["b\n", "c\n"]);
}

#[tokio::test]
async fn filter_includes_match() {
    let mut stream = sh("printf 'a\\nMATCH\\nb\\nc\\n'");

    let lines: Vec<String> = stream.filter_after_match("MATCH", true).collect().await;

    assert_eq!(lines, vec!["MATCH\n", "b\n", "c\n"]);
}

#[tokio::test]
async fn filter_without_match_yields_nothing() {
    let mut stream = sh("printf 'a\\nb\\nc\\n'");

    let lines: Vec<String> = stream.filter_after_match("MATCH", true).collect().await;

    assert!(lines.is_empty());
    assert!(!stream.has_next_line());
}

#[tokio::test]
async fn filter_restarts_per_call() {
    let mut stream = sh("printf 'x\\nGO\\n1\\n'; sleep 0.3; printf 'y\\nGO\\n2\\n'");

    let first: Vec<String> = stream
        .filter_after_match("GO", false)
        .take(1)
        .collect()
        .await;
    assert_eq!(first, vec!["1\n"]);

    // A new call seeks again from the next unread line.
    let second: Vec<String> = stream.filter_after_match("GO", false).collect().await;
    assert_eq!(second, vec!["2\n"]);
}

#[tokio::test]
async fn invalid_pattern_fails_before_consuming() {
    let mut stream = sh("echo keep");

    let result = stream.filter_after_pattern("(unclosed", true);
    assert!(matches!(result, Err(StreamError::InvalidMatcher { .. })));
    drop(result);

    let read = stream.read_line(Some(Duration::from_secs(5))).await;
    assert_eq!(read.line, "keep\n");
}

#[tokio::test]
async fn filter_then_reply_mid_stream() {
    let mut stream = sh("echo boot; echo 'Two lines follow'; echo first; read r; echo \"got $r\"");

    let head: Vec<String> = assert_ok!(stream.filter_after_pattern(r"Two lines.*", true))
        .take(2)
        .collect()
        .await;
    assert_eq!(head, vec!["Two lines follow\n", "first\n"]);

    assert_ok!(stream.write_lines(["Test input\n"]).await);

    let rest: Vec<String> = stream.drain().collect().await;
    assert_eq!(rest, vec!["got Test input\n"]);
}
