//! Line matchers and the skip-until-match filter.
//!
//! A [`Matcher`] is either an exact string or a regex anchored at the start of
//! the line. [`after_match`] drops every line until the matcher first holds,
//! then passes everything through.

use std::fmt;

use futures_core::Stream;
use futures_util::StreamExt;
use regex::Regex;

use super::StreamError;

/// Condition tested against each line of child output.
///
/// Lines are compared without their trailing `\n` or `\r\n`.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// The whole line must equal this string.
    Exact(String),
    /// The regex must match starting at the first byte of the line.
    Pattern(Regex),
}

impl Matcher {
    /// Create a matcher that requires the line to equal `text`.
    #[must_use]
    pub fn exact(text: impl Into<String>) -> Self {
        Self::Exact(text.into())
    }

    /// Compile `pattern` into a start-anchored matcher.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::InvalidMatcher` if the pattern does not compile.
    pub fn pattern(pattern: &str) -> Result<Self, StreamError> {
        Regex::new(pattern)
            .map(Self::Pattern)
            .map_err(|source| StreamError::InvalidMatcher {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Test a line of output against this matcher.
    #[must_use]
    pub fn is_match(&self, line: &str) -> bool {
        let content = strip_line_ending(line);
        match self {
            Self::Exact(text) => content == text,
            // Leftmost-first search finds a match at 0 whenever one exists.
            Self::Pattern(re) => re.find(content).is_some_and(|m| m.start() == 0),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(text) => write!(f, "exact {text:?}"),
            Self::Pattern(re) => write!(f, "pattern /{}/", re.as_str()),
        }
    }
}

impl From<Regex> for Matcher {
    fn from(re: Regex) -> Self {
        Self::Pattern(re)
    }
}

impl From<&str> for Matcher {
    fn from(text: &str) -> Self {
        Self::exact(text)
    }
}

impl From<String> for Matcher {
    fn from(text: String) -> Self {
        Self::Exact(text)
    }
}

fn strip_line_ending(line: &str) -> &str {
    match line.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => line,
    }
}

/// Progress of a single [`after_match`] filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchState {
    /// No match yet; lines are discarded.
    Seeking,
    /// A match was seen; every line is yielded.
    Emitting,
}

/// Skip lines until `matcher` first holds, then yield every following line.
///
/// The matching line itself is yielded only when `include_match` is set.
/// Once emitting, later lines are yielded whether they match or not. If no
/// line ever matches the stream ends empty when `lines` ends.
pub fn after_match<S>(
    lines: S,
    matcher: Matcher,
    include_match: bool,
) -> impl Stream<Item = String>
where
    S: Stream<Item = String>,
{
    let state = (Box::pin(lines), matcher, MatchState::Seeking);

    futures_util::stream::unfold(state, move |(mut lines, matcher, mut state)| async move {
        while let Some(line) = lines.next().await {
            match state {
                MatchState::Emitting => return Some((line, (lines, matcher, state))),
                MatchState::Seeking if matcher.is_match(&line) => {
                    tracing::trace!(matcher = %matcher, "Matcher hit, emitting lines");
                    state = MatchState::Emitting;
                    if include_match {
                        return Some((line, (lines, matcher, state)));
                    }
                }
                MatchState::Seeking => {}
            }
        }
        None
    })
}
