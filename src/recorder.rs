//! Transcript recording and the final [`RunResult`].

use std::borrow::Cow;
use std::time::Duration;

/// What the program printed, decoded as text when possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Captured {
    Text(String),
    /// The output was not valid UTF-8; kept verbatim.
    Bytes(Vec<u8>),
}

impl Captured {
    fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Captured::Text(text),
            Err(e) => Captured::Bytes(e.into_bytes()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Captured::Text(text) => text.as_bytes(),
            Captured::Bytes(bytes) => bytes,
        }
    }
}

/// The record produced by a finished session.
///
/// In interactive mode the capture includes the terminal's echo of every line
/// that was sent: a `cat` session fed `a thing` records `a thing\r\na thing\r\n`.
/// Strip echo in presentation if it is unwanted; it is never removed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    captured: Captured,
    exit_code: i32,
    duration: Duration,
}

impl RunResult {
    pub fn captured(&self) -> &Captured {
        &self.captured
    }

    /// Captured output as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> Cow<'_, str> {
        match &self.captured {
            Captured::Text(text) => Cow::Borrowed(text),
            Captured::Bytes(bytes) => String::from_utf8_lossy(bytes),
        }
    }

    /// Text as a notebook cell would show it: terminal line endings folded to
    /// `\n`, trailing whitespace dropped.
    pub fn display_text(&self) -> String {
        self.text().replace("\r\n", "\n").trim_end().to_string()
    }

    /// The child's exit code, passed through verbatim. A non-zero code is a
    /// normal result, not a failure.
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Accumulates everything read from the child, in arrival order, unfiltered.
#[derive(Debug, Default)]
pub struct Recorder {
    bytes: Vec<u8>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn finalize(self, exit_code: i32, duration: Duration) -> RunResult {
        RunResult {
            captured: Captured::from_bytes(self.bytes),
            exit_code,
            duration,
        }
    }
}
