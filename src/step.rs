/// One parsed line of a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Send the line as-is. Interactive runs write it immediately, non-interactive
    /// runs append it to the input blob.
    Literal(String),

    /// Wait until `prompt` shows up in the program output, then send `remainder`.
    ///
    /// Only valid in interactive mode. `prompt` is never empty.
    WaitThenSend { prompt: String, remainder: String },
}

impl Step {
    /// Create a Literal step from a string
    pub fn literal(text: impl Into<String>) -> Self {
        Step::Literal(text.into())
    }

    /// Create a WaitThenSend step
    pub fn wait_then_send(prompt: impl Into<String>, remainder: impl Into<String>) -> Self {
        Step::WaitThenSend {
            prompt: prompt.into(),
            remainder: remainder.into(),
        }
    }

    /// The line this step eventually writes, without its newline.
    pub fn line(&self) -> &str {
        match self {
            Step::Literal(text) => text,
            Step::WaitThenSend { remainder, .. } => remainder,
        }
    }

    /// The prompt to wait for, if any.
    pub fn prompt(&self) -> Option<&str> {
        match self {
            Step::Literal(_) => None,
            Step::WaitThenSend { prompt, .. } => Some(prompt),
        }
    }

    /// Bytes written to the program for this step: the line plus a newline.
    pub fn payload(&self) -> Vec<u8> {
        let mut bytes = self.line().as_bytes().to_vec();
        bytes.push(b'\n');
        bytes
    }
}
