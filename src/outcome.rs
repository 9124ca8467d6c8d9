use crate::recorder::RunResult;
use std::fmt;
use std::io;

/// How a session ended once the child had been started.
///
/// Every variant carries a [`RunResult`]; for the unsuccessful ones it holds
/// everything read up to the point where the session gave up, and the child
/// has been killed.
#[derive(Debug)]
pub enum Outcome {
    /// The program reached end-of-output and exited. Its exit code is passed
    /// through verbatim, non-zero included.
    Completed(RunResult),

    /// A prompt wait, an input write or the final drain exceeded its bound, or
    /// the program went away while a prompt was still expected.
    ///
    /// `step` is the index of the step that stalled; a stalled final drain
    /// reports the number of steps.
    TimedOut {
        result: RunResult,
        step: usize,
        stall: Stall,
    },

    /// Reading or writing the child's streams failed mid-session.
    Failed { result: RunResult, error: io::Error },
}

/// Why a session stalled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stall {
    /// The program kept running but never printed the prompt.
    PromptNeverAppeared { prompt: String },
    /// The program closed its output while a prompt was still expected.
    ProcessExited,
    /// Output did not end within the drain bound after the last step.
    DrainExceeded,
    /// The program stopped reading its input and a write could not complete.
    InputBlocked,
}

impl Outcome {
    pub fn result(&self) -> &RunResult {
        match self {
            Outcome::Completed(result)
            | Outcome::TimedOut { result, .. }
            | Outcome::Failed { result, .. } => result,
        }
    }

    pub fn into_result(self) -> RunResult {
        match self {
            Outcome::Completed(result)
            | Outcome::TimedOut { result, .. }
            | Outcome::Failed { result, .. } => result,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }
}

impl fmt::Display for Stall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stall::PromptNeverAppeared { prompt } => {
                write!(f, "timed out waiting for prompt '{prompt}'")
            }
            Stall::ProcessExited => write!(f, "program exited while a prompt was expected"),
            Stall::DrainExceeded => write!(f, "program output did not end in time"),
            Stall::InputBlocked => write!(f, "program stopped reading its input"),
        }
    }
}
