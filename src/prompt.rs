//! Prompt matching against the not-yet-consumed tail of the output.

use crate::error::Error;
use crate::step::Step;
use regex::bytes::Regex;

/// How the text between the delimiters is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PromptMode {
    /// Contiguous literal substring.
    #[default]
    Literal,
    /// Regular expression (`regex` crate syntax), e.g. `In \[\d+\]: `.
    Regex,
}

/// A compiled expected prompt.
#[derive(Debug, Clone)]
pub(crate) enum Prompt {
    Literal(Vec<u8>),
    Regex(Regex),
}

impl Prompt {
    pub(crate) fn compile(pattern: &str, mode: PromptMode) -> Result<Self, Error> {
        match mode {
            PromptMode::Literal => Ok(Prompt::Literal(pattern.as_bytes().to_vec())),
            PromptMode::Regex => Regex::new(pattern)
                .map(Prompt::Regex)
                .map_err(|e| Error::config(format!("invalid prompt pattern '{pattern}': {e}"))),
        }
    }

    /// Compile the prompt of every step, keeping positions aligned with `steps`.
    pub(crate) fn compile_all(steps: &[Step], mode: PromptMode) -> Result<Vec<Option<Self>>, Error> {
        steps
            .iter()
            .map(|step| step.prompt().map(|p| Self::compile(p, mode)).transpose())
            .collect()
    }

    /// Offset just past the first match in `haystack`.
    ///
    /// Empty regex matches are skipped so one position can never satisfy two
    /// prompts.
    pub(crate) fn match_end(&self, haystack: &[u8]) -> Option<usize> {
        match self {
            Prompt::Literal(needle) if needle.is_empty() => None,
            Prompt::Literal(needle) => haystack
                .windows(needle.len())
                .position(|window| window == needle.as_slice())
                .map(|start| start + needle.len()),
            Prompt::Regex(re) => re
                .find_iter(haystack)
                .find(|m| !m.is_empty())
                .map(|m| m.end()),
        }
    }
}
