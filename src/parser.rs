//! Transcript parser.
//!
//! The top-level entry points are [`parse_str`] and [`parse_file`].

use crate::delimiters::Delimiters;
use crate::step::Step;
use anyhow::{Context as _, Result, anyhow};
use std::path::Path;
use std::time::Duration;

/// Parse a transcript into the ordered list of [`Step`]s it describes.
///
/// Parsing is total: any text yields a step list, and a line that is not a
/// well-formed prompt line is sent as-is. Indentation shared by every line is
/// removed first, so a transcript embedded in indented source text reads the
/// same as a flush-left one, and blank lines at either end are ignored.
///
/// A line that starts with the open delimiter and contains the close delimiter
/// after it becomes [`Step::WaitThenSend`]: the text between the markers is the
/// prompt, the rest of the line is what gets sent. Matching is literal and the
/// first close marker wins. An empty prompt is not a prompt line.
///
/// # Example
///
/// ```
/// use promptty::{Delimiters, Step, parse_str};
///
/// let steps = parse_str("[>>> ]print(1)\n2+2\n", &"[]".parse::<Delimiters>().unwrap());
/// assert_eq!(steps, vec![
///     Step::wait_then_send(">>> ", "print(1)"),
///     Step::literal("2+2"),
/// ]);
/// ```
pub fn parse_str(content: &str, delimiters: &Delimiters) -> Vec<Step> {
    dedent(content)
        .into_iter()
        .map(|line| parse_line(line, delimiters))
        .collect()
}

/// Read a transcript from a file and parse it with [`parse_str`].
///
/// # Errors
///
/// Returns an error if the file cannot be read as UTF-8 text.
pub fn parse_file(path: impl AsRef<Path>, delimiters: &Delimiters) -> Result<Vec<Step>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript file: {}", path.display()))?;
    Ok(parse_str(&content, delimiters))
}

fn parse_line(line: &str, delimiters: &Delimiters) -> Step {
    if let Some(rest) = line.strip_prefix(delimiters.open()) {
        if let Some((prompt, remainder)) = rest.split_once(delimiters.close()) {
            if !prompt.is_empty() {
                return Step::wait_then_send(prompt, remainder);
            }
        }
    }
    Step::literal(line)
}

/// Split into lines, strip the common leading whitespace and trim blank lines
/// from both ends. Whitespace-only lines inside the block become empty lines
/// and do not count towards the common indentation.
fn dedent(content: &str) -> Vec<&str> {
    let lines: Vec<&str> = content.lines().collect();
    let is_blank = |line: &&str| line.trim().is_empty();

    let Some(first) = lines.iter().position(|l| !is_blank(l)) else {
        return Vec::new();
    };
    let last = lines.iter().rposition(|l| !is_blank(l)).unwrap_or(first);
    let lines = &lines[first..=last];

    let margin = lines
        .iter()
        .filter(|l| !is_blank(l))
        .map(|l| &l[..l.len() - l.trim_start().len()])
        .reduce(common_prefix)
        .unwrap_or("");

    lines
        .iter()
        .map(|l| if is_blank(l) { "" } else { &l[margin.len()..] })
        .collect()
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map(|((i, _), _)| i)
        .unwrap_or_else(|| a.len().min(b.len()));
    &a[..len]
}

/// Parse a duration string: `1s`, `500ms`, `1.5s`.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if let Some(ms_str) = s.strip_suffix("ms") {
        let ms: u64 = ms_str
            .trim()
            .parse()
            .context("Invalid milliseconds value")?;
        Ok(Duration::from_millis(ms))
    } else if let Some(s_str) = s.strip_suffix('s') {
        let secs: f64 = s_str.trim().parse().context("Invalid seconds value")?;
        Duration::try_from_secs_f64(secs).context("Invalid seconds value")
    } else {
        Err(anyhow!("Duration must end with 's' or 'ms', got: {}", s))
    }
}
