use crate::prompt::PromptMode;
use std::time::Duration;

/// Rows and columns of the pseudo-terminal given to interactive programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub rows: u16,
    pub cols: u16,
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

/// Knobs for a single run. The defaults suit line-oriented REPLs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Upper bound for each prompt wait (default 5s).
    pub prompt_timeout: Duration,
    /// Upper bound for draining output and reaping the child after the last
    /// step (default 10s). End-of-stream normally ends the drain first.
    pub drain_timeout: Duration,
    pub terminal_size: TerminalSize,
    pub prompt_mode: PromptMode,
    /// Send the terminal's end-of-file character (Ctrl-D) after the last
    /// interactive step, mirroring the closed stdin of a non-interactive run.
    pub send_eof: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            prompt_timeout: Duration::from_secs(5),
            drain_timeout: Duration::from_secs(10),
            terminal_size: TerminalSize::default(),
            prompt_mode: PromptMode::Literal,
            send_eof: true,
        }
    }
}

impl RunOptions {
    pub fn with_prompt_timeout(mut self, timeout: Duration) -> Self {
        self.prompt_timeout = timeout;
        self
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    pub fn with_terminal_size(mut self, rows: u16, cols: u16) -> Self {
        self.terminal_size = TerminalSize {
            rows: rows.max(1),
            cols: cols.max(1),
        };
        self
    }

    pub fn with_prompt_mode(mut self, mode: PromptMode) -> Self {
        self.prompt_mode = mode;
        self
    }

    pub fn with_send_eof(mut self, send_eof: bool) -> Self {
        self.send_eof = send_eof;
        self
    }
}
