//! # Promptty
//!
//! Drive an external program from a scripted transcript and capture what it
//! printed.
//!
//! A transcript is plain text, one line per input line. A line can also name
//! the prompt to wait for before it is sent, by starting with the prompt
//! between a pair of delimiters (`<` and `>` unless configured otherwise):
//!
//! ```text
//! <Enter name: >Matt
//! ```
//!
//! Programs run in one of two modes:
//!
//! - **Non-interactive**: stdin, stdout and stderr are pipes. Every line is
//!   fed at once, stdin is closed and the output is read to the end. Prompt
//!   lines are rejected in this mode.
//! - **Interactive**: the program runs on a pseudo-terminal. Lines are sent
//!   one at a time, prompt lines wait for their prompt first. The terminal
//!   echoes every line it receives, so **the captured output contains the
//!   sent lines as well as the program's replies**. This is part of the
//!   contract, not an accident; strip it when presenting if needed.
//!
//! ## Quick start
//!
//! ```no_run
//! use promptty::{Invocation, Outcome, RunOptions, run};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let invocation = Invocation::new(["python3", "-q"])
//!         .interactive(true)
//!         .delimiters("[]".parse()?)
//!         .transcript("[>>> ]print(5743+7473)");
//!
//!     match run(&invocation, &RunOptions::default()).await? {
//!         Outcome::Completed(result) => println!("{}", result.display_text()),
//!         Outcome::TimedOut { result, step, stall } => {
//!             eprintln!("step {step}: {stall}\n{}", result.text())
//!         }
//!         Outcome::Failed { result, error } => eprintln!("{error}\n{}", result.text()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Outcomes
//!
//! [`run`] returns `Err` only when nothing could be started: an invalid
//! configuration ([`Error::Config`]) or a program that cannot be spawned
//! ([`Error::Spawn`]). Once the program runs, the session always ends in an
//! [`Outcome`] carrying a [`RunResult`] with everything read so far. A
//! non-zero exit code is a normal [`Outcome::Completed`].
//!
//! ## Operations
//!
//! Front-ends describe what to run with [`Operation`]:
//! [`Operation::RunNonInteractive`], [`Operation::RunInteractive`] or
//! [`Operation::RunScriptFile`].

pub mod delimiters;
pub mod error;
pub mod operation;
pub mod options;
pub mod outcome;
pub mod parser;
pub mod prompt;
pub mod recorder;
pub mod step;

pub(crate) mod engine;
pub(crate) mod launcher;
pub(crate) mod pipe;
pub(crate) mod pty;
pub(crate) mod reader;
pub(crate) mod session;
pub(crate) mod writer;

pub use delimiters::Delimiters;
pub use error::Error;
pub use operation::{Invocation, Operation, run};
pub use options::{RunOptions, TerminalSize};
pub use outcome::{Outcome, Stall};
pub use parser::{parse_file, parse_str};
pub use prompt::PromptMode;
pub use recorder::{Captured, Recorder, RunResult};
pub use step::Step;
