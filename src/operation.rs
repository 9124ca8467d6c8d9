//! Entry points: [`Invocation`], the closed [`Operation`] set and [`run`].

use crate::delimiters::Delimiters;
use crate::engine::Engine;
use crate::error::Error;
use crate::launcher;
use crate::options::RunOptions;
use crate::outcome::Outcome;
use crate::parser::parse_str;
use crate::prompt::Prompt;
use crate::session::Session;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Everything needed for one run: the command, the mode and the transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// `argv[0]` is the program, looked up on `PATH`.
    pub argv: Vec<String>,
    /// Run on a pseudo-terminal instead of pipes.
    pub interactive: bool,
    /// Prompt markers; [`Delimiters::default`] when `None`.
    pub delimiters: Option<Delimiters>,
    pub transcript: String,
}

impl Invocation {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = Some(delimiters);
        self
    }

    pub fn transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = transcript.into();
        self
    }
}

/// The operations a front-end can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Feed the transcript over pipes in one go.
    ///
    /// `delimiters` still decide which lines count as prompt lines, so a
    /// literal such as `<b>bold` can be sent by choosing other markers.
    RunNonInteractive {
        argv: Vec<String>,
        delimiters: Option<Delimiters>,
        transcript: String,
    },
    /// Exchange the transcript line by line over a pseudo-terminal.
    RunInteractive {
        argv: Vec<String>,
        delimiters: Option<Delimiters>,
        transcript: String,
    },
    /// Run `interpreter script args...`. The interpreter is used as given.
    RunScriptFile {
        interpreter: String,
        script: PathBuf,
        args: Vec<String>,
        interactive: bool,
        delimiters: Option<Delimiters>,
        transcript: String,
    },
}

impl Operation {
    pub fn into_invocation(self) -> Invocation {
        match self {
            Operation::RunNonInteractive {
                argv,
                delimiters,
                transcript,
            } => Invocation {
                argv,
                interactive: false,
                delimiters,
                transcript,
            },
            Operation::RunInteractive {
                argv,
                delimiters,
                transcript,
            } => Invocation {
                argv,
                interactive: true,
                delimiters,
                transcript,
            },
            Operation::RunScriptFile {
                interpreter,
                script,
                args,
                interactive,
                delimiters,
                transcript,
            } => {
                let mut argv = vec![interpreter, script.to_string_lossy().into_owned()];
                argv.extend(args);
                Invocation {
                    argv,
                    interactive,
                    delimiters,
                    transcript,
                }
            }
        }
    }

    pub async fn run(self, options: &RunOptions) -> Result<Outcome, Error> {
        run(&self.into_invocation(), options).await
    }
}

/// Validate the invocation, start the program and drive it to the end.
///
/// # Errors
///
/// [`Error::Config`] when `argv` is empty, when a non-interactive transcript
/// contains prompt lines, or when a prompt is not a valid pattern in
/// [`PromptMode::Regex`](crate::PromptMode::Regex). [`Error::Spawn`] when the
/// program cannot be started. Nothing is spawned for config errors, and no
/// [`RunResult`](crate::RunResult) exists for either.
///
/// Everything that happens after the spawn is reported through [`Outcome`].
pub async fn run(invocation: &Invocation, options: &RunOptions) -> Result<Outcome, Error> {
    if invocation.argv.is_empty() {
        return Err(Error::config("command must not be empty"));
    }

    let delimiters = invocation.delimiters.clone().unwrap_or_default();
    let steps = parse_str(&invocation.transcript, &delimiters);

    if !invocation.interactive {
        if let Some(index) = steps.iter().position(|s| s.prompt().is_some()) {
            return Err(Error::config(format!(
                "line {} waits for a prompt, which needs interactive mode",
                index + 1
            )));
        }
    }
    let prompts = Prompt::compile_all(&steps, options.prompt_mode)?;

    info!(
        argv = ?invocation.argv,
        interactive = invocation.interactive,
        steps = steps.len(),
        "starting session"
    );
    let started = Instant::now();
    let launched = launcher::launch(
        &invocation.argv,
        invocation.interactive,
        options.terminal_size,
    )?;
    let engine = Engine::new(Session::new(launched), options, started);

    let outcome = if invocation.interactive {
        engine.execute_interactive(&steps, &prompts).await
    } else {
        engine.execute_batch(&steps).await
    };
    Ok(outcome)
}
