use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use promptty::parser::parse_duration;
use promptty::{Delimiters, Operation, Outcome, PromptMode, RunOptions, Stall, parse_file};
use std::io::{IsTerminal, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit status used when a session timed out, as with `timeout(1)`.
const EXIT_TIMED_OUT: u8 = 124;

#[derive(Parser, Debug)]
#[command(
    name = "promptty",
    about = "Drive a program from a transcript and print what it produced",
    version
)]
struct Cli {
    /// Log session progress to stderr (overridden by PROMPTTY_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a command with the transcript as its input
    Run {
        #[command(flatten)]
        session: SessionArgs,

        /// Command to run, followed by its arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        argv: Vec<String>,
    },
    /// Run a script file through an interpreter
    Script {
        #[command(flatten)]
        session: SessionArgs,

        /// Interpreter used to run the script
        #[arg(long, default_value = "python3")]
        interpreter: String,

        /// Path to the script
        script: PathBuf,

        /// Arguments passed to the script
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Parse a transcript and print the steps it describes
    Parse {
        /// Prompt delimiters, e.g. "[]" or "{{ }}"
        #[arg(short, long)]
        delimiters: Option<Delimiters>,

        /// Transcript file
        transcript: PathBuf,
    },
}

#[derive(Args, Debug)]
struct SessionArgs {
    /// Run on a pseudo-terminal and honour prompt lines
    #[arg(short, long)]
    interactive: bool,

    /// Prompt delimiters, e.g. "[]" or "{{ }}"
    #[arg(short, long)]
    delimiters: Option<Delimiters>,

    /// Treat prompts as regular expressions
    #[arg(long)]
    regex: bool,

    /// Read the transcript from a file
    #[arg(short, long, conflicts_with = "input")]
    transcript: Option<PathBuf>,

    /// Transcript text given inline
    #[arg(long)]
    input: Option<String>,

    /// How long to wait for each prompt
    #[arg(long, env = "PROMPTTY_TIMEOUT", default_value = "5s", value_parser = parse_duration)]
    timeout: Duration,

    /// How long to wait for the program to finish after the last line
    #[arg(long, env = "PROMPTTY_DRAIN_TIMEOUT", default_value = "10s", value_parser = parse_duration)]
    drain_timeout: Duration,

    /// Do not send end-of-file after the last interactive line
    #[arg(long)]
    no_eof: bool,
}

impl SessionArgs {
    fn options(&self) -> RunOptions {
        let mode = if self.regex {
            PromptMode::Regex
        } else {
            PromptMode::Literal
        };
        RunOptions::default()
            .with_prompt_timeout(self.timeout)
            .with_drain_timeout(self.drain_timeout)
            .with_prompt_mode(mode)
            .with_send_eof(!self.no_eof)
    }

    /// The transcript comes from `--transcript`, `--input`, or a piped stdin.
    fn transcript(&self) -> Result<String> {
        if let Some(path) = &self.transcript {
            return std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read transcript file: {}", path.display()));
        }
        if let Some(input) = &self.input {
            return Ok(input.clone());
        }
        let mut text = String::new();
        let stdin = std::io::stdin();
        if !stdin.is_terminal() {
            stdin
                .lock()
                .read_to_string(&mut text)
                .context("Failed to read transcript from stdin")?;
        }
        Ok(text)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (operation, options) = match cli.command {
        Command::Run { session, argv } => {
            let transcript = session.transcript()?;
            let delimiters = session.delimiters.clone();
            let op = if session.interactive {
                Operation::RunInteractive {
                    argv,
                    delimiters,
                    transcript,
                }
            } else {
                Operation::RunNonInteractive {
                    argv,
                    delimiters,
                    transcript,
                }
            };
            (op, session.options())
        }
        Command::Script {
            session,
            interpreter,
            script,
            args,
        } => {
            let op = Operation::RunScriptFile {
                interpreter,
                script,
                args,
                interactive: session.interactive,
                delimiters: session.delimiters.clone(),
                transcript: session.transcript()?,
            };
            (op, session.options())
        }
        Command::Parse {
            delimiters,
            transcript,
        } => {
            let steps = parse_file(&transcript, &delimiters.unwrap_or_default())?;
            println!("{:#?}", steps);
            return Ok(ExitCode::SUCCESS);
        }
    };

    let outcome = operation
        .run(&options)
        .await
        .context("Failed to start session")?;
    report(outcome)
}

/// Print the captured text on stdout and turn the outcome into an exit status.
fn report(outcome: Outcome) -> Result<ExitCode> {
    let text = outcome.result().display_text();
    let mut stdout = std::io::stdout();
    if !text.is_empty() {
        writeln!(stdout, "{text}")?;
    }
    stdout.flush()?;

    let result = outcome.result();
    tracing::info!(
        exit_code = result.exit_code(),
        duration = ?result.duration(),
        "session finished"
    );

    Ok(match outcome {
        Outcome::Completed(result) => {
            ExitCode::from(u8::try_from(result.exit_code()).unwrap_or(1))
        }
        Outcome::TimedOut {
            stall: stall @ Stall::DrainExceeded,
            ..
        } => {
            eprintln!("promptty: {stall}");
            ExitCode::from(EXIT_TIMED_OUT)
        }
        Outcome::TimedOut { step, stall, .. } => {
            eprintln!("promptty: step {}: {stall}", step + 1);
            ExitCode::from(EXIT_TIMED_OUT)
        }
        Outcome::Failed { error, .. } => {
            eprintln!("promptty: session failed: {error}");
            ExitCode::FAILURE
        }
    })
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("PROMPTTY_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
