//! The interaction engine: sequences writes to the child against the output
//! it has actually produced.
//!
//! Output is read by background threads (see [`crate::reader`]) and arrives
//! here over a channel, so a pending write never stalls reading and the child
//! never blocks on a full output buffer. Prompt waits are woken by arriving
//! chunks, not by polling.

use crate::options::RunOptions;
use crate::outcome::{Outcome, Stall};
use crate::prompt::Prompt;
use crate::recorder::{Recorder, RunResult};
use crate::session::Session;
use crate::step::Step;
use std::io;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

/// End-of-transmission, the default VEOF character of a terminal.
const EOT: u8 = 0x04;

enum Wait {
    Matched,
    TimedOut,
    Exited,
    Failed(io::Error),
}

enum Drain {
    Eof,
    TimedOut,
    Failed(io::Error),
}

/// Drives one [`Session`] through a list of steps.
pub(crate) struct Engine<'a> {
    session: Session,
    recorder: Recorder,
    /// Output before this offset already satisfied a prompt.
    consumed: usize,
    options: &'a RunOptions,
    started: std::time::Instant,
}

impl<'a> Engine<'a> {
    pub(crate) fn new(session: Session, options: &'a RunOptions, started: std::time::Instant) -> Self {
        Engine {
            session,
            recorder: Recorder::new(),
            consumed: 0,
            options,
            started,
        }
    }

    /// Pipe mode: feed every line at once, close the input, read to the end.
    ///
    /// `steps` must not contain prompts; they are rejected before spawning.
    pub(crate) async fn execute_batch(mut self, steps: &[Step]) -> Outcome {
        let blob: Vec<u8> = steps.iter().flat_map(Step::payload).collect();
        debug!(bytes = blob.len(), lines = steps.len(), "feeding input");

        // The input closes once the blob is written.
        let feed = self.session.send_and_close(blob);

        let deadline = Instant::now() + self.options.drain_timeout;
        match self.drain(deadline).await {
            Drain::Eof => {}
            Drain::TimedOut => return self.stalled(steps.len(), Stall::DrainExceeded).await,
            Drain::Failed(e) => return self.failed(e).await,
        }

        if let Some(feed) = feed {
            match feed.wait(deadline).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    debug!("child stopped reading its input");
                }
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    return self.stalled(steps.len(), Stall::InputBlocked).await;
                }
                Err(e) => return self.failed(e).await,
            }
        }

        self.complete(deadline).await
    }

    /// PTY mode: literals are sent straight away, prompt lines wait for their
    /// prompt in the unconsumed output first.
    pub(crate) async fn execute_interactive(
        mut self,
        steps: &[Step],
        prompts: &[Option<Prompt>],
    ) -> Outcome {
        for (index, (step, prompt)) in steps.iter().zip(prompts).enumerate() {
            if let Some(prompt) = prompt {
                let deadline = Instant::now() + self.options.prompt_timeout;
                match self.wait_for(prompt, deadline).await {
                    Wait::Matched => {
                        debug!(step = index, consumed = self.consumed, "prompt matched");
                    }
                    Wait::TimedOut => {
                        let prompt = step.prompt().unwrap_or_default().to_string();
                        warn!(step = index, prompt = %prompt, "prompt never appeared");
                        return self
                            .stalled(index, Stall::PromptNeverAppeared { prompt })
                            .await;
                    }
                    Wait::Exited => {
                        warn!(step = index, "output ended while waiting for a prompt");
                        return self.stalled(index, Stall::ProcessExited).await;
                    }
                    Wait::Failed(e) => return self.failed(e).await,
                }
            }

            debug!(step = index, line = step.line(), "sending");
            let deadline = Instant::now() + self.options.prompt_timeout;
            match self.session.send(&step.payload(), deadline).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    warn!(step = index, "program stopped reading its input");
                    return self.stalled(index, Stall::InputBlocked).await;
                }
                Err(_) if self.session.has_exited() => {
                    debug!(step = index, "child exited before all lines were sent");
                    break;
                }
                Err(e) => return self.failed(e).await,
            }
        }

        if self.options.send_eof {
            let deadline = Instant::now() + self.options.prompt_timeout;
            match self.session.send(&[EOT], deadline).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    return self.stalled(steps.len(), Stall::InputBlocked).await;
                }
                Err(e) => debug!(error = %e, "could not send end-of-file"),
            }
        }

        let deadline = Instant::now() + self.options.drain_timeout;
        match self.drain(deadline).await {
            Drain::Eof => self.complete(deadline).await,
            Drain::TimedOut => self.stalled(steps.len(), Stall::DrainExceeded).await,
            Drain::Failed(e) => self.failed(e).await,
        }
    }

    /// Read until `prompt` occurs after the consumed cursor, then move the
    /// cursor past the match.
    async fn wait_for(&mut self, prompt: &Prompt, deadline: Instant) -> Wait {
        loop {
            if let Some(end) = prompt.match_end(&self.recorder.as_bytes()[self.consumed..]) {
                self.consumed += end;
                return Wait::Matched;
            }
            match timeout_at(deadline, self.session.next_chunk()).await {
                Err(_) => return Wait::TimedOut,
                Ok(None) => return Wait::Exited,
                Ok(Some(Ok(chunk))) => self.recorder.append(&chunk),
                Ok(Some(Err(e))) => return Wait::Failed(e),
            }
        }
    }

    async fn drain(&mut self, deadline: Instant) -> Drain {
        loop {
            match timeout_at(deadline, self.session.next_chunk()).await {
                Err(_) => return Drain::TimedOut,
                Ok(None) => return Drain::Eof,
                Ok(Some(Ok(chunk))) => self.recorder.append(&chunk),
                Ok(Some(Err(e))) => return Drain::Failed(e),
            }
        }
    }

    async fn complete(mut self, deadline: Instant) -> Outcome {
        let code = self.session.reap(deadline).await;
        let result = self.finish(code);
        info!(
            exit_code = result.exit_code(),
            bytes = result.captured().as_bytes().len(),
            elapsed = ?result.duration(),
            "completed"
        );
        Outcome::Completed(result)
    }

    async fn stalled(mut self, step: usize, stall: Stall) -> Outcome {
        let code = match stall {
            // The child is on its way out; give it the chance to report why.
            Stall::ProcessExited => {
                let deadline = Instant::now() + self.options.drain_timeout;
                self.session.reap(deadline).await
            }
            _ => self.session.terminate().await,
        };
        Outcome::TimedOut {
            result: self.finish(code),
            step,
            stall,
        }
    }

    async fn failed(mut self, error: io::Error) -> Outcome {
        warn!(%error, "session failed");
        let code = self.session.terminate().await;
        Outcome::Failed {
            result: self.finish(code),
            error,
        }
    }

    fn finish(&mut self, code: io::Result<i32>) -> RunResult {
        let code = code.unwrap_or_else(|e| {
            warn!(error = %e, "could not collect exit status");
            -1
        });
        std::mem::take(&mut self.recorder).finalize(code, self.started.elapsed())
    }
}
