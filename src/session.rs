//! [`Session`] — exclusive owner of a running child and its live handles.

use crate::launcher::{ChildProcess, Launched};
use crate::reader::Chunk;
use crate::writer::{Input, Pending, spawn_writer};
use std::io::{self, Write};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

const REAP_INTERVAL: Duration = Duration::from_millis(10);

/// One execution's child process, input writer and output channel.
///
/// Dropping a session whose child has not been reaped kills and reaps it, so
/// no exit path (errors, timeouts, a cancelled future) leaves an orphan.
pub(crate) struct Session {
    input: Option<Input>,
    output: UnboundedReceiver<Chunk>,
    /// `None` while a kill is in flight on the blocking pool.
    process: Option<Box<dyn ChildProcess>>,
    exit_code: Option<i32>,
}

impl Session {
    pub(crate) fn new(launched: Launched) -> Self {
        Self::from_parts(launched.writer, launched.output, launched.process)
    }

    pub(crate) fn from_parts(
        writer: Box<dyn Write + Send>,
        output: UnboundedReceiver<Chunk>,
        process: Box<dyn ChildProcess>,
    ) -> Self {
        Session {
            input: Some(spawn_writer(writer, "stdin")),
            output,
            process: Some(process),
            exit_code: None,
        }
    }

    /// Write raw bytes to the program's input, giving up at `deadline`.
    pub(crate) async fn send(&mut self, data: &[u8], deadline: Instant) -> io::Result<()> {
        let input = self
            .input
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "input already closed"))?;
        input.submit(data.to_vec()).wait(deadline).await
    }

    /// Queue a last write and close the input once it went through.
    pub(crate) fn send_and_close(&mut self, data: Vec<u8>) -> Option<Pending> {
        self.input.take().map(|input| input.submit(data))
    }

    /// Next chunk of output, or `None` once every reader reached end-of-stream.
    pub(crate) async fn next_chunk(&mut self) -> Option<Chunk> {
        self.output.recv().await
    }

    /// Whether the child has terminated, reaping it if so.
    pub(crate) fn has_exited(&mut self) -> bool {
        matches!(self.poll_exit(), Ok(Some(_)))
    }

    fn poll_exit(&mut self) -> io::Result<Option<i32>> {
        if self.exit_code.is_none() {
            if let Some(process) = self.process.as_mut() {
                self.exit_code = process.try_wait()?;
            }
        }
        Ok(self.exit_code)
    }

    /// Wait for the child to exit on its own until `deadline`, then kill it.
    pub(crate) async fn reap(&mut self, deadline: Instant) -> io::Result<i32> {
        loop {
            if let Some(code) = self.poll_exit()? {
                return Ok(code);
            }
            if Instant::now() >= deadline {
                warn!(pid = ?self.pid(), "child still running, killing it");
                return self.terminate().await;
            }
            sleep(REAP_INTERVAL).await;
        }
    }

    /// Kill the child unless it already exited, and reap it.
    ///
    /// Killing a PTY child waits for it to react to the hangup, so the kill
    /// and the final wait run on the blocking pool. If this future is dropped
    /// midway the blocking task still finishes the reap.
    pub(crate) async fn terminate(&mut self) -> io::Result<i32> {
        if let Some(code) = self.poll_exit()? {
            return Ok(code);
        }
        let mut process = self
            .process
            .take()
            .ok_or_else(|| io::Error::other("child is already being terminated"))?;
        let code = tokio::task::spawn_blocking(move || kill_and_wait(&mut *process))
            .await
            .map_err(io::Error::other)??;
        self.exit_code = Some(code);
        Ok(code)
    }

    fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(|p| p.pid())
    }
}

fn kill_and_wait(process: &mut dyn ChildProcess) -> io::Result<i32> {
    debug!(pid = ?process.pid(), "killing child");
    if let Err(e) = process.kill() {
        // It may have exited between the poll and the kill.
        debug!(error = %e, "kill failed");
    }
    process.wait()
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.exit_code.is_some() {
            return;
        }
        if let Some(process) = self.process.as_mut() {
            if let Err(e) = kill_and_wait(&mut **process) {
                warn!(error = %e, "failed to reap child");
            }
        }
    }
}
