use crate::launcher::ChildProcess;
use crate::reader::{Chunk, spawn_reader};
use anyhow::{Context, Result};
use std::io::{self, Write};
use std::process::{self, Command, ExitStatus, Stdio};
use tokio::sync::mpsc::UnboundedSender;

/// A program whose stdin, stdout and stderr are anonymous pipes.
///
/// stdout and stderr feed the same channel from two threads, so ordering
/// between the two streams is arrival order only.
pub(crate) struct PipeChild(process::Child);

pub(crate) fn spawn(
    program: &str,
    args: &[String],
    tx: UnboundedSender<Chunk>,
) -> Result<(Box<dyn Write + Send>, Box<dyn ChildProcess>)> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to spawn {program}"))?;

    let stdin = child.stdin.take().context("Failed to open child stdin")?;
    let stdout = child.stdout.take().context("Failed to open child stdout")?;
    let stderr = child.stderr.take().context("Failed to open child stderr")?;

    spawn_reader(stdout, tx.clone(), "stdout");
    spawn_reader(stderr, tx, "stderr");

    Ok((Box::new(stdin), Box::new(PipeChild(child))))
}

/// Signals map to the shell convention `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    status.code().unwrap_or(-1)
}

impl ChildProcess for PipeChild {
    fn pid(&self) -> Option<u32> {
        Some(self.0.id())
    }

    fn try_wait(&mut self) -> io::Result<Option<i32>> {
        Ok(self.0.try_wait()?.map(exit_code))
    }

    fn wait(&mut self) -> io::Result<i32> {
        self.0.wait().map(exit_code)
    }

    fn kill(&mut self) -> io::Result<()> {
        self.0.kill()
    }
}
