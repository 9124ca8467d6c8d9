use crate::launcher::ChildProcess;
use crate::options::TerminalSize;
use crate::reader::{Chunk, spawn_reader};
use anyhow::{Context, Result};
use portable_pty::{Child, ChildKiller, CommandBuilder, ExitStatus, MasterPty, PtySize};
use std::io::{self, Write};
use tokio::sync::mpsc::UnboundedSender;

/// A program running inside a PTY.
///
/// The terminal echoes whatever is written to it unless the program turns
/// echo off, so the output stream carries the sent lines as well.
pub(crate) struct PtyChild {
    // Dropping the master hangs up the terminal.
    _master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
}

/// Spawn `program` on a new PTY, start a reader thread on the master side and
/// return the master writer together with the child.
pub(crate) fn spawn(
    program: &str,
    args: &[String],
    size: TerminalSize,
    tx: UnboundedSender<Chunk>,
) -> Result<(Box<dyn Write + Send>, Box<dyn ChildProcess>)> {
    let pty_system = portable_pty::native_pty_system();

    // No display is attached, the size only has to be sane.
    let pty_size = PtySize {
        rows: size.rows,
        cols: size.cols,
        pixel_width: 0,
        pixel_height: 0,
    };

    let pair = pty_system
        .openpty(pty_size)
        .context("Failed to open PTY")?;

    let mut cmd = CommandBuilder::new(program);
    cmd.args(args);
    // portable-pty defaults to the home directory; behave like a pipe spawn.
    if let Ok(cwd) = std::env::current_dir() {
        cmd.cwd(cwd);
    }

    let child = pair
        .slave
        .spawn_command(cmd)
        .with_context(|| format!("Failed to spawn {program} on PTY"))?;

    // Our copy of the slave must go, otherwise the master never sees EOF.
    drop(pair.slave);

    let writer = pair
        .master
        .take_writer()
        .context("Failed to get PTY writer")?;

    let reader = pair
        .master
        .try_clone_reader()
        .context("Failed to get PTY reader")?;
    spawn_reader(reader, tx, "pty");

    let child = PtyChild {
        _master: pair.master,
        child,
    };
    Ok((writer, Box::new(child)))
}

/// Signal deaths map to `128 + signal`, like pipe children.
///
/// portable-pty only keeps the signal's description (`strsignal`) and reports
/// code 1 for it, so the number is recovered from the text.
fn exit_code(status: &ExitStatus) -> i32 {
    if status.success() {
        return 0;
    }
    let text = status.to_string();
    match text.strip_prefix("Terminated by ") {
        Some(name) => signal_number(name).map_or(-1, |signal| 128 + signal),
        None => status.exit_code() as i32,
    }
}

fn signal_number(description: &str) -> Option<i32> {
    if let Some(number) = description.strip_prefix("Signal ") {
        return number.trim().parse().ok();
    }
    let signal = match description {
        "Hangup" => 1,
        "Interrupt" => 2,
        "Quit" => 3,
        "Aborted" => 6,
        "Killed" => 9,
        "Segmentation fault" => 11,
        "Broken pipe" => 13,
        "Alarm clock" => 14,
        "Terminated" => 15,
        _ => return None,
    };
    Some(signal)
}

impl ChildProcess for PtyChild {
    fn pid(&self) -> Option<u32> {
        self.child.process_id()
    }

    fn try_wait(&mut self) -> io::Result<Option<i32>> {
        Ok(self.child.try_wait()?.as_ref().map(exit_code))
    }

    fn wait(&mut self) -> io::Result<i32> {
        Ok(exit_code(&self.child.wait()?))
    }

    fn kill(&mut self) -> io::Result<()> {
        self.child.kill()
    }
}
