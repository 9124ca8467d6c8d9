//! Process launcher.
//!
//! Interactive commands get a pseudo-terminal ([`crate::pty`]), everything
//! else gets anonymous pipes ([`crate::pipe`]). Either way the caller receives
//! a writer for the child's input, a channel fed by background reader threads,
//! and a handle to wait for or kill the child.

use crate::error::Error;
use crate::options::TerminalSize;
use crate::reader::Chunk;
use crate::{pipe, pty};
use std::io::{self, Write};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::info;

/// The part of a child process the engine needs once it is running.
pub(crate) trait ChildProcess: Send {
    fn pid(&self) -> Option<u32>;

    /// Exit code if the child has already terminated.
    fn try_wait(&mut self) -> io::Result<Option<i32>>;

    fn wait(&mut self) -> io::Result<i32>;

    fn kill(&mut self) -> io::Result<()>;
}

/// Live handles of a freshly spawned child.
pub(crate) struct Launched {
    pub(crate) writer: Box<dyn Write + Send>,
    pub(crate) output: UnboundedReceiver<Chunk>,
    pub(crate) process: Box<dyn ChildProcess>,
}

/// Spawn `argv` attached to a PTY (`interactive`) or to pipes.
pub(crate) fn launch(
    argv: &[String],
    interactive: bool,
    size: TerminalSize,
) -> Result<Launched, Error> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| Error::config("command must not be empty"))?;

    let (tx, output) = mpsc::unbounded_channel();
    let spawned = if interactive {
        pty::spawn(program, args, size, tx)
    } else {
        pipe::spawn(program, args, tx)
    };
    let (writer, process) = spawned.map_err(|source| Error::Spawn {
        program: program.clone(),
        source,
    })?;

    info!(program = %program, pid = ?process.pid(), interactive, "spawned");
    Ok(Launched {
        writer,
        output,
        process,
    })
}
