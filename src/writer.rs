use std::io::{self, Write};
use std::thread;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

struct Request {
    data: Vec<u8>,
    done: oneshot::Sender<io::Result<()>>,
}

/// Sending half of a background writer thread.
///
/// Dropping it lets the thread finish the queued writes and then drop the
/// underlying writer, which closes the child's input.
pub(crate) struct Input {
    requests: mpsc::UnboundedSender<Request>,
}

/// A queued write that has not been confirmed yet.
pub(crate) struct Pending(oneshot::Receiver<io::Result<()>>);

impl Input {
    /// Queue `data` behind earlier writes.
    pub(crate) fn submit(&self, data: Vec<u8>) -> Pending {
        let (done, pending) = oneshot::channel();
        // If the thread is gone `done` is dropped and the wait reports it.
        let _ = self.requests.send(Request { data, done });
        Pending(pending)
    }
}

impl Pending {
    /// Wait until the write went through, giving up at `deadline`.
    ///
    /// A child that stops reading its input leaves the write blocked in the
    /// writer thread; that surfaces here as [`io::ErrorKind::TimedOut`].
    pub(crate) async fn wait(self, deadline: Instant) -> io::Result<()> {
        match timeout_at(deadline, self.0).await {
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "program is not reading its input",
            )),
            Ok(Err(_)) => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "input already closed",
            )),
            Ok(Ok(result)) => result,
        }
    }
}

/// Spawns a background thread that owns `writer` and performs queued writes
/// in order.
///
/// The thread stops after the first failed write or once the [`Input`] is
/// dropped and the queue is empty. A write that never returns only holds up
/// this thread, never the engine.
pub(crate) fn spawn_writer<W: Write + Send + 'static>(
    mut writer: W,
    name: &'static str,
) -> Input {
    let (requests, mut rx) = mpsc::unbounded_channel::<Request>();
    thread::spawn(move || {
        while let Some(Request { data, done }) = rx.blocking_recv() {
            let result = writer.write_all(&data).and_then(|()| writer.flush());
            let failed = result.is_err();
            if let Err(e) = &result {
                warn!(stream = name, error = %e, "write failed");
            }
            let _ = done.send(result);
            if failed {
                break;
            }
        }
        debug!(stream = name, "writer finished");
    });
    Input { requests }
}
