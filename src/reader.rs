use std::io::{self, Read};
use std::thread;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// What a reader thread hands to the engine.
pub(crate) type Chunk = io::Result<Vec<u8>>;

/// Linux reports EIO on the master side once every slave fd is closed.
const EIO: i32 = 5;

/// Spawns a background thread that copies `reader` into `tx` chunk by chunk.
///
/// The thread ends on end-of-stream, on a read error (which is forwarded), or
/// when the receiving side is dropped. The channel closes once every sender
/// clone is gone, which is how the engine observes end-of-stream.
pub(crate) fn spawn_reader<R: Read + Send + 'static>(
    mut reader: R,
    tx: UnboundedSender<Chunk>,
    name: &'static str,
) {
    thread::spawn(move || {
        let mut buffer = [0u8; 4096];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break, // EOF
                Ok(n) => {
                    if tx.send(Ok(buffer[..n].to_vec())).is_err() {
                        break; // Receiver dropped
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.raw_os_error() == Some(EIO) => break,
                Err(e) => {
                    warn!(stream = name, error = %e, "read failed");
                    let _ = tx.send(Err(e));
                    break;
                }
            }
        }
        debug!(stream = name, "reader finished");
    });
}
