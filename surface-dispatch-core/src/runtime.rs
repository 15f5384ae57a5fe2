//! Async line source for feeding an engine from a stream
//!
//! The engine itself never suspends. [`spawn_line_reader`] moves the only
//! async part, reading the transport, onto a task and hands complete lines
//! to the host over a channel, so the host loop can `select!` between
//! protocol lines and terminal input.
//!
//! Lines travel as raw bytes and go to
//! [`Engine::ingest_bytes`](crate::Engine::ingest_bytes), which skips a line
//! that is not UTF-8 instead of ending the stream.

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Spawn a task forwarding every line of `reader` into `tx`, without its
/// `\n` terminator.
///
/// `pace` adds a delay before each line, which replays a recorded stream
/// at a watchable speed. The task ends at EOF, on cancellation, or when the
/// receiver is dropped, and resolves to the number of lines forwarded.
pub fn spawn_line_reader<R>(
    mut reader: R,
    tx: mpsc::UnboundedSender<Vec<u8>>,
    pace: Option<Duration>,
    cancel_token: CancellationToken,
) -> tokio::task::JoinHandle<std::io::Result<usize>>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut forwarded = 0;

        loop {
            if let Some(pace) = pace {
                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    _ = tokio::time::sleep(pace) => {}
                }
            }

            let mut line = Vec::new();
            let read = tokio::select! {
                _ = cancel_token.cancelled() => break,
                read = reader.read_until(b'\n', &mut line) => read,
            };

            match read {
                Ok(0) => {
                    info!(lines = forwarded, "Line source reached EOF");
                    break;
                }
                Ok(_) => {
                    if line.last() == Some(&b'\n') {
                        line.pop();
                    }
                    if tx.send(line).is_err() {
                        debug!("Line channel closed, stopping reader");
                        break;
                    }
                    forwarded += 1;
                }
                Err(err) => {
                    warn!(error = %err, "Line source failed");
                    return Err(err);
                }
            }
        }

        Ok(forwarded)
    })
}
