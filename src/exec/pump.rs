// src/exec/pump.rs

//! Output pumps: one Tokio task per child stream, each pushing complete
//! lines onto the shared queue until EOF.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::StreamError;
use crate::exec::queue::{LineSender, LogLine, Origin};

/// Read `reader` line by line and push every line onto `tx`.
///
/// The trailing `\n` (and a `\r` right before it) is removed; everything else
/// is kept as-is. Invalid UTF-8 is replaced lossily rather than ending the
/// stream. Returns the number of lines pushed once EOF is reached or the
/// consumer has gone away.
pub async fn pump_lines<R>(reader: R, origin: Origin, tx: &LineSender) -> Result<usize, StreamError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut pumped = 0usize;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|source| StreamError::Read {
                stream: origin.as_str(),
                source,
            })?;

        if n == 0 {
            return Ok(pumped);
        }

        if tx.send(LogLine::new(origin, decode_line(&buf))).is_err() {
            debug!(stream = %origin, "line queue closed; stopping pump early");
            return Ok(pumped);
        }
        pumped += 1;
    }
}

/// Spawn [`pump_lines`] on its own task.
///
/// A read error ends this pump only: it is logged and the task resolves to 0.
pub fn spawn_pump<R>(reader: R, origin: Origin, tx: LineSender) -> JoinHandle<usize>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        match pump_lines(reader, origin, &tx).await {
            Ok(n) => {
                debug!(stream = %origin, lines = n, "pump reached end of stream");
                n
            }
            Err(err) => {
                warn!(stream = %origin, error = %err, "pump stopped on read error");
                0
            }
        }
    })
}

fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && raw[end - 1] == b'\r' {
            end -= 1;
        }
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
