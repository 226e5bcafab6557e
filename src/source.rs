//! Newline-delimited JSON envelope source
//!
//! Decodes one envelope per line and forwards it to the router over a
//! bounded channel, preserving input order.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::Envelope;

/// Read envelopes until end of input or until the router goes away.
///
/// Undecodable lines are logged and skipped. Returns the number of
/// envelopes forwarded.
pub async fn read_envelopes<R>(reader: R, sender: mpsc::Sender<Envelope>) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_number = 0_u64;
    let mut forwarded = 0_u64;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let envelope: Envelope = match serde_json::from_str(line) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(line = line_number, error = %e, "Skipping undecodable envelope");
                continue;
            },
        };

        if sender.send(envelope).await.is_err() {
            debug!("Router stopped receiving, closing envelope source");
            break;
        }
        forwarded += 1;
    }

    debug!(forwarded, "Envelope source exhausted");
    Ok(forwarded)
}
