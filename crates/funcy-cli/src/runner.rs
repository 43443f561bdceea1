// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Line-oriented JSON runner.
//!
//! Reads one [`InvokeRequest`] per line, runs each on a blocking worker and
//! writes one [`InvokeResponse`] per line, in request order. Blank lines are
//! ignored. A line that is not a valid request gets an error response; it
//! never stops the runner.

use std::future::Future;
use std::sync::Arc;

use funcy_core::{Engine, InvokeRequest, InvokeResponse};
use futures::StreamExt;
use futures::stream::FuturesOrdered;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, warn};

/// Serve requests from `reader` until EOF.
///
/// At most `max_in_flight` requests run concurrently. Returns the number of
/// responses written.
pub async fn run<R, W>(
    engine: Arc<Engine>,
    reader: R,
    mut writer: W,
    max_in_flight: usize,
) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let max_in_flight = max_in_flight.max(1);
    let mut lines = reader.lines();
    let mut pending = FuturesOrdered::new();
    let mut served = 0usize;
    let mut eof = false;

    loop {
        tokio::select! {
            line = lines.next_line(), if !eof && pending.len() < max_in_flight => {
                match line? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => pending.push_back(dispatch(Arc::clone(&engine), line)),
                    None => {
                        debug!(pending = pending.len(), "Input closed");
                        eof = true;
                    }
                }
            }
            Some(response) = pending.next(), if !pending.is_empty() => {
                write_response(&mut writer, &response).await?;
                served += 1;
            }
            else => break,
        }
    }

    writer.flush().await?;
    Ok(served)
}

/// Decode one line and run it on the blocking pool.
fn dispatch(engine: Arc<Engine>, line: String) -> impl Future<Output = InvokeResponse> {
    async move {
        let request: InvokeRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Rejected malformed request");
                return InvokeResponse::failure(&format!("invalid request: {}", e));
            }
        };

        let function = request.function_name.clone();
        match tokio::task::spawn_blocking(move || engine.handle(request)).await {
            Ok(response) => response,
            Err(e) => {
                error!(function = %function, error = %e, "Invocation task failed");
                InvokeResponse::failure(&format!("function {} panicked", function))
            }
        }
    }
}

async fn write_response<W>(writer: &mut W, response: &InvokeResponse) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(response)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    Ok(())
}
