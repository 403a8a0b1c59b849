//! Write multiplexer: per-connection output flushing
//!
//! Each connection gets one writer task consuming its output queue. The
//! queue receive doubles as the explicit wakeup: a handler enqueueing a
//! chunk wakes the task, and the task is idle (out of the writable set)
//! whenever the queue is drained. On shutdown the task keeps flushing
//! already-buffered chunks within the grace period, then shuts the socket
//! down and deregisters the connection.

use std::sync::Arc;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::connection::{Connection, SHUTDOWN_GRACE};
use crate::registry::ConnectionRegistry;

pub async fn writer_task(
    conn: Arc<Connection>,
    mut write_half: OwnedWriteHalf,
    mut out_rx: mpsc::UnboundedReceiver<Bytes>,
    registry: Arc<ConnectionRegistry>,
) {
    let mut shutdown = conn.subscribe_shutdown();

    loop {
        tokio::select! {
            // Flush queued output ahead of a pending shutdown signal so a
            // final response enqueued just before shutdown still goes out.
            biased;

            chunk = out_rx.recv() => match chunk {
                Some(chunk) => {
                    if let Err(e) = write_half.write_all(&chunk).await {
                        debug!("connection {}: write failed: {}", conn.id(), e);
                        conn.shutdown();
                        break;
                    }
                    conn.touch();
                }
                None => break,
            },
            _ = shutdown.changed() => break,
        }
    }

    // Grace flush: anything enqueued before the shutdown request still gets
    // a bounded chance to reach the client before the socket closes.
    let _ = timeout(SHUTDOWN_GRACE, flush_pending(&conn, &mut out_rx, &mut write_half)).await;

    let _ = write_half.shutdown().await;
    registry.remove(conn.id());
    debug!("connection {} closed", conn.id());
}

async fn flush_pending(
    conn: &Arc<Connection>,
    out_rx: &mut mpsc::UnboundedReceiver<Bytes>,
    write_half: &mut OwnedWriteHalf,
) {
    while let Ok(chunk) = out_rx.try_recv() {
        if write_half.write_all(&chunk).await.is_err() {
            return;
        }
        conn.touch();
    }
    trace!("connection {}: output drained", conn.id());
}
