//! Read multiplexer: readiness probes, the ready queue, and the reader
//! worker pool
//!
//! One probe task per connection waits for the socket to become readable
//! and pushes the connection id onto the shared ready queue, then parks
//! until a worker completes the pass. A small fixed pool of reader workers
//! drains the queue. A worker that cannot take a connection's
//! read-ownership token re-queues the entry untouched, so a busy
//! connection is retried on a later pass. Bytes from one connection are
//! therefore always consumed by a single worker at a time, in arrival
//! order.

use std::sync::Arc;

use crossbeam::queue::SegQueue;
use tokio::sync::Notify;
use tracing::{debug, trace, warn};

use crate::connection::{ConnId, Connection};

use super::ServerContext;

/// Read size for one pass; protocol lines are short, article bodies arrive
/// over multiple passes.
const READ_BUF_SIZE: usize = 4096;

/// Shared queue of connections with pending read readiness.
#[derive(Debug, Default)]
pub struct ReadyQueue {
    queue: SegQueue<ConnId>,
    notify: Notify,
}

impl ReadyQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a ready connection and wake one worker.
    pub fn push(&self, id: ConnId) {
        self.queue.push(id);
        self.notify.notify_one();
    }

    fn pop(&self) -> Option<ConnId> {
        self.queue.pop()
    }

    async fn wait(&self) {
        self.notify.notified().await;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Per-connection readiness probe. Ends when the connection shuts down or
/// the socket errors out.
pub async fn readiness_probe(conn: Arc<Connection>, ready: Arc<ReadyQueue>) {
    let mut shutdown = conn.subscribe_shutdown();
    loop {
        tokio::select! {
            result = conn.readable() => {
                if let Err(e) = result {
                    debug!("connection {}: readiness wait failed: {}", conn.id(), e);
                    conn.shutdown();
                    break;
                }
            }
            _ = shutdown.changed() => break,
        }
        if conn.is_shutting_down() {
            break;
        }

        ready.push(conn.id());

        // Park until a worker finishes the pass; re-arming readable()
        // before the buffered bytes are consumed would spin.
        tokio::select! {
            _ = conn.resume.notified() => {}
            _ = shutdown.changed() => break,
        }
    }
    trace!("connection {}: readiness probe ended", conn.id());
}

/// One reader worker. `worker_id` is non-zero and doubles as the
/// read-ownership token value.
pub async fn reader_worker(worker_id: u64, ctx: Arc<ServerContext>) {
    loop {
        let Some(id) = ctx.ready.pop() else {
            ctx.ready.wait().await;
            continue;
        };

        // The connection may have been torn down since it was enqueued.
        let Some(conn) = ctx.registry.get(id) else {
            continue;
        };

        if !conn.read_lock.try_acquire(worker_id) {
            // Another worker is mid-read for this connection. Leave the
            // entry for the next pass rather than stealing bytes.
            ctx.ready.push(id);
            tokio::task::yield_now().await;
            continue;
        }

        read_pass(worker_id, &conn, &ctx).await;
        conn.read_lock.release(worker_id);
        conn.resume.notify_one();
    }
}

/// One read-and-process pass: pull available bytes, then deliver every
/// fully assembled line in arrival order. Runs with the read token held.
async fn read_pass(worker_id: u64, conn: &Arc<Connection>, ctx: &Arc<ServerContext>) {
    if conn.is_shutting_down() {
        return;
    }

    let mut buf = [0u8; READ_BUF_SIZE];
    let lines = match conn.try_read(&mut buf) {
        Ok(0) => {
            // Peer half-closed; cancel this connection's readiness.
            debug!("connection {}: end of stream", conn.id());
            conn.shutdown();
            return;
        }
        Ok(n) => {
            conn.touch();
            trace!("connection {}: worker {} read {} bytes", conn.id(), worker_id, n);
            let mut session = conn.session();
            session.input.append(&buf[..n]);
            let mut lines = Vec::new();
            while let Some(line) = session.input.next_line() {
                lines.push(line);
            }
            lines
        }
        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
            // Spurious readiness; the probe will re-arm.
            return;
        }
        Err(e) => {
            warn!("connection {}: read failed: {}", conn.id(), e);
            conn.shutdown();
            return;
        }
    };

    for raw in lines {
        if conn.is_shutting_down() {
            break;
        }
        conn.line_received(ctx, raw).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_queue_fifo() {
        let queue = ReadyQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_ready_queue_wakes_waiter() {
        let queue = Arc::new(ReadyQueue::new());
        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                loop {
                    if let Some(id) = queue.pop() {
                        return id;
                    }
                    queue.wait().await;
                }
            })
        };
        tokio::task::yield_now().await;
        queue.push(42);
        let got = tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, 42);
    }
}
