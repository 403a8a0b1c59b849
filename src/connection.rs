//! Per-socket connection state and the command dispatch state machine
//!
//! Every accepted TCP connection gets one [`Connection`], created on accept
//! and destroyed on close, never reused. Reader workers deliver assembled
//! lines through [`Connection::line_received`], which drives the command
//! state machine: an unbound connection resolves the first token as a verb;
//! a bound (stateful) command keeps receiving lines until it reports
//! completion, at which point the charset resets to the session default.
//!
//! Session fields are only ever touched by the worker currently holding the
//! read-ownership token, so the mutex guarding them is uncontended; it
//! exists to satisfy the shared-ownership types, not as a coordination
//! point.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use bytes::Bytes;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::{mpsc, watch, Notify};
use tracing::{debug, error, info, warn};

use crate::codec::{encode_line, Charset, LineBuffer};
use crate::command::BoxedCommand;
use crate::daemon::ServerContext;
use crate::protocol;
use crate::storage::{Article, Group};

/// Identifies one accepted socket for registry lookups.
pub type ConnId = u64;

/// Grace period between a shutdown request and the socket close, giving
/// already-buffered responses time to flush.
pub const SHUTDOWN_GRACE: std::time::Duration = std::time::Duration::from_secs(3);

/// Read-ownership token: a non-blocking mutual exclusion guard keyed by
/// worker identity. 0 means free. At most one worker holds the token for a
/// given connection at any instant, and only the owner may release it.
#[derive(Debug, Default)]
pub struct ReadLock {
    owner: AtomicU64,
}

impl ReadLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to take the token for `worker_id` (must be non-zero). Returns
    /// false without blocking when another worker holds it.
    #[must_use]
    pub fn try_acquire(&self, worker_id: u64) -> bool {
        debug_assert_ne!(worker_id, 0, "worker id 0 is the free marker");
        self.owner
            .compare_exchange(0, worker_id, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the token. A release by a non-owner is a programming error:
    /// it is logged and refused so the actual owner's pass stays intact.
    pub fn release(&self, worker_id: u64) {
        if self
            .owner
            .compare_exchange(worker_id, 0, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug_assert!(false, "read lock released by non-owner {}", worker_id);
            error!("read lock released by non-owner worker {}", worker_id);
        }
    }

    /// Worker currently holding the token, or 0 when free.
    #[must_use]
    pub fn holder(&self) -> u64 {
        self.owner.load(Ordering::Acquire)
    }
}

/// Mutable session state, owned by whichever worker holds the read token.
pub struct Session {
    pub input: LineBuffer,
    pub charset: Charset,
    /// In-progress command; `None` means the next line is a fresh verb.
    pub command: Option<BoxedCommand>,
    pub current_group: Option<std::sync::Arc<Group>>,
    pub current_article: Option<(u64, Article)>,
    pub user: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            input: LineBuffer::new(),
            charset: Charset::default(),
            command: None,
            current_group: None,
            current_article: None,
            user: None,
        }
    }
}

/// State for one client socket.
pub struct Connection {
    id: ConnId,
    addr: SocketAddr,
    read_half: OwnedReadHalf,
    out_tx: mpsc::UnboundedSender<Bytes>,
    session: Mutex<Session>,
    pub read_lock: ReadLock,
    /// Wakes the readiness probe once a worker finished its pass.
    pub resume: Notify,
    shutdown_tx: watch::Sender<bool>,
    created: Instant,
    last_activity_ms: AtomicU64,
}

impl Connection {
    #[must_use]
    pub fn new(
        id: ConnId,
        addr: SocketAddr,
        read_half: OwnedReadHalf,
        out_tx: mpsc::UnboundedSender<Bytes>,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            id,
            addr,
            read_half,
            out_tx,
            session: Mutex::new(Session::default()),
            read_lock: ReadLock::new(),
            resume: Notify::new(),
            shutdown_tx,
            created: Instant::now(),
            last_activity_ms: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn id(&self) -> ConnId {
        self.id
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Await read readiness on the socket.
    pub async fn readable(&self) -> std::io::Result<()> {
        self.read_half.readable().await
    }

    /// Non-blocking read of available bytes.
    pub fn try_read(&self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.read_half.try_read(buf)
    }

    /// Record activity now (any read or write).
    pub fn touch(&self) {
        let ms = self.created.elapsed().as_millis() as u64;
        self.last_activity_ms.store(ms, Ordering::Relaxed);
    }

    /// Time since the last read or write on this connection.
    #[must_use]
    pub fn idle_for(&self) -> std::time::Duration {
        let last = self.last_activity_ms.load(Ordering::Relaxed);
        self.created
            .elapsed()
            .saturating_sub(std::time::Duration::from_millis(last))
    }

    /// Access the session state. Callers must hold the read token; see the
    /// module docs.
    pub fn session(&self) -> std::sync::MutexGuard<'_, Session> {
        self.session.lock().expect("session mutex poisoned")
    }

    /// Subscribe to the shutdown signal (probe and writer tasks).
    #[must_use]
    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Begin the two-phase shutdown: input stops immediately (the probe and
    /// reader observe the flag), while the writer flushes buffered output
    /// and closes the socket after [`SHUTDOWN_GRACE`]. Never blocks the
    /// caller.
    pub fn shutdown(&self) {
        if self.shutdown_tx.send_replace(true) {
            return; // already shutting down
        }
        debug!("connection {} ({}) shutting down", self.id, self.addr);
        // Unblock a probe parked on the resume gate.
        self.resume.notify_waiters();
    }

    /// Queue one response line for transmission and wake the writer.
    ///
    /// The line is encoded with the session charset and split into bounded
    /// chunks; it is terminated by exactly one CR LF on the wire. Returns
    /// immediately; an unencodable line is dropped per the codec contract.
    pub fn println(&self, line: &str) {
        let charset = self.session().charset;
        let Some(chunks) = encode_line(line, charset) else {
            return; // logged by the codec
        };
        debug!(">> {}", line);
        for chunk in chunks {
            if self.out_tx.send(chunk).is_err() {
                warn!("connection {}: output queue closed, dropping write", self.id);
                return;
            }
        }
        self.touch();
    }

    /// Dispatch one received line through the command state machine.
    ///
    /// A transient storage fault triggers exactly one re-delivery of the
    /// identical line to the same handler; a second consecutive fault, or
    /// any unrecoverable fault, unbinds the handler, emits one generic
    /// error response and schedules shutdown. The error response always
    /// precedes the drop.
    pub async fn line_received(
        self: &std::sync::Arc<Self>,
        ctx: &std::sync::Arc<ServerContext>,
        raw: Vec<u8>,
    ) {
        self.touch();

        let (line, command) = {
            let mut session = self.session();
            let line = session.charset.decode(&raw);
            (line, session.command.take())
        };
        debug!("<< {}", line);

        let mut command = match command {
            Some(cmd) => cmd,
            None => ctx.selector.select(&line),
        };

        let mut result = command.process_line(self, ctx, &line).await;
        if let Err(err) = &result {
            if err.is_transient() {
                info!(
                    "connection {}: retrying line after transient storage fault: {}",
                    self.id, err
                );
                result = command.process_line(self, ctx, &line).await;
            }
        }

        match result {
            Ok(()) => {
                let mut session = self.session();
                if command.has_finished() {
                    session.charset = Charset::default();
                } else {
                    session.command = Some(command);
                }
            }
            Err(err) => {
                // Handler unbound by not putting it back.
                warn!("connection {} ({}): {}", self.id, self.addr, err);
                self.println(&protocol::response(
                    protocol::INTERNAL_ERROR,
                    "Internal server error",
                ));
                self.shutdown();
            }
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("addr", &self.addr)
            .field("read_lock", &self.read_lock)
            .finish_non_exhaustive()
    }
}
