//! Daemon assembly: listener, accept loop, and shared server context
//!
//! [`NntpServer`] binds the listening socket, registers a [`Connection`]
//! per accepted client, and owns the reader worker pool. Each connection
//! additionally gets a readiness probe task (feeding the reader pool's
//! ready queue) and a writer task (flushing its output queue).

pub mod reader;
pub mod writer;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::command::CommandSelector;
use crate::config::Config;
use crate::connection::Connection;
use crate::feed::FeedQueue;
use crate::protocol;
use crate::registry::ConnectionRegistry;
use crate::storage::{GroupRegistry, Storage};

use reader::ReadyQueue;

/// Shared collaborators every connection and handler can reach.
pub struct ServerContext {
    /// This server's name, recorded in Path headers.
    pub hostname: String,
    pub storage: Arc<dyn Storage>,
    pub groups: Arc<GroupRegistry>,
    /// Present when feeding is enabled (any subscriptions configured).
    pub feed: Option<Arc<FeedQueue>>,
    pub selector: CommandSelector,
    pub registry: Arc<ConnectionRegistry>,
    pub ready: Arc<ReadyQueue>,
}

/// The news daemon: listener plus worker pool.
pub struct NntpServer {
    ctx: Arc<ServerContext>,
    listener: TcpListener,
    reader_workers: usize,
    /// Zero disables the idle sweep.
    idle_timeout: Duration,
    next_conn_id: AtomicU64,
    feeder: Option<tokio::task::JoinHandle<()>>,
}

impl NntpServer {
    /// Bind the listener and assemble the shared context. The feed worker
    /// starts here when subscriptions are configured.
    pub async fn bind(config: Config, storage: Arc<dyn Storage>) -> Result<Self> {
        let groups = Arc::new(GroupRegistry::from_triples(
            config.groups.iter().map(|g| (g.name.clone(), g.id, g.flags)),
        ));

        let (feed, feeder) = if config.subscriptions.is_empty() {
            (None, None)
        } else {
            let queue = Arc::new(FeedQueue::new());
            let subscriptions = config
                .subscriptions
                .iter()
                .cloned()
                .map(Into::into)
                .collect();
            let handle = crate::feed::spawn_feeder(Arc::clone(&queue), subscriptions);
            (Some(queue), Some(handle))
        };

        let ctx = Arc::new(ServerContext {
            hostname: config.server.hostname.clone(),
            storage,
            groups,
            feed,
            selector: CommandSelector::new(),
            registry: Arc::new(ConnectionRegistry::new()),
            ready: Arc::new(ReadyQueue::new()),
        });

        let addr = config.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;
        info!("listening on {}", listener.local_addr()?);

        Ok(Self {
            ctx,
            listener,
            reader_workers: config.server.reader_workers,
            idle_timeout: Duration::from_secs(config.server.idle_timeout_secs),
            next_conn_id: AtomicU64::new(1),
            feeder,
        })
    }

    /// Address actually bound, useful with an ephemeral port.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared context, for embedding and tests.
    #[must_use]
    pub fn context(&self) -> Arc<ServerContext> {
        Arc::clone(&self.ctx)
    }

    /// Run the accept loop forever. Reader workers are spawned here, one
    /// pool shared by every connection.
    pub async fn run(self) -> Result<()> {
        for n in 0..self.reader_workers {
            // Worker ids start at 1; 0 marks a free read token.
            let worker_id = (n + 1) as u64;
            let ctx = Arc::clone(&self.ctx);
            tokio::spawn(reader::reader_worker(worker_id, ctx));
        }
        info!("started {} reader worker(s)", self.reader_workers);

        if !self.idle_timeout.is_zero() {
            tokio::spawn(idle_sweeper(
                Arc::clone(&self.ctx.registry),
                self.idle_timeout,
            ));
            info!("idle sweep enabled, timeout {:?}", self.idle_timeout);
        }

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
                    info!("connection {} accepted from {}", id, addr);
                    if let Err(e) = self.register(stream, id) {
                        warn!("connection {} setup failed: {}", id, e);
                    }
                }
                Err(e) => {
                    warn!("accept failed: {}", e);
                }
            }
        }
    }

    /// Wire a fresh socket into the daemon: split the stream, create and
    /// register the Connection, start its probe and writer tasks, greet.
    fn register(&self, stream: TcpStream, id: u64) -> Result<()> {
        stream.set_nodelay(true).ok();
        let addr = stream.peer_addr()?;
        let (read_half, write_half) = stream.into_split();
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        let conn = Arc::new(Connection::new(id, addr, read_half, out_tx));
        self.ctx.registry.insert(Arc::clone(&conn));

        tokio::spawn(writer::writer_task(
            Arc::clone(&conn),
            write_half,
            out_rx,
            Arc::clone(&self.ctx.registry),
        ));
        tokio::spawn(reader::readiness_probe(
            Arc::clone(&conn),
            Arc::clone(&self.ctx.ready),
        ));

        conn.println(&protocol::response(
            protocol::POSTING_ALLOWED,
            &format!("{} news server ready - posting allowed", self.ctx.hostname),
        ));
        Ok(())
    }
}

/// Periodically close connections with no read or write activity for
/// longer than `timeout`. Shutdown goes through the normal two-phase path,
/// so a response already queued still flushes.
async fn idle_sweeper(registry: Arc<ConnectionRegistry>, timeout: Duration) {
    let period = (timeout / 2).max(Duration::from_millis(500));
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        for conn in registry.snapshot() {
            if !conn.is_shutting_down() && conn.idle_for() >= timeout {
                info!(
                    "connection {} ({}) idle for {:?}, closing",
                    conn.id(),
                    conn.addr(),
                    conn.idle_for()
                );
                conn.shutdown();
            }
        }
    }
}

impl Drop for NntpServer {
    fn drop(&mut self) {
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
        }
    }
}
