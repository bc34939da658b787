//! TCP transport server.
//!
//! Accepts connections up to a fixed cap, runs one task per admitted client
//! over a shared [`TcpStream`], and sweeps for dead peers on an interval.
//! The session registry is the only shared mutable state; its lock is held
//! for structural updates only, never across a socket await.

use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use thiserror::Error;
use tokio::io::Interest;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Notify};
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_MAX_CLIENTS, DEFAULT_PORT, DEFAULT_SWEEP_INTERVAL};
use crate::control::RadioControl;
use crate::dispatch::{dispatch_frame, Outcome};
use crate::protocol::{codec, Feed, FrameAssembler};

const READ_BUFFER: usize = 4096;

#[derive(Debug, Clone)]
pub struct TcpServerConfig {
    pub bind: SocketAddr,
    pub max_clients: usize,
    pub sweep_interval: Duration,
}

impl Default for TcpServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            max_clients: DEFAULT_MAX_CLIENTS,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Lifecycle failures surfaced to whatever owns the server, never to a
/// connected client.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),
}

pub struct RemoteServer {
    listener: TcpListener,
    shared: Arc<Shared>,
}

/// Clonable stop/introspection handle, usable from any task.
#[derive(Clone)]
pub struct ServerHandle {
    shared: Arc<Shared>,
}

impl ServerHandle {
    /// Idempotent; releases the accept loop and every live session.
    pub fn stop(&self) {
        let _ = self.shared.stop.send(true);
    }

    pub fn active_sessions(&self) -> usize {
        self.shared.sessions.lock().unwrap().len()
    }
}

struct Shared {
    control: Arc<dyn RadioControl>,
    config: TcpServerConfig,
    sessions: Mutex<HashMap<u64, Arc<Session>>>,
    next_id: AtomicU64,
    stop: watch::Sender<bool>,
}

struct Session {
    id: u64,
    peer: SocketAddr,
    stream: Arc<TcpStream>,
    /// Permit-storing stop signal, so a notify before the task reaches its
    /// select is not lost.
    stop: Notify,
}

impl RemoteServer {
    pub async fn bind(
        config: TcpServerConfig,
        control: Arc<dyn RadioControl>,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(config.bind)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.bind,
                source,
            })?;
        let (stop, _) = watch::channel(false);
        Ok(Self {
            listener,
            shared: Arc::new(Shared {
                control,
                config,
                sessions: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                stop,
            }),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shared: self.shared.clone(),
        }
    }

    /// Accept loop. Runs until [`ServerHandle::stop`] or an accept failure;
    /// either way the listener is released and all sessions force-closed.
    pub async fn run(self) -> Result<(), ServerError> {
        info!(addr = %self.shared.config.bind, max_clients = self.shared.config.max_clients, "remote server listening");
        let sweeper = tokio::spawn(sweep_loop(self.shared.clone()));
        let mut stop_rx = self.shared.stop.subscribe();

        let result = loop {
            tokio::select! {
                _ = stop_rx.wait_for(|stopped| *stopped) => break Ok(()),
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => self.shared.admit(stream, peer),
                    Err(err) => break Err(ServerError::Accept(err)),
                },
            }
        };

        self.shared.shutdown();
        let _ = sweeper.await;
        if result.is_ok() {
            info!("remote server stopped");
        }
        result
    }
}

impl Shared {
    /// Admit below the cap, otherwise close the accepted socket immediately
    /// (the peer never sees a MOTD).
    fn admit(self: &Arc<Self>, stream: TcpStream, peer: SocketAddr) {
        let session = {
            let mut sessions = self.sessions.lock().unwrap();
            if sessions.len() >= self.config.max_clients {
                debug!(%peer, "connection rejected: client cap reached");
                return;
            }
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let session = Arc::new(Session {
                id,
                peer,
                stream: Arc::new(stream),
                stop: Notify::new(),
            });
            sessions.insert(id, session.clone());
            session
        };

        debug!(%peer, id = session.id, "client connected");
        let shared = self.clone();
        tokio::spawn(async move { shared.serve(session).await });
    }

    async fn serve(self: Arc<Self>, session: Arc<Session>) {
        if write_frame(&session.stream, codec::motd().as_bytes())
            .await
            .is_err()
        {
            self.remove(&session, "motd send failed");
            return;
        }

        let mut assembler = FrameAssembler::new();
        let mut buf = [0u8; READ_BUFFER];
        let reason = loop {
            tokio::select! {
                _ = session.stop.notified() => break "session stopped",
                ready = session.stream.readable() => {
                    if ready.is_err() {
                        break "socket error";
                    }
                    match session.stream.try_read(&mut buf) {
                        Ok(0) => break "peer closed",
                        Ok(n) => {
                            let chunk = String::from_utf8_lossy(&buf[..n]);
                            match assembler.feed(&chunk) {
                                Feed::Pending => {}
                                Feed::Overflow => break "frame overflow",
                                Feed::Frame(frame) => {
                                    // Dispatch and reply before the next read:
                                    // per-connection FIFO.
                                    match dispatch_frame(&frame, self.control.as_ref()) {
                                        Outcome::Reply(response) => {
                                            let wire = codec::encode(&response);
                                            if write_frame(&session.stream, wire.as_bytes())
                                                .await
                                                .is_err()
                                            {
                                                break "send failed";
                                            }
                                        }
                                        Outcome::Silent => {}
                                        Outcome::CloseSession => break "client requested close",
                                        Outcome::Garbage => break "unparseable frame",
                                    }
                                }
                            }
                        }
                        Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => {}
                        Err(_) => break "socket error",
                    }
                }
            }
        };

        self.remove(&session, reason);
    }

    fn remove(&self, session: &Session, reason: &str) {
        let removed = self
            .sessions
            .lock()
            .unwrap()
            .remove(&session.id)
            .is_some();
        if removed {
            debug!(peer = %session.peer, id = session.id, reason, "client removed");
        }
    }

    /// Stop signal plus force-removal of every remaining session. Idempotent.
    fn shutdown(&self) {
        let _ = self.stop.send(true);
        let drained: Vec<Arc<Session>> = {
            let mut sessions = self.sessions.lock().unwrap();
            sessions.drain().map(|(_, session)| session).collect()
        };
        for session in &drained {
            session.stop.notify_one();
        }
        if !drained.is_empty() {
            info!(count = drained.len(), "force-closed remaining sessions");
        }
    }
}

/// Periodic dead-peer reaper, independent of per-session read activity.
async fn sweep_loop(shared: Arc<Shared>) {
    let mut stop_rx = shared.stop.subscribe();
    let mut interval = tokio::time::interval(shared.config.sweep_interval);
    loop {
        tokio::select! {
            _ = stop_rx.wait_for(|stopped| *stopped) => return,
            _ = interval.tick() => {
                let dead: Vec<Arc<Session>> = {
                    let sessions = shared.sessions.lock().unwrap();
                    sessions
                        .values()
                        .filter(|session| !is_live(&session.stream))
                        .cloned()
                        .collect()
                };
                for session in dead {
                    warn!(peer = %session.peer, id = session.id, "dead peer reaped");
                    shared.sessions.lock().unwrap().remove(&session.id);
                    session.stop.notify_one();
                }
            }
        }
    }
}

/// Non-blocking closed/error probe. `None` (not ready) means no verdict,
/// which counts as live.
fn is_live(stream: &TcpStream) -> bool {
    match stream
        .ready(Interest::READABLE | Interest::WRITABLE)
        .now_or_never()
    {
        Some(Ok(ready)) => !(ready.is_read_closed() || ready.is_write_closed()),
        Some(Err(_)) => false,
        None => true,
    }
}

/// Write a whole frame through the shared stream with readiness retries.
async fn write_frame(stream: &TcpStream, mut data: &[u8]) -> io::Result<()> {
    while !data.is_empty() {
        stream.writable().await?;
        match stream.try_write(data) {
            Ok(n) => data = &data[n..],
            Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}
