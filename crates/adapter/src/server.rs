//! TCP server for the adapter
//!
//! Handles incoming connections and manages client lifecycle. Every connected
//! client may send commands; replies go to the sender, engine events are
//! broadcast to everyone.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::protocol::{create_error, parse_message, ErrorCode, ServerMessage};
use crate::runtime::{run_engine, InboundCommand, OutboundMessage};

pub const HOST_ENV: &str = "CRATE_DIGGER_HOST";
pub const PORT_ENV: &str = "CRATE_DIGGER_PORT";
pub const MAX_PENDING_ENV: &str = "CRATE_DIGGER_MAX_PENDING";
pub const TICK_MS_ENV: &str = "CRATE_DIGGER_TICK_MS";
pub const DISABLED_ENV: &str = "CRATE_DIGGER_ADAPTER_DISABLED";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_pending_commands: usize,
    /// Scheduler tick driving timers.
    pub tick_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            max_pending_commands: 16,
            tick_ms: 50,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables, falling back to defaults per field.
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var(HOST_ENV).unwrap_or(defaults.host);
        let port = env::var(PORT_ENV)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);
        let max_pending_commands = env::var(MAX_PENDING_ENV)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_pending_commands);
        let tick_ms = env::var(TICK_MS_ENV)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.tick_ms);

        Self {
            host,
            port,
            max_pending_commands,
            tick_ms,
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid socket address {}:{}", self.host, self.port))
    }

    /// Check if the adapter is disabled via environment
    pub fn is_disabled() -> bool {
        std::env::var(DISABLED_ENV)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }
}

/// Handle to a connected client
struct ClientHandle {
    id: usize,
    last_seq: Option<u64>,
    tx: mpsc::UnboundedSender<ServerMessage>,
}

#[derive(Default)]
struct ServerState {
    clients: RwLock<Vec<ClientHandle>>,
}

impl ServerState {
    async fn send_to(&self, client_id: usize, msg: ServerMessage) {
        let clients = self.clients.read().await;
        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
            let _ = c.tx.send(msg);
        }
    }

    async fn broadcast(&self, msg: ServerMessage) {
        let clients = self.clients.read().await;
        for c in clients.iter() {
            let _ = c.tx.send(msg.clone());
        }
    }

    /// Enforce strictly increasing `seq` per client.
    async fn check_and_update_seq(&self, client_id: usize, seq: u64) -> bool {
        let mut clients = self.clients.write().await;
        let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
            return true;
        };
        match client.last_seq {
            Some(prev) if seq <= prev => false,
            _ => {
                client.last_seq = Some(seq);
                true
            }
        }
    }

    async fn remove(&self, client_id: usize) {
        self.clients.write().await.retain(|c| c.id != client_id);
    }
}

/// Run the engine task and the TCP server until the listener fails.
pub async fn serve(
    config: ServerConfig,
    engine: Engine,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(config.max_pending_commands.max(1));
    let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let tick = Duration::from_millis(config.tick_ms);

    tokio::spawn(run_engine(engine, cmd_rx, out_tx, tick));
    run_server(config, cmd_tx, out_rx, ready_tx).await
}

/// Start the TCP server
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let bound = listener.local_addr()?;
    info!(%bound, "adapter listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::default());

    // Outbound dispatcher.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                match msg {
                    OutboundMessage::ToClient { client_id, msg } => state.send_to(client_id, msg).await,
                    OutboundMessage::Broadcast { msg } => state.broadcast(msg).await,
                }
            }
        });
    }

    let mut client_id_counter = 0usize;
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;
        info!(client_id, %addr, "client connected");

        let state = Arc::clone(&state);
        let command_tx = command_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, client_id, Arc::clone(&state), command_tx).await {
                warn!(client_id, error = %e, "client error");
            }
            state.remove(client_id).await;
            info!(client_id, "client disconnected");
        });
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    client_id: usize,
    state: Arc<ServerState>,
    command_tx: mpsc::Sender<InboundCommand>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    state.clients.write().await.push(ClientHandle {
        id: client_id,
        last_seq: None,
        tx: tx.clone(),
    });

    let write_task = tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        while let Some(msg) = rx.recv().await {
            buf.clear();
            if serde_json::to_writer(&mut buf, &msg).is_err() {
                continue;
            }
            buf.push(b'\n');
            if writer.write_all(&buf).await.is_err() || writer.flush().await.is_err() {
                break;
            }
        }
    });

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let message = match parse_message(trimmed) {
            Ok(m) => m,
            Err(f) => {
                debug!(client_id, seq = f.seq, "unparseable line");
                let _ = tx.send(create_error(f.seq, f.code.as_str(), f.message));
                continue;
            }
        };

        let seq = message.seq();
        if !state.check_and_update_seq(client_id, seq).await {
            let _ = tx.send(create_error(
                seq,
                ErrorCode::InvalidSeq.as_str(),
                "seq must be strictly increasing",
            ));
            continue;
        }

        // Backpressure: bounded queue. Replies come from the engine task.
        if command_tx
            .try_send(InboundCommand { client_id, message })
            .is_err()
        {
            let _ = tx.send(create_error(
                seq,
                ErrorCode::Backpressure.as_str(),
                "command queue is full",
            ));
        }
    }

    drop(tx);
    state.remove(client_id).await;
    let _ = write_task.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.port, 7878);
        assert_eq!(c.max_pending_commands, 16);
        assert_eq!(c.tick_ms, 50);
        assert_eq!(c.socket_addr().unwrap().to_string(), "127.0.0.1:7878");
    }

    #[test]
    fn bad_host_is_an_error() {
        let c = ServerConfig {
            host: "not a host".into(),
            ..Default::default()
        };
        assert!(c.socket_addr().is_err());
    }
}
