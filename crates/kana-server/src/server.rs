//! Session channel server and shared state.

use crate::authority::TimerRegistry;
use crate::config::ServerConfig;
use crate::protocol::scoreboard_location;
use crate::session::{GameSession, SessionOutcome};
use crate::store::ScoreStore;
use dashmap::{DashMap, DashSet};
use futures_util::{SinkExt, StreamExt};
use kana_core::{ClientEvent, ServerEvent};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Server state shared by the HTTP routes and every channel connection.
pub struct ServerState {
    pub config: ServerConfig,
    /// Game record per open connection
    pub sessions: DashMap<Uuid, GameSession>,
    /// Outbound queue per open connection
    pub senders: DashMap<Uuid, mpsc::UnboundedSender<ServerEvent>>,
    pub timers: TimerRegistry,
    pub store: Arc<dyn ScoreStore>,
    /// Issued, not yet used anti-forgery tokens
    pub csrf_tokens: DashSet<String>,
}

impl ServerState {
    pub fn new(config: ServerConfig, store: Arc<dyn ScoreStore>) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
            senders: DashMap::new(),
            timers: TimerRegistry::new(),
            store,
            csrf_tokens: DashSet::new(),
        }
    }

    /// Register a connection and its outbound queue
    pub fn open_session(&self, conn_id: Uuid, sender: mpsc::UnboundedSender<ServerEvent>) {
        self.sessions
            .insert(conn_id, GameSession::new(conn_id, self.config.pairs_needed));
        self.senders.insert(conn_id, sender);
    }

    /// Send a message to one connection.
    pub fn send_to(&self, conn_id: Uuid, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&conn_id) {
            let _ = sender.send(event);
        }
    }

    /// Hand out a single-use anti-forgery token
    pub fn issue_csrf_token(&self) -> String {
        let token = Uuid::new_v4().to_string();
        self.csrf_tokens.insert(token.clone());
        token
    }

    /// Consume a token; false if it was never issued or already used
    pub fn redeem_csrf_token(&self, token: &str) -> bool {
        self.csrf_tokens.remove(token).is_some()
    }
}

/// Run the session channel server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Session channel listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let conn_id = Uuid::new_v4();
    info!("New session {} from {}", conn_id, addr);

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    state.open_session(conn_id, tx);

    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event.encode() {
                Ok(text) => {
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("Could not encode {:?}: {}", event, e),
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => handle_message(conn_id, &text, &state),
            Ok(Message::Close(_)) => {
                debug!("Session {} closing connection", conn_id);
                break;
            }
            Ok(Message::Ping(_)) => debug!("Ping from {}", conn_id),
            Err(e) => {
                error!("WebSocket error from {}: {}", conn_id, e);
                break;
            }
            _ => {}
        }
    }

    handle_disconnect(conn_id, &state);
    send_task.abort();

    info!("Connection closed for {}", conn_id);
    Ok(())
}

/// Record one channel message against the connection's game.
pub fn handle_message(conn_id: Uuid, text: &str, state: &ServerState) {
    let event = match ClientEvent::decode(text) {
        Ok(event) => event,
        Err(e) => {
            warn!("Invalid message from {}: {} ({})", conn_id, text, e);
            return;
        }
    };

    let outcome = match state.sessions.get_mut(&conn_id) {
        Some(mut session) => session.record(event),
        None => {
            warn!("Message for unknown session {}", conn_id);
            return;
        }
    };

    match outcome {
        Ok(SessionOutcome::Recorded) => {}
        Ok(SessionOutcome::Finished { duration }) => match state.store.insert(duration) {
            Ok(player) => {
                info!("Session {} finished as {} in {:?}", conn_id, player, duration);
                state.send_to(
                    conn_id,
                    ServerEvent::GameOver {
                        redirect: scoreboard_location(&player),
                    },
                );
            }
            Err(e) => {
                error!("Could not store result for {}: {}", conn_id, e);
                state.send_to(
                    conn_id,
                    ServerEvent::Error {
                        message: e.to_string(),
                    },
                );
            }
        },
        Err(e) => {
            warn!("Rejected message from {}: {}", conn_id, e);
            state.send_to(
                conn_id,
                ServerEvent::Error {
                    message: e.to_string(),
                },
            );
        }
    }
}

/// Drop a connection's game and queue.
fn handle_disconnect(conn_id: Uuid, state: &ServerState) {
    state.senders.remove(&conn_id);
    if let Some((_, session)) = state.sessions.remove(&conn_id) {
        if session.is_started() && !session.is_finished() {
            info!(
                "Session {} abandoned after {} pairs",
                conn_id,
                session.pairs().len()
            );
        }
    }
}
