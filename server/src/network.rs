//! Server network layer handling WebSocket connections and the tick loop
//!
//! A single `Server` value owns the world and the client roster. Connection
//! tasks never touch either directly: they forward what they read as
//! [`ServerMessage`]s, and the main loop applies those one at a time between
//! ticks. Outbound frames go through per-connection queues so a slow client
//! never holds up the loop.

use crate::client_manager::{outbound_channel, ClientManager, Outbound};
use crate::game::GameState;
use crate::ServerConfig;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{is_flap_token, ChatMessage, ClientEvent, ServerEvent};
use std::error::Error;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::{accept_async, tungstenite::Message};

pub type BoxError = Box<dyn Error + Send + Sync>;

/// How often tick diagnostics are logged.
const DIAGNOSTIC_INTERVAL_TICKS: u64 = 100;

/// Messages sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    ClientConnected {
        addr: SocketAddr,
        outbound: Outbound,
        /// Receives the ID the roster assigned to this connection.
        assigned: oneshot::Sender<u32>,
    },
    EventReceived {
        client_id: u32,
        event: ClientEvent,
    },
    ClientDisconnected {
        client_id: u32,
    },
    Shutdown,
}

/// Authoritative server: world simulation, session roster and fan-out.
pub struct Server {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    clients: ClientManager,
    game_state: GameState,
    tick_duration: Duration,
    tick: u64,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    /// Binds the listening socket and builds a fresh world
    ///
    /// Nothing is accepted until [`Server::run`] is called. Binding to port 0
    /// picks a free port, which [`Server::local_addr`] then reports.
    pub async fn new(addr: &str, config: ServerConfig) -> Result<Self, BoxError> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on {}", local_addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        // Offset the name seed so names and gaps don't share a stream.
        let name_seed = config.seed.map(|seed| seed.wrapping_add(1));

        Ok(Server {
            listener: Some(listener),
            local_addr,
            clients: ClientManager::new(name_seed),
            game_state: GameState::new(config.seed),
            tick_duration: config.tick_duration,
            tick: 0,
            server_tx,
            server_rx,
        })
    }

    /// Address the listener is bound to, including the port picked by the OS
    /// when binding to port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle for injecting messages into the loop, e.g. `Shutdown`.
    pub fn sender(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Read access to the world, mainly for tests and diagnostics.
    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    /// Number of connections currently in the roster.
    pub fn user_count(&self) -> usize {
        self.clients.len()
    }

    /// Spawns the task that accepts TCP connections
    ///
    /// The listener can only be started once. The returned handle is aborted
    /// when the loop exits, which closes the listening socket.
    fn spawn_listener(&mut self) -> Result<JoinHandle<()>, BoxError> {
        let listener = self.listener.take().ok_or("listener already started")?;
        let server_tx = self.server_tx.clone();

        let handle = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        tokio::spawn(Self::handle_connection(stream, addr, server_tx.clone()));
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });

        Ok(handle)
    }

    /// Drives one connection: handshake, registration, then reading until the
    /// peer goes away. Writing happens in a separate task fed by the
    /// connection's outbound queue.
    async fn handle_connection(
        stream: TcpStream,
        addr: SocketAddr,
        server_tx: mpsc::UnboundedSender<ServerMessage>,
    ) {
        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                warn!("WebSocket handshake failed for {}: {}", addr, e);
                return;
            }
        };

        let (mut ws_sink, mut ws_receiver) = ws_stream.split();
        let (outbound, mut outbound_rx) = outbound_channel();
        let (assigned, assigned_rx) = oneshot::channel();

        let registration = ServerMessage::ClientConnected {
            addr,
            outbound,
            assigned,
        };
        if server_tx.send(registration).is_err() {
            return;
        }
        let client_id = match assigned_rx.await {
            Ok(id) => id,
            Err(_) => return,
        };

        // Ends once the roster drops this client's sender.
        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(e) = ws_sink.send(Message::text(frame)).await {
                    debug!("Dropping connection writer for client {}: {}", client_id, e);
                    break;
                }
            }
            let _ = ws_sink.close().await;
        });

        while let Some(message) = ws_receiver.next().await {
            match message {
                Ok(Message::Text(text)) => match ClientEvent::decode(text.as_str()) {
                    Ok(event) => {
                        if server_tx
                            .send(ServerMessage::EventReceived { client_id, event })
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Ignoring malformed frame from client {}: {}", client_id, e);
                    }
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("Connection error for client {}: {}", client_id, e);
                    break;
                }
            }
        }

        let _ = server_tx.send(ServerMessage::ClientDisconnected { client_id });
    }

    fn encode(event: &ServerEvent) -> Option<String> {
        match event.encode() {
            Ok(frame) => Some(frame),
            Err(e) => {
                error!("Failed to encode event: {}", e);
                None
            }
        }
    }

    fn send_event(&self, client_id: u32, event: &ServerEvent) {
        if let Some(frame) = Self::encode(event) {
            self.clients.send_to(client_id, &frame);
        }
    }

    fn broadcast_event(&self, event: &ServerEvent) {
        if let Some(frame) = Self::encode(event) {
            self.clients.broadcast(&frame);
        }
    }

    fn broadcast_user_count(&self) {
        self.broadcast_event(&ServerEvent::UserCount(self.clients.len()));
    }

    /// Applies one message from a connection task
    ///
    /// A new connection first receives the current snapshot on its own, then
    /// everyone (the newcomer included) receives the updated user count.
    /// Disconnects only announce a count when the client was still in the
    /// roster. Returns false on shutdown.
    pub fn handle_message(&mut self, message: ServerMessage) -> bool {
        match message {
            ServerMessage::ClientConnected {
                addr,
                outbound,
                assigned,
            } => {
                let client_id = self.clients.add_client(addr, outbound);
                if assigned.send(client_id).is_err() {
                    // Connection task is already gone.
                    self.clients.remove_client(&client_id);
                    return true;
                }

                self.send_event(
                    client_id,
                    &ServerEvent::GameState(self.game_state.snapshot()),
                );
                self.broadcast_user_count();
            }
            ServerMessage::EventReceived { client_id, event } => {
                self.handle_event(client_id, event);
            }
            ServerMessage::ClientDisconnected { client_id } => {
                if self.clients.remove_client(&client_id).is_some() {
                    self.broadcast_user_count();
                }
            }
            ServerMessage::Shutdown => return false,
        }
        true
    }

    /// Routes a client event to the world or to chat
    ///
    /// Chat text that is exactly one of the flap tokens flaps the bird and is
    /// never relayed, whether or not the flap had any effect. Any other text
    /// is broadcast to everyone under the sender's display name. A restart
    /// resets the world; the next tick's snapshot is the only acknowledgement.
    pub fn handle_event(&mut self, client_id: u32, event: ClientEvent) {
        match event {
            ClientEvent::ChatMessage(text) => {
                if is_flap_token(&text) {
                    self.game_state.apply_flap();
                    return;
                }

                let Some(username) = self.clients.username(client_id) else {
                    warn!("Chat from unknown client {}", client_id);
                    return;
                };
                debug!("{}: {}", username, text);

                let chat = ServerEvent::ChatMessage(ChatMessage {
                    username: username.to_string(),
                    message: text,
                });
                self.broadcast_event(&chat);
            }
            ClientEvent::Restart => {
                info!("Client {} restarted the round", client_id);
                self.game_state.reset();
            }
        }
    }

    /// Advances the world one step and pushes the result to everyone
    ///
    /// The snapshot is broadcast even while the bird is dead, so clients keep
    /// seeing the frozen world until someone restarts.
    pub fn on_tick(&mut self) {
        self.game_state.advance();
        self.tick += 1;

        self.broadcast_event(&ServerEvent::GameState(self.game_state.snapshot()));

        if self.tick % DIAGNOSTIC_INTERVAL_TICKS == 0 {
            debug!(
                "Tick {}: {} clients, score {}, alive {}",
                self.tick,
                self.clients.len(),
                self.game_state.score,
                self.game_state.bird.alive
            );
        }
    }

    /// Main server loop. Ticks and client messages are handled strictly one
    /// after another, never concurrently.
    pub async fn run(&mut self) -> Result<(), BoxError> {
        let accept_task = self.spawn_listener()?;

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Server started, ticking every {}ms",
            self.tick_duration.as_millis()
        );

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(message) => {
                            if !self.handle_message(message) {
                                info!("Server shutting down");
                                break;
                            }
                        }
                        None => break,
                    }
                },

                _ = tick_interval.tick() => {
                    self.on_tick();
                },
            }
        }

        accept_task.abort();
        let _ = accept_task.await;

        // Dropping queued registrations releases connection tasks still
        // waiting for an ID.
        self.server_rx.close();
        while self.server_rx.try_recv().is_ok() {}

        Ok(())
    }
}
