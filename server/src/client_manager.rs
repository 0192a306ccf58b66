//! Connected-session bookkeeping for the shared world
//!
//! This module tracks everyone currently attached to the server:
//! - Connection lifecycle (connect, disconnect)
//! - Generated display names used to label chat lines
//! - The outbound queue of each connection, used for targeted sends and fan-out
//!
//! The live user count is never stored separately; it is always the number of
//! entries in the roster.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Frames a connection may have waiting before new ones are dropped.
///
/// At 20 ticks per second this is a little over three seconds of snapshots.
pub const OUTBOUND_CAPACITY: usize = 64;

/// Queue of encoded frames waiting to be written to one connection.
pub type Outbound = mpsc::Sender<String>;

/// Creates the bounded outbound queue for one connection.
pub fn outbound_channel() -> (Outbound, mpsc::Receiver<String>) {
    mpsc::channel(OUTBOUND_CAPACITY)
}

pub const ADJECTIVES: [&str; 16] = [
    "Speedy", "Fluffy", "Mighty", "Clever", "Bouncy", "Silly", "Happy", "Jolly", "Swift",
    "Soaring", "Graceful", "Feathered", "Gliding", "Nimble", "Majestic", "Aerial",
];

pub const BIRDS: [&str; 16] = [
    "Falcon", "Chicken", "Owl", "Penguin", "Finch", "Emu", "Duck", "Goose", "Sparrow", "Eagle",
    "Hawk", "Dove", "Raven", "Heron", "Cardinal", "Pigeon",
];

/// Builds a display name like "Swift Heron".
///
/// Names are not deduplicated; two sessions may end up with the same one.
pub fn generate_username<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
    let bird = BIRDS[rng.gen_range(0..BIRDS.len())];
    format!("{} {}", adjective, bird)
}

/// One live connection.
#[derive(Debug)]
pub struct Client {
    /// Unique client identifier assigned by the server
    pub id: u32,
    /// Remote address, for logs only
    pub addr: SocketAddr,
    /// Display name, fixed for the lifetime of the connection
    pub username: String,
    outbound: Outbound,
}

impl Client {
    /// Creates a roster entry for a freshly accepted connection
    ///
    /// The outbound sender is the only link to the connection's writer task.
    /// Dropping the client drops the sender, which lets that task finish.
    pub fn new(id: u32, addr: SocketAddr, username: String, outbound: Outbound) -> Self {
        Self {
            id,
            addr,
            username,
            outbound,
        }
    }

    /// Queues a frame for this connection without waiting
    ///
    /// Returns false if the frame was dropped, either because the writer has
    /// already gone away or because the queue is full. A full queue means the
    /// peer has stopped reading; its backlog stays capped at
    /// [`OUTBOUND_CAPACITY`] frames and it simply misses what comes after.
    pub fn send(&self, frame: &str) -> bool {
        match self.outbound.try_send(frame.to_string()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Outbound queue full for client {}, dropping frame", self.id);
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Skipping closed connection for client {}", self.id);
                false
            }
        }
    }
}

/// Roster of connected clients
///
/// Owned by the server loop and never shared, so every change to the roster
/// happens in the same order every client sees it. Client IDs count up from 1
/// and are never reused within a process.
pub struct ClientManager {
    /// Connected clients indexed by their unique ID
    clients: HashMap<u32, Client>,
    /// Next available client ID for new connections
    next_client_id: u32,
    rng: StdRng,
}

impl ClientManager {
    /// Creates an empty roster. A seed makes generated names reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            rng,
        }
    }

    /// Registers a new connection and returns its assigned ID
    ///
    /// A display name is drawn for the client here and kept until it
    /// disconnects. Announcing the new count is left to the caller.
    pub fn add_client(&mut self, addr: SocketAddr, outbound: Outbound) -> u32 {
        let client_id = self.next_client_id;
        self.next_client_id += 1;

        let username = generate_username(&mut self.rng);
        info!("Client {} ({}) connected from {}", client_id, username, addr);

        self.clients
            .insert(client_id, Client::new(client_id, addr, username, outbound));
        client_id
    }

    /// Removes a connection. Dropping the returned client closes its outbound
    /// queue, which ends the connection's writer.
    pub fn remove_client(&mut self, client_id: &u32) -> Option<Client> {
        let client = self.clients.remove(client_id)?;
        info!("Client {} ({}) disconnected", client.id, client.username);
        Some(client)
    }

    /// Looks up the display name of a connected client
    ///
    /// Returns None once the client has been removed, which can happen when
    /// a chat line races with its sender's disconnect.
    pub fn username(&self, client_id: u32) -> Option<&str> {
        self.clients
            .get(&client_id)
            .map(|client| client.username.as_str())
    }

    /// Sends a frame to a single client. Returns false if the client is
    /// unknown or its connection is gone.
    pub fn send_to(&self, client_id: u32, frame: &str) -> bool {
        self.clients
            .get(&client_id)
            .map(|client| client.send(frame))
            .unwrap_or(false)
    }

    /// Queues a frame for every connected client and returns how many queues
    /// accepted it
    ///
    /// Never waits on any connection. Dead or stalled connections miss the
    /// frame without affecting delivery to the rest.
    pub fn broadcast(&self, frame: &str) -> usize {
        self.clients
            .values()
            .filter(|client| client.send(frame))
            .count()
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
