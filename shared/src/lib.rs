use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const WORLD_WIDTH: f32 = 400.0;
pub const WORLD_HEIGHT: f32 = 400.0;

pub const BIRD_X: f32 = 50.0;
pub const BIRD_SPAWN_Y: f32 = WORLD_HEIGHT * 0.5;
pub const BIRD_WIDTH: f32 = 20.0;
pub const BIRD_HEIGHT: f32 = 20.0;

pub const GRAVITY: f32 = 1.5;
pub const FLAP_IMPULSE: f32 = -10.0;

pub const PIPE_SPEED: f32 = 5.0;
pub const PIPE_WIDTH: f32 = 50.0;
pub const PIPE_COUNT: usize = 2;
pub const PIPE_SPAWN_X: [f32; PIPE_COUNT] = [400.0, 600.0];
pub const GAP_HEIGHT: f32 = 100.0;
pub const GAP_MIN: f32 = 100.0;
pub const GAP_RANGE: f32 = 150.0;

/// Chat inputs that make the bird flap instead of being relayed.
pub const FLAP_TOKENS: [&str; 3] = ["flap", "up", "u"];

pub fn is_flap_token(text: &str) -> bool {
    FLAP_TOKENS.contains(&text)
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Bird {
    pub x: f32,
    pub y: f32,
    /// Display-only; clients never write it back.
    pub velocity: f32,
    pub alive: bool,
}

impl Bird {
    /// Creates a live bird at the spawn pose with no vertical velocity
    pub fn new() -> Self {
        Self {
            x: BIRD_X,
            y: BIRD_SPAWN_Y,
            velocity: 0.0,
            alive: true,
        }
    }

    /// Returns the bird's bounding box as (left, top, right, bottom)
    ///
    /// Y grows downward, so `top` is the smaller value.
    pub fn get_bounds(&self) -> (f32, f32, f32, f32) {
        (self.x, self.y, self.x + BIRD_WIDTH, self.y + BIRD_HEIGHT)
    }
}

impl Default for Bird {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pipe {
    pub x: f32,
    /// Vertical center of the opening.
    pub gap_y: f32,
}

impl Pipe {
    pub fn new(x: f32, gap_y: f32) -> Self {
        Self { x, gap_y }
    }

    /// Upper edge of the opening; the top pipe section ends here.
    pub fn gap_top(&self) -> f32 {
        self.gap_y - GAP_HEIGHT / 2.0
    }

    pub fn gap_bottom(&self) -> f32 {
        self.gap_y + GAP_HEIGHT / 2.0
    }
}

/// Full world state as sent over the wire.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GameSnapshot {
    pub bird: Bird,
    pub pipes: Vec<Pipe>,
    pub score: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub username: String,
    pub message: String,
}

/// Events pushed from the server, either to one connection or to all of them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "game state")]
    GameState(GameSnapshot),
    #[serde(rename = "user count")]
    UserCount(usize),
    #[serde(rename = "chat message")]
    ChatMessage(ChatMessage),
}

impl ServerEvent {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Events sent by a client.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "chat message")]
    ChatMessage(#[serde(deserialize_with = "opaque_text")] String),
    #[serde(rename = "restart")]
    Restart,
}

impl ClientEvent {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

// Chat payloads are relayed as-is: strings verbatim, anything else as its JSON text.
fn opaque_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        other => other.to_string(),
    })
}
