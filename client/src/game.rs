//! Client-side view of the shared world
//!
//! The client never simulates. It keeps the last snapshot and user count the
//! server sent and reports what changed so the console can print it.

use shared::{is_flap_token, GameSnapshot, ServerEvent};
use std::fmt;

/// Something worth telling the player about.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Chat { username: String, message: String },
    UserCount(usize),
    Score(u32),
    Crashed { score: u32 },
    NewRound,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Chat { username, message } => write!(f, "{}: {}", username, message),
            Notice::UserCount(count) => write!(f, "Users online: {}", count),
            Notice::Score(score) => write!(f, "SCORE: {}", score),
            Notice::Crashed { score } => {
                write!(f, "Game over! Final score {}. Type /restart to play again", score)
            }
            Notice::NewRound => write!(f, "New round started"),
        }
    }
}

/// Local view of the shared world, rebuilt from server events
///
/// The client never simulates anything itself. It only remembers the last
/// snapshot and user count so it can spot crashes, new rounds and score
/// changes between consecutive snapshots.
#[derive(Debug, Default)]
pub struct ClientGameState {
    pub snapshot: Option<GameSnapshot>,
    pub user_count: usize,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a server event into the local view and returns the notices it
    /// produced.
    pub fn apply(&mut self, event: ServerEvent) -> Vec<Notice> {
        match event {
            ServerEvent::GameState(snapshot) => self.apply_snapshot(snapshot),
            ServerEvent::UserCount(count) => {
                self.user_count = count;
                vec![Notice::UserCount(count)]
            }
            // Older servers echoed flap tokens as chat.
            ServerEvent::ChatMessage(chat) if is_flap_token(&chat.message) => Vec::new(),
            ServerEvent::ChatMessage(chat) => vec![Notice::Chat {
                username: chat.username,
                message: chat.message,
            }],
        }
    }

    fn apply_snapshot(&mut self, snapshot: GameSnapshot) -> Vec<Notice> {
        let mut notices = Vec::new();

        match &self.snapshot {
            Some(previous) => {
                if !previous.bird.alive && snapshot.bird.alive {
                    notices.push(Notice::NewRound);
                } else if snapshot.score > previous.score {
                    notices.push(Notice::Score(snapshot.score));
                }
                if previous.bird.alive && !snapshot.bird.alive {
                    notices.push(Notice::Crashed {
                        score: snapshot.score,
                    });
                }
            }
            None if !snapshot.bird.alive => notices.push(Notice::Crashed {
                score: snapshot.score,
            }),
            None => {}
        }

        self.snapshot = Some(snapshot);
        notices
    }

    /// One-line textual summary of the current world.
    pub fn status_line(&self) -> String {
        match &self.snapshot {
            Some(snapshot) => format!(
                "score {} | bird y {:.0} | {} | {} online",
                snapshot.score,
                snapshot.bird.y,
                if snapshot.bird.alive { "flying" } else { "crashed" },
                self.user_count
            ),
            None => format!("waiting for game state | {} online", self.user_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Bird, ChatMessage, Pipe};

    fn snapshot(score: u32, alive: bool) -> GameSnapshot {
        GameSnapshot {
            bird: Bird {
                alive,
                ..Bird::new()
            },
            pipes: vec![Pipe::new(400.0, 150.0), Pipe::new(600.0, 200.0)],
            score,
        }
    }

    fn chat(username: &str, message: &str) -> ServerEvent {
        ServerEvent::ChatMessage(ChatMessage {
            username: username.to_string(),
            message: message.to_string(),
        })
    }

    #[test]
    fn test_initial_state() {
        let state = ClientGameState::new();
        assert!(state.snapshot.is_none());
        assert_eq!(state.user_count, 0);
        assert_eq!(state.status_line(), "waiting for game state | 0 online");
    }

    #[test]
    fn test_first_snapshot_is_quiet() {
        let mut state = ClientGameState::new();
        assert!(state.apply(ServerEvent::GameState(snapshot(0, true))).is_empty());
        assert!(state.snapshot.is_some());
    }

    #[test]
    fn test_joining_a_dead_world_reports_crash() {
        let mut state = ClientGameState::new();
        let notices = state.apply(ServerEvent::GameState(snapshot(3, false)));
        assert_eq!(notices, vec![Notice::Crashed { score: 3 }]);
    }

    #[test]
    fn test_score_and_crash_notices() {
        let mut state = ClientGameState::new();
        state.apply(ServerEvent::GameState(snapshot(0, true)));

        assert_eq!(
            state.apply(ServerEvent::GameState(snapshot(1, true))),
            vec![Notice::Score(1)]
        );
        assert!(state.apply(ServerEvent::GameState(snapshot(1, true))).is_empty());
        assert_eq!(
            state.apply(ServerEvent::GameState(snapshot(1, false))),
            vec![Notice::Crashed { score: 1 }]
        );
        assert!(state.apply(ServerEvent::GameState(snapshot(1, false))).is_empty());
        assert_eq!(
            state.apply(ServerEvent::GameState(snapshot(0, true))),
            vec![Notice::NewRound]
        );
    }

    #[test]
    fn test_user_count() {
        let mut state = ClientGameState::new();
        assert_eq!(
            state.apply(ServerEvent::UserCount(4)),
            vec![Notice::UserCount(4)]
        );
        assert_eq!(state.user_count, 4);
    }

    #[test]
    fn test_chat_filters_flap_token() {
        let mut state = ClientGameState::new();
        assert!(state.apply(chat("Happy Duck", "flap")).is_empty());

        let notices = state.apply(chat("Happy Duck", "hi all"));
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].to_string(), "Happy Duck: hi all");
    }

    #[test]
    fn test_status_line() {
        let mut state = ClientGameState::new();
        state.apply(ServerEvent::UserCount(2));
        state.apply(ServerEvent::GameState(snapshot(5, true)));
        assert_eq!(state.status_line(), "score 5 | bird y 200 | flying | 2 online");
    }

    #[test]
    fn test_notice_display() {
        assert_eq!(Notice::UserCount(3).to_string(), "Users online: 3");
        assert_eq!(Notice::Score(7).to_string(), "SCORE: 7");
    }
}
