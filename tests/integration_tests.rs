//! Integration tests for the shared-world server
//!
//! These tests boot a real server on an ephemeral port and talk to it over
//! WebSocket exactly like a browser or console client would.

use client::game::{ClientGameState, Notice};
use futures_util::{SinkExt, StreamExt};
use server::network::Server;
use server::ServerConfig;
use shared::{ClientEvent, ServerEvent, FLAP_IMPULSE, GRAVITY};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn start_server() -> String {
    let config = ServerConfig {
        tick_duration: Duration::from_millis(20),
        seed: Some(99),
    };
    let mut server = Server::new("127.0.0.1:0", config).await.unwrap();
    let addr = server.local_addr();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    format!("ws://{}", addr)
}

async fn connect(url: &str) -> Ws {
    let (ws, _) = timeout(WAIT, connect_async(url)).await.unwrap().unwrap();
    ws
}

async fn send(ws: &mut Ws, event: ClientEvent) {
    ws.send(Message::text(event.encode().unwrap())).await.unwrap();
}

async fn next_event(ws: &mut Ws) -> ServerEvent {
    loop {
        let message = timeout(WAIT, ws.next())
            .await
            .expect("timed out waiting for server event")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = message {
            return ServerEvent::decode(text.as_str()).unwrap();
        }
    }
}

/// Reads events until one matches, returning everything seen including the
/// match.
async fn wait_for<F>(ws: &mut Ws, predicate: F) -> Vec<ServerEvent>
where
    F: Fn(&ServerEvent) -> bool,
{
    let mut seen = Vec::new();
    loop {
        let event = next_event(ws).await;
        let done = predicate(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

fn is_user_count(event: &ServerEvent, expected: usize) -> bool {
    matches!(event, ServerEvent::UserCount(count) if *count == expected)
}

fn is_chat(event: &ServerEvent, text: &str) -> bool {
    matches!(event, ServerEvent::ChatMessage(chat) if chat.message == text)
}

mod session_tests {
    use super::*;

    /// A new connection gets the live snapshot before anything else
    #[tokio::test]
    async fn snapshot_then_user_count_on_connect() {
        let url = start_server().await;
        let mut ws = connect(&url).await;

        match next_event(&mut ws).await {
            ServerEvent::GameState(snapshot) => {
                assert_eq!(snapshot.pipes.len(), 2);
            }
            other => panic!("Expected game state first, got {:?}", other),
        }

        wait_for(&mut ws, |event| is_user_count(event, 1)).await;
    }

    /// Two joins then one leave is reflected to the remaining client
    #[tokio::test]
    async fn user_count_tracks_joins_and_leaves() {
        let url = start_server().await;

        let mut first = connect(&url).await;
        wait_for(&mut first, |event| is_user_count(event, 1)).await;

        let mut second = connect(&url).await;
        wait_for(&mut first, |event| is_user_count(event, 2)).await;
        wait_for(&mut second, |event| is_user_count(event, 2)).await;

        second.close(None).await.unwrap();
        drop(second);

        wait_for(&mut first, |event| is_user_count(event, 1)).await;
    }

    /// Dropping the TCP connection without a close frame still counts as leaving
    #[tokio::test]
    async fn abrupt_disconnect_updates_count() {
        let url = start_server().await;

        let mut first = connect(&url).await;
        wait_for(&mut first, |event| is_user_count(event, 1)).await;

        let second = connect(&url).await;
        wait_for(&mut first, |event| is_user_count(event, 2)).await;
        drop(second);

        wait_for(&mut first, |event| is_user_count(event, 1)).await;
    }
}

mod input_tests {
    use super::*;

    /// Chat is relayed to every client with the sender's generated name
    #[tokio::test]
    async fn chat_reaches_all_clients() {
        let url = start_server().await;
        let mut alice = connect(&url).await;
        let mut bob = connect(&url).await;
        wait_for(&mut alice, |event| is_user_count(event, 2)).await;

        send(&mut alice, ClientEvent::ChatMessage("hi bob".to_string())).await;

        let from_alice = wait_for(&mut alice, |event| is_chat(event, "hi bob")).await;
        let from_bob = wait_for(&mut bob, |event| is_chat(event, "hi bob")).await;

        match (from_alice.last(), from_bob.last()) {
            (Some(ServerEvent::ChatMessage(a)), Some(ServerEvent::ChatMessage(b))) => {
                assert_eq!(a, b);
                assert_eq!(a.username.split(' ').count(), 2);
            }
            other => panic!("Unexpected chat events: {:?}", other),
        }
    }

    /// The flap token changes the bird instead of appearing in chat
    #[tokio::test]
    async fn flap_is_not_relayed_as_chat() {
        let url = start_server().await;
        let mut ws = connect(&url).await;
        wait_for(&mut ws, |event| is_user_count(event, 1)).await;

        send(&mut ws, ClientEvent::Restart).await;
        send(&mut ws, ClientEvent::ChatMessage("flap".to_string())).await;

        let flapped = wait_for(&mut ws, |event| {
            matches!(event, ServerEvent::GameState(snapshot)
                if snapshot.bird.velocity == FLAP_IMPULSE + GRAVITY)
        })
        .await;

        send(&mut ws, ClientEvent::ChatMessage("after flap".to_string())).await;
        let chatted = wait_for(&mut ws, |event| is_chat(event, "after flap")).await;

        for event in flapped.iter().chain(chatted.iter()) {
            assert!(!is_chat(event, "flap"), "flap token leaked into chat");
        }
    }

    /// Non-string chat payloads are relayed as their JSON text
    #[tokio::test]
    async fn non_string_chat_is_relayed_as_text() {
        let url = start_server().await;
        let mut ws = connect(&url).await;
        wait_for(&mut ws, |event| is_user_count(event, 1)).await;

        ws.send(Message::text(r#"{"event":"chat message","data":12345}"#))
            .await
            .unwrap();
        wait_for(&mut ws, |event| is_chat(event, "12345")).await;
    }

    /// Garbage frames are dropped and the connection keeps working
    #[tokio::test]
    async fn malformed_frames_are_ignored() {
        let url = start_server().await;
        let mut ws = connect(&url).await;
        wait_for(&mut ws, |event| is_user_count(event, 1)).await;

        ws.send(Message::text("not json at all")).await.unwrap();
        ws.send(Message::text(r#"{"event":"teleport","data":[1,2]}"#))
            .await
            .unwrap();
        ws.send(Message::binary(vec![1u8, 2, 3])).await.unwrap();

        send(&mut ws, ClientEvent::ChatMessage("still here".to_string())).await;
        wait_for(&mut ws, |event| is_chat(event, "still here")).await;
    }

    /// The world freezes on death and restart brings it back for everyone
    #[tokio::test]
    async fn restart_after_crash() {
        let url = start_server().await;
        let mut ws = connect(&url).await;
        let mut watcher = connect(&url).await;

        let crashed =
            |event: &ServerEvent| matches!(event, ServerEvent::GameState(snapshot) if !snapshot.bird.alive);
        let revived = |event: &ServerEvent| {
            matches!(event, ServerEvent::GameState(snapshot)
                if snapshot.bird.alive && snapshot.score == 0)
        };

        // With no input the bird drops to the floor within a second.
        let frozen = wait_for(&mut ws, crashed).await;
        let dead_state = frozen.last().cloned();

        // Nobody restarts yet, so the next snapshot is identical.
        let next = wait_for(&mut ws, |event| matches!(event, ServerEvent::GameState(_))).await;
        assert_eq!(next.last().cloned(), dead_state);

        send(&mut ws, ClientEvent::Restart).await;

        wait_for(&mut ws, revived).await;
        wait_for(&mut watcher, crashed).await;
        wait_for(&mut watcher, revived).await;
    }
}

mod client_tests {
    use super::*;

    /// The console client's view follows the server through a crash and restart
    #[tokio::test]
    async fn client_view_tracks_round() {
        let url = start_server().await;
        let mut ws = connect(&url).await;
        let mut view = ClientGameState::new();
        let mut notices = Vec::new();

        while !notices
            .iter()
            .any(|notice| matches!(notice, Notice::Crashed { .. }))
        {
            notices.extend(view.apply(next_event(&mut ws).await));
        }
        assert_eq!(view.user_count, 1);
        assert!(notices.contains(&Notice::UserCount(1)));

        send(&mut ws, ClientEvent::Restart).await;
        while !notices.contains(&Notice::NewRound) {
            notices.extend(view.apply(next_event(&mut ws).await));
        }

        let snapshot = view.snapshot.as_ref().unwrap();
        assert!(snapshot.bird.alive);
    }
}
