use crate::game::ClientGameState;
use crate::input::{parse_line, Command};
use futures_util::{SinkExt, StreamExt};
use log::{info, warn};
use shared::ServerEvent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::Message};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Console client: prints what happens in the shared world and sends what the
/// user types.
pub struct Client {
    server_url: String,
    game_state: ClientGameState,
}

impl Client {
    /// Creates a client for the given `ws://` URL
    ///
    /// No connection is made until [`Client::run`]; the local view starts
    /// empty and fills in with the first snapshot the server sends.
    pub fn new(server_url: &str) -> Self {
        Self {
            server_url: server_url.to_string(),
            game_state: ClientGameState::new(),
        }
    }

    pub fn game_state(&self) -> &ClientGameState {
        &self.game_state
    }

    fn handle_frame(&mut self, text: &str) {
        match ServerEvent::decode(text) {
            Ok(event) => {
                for notice in self.game_state.apply(event) {
                    println!("{}", notice);
                }
            }
            Err(e) => warn!("Ignoring malformed frame from server: {}", e),
        }
    }

    pub async fn run(&mut self) -> Result<(), BoxError> {
        info!("Connecting to {}...", self.server_url);
        let (ws_stream, _) = connect_async(self.server_url.as_str()).await?;
        info!("Connected");

        let (mut ws_sink, mut ws_receiver) = ws_stream.split();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                message = ws_receiver.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => self.handle_frame(text.as_str()),
                        Some(Ok(Message::Close(_))) | None => {
                            info!("Server closed the connection");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                    }
                },

                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match parse_line(&line) {
                        Command::Send(event) => {
                            ws_sink.send(Message::text(event.encode()?)).await?;
                        }
                        Command::Quit => break,
                    }
                },
            }
        }

        info!("{}", self.game_state.status_line());
        let _ = ws_sink.close().await;
        Ok(())
    }
}
