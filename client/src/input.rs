//! Turns typed console lines into client events

use shared::ClientEvent;

/// What a line of user input asks the client to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Send(ClientEvent),
    Quit,
}

/// Parses one line from stdin.
///
/// An empty line or `/flap` flaps, `/restart` restarts the round, `/quit`
/// leaves. Anything else is sent verbatim as chat, so typing one of the flap
/// tokens by hand also flaps.
pub fn parse_line(line: &str) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);

    match line.trim() {
        "" | "/flap" => Command::Send(ClientEvent::ChatMessage("flap".to_string())),
        "/restart" => Command::Send(ClientEvent::Restart),
        "/quit" => Command::Quit,
        _ => Command::Send(ClientEvent::ChatMessage(line.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(text: &str) -> Command {
        Command::Send(ClientEvent::ChatMessage(text.to_string()))
    }

    #[test]
    fn test_empty_line_flaps() {
        assert_eq!(parse_line(""), chat("flap"));
        assert_eq!(parse_line("   \n"), chat("flap"));
    }

    #[test]
    fn test_slash_commands() {
        assert_eq!(parse_line("/flap"), chat("flap"));
        assert_eq!(parse_line("/restart\n"), Command::Send(ClientEvent::Restart));
        assert_eq!(parse_line("/quit"), Command::Quit);
    }

    #[test]
    fn test_plain_text_is_chat() {
        assert_eq!(parse_line("hello there\r\n"), chat("hello there"));
        assert_eq!(parse_line("up"), chat("up"));
    }

    #[test]
    fn test_chat_keeps_inner_whitespace() {
        assert_eq!(parse_line("  spaced  out"), chat("  spaced  out"));
    }
}
