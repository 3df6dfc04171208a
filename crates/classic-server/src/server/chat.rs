//! Chat: color escapes, line wrapping, and message routing.

use std::time::Duration;

use tracing::info;

use classic_proto::codec::STRING_LEN;
use classic_proto::packets::{user_type, ChatMessage};

use crate::session::{ClientSession, SessionMap};

use super::Server;

/// How long a command mutes its sender; absorbs the multiple lines some
/// clients send per command.
const COMMAND_MUTE: Duration = Duration::from_millis(1000);

/// Rewrite `%X` color escapes to vanilla `&X` for X in [0-9a-f]. A
/// trailing `%` is left alone.
pub fn rewrite_color_codes(text: &str) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    for i in 0..chars.len().saturating_sub(1) {
        if chars[i] == '%' && matches!(chars[i + 1], '0'..='9' | 'a'..='f') {
            chars[i] = '&';
        }
    }
    chars.into_iter().collect()
}

/// Split a line into 64-byte wire strings. A color active at a break is
/// not carried onto the next line.
pub fn wrap_message(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if current.len() + ch.len_utf8() > STRING_LEN {
            lines.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Queue one line on a session, wrapped.
pub fn send_wrapped(session: &mut ClientSession, text: &str) {
    for line in wrap_message(text) {
        session.enqueue(&ChatMessage::server(line));
    }
}

pub fn send_system(session: &mut ClientSession, text: &str) {
    send_wrapped(session, &format!("&e[SYSTEM]: {text}"));
}

/// Queue one line on every connected session.
pub fn broadcast(sessions: &mut SessionMap, text: &str) {
    for session in sessions.values_mut() {
        send_wrapped(session, text);
    }
}

impl Server {
    /// Route an inbound chat line: muted senders are dropped, `/` lines go
    /// to the command handler, everything else is broadcast with the
    /// speaker's colored name.
    pub(super) fn handle_message(&mut self, addr: std::net::SocketAddr, text: &str) {
        if text.is_empty() {
            return;
        }
        let Some(session) = self.sessions.get_mut(&addr) else {
            return;
        };
        let name = session.chat_name().to_string();
        let is_operator = session.user_type == user_type::OPERATOR;
        if session.is_chat_muted() {
            info!("[Muted ({name})] {text}");
            return;
        }

        if let Some(stripped) = text.strip_prefix('/') {
            info!("[Command ({name})] {text}");
            session.set_chat_mute(COMMAND_MUTE);

            // Bare "/" (or "/ 2") means the help menu.
            let command = if stripped.is_empty() || stripped.starts_with(' ') {
                format!("help{stripped}")
            } else {
                stripped.to_string()
            };
            if let Some(mut handler) = self.command_handler.take() {
                handler.handle(&mut self.sessions, addr, &command);
                self.command_handler = Some(handler);
            }
        } else {
            // Logged before color rewriting touches it.
            info!("[BROADCAST] {name}: {text}");
            let prefix = if is_operator { "&e" } else { "&7" };
            let line = rewrite_color_codes(&format!("{prefix}{name}&f: {text}"));
            broadcast(&mut self.sessions, &line);
        }
    }
}
