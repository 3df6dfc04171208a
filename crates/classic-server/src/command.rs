//! Command interpreter seam.
//!
//! The interpreter itself is an external collaborator; the server only
//! needs something to hand `/command` lines to.

use std::net::SocketAddr;

use tracing::debug;

use crate::server::chat;
use crate::session::SessionMap;

pub trait CommandHandler {
    /// `text` is the command line with the leading `/` stripped.
    fn handle(&mut self, sessions: &mut SessionMap, sender: SocketAddr, text: &str);
}

/// Stand-in used until an interpreter is wired in: every command is
/// reported back to the sender as unknown.
pub struct UnknownCommandHandler;

impl CommandHandler for UnknownCommandHandler {
    fn handle(&mut self, sessions: &mut SessionMap, sender: SocketAddr, text: &str) {
        let command = text.split_whitespace().next().unwrap_or_default();
        debug!("No handler registered for command '{command}'");
        if let Some(session) = sessions.get_mut(&sender) {
            chat::send_system(session, &format!("Unknown command: /{command}"));
        }
    }
}
