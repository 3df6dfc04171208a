//! The auth gate.
//!
//! Applied to the first framed packet of every connection. Key
//! verification is skipped for loopback and same-/24 peers, mirroring the
//! listing service's behavior of handing local players no usable key.

use std::net::{IpAddr, SocketAddr};

use serde_json::json;
use tracing::{debug, info, warn};

use classic_plugin_api::{EventType, NO_DEFAULT_CALL};
use classic_proto::packets::{user_type, Auth, ServerInfo, PROTOCOL_VERSION};

use super::{chat, Server, DEFAULT_WORLD};

impl Server {
    pub(super) fn handle_auth(&mut self, addr: SocketAddr, auth: Auth) {
        let Auth { name, key, .. } = auth;

        if self.config.server.verify_names {
            let Some((peer_ip, local_ip)) = self
                .sessions
                .get(&addr)
                .map(|s| (s.peer_addr().ip(), s.local_addr().map(|a| a.ip())))
            else {
                return;
            };
            if is_local_peer(peer_ip, local_ip) {
                info!("Bypassing name verification for local player {name}");
            } else if !verify_key(&self.salt, &name, &key) {
                debug!("Refusing player {name} (sent invalid key)");
                self.kick(addr, "Invalid key");
                return;
            }
        }

        self.events
            .trigger(EventType::Auth, Some(addr), &json!({ "name": name, "key": key }));
        if self.events.flag(NO_DEFAULT_CALL) {
            return;
        }

        let ghost = self.find_authed_by_name(&name);
        if let Some(ghost_addr) = ghost {
            self.kick(ghost_addr, "Logged in from somewhere else");
        }

        // A replaced ghost is still counted until the reap, so it exempts
        // its replacement from the cap.
        if self.num_authed >= self.config.server.max_users && ghost.is_none() {
            debug!("Refusing player {name} (server is full)");
            self.kick(addr, "Server is full");
            return;
        }

        if !self.worlds.contains_key(DEFAULT_WORLD) {
            warn!("No world named '{DEFAULT_WORLD}' exists; refusing {name}");
            self.kick(addr, "Internal error: no default world");
            return;
        }

        let user_type = if self.operators.is_operator(&name) {
            user_type::OPERATOR
        } else {
            user_type::NORMAL
        };

        {
            let Some(session) = self.sessions.get_mut(&addr) else {
                return;
            };
            session.name = name.clone();
            session.authed = true;
            session.user_type = user_type;
        }
        self.num_authed += 1;

        if user_type == user_type::OPERATOR {
            info!("Operator {name} ({addr}) authenticated");
        } else {
            info!("Player {name} ({addr}) authenticated");
        }
        chat::broadcast(&mut self.sessions, &format!("&e{name} joined the game"));

        let server_info = ServerInfo {
            protocol_version: PROTOCOL_VERSION,
            name: self.config.server.name.clone(),
            motd: self.config.server.motd.clone(),
            user_type,
        };
        if let Some(session) = self.sessions.get_mut(&addr) {
            session.enqueue(&server_info);
        }

        let joined = self
            .worlds
            .get_mut(DEFAULT_WORLD)
            .and_then(|world| world.add_client(addr, &mut self.sessions))
            .is_some();
        if !joined {
            self.kick(addr, "Server is full");
            return;
        }

        if let Some(session) = self.sessions.get_mut(&addr) {
            chat::send_wrapped(
                session,
                &format!("&eWelcome to {}!", self.config.server.name),
            );
            chat::send_wrapped(session, "&eType /help for a list of commands.");
        }
    }

    /// Case-insensitive lookup among authenticated sessions.
    pub(super) fn find_authed_by_name(&self, name: &str) -> Option<SocketAddr> {
        self.sessions
            .iter()
            .find(|(_, session)| session.authed && session.name.eq_ignore_ascii_case(name))
            .map(|(addr, _)| *addr)
    }
}

/// Lowercase hex MD5 of salt ∥ name must equal the presented key.
fn verify_key(salt: &str, name: &str, key: &str) -> bool {
    let digest = md5::compute(format!("{salt}{name}"));
    format!("{digest:x}") == key
}

/// Loopback, or on the same /24 as the accepting interface.
fn is_local_peer(peer: IpAddr, local: Option<IpAddr>) -> bool {
    if peer.is_loopback() {
        return true;
    }
    match (peer, local) {
        (IpAddr::V4(peer), Some(IpAddr::V4(local))) => peer.octets()[..3] == local.octets()[..3],
        _ => false,
    }
}
