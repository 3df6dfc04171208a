//! The server loop: accept, poll, dispatch, reap.
//!
//! One task owns every session, world, and the event bus; socket I/O
//! inside the tick is non-blocking, so nothing here stalls the loop for
//! longer than a single syscall.

mod auth;
pub mod chat;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::{Duration, Instant};

use bytes::Buf;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use classic_plugin_api::{EventBus, EventType};
use classic_proto::error::ProtoError;
use classic_proto::frame::{self, ClientPacket};
use classic_proto::packets::{id, Kick};

use crate::command::{CommandHandler, UnknownCommandHandler};
use crate::config::{ServerConfig, WorldConfig};
use crate::heartbeat::{self, HeartbeatReport};
use crate::operators::OperatorList;
use crate::session::{ClientSession, PollStatus, Pose, SessionMap};
use crate::world::{map::Map, World, WorldOptions};

/// Loop cadence: 20 Hz.
const TICK: Duration = Duration::from_millis(50);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(45);

/// Authenticated clients always land here first.
pub const DEFAULT_WORLD: &str = "default";

/// Dimensions of the flat world seeded when no config provides "default".
const SEED_DIMS: (i16, i16, i16) = (256, 64, 256);

pub struct Server {
    config: ServerConfig,
    sessions: SessionMap,
    worlds: HashMap<String, World>,
    salt: String,
    num_authed: usize,
    heartbeat_clock: Instant,
    http: reqwest::Client,
    pub events: EventBus,
    command_handler: Option<Box<dyn CommandHandler>>,
    operators: OperatorList,
}

impl Server {
    pub fn new(config: ServerConfig, world_configs: Vec<WorldConfig>) -> Self {
        let mut worlds = HashMap::new();
        for world_config in world_configs {
            let world = World::from_config(world_config, Path::new("worlds"));
            if worlds.contains_key(world.name()) {
                debug!("World '{}' already exists", world.name());
                continue;
            }
            worlds.insert(world.name().to_string(), world);
        }
        if !worlds.contains_key(DEFAULT_WORLD) {
            // Flat scratch world so a bare install is joinable.
            let (x, y, z) = SEED_DIMS;
            let spawn = Pose {
                x: x / 2 * 32 + 16,
                y: (y / 2 + 1) * 32 + 16,
                z: z / 2 * 32 + 16,
                yaw: 0,
                pitch: 0,
            };
            worlds.insert(
                DEFAULT_WORLD.to_string(),
                World::new(DEFAULT_WORLD, Map::flat(x, y, z), spawn, WorldOptions::default()),
            );
        }

        let server = Self {
            config,
            sessions: SessionMap::new(),
            worlds,
            salt: random_salt(),
            num_authed: 0,
            heartbeat_clock: Instant::now(),
            http: reqwest::Client::new(),
            events: EventBus::new(),
            command_handler: Some(Box::new(UnknownCommandHandler)),
            operators: OperatorList::new("ops.txt"),
        };
        server.send_heartbeat();
        server
    }

    pub async fn run(&mut self, listener: TcpListener) {
        let mut ticker = tokio::time::interval(TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick(),
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => self.on_connect(stream, addr),
                    Err(e) => debug!("Accept failed: {e}"),
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }
    }

    pub fn on_connect(&mut self, stream: TcpStream, addr: SocketAddr) {
        self.sessions.insert(addr, ClientSession::new(stream, addr));
        debug!("Client connected ({addr})");
    }

    /// One pass: heartbeat, world ticks, per-session poll/dispatch/drain,
    /// then the reap of anything marked inactive.
    pub fn tick(&mut self) {
        if self.heartbeat_clock.elapsed() >= HEARTBEAT_INTERVAL {
            self.send_heartbeat();
            self.heartbeat_clock = Instant::now();
        }

        for world in self.worlds.values_mut() {
            world.tick();
        }

        let addrs: Vec<SocketAddr> = self.sessions.keys().copied().collect();
        for addr in addrs {
            let Some(session) = self.sessions.get_mut(&addr) else {
                continue;
            };
            if session.poll() == PollStatus::Disconnected {
                session.active = false;
            }
            self.dispatch_session(addr);
            if let Some(session) = self.sessions.get_mut(&addr) {
                session.drain();
            }
        }

        self.reap();
    }

    /// Frame and dispatch every complete packet buffered on one session,
    /// in arrival order.
    fn dispatch_session(&mut self, addr: SocketAddr) {
        loop {
            let Some(session) = self.sessions.get_mut(&addr) else {
                return;
            };
            if !session.active {
                return;
            }

            if !session.authed {
                match session.recv_buf.first() {
                    None => return,
                    Some(&opcode) if opcode != id::AUTH => {
                        debug!("Dropped unauthorized client ({addr})");
                        session.active = false;
                        return;
                    }
                    Some(_) => {}
                }
            }

            let packet = match frame::decode_client_packet(&session.recv_buf) {
                Ok(None) => return,
                Ok(Some((packet, consumed))) => {
                    session.recv_buf.advance(consumed);
                    packet
                }
                Err(ProtoError::UnknownOpcode(opcode)) => {
                    warn!("Unknown opcode 0x{opcode:02x} from client ({addr})");
                    self.kick(addr, "Unknown opcode received");
                    return;
                }
                Err(e) => {
                    debug!("Malformed packet from {addr}: {e}");
                    session.active = false;
                    return;
                }
            };
            self.dispatch(addr, packet);
        }
    }

    /// Hooks fire before their default; only auth honours the veto flag.
    fn dispatch(&mut self, addr: SocketAddr, packet: ClientPacket) {
        match packet {
            ClientPacket::Auth(auth) => self.handle_auth(addr, auth),
            ClientPacket::Message(message) => {
                self.events.trigger(
                    EventType::Message,
                    Some(addr),
                    &json!({ "message": message.text }),
                );
                self.handle_message(addr, &message.text);
            }
            ClientPacket::Position(position) => {
                self.events.trigger(
                    EventType::Position,
                    Some(addr),
                    &json!({
                        "x": position.x,
                        "y": position.y,
                        "z": position.z,
                        "yaw": position.yaw,
                        "pitch": position.pitch,
                    }),
                );
                self.with_session_world(addr, |world, sessions| {
                    world.handle_position(addr, &position, sessions)
                });
            }
            ClientPacket::SetBlock(request) => {
                self.events.trigger(
                    EventType::Block,
                    Some(addr),
                    &json!({
                        "x": request.x,
                        "y": request.y,
                        "z": request.z,
                        "mode": request.mode,
                        "type": request.block,
                    }),
                );
                self.with_session_world(addr, |world, sessions| {
                    world.handle_set_block(addr, &request, sessions)
                });
            }
        }
    }

    fn with_session_world(&mut self, addr: SocketAddr, f: impl FnOnce(&mut World, &mut SessionMap)) {
        let Some(world_name) = self.sessions.get(&addr).map(|s| s.world_name.clone()) else {
            return;
        };
        let Some(world) = self.worlds.get_mut(&world_name) else {
            debug!("World '{world_name}' does not exist");
            return;
        };
        f(world, &mut self.sessions);
    }

    /// Enqueue the kick frame and mark the session for the next reap.
    pub fn kick(&mut self, addr: SocketAddr, reason: &str) {
        let Some(session) = self.sessions.get_mut(&addr) else {
            return;
        };
        let reason = if reason.is_empty() { "Kicked" } else { reason };
        session.enqueue(&Kick::new(reason));
        session.active = false;
        if session.authed {
            info!("Kicked player {} ({addr} | {reason})", session.name);
        } else {
            info!("Kicked unauthorized client ({addr} | {reason})");
        }
    }

    /// Destroy sessions marked inactive. Authenticated ones leave their
    /// world first, so the despawn goes out before the session is gone.
    fn reap(&mut self) {
        let dead: Vec<SocketAddr> = self
            .sessions
            .iter()
            .filter(|(_, session)| !session.active)
            .map(|(addr, _)| *addr)
            .collect();
        for addr in dead {
            // Last chance for a queued kick frame to make it out.
            if let Some(session) = self.sessions.get_mut(&addr) {
                session.drain();
            }
            let Some(session) = self.sessions.remove(&addr) else {
                continue;
            };
            if session.authed {
                info!("Player {} disconnected ({addr})", session.name);
                if let Some(world) = self.worlds.get_mut(&session.world_name) {
                    world.remove_client(session.pid, &mut self.sessions);
                }
                chat::broadcast(
                    &mut self.sessions,
                    &format!("&ePlayer {} left the game.", session.name),
                );
                self.num_authed = self.num_authed.saturating_sub(1);
            } else {
                debug!("Client disconnected ({addr})");
            }
        }
    }

    fn send_heartbeat(&self) {
        if !self.config.server.heartbeat {
            return;
        }
        let report = HeartbeatReport {
            public: self.config.server.public,
            max_users: self.config.server.max_users,
            users: self.num_authed,
            port: self.config.server.port,
            salt: self.salt.clone(),
            name: self.config.server.name.clone(),
        };
        heartbeat::send(
            self.http.clone(),
            self.config.server.heartbeat_url.clone(),
            report,
        );
    }
}

/// 16 alphanumeric characters, fixed for the process lifetime.
fn random_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}
