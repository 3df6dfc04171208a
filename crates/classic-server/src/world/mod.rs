//! Worlds: map storage, the player roster, and fan-out of joins, block
//! edits, and movement.

pub mod map;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use classic_proto::level::encode_level_chunks;
use classic_proto::packets::set_block::{block, mode};
use classic_proto::packets::{
    user_type, Despawn, LevelFinal, LevelInit, Position, SetBlock, SetBlockRequest, Spawn, SELF_PID,
};

use crate::config::WorldConfig;
use crate::session::{Pose, SessionMap};

use map::Map;

/// Most players a single world can host; pids stay in [0, 127].
pub const MAX_PLAYERS: usize = 127;

const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct WorldOptions {
    pub autosave: bool,
    pub build: bool,
    pub autoload: bool,
}

impl Default for WorldOptions {
    fn default() -> Self {
        Self {
            autosave: false,
            build: true,
            autoload: false,
        }
    }
}

pub struct World {
    name: String,
    pub map: Map,
    spawn: Pose,
    pub options: WorldOptions,
    active: bool,
    map_path: Option<PathBuf>,
    roster: HashMap<i8, SocketAddr>,
    last_autosave: Instant,
}

impl World {
    pub fn new(name: &str, map: Map, spawn: Pose, options: WorldOptions) -> Self {
        Self {
            name: name.to_string(),
            map,
            spawn,
            options,
            active: true,
            map_path: None,
            roster: HashMap::new(),
            last_autosave: Instant::now(),
        }
    }

    /// Materialise a world from its config file. With `autoload` the map
    /// file is read now; otherwise the world sits empty until needed.
    pub fn from_config(config: WorldConfig, worlds_dir: &Path) -> Self {
        let WorldConfig {
            world,
            size,
            spawn,
            options,
        } = config;
        let map_path = worlds_dir.join(&world.map);
        let options = WorldOptions {
            autosave: options.autosave,
            build: options.build,
            autoload: options.autoload,
        };

        let map = if options.autoload {
            match Map::load(&map_path, size.x, size.y, size.z) {
                Ok(map) => {
                    info!("Loaded world {}", world.name);
                    map
                }
                Err(e) => {
                    warn!(
                        "Couldn't load map {}: {e}; generating flat terrain",
                        map_path.display()
                    );
                    Map::flat(size.x, size.y, size.z)
                }
            }
        } else {
            debug!("Unloaded world {}", world.name);
            Map::new(size.x, size.y, size.z)
        };

        Self {
            name: world.name,
            map,
            spawn: Pose {
                x: spawn.x * 32 + 16,
                y: spawn.y * 32 + 16,
                z: spawn.z * 32 + 16,
                yaw: 0,
                pitch: 0,
            },
            active: options.autoload,
            options,
            map_path: Some(map_path),
            roster: HashMap::new(),
            last_autosave: Instant::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Allocate the lowest free pid, run the level transfer, and exchange
    /// spawns with everyone already present. `None` when the roster is
    /// full or the level stream cannot be built.
    pub fn add_client(&mut self, addr: SocketAddr, sessions: &mut SessionMap) -> Option<i8> {
        let pid = (0..MAX_PLAYERS as i8).find(|pid| !self.roster.contains_key(pid))?;

        let chunks = match encode_level_chunks(self.map.cells()) {
            Ok(chunks) => chunks,
            Err(e) => {
                error!("Couldn't compress level for world {}: {e}", self.name);
                return None;
            }
        };

        let newcomer_name = {
            let session = sessions.get_mut(&addr)?;
            session.pid = pid;
            session.world_name = self.name.clone();
            session.pose = self.spawn;

            session.enqueue(&LevelInit);
            for chunk in &chunks {
                session.enqueue(chunk);
            }
            let (x, y, z) = self.map.dims();
            session.enqueue(&LevelFinal { x, y, z });
            session.enqueue(&Spawn {
                pid: SELF_PID,
                name: session.name.clone(),
                x: self.spawn.x,
                y: self.spawn.y,
                z: self.spawn.z,
                yaw: self.spawn.yaw,
                pitch: self.spawn.pitch,
            });
            session.name.clone()
        };

        for (&peer_pid, &peer_addr) in &self.roster {
            let peer_spawn = match sessions.get(&peer_addr) {
                Some(peer) => Spawn {
                    pid: peer_pid,
                    name: peer.name.clone(),
                    x: peer.pose.x,
                    y: peer.pose.y,
                    z: peer.pose.z,
                    yaw: peer.pose.yaw,
                    pitch: peer.pose.pitch,
                },
                None => continue,
            };
            if let Some(newcomer) = sessions.get_mut(&addr) {
                newcomer.enqueue(&peer_spawn);
            }
            if let Some(peer) = sessions.get_mut(&peer_addr) {
                peer.enqueue(&Spawn {
                    pid,
                    name: newcomer_name.clone(),
                    x: self.spawn.x,
                    y: self.spawn.y,
                    z: self.spawn.z,
                    yaw: self.spawn.yaw,
                    pitch: self.spawn.pitch,
                });
            }
        }

        self.roster.insert(pid, addr);
        debug!("Player {newcomer_name} joined world {} as pid {pid}", self.name);
        Some(pid)
    }

    /// Free the pid and despawn the player on every remaining roster
    /// member. The leaving session must already be out of `sessions` or it
    /// would see its own despawn.
    pub fn remove_client(&mut self, pid: i8, sessions: &mut SessionMap) {
        if self.roster.remove(&pid).is_none() {
            return;
        }
        for peer_addr in self.roster.values() {
            if let Some(peer) = sessions.get_mut(peer_addr) {
                peer.enqueue(&Despawn { pid });
            }
        }
    }

    /// Validate and apply a block change, fanning the result out to the
    /// whole roster. Violations answer the sender with one corrective
    /// frame and leave the map untouched.
    pub fn handle_set_block(
        &mut self,
        sender: SocketAddr,
        request: &SetBlockRequest,
        sessions: &mut SessionMap,
    ) {
        let current = self.map.get(request.x, request.y, request.z);
        let valid_mode = matches!(request.mode, mode::DESTROY | mode::CREATE);
        let may_build = self.options.build
            || sessions
                .get(&sender)
                .is_some_and(|s| s.user_type == user_type::OPERATOR);

        match (current, valid_mode && may_build) {
            (Some(_), true) => {
                let stored = if request.mode == mode::DESTROY {
                    block::AIR
                } else {
                    block::sanitize(request.block)
                };
                self.map.set(request.x, request.y, request.z, stored);
                let update = SetBlock {
                    x: request.x,
                    y: request.y,
                    z: request.z,
                    block: stored,
                };
                for peer_addr in self.roster.values() {
                    if let Some(peer) = sessions.get_mut(peer_addr) {
                        peer.enqueue(&update);
                    }
                }
            }
            (current, _) => {
                debug!(
                    "Rejected block change at ({}, {}, {}) in world {}",
                    request.x, request.y, request.z, self.name
                );
                let revert = SetBlock {
                    x: request.x,
                    y: request.y,
                    z: request.z,
                    block: current.unwrap_or(block::AIR),
                };
                if let Some(session) = sessions.get_mut(&sender) {
                    session.enqueue(&revert);
                }
            }
        }
    }

    /// Cache the sender's pose and fan the move out to everyone else.
    pub fn handle_position(
        &mut self,
        sender: SocketAddr,
        packet: &Position,
        sessions: &mut SessionMap,
    ) {
        let Some(session) = sessions.get_mut(&sender) else {
            return;
        };
        session.pose = Pose {
            x: packet.x,
            y: packet.y,
            z: packet.z,
            yaw: packet.yaw,
            pitch: packet.pitch,
        };
        let update = Position {
            pid: session.pid,
            ..*packet
        };
        for (&peer_pid, peer_addr) in &self.roster {
            if peer_pid == update.pid {
                continue;
            }
            if let Some(peer) = sessions.get_mut(peer_addr) {
                peer.enqueue(&update);
            }
        }
    }

    /// Per-tick housekeeping: autosave when enabled and the map changed.
    pub fn tick(&mut self) {
        if !self.active {
            return;
        }
        if self.options.autosave
            && self.map.is_dirty()
            && self.last_autosave.elapsed() >= AUTOSAVE_INTERVAL
        {
            self.last_autosave = Instant::now();
            let Some(path) = &self.map_path else {
                return;
            };
            match self.map.save(path) {
                Ok(()) => {
                    info!("Saved world {}", self.name);
                    self.map.clear_dirty();
                }
                Err(e) => warn!("Couldn't save world {}: {e}", self.name),
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn roster(&self) -> &HashMap<i8, SocketAddr> {
        &self.roster
    }
}
