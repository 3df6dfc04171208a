//! Server and per-world configuration files.
//!
//! `server.toml` carries the `[Server]` table; each file under `worlds/`
//! describes one world. A file that fails to parse logs a warning; the
//! server config additionally falls back to defaults so a broken file
//! never prevents startup.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    #[serde(rename = "Server", default)]
    pub server: ServerSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub name: String,
    pub motd: String,
    pub port: u16,
    pub heartbeat: bool,
    pub heartbeat_url: String,
    pub public: bool,
    pub max_users: usize,
    pub verify_names: bool,
    pub debug: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            name: "Classic server".into(),
            motd: "Welcome!".into(),
            port: 25565,
            heartbeat: false,
            heartbeat_url: "http://www.classicube.net/server/heartbeat".into(),
            public: false,
            max_users: 8,
            verify_names: true,
            debug: false,
        }
    }
}

impl ServerConfig {
    /// Load the server config, falling back to defaults on any failure.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Couldn't read {}: {e}; using defaults", path.display());
                return Self::default();
            }
        };
        match toml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!("Couldn't parse {}: {e}; using defaults", path.display());
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorldConfig {
    #[serde(rename = "World")]
    pub world: WorldSection,
    #[serde(rename = "Size")]
    pub size: SizeSection,
    #[serde(rename = "Spawn")]
    pub spawn: SpawnSection,
    #[serde(rename = "Options", default)]
    pub options: OptionsSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorldSection {
    pub name: String,
    /// Map file name, relative to the worlds directory.
    pub map: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SizeSection {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

/// Spawn point in block coordinates.
#[derive(Debug, Clone, Deserialize)]
pub struct SpawnSection {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OptionsSection {
    pub autosave: bool,
    pub build: bool,
    pub autoload: bool,
}

impl Default for OptionsSection {
    fn default() -> Self {
        Self {
            autosave: false,
            build: true,
            autoload: false,
        }
    }
}

/// Parse every world file under `dir`. A missing directory is fine; a file
/// that fails to parse is skipped with a warning.
pub fn load_world_configs<P: AsRef<Path>>(dir: P) -> Vec<WorldConfig> {
    let dir = dir.as_ref();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("No worlds directory at {}: {e}", dir.display());
            return Vec::new();
        }
    };

    let mut configs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Couldn't read {}: {e}", path.display());
                continue;
            }
        };
        match toml::from_str::<WorldConfig>(&contents) {
            Ok(config) => configs.push(config),
            Err(e) => warn!("Couldn't parse {}: {e}", path.display()),
        }
    }
    configs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_server_config() {
        let toml_str = r#"
            [Server]
            name = "Test Server"
            motd = "hi there"
            port = 25566
            heartbeat = true
            public = true
            max_users = 16
            verify_names = false
            debug = true
        "#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.name, "Test Server");
        assert_eq!(config.server.port, 25566);
        assert!(config.server.heartbeat);
        assert!(config.server.public);
        assert_eq!(config.server.max_users, 16);
        assert!(!config.server.verify_names);
        assert!(config.server.debug);
        // unspecified keys keep their defaults
        assert!(config.server.heartbeat_url.contains("classicube.net"));
    }

    #[test]
    fn defaults_match_protocol_expectations() {
        let section = ServerSection::default();
        assert_eq!(section.port, 25565);
        assert_eq!(section.max_users, 8);
        assert!(section.verify_names);
        assert!(!section.heartbeat);
    }

    #[test]
    fn broken_config_falls_back_to_defaults() {
        let tmp = std::env::temp_dir().join(format!("classicd_cfg_{}.toml", std::process::id()));
        std::fs::write(&tmp, "[Server\nport = not a number").unwrap();
        let config = ServerConfig::load_or_default(&tmp);
        assert_eq!(config.server.port, 25565);
        let _ = std::fs::remove_file(tmp);
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let config = ServerConfig::load_or_default("/nonexistent/server.toml");
        assert_eq!(config.server.max_users, 8);
    }

    #[test]
    fn parse_world_config() {
        let toml_str = r#"
            [World]
            name = "freebuild"
            map = "freebuild.dat"

            [Size]
            x = 128
            y = 64
            z = 128

            [Spawn]
            x = 64
            y = 34
            z = 64

            [Options]
            autosave = true
            build = true
            autoload = true
        "#;
        let config: WorldConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.world.name, "freebuild");
        assert_eq!(config.world.map, "freebuild.dat");
        assert_eq!(config.size.x, 128);
        assert_eq!(config.spawn.y, 34);
        assert!(config.options.autosave);
        assert!(config.options.autoload);
    }

    #[test]
    fn world_options_default_when_absent() {
        let toml_str = r#"
            [World]
            name = "bare"
            map = "bare.dat"

            [Size]
            x = 16
            y = 16
            z = 16

            [Spawn]
            x = 8
            y = 10
            z = 8
        "#;
        let config: WorldConfig = toml::from_str(toml_str).unwrap();
        assert!(!config.options.autosave);
        assert!(config.options.build);
        assert!(!config.options.autoload);
    }
}
