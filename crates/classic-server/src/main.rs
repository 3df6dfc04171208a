mod command;
mod config;
mod heartbeat;
mod operators;
mod server;
mod session;
#[cfg(test)]
mod testutil;
mod world;

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use config::ServerConfig;
use server::Server;

#[tokio::main]
async fn main() {
    let config = ServerConfig::load_or_default("server.toml");

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if config.server.debug { "debug" } else { "info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "classicd v{} starting: {}",
        env!("CARGO_PKG_VERSION"),
        config.server.name
    );
    if !config.server.verify_names {
        warn!(
            "Verify names is turned off! This is NOT secure and disabling it \
             should only be necessary during server tests. After that, TURN IT BACK ON."
        );
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to listen on port {}: {e}", config.server.port);
            std::process::exit(1);
        }
    };

    let world_configs = config::load_world_configs("worlds");
    let mut server = Server::new(config, world_configs);

    info!("Server initialized and listening on port {}", addr.port());

    server.run(listener).await;
    info!("Server shut down.");
}
