//! Shared helpers for socket-backed tests.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};

use crate::session::ClientSession;

/// A session over a real loopback socket pair, plus the client half.
pub async fn connected_session() -> (ClientSession, TcpStream) {
    let (session, client, _) = connected_session_from(None).await;
    (session, client)
}

/// Like [`connected_session`], but records the peer under `fake_peer` so
/// tests can model remote (non-loopback) clients.
pub async fn connected_session_from(
    fake_peer: Option<SocketAddr>,
) -> (ClientSession, TcpStream, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpStream::connect(addr).await.unwrap();
    let (server_side, accepted) = listener.accept().await.unwrap();
    let peer = fake_peer.unwrap_or(accepted);
    (ClientSession::new(server_side, peer), client, peer)
}
