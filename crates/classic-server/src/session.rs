//! Per-connection session state.
//!
//! A session owns its socket, a receive buffer, and an outbound frame
//! queue. Only the server loop reads, drains, or flips `active`; worlds
//! and event handlers merely enqueue.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use bytes::{Buf, Bytes, BytesMut};
use classic_proto::codec::PacketEncode;
use tokio::net::TcpStream;

/// All live connections, authenticated or not, keyed by peer address.
pub type SessionMap = HashMap<SocketAddr, ClientSession>;

/// Outcome of one non-blocking read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    Ok,
    WouldBlock,
    Disconnected,
}

/// A player's position and orientation in 1/32-block fixed-point units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pose {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub yaw: u8,
    pub pitch: u8,
}

pub struct ClientSession {
    stream: TcpStream,
    peer_addr: SocketAddr,
    local_addr: Option<SocketAddr>,
    pub recv_buf: BytesMut,
    send_queue: VecDeque<Bytes>,
    pub active: bool,
    pub authed: bool,
    /// Valid only while the session sits in a world roster.
    pub pid: i8,
    pub name: String,
    pub user_type: u8,
    pub world_name: String,
    pub pose: Pose,
    chat_mute_until: Option<Instant>,
}

impl ClientSession {
    pub fn new(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        let local_addr = stream.local_addr().ok();
        Self {
            stream,
            peer_addr,
            local_addr,
            recv_buf: BytesMut::with_capacity(256),
            send_queue: VecDeque::new(),
            active: true,
            authed: false,
            pid: -1,
            name: String::new(),
            user_type: classic_proto::packets::user_type::NORMAL,
            world_name: String::new(),
            pose: Pose::default(),
            chat_mute_until: None,
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// One non-blocking read into the buffer tail.
    pub fn poll(&mut self) -> PollStatus {
        let mut chunk = [0u8; 1024];
        match self.stream.try_read(&mut chunk) {
            Ok(0) => PollStatus::Disconnected,
            Ok(n) => {
                self.recv_buf.extend_from_slice(&chunk[..n]);
                PollStatus::Ok
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => PollStatus::WouldBlock,
            Err(_) => PollStatus::Disconnected,
        }
    }

    /// Append an encoded frame to the outbound queue. Never blocks.
    pub fn enqueue(&mut self, packet: &impl PacketEncode) {
        let mut buf = BytesMut::new();
        packet.encode(&mut buf);
        self.send_queue.push_back(buf.freeze());
    }

    /// Write as much of the queue as the socket accepts without blocking.
    /// A partial write keeps the remainder of the frame at the front.
    pub fn drain(&mut self) {
        while let Some(front) = self.send_queue.front_mut() {
            match self.stream.try_write(front) {
                Ok(0) => break,
                Ok(n) if n < front.len() => {
                    front.advance(n);
                    break;
                }
                Ok(_) => {
                    self.send_queue.pop_front();
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(_) => {
                    self.active = false;
                    break;
                }
            }
        }
    }

    pub fn set_chat_mute(&mut self, duration: Duration) {
        self.chat_mute_until = Some(Instant::now() + duration);
    }

    /// True until the deadline passes; expiry clears the timer.
    pub fn is_chat_muted(&mut self) -> bool {
        match self.chat_mute_until {
            Some(deadline) if Instant::now() < deadline => true,
            Some(_) => {
                self.chat_mute_until = None;
                false
            }
            None => false,
        }
    }

    /// Display name for chat lines.
    pub fn chat_name(&self) -> &str {
        &self.name
    }

    #[cfg(test)]
    pub(crate) fn queued(&self) -> &VecDeque<Bytes> {
        &self.send_queue
    }

    #[cfg(test)]
    pub(crate) fn clear_queue(&mut self) {
        self.send_queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::connected_session;
    use classic_proto::packets::{Despawn, Kick};
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn enqueue_then_drain_reaches_the_peer() {
        let (mut session, mut client) = connected_session().await;
        session.enqueue(&Despawn { pid: 3 });
        session.enqueue(&Kick::new("bye"));
        session.drain();
        assert!(session.active);

        let mut received = vec![0u8; Despawn::FRAME_LEN + Kick::FRAME_LEN];
        client.read_exact(&mut received).await.unwrap();
        assert_eq!(received[0], classic_proto::packets::id::DESPAWN);
        assert_eq!(received[1] as i8, 3);
        assert_eq!(received[Despawn::FRAME_LEN], classic_proto::packets::id::KICK);
    }

    #[tokio::test]
    async fn poll_sees_client_bytes() {
        use tokio::io::AsyncWriteExt;
        let (mut session, mut client) = connected_session().await;
        assert_eq!(session.poll(), PollStatus::WouldBlock);

        client.write_all(&[0x08, 0xff]).await.unwrap();
        client.flush().await.unwrap();
        // Loopback delivery is asynchronous; give it a moment.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(session.poll(), PollStatus::Ok);
        assert_eq!(&session.recv_buf[..], &[0x08, 0xff]);
    }

    #[tokio::test]
    async fn poll_detects_disconnect() {
        let (mut session, client) = connected_session().await;
        drop(client);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(session.poll(), PollStatus::Disconnected);
    }

    #[tokio::test]
    async fn chat_mute_expires() {
        let (mut session, _client) = connected_session().await;
        assert!(!session.is_chat_muted());
        session.set_chat_mute(Duration::from_millis(40));
        assert!(session.is_chat_muted());
        std::thread::sleep(Duration::from_millis(60));
        assert!(!session.is_chat_muted());
        // Expiry cleared the deadline entirely.
        assert!(!session.is_chat_muted());
    }
}
