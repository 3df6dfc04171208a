//! Minecraft Classic protocol v7 packet definitions and framing.

pub mod codec;
pub mod error;
pub mod frame;
pub mod level;
pub mod packets;
