#![cfg(target_os = "linux")]
mod driver;
mod linux;
mod sockets;

pub use driver::AfPacketDriver;
pub use sockets::{BoundSocket, PacketType, Socket};
