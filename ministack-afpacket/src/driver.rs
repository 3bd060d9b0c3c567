use crate::sockets::{BoundSocket, PacketType, Socket};
use ministack_runtime::driver::Driver;
use std::ffi::{CStr, CString};
use std::io;
use tracing::{debug, trace};

/// A `Driver` over a non-blocking `AF_PACKET` socket bound to one interface.
/// Needs `CAP_NET_RAW`.
pub struct AfPacketDriver {
    iface: CString,
    socket: Option<BoundSocket>,
}

impl AfPacketDriver {
    pub fn new(iface: impl AsRef<CStr>) -> Self {
        AfPacketDriver {
            iface: iface.as_ref().to_owned(),
            socket: None,
        }
    }

    pub fn iface(&self) -> &CStr {
        &self.iface
    }

    fn socket(&mut self) -> io::Result<&mut BoundSocket> {
        self.socket.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "driver has not been opened")
        })
    }
}

impl Driver for AfPacketDriver {
    fn open(&mut self) -> io::Result<()> {
        let mut socket = Socket::new()?;
        socket.set_nonblocking(true)?;
        self.socket = Some(socket.bind(&self.iface)?);
        debug!(iface = ?self.iface, "Opened AF_PACKET socket");
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        let sent = self.socket()?.send(frame)?;
        if sent != frame.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "frame was only partially sent",
            ));
        }
        Ok(())
    }

    fn recv(&mut self, frame: &mut [u8]) -> io::Result<Option<usize>> {
        let socket = self.socket()?;
        loop {
            match socket.recv(frame) {
                Ok((len, PacketType::Outgoing)) => {
                    trace!(len, "Skipping our own outgoing frame");
                }
                Ok((len, _)) => return Ok(Some(len)),
                Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
    }
}
