#![deny(missing_docs)]

use crate::linux;
use libc;
use std::{
    ffi::CStr,
    io,
    mem::{self, MaybeUninit},
    ptr,
};

/// How the kernel classified a received frame, from `sll_pkttype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    /// Addressed to this host.
    Host,
    /// Sent to the link broadcast address.
    Broadcast,
    /// Sent to a multicast group.
    Multicast,
    /// Addressed to another host, seen in promiscuous mode.
    OtherHost,
    /// A frame this host transmitted, looped back to packet sockets.
    Outgoing,
    /// Any other kernel value.
    Other(u8),
}

impl From<libc::c_uchar> for PacketType {
    fn from(pkttype: libc::c_uchar) -> Self {
        match pkttype {
            linux::PACKET_HOST => PacketType::Host,
            linux::PACKET_BROADCAST => PacketType::Broadcast,
            linux::PACKET_MULTICAST => PacketType::Multicast,
            linux::PACKET_OTHERHOST => PacketType::OtherHost,
            linux::PACKET_OUTGOING => PacketType::Outgoing,
            other => PacketType::Other(other),
        }
    }
}

/// Represents an unbound `AF_PACKET` socket.  At this phase of a socket's lifecycle, it can be
/// configured.
pub struct Socket {
    fd: libc::c_int,
}

/// Represents a bound `AF_PACKET` socket. At this phase of a socket's lifecycle, it can be read
/// to/written from.
pub struct BoundSocket {
    fd: libc::c_int,
    send_addr: libc::sockaddr_ll,
}

impl Socket {
    /// Creates a new unbound socket receiving every ethertype.
    pub fn new() -> io::Result<Self> {
        // FFI only; no Rust-owned memory is touched.
        let fd = unsafe {
            // man 7 packet
            let fd = libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW,
                linux::ETH_P_ALL_BE as libc::c_int,
            );
            if fd < 0 {
                return Err(io::Error::last_os_error());
            }
            fd
        };
        Ok(Self { fd })
    }

    /// Binds the socket to a network interface. This function consumes the `Socket` instance, as
    /// no more configuration options may be safely changed.
    pub fn bind(self, iface: impl AsRef<CStr>) -> io::Result<BoundSocket> {
        let name = iface.as_ref().to_bytes_with_nul();
        if name.len() > libc::IFNAMSIZ {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "interface name too long",
            ));
        }

        // The name copy is bounded by its own length, which fits IFNAMSIZ. Both structs handed
        // to the kernel are zeroed plain-old-data owned by this frame.
        let send_addr = unsafe {
            let mut ifr: linux::ifreq = MaybeUninit::zeroed().assume_init();
            ptr::copy_nonoverlapping(
                name.as_ptr() as *const libc::c_char,
                ifr.ifr_ifrn.ifrn_name.as_mut_ptr(),
                name.len(),
            );
            // man 7 netdevice
            let err = libc::ioctl(self.fd, linux::SIOCGIFINDEX, &ifr);
            if err < 0 {
                return Err(io::Error::last_os_error());
            }

            let mut ll: libc::sockaddr_ll = MaybeUninit::zeroed().assume_init();
            ll.sll_family = libc::AF_PACKET as libc::c_ushort;
            ll.sll_protocol = linux::ETH_P_ALL_BE;
            // `ifr_ifindex` in the kernel headers
            ll.sll_ifindex = ifr.ifr_ifru.ifru_ivalue;
            let err = libc::bind(
                self.fd,
                &ll as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            );
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
            ll
        };
        let fd = self.fd;
        // The descriptor now belongs to the BoundSocket; skip our Drop.
        mem::forget(self);
        Ok(BoundSocket { fd, send_addr })
    }

    /// Configures the socket's non-blocking status.
    pub fn set_nonblocking(&mut self, nonblocking: bool) -> io::Result<()> {
        // man 2 fcntl
        unsafe {
            let flags = libc::fcntl(self.fd, libc::F_GETFL);
            if flags < 0 {
                return Err(io::Error::last_os_error());
            }
            let new_flags = if nonblocking {
                flags | libc::O_NONBLOCK
            } else {
                flags & (!libc::O_NONBLOCK)
            };
            let err = libc::fcntl(self.fd, libc::F_SETFL, new_flags);
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }
}

impl BoundSocket {
    /// Sends a frame to the NIC.
    pub fn send(&mut self, frame: &[u8]) -> io::Result<usize> {
        // The frame is only borrowed for the duration of the call, with its length passed along.
        unsafe {
            let bytes = libc::sendto(
                self.fd,
                frame.as_ptr() as *const _,
                frame.len(),
                0,
                &self.send_addr as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            );
            if bytes < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(bytes as usize)
            }
        }
    }

    /// Receives a frame from the NIC, along with the kernel's classification of it. A
    /// non-blocking socket with nothing queued fails with `WouldBlock`.
    pub fn recv(&mut self, frame: &mut [u8]) -> io::Result<(usize, PacketType)> {
        unsafe {
            let mut from = MaybeUninit::<libc::sockaddr_ll>::zeroed();
            let mut addrlen = mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t;

            let bytes = libc::recvfrom(
                self.fd,
                frame.as_mut_ptr() as *mut _,
                frame.len(),
                0,
                from.as_mut_ptr() as *mut libc::sockaddr,
                &mut addrlen,
            );
            if bytes < 0 {
                Err(io::Error::last_os_error())
            } else {
                let from = from.assume_init();
                Ok((bytes as usize, PacketType::from(from.sll_pkttype)))
            }
        }
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

impl Drop for BoundSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_type_from_kernel_values() {
        assert_eq!(PacketType::from(linux::PACKET_HOST), PacketType::Host);
        assert_eq!(PacketType::from(linux::PACKET_BROADCAST), PacketType::Broadcast);
        assert_eq!(PacketType::from(linux::PACKET_MULTICAST), PacketType::Multicast);
        assert_eq!(PacketType::from(linux::PACKET_OTHERHOST), PacketType::OtherHost);
        assert_eq!(PacketType::from(linux::PACKET_OUTGOING), PacketType::Outgoing);
        assert_eq!(PacketType::from(7), PacketType::Other(7));
    }
}
