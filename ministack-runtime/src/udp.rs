use ministack_packets::Buffer;
use std::net::Ipv4Addr;

/// What the UDP layer wants done after it has seen a datagram.
#[derive(Debug, Clone)]
pub enum UdpDisposition {
    /// Delivered or deliberately ignored; nothing else to do.
    Consumed,
    /// Send this UDP segment back to the datagram's source.
    Reply(Buffer),
    /// No handler is bound to the destination port.
    PortUnreachable,
}

/// The transport layer sitting above IP. It receives UDP segments with the
/// IP header already removed.
pub trait UdpLayer {
    fn udp_in(&mut self, segment: &[u8], src_ip: Ipv4Addr) -> UdpDisposition;
}

/// A UDP layer with nothing listening: every segment is answered with port
/// unreachable.
#[derive(Default, Debug)]
pub struct ClosedPorts;

impl UdpLayer for ClosedPorts {
    fn udp_in(&mut self, _segment: &[u8], _src_ip: Ipv4Addr) -> UdpDisposition {
        UdpDisposition::PortUnreachable
    }
}
