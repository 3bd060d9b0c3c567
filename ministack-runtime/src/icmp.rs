use crate::driver::Driver;
use crate::processor::{IcmpEchoResponder, Processor};
use crate::stack::Stack;
use ministack_packets::{
    Buffer, IcmpPacket, IcmpUnreachableCode, IpProtocol, ICMP_HEADER_LEN,
    ICMP_TYPE_DEST_UNREACHABLE, IPV4_HEADER_LEN,
};
use std::net::Ipv4Addr;
use tracing::debug;

/// Bytes of the offending datagram's payload quoted after its header.
const UNREACHABLE_QUOTE_PAYLOAD: usize = 8;

impl<D: Driver> Stack<D> {
    pub(crate) fn icmp_in(&mut self, message: Buffer, src_ip: Ipv4Addr) {
        if let Some(reply) = IcmpEchoResponder::new().process(message) {
            debug!(%src_ip, len = reply.len(), "Sending ICMP echo reply");
            self.ip_out(reply, src_ip, IpProtocol::ICMP);
        }
    }

    /// Tells `src_ip` that `datagram` could not be delivered. The message
    /// quotes the datagram's IP header and the start of its payload.
    pub(crate) fn icmp_unreachable(
        &mut self,
        datagram: &[u8],
        src_ip: Ipv4Addr,
        code: IcmpUnreachableCode,
    ) {
        let quote_len = datagram
            .len()
            .min(IPV4_HEADER_LEN + UNREACHABLE_QUOTE_PAYLOAD);
        let mut buffer = Buffer::new(ICMP_HEADER_LEN + quote_len);
        if let Ok(mut packet) = IcmpPacket::new(buffer.data_mut()) {
            packet.set_msg_type(ICMP_TYPE_DEST_UNREACHABLE);
            packet.set_code(code as u8);
            packet.data_mut().copy_from_slice(&datagram[..quote_len]);
            packet.fill_checksum();
        }

        debug!(%src_ip, ?code, "Sending ICMP destination unreachable");
        self.ip_out(buffer, src_ip, IpProtocol::ICMP);
    }
}
