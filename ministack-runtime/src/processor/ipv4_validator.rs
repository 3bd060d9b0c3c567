use crate::processor::Processor;
use ministack_packets::{Buffer, Ipv4Packet, IPV4_HEADER_LEN, IPV4_VERSION};
use std::net::Ipv4Addr;
use tracing::{trace, warn};

/// Admits IPv4 datagrams that are well formed, carry a correct header
/// checksum and are addressed to `local_ip`. Link padding past the declared
/// total length is trimmed off.
pub struct Ipv4Validator {
    local_ip: Ipv4Addr,
}

impl Ipv4Validator {
    pub fn new(local_ip: Ipv4Addr) -> Ipv4Validator {
        Ipv4Validator { local_ip }
    }
}

impl Processor for Ipv4Validator {
    type Input = Buffer;
    type Output = Buffer;

    fn process(&mut self, mut datagram: Self::Input) -> Option<Self::Output> {
        let received_len = datagram.len();
        let mut packet = match Ipv4Packet::new(datagram.data_mut()) {
            Ok(packet) => packet,
            Err(err) => {
                warn!(len = received_len, "Dropping IPv4 datagram: {}", err);
                return None;
            }
        };

        let total_len = packet.total_len() as usize;
        if packet.header_len() != IPV4_HEADER_LEN
            || packet.version() != IPV4_VERSION
            || total_len < IPV4_HEADER_LEN
            || total_len > received_len
        {
            warn!(
                version = packet.version(),
                ihl = packet.ihl(),
                total_len,
                received_len,
                "Dropping IPv4 datagram with malformed header"
            );
            return None;
        }

        if !packet.verify_checksum() {
            warn!(checksum = packet.checksum(), "Dropping IPv4 datagram with bad header checksum");
            return None;
        }

        if packet.dest_addr() != self.local_ip {
            trace!(dest = %packet.dest_addr(), "Ignoring IPv4 datagram for another host");
            return None;
        }

        datagram.truncate(total_len);
        Some(datagram)
    }
}
