use crate::processor::Processor;
use ministack_packets::{Buffer, IcmpPacket, ICMP_TYPE_ECHO_REPLY, ICMP_TYPE_ECHO_REQUEST};
use tracing::{trace, warn};

/// Turns a checksummed Echo Request into its Echo Reply, in place. The reply
/// keeps the identifier, sequence number and data of the request. Every
/// other ICMP message is consumed.
#[derive(Default)]
pub struct IcmpEchoResponder;

impl IcmpEchoResponder {
    pub fn new() -> IcmpEchoResponder {
        IcmpEchoResponder
    }
}

impl Processor for IcmpEchoResponder {
    type Input = Buffer;
    type Output = Buffer;

    fn process(&mut self, mut message: Self::Input) -> Option<Self::Output> {
        let len = message.len();
        let mut packet = match IcmpPacket::new(message.data_mut()) {
            Ok(packet) => packet,
            Err(err) => {
                warn!(len, "Dropping ICMP message: {}", err);
                return None;
            }
        };

        if !packet.verify_checksum() {
            warn!(checksum = packet.checksum(), "Dropping ICMP message with bad checksum");
            return None;
        }

        if packet.msg_type() != ICMP_TYPE_ECHO_REQUEST {
            trace!(msg_type = packet.msg_type(), code = packet.code(), "Consumed ICMP message");
            return None;
        }

        packet.set_msg_type(ICMP_TYPE_ECHO_REPLY);
        packet.set_code(0);
        packet.fill_checksum();
        Some(message)
    }
}
