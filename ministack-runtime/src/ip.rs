use crate::driver::Driver;
use crate::processor::{Ipv4Validator, Processor};
use crate::stack::Stack;
use crate::udp::UdpDisposition;
use ministack_packets::{
    Buffer, IcmpUnreachableCode, IpProtocol, Ipv4Packet, IPV4_ETHER_TYPE, IPV4_HEADER_LEN,
    IPV4_MAX_TOTAL_LEN,
};
use std::net::Ipv4Addr;
use tracing::{debug, warn};

/// One slice of an outbound payload. `offset` is in 8-byte units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fragment {
    pub start: usize,
    pub len: usize,
    pub offset: u16,
    pub more_fragments: bool,
}

/// Splits a payload of `len` bytes into chunks of at most `max_payload`
/// bytes. `max_payload` must be a nonzero multiple of 8.
pub(crate) struct Fragments {
    len: usize,
    max_payload: usize,
    start: usize,
}

impl Fragments {
    pub fn new(len: usize, max_payload: usize) -> Fragments {
        Fragments {
            len,
            max_payload,
            start: 0,
        }
    }
}

impl Iterator for Fragments {
    type Item = Fragment;

    fn next(&mut self) -> Option<Fragment> {
        if self.start >= self.len {
            return None;
        }
        let remaining = self.len - self.start;
        let len = remaining.min(self.max_payload);
        let fragment = Fragment {
            start: self.start,
            len,
            offset: (self.start / 8) as u16,
            more_fragments: remaining > len,
        };
        self.start += len;
        Some(fragment)
    }
}

impl<D: Driver> Stack<D> {
    pub(crate) fn ip_in(&mut self, buffer: Buffer) {
        let mut datagram = match Ipv4Validator::new(self.config.ip).process(buffer) {
            Some(datagram) => datagram,
            None => return,
        };
        let (protocol, src_ip) = match Ipv4Packet::new(datagram.data()) {
            Ok(packet) => (packet.protocol(), packet.src_addr()),
            Err(_) => return,
        };

        match protocol {
            IpProtocol::ICMP => {
                if datagram.remove_header(IPV4_HEADER_LEN).is_ok() {
                    self.icmp_in(datagram, src_ip);
                }
            }
            IpProtocol::UDP => {
                let segment = &datagram.data()[IPV4_HEADER_LEN..];
                match self.udp.udp_in(segment, src_ip) {
                    UdpDisposition::Consumed => {}
                    UdpDisposition::Reply(reply) => self.ip_out(reply, src_ip, IpProtocol::UDP),
                    UdpDisposition::PortUnreachable => {
                        self.icmp_unreachable(datagram.data(), src_ip, IcmpUnreachableCode::Port)
                    }
                }
            }
            other => {
                debug!(protocol = ?other, %src_ip, "No handler for IP protocol");
                self.icmp_unreachable(datagram.data(), src_ip, IcmpUnreachableCode::Protocol);
            }
        }
    }

    /// Sends `payload` to `dest` as one IPv4 datagram, fragmented to fit the
    /// link MTU. Every call consumes one datagram identifier.
    pub fn ip_out(&mut self, payload: Buffer, dest: Ipv4Addr, protocol: IpProtocol) {
        if payload.len() > IPV4_MAX_TOTAL_LEN - IPV4_HEADER_LEN {
            warn!(len = payload.len(), %dest, "Dropping oversized IPv4 payload");
            return;
        }

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        if payload.len() <= self.config.mtu - IPV4_HEADER_LEN {
            self.ip_fragment_out(payload, dest, protocol, id, 0, false);
            return;
        }

        let fragments = Fragments::new(payload.len(), self.config.max_fragment_payload());
        debug!(%dest, id, len = payload.len(), "Fragmenting IPv4 datagram");
        for fragment in fragments {
            let chunk = &payload.data()[fragment.start..fragment.start + fragment.len];
            self.ip_fragment_out(
                Buffer::from_slice(chunk),
                dest,
                protocol,
                id,
                fragment.offset,
                fragment.more_fragments,
            );
        }
    }

    fn ip_fragment_out(
        &mut self,
        mut buffer: Buffer,
        dest: Ipv4Addr,
        protocol: IpProtocol,
        id: u16,
        offset: u16,
        more_fragments: bool,
    ) {
        if let Err(err) = buffer.add_header(IPV4_HEADER_LEN) {
            warn!(len = buffer.len(), "Dropping outbound datagram: {}", err);
            return;
        }

        let total_len = buffer.len() as u16;
        match Ipv4Packet::new(buffer.data_mut()) {
            Ok(mut packet) => {
                packet.set_version_and_header_len(IPV4_HEADER_LEN);
                packet.set_tos(0);
                packet.set_total_len(total_len);
                packet.set_identification(id);
                packet.set_fragment(more_fragments, offset);
                packet.set_ttl(self.config.default_ttl);
                packet.set_protocol(protocol);
                packet.set_src_addr(self.config.ip);
                packet.set_dest_addr(dest);
                packet.fill_checksum();
            }
            Err(err) => {
                warn!("Dropping outbound datagram: {}", err);
                return;
            }
        }

        self.arp_out(buffer, dest, IPV4_ETHER_TYPE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StackConfig;
    use crate::utils::test::*;
    use ministack_packets::*;
    use rand::Rng;

    fn sent_datagrams(stack: &Stack<MockDriver>) -> Vec<Ipv4Packet<Vec<u8>>> {
        stack
            .driver()
            .sent
            .iter()
            .map(|frame| {
                assert_eq!(EthernetFrame::new(&frame[..]).unwrap().ether_type(), IPV4_ETHER_TYPE);
                Ipv4Packet::new(frame_payload(frame).to_vec()).unwrap()
            })
            .collect()
    }

    #[test]
    fn fragment_plan_for_3000_bytes() {
        let plan: Vec<Fragment> = Fragments::new(3000, 1480).collect();
        assert_eq!(
            plan,
            vec![
                Fragment { start: 0, len: 1480, offset: 0, more_fragments: true },
                Fragment { start: 1480, len: 1480, offset: 185, more_fragments: true },
                Fragment { start: 2960, len: 40, offset: 370, more_fragments: false },
            ]
        );
    }

    #[test]
    fn fragment_plans_cover_the_payload() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let max_payload = 8 * rng.gen_range(1, 200);
            let len = rng.gen_range(1, 20_000);
            let plan: Vec<Fragment> = Fragments::new(len, max_payload).collect();

            assert_eq!(plan.iter().map(|f| f.len).sum::<usize>(), len);
            for (i, fragment) in plan.iter().enumerate() {
                assert_eq!(fragment.offset as usize, i * max_payload / 8);
                assert_eq!(fragment.more_fragments, i + 1 < plan.len());
                assert!(fragment.len <= max_payload);
            }
        }
    }

    #[test]
    fn small_payload_is_one_datagram() {
        let (mut stack, _clock) = test_stack();
        resolve_peer(&mut stack);
        stack.ip_out(Buffer::from_slice(&[0x42; 1480]), PEER_IP, IpProtocol::UDP);

        let mut datagrams = sent_datagrams(&stack);
        assert_eq!(datagrams.len(), 1);
        let datagram = &mut datagrams[0];
        assert_eq!(datagram.version(), 4);
        assert_eq!(datagram.header_len(), IPV4_HEADER_LEN);
        assert_eq!(datagram.total_len(), 1500);
        assert_eq!(datagram.ttl(), 64);
        assert_eq!(datagram.protocol(), IpProtocol::UDP);
        assert_eq!(datagram.src_addr(), stack.config().ip);
        assert_eq!(datagram.dest_addr(), PEER_IP);
        assert!(!datagram.more_fragments());
        assert!(!datagram.dont_fragment());
        assert_eq!(datagram.fragment_offset(), 0);
        assert!(datagram.verify_checksum());
    }

    #[test]
    fn large_payload_is_fragmented() {
        let (mut stack, _clock) = test_stack();
        resolve_peer(&mut stack);

        let mut rng = rand::thread_rng();
        let payload: Vec<u8> = (0..3000).map(|_| rng.gen()).collect();
        stack.ip_out(Buffer::from_slice(&payload), PEER_IP, IpProtocol::UDP);

        let mut datagrams = sent_datagrams(&stack);
        assert_eq!(datagrams.len(), 3);
        let offsets: Vec<u16> = datagrams.iter().map(|d| d.fragment_offset()).collect();
        let more: Vec<bool> = datagrams.iter().map(|d| d.more_fragments()).collect();
        let lens: Vec<u16> = datagrams.iter().map(|d| d.total_len()).collect();
        assert_eq!(offsets, vec![0, 185, 370]);
        assert_eq!(more, vec![true, true, false]);
        assert_eq!(lens, vec![1500, 1500, 60]);

        let id = datagrams[0].identification();
        let mut reassembled = Vec::new();
        for datagram in datagrams.iter_mut() {
            assert_eq!(datagram.identification(), id);
            assert!(datagram.verify_checksum());
            reassembled.extend_from_slice(datagram.payload());
        }
        assert_eq!(reassembled, payload);
    }

    #[test]
    fn fragments_stay_aligned_on_odd_mtu() {
        let config = StackConfig {
            mtu: 1006,
            ..StackConfig::default()
        };
        let (mut stack, _clock) = test_stack_with(config);
        resolve_peer(&mut stack);
        stack.ip_out(Buffer::from_slice(&[1; 2500]), PEER_IP, IpProtocol::UDP);

        let datagrams = sent_datagrams(&stack);
        let offsets: Vec<u16> = datagrams.iter().map(|d| d.fragment_offset()).collect();
        assert_eq!(offsets, vec![0, 123, 246]);
        assert!(datagrams.iter().all(|d| d.total_len() as usize <= 1006));
    }

    #[test]
    fn each_call_takes_a_new_id() {
        let (mut stack, _clock) = test_stack();
        resolve_peer(&mut stack);
        stack.ip_out(Buffer::from_slice(&[0; 3000]), PEER_IP, IpProtocol::UDP);
        stack.ip_out(Buffer::from_slice(&[0; 10]), PEER_IP, IpProtocol::UDP);
        stack.ip_out(Buffer::from_slice(&[0; 10]), PEER_IP, IpProtocol::ICMP);

        let ids: Vec<u16> = sent_datagrams(&stack)
            .iter()
            .map(|d| d.identification())
            .collect();
        assert_eq!(ids, vec![0, 0, 0, 1, 2]);
    }

    #[test]
    fn oversized_payload_is_dropped() {
        let (mut stack, _clock) = test_stack();
        resolve_peer(&mut stack);
        stack.ip_out(Buffer::new(IPV4_MAX_TOTAL_LEN), PEER_IP, IpProtocol::UDP);
        assert!(stack.driver().sent.is_empty());
    }

    #[test]
    fn unresolved_destination_keeps_only_the_last_fragment() {
        let (mut stack, _clock) = test_stack();
        stack.ip_out(Buffer::from_slice(&[0; 3000]), PEER_IP, IpProtocol::UDP);

        // Each fragment misses the cache; the slot keeps only the last one.
        let requests = stack
            .driver()
            .sent
            .iter()
            .filter(|f| EthernetFrame::new(&f[..]).unwrap().ether_type() == ARP_ETHER_TYPE)
            .count();
        assert_eq!(requests, 3);
        assert!(stack.has_pending_packet());
    }

    #[test]
    fn corrupted_checksum_is_not_dispatched() {
        let udp = RecordingUdp::new(UdpDisposition::Consumed);
        let (stack, _clock) = test_stack();
        let mut stack = stack.with_udp_layer(udp.clone());
        resolve_peer(&mut stack);

        let mut frame = ipv4_frame(PEER_IP, stack.config().ip, IpProtocol::UDP, &[9; 16]);
        frame[ETHERNET_HEADER_LEN + 10] ^= 0x01;
        stack.driver_mut().inbound.push_back(frame);
        stack.poll();

        assert!(udp.received().is_empty());
        assert!(stack.driver().sent.is_empty());
    }

    #[test]
    fn datagram_for_another_host_is_ignored() {
        let udp = RecordingUdp::new(UdpDisposition::Consumed);
        let (stack, _clock) = test_stack();
        let mut stack = stack.with_udp_layer(udp.clone());
        resolve_peer(&mut stack);

        let frame = ipv4_frame(PEER_IP, Ipv4Addr::new(10, 0, 2, 200), IpProtocol::UDP, &[9; 16]);
        stack.driver_mut().inbound.push_back(frame);
        stack.poll();

        assert!(udp.received().is_empty());
        assert!(stack.driver().sent.is_empty());
    }

    #[test]
    fn udp_segment_reaches_the_udp_layer() {
        let udp = RecordingUdp::new(UdpDisposition::Consumed);
        let (stack, _clock) = test_stack();
        let mut stack = stack.with_udp_layer(udp.clone());
        resolve_peer(&mut stack);

        let mut frame = ipv4_frame(PEER_IP, stack.config().ip, IpProtocol::UDP, b"segment");
        // Link padding after the datagram must not reach the UDP layer.
        frame.extend_from_slice(&[0; 20]);
        stack.driver_mut().inbound.push_back(frame);
        stack.poll();

        assert_eq!(udp.received(), vec![(b"segment".to_vec(), PEER_IP)]);
        assert!(stack.driver().sent.is_empty());
    }

    #[test]
    fn udp_reply_is_sent_back() {
        let udp = RecordingUdp::new(UdpDisposition::Reply(Buffer::from_slice(b"answer")));
        let (stack, _clock) = test_stack();
        let mut stack = stack.with_udp_layer(udp);
        resolve_peer(&mut stack);

        let frame = ipv4_frame(PEER_IP, stack.config().ip, IpProtocol::UDP, b"question");
        stack.driver_mut().inbound.push_back(frame);
        stack.poll();

        let datagrams = sent_datagrams(&stack);
        assert_eq!(datagrams.len(), 1);
        assert_eq!(datagrams[0].protocol(), IpProtocol::UDP);
        assert_eq!(datagrams[0].dest_addr(), PEER_IP);
        assert_eq!(datagrams[0].payload(), b"answer");
    }

    #[test]
    fn closed_port_yields_port_unreachable() {
        let (mut stack, _clock) = test_stack();
        resolve_peer(&mut stack);

        let segment: Vec<u8> = (0..32).collect();
        let original = ipv4_datagram(PEER_IP, stack.config().ip, IpProtocol::UDP, &segment);
        let frame = ipv4_frame(PEER_IP, stack.config().ip, IpProtocol::UDP, &segment);
        stack.driver_mut().inbound.push_back(frame);
        stack.poll();

        let datagrams = sent_datagrams(&stack);
        assert_eq!(datagrams.len(), 1);
        assert_eq!(datagrams[0].protocol(), IpProtocol::ICMP);
        assert_eq!(datagrams[0].dest_addr(), PEER_IP);

        let message = IcmpPacket::new(datagrams[0].payload()).unwrap();
        assert_eq!(message.msg_type(), ICMP_TYPE_DEST_UNREACHABLE);
        assert_eq!(message.code(), IcmpUnreachableCode::Port as u8);
        assert_eq!(message.data(), &original[..IPV4_HEADER_LEN + 8]);
        assert_eq!(&message.data()[IPV4_HEADER_LEN..], &segment[..8]);
    }

    #[test]
    fn unknown_protocol_yields_protocol_unreachable() {
        let (mut stack, _clock) = test_stack();
        resolve_peer(&mut stack);

        let frame = ipv4_frame(PEER_IP, stack.config().ip, IpProtocol::TCP, &[0; 20]);
        stack.driver_mut().inbound.push_back(frame);
        stack.poll();

        let datagrams = sent_datagrams(&stack);
        assert_eq!(datagrams.len(), 1);
        let message = IcmpPacket::new(datagrams[0].payload()).unwrap();
        assert_eq!(message.msg_type(), ICMP_TYPE_DEST_UNREACHABLE);
        assert_eq!(message.code(), IcmpUnreachableCode::Protocol as u8);
    }
}
