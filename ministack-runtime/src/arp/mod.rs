mod arp_table;
pub use self::arp_table::*;

use crate::driver::Driver;
use crate::stack::Stack;
use ministack_packets::{
    ArpHardwareType, ArpOp, ArpPacket, Buffer, MacAddr, ARP_ETHER_TYPE, ARP_PACKET_LEN,
    IPV4_ADDR_LEN, IPV4_ETHER_TYPE, MAC_ADDR_LEN,
};
use std::net::Ipv4Addr;
use tracing::{debug, warn};

/// An outbound frame payload parked until its next hop resolves.
#[derive(Debug)]
pub(crate) struct PendingPacket {
    pub buffer: Buffer,
    pub ip: Ipv4Addr,
    pub ether_type: u16,
}

impl<D: Driver> Stack<D> {
    /// Clears the cache and the pending slot, then announces ourselves with a
    /// request for our own address.
    pub(crate) fn arp_init(&mut self) {
        self.reset_arp_table();
        self.pending = None;
        let local_ip = self.config.ip;
        self.arp_request(local_ip);
    }

    /// Broadcasts a request for `target_ip` and marks it pending in the cache.
    pub(crate) fn arp_request(&mut self, target_ip: Ipv4Addr) {
        let mut buffer = Buffer::new(ARP_PACKET_LEN);
        if let Ok(mut packet) = ArpPacket::new(buffer.data_mut()) {
            packet.set_ethernet_ipv4_header(ArpOp::Request);
            packet.set_sender_mac(self.config.mac);
            packet.set_sender_ip(self.config.ip);
            packet.set_target_mac(MacAddr::ZERO);
            packet.set_target_ip(target_ip);
        }

        let now = self.clock.now();
        self.arp_table
            .update(target_ip, MacAddr::BROADCAST, ArpState::Pending, now);
        debug!(%target_ip, "Sending ARP request");
        self.frame_out(buffer, MacAddr::BROADCAST, ARP_ETHER_TYPE);
    }

    /// Sends `buffer` to the host owning `ip`, resolving its MAC first if the
    /// cache has no valid entry. Only one unresolved packet is held at a time.
    pub(crate) fn arp_out(&mut self, buffer: Buffer, ip: Ipv4Addr, ether_type: u16) {
        let now = self.clock.now();
        if let Some(mac) = self.arp_table.lookup(ip, now) {
            self.frame_out(buffer, mac, ether_type);
            return;
        }

        self.arp_request(ip);
        if let Some(dropped) = self.pending.take() {
            warn!(
                dropped_ip = %dropped.ip,
                len = dropped.buffer.len(),
                "Overwriting packet still waiting on ARP resolution"
            );
        }
        self.pending = Some(PendingPacket {
            buffer,
            ip,
            ether_type,
        });
    }

    pub(crate) fn arp_in(&mut self, buffer: Buffer) {
        let packet = match ArpPacket::new(buffer.data()) {
            Ok(packet) => packet,
            Err(err) => {
                warn!(len = buffer.len(), "Dropping ARP packet: {}", err);
                return;
            }
        };

        if packet.hardware_type() != ArpHardwareType::Ethernet as u16
            || packet.protocol_type() != IPV4_ETHER_TYPE
            || packet.hardware_addr_len() as usize != MAC_ADDR_LEN
            || packet.protocol_addr_len() as usize != IPV4_ADDR_LEN
            || !(packet.is_request() || packet.is_reply())
        {
            warn!(
                htype = packet.hardware_type(),
                ptype = packet.protocol_type(),
                opcode = packet.opcode(),
                "Dropping ARP packet with bad header"
            );
            return;
        }

        let sender_ip = packet.sender_ip();
        let sender_mac = packet.sender_mac();
        let now = self.clock.now();
        self.arp_table
            .update(sender_ip, sender_mac, ArpState::Valid, now);

        if let Some(pending) = self.pending.take() {
            match self.arp_table.lookup(pending.ip, now) {
                Some(mac) => {
                    debug!(ip = %pending.ip, %mac, "Flushing packet held for ARP resolution");
                    self.frame_out(pending.buffer, mac, pending.ether_type);
                }
                None => self.pending = Some(pending),
            }
        } else if packet.is_request() && packet.target_ip() == self.config.ip {
            self.arp_reply(sender_ip, sender_mac);
        }
    }

    fn arp_reply(&mut self, target_ip: Ipv4Addr, target_mac: MacAddr) {
        let mut buffer = Buffer::new(ARP_PACKET_LEN);
        if let Ok(mut packet) = ArpPacket::new(buffer.data_mut()) {
            packet.set_ethernet_ipv4_header(ArpOp::Reply);
            packet.set_sender_mac(self.config.mac);
            packet.set_sender_ip(self.config.ip);
            packet.set_target_mac(target_mac);
            packet.set_target_ip(target_ip);
        }

        debug!(%target_ip, %target_mac, "Answering ARP request");
        self.frame_out(buffer, target_mac, ARP_ETHER_TYPE);
    }
}
