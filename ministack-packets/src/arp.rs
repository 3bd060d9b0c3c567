use crate::*;
use std::convert::TryInto;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOp {
    Request = 1,
    Reply = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpHardwareType {
    Ethernet = 1,
}

/// Length of an ARP packet carrying Ethernet and IPv4 addresses.
pub const ARP_PACKET_LEN: usize = 28;

const HARDWARE_TYPE_RANGE: (usize, usize) = (0, 2);
const PROTOCOL_TYPE_RANGE: (usize, usize) = (2, 4);
const HARDWARE_ADDR_LEN_OFFSET: usize = 4;
const PROTOCOL_ADDR_LEN_OFFSET: usize = 5;
const OPCODE_RANGE: (usize, usize) = (6, 8);
const SENDER_HARDWARE_ADDR_RANGE: (usize, usize) = (8, 14);
const SENDER_PROTOCOL_ADDR_RANGE: (usize, usize) = (14, 18);
const TARGET_HARDWARE_ADDR_RANGE: (usize, usize) = (18, 24);
const TARGET_PROTOCOL_ADDR_RANGE: (usize, usize) = (24, 28);

///
/// Getters/setters for the Ethernet/IPv4 flavour of the packet structure
/// described in RFC 826 https://tools.ietf.org/html/rfc826
///
#[derive(Clone, Debug)]
pub struct ArpPacket<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> ArpPacket<T> {
    /// Only the length is checked here; field validation belongs to the
    /// receiver, which decides what it is willing to speak.
    pub fn new(data: T) -> Result<ArpPacket<T>, &'static str> {
        if data.as_ref().len() < ARP_PACKET_LEN {
            return Err("Data is too short to be an ARP packet");
        }
        Ok(ArpPacket { data })
    }

    pub fn hardware_type(&self) -> u16 {
        u16::from_be_bytes(self.arp_data(HARDWARE_TYPE_RANGE).try_into().unwrap())
    }

    pub fn protocol_type(&self) -> u16 {
        u16::from_be_bytes(self.arp_data(PROTOCOL_TYPE_RANGE).try_into().unwrap())
    }

    pub fn hardware_addr_len(&self) -> u8 {
        self.data.as_ref()[HARDWARE_ADDR_LEN_OFFSET]
    }

    pub fn protocol_addr_len(&self) -> u8 {
        self.data.as_ref()[PROTOCOL_ADDR_LEN_OFFSET]
    }

    pub fn opcode(&self) -> u16 {
        u16::from_be_bytes(self.arp_data(OPCODE_RANGE).try_into().unwrap())
    }

    pub fn sender_mac(&self) -> MacAddr {
        MacAddr::new(
            self.arp_data(SENDER_HARDWARE_ADDR_RANGE)
                .try_into()
                .unwrap(),
        )
    }

    pub fn sender_ip(&self) -> Ipv4Addr {
        let octets: [u8; 4] = self
            .arp_data(SENDER_PROTOCOL_ADDR_RANGE)
            .try_into()
            .unwrap();
        Ipv4Addr::from(octets)
    }

    pub fn target_mac(&self) -> MacAddr {
        MacAddr::new(
            self.arp_data(TARGET_HARDWARE_ADDR_RANGE)
                .try_into()
                .unwrap(),
        )
    }

    pub fn target_ip(&self) -> Ipv4Addr {
        let octets: [u8; 4] = self
            .arp_data(TARGET_PROTOCOL_ADDR_RANGE)
            .try_into()
            .unwrap();
        Ipv4Addr::from(octets)
    }

    pub fn is_request(&self) -> bool {
        self.opcode() == ArpOp::Request as u16
    }

    pub fn is_reply(&self) -> bool {
        self.opcode() == ArpOp::Reply as u16
    }

    pub fn into_inner(self) -> T {
        self.data
    }

    fn arp_data(&self, (start, end): (usize, usize)) -> &[u8] {
        &self.data.as_ref()[start..end]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> ArpPacket<T> {
    pub fn set_hardware_type(&mut self, htype: u16) {
        self.set_arp_data(&htype.to_be_bytes(), HARDWARE_TYPE_RANGE);
    }

    pub fn set_protocol_type(&mut self, ptype: u16) {
        self.set_arp_data(&ptype.to_be_bytes(), PROTOCOL_TYPE_RANGE);
    }

    pub fn set_hardware_addr_len(&mut self, len: u8) {
        self.data.as_mut()[HARDWARE_ADDR_LEN_OFFSET] = len;
    }

    pub fn set_protocol_addr_len(&mut self, len: u8) {
        self.data.as_mut()[PROTOCOL_ADDR_LEN_OFFSET] = len;
    }

    pub fn set_opcode(&mut self, code: u16) {
        self.set_arp_data(&code.to_be_bytes(), OPCODE_RANGE);
    }

    pub fn set_sender_mac(&mut self, addr: MacAddr) {
        self.set_arp_data(&addr.bytes, SENDER_HARDWARE_ADDR_RANGE);
    }

    pub fn set_sender_ip(&mut self, addr: Ipv4Addr) {
        self.set_arp_data(&addr.octets(), SENDER_PROTOCOL_ADDR_RANGE);
    }

    pub fn set_target_mac(&mut self, addr: MacAddr) {
        self.set_arp_data(&addr.bytes, TARGET_HARDWARE_ADDR_RANGE);
    }

    pub fn set_target_ip(&mut self, addr: Ipv4Addr) {
        self.set_arp_data(&addr.octets(), TARGET_PROTOCOL_ADDR_RANGE);
    }

    /// Writes the fixed Ethernet/IPv4 part of the header: hardware and
    /// protocol types and address lengths, plus the opcode.
    pub fn set_ethernet_ipv4_header(&mut self, op: ArpOp) {
        self.set_hardware_type(ArpHardwareType::Ethernet as u16);
        self.set_protocol_type(IPV4_ETHER_TYPE);
        self.set_hardware_addr_len(MAC_ADDR_LEN as u8);
        self.set_protocol_addr_len(IPV4_ADDR_LEN as u8);
        self.set_opcode(op as u16);
    }

    fn set_arp_data(&mut self, bytes: &[u8], (start, end): (usize, usize)) {
        self.data.as_mut()[start..end].copy_from_slice(bytes);
    }
}
