use crate::checksum::{fill_checksum_field, verify_checksum_field};
use crate::*;
use std::convert::TryInto;
use std::net::Ipv4Addr;

/// Header length without options; the only size this stack emits or accepts.
pub const IPV4_HEADER_LEN: usize = 20;
/// Largest value representable in the total length field.
pub const IPV4_MAX_TOTAL_LEN: usize = 65535;
pub const IPV4_VERSION: u8 = 4;

const FLAG_DONT_FRAGMENT: u16 = 0x4000;
const FLAG_MORE_FRAGMENTS: u16 = 0x2000;
const FRAGMENT_OFFSET_MASK: u16 = 0x1FFF;
const CHECKSUM_OFFSET: usize = 10;

/// IPv4 header view over a byte window that starts at the IP header.
///
/// `new` only checks that a fixed header fits; version, header length and
/// checksum are left for the receiver to judge.
#[derive(Clone, Debug)]
pub struct Ipv4Packet<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> Ipv4Packet<T> {
    pub fn new(data: T) -> Result<Ipv4Packet<T>, &'static str> {
        if data.as_ref().len() < IPV4_HEADER_LEN {
            return Err("Data is too short to be an IPv4 Packet");
        }
        Ok(Ipv4Packet { data })
    }

    pub fn version(&self) -> u8 {
        (self.data.as_ref()[0] & 0xF0) >> 4
    }

    /// Header length in 32bit words.
    pub fn ihl(&self) -> u8 {
        self.data.as_ref()[0] & 0x0F
    }

    pub fn header_len(&self) -> usize {
        self.ihl() as usize * 4
    }

    pub fn tos(&self) -> u8 {
        self.data.as_ref()[1]
    }

    pub fn total_len(&self) -> u16 {
        u16::from_be_bytes(self.data.as_ref()[2..=3].try_into().unwrap())
    }

    pub fn identification(&self) -> u16 {
        u16::from_be_bytes(self.data.as_ref()[4..=5].try_into().unwrap())
    }

    fn flags_fragment(&self) -> u16 {
        u16::from_be_bytes(self.data.as_ref()[6..=7].try_into().unwrap())
    }

    pub fn dont_fragment(&self) -> bool {
        self.flags_fragment() & FLAG_DONT_FRAGMENT != 0
    }

    pub fn more_fragments(&self) -> bool {
        self.flags_fragment() & FLAG_MORE_FRAGMENTS != 0
    }

    /// Fragment offset in 8 byte units.
    pub fn fragment_offset(&self) -> u16 {
        self.flags_fragment() & FRAGMENT_OFFSET_MASK
    }

    pub fn ttl(&self) -> u8 {
        self.data.as_ref()[8]
    }

    pub fn protocol(&self) -> IpProtocol {
        IpProtocol::from(self.data.as_ref()[9])
    }

    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes(
            self.data.as_ref()[CHECKSUM_OFFSET..=CHECKSUM_OFFSET + 1]
                .try_into()
                .unwrap(),
        )
    }

    pub fn src_addr(&self) -> Ipv4Addr {
        let octets: [u8; 4] = self.data.as_ref()[12..16].try_into().unwrap();
        Ipv4Addr::from(octets)
    }

    pub fn dest_addr(&self) -> Ipv4Addr {
        let octets: [u8; 4] = self.data.as_ref()[16..20].try_into().unwrap();
        Ipv4Addr::from(octets)
    }

    /// Everything after the fixed header.
    pub fn payload(&self) -> &[u8] {
        &self.data.as_ref()[IPV4_HEADER_LEN..]
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Ipv4Packet<T> {
    /// Sets version 4 and a header length of `header_len` bytes.
    pub fn set_version_and_header_len(&mut self, header_len: usize) {
        self.data.as_mut()[0] = (IPV4_VERSION << 4) | (0x0F & (header_len / 4) as u8);
    }

    pub fn set_tos(&mut self, tos: u8) {
        self.data.as_mut()[1] = tos;
    }

    pub fn set_total_len(&mut self, len: u16) {
        self.data.as_mut()[2..=3].copy_from_slice(&len.to_be_bytes());
    }

    pub fn set_identification(&mut self, id: u16) {
        self.data.as_mut()[4..=5].copy_from_slice(&id.to_be_bytes());
    }

    /// Sets the more-fragments flag and the offset (8 byte units), clearing
    /// don't-fragment.
    pub fn set_fragment(&mut self, more_fragments: bool, offset: u16) {
        let mut field = offset & FRAGMENT_OFFSET_MASK;
        if more_fragments {
            field |= FLAG_MORE_FRAGMENTS;
        }
        self.data.as_mut()[6..=7].copy_from_slice(&field.to_be_bytes());
    }

    pub fn set_ttl(&mut self, ttl: u8) {
        self.data.as_mut()[8] = ttl;
    }

    pub fn set_protocol(&mut self, protocol: IpProtocol) {
        self.data.as_mut()[9] = protocol.into();
    }

    pub fn set_src_addr(&mut self, addr: Ipv4Addr) {
        self.data.as_mut()[12..16].copy_from_slice(&addr.octets());
    }

    pub fn set_dest_addr(&mut self, addr: Ipv4Addr) {
        self.data.as_mut()[16..20].copy_from_slice(&addr.octets());
    }

    /// Zeroes the checksum field, recomputes it over the header and stores
    /// the result.
    pub fn fill_checksum(&mut self) {
        let header_len = self.header_len().max(IPV4_HEADER_LEN);
        fill_checksum_field(&mut self.data.as_mut()[..header_len], CHECKSUM_OFFSET);
    }

    /// Recomputes the header checksum with the field zeroed and compares it
    /// to the received value. The received value is left in place.
    pub fn verify_checksum(&mut self) -> bool {
        let header_len = self.header_len().max(IPV4_HEADER_LEN);
        if header_len > self.data.as_ref().len() {
            return false;
        }
        verify_checksum_field(&mut self.data.as_mut()[..header_len], CHECKSUM_OFFSET)
    }
}
