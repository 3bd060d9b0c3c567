use crate::checksum::{fill_checksum_field, verify_checksum_field};
use std::convert::TryInto;

/// Type, code, checksum and the four type-specific bytes.
pub const ICMP_HEADER_LEN: usize = 8;

pub const ICMP_TYPE_ECHO_REPLY: u8 = 0;
pub const ICMP_TYPE_DEST_UNREACHABLE: u8 = 3;
pub const ICMP_TYPE_ECHO_REQUEST: u8 = 8;

/// Destination unreachable codes this stack generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmpUnreachableCode {
    Protocol = 2,
    Port = 3,
}

const CHECKSUM_OFFSET: usize = 2;

/// ICMP message view. The window covers the whole message, since the
/// checksum is computed over header and data together.
#[derive(Clone, Debug)]
pub struct IcmpPacket<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> IcmpPacket<T> {
    pub fn new(data: T) -> Result<IcmpPacket<T>, &'static str> {
        if data.as_ref().len() < ICMP_HEADER_LEN {
            return Err("Message is shorter than the ICMP header");
        }
        Ok(IcmpPacket { data })
    }

    pub fn msg_type(&self) -> u8 {
        self.data.as_ref()[0]
    }

    pub fn code(&self) -> u8 {
        self.data.as_ref()[1]
    }

    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes(self.data.as_ref()[2..=3].try_into().unwrap())
    }

    /// Echo identifier; unused bytes for unreachable messages.
    pub fn identifier(&self) -> u16 {
        u16::from_be_bytes(self.data.as_ref()[4..=5].try_into().unwrap())
    }

    /// Echo sequence number; unused bytes for unreachable messages.
    pub fn sequence(&self) -> u16 {
        u16::from_be_bytes(self.data.as_ref()[6..=7].try_into().unwrap())
    }

    pub fn data(&self) -> &[u8] {
        &self.data.as_ref()[ICMP_HEADER_LEN..]
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> IcmpPacket<T> {
    pub fn set_msg_type(&mut self, msg_type: u8) {
        self.data.as_mut()[0] = msg_type;
    }

    pub fn set_code(&mut self, code: u8) {
        self.data.as_mut()[1] = code;
    }

    pub fn set_identifier(&mut self, id: u16) {
        self.data.as_mut()[4..=5].copy_from_slice(&id.to_be_bytes());
    }

    pub fn set_sequence(&mut self, seq: u16) {
        self.data.as_mut()[6..=7].copy_from_slice(&seq.to_be_bytes());
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data.as_mut()[ICMP_HEADER_LEN..]
    }

    pub fn fill_checksum(&mut self) {
        fill_checksum_field(self.data.as_mut(), CHECKSUM_OFFSET);
    }

    pub fn verify_checksum(&mut self) -> bool {
        verify_checksum_field(self.data.as_mut(), CHECKSUM_OFFSET)
    }
}
