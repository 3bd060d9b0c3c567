use crate::*;
use std::convert::TryInto;

// 0                    6                    12                      14
// |---6 byte Dest_MAC--|---6 byte Src_MAC---|--2 Byte EtherType---|
pub const ETHERNET_HEADER_LEN: usize = 14;

/// Ethernet II header view over a byte window.
#[derive(Clone, Debug)]
pub struct EthernetFrame<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> EthernetFrame<T> {
    pub fn new(data: T) -> Result<EthernetFrame<T>, &'static str> {
        if data.as_ref().len() < ETHERNET_HEADER_LEN {
            return Err("Frame is less than the minimum of 14 bytes");
        }
        Ok(EthernetFrame { data })
    }

    pub fn dest_mac(&self) -> MacAddr {
        MacAddr::new(self.data.as_ref()[0..6].try_into().unwrap())
    }

    pub fn src_mac(&self) -> MacAddr {
        MacAddr::new(self.data.as_ref()[6..12].try_into().unwrap())
    }

    pub fn ether_type(&self) -> u16 {
        u16::from_be_bytes(self.data.as_ref()[12..=13].try_into().unwrap())
    }

    pub fn payload(&self) -> &[u8] {
        &self.data.as_ref()[ETHERNET_HEADER_LEN..]
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> EthernetFrame<T> {
    pub fn set_dest_mac(&mut self, mac: MacAddr) {
        self.data.as_mut()[..6].copy_from_slice(&mac.bytes);
    }

    pub fn set_src_mac(&mut self, mac: MacAddr) {
        self.data.as_mut()[6..12].copy_from_slice(&mac.bytes);
    }

    pub fn set_ether_type(&mut self, ether_type: u16) {
        self.data.as_mut()[12..=13].copy_from_slice(&ether_type.to_be_bytes());
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.data.as_mut()[ETHERNET_HEADER_LEN..]
    }
}
