#![allow(non_camel_case_types)]

use libc;

pub(crate) const SIOCGIFINDEX: libc::c_ulong = 0x8933;

/// `ETH_P_ALL` in network byte order, as both `socket(2)` and `sll_protocol` expect it.
pub(crate) const ETH_P_ALL_BE: u16 = (libc::ETH_P_ALL as u16).to_be();

/// `sll_pkttype` values from linux/if_packet.h.
pub(crate) const PACKET_HOST: libc::c_uchar = 0;
pub(crate) const PACKET_BROADCAST: libc::c_uchar = 1;
pub(crate) const PACKET_MULTICAST: libc::c_uchar = 2;
pub(crate) const PACKET_OTHERHOST: libc::c_uchar = 3;
pub(crate) const PACKET_OUTGOING: libc::c_uchar = 4;

#[repr(C)]
#[derive(Clone, Copy)]
#[allow(dead_code)]
pub(crate) struct ifmap {
    pub(crate) mem_start: libc::c_ulong,
    pub(crate) mem_end: libc::c_ulong,
    pub(crate) base_addr: libc::c_ushort,
    pub(crate) irq: libc::c_uchar,
    pub(crate) dma: libc::c_uchar,
    pub(crate) port: libc::c_uchar,
}

// Only the index member is read; the rest keeps the union at kernel size.
#[repr(C)]
#[allow(dead_code)]
pub(crate) union ifru {
    pub(crate) ifru_addr: libc::sockaddr,
    pub(crate) ifru_ivalue: libc::c_int,
    pub(crate) ifru_map: ifmap,
}

#[repr(C)]
pub(crate) union ifrn {
    pub(crate) ifrn_name: [libc::c_char; libc::IFNAMSIZ],
}

#[repr(C)]
pub(crate) struct ifreq {
    pub(crate) ifr_ifrn: ifrn,
    pub(crate) ifr_ifru: ifru,
}
