use ministack_packets::{MacAddr, IPV4_HEADER_LEN};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Interface identity and protocol tunables, supplied by the embedding program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackConfig {
    /// This host's IPv4 address.
    pub ip: Ipv4Addr,
    /// This host's MAC address, used as the source of every frame.
    pub mac: MacAddr,
    /// Largest Ethernet payload the link accepts.
    pub mtu: usize,
    /// Number of slots in the ARP cache.
    pub arp_table_size: usize,
    /// Lifetime of a resolved ARP entry.
    pub arp_entry_ttl: Duration,
    /// Lifetime given to an entry written over an evicted pending slot.
    pub arp_pending_ttl: Duration,
    /// TTL written into outbound datagrams.
    pub default_ttl: u8,
}

impl Default for StackConfig {
    fn default() -> Self {
        StackConfig {
            ip: Ipv4Addr::new(10, 0, 2, 15),
            mac: MacAddr::new([0x08, 0x00, 0x27, 0x02, 0xa5, 0xe3]),
            mtu: 1500,
            arp_table_size: 16,
            arp_entry_ttl: Duration::from_secs(300),
            arp_pending_ttl: Duration::from_secs(5),
            default_ttl: 64,
        }
    }
}

impl StackConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.mtu < IPV4_HEADER_LEN + 8 {
            return Err("MTU cannot carry an IPv4 header and one fragment unit");
        }
        if self.arp_table_size == 0 {
            return Err("ARP table needs at least one slot");
        }
        Ok(())
    }

    /// Largest IP payload carried by one fragment. Fragment offsets are
    /// counted in 8 byte units, so every non-final fragment must be a
    /// multiple of 8 bytes long.
    pub fn max_fragment_payload(&self) -> usize {
        (self.mtu - IPV4_HEADER_LEN) & !7
    }
}
