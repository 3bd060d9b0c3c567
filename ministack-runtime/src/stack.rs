use crate::arp::{ArpTable, PendingPacket};
use crate::clock::{Clock, SystemClock};
use crate::config::StackConfig;
use crate::driver::Driver;
use crate::udp::{ClosedPorts, UdpLayer};
use ministack_packets::ETHERNET_HEADER_LEN;
use std::io;
use tracing::info;

/// One host's network stack bound to one link-layer driver.
///
/// The stack owns all protocol state: the ARP cache, the packet parked
/// while its next hop resolves, the receive scratch area and the datagram
/// identifier counter. Nothing runs in the background; the embedding program
/// calls `poll` in a loop and every protocol action happens inside that call
/// or inside `ip_out`.
pub struct Stack<D: Driver> {
    pub(crate) config: StackConfig,
    pub(crate) driver: D,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) udp: Box<dyn UdpLayer>,
    pub(crate) arp_table: ArpTable,
    pub(crate) pending: Option<PendingPacket>,
    pub(crate) rx_frame: Vec<u8>,
    pub(crate) next_id: u16,
}

impl<D: Driver> Stack<D> {
    pub fn new(config: StackConfig, driver: D) -> Result<Self, &'static str> {
        config.validate()?;
        let clock: Box<dyn Clock> = Box::new(SystemClock);
        let arp_table = ArpTable::new(
            config.arp_table_size,
            config.arp_entry_ttl,
            config.arp_pending_ttl,
            clock.now(),
        );
        let rx_frame = vec![0; config.mtu + ETHERNET_HEADER_LEN];
        Ok(Stack {
            config,
            driver,
            clock,
            udp: Box::new(ClosedPorts),
            arp_table,
            pending: None,
            rx_frame,
            next_id: 0,
        })
    }

    /// Replaces the time source used for ARP expiry. The cache is reset.
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self.reset_arp_table();
        self
    }

    pub fn with_udp_layer<U: UdpLayer + 'static>(mut self, udp: U) -> Self {
        self.udp = Box::new(udp);
        self
    }

    /// Opens the driver and announces this host on the link.
    pub fn open(&mut self) -> io::Result<()> {
        self.driver.open()?;
        info!(ip = %self.config.ip, mac = %self.config.mac, mtu = self.config.mtu, "Stack up");
        self.arp_init();
        Ok(())
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    pub fn arp_table(&self) -> &ArpTable {
        &self.arp_table
    }

    /// True while an outbound packet waits for its next hop to resolve.
    pub fn has_pending_packet(&self) -> bool {
        self.pending.is_some()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub(crate) fn reset_arp_table(&mut self) {
        self.arp_table = ArpTable::new(
            self.config.arp_table_size,
            self.config.arp_entry_ttl,
            self.config.arp_pending_ttl,
            self.clock.now(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arp::ArpState;
    use crate::utils::test::MockDriver;

    #[test]
    fn rejects_invalid_config() {
        let config = StackConfig {
            mtu: 20,
            ..StackConfig::default()
        };
        assert!(Stack::new(config, MockDriver::new()).is_err());

        let config = StackConfig {
            arp_table_size: 0,
            ..StackConfig::default()
        };
        assert!(Stack::new(config, MockDriver::new()).is_err());
    }

    #[test]
    fn starts_with_empty_state() {
        let stack = Stack::new(StackConfig::default(), MockDriver::new()).unwrap();
        assert_eq!(stack.arp_table().entries().len(), 16);
        assert!(stack
            .arp_table()
            .entries()
            .iter()
            .all(|e| e.state == ArpState::Invalid));
        assert!(!stack.has_pending_packet());
        assert!(stack.driver().sent.is_empty());
    }

    #[test]
    fn open_failure_is_reported() {
        let mut driver = MockDriver::new();
        driver.fail_open = true;
        let mut stack = Stack::new(StackConfig::default(), driver).unwrap();
        assert!(stack.open().is_err());
        assert!(stack.driver().sent.is_empty());
    }

    #[test]
    fn open_leaves_our_address_pending() {
        let mut stack = Stack::new(StackConfig::default(), MockDriver::new()).unwrap();
        stack.open().unwrap();
        let pending: Vec<_> = stack
            .arp_table()
            .entries()
            .iter()
            .filter(|e| e.state == ArpState::Pending)
            .collect();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].ip, stack.config().ip);
        assert!(!stack.has_pending_packet());
    }
}
