use crate::driver::Driver;
use crate::stack::Stack;
use ministack_packets::{
    Buffer, EthernetFrame, MacAddr, ARP_ETHER_TYPE, ETHERNET_HEADER_LEN, IPV4_ETHER_TYPE,
};
use tracing::{trace, warn};

impl<D: Driver> Stack<D> {
    /// Makes one non-blocking receive attempt and handles the frame if one
    /// arrived. Returns whether a frame was received.
    pub fn poll(&mut self) -> bool {
        let len = match self.driver.recv(&mut self.rx_frame) {
            Ok(Some(len)) if len > 0 => len.min(self.rx_frame.len()),
            Ok(_) => return false,
            Err(err) => {
                warn!(error = %err, "Driver receive failed");
                return false;
            }
        };

        let frame = Buffer::from_slice(&self.rx_frame[..len]);
        self.frame_in(frame);
        true
    }

    pub(crate) fn frame_in(&mut self, mut buffer: Buffer) {
        let ether_type = match EthernetFrame::new(buffer.data()) {
            Ok(frame) => frame.ether_type(),
            Err(err) => {
                warn!(len = buffer.len(), "Dropping frame: {}", err);
                return;
            }
        };
        if let Err(err) = buffer.remove_header(ETHERNET_HEADER_LEN) {
            warn!("Dropping frame: {}", err);
            return;
        }

        match ether_type {
            ARP_ETHER_TYPE => self.arp_in(buffer),
            IPV4_ETHER_TYPE => self.ip_in(buffer),
            other => trace!(ether_type = other, "Ignoring frame with unhandled ethertype"),
        }
    }

    /// Prepends an Ethernet header from this host to `dest` and transmits.
    pub(crate) fn frame_out(&mut self, mut buffer: Buffer, dest: MacAddr, ether_type: u16) {
        if let Err(err) = buffer.add_header(ETHERNET_HEADER_LEN) {
            warn!(len = buffer.len(), "Dropping outbound frame: {}", err);
            return;
        }

        match EthernetFrame::new(buffer.data_mut()) {
            Ok(mut frame) => {
                frame.set_dest_mac(dest);
                frame.set_src_mac(self.config.mac);
                frame.set_ether_type(ether_type);
            }
            Err(err) => {
                warn!("Dropping outbound frame: {}", err);
                return;
            }
        }

        if let Err(err) = self.driver.send(buffer.data()) {
            warn!(error = %err, %dest, "Driver send failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::utils::test::{frame_payload, test_stack};
    use ministack_packets::*;
    use std::io;

    #[test]
    fn poll_without_traffic_does_nothing() {
        let (mut stack, _clock) = test_stack();
        assert!(!stack.poll());
        assert!(stack.driver().sent.is_empty());
    }

    #[test]
    fn poll_survives_driver_errors() {
        let (mut stack, _clock) = test_stack();
        stack.driver_mut().recv_error = Some(io::ErrorKind::Other);
        assert!(!stack.poll());
    }

    #[test]
    fn frame_out_writes_header() {
        let (mut stack, _clock) = test_stack();
        let dest = MacAddr::new([1, 2, 3, 4, 5, 6]);
        stack.frame_out(Buffer::from_slice(&[0xde, 0xad]), dest, 0x88b5);

        let sent = &stack.driver().sent;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].len(), ETHERNET_HEADER_LEN + 2);
        let frame = EthernetFrame::new(&sent[0][..]).unwrap();
        assert_eq!(frame.dest_mac(), dest);
        assert_eq!(frame.src_mac(), stack.config().mac);
        assert_eq!(frame.ether_type(), 0x88b5);
        assert_eq!(frame_payload(&sent[0]), &[0xde, 0xad]);
    }

    #[test]
    fn frame_out_without_headroom_is_dropped() {
        let (mut stack, _clock) = test_stack();
        let mut buffer = Buffer::from_slice(&[0; 4]);
        buffer.add_header(BUF_HEADROOM - 4).unwrap();
        stack.frame_out(buffer, MacAddr::BROADCAST, IPV4_ETHER_TYPE);
        assert!(stack.driver().sent.is_empty());
    }

    #[test]
    fn unknown_ethertypes_and_runts_are_ignored() {
        let (mut stack, _clock) = test_stack();
        let mut ipv6 = vec![0u8; 60];
        ipv6[12..14].copy_from_slice(&0x86ddu16.to_be_bytes());
        stack.driver_mut().inbound.push_back(ipv6);
        stack.driver_mut().inbound.push_back(vec![0xff; 10]);

        assert!(stack.poll());
        assert!(stack.poll());
        assert!(!stack.poll());
        assert!(stack.driver().sent.is_empty());
    }
}
