use crate::driver::Driver;
use crate::udp::{UdpDisposition, UdpLayer};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::net::Ipv4Addr;
use std::rc::Rc;

/// In-memory link: frames queued in `inbound` are handed out by `recv` one at
/// a time, and every transmitted frame is recorded in `sent`.
#[derive(Default, Debug)]
pub struct MockDriver {
    pub inbound: VecDeque<Vec<u8>>,
    pub sent: Vec<Vec<u8>>,
    pub opened: bool,
    pub fail_open: bool,
    pub recv_error: Option<io::ErrorKind>,
}

impl MockDriver {
    pub fn new() -> Self {
        MockDriver::default()
    }
}

impl Driver for MockDriver {
    fn open(&mut self) -> io::Result<()> {
        if self.fail_open {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such device"));
        }
        self.opened = true;
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        self.sent.push(frame.to_vec());
        Ok(())
    }

    fn recv(&mut self, frame: &mut [u8]) -> io::Result<Option<usize>> {
        if let Some(kind) = self.recv_error {
            return Err(io::Error::new(kind, "mock receive failure"));
        }
        match self.inbound.pop_front() {
            Some(bytes) => {
                let len = bytes.len().min(frame.len());
                frame[..len].copy_from_slice(&bytes[..len]);
                Ok(Some(len))
            }
            None => Ok(None),
        }
    }
}

/// UDP layer that records what it is handed and always answers the same way.
/// Clones share the record.
#[derive(Clone)]
pub struct RecordingUdp {
    received: Rc<RefCell<Vec<(Vec<u8>, Ipv4Addr)>>>,
    disposition: UdpDisposition,
}

impl RecordingUdp {
    pub fn new(disposition: UdpDisposition) -> Self {
        RecordingUdp {
            received: Rc::new(RefCell::new(Vec::new())),
            disposition,
        }
    }

    pub fn received(&self) -> Vec<(Vec<u8>, Ipv4Addr)> {
        self.received.borrow().clone()
    }
}

impl UdpLayer for RecordingUdp {
    fn udp_in(&mut self, segment: &[u8], src_ip: Ipv4Addr) -> UdpDisposition {
        self.received.borrow_mut().push((segment.to_vec(), src_ip));
        self.disposition.clone()
    }
}
