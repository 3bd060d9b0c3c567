use ministack_packets::MacAddr;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpState {
    Invalid,
    Pending,
    Valid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpEntry {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
    pub state: ArpState,
    pub expires_at: Instant,
}

/// Fixed-size IPv4 -> MAC cache.
///
/// Expiry is lazy: stale entries are only marked `Invalid` when `update` sweeps
/// the table, and `lookup` ignores entries whose time has passed. A full table
/// never rejects an update; a slot is always reclaimed, preferring `Invalid`
/// slots, then `Pending` ones, then the `Valid` entry closest to expiry.
pub struct ArpTable {
    entries: Vec<ArpEntry>,
    entry_ttl: Duration,
    pending_ttl: Duration,
}

impl ArpTable {
    pub fn new(size: usize, entry_ttl: Duration, pending_ttl: Duration, now: Instant) -> Self {
        let empty = ArpEntry {
            ip: Ipv4Addr::UNSPECIFIED,
            mac: MacAddr::ZERO,
            state: ArpState::Invalid,
            expires_at: now,
        };
        ArpTable {
            entries: vec![empty; size],
            entry_ttl,
            pending_ttl,
        }
    }

    /// Returns the MAC of a `Valid`, unexpired entry for `ip`.
    pub fn lookup(&self, ip: Ipv4Addr, now: Instant) -> Option<MacAddr> {
        self.entries
            .iter()
            .find(|entry| entry.state == ArpState::Valid && entry.ip == ip && entry.expires_at > now)
            .map(|entry| entry.mac)
    }

    pub fn update(&mut self, ip: Ipv4Addr, mac: MacAddr, state: ArpState, now: Instant) {
        for entry in self.entries.iter_mut() {
            if entry.expires_at <= now {
                entry.state = ArpState::Invalid;
            }
        }

        // An address keeps a single slot; a refresh overwrites it in place.
        let slot = self
            .entries
            .iter()
            .position(|entry| entry.state != ArpState::Invalid && entry.ip == ip);
        if let Some(index) = slot {
            self.write(index, ip, mac, state, now + self.entry_ttl);
            return;
        }

        if let Some(index) = self.first_in_state(ArpState::Invalid) {
            self.write(index, ip, mac, state, now + self.entry_ttl);
            return;
        }

        if let Some(index) = self.first_in_state(ArpState::Pending) {
            self.write(index, ip, mac, state, now + self.pending_ttl);
            return;
        }

        let oldest = self
            .entries
            .iter()
            .enumerate()
            .min_by_key(|(_, entry)| entry.expires_at)
            .map(|(index, _)| index);
        if let Some(index) = oldest {
            debug!(evicted = %self.entries[index].ip, "ARP table full");
            self.write(index, ip, mac, state, now + self.entry_ttl);
        }
    }

    pub fn entries(&self) -> &[ArpEntry] {
        &self.entries
    }

    fn first_in_state(&self, state: ArpState) -> Option<usize> {
        self.entries.iter().position(|entry| entry.state == state)
    }

    fn write(&mut self, index: usize, ip: Ipv4Addr, mac: MacAddr, state: ArpState, expires_at: Instant) {
        debug!(%ip, %mac, ?state, slot = index, "ARP table update");
        self.entries[index] = ArpEntry {
            ip,
            mac,
            state,
            expires_at,
        };
    }
}
