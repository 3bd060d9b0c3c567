/// The Stack is the handle that owns every piece of protocol state for one host on one link: configuration, the
/// driver, the ARP cache and the packet parked while its next hop resolves. There is no background work. The embedding
/// program calls `poll` repeatedly, and upper layers hand datagrams to `ip_out`.
pub mod stack;
pub use self::stack::Stack;

/// Identity and tunables for a stack: interface address, MAC, MTU and ARP cache sizing. Supplied by the embedding
/// program and checked once when the stack is built.
pub mod config;

/// Drivers move whole Ethernet frames between the stack and a link-layer device. The stack only ever asks for one
/// non-blocking receive at a time, so a driver never needs to buffer on the stack's behalf.
pub mod driver;

/// Time source for ARP cache expiry.
pub mod clock;

/// The boundary to the transport layer. UDP itself lives outside this crate; the IP layer hands it segments and acts
/// on what it says to do next.
pub mod udp;

/// Address resolution: the fixed-size IPv4 to MAC cache, and the request/reply handling that fills it.
pub mod arp;

/// Processors are single steps of inbound packet handling that either pass a packet on or stop it. The IPv4
/// validator and the ICMP echo responder are processors, which keeps them testable without a stack around them.
pub mod processor;

mod ethernet;
mod icmp;
mod ip;

/// Utility module
mod utils;
