mod ipv4_validator;
pub use self::ipv4_validator::*;

mod icmp_echo;
pub use self::icmp_echo::*;

/// One step of inbound packet handling. Returning `None` means the packet
/// stops here, either dropped or fully consumed.
pub trait Processor {
    type Input;
    type Output;

    fn process(&mut self, packet: Self::Input) -> Option<Self::Output>;
}
