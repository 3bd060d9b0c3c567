mod types;
pub use self::types::*;

mod buffer;
pub use self::buffer::*;

mod checksum;
pub use self::checksum::*;

mod ethernet;
pub use self::ethernet::*;

mod arp;
pub use self::arp::*;

mod ipv4;
pub use self::ipv4::*;

mod icmp;
pub use self::icmp::*;
