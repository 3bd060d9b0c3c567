mod mock_driver;
pub use self::mock_driver::*;

pub use self::packet_generators::*;

pub use self::harness::*;
