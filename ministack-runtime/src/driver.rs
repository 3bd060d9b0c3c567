use std::io;

/// Raw frame I/O for one link-layer device.
///
/// Frames cross this boundary as complete Ethernet frames, header included.
pub trait Driver {
    /// Opens the device. Called once by `Stack::open`.
    fn open(&mut self) -> io::Result<()>;

    /// Transmits one frame.
    fn send(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Attempts to receive one frame into `frame` without blocking. Returns
    /// `Ok(None)` when nothing is waiting.
    fn recv(&mut self, frame: &mut [u8]) -> io::Result<Option<usize>>;
}
