use std::fmt;

/// Bytes reserved in front of every freshly initialized window, enough for an
/// Ethernet, an IPv4 and an ICMP header to be prepended without copying.
pub const BUF_HEADROOM: usize = 64;

/// A fixed-capacity byte region with a movable `(start, len)` window.
///
/// ```text
/// 0                 start              start + len       capacity
/// |<-- headroom -->|<---- window ---->|<-- unused -->|
/// ```
///
/// Headers are prepended with `add_header` and stripped with `remove_header`;
/// neither moves the payload. The backing region never grows after
/// allocation, so `start + len <= capacity` always holds.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    storage: Vec<u8>,
    start: usize,
    len: usize,
}

impl Buffer {
    /// Allocates a buffer whose zeroed window of `len` bytes sits at the end of
    /// a region of `len + BUF_HEADROOM` bytes.
    pub fn new(len: usize) -> Buffer {
        Buffer {
            storage: vec![0; len + BUF_HEADROOM],
            start: BUF_HEADROOM,
            len,
        }
    }

    /// Same as `new`, with `bytes` copied into the window.
    pub fn from_slice(bytes: &[u8]) -> Buffer {
        let mut buffer = Buffer::new(bytes.len());
        buffer.data_mut().copy_from_slice(bytes);
        buffer
    }

    /// Resets the window to `len` zeroed bytes ending at the end of the
    /// backing region.
    pub fn init(&mut self, len: usize) -> Result<(), &'static str> {
        if len > self.capacity() {
            return Err("Window length exceeds buffer capacity");
        }
        self.start = self.capacity() - len;
        self.len = len;
        for byte in self.data_mut() {
            *byte = 0;
        }
        Ok(())
    }

    /// Extends the window backward by `n` bytes.
    pub fn add_header(&mut self, n: usize) -> Result<(), &'static str> {
        if n > self.start {
            return Err("Not enough headroom to add header");
        }
        self.start -= n;
        self.len += n;
        Ok(())
    }

    /// Shrinks the window forward by `n` bytes.
    pub fn remove_header(&mut self, n: usize) -> Result<(), &'static str> {
        if n > self.len {
            return Err("Header is longer than the buffer window");
        }
        self.start += n;
        self.len -= n;
        Ok(())
    }

    /// Drops bytes from the tail of the window. Lengths past the current
    /// window are ignored.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.len = len;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Bytes available in front of the window.
    pub fn headroom(&self) -> usize {
        self.start
    }

    pub fn data(&self) -> &[u8] {
        &self.storage[self.start..self.start + self.len]
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.storage[self.start..self.start + self.len]
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        self.data()
    }
}

impl AsMut<[u8]> for Buffer {
    fn as_mut(&mut self) -> &mut [u8] {
        self.data_mut()
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("start", &self.start)
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .finish()
    }
}
