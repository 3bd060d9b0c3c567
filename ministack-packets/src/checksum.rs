/// Internet checksum (RFC 1071): the ones'-complement of the ones'-complement
/// sum of the big-endian 16 bit words in `data`. An odd trailing byte is
/// padded with zero.
pub fn checksum16(data: &[u8]) -> u16 {
    let mut chunks = data.chunks_exact(2);
    let mut sum = (&mut chunks).fold(0u32, |acc, x| {
        acc + u32::from(u16::from_be_bytes([x[0], x[1]]))
    });
    if let [last] = chunks.remainder() {
        sum += u32::from(u16::from_be_bytes([*last, 0]));
    }
    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

/// Recomputes the checksum of `data` with the big-endian field at
/// `field_offset` zeroed and compares it against the stored value. The field
/// is restored before returning.
pub(crate) fn verify_checksum_field(data: &mut [u8], field_offset: usize) -> bool {
    let stored = [data[field_offset], data[field_offset + 1]];
    data[field_offset] = 0;
    data[field_offset + 1] = 0;
    let computed = checksum16(data);
    data[field_offset..field_offset + 2].copy_from_slice(&stored);
    computed == u16::from_be_bytes(stored)
}

/// Zeroes the field at `field_offset`, computes the checksum of `data` and
/// stores it big-endian in that field.
pub(crate) fn fill_checksum_field(data: &mut [u8], field_offset: usize) {
    data[field_offset] = 0;
    data[field_offset + 1] = 0;
    let computed = checksum16(data);
    data[field_offset..field_offset + 2].copy_from_slice(&computed.to_be_bytes());
}
