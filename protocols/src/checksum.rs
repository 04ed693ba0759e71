//! RFC 1071 Internet checksum.

/// One's-complement sum of `data` taken as big-endian 16-bit words.
///
/// An odd trailing byte is padded with a zero low byte. Carries out of the
/// top 16 bits are folded back in until none remain.
pub fn ones_complement_sum(data: &[u8]) -> u16 {
    let mut words = data.chunks_exact(2);
    // u64 cannot overflow for any slice that fits in memory.
    let mut sum: u64 = words
        .by_ref()
        .map(|word| u64::from(u16::from_be_bytes([word[0], word[1]])))
        .sum();

    if let [last] = words.remainder() {
        sum += u64::from(*last) << 8;
    }

    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    sum as u16
}

/// The Internet checksum of `data`: the complement of its one's-complement sum.
pub fn checksum(data: &[u8]) -> u16 {
    !ones_complement_sum(data)
}
