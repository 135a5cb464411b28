//! 7-bit-clean System Exclusive payload codec.
//!
//! MIDI reserves the high bit of every in-frame byte, so arbitrary 8-bit payloads cannot cross
//! the wire as-is. This codec packs each group of up to seven payload bytes into an eight-byte
//! block: a header byte collecting the group's high bits (bit 6 holds the first byte's, then
//! descending), followed by the low seven bits of each byte. Encoded output never sets the high
//! bit, and [`decode`] restores the payload exactly.

/// Number of bytes [`encode`] produces for `n` payload bytes.
pub const fn encoded_len(n: usize) -> usize {
    let rem = n % 7;
    (n / 7) * 8 + if rem == 0 { 0 } else { rem + 1 }
}

/// Number of payload bytes [`decode`] recovers from `n` encoded bytes.
pub const fn decoded_len(n: usize) -> usize {
    n - (n + 7) / 8
}

/// Encodes an arbitrary 8-bit payload into the 7-bit-clean wire form.
///
/// `out` must hold at least [`encoded_len`]`(data.len())` bytes; the number of bytes written is
/// returned. A final partial block still carries its own header byte.
pub fn encode(data: &[u8], out: &mut [u8]) -> usize {
    let mut block = 0; // index of the current block's header byte
    let mut count = 0; // payload bytes packed into the current block
    let mut total = 0;

    for &byte in data {
        if count == 0 {
            out[block] = 0;
        }
        out[block] |= (byte >> 7) << (6 - count);
        out[block + 1 + count] = byte & 0x7F;
        count += 1;
        if count == 7 {
            block += 8;
            total += 8;
            count = 0;
        }
    }
    total + if count > 0 { count + 1 } else { 0 }
}

/// Decodes the 7-bit-clean wire form back into the original payload.
///
/// Every input byte at a position divisible by eight is a header consumed highest-bit-first.
/// `out` must hold at least [`decoded_len`]`(data.len())` bytes; the number of bytes written is
/// returned.
pub fn decode(data: &[u8], out: &mut [u8]) -> usize {
    let mut count = 0;
    let mut header = 0u8;
    let mut bit = 0u8;

    for (i, &byte) in data.iter().enumerate() {
        if i % 8 == 0 {
            header = byte;
            bit = 6;
        } else {
            let msb = ((header >> bit) & 1) << 7;
            bit = bit.wrapping_sub(1);
            out[count] = msb | byte;
            count += 1;
        }
    }
    count
}
