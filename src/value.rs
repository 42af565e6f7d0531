//! XOR encoding for the value stream (spec §4.3).
//!
//! After the raw 64-bit first value, each subsequent value is XORed
//! against its predecessor:
//!
//! - `xor == 0`                                  -> bit `0`
//! - `xor != 0`, meaningful bits fit the previous window -> `10` + meaningful bits
//! - `xor != 0`, otherwise ("new window")         -> `11` + 5-bit leading zeros
//!   (capped at 31) + 6-bit `meaningful_length - 1` + meaningful bits
//!
//! A window is "reused" when the current XOR's leading and trailing zero
//! counts are each at least as large as the previous window's, so the
//! previously-agreed meaningful-bit slice still covers every set bit.

use crate::bitbuffer::{BitBuffer, BitReader};
use crate::error::{Error, Result};

/// Tracks the window state across consecutive value encodes/decodes.
#[derive(Debug, Clone, Copy)]
struct Window {
    prev_value_bits: u64,
    prev_leading_zeros: u32,
    prev_trailing_zeros: u32,
    /// `0` until the first new-window emission; used only to gate reuse,
    /// per the "prev_meaningful_length > 0" condition in spec §4.3.
    prev_meaningful_length: u32,
}

/// Encodes an ordered sequence of `f64` values.
pub fn encode(values: &[f64]) -> Result<BitBuffer> {
    let mut buf = BitBuffer::with_capacity(values.len());
    if values.is_empty() {
        return Ok(buf);
    }

    let first_bits = values[0].to_bits();
    buf.write_bits(first_bits, 64);

    let mut window = Window {
        prev_value_bits: first_bits,
        prev_leading_zeros: 0,
        prev_trailing_zeros: 0,
        prev_meaningful_length: 0,
    };

    for &v in &values[1..] {
        encode_one(&mut buf, &mut window, v);
    }

    Ok(buf)
}

fn encode_one(buf: &mut BitBuffer, window: &mut Window, value: f64) {
    let bits = value.to_bits();
    let xor = bits ^ window.prev_value_bits;

    if xor == 0 {
        buf.write_bit(false);
    } else {
        buf.write_bit(true);

        // Real (uncapped) zero-run lengths, used to decide window reuse
        // against the *stored* (possibly capped) previous window.
        let real_leading = xor.leading_zeros();
        let real_trailing = xor.trailing_zeros();

        let reuse = window.prev_meaningful_length > 0
            && real_leading >= window.prev_leading_zeros
            && real_trailing >= window.prev_trailing_zeros;

        if reuse {
            buf.write_bit(false);
            let meaningful_len = 64 - window.prev_leading_zeros - window.prev_trailing_zeros;
            let meaningful = (xor >> window.prev_trailing_zeros) & bitmask(meaningful_len);
            buf.write_bits(meaningful, meaningful_len as u8);
        } else {
            buf.write_bit(true);
            let stored_leading = real_leading.min(31);
            let meaningful_len = (64 - stored_leading - real_trailing).clamp(1, 64);
            let trailing_for_shift = 64 - stored_leading - meaningful_len;
            buf.write_bits(stored_leading as u64, 5);
            buf.write_bits((meaningful_len - 1) as u64, 6);
            let meaningful = (xor >> trailing_for_shift) & bitmask(meaningful_len);
            buf.write_bits(meaningful, meaningful_len as u8);

            window.prev_leading_zeros = stored_leading;
            window.prev_trailing_zeros = trailing_for_shift;
            window.prev_meaningful_length = meaningful_len;
        }
    }

    window.prev_value_bits = bits;
}

/// Decodes `count` values from `reader`.
pub fn decode(reader: &mut BitReader<'_>, count: usize) -> Result<Vec<f64>> {
    let mut out = Vec::with_capacity(count);
    if count == 0 {
        return Ok(out);
    }

    let first_bits = reader.read_bits(64).ok_or(Error::TruncatedPayload)?;
    out.push(f64::from_bits(first_bits));

    let mut window = Window {
        prev_value_bits: first_bits,
        prev_leading_zeros: 0,
        prev_trailing_zeros: 0,
        prev_meaningful_length: 0,
    };

    for _ in 1..count {
        let bits = decode_one(reader, &mut window)?;
        out.push(f64::from_bits(bits));
    }

    Ok(out)
}

fn decode_one(reader: &mut BitReader<'_>, window: &mut Window) -> Result<u64> {
    if !reader.read_bit().ok_or(Error::TruncatedPayload)? {
        return Ok(window.prev_value_bits);
    }

    let new_window = reader.read_bit().ok_or(Error::TruncatedPayload)?;
    let bits = if !new_window {
        if window.prev_meaningful_length == 0 {
            return Err(Error::TruncatedPayload);
        }
        let meaningful_len = window.prev_meaningful_length;
        let meaningful = reader
            .read_bits(meaningful_len as u8)
            .ok_or(Error::TruncatedPayload)?;
        let xor = meaningful << window.prev_trailing_zeros;
        window.prev_value_bits ^ xor
    } else {
        let leading = reader.read_bits(5).ok_or(Error::TruncatedPayload)? as u32;
        let meaningful_len = reader.read_bits(6).ok_or(Error::TruncatedPayload)? as u32 + 1;
        if leading + meaningful_len > 64 {
            return Err(Error::TruncatedPayload);
        }
        let trailing = 64 - leading - meaningful_len;
        let meaningful = reader
            .read_bits(meaningful_len as u8)
            .ok_or(Error::TruncatedPayload)?;
        let xor = meaningful << trailing;
        let value_bits = window.prev_value_bits ^ xor;

        window.prev_leading_zeros = leading;
        window.prev_trailing_zeros = trailing;
        window.prev_meaningful_length = meaningful_len;

        value_bits
    };

    window.prev_value_bits = bits;
    Ok(bits)
}

#[inline]
fn bitmask(n: u32) -> u64 {
    if n >= 64 {
        u64::MAX
    } else {
        (1u64 << n) - 1
    }
}
