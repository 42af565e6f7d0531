//! Delta-of-delta encoding for the timestamp stream (spec §4.2).
//!
//! Wire format per element:
//!
//! | Position | Encoding                                             |
//! |----------|-------------------------------------------------------|
//! | 0        | first timestamp: raw 64 bits                          |
//! | 1        | first delta `D1 = t1 - t0`, variable-length (below)    |
//! | 2+       | delta-of-delta `dod_i = D_i - D_{i-1}`, variable-length |
//!
//! Both the first delta and every delta-of-delta share one 5-bin
//! leading-unary prefix scheme:
//!
//! | Prefix | Range              | Body                                    |
//! |--------|--------------------|------------------------------------------|
//! | `0`    | d == 0             | none                                     |
//! | `10`   | -63 <= d <= 64     | 7 bits, stored as `d + 63`               |
//! | `110`  | -255 <= d <= 256   | 9 bits, stored as `d + 255`              |
//! | `1110` | -2047 <= d <= 2048 | 12 bits, stored as `d + 2047`            |
//! | `1111` | otherwise          | 32 bits, two's-complement; out-of-range is an error |

use crate::bitbuffer::{BitBuffer, BitReader};
use crate::error::{Error, Result};

/// Metadata the bit packer needs for the inner header (spec §4.4), echoing
/// the first timestamp/delta the bitstream itself already encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampStreamMeta {
    pub first_timestamp: i64,
    pub first_delta: i32,
}

/// Encodes an ordered timestamp sequence. Returns the bitstream and the
/// metadata needed by the bit packer's inner header.
pub fn encode(timestamps: &[i64]) -> Result<(BitBuffer, TimestampStreamMeta)> {
    let mut buf = BitBuffer::with_capacity(timestamps.len() * 2);

    if timestamps.is_empty() {
        return Ok((
            buf,
            TimestampStreamMeta {
                first_timestamp: 0,
                first_delta: 0,
            },
        ));
    }

    let first_timestamp = timestamps[0];
    buf.write_bits(first_timestamp as u64, 64);

    if timestamps.len() == 1 {
        return Ok((
            buf,
            TimestampStreamMeta {
                first_timestamp,
                first_delta: 0,
            },
        ));
    }

    let first_delta = timestamps[1] - timestamps[0];
    encode_bucketed(&mut buf, first_delta)?;

    let mut prev_delta = first_delta;
    let mut prev_timestamp = timestamps[1];
    for &ts in &timestamps[2..] {
        let delta = ts - prev_timestamp;
        let dod = delta - prev_delta;
        encode_bucketed(&mut buf, dod)?;
        prev_delta = delta;
        prev_timestamp = ts;
    }

    // encode_bucketed already rejected first_delta above if it didn't fit i32.
    Ok((
        buf,
        TimestampStreamMeta {
            first_timestamp,
            first_delta: first_delta as i32,
        },
    ))
}

/// Decodes exactly `count` timestamps from `reader`.
pub fn decode(reader: &mut BitReader<'_>, count: usize) -> Result<Vec<i64>> {
    let mut out = Vec::with_capacity(count);
    if count == 0 {
        return Ok(out);
    }

    let raw_first = reader.read_bits(64).ok_or(Error::TruncatedPayload)?;
    let first_timestamp = raw_first as i64;
    out.push(first_timestamp);
    if count == 1 {
        return Ok(out);
    }

    let first_delta = decode_bucketed(reader)?;
    let mut prev_timestamp = first_timestamp + first_delta;
    out.push(prev_timestamp);
    let mut prev_delta = first_delta;

    for _ in 2..count {
        let dod = decode_bucketed(reader)?;
        let delta = prev_delta + dod;
        prev_timestamp += delta;
        prev_delta = delta;
        out.push(prev_timestamp);
    }

    Ok(out)
}

/// Picks the shortest bin whose range contains `d`; on a range boundary the
/// smaller bin wins (the `<=`/`>=` comparisons below naturally favor it,
/// since they are checked narrowest-first).
fn encode_bucketed(buf: &mut BitBuffer, d: i64) -> Result<()> {
    if d == 0 {
        buf.write_bit(false);
    } else if (-63..=64).contains(&d) {
        buf.write_bits(0b10, 2);
        buf.write_bits((d + 63) as u64, 7);
    } else if (-255..=256).contains(&d) {
        buf.write_bits(0b110, 3);
        buf.write_bits((d + 255) as u64, 9);
    } else if (-2047..=2048).contains(&d) {
        buf.write_bits(0b1110, 4);
        buf.write_bits((d + 2047) as u64, 12);
    } else {
        let d32 = i32::try_from(d).map_err(|_| Error::TimestampOutOfRange { dod: d })?;
        buf.write_bits(0b1111, 4);
        buf.write_bits(d32 as u32 as u64, 32);
    }
    Ok(())
}

fn decode_bucketed(reader: &mut BitReader<'_>) -> Result<i64> {
    if !reader.read_bit().ok_or(Error::TruncatedPayload)? {
        return Ok(0);
    }
    if !reader.read_bit().ok_or(Error::TruncatedPayload)? {
        let raw = reader.read_bits(7).ok_or(Error::TruncatedPayload)?;
        return Ok(raw as i64 - 63);
    }
    if !reader.read_bit().ok_or(Error::TruncatedPayload)? {
        let raw = reader.read_bits(9).ok_or(Error::TruncatedPayload)?;
        return Ok(raw as i64 - 255);
    }
    if !reader.read_bit().ok_or(Error::TruncatedPayload)? {
        let raw = reader.read_bits(12).ok_or(Error::TruncatedPayload)?;
        return Ok(raw as i64 - 2047);
    }
    let raw = reader.read_bits(32).ok_or(Error::TruncatedPayload)?;
    Ok(raw as u32 as i32 as i64)
}
