//! Bit packer (spec §4.4): weaves the timestamp and value bitstreams into
//! one byte-aligned Packed Block behind a 32-byte inner header.
//!
//! ```text
//! offset  width  field
//! 0       4      count (u32)
//! 4       8      first timestamp (i64)
//! 12      8      first value bits (u64)
//! 20      4      first delta (i32; 0 if count <= 1)
//! 24      4      timestamp-bits length in bits (u32)
//! 28      4      value-bits length in bits (u32)
//! ```

use crate::bitbuffer::{BitBuffer, BitReader};
use crate::error::{Error, Result};
use crate::point::DataPoint;
use crate::timestamp::{self, TimestampStreamMeta};
use crate::value;

pub const INNER_HEADER_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InnerHeader {
    pub count: u32,
    pub first_timestamp: i64,
    pub first_value_bits: u64,
    pub first_delta: i32,
    pub timestamp_bits_len: u32,
    pub value_bits_len: u32,
}

impl InnerHeader {
    pub fn to_bytes(self) -> [u8; INNER_HEADER_LEN] {
        let mut out = [0u8; INNER_HEADER_LEN];
        out[0..4].copy_from_slice(&self.count.to_be_bytes());
        out[4..12].copy_from_slice(&self.first_timestamp.to_be_bytes());
        out[12..20].copy_from_slice(&self.first_value_bits.to_be_bytes());
        out[20..24].copy_from_slice(&self.first_delta.to_be_bytes());
        out[24..28].copy_from_slice(&self.timestamp_bits_len.to_be_bytes());
        out[28..32].copy_from_slice(&self.value_bits_len.to_be_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < INNER_HEADER_LEN {
            return Err(Error::TruncatedPayload);
        }
        Ok(Self {
            count: u32::from_be_bytes(bytes[0..4].try_into().unwrap()),
            first_timestamp: i64::from_be_bytes(bytes[4..12].try_into().unwrap()),
            first_value_bits: u64::from_be_bytes(bytes[12..20].try_into().unwrap()),
            first_delta: i32::from_be_bytes(bytes[20..24].try_into().unwrap()),
            timestamp_bits_len: u32::from_be_bytes(bytes[24..28].try_into().unwrap()),
            value_bits_len: u32::from_be_bytes(bytes[28..32].try_into().unwrap()),
        })
    }
}

/// Produces a byte-aligned Packed Block (inner header + timestamp bits +
/// value bits + zero padding) from a data point sequence already split into
/// its timestamp and value components (the value component may already
/// have been through the preprocessor).
pub fn pack(timestamps: &[i64], values: &[f64]) -> Result<Vec<u8>> {
    if timestamps.len() != values.len() {
        return Err(Error::InvalidInput(
            "timestamp count does not match value count".to_string(),
        ));
    }

    let (ts_buf, TimestampStreamMeta { first_timestamp, first_delta }) =
        timestamp::encode(timestamps)?;
    let value_buf = value::encode(values)?;

    let first_value_bits = values.first().map(|v| v.to_bits()).unwrap_or(0);

    let header = InnerHeader {
        count: timestamps.len() as u32,
        first_timestamp,
        first_value_bits,
        first_delta: if timestamps.len() > 1 { first_delta } else { 0 },
        timestamp_bits_len: ts_buf.len_bits() as u32,
        value_bits_len: value_buf.len_bits() as u32,
    };

    let mut out = BitBuffer::with_capacity(INNER_HEADER_LEN + ts_buf.as_bytes().len() + value_buf.as_bytes().len());
    out.write_aligned_bytes(&header.to_bytes());
    out.append_bits(&ts_buf);
    out.append_bits(&value_buf);
    out.pad_to_byte();

    Ok(out.into_bytes())
}

/// Parses a Packed Block back into its original data points.
pub fn unpack(bytes: &[u8]) -> Result<Vec<DataPoint>> {
    let header = InnerHeader::from_bytes(bytes)?;
    let total_bits = bytes.len() * 8;
    let mut reader = BitReader::from_raw(bytes, total_bits);
    reader
        .skip_bits(INNER_HEADER_LEN * 8)
        .ok_or(Error::TruncatedPayload)?;

    let count = header.count as usize;
    if reader.remaining() < header.timestamp_bits_len as usize + header.value_bits_len as usize {
        return Err(Error::TruncatedPayload);
    }

    let timestamps = timestamp::decode(&mut reader, count)?;
    let values = value::decode(&mut reader, count)?;

    Ok(timestamps
        .into_iter()
        .zip(values)
        .map(|(t, v)| DataPoint::new(t, v))
        .collect())
}
