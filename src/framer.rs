//! Outer framing (spec §4.5): wraps a Packed Block with a self-describing,
//! CRC-checked header. Version 1 is 80 bytes and covers the plain Gorilla
//! path; version 2 adds a 4-byte `scale_decimals` field and is emitted
//! whenever the VictoriaMetrics preprocessor or zstd is in play.

use crate::error::{Error, Result};

pub const MAGIC: u64 = 0x0047_4F52_494C_4C41; // "GORILLA", big-endian in the wire format
pub const HEADER_LEN_V1: u16 = 80;
pub const HEADER_LEN_V2: u16 = 84;

pub const FLAG_PREPROCESSOR: u32 = 0x01;
pub const FLAG_IS_COUNTER: u32 = 0x02;
pub const FLAG_ZSTD: u32 = 0x04;
pub const FLAG_ZLIB: u32 = 0x08;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameVersion {
    V1,
    V2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OuterHeader {
    pub version: FrameVersion,
    pub count: u32,
    pub compressed_size: u32,
    pub original_size: u32,
    pub crc32: u32,
    pub first_timestamp: i64,
    pub first_delta: i32,
    pub first_value_bits: u64,
    pub timestamp_bits_len: u32,
    pub value_bits_len: u32,
    pub total_bits: u32,
    pub compression_ratio: f64,
    pub creation_time: i64,
    pub flags: u32,
    pub scale_decimals: u32,
}

impl OuterHeader {
    pub fn header_len(&self) -> u16 {
        match self.version {
            FrameVersion::V1 => HEADER_LEN_V1,
            FrameVersion::V2 => HEADER_LEN_V2,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let len = self.header_len() as usize;
        let mut out = vec![0u8; len];
        out[0..8].copy_from_slice(&MAGIC.to_be_bytes());
        let version_num: u16 = match self.version {
            FrameVersion::V1 => 1,
            FrameVersion::V2 => 2,
        };
        out[8..10].copy_from_slice(&version_num.to_be_bytes());
        out[10..12].copy_from_slice(&self.header_len().to_be_bytes());
        out[12..16].copy_from_slice(&self.count.to_be_bytes());
        out[16..20].copy_from_slice(&self.compressed_size.to_be_bytes());
        out[20..24].copy_from_slice(&self.original_size.to_be_bytes());
        out[24..28].copy_from_slice(&self.crc32.to_be_bytes());
        out[28..36].copy_from_slice(&self.first_timestamp.to_be_bytes());
        out[36..40].copy_from_slice(&self.first_delta.to_be_bytes());
        out[40..48].copy_from_slice(&self.first_value_bits.to_be_bytes());
        out[48..52].copy_from_slice(&self.timestamp_bits_len.to_be_bytes());
        out[52..56].copy_from_slice(&self.value_bits_len.to_be_bytes());
        out[56..60].copy_from_slice(&self.total_bits.to_be_bytes());
        out[60..68].copy_from_slice(&self.compression_ratio.to_be_bytes());
        out[68..76].copy_from_slice(&self.creation_time.to_be_bytes());
        out[76..80].copy_from_slice(&self.flags.to_be_bytes());
        if self.version == FrameVersion::V2 {
            out[80..84].copy_from_slice(&self.scale_decimals.to_be_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 12 {
            return Err(Error::TruncatedPayload);
        }
        let magic = u64::from_be_bytes(bytes[0..8].try_into().unwrap());
        if magic != MAGIC {
            return Err(Error::InvalidMagic);
        }
        let version_num = u16::from_be_bytes(bytes[8..10].try_into().unwrap());
        let version = match version_num {
            1 => FrameVersion::V1,
            2 => FrameVersion::V2,
            other => return Err(Error::UnsupportedVersion(other)),
        };
        let header_len = u16::from_be_bytes(bytes[10..12].try_into().unwrap());
        let expected_len = match version {
            FrameVersion::V1 => HEADER_LEN_V1,
            FrameVersion::V2 => HEADER_LEN_V2,
        };
        if header_len != expected_len {
            return Err(Error::InvalidHeaderLength {
                expected: expected_len,
                actual: header_len,
            });
        }
        if bytes.len() < header_len as usize {
            return Err(Error::TruncatedPayload);
        }

        let scale_decimals = if version == FrameVersion::V2 {
            u32::from_be_bytes(bytes[80..84].try_into().unwrap())
        } else {
            0
        };
        let flags = if version == FrameVersion::V2 {
            u32::from_be_bytes(bytes[76..80].try_into().unwrap())
        } else {
            0
        };

        Ok(Self {
            version,
            count: u32::from_be_bytes(bytes[12..16].try_into().unwrap()),
            compressed_size: u32::from_be_bytes(bytes[16..20].try_into().unwrap()),
            original_size: u32::from_be_bytes(bytes[20..24].try_into().unwrap()),
            crc32: u32::from_be_bytes(bytes[24..28].try_into().unwrap()),
            first_timestamp: i64::from_be_bytes(bytes[28..36].try_into().unwrap()),
            first_delta: i32::from_be_bytes(bytes[36..40].try_into().unwrap()),
            first_value_bits: u64::from_be_bytes(bytes[40..48].try_into().unwrap()),
            timestamp_bits_len: u32::from_be_bytes(bytes[48..52].try_into().unwrap()),
            value_bits_len: u32::from_be_bytes(bytes[52..56].try_into().unwrap()),
            total_bits: u32::from_be_bytes(bytes[56..60].try_into().unwrap()),
            compression_ratio: f64::from_be_bytes(bytes[60..68].try_into().unwrap()),
            creation_time: i64::from_be_bytes(bytes[68..76].try_into().unwrap()),
            flags,
            scale_decimals,
        })
    }
}

/// Computes the IEEE CRC-32 (as used by zlib) over a byte slice.
pub fn crc32(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}

/// Wraps a Packed Block with an outer header, selecting v1 vs v2 per
/// spec §4.5's encoder policy: v2 iff the preprocessor or zstd is used —
/// zlib alone, with no preprocessor, still emits v1.
///
/// `packed` is the pre-container Packed Block (inner header + bitstreams +
/// padding), used only for the `total_bits` diagnostic field. `compressed`
/// is what's actually written to the wire after `packed` went through the
/// outer container (identical to `packed` when the container is `none`);
/// it backs `compressed_size`, `crc32`, and the bytes appended after the
/// header.
#[allow(clippy::too_many_arguments)]
pub fn frame(
    packed: &[u8],
    compressed: &[u8],
    count: u32,
    first_timestamp: i64,
    first_delta: i32,
    first_value_bits: u64,
    timestamp_bits_len: u32,
    value_bits_len: u32,
    flags: u32,
    scale_decimals: u32,
    creation_time: i64,
) -> Vec<u8> {
    let version = if flags & (FLAG_PREPROCESSOR | FLAG_ZSTD) != 0 || scale_decimals != 0 {
        FrameVersion::V2
    } else {
        FrameVersion::V1
    };

    let original_size = count.saturating_mul(16);
    let compressed_size = compressed.len() as u32;
    let compression_ratio = if original_size == 0 {
        0.0
    } else {
        compressed_size as f64 / original_size as f64
    };

    let header = OuterHeader {
        version,
        count,
        compressed_size,
        original_size,
        crc32: crc32(compressed),
        first_timestamp,
        first_delta,
        first_value_bits,
        timestamp_bits_len,
        value_bits_len,
        total_bits: (packed.len() * 8) as u32,
        compression_ratio,
        creation_time,
        flags,
        scale_decimals,
    };

    let mut out = header.to_bytes();
    out.extend_from_slice(compressed);
    out
}

/// Parsed frame: the outer header plus the Packed Block bytes that follow
/// it, and whether the CRC matched.
pub struct Unframed<'a> {
    pub header: OuterHeader,
    pub packed: &'a [u8],
    pub checksum_ok: bool,
}

/// Parses and validates the outer header, returning it alongside the
/// (unverified-by-CRC) Packed Block slice. CRC mismatch is reported via
/// `checksum_ok`, not as an error — see spec §4.5/§7.
pub fn unframe(bytes: &[u8]) -> Result<Unframed<'_>> {
    let header = OuterHeader::from_bytes(bytes)?;
    let header_len = header.header_len() as usize;
    let remaining = bytes.len() - header_len;
    if header.compressed_size as usize > remaining {
        return Err(Error::TruncatedPayload);
    }
    let packed = &bytes[header_len..header_len + header.compressed_size as usize];
    let checksum_ok = crc32(packed) == header.crc32;
    Ok(Unframed {
        header,
        packed,
        checksum_ok,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header(version: FrameVersion) -> OuterHeader {
        OuterHeader {
            version,
            count: 3,
            compressed_size: 48,
            original_size: 48,
            crc32: 0xDEADBEEF,
            first_timestamp: 1_609_459_200,
            first_delta: 60,
            first_value_bits: 42.0_f64.to_bits(),
            timestamp_bits_len: 10,
            value_bits_len: 20,
            total_bits: 384,
            compression_ratio: 1.0,
            creation_time: 1_700_000_000,
            flags: if version == FrameVersion::V2 { FLAG_PREPROCESSOR } else { 0 },
            scale_decimals: if version == FrameVersion::V2 { 2 } else { 0 },
        }
    }

    #[test]
    fn v1_header_roundtrip() {
        let header = sample_header(FrameVersion::V1);
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), HEADER_LEN_V1 as usize);
        assert_eq!(OuterHeader::from_bytes(&bytes).unwrap(), header);
    }

    #[test]
    fn v2_header_roundtrip() {
        let header = sample_header(FrameVersion::V2);
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), HEADER_LEN_V2 as usize);
        assert_eq!(OuterHeader::from_bytes(&bytes).unwrap(), header);
    }

    #[test]
    fn v1_header_has_zero_flags_and_scale_on_read() {
        // A hand-crafted v1 header always reads back flags=0, scale=0.
        let header = sample_header(FrameVersion::V1);
        let bytes = header.to_bytes();
        let parsed = OuterHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.flags, 0);
        assert_eq!(parsed.scale_decimals, 0);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = sample_header(FrameVersion::V1).to_bytes();
        bytes[0] ^= 0xFF;
        assert_eq!(OuterHeader::from_bytes(&bytes), Err(Error::InvalidMagic));
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut bytes = sample_header(FrameVersion::V1).to_bytes();
        bytes[8..10].copy_from_slice(&99u16.to_be_bytes());
        assert_eq!(
            OuterHeader::from_bytes(&bytes),
            Err(Error::UnsupportedVersion(99))
        );
    }

    #[test]
    fn rejects_mismatched_header_length() {
        let mut bytes = sample_header(FrameVersion::V1).to_bytes();
        bytes[10..12].copy_from_slice(&84u16.to_be_bytes());
        assert_eq!(
            OuterHeader::from_bytes(&bytes),
            Err(Error::InvalidHeaderLength { expected: 80, actual: 84 })
        );
    }

    #[test]
    fn frame_and_unframe_roundtrip() {
        let packed = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let bytes = frame(&packed, &packed, 2, 1000, 60, 0, 8, 16, 0, 0, 1_700_000_000);
        let unframed = unframe(&bytes).unwrap();
        assert!(unframed.checksum_ok);
        assert_eq!(unframed.packed, &packed[..]);
        assert_eq!(unframed.header.version, FrameVersion::V1);
    }

    #[test]
    fn flipping_a_packed_block_bit_fails_crc() {
        let packed = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let mut bytes = frame(&packed, &packed, 2, 1000, 60, 0, 8, 16, 0, 0, 1_700_000_000);
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let unframed = unframe(&bytes).unwrap();
        assert!(!unframed.checksum_ok);
    }

    #[test]
    fn version_selection_follows_preprocessor_and_zstd_flags_and_scale() {
        let packed = vec![0u8; 4];
        let v1 = frame(&packed, &packed, 1, 0, 0, 0, 0, 0, 0, 0, 0);
        assert_eq!(OuterHeader::from_bytes(&v1).unwrap().version, FrameVersion::V1);

        let v2_preprocessor = frame(&packed, &packed, 1, 0, 0, 0, 0, 0, FLAG_PREPROCESSOR, 0, 0);
        assert_eq!(OuterHeader::from_bytes(&v2_preprocessor).unwrap().version, FrameVersion::V2);

        let v2_zstd = frame(&packed, &packed, 1, 0, 0, 0, 0, 0, FLAG_ZSTD, 0, 0);
        assert_eq!(OuterHeader::from_bytes(&v2_zstd).unwrap().version, FrameVersion::V2);

        let v2_scale = frame(&packed, &packed, 1, 0, 0, 0, 0, 0, 0, 2, 0);
        assert_eq!(OuterHeader::from_bytes(&v2_scale).unwrap().version, FrameVersion::V2);
    }

    #[test]
    fn zlib_flag_alone_stays_v1() {
        // A zlib-only encode carries no preprocessor flag and no scale, so
        // even though FLAG_ZLIB makes `flags != 0`, the header must still
        // select v1 (spec's encoder policy only escalates on preprocessor
        // or zstd, not on the outer container choice).
        let packed = vec![0u8; 4];
        let bytes = frame(&packed, &packed, 1, 0, 0, 0, 0, 0, FLAG_ZLIB, 0, 0);
        assert_eq!(OuterHeader::from_bytes(&bytes).unwrap().version, FrameVersion::V1);
    }

    #[test]
    fn total_bits_reflects_packed_block_not_compressed_wire_size() {
        let packed = vec![0u8; 100];
        let compressed = vec![0u8; 10];
        let bytes = frame(&packed, &compressed, 1, 0, 0, 0, 0, 0, FLAG_ZLIB, 0, 0);
        let header = OuterHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header.total_bits, 100 * 8);
        assert_eq!(header.compressed_size, 10);
        assert_eq!(bytes.len() - header.header_len() as usize, 10);
    }
}
