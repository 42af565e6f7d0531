//! # Gorilla
//!
//! A lossless time-series compression codec implementing Facebook's Gorilla
//! algorithm (delta-of-delta timestamps, XOR-windowed floating-point values),
//! with an optional VictoriaMetrics-style value preprocessor (counter-delta
//! and decimal scaling) and an optional outer byte compressor (zlib or
//! zstd) layered on top.
//!
//! ```rust
//! use gorilla::{encode, decode, DataPoint, EncodeOptions, DecodeOptions};
//!
//! let points = vec![
//!     DataPoint::new(1_700_000_000, 42.0),
//!     DataPoint::new(1_700_000_060, 42.5),
//!     DataPoint::new(1_700_000_120, 41.9),
//! ];
//!
//! let bytes = encode(&points, &EncodeOptions::default()).unwrap();
//! let (decoded, warnings) = decode(&bytes, &DecodeOptions::default()).unwrap();
//! assert_eq!(decoded, points);
//! assert!(!warnings.checksum_failed);
//! ```
//!
//! A block is three layers, outside in: a [`container`] byte compressor
//! wraps a [`framer`] outer header + CRC, which wraps a [`packer`] inner
//! header + the [`timestamp`] and [`value`] bitstreams.

pub mod bitbuffer;
pub mod config;
pub mod container;
pub mod error;
pub mod framer;
pub mod packer;
pub mod point;
pub mod preprocessor;
pub mod timestamp;
pub mod value;

use std::time::{SystemTime, UNIX_EPOCH};

pub use config::{DecodeOptions, DecodeWarnings, EncodeOptions, HeaderInfo};
pub use container::Container;
pub use error::{Error, Result};
pub use point::DataPoint;
pub use preprocessor::ScaleOption;

/// Encodes a sequence of data points into a framed, optionally compressed
/// block. `points` need not be pre-sorted by the caller, but the codec does
/// not sort them either — out-of-order timestamps simply widen the
/// delta-of-delta stream.
pub fn encode(points: &[DataPoint], opts: &EncodeOptions) -> Result<Vec<u8>> {
    let timestamps: Vec<i64> = points.iter().map(|p| p.timestamp).collect();
    let mut values: Vec<f64> = points.iter().map(|p| p.value).collect();

    let mut flags = 0u32;
    let mut scale_decimals = 0u32;
    if opts.preprocessor_enabled {
        flags |= framer::FLAG_PREPROCESSOR;
        if opts.is_counter {
            flags |= framer::FLAG_IS_COUNTER;
        }
        let (transformed, resolved_scale) =
            preprocessor::apply(&values, opts.is_counter, opts.scale_decimals);
        values = transformed;
        scale_decimals = resolved_scale;
    }

    let packed = packer::pack(&timestamps, &values)?;
    let inner = packer::InnerHeader::from_bytes(&packed)?;

    match container::resolve(opts.container) {
        Container::Zstd => flags |= framer::FLAG_ZSTD,
        Container::Zlib => flags |= framer::FLAG_ZLIB,
        Container::None => {}
        Container::Auto => unreachable!("resolve() never returns Auto"),
    }
    let compressed = container::compress(&packed, opts.container)?;

    let creation_time = opts.override_creation_time.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    });

    Ok(framer::frame(
        &packed,
        &compressed,
        inner.count,
        inner.first_timestamp,
        inner.first_delta,
        inner.first_value_bits,
        inner.timestamp_bits_len,
        inner.value_bits_len,
        flags,
        scale_decimals,
        creation_time,
    ))
}

/// Decodes a block produced by [`encode`]. On a non-strict CRC mismatch the
/// decode still succeeds, with `DecodeWarnings::checksum_failed` set; set
/// [`DecodeOptions::strict`] to turn that into [`Error::ChecksumMismatch`].
pub fn decode(bytes: &[u8], opts: &DecodeOptions) -> Result<(Vec<DataPoint>, DecodeWarnings)> {
    let unframed = framer::unframe(bytes)?;

    let mut warnings = DecodeWarnings::default();
    if !unframed.checksum_ok {
        if opts.strict {
            return Err(Error::ChecksumMismatch);
        }
        warnings.checksum_failed = true;
    }

    let container_kind = opts.container_override.unwrap_or_else(|| {
        if unframed.header.flags & framer::FLAG_ZSTD != 0 {
            Container::Zstd
        } else if unframed.header.flags & framer::FLAG_ZLIB != 0 {
            Container::Zlib
        } else {
            Container::None
        }
    });

    let packed = container::decompress(unframed.packed, container_kind)?;
    let mut points = packer::unpack(&packed)?;

    if unframed.header.flags & framer::FLAG_PREPROCESSOR != 0 {
        let is_counter = unframed.header.flags & framer::FLAG_IS_COUNTER != 0;
        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        let restored = preprocessor::reverse(values, is_counter, unframed.header.scale_decimals);
        for (point, value) in points.iter_mut().zip(restored) {
            point.value = value;
        }
    }

    Ok((points, warnings))
}

/// Reads the outer header without touching the Packed Block, for callers
/// that only need the block's metadata (size, point count, first timestamp).
pub fn header_info(bytes: &[u8]) -> Result<HeaderInfo> {
    let header = framer::OuterHeader::from_bytes(bytes)?;
    Ok(HeaderInfo {
        version: match header.version {
            framer::FrameVersion::V1 => 1,
            framer::FrameVersion::V2 => 2,
        },
        count: header.count,
        first_timestamp: header.first_timestamp,
        compression_ratio: header.compression_ratio,
        flags: header.flags,
    })
}

/// Checks that a block's outer header parses and its CRC-32 matches, without
/// decoding the Packed Block. Equivalent to `decode` with `strict: true` but
/// without paying for the bitstream walk or allocating the output vector.
pub fn validate(bytes: &[u8]) -> Result<()> {
    let unframed = framer::unframe(bytes)?;
    if !unframed.checksum_ok {
        return Err(Error::ChecksumMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_plain_gorilla() {
        let points = vec![
            DataPoint::new(1_700_000_000, 42.0),
            DataPoint::new(1_700_000_060, 42.5),
            DataPoint::new(1_700_000_120, 41.9),
        ];
        let bytes = encode(&points, &EncodeOptions::default()).unwrap();
        let (decoded, warnings) = decode(&bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(decoded, points);
        assert!(!warnings.checksum_failed);
    }

    #[test]
    fn roundtrips_with_preprocessor_and_container() {
        let points: Vec<DataPoint> = (0..200)
            .map(|i| DataPoint::new(1_700_000_000 + i * 10, 100.0 + i as f64))
            .collect();
        let opts = EncodeOptions {
            preprocessor_enabled: true,
            is_counter: true,
            scale_decimals: ScaleOption::Fixed(2),
            container: Container::Zlib,
            override_creation_time: Some(0),
        };
        let bytes = encode(&points, &opts).unwrap();
        let (decoded, warnings) = decode(&bytes, &DecodeOptions::default()).unwrap();
        assert!(!warnings.checksum_failed);
        for (a, b) in points.iter().zip(decoded.iter()) {
            assert_eq!(a.timestamp, b.timestamp);
            assert!((a.value - b.value).abs() <= 0.5 * 10f64.powi(-2));
        }
    }

    #[test]
    fn empty_input_roundtrips() {
        let bytes = encode(&[], &EncodeOptions::default()).unwrap();
        let (decoded, _) = decode(&bytes, &DecodeOptions::default()).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn strict_decode_rejects_corrupted_block() {
        let points = vec![DataPoint::new(0, 1.0), DataPoint::new(60, 2.0)];
        let mut bytes = encode(&points, &EncodeOptions::default()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;

        let strict = DecodeOptions { strict: true, ..Default::default() };
        assert_eq!(decode(&bytes, &strict), Err(Error::ChecksumMismatch));

        let (decoded, warnings) = decode(&bytes, &DecodeOptions::default()).unwrap();
        assert!(warnings.checksum_failed);
        assert_ne!(decoded, points);
    }

    #[test]
    fn header_info_matches_decoded_metadata() {
        let points: Vec<DataPoint> = (0..10).map(|i| DataPoint::new(i * 60, i as f64)).collect();
        let bytes = encode(&points, &EncodeOptions::default()).unwrap();
        let info = header_info(&bytes).unwrap();
        assert_eq!(info.version, 1);
        assert_eq!(info.count, 10);
        assert_eq!(info.first_timestamp, 0);
    }

    #[test]
    fn validate_accepts_well_formed_block_and_rejects_corrupted_one() {
        let points = vec![DataPoint::new(0, 1.0), DataPoint::new(60, 2.0)];
        let bytes = encode(&points, &EncodeOptions::default()).unwrap();
        assert!(validate(&bytes).is_ok());

        let mut corrupted = bytes.clone();
        let last = corrupted.len() - 1;
        corrupted[last] ^= 0xFF;
        assert_eq!(validate(&corrupted), Err(Error::ChecksumMismatch));
    }

    #[test]
    fn preprocessor_flag_selects_v2_header() {
        let points = vec![DataPoint::new(0, 1.0), DataPoint::new(60, 2.0)];
        let opts = EncodeOptions {
            preprocessor_enabled: true,
            scale_decimals: ScaleOption::Fixed(1),
            ..Default::default()
        };
        let bytes = encode(&points, &opts).unwrap();
        assert_eq!(header_info(&bytes).unwrap().version, 2);
    }
}
