//! Container wrapper (spec §4.6): a thin, opaque byte-in/byte-out transform
//! applied to the finished Framed Block. Treated as an external collaborator
//! — this module only adapts `flate2`/`zstd` to one small interface.

use std::io::{Read, Write};
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// Outer compressor selection (spec §6's `container` option).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Container {
    #[default]
    None,
    Zlib,
    Zstd,
    /// Picks zstd if this build was compiled with the `zstd` feature,
    /// otherwise falls back to zlib — spec §4.6/§9's "lazy-initialized
    /// capability value, not a mutable global flag".
    Auto,
}

/// Whether this build carries the optional zstd compressor. Computed once
/// and cached; not a mutable global — it never changes after first read.
pub fn zstd_available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| cfg!(feature = "zstd"))
}

/// Resolves `Container::Auto` to a concrete, available compressor.
pub(crate) fn resolve(container: Container) -> Container {
    match container {
        Container::Auto => {
            if zstd_available() {
                Container::Zstd
            } else {
                Container::Zlib
            }
        }
        other => other,
    }
}

/// Applies the chosen compressor to `bytes`, returning the wrapped payload.
pub fn compress(bytes: &[u8], container: Container) -> Result<Vec<u8>> {
    match resolve(container) {
        Container::None => Ok(bytes.to_vec()),
        Container::Zlib => compress_zlib(bytes),
        Container::Zstd => compress_zstd(bytes),
        Container::Auto => unreachable!("resolve() never returns Auto"),
    }
}

/// Inverts `compress`. `container` must name the transform that was
/// actually used (the caller typically reads this from the outer header's
/// flags rather than passing `Auto`).
pub fn decompress(bytes: &[u8], container: Container) -> Result<Vec<u8>> {
    match container {
        Container::None => Ok(bytes.to_vec()),
        Container::Zlib => decompress_zlib(bytes),
        Container::Zstd => decompress_zstd(bytes),
        Container::Auto => decompress(bytes, resolve(container)),
    }
}

fn compress_zlib(bytes: &[u8]) -> Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .map_err(|e| Error::ContainerDecompressionFailed(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| Error::ContainerDecompressionFailed(e.to_string()))
}

fn decompress_zlib(bytes: &[u8]) -> Result<Vec<u8>> {
    use flate2::read::ZlibDecoder;

    let mut decoder = ZlibDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::ContainerDecompressionFailed(e.to_string()))?;
    Ok(out)
}

#[cfg(feature = "zstd")]
fn compress_zstd(bytes: &[u8]) -> Result<Vec<u8>> {
    zstd::stream::encode_all(bytes, 0)
        .map_err(|e| Error::ContainerDecompressionFailed(e.to_string()))
}

#[cfg(not(feature = "zstd"))]
fn compress_zstd(_bytes: &[u8]) -> Result<Vec<u8>> {
    Err(Error::CompressorUnavailable("zstd"))
}

#[cfg(feature = "zstd")]
fn decompress_zstd(bytes: &[u8]) -> Result<Vec<u8>> {
    zstd::stream::decode_all(bytes).map_err(|e| Error::ContainerDecompressionFailed(e.to_string()))
}

#[cfg(not(feature = "zstd"))]
fn decompress_zstd(_bytes: &[u8]) -> Result<Vec<u8>> {
    Err(Error::CompressorUnavailable("zstd"))
}
