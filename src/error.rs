use std::fmt;

/// Every failure surface exposed at the crate boundary.
///
/// Precondition violations (malformed input, out-of-range deltas) and
/// framing rejections (bad magic, unsupported version, truncation) are
/// always returned as errors. A CRC mismatch on an otherwise well-formed
/// frame is *not* represented here in non-strict decoding — see
/// [`crate::DecodeWarnings`] — but becomes [`Error::ChecksumMismatch`] when
/// [`crate::DecodeOptions::strict`] is set.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The input sequence or an option value was malformed.
    InvalidInput(String),
    /// A delta or delta-of-delta did not fit in the 32-bit signed range.
    TimestampOutOfRange { dod: i64 },
    /// The outer header's magic number did not match.
    InvalidMagic,
    /// The outer header declared a version this crate does not understand.
    UnsupportedVersion(u16),
    /// The outer header's `header_length` field did not match its version.
    InvalidHeaderLength { expected: u16, actual: u16 },
    /// The byte or bit stream ended before the declared count was satisfied.
    TruncatedPayload,
    /// The outer container transform failed to invert the payload.
    ContainerDecompressionFailed(String),
    /// Strict-mode decode found the Packed Block's CRC did not match.
    ChecksumMismatch,
    /// The caller explicitly requested a compressor this build lacks.
    CompressorUnavailable(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Error::TimestampOutOfRange { dod } => {
                write!(f, "timestamp out of range: delta-of-delta {dod} exceeds 32-bit signed range")
            }
            Error::InvalidMagic => write!(f, "invalid magic"),
            Error::UnsupportedVersion(v) => write!(f, "unsupported version: {v}"),
            Error::InvalidHeaderLength { expected, actual } => {
                write!(f, "invalid header length: expected {expected}, got {actual}")
            }
            Error::TruncatedPayload => write!(f, "truncated payload"),
            Error::ContainerDecompressionFailed(reason) => {
                write!(f, "container decompression failed: {reason}")
            }
            Error::ChecksumMismatch => write!(f, "checksum mismatch"),
            Error::CompressorUnavailable(name) => write!(f, "{name} not available"),
        }
    }
}

impl std::error::Error for Error {}

/// Crate-local result alias.
pub type Result<T> = std::result::Result<T, Error>;
