//! Caller-facing option records (spec §6). Plain structs with a `Default`
//! impl, in the options-struct idiom the pack's engine configs use — the
//! core never reads files or environment, so no external config-loading
//! crate is warranted.

use crate::container::Container;
use crate::preprocessor::ScaleOption;

/// Options controlling `encode`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeOptions {
    /// Master switch for the VictoriaMetrics-style preprocessor (spec §4.1).
    /// When `false`, `is_counter` and `scale_decimals` are ignored.
    pub preprocessor_enabled: bool,
    /// Replace values with their running delta before scaling.
    pub is_counter: bool,
    /// Decimal-digit scaling; ignored unless `preprocessor_enabled`.
    pub scale_decimals: ScaleOption,
    /// Outer byte compressor applied after framing.
    pub container: Container,
    /// Overrides the outer header's `creation_time` (unix seconds) for
    /// deterministic output in tests; `None` uses the caller-supplied
    /// wall-clock time (spec §5's one documented non-determinism).
    pub override_creation_time: Option<i64>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            preprocessor_enabled: false,
            is_counter: false,
            scale_decimals: ScaleOption::Fixed(0),
            container: Container::None,
            override_creation_time: None,
        }
    }
}

/// Options controlling `decode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    /// Overrides the container choice instead of reading it from the
    /// outer header's flags.
    pub container_override: Option<Container>,
    /// When `true`, a CRC mismatch becomes `Error::ChecksumMismatch`
    /// instead of a warning flag on an otherwise-decoded sequence.
    pub strict: bool,
}

/// Warnings accompanying a successful non-strict decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeWarnings {
    /// The Packed Block's CRC-32 did not match the outer header's.
    pub checksum_failed: bool,
}

/// Result of `header_info`: the outer header's caller-relevant fields,
/// without touching the Packed Block at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderInfo {
    pub version: u16,
    pub count: u32,
    pub first_timestamp: i64,
    pub compression_ratio: f64,
    pub flags: u32,
}
