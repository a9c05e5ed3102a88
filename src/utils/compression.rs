use crate::error::{GatewayError, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::str::FromStr;

/// Maximum output size for decompression, to prevent decompression bombs.
/// Frame headers bound the compressed size; this bounds what it expands to.
pub const MAX_DECOMPRESSED_SIZE: usize = 16 * 1024 * 1024;

/// Compression effort applied to outgoing frames.
///
/// Set once at startup from configuration and read by every compress call.
/// Decompression is level-agnostic since the gzip format self-describes,
/// which also means `None` still produces a valid gzip stream (stored, not
/// deflated) and round-trips like every other level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    None,
    Speed,
    #[default]
    Default,
    Size,
}

impl CompressionLevel {
    fn to_gzip(self) -> Compression {
        match self {
            CompressionLevel::None => Compression::none(),
            CompressionLevel::Speed => Compression::fast(),
            CompressionLevel::Default => Compression::default(),
            CompressionLevel::Size => Compression::best(),
        }
    }
}

impl FromStr for CompressionLevel {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(CompressionLevel::None),
            "speed" => Ok(CompressionLevel::Speed),
            "default" => Ok(CompressionLevel::Default),
            "size" => Ok(CompressionLevel::Size),
            other => Err(GatewayError::ConfigError(format!(
                "unknown compression level '{other}' (expected none, speed, default, or size)"
            ))),
        }
    }
}

/// Gzip adapter for frame payloads.
///
/// Isolates the frame codec from the compression algorithm: the codec only
/// sees opaque bytes in and bytes out, plus the two failure modes.
#[derive(Debug, Clone, Copy)]
pub struct Compressor {
    level: CompressionLevel,
}

impl Compressor {
    pub fn new(level: CompressionLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Compresses `data` at the configured level.
    ///
    /// # Errors
    /// Returns `GatewayError::CompressionFailure` if the encoder fails.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(
            Vec::with_capacity(data.len() / 2 + 32),
            self.level.to_gzip(),
        );
        encoder
            .write_all(data)
            .map_err(|_| GatewayError::CompressionFailure)?;
        encoder.finish().map_err(|_| GatewayError::CompressionFailure)
    }

    /// Decompresses a gzip stream produced by any compression level.
    ///
    /// Enforces `MAX_DECOMPRESSED_SIZE` on the output so a small hostile
    /// frame cannot expand into an allocation the peer chose.
    ///
    /// # Errors
    /// Returns `GatewayError::DecompressionFailure` if:
    /// - the stream is not valid gzip
    /// - the output exceeds `MAX_DECOMPRESSED_SIZE`
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut decoder = GzDecoder::new(data).take(MAX_DECOMPRESSED_SIZE as u64 + 1);
        decoder
            .read_to_end(&mut out)
            .map_err(|_| GatewayError::DecompressionFailure)?;
        if out.len() > MAX_DECOMPRESSED_SIZE {
            return Err(GatewayError::DecompressionFailure);
        }
        Ok(out)
    }
}
