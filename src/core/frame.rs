//! # Frame Codec
//!
//! The wire-level unit exchanged after the handshake: a 4-byte big-endian
//! length followed by exactly that many bytes of compressed payload.
//!
//! ## Wire Format
//! ```text
//! [Length(4, BE)] [Compressed payload(N)]
//! ```
//!
//! The length always reflects the exact compressed byte count that follows.
//! A length exceeding the receiver's configured buffer capacity is a protocol
//! violation and is rejected before any payload byte is read, so a hostile
//! peer never controls how much memory the receiver reserves.

use crate::error::{GatewayError, Result};
use crate::utils::compression::Compressor;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Size of the length prefix.
pub const FRAME_HEADER_LEN: usize = 4;

/// Compresses `payload` and prepends the big-endian length of the
/// *compressed* size.
///
/// # Errors
/// - `CompressionFailure` propagated from the adapter
/// - `FrameTooLarge` if the compressed size does not fit in a `u32`
pub fn encode_frame(payload: &[u8], compressor: &Compressor) -> Result<Vec<u8>> {
    let compressed = compressor.compress(payload)?;
    let len = u32::try_from(compressed.len()).map_err(|_| GatewayError::FrameTooLarge {
        size: compressed.len(),
        capacity: u32::MAX as usize,
    })?;

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + compressed.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&compressed);
    Ok(frame)
}

/// Interprets a frame header as a big-endian unsigned length.
/// All `u32` values are valid at this stage; bounding happens in
/// [`validate_frame_length`].
pub fn decode_frame_length(header: [u8; FRAME_HEADER_LEN]) -> u32 {
    u32::from_be_bytes(header)
}

/// Rejects a frame length that exceeds the configured buffer capacity.
/// `size == capacity` is accepted.
pub fn validate_frame_length(size: u32, capacity: usize) -> Result<()> {
    if size as usize > capacity {
        return Err(GatewayError::FrameTooLarge {
            size: size as usize,
            capacity,
        });
    }
    Ok(())
}

/// Inverse of [`encode_frame`] for the payload part: decompresses a complete
/// compressed body. Malformed input yields `DecompressionFailure`, never a
/// partial result.
pub fn decode_payload(compressed: &[u8], compressor: &Compressor) -> Result<Vec<u8>> {
    compressor.decompress(compressed)
}

/// Tokio codec for framing compressed messages over a byte stream.
///
/// The decoder consumes the header and the body as two logical steps: the
/// length is validated against `capacity` as soon as the header is complete,
/// and only then is buffer space for the body reserved.
pub struct FrameCodec {
    capacity: usize,
    compressor: Compressor,
}

impl FrameCodec {
    pub fn new(capacity: usize, compressor: Compressor) -> Self {
        Self {
            capacity,
            compressor,
        }
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = GatewayError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        if src.len() < FRAME_HEADER_LEN {
            return Ok(None);
        }

        let mut header = [0u8; FRAME_HEADER_LEN];
        header.copy_from_slice(&src[..FRAME_HEADER_LEN]);
        let size = decode_frame_length(header);
        validate_frame_length(size, self.capacity)?;
        let size = size as usize;

        if src.len() < FRAME_HEADER_LEN + size {
            src.reserve(FRAME_HEADER_LEN + size - src.len());
            return Ok(None);
        }

        src.advance(FRAME_HEADER_LEN);
        let compressed = src.split_to(size);
        let payload = decode_payload(&compressed, &self.compressor)?;
        Ok(Some(Bytes::from(payload)))
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = GatewayError;

    fn encode(&mut self, payload: Bytes, dst: &mut BytesMut) -> Result<()> {
        let compressed = self.compressor.compress(&payload)?;
        // Outbound frames obey the same capacity bound as inbound ones, so
        // the write buffer never grows past what configuration allows.
        validate_frame_length(
            u32::try_from(compressed.len()).map_err(|_| GatewayError::FrameTooLarge {
                size: compressed.len(),
                capacity: self.capacity,
            })?,
            self.capacity,
        )?;

        dst.reserve(FRAME_HEADER_LEN + compressed.len());
        dst.put_u32(compressed.len() as u32);
        dst.extend_from_slice(&compressed);
        Ok(())
    }
}
