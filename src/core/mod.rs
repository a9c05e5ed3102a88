//! # Core Wire Components
//!
//! Low-level frame handling for the post-handshake transport.
//!
//! ## Components
//! - **Frame**: length-prefixed compressed message format
//! - **FrameCodec**: tokio codec for framing over byte streams
//!
//! ## Wire Format
//! ```text
//! [Length(4, BE)] [Compressed payload(N)]
//! ```
//!
//! ## Security
//! - Frame lengths are validated against the configured buffer capacity
//!   before any payload byte is read
//! - Decompressed output is capped to prevent memory exhaustion

pub mod frame;
