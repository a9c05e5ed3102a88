//! # Utility Modules
//!
//! Supporting utilities for compression and logging.
//!
//! ## Components
//! - **Compression**: gzip adapter with configurable level and a
//!   decompression size ceiling
//! - **Logging**: structured logging configuration

pub mod compression;
pub mod logging;

pub use compression::{CompressionLevel, Compressor};
