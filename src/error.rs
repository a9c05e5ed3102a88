//! # Error Types
//!
//! Error handling for the gateway.
//!
//! This module defines all error variants that can occur while servicing a
//! connection, from low-level I/O failures to protocol violations.
//!
//! ## Error Categories
//! - **I/O Errors**: read/write failures on the client socket
//! - **Protocol Errors**: malformed handshake probes, oversized frames
//! - **Compression Errors**: compression/decompression failures on frame payloads
//! - **Admission Errors**: connection ceilings reached
//!
//! Every variant is local to one session: an error terminates the session it
//! occurred on and never propagates to other sessions or the listener. Only
//! `ConfigError` is fatal, and only at startup.

use std::fmt;
use std::io;
use thiserror::Error;

/// Primary error type for all gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed handshake probe: {0:02x?}")]
    MalformedHandshake([u8; 4]),

    #[error("TLS connection requested but not supported")]
    TlsNotSupported,

    #[error("frame length {size} exceeds buffer capacity {capacity}")]
    FrameTooLarge { size: usize, capacity: usize },

    #[error("compression failed")]
    CompressionFailure,

    #[error("decompression failed")]
    DecompressionFailure,

    #[error("connection rejected: {0}")]
    AdmissionRejected(RejectReason),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Why the admission controller refused a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The process-wide session ceiling is reached.
    TotalLimitReached,
    /// The ceiling for the connecting source address is reached.
    AddressLimitReached,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::TotalLimitReached => write!(f, "total session limit reached"),
            RejectReason::AddressLimitReached => write!(f, "per-address session limit reached"),
        }
    }
}

impl GatewayError {
    /// Whether this error is an expected peer departure rather than a fault.
    ///
    /// Resets, aborts, and abrupt EOF are normal client behavior and are
    /// logged at a lower severity than genuine I/O failures.
    pub fn is_benign_disconnect(&self) -> bool {
        match self {
            GatewayError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}

/// Type alias for Results using GatewayError
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_is_benign() {
        let err = GatewayError::Io(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert!(err.is_benign_disconnect());
    }

    #[test]
    fn refused_is_not_benign() {
        let err = GatewayError::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert!(!err.is_benign_disconnect());
    }

    #[test]
    fn protocol_violations_are_not_benign() {
        assert!(!GatewayError::MalformedHandshake([1, 2, 3, 4]).is_benign_disconnect());
        assert!(!GatewayError::TlsNotSupported.is_benign_disconnect());
    }
}
