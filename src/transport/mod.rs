//! # Transport Layer
//!
//! Connection ownership and lifecycle: the TCP listener, admission control,
//! and the per-connection session task.
//!
//! ## Components
//! - **Listener**: accept loop with graceful shutdown
//! - **Admission**: total and per-address session ceilings
//! - **Session**: one task per connection, strictly sequential I/O

pub mod admission;
pub mod session;
pub mod tcp;

pub use admission::{AdmissionController, AdmissionGuard, AdmissionLimits};
pub use session::{Session, SessionId, SessionInfo};
pub use tcp::Listener;
