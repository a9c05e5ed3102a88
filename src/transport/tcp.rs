//! TCP listener and accept loop.
//!
//! Accept failures are logged and the loop continues; only binding can fail
//! the listener itself. Admission happens before a session object exists, so
//! a rejected peer's socket is dropped without a single byte written.

use crate::config::GatewayConfig;
use crate::error::Result;
use crate::protocol::lobby::LobbyLayer;
use crate::transport::admission::{AdmissionController, AdmissionLimits};
use crate::transport::session::Session;
use crate::utils::compression::Compressor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Bound gateway listener plus the per-listener shared state: admission
/// counters and the session codec settings.
pub struct Listener {
    listener: TcpListener,
    admission: Arc<AdmissionController>,
    buffer_capacity: usize,
    compressor: Compressor,
}

impl Listener {
    /// Validates the configuration and binds the listen socket.
    ///
    /// Configuration problems (including an unmapped compression level) are
    /// fatal here, before any connection is accepted.
    pub async fn bind(config: &GatewayConfig) -> Result<Self> {
        config.validate_strict()?;

        let addr = format!("{}:{}", config.server.bind_address, config.server.port);
        let listener = TcpListener::bind(&addr).await?;
        info!(address = %addr, "listening");

        Ok(Self {
            listener,
            admission: Arc::new(AdmissionController::new(AdmissionLimits {
                total: config.limits.client_count_limit_total,
                per_address: config.limits.client_count_limit_per_address,
            })),
            buffer_capacity: config.limits.client_buffer_capacity,
            compressor: Compressor::new(config.transport.compression_level),
        })
    }

    /// The actual bound address, useful when the port was configured as 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared handle to the admission counters, for metrics and tests.
    pub fn admission(&self) -> Arc<AdmissionController> {
        Arc::clone(&self.admission)
    }

    /// Runs the accept loop until CTRL+C.
    pub async fn serve(self, lobby: Arc<dyn LobbyLayer>) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("received CTRL+C signal, shutting down");
                let _ = shutdown_tx.send(()).await;
            }
        });

        self.serve_with_shutdown(lobby, shutdown_rx).await
    }

    /// Runs the accept loop until the shutdown channel fires, then drains
    /// live sessions for up to ten seconds before returning.
    pub async fn serve_with_shutdown(
        self,
        lobby: Arc<dyn LobbyLayer>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) -> Result<()> {
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("shutting down, waiting for sessions to close");

                    let deadline = tokio::time::sleep(Duration::from_secs(10));
                    tokio::pin!(deadline);

                    loop {
                        tokio::select! {
                            _ = &mut deadline => {
                                warn!("shutdown timeout reached, forcing exit");
                                break;
                            }
                            _ = tokio::time::sleep(Duration::from_millis(500)) => {
                                let sessions = self.admission.active_total();
                                info!(sessions, "waiting for sessions to close");
                                if sessions == 0 {
                                    info!("all sessions closed, shutting down");
                                    break;
                                }
                            }
                        }
                    }

                    return Ok(());
                }

                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => self.handle_accept(stream, peer, &lobby),
                        Err(e) => {
                            error!(error = %e, "error accepting connection");
                        }
                    }
                }
            }
        }
    }

    fn handle_accept(&self, stream: TcpStream, peer: SocketAddr, lobby: &Arc<dyn LobbyLayer>) {
        match self.admission.try_admit(peer.ip()) {
            Ok(guard) => {
                let session = Session::new(stream, guard, self.buffer_capacity, self.compressor);
                tokio::spawn(session.serve(Arc::clone(lobby)));
            }
            Err(e) => {
                // The socket drops right here: a rejected peer receives no data.
                warn!(peer = %peer, reason = %e, "connection rejected");
            }
        }
    }
}
