use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

use crate::error::Result;

/// Traffic class of one listener binding. The two classes never share a
/// socket, router, or handler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficClass {
    /// Liveness/connectivity probes.
    Control,
    /// Provisioning traffic.
    Credential,
}

impl TrafficClass {
    fn name(&self) -> &'static str {
        match self {
            TrafficClass::Control => "control",
            TrafficClass::Credential => "credential",
        }
    }
}

/// Bind one traffic class on its own port and serve its router until the
/// process shuts down.
pub async fn bind_and_serve(class: TrafficClass, port: u16, router: Router) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("{} listener on {}", class.name(), addr);
    axum::serve(listener, router).await?;
    Ok(())
}
