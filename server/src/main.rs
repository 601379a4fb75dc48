mod api;
mod config;
mod error;
mod generator;
mod listeners;
mod store;

use std::sync::Arc;

use api::AppState;
use config::ServerConfig;
use error::Result;
use generator::GeneratorAdapter;
use listeners::TrafficClass;
use store::ArtifactStore;
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting delegated-credential provisioning server");

    let config = ServerConfig::from_env()?;
    tracing::info!(
        "Artifact store: {} | control port {} | credential port {}",
        config.certs_dir.display(),
        config.control_port,
        config.credential_port
    );

    let state = AppState {
        store: Arc::new(ArtifactStore::open(&config.certs_dir)?),
        generator: Arc::new(GeneratorAdapter::new(&config)),
        generator_lock: Arc::new(Mutex::new(())),
        debug_artifacts: config.debug_artifacts,
    };

    let control = listeners::bind_and_serve(
        TrafficClass::Control,
        config.control_port,
        api::control_router(),
    );
    let credential = listeners::bind_and_serve(
        TrafficClass::Credential,
        config.credential_port,
        api::credential_router(state, &config.provision_path),
    );

    // Run both listeners, exit if either fails
    tokio::select! {
        result = control => {
            tracing::error!("Control listener exited: {:?}", result);
            result?;
        }
        result = credential => {
            tracing::error!("Credential listener exited: {:?}", result);
            result?;
        }
    }

    Ok(())
}
