use std::sync::Arc;

use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::Json;
use dcprov_protocol::wire::encode_artifact;
use dcprov_protocol::{now_ns, ArtifactKind, ProvisionResponse};
use tokio::sync::Mutex;

use crate::generator::GeneratorAdapter;
use crate::store::ArtifactStore;

/// Shared state of the credential-class listener. The control listener
/// carries no state at all.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ArtifactStore>,
    pub generator: Arc<GeneratorAdapter>,
    /// The store write path is not reentrant-safe, so concurrent
    /// provisioning exchanges serialize generator work here.
    pub generator_lock: Arc<Mutex<()>>,
    pub debug_artifacts: bool,
}

/// `POST /certs`: drive generation and return the encoded bundle with
/// the four server-side timestamps.
pub async fn provision(
    State(state): State<AppState>,
) -> Result<Json<ProvisionResponse>, (StatusCode, String)> {
    let server_recv_ns = now_ns();
    tracing::info!("Provisioning request received");

    let _guard = state.generator_lock.lock().await;

    state
        .generator
        .generate_cert_key(&state.store)
        .await
        .map_err(|e| {
            tracing::error!("Cert/key generation failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("cert/key generation failed: {}", e),
            )
        })?;

    let outcome = state
        .generator
        .generate_credential(&state.store)
        .await
        .map_err(|e| {
            tracing::error!("Generator invocation failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("generator invocation failed: {}", e),
            )
        })?;

    let bundle = state.store.read_bundle();
    let missing = state.store.missing();

    if bundle.is_empty() {
        tracing::error!("No artifacts present after generation");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "no artifacts present after generation".to_string(),
        ));
    }
    for name in &missing {
        tracing::warn!("Artifact missing after generation: {}", name);
    }

    let encode = |kind: ArtifactKind| {
        bundle
            .get(&kind)
            .map(|bytes| encode_artifact(bytes))
            .unwrap_or_default()
    };

    let mut response = ProvisionResponse {
        dc_cred_b64: encode(ArtifactKind::DcCred),
        dc_key_b64: encode(ArtifactKind::DcKey),
        generator_exit: Some(outcome.exit_code),
        server_recv_ns: Some(server_recv_ns),
        generator_start_ns: Some(outcome.started_ns),
        generator_end_ns: Some(outcome.finished_ns),
        missing,
        ..Default::default()
    };

    if state.debug_artifacts {
        response.cert_b64 = bundle
            .get(&ArtifactKind::Cert)
            .map(|bytes| encode_artifact(bytes));
        response.key_b64 = bundle
            .get(&ArtifactKind::Key)
            .map(|bytes| encode_artifact(bytes));
    }

    // t2.2 is the last thing recorded before the body goes out.
    response.server_send_ns = Some(now_ns());
    tracing::info!(
        "Provisioning response ready (generator exit {}, {} ns)",
        outcome.exit_code,
        outcome.duration_ns()
    );

    Ok(Json(response))
}

/// Every non-provisioning path on the credential listener.
pub async fn credential_fallback() -> Json<serde_json::Value> {
    Json(serde_json::json!({}))
}

/// Control-class probe: always `OK`, never any credential logic.
pub async fn control_probe(method: Method, uri: Uri) -> &'static str {
    tracing::info!("Control probe: {} {}", method, uri.path());
    "OK"
}
