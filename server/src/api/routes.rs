use axum::routing::post;
use axum::Router;

use super::handlers::{control_probe, credential_fallback, provision, AppState};

/// Credential-class router: the provisioning endpoint plus an
/// empty-object fallback for everything else on this listener,
/// including non-POST methods on the provisioning path itself.
pub fn credential_router(state: AppState, provision_path: &str) -> Router {
    Router::new()
        .route(provision_path, post(provision).fallback(credential_fallback))
        .fallback(credential_fallback)
        .with_state(state)
}

/// Control-class router: every method and path answers the probe.
pub fn control_router() -> Router {
    Router::new().fallback(control_probe)
}
