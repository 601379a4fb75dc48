pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::{control_router, credential_router};
