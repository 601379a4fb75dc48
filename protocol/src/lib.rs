//! Shared types for the delegated-credential provisioning protocol:
//! the artifact bundle layout, the six-point timestamp trace, and the
//! wire format of the provisioning response.

pub mod bundle;
pub mod trace;
pub mod wire;

pub use bundle::ArtifactKind;
pub use trace::{now_ns, TimestampTrace};
pub use wire::ProvisionResponse;
