//! Boundary transfer: moving artifact files between isolated execution
//! environments that share no filesystem and no network path.
//!
//! The protocol core depends on the [`BoundaryTransfer`] capability
//! trait; [`docker::DockerCli`] is the shipped implementation, driving
//! the `docker` CLI's archive streams.

pub mod archive;
pub mod batch;
pub mod docker;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Failed to spawn {0}: {1}")]
    Spawn(String, String),

    #[error("{command} exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("Transfer timed out after {0}s")]
    Timeout(u64),

    #[error("Archive contains no entries")]
    EmptyArchive,

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransferError>;

/// One boundary-crossing capability against a named isolated environment.
///
/// Implementations move single files as streamed single-entry archives;
/// they never assume a shared filesystem with the environment.
#[async_trait]
pub trait BoundaryTransfer: Send + Sync {
    /// Read one file out of the environment.
    async fn extract(&self, env: &str, remote_path: &str) -> Result<Vec<u8>>;

    /// Write `content` to `dest_path` inside the environment.
    async fn inject(&self, env: &str, dest_path: &str, content: &[u8]) -> Result<()>;

    /// List the file names in a directory inside the environment.
    async fn list_dir(&self, env: &str, dir: &str) -> Result<Vec<String>>;
}

pub use batch::{pull_bundle, push_bundle, verify_bundle, BatchReport};
pub use docker::DockerCli;
