//! Batch movement of the four-artifact bundle across one boundary.
//! Per-file failures are reported by name and never abort the batch.

use std::path::Path;

use dcprov_protocol::ArtifactKind;

use crate::{BoundaryTransfer, Result};

/// Outcome of one batch: which artifacts crossed, and which failed with
/// what reason.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub transferred: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    fn ok(&mut self, name: &str) {
        self.transferred.push(name.to_string());
    }

    fn fail(&mut self, name: &str, reason: impl ToString) {
        tracing::warn!("{}: {}", name, reason.to_string());
        self.failed.push((name.to_string(), reason.to_string()));
    }

    /// True when not a single artifact made it across.
    pub fn all_failed(&self) -> bool {
        self.transferred.is_empty() && !self.failed.is_empty()
    }
}

fn remote_path(remote_dir: &str, kind: ArtifactKind) -> String {
    format!("{}/{}", remote_dir.trim_end_matches('/'), kind.file_name())
}

/// Extract the whole bundle from `env` into a local directory.
pub async fn pull_bundle(
    transfer: &dyn BoundaryTransfer,
    env: &str,
    remote_dir: &str,
    out_dir: &Path,
) -> Result<BatchReport> {
    std::fs::create_dir_all(out_dir)?;

    let mut report = BatchReport::default();
    for kind in ArtifactKind::ALL {
        let name = kind.file_name();
        match transfer.extract(env, &remote_path(remote_dir, kind)).await {
            Ok(content) => match std::fs::write(out_dir.join(name), &content) {
                Ok(()) => {
                    tracing::info!("Extracted {}:{} ({} bytes)", env, name, content.len());
                    report.ok(name);
                }
                Err(e) => report.fail(name, e),
            },
            Err(e) => report.fail(name, e),
        }
    }
    Ok(report)
}

/// Inject the bundle from a local directory into `env`. Files missing
/// locally are reported and skipped.
pub async fn push_bundle(
    transfer: &dyn BoundaryTransfer,
    env: &str,
    from_dir: &Path,
    remote_dir: &str,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    for kind in ArtifactKind::ALL {
        let name = kind.file_name();
        let local = from_dir.join(name);
        let content = match std::fs::read(&local) {
            Ok(content) => content,
            Err(e) => {
                report.fail(name, format!("missing source {}: {}", local.display(), e));
                continue;
            }
        };
        match transfer
            .inject(env, &remote_path(remote_dir, kind), &content)
            .await
        {
            Ok(()) => {
                tracing::info!("Injected {} → {}:{}", local.display(), env, name);
                report.ok(name);
            }
            Err(e) => report.fail(name, e),
        }
    }
    Ok(report)
}

/// List the destination directory and name every expected bundle file
/// that is still absent.
pub async fn verify_bundle(
    transfer: &dyn BoundaryTransfer,
    env: &str,
    remote_dir: &str,
) -> Result<Vec<String>> {
    let present = transfer.list_dir(env, remote_dir).await?;
    Ok(ArtifactKind::ALL
        .iter()
        .map(|kind| kind.file_name().to_string())
        .filter(|name| !present.contains(name))
        .collect())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::TransferError;

    /// In-memory stand-in: one map of `env:path` to content.
    #[derive(Default)]
    struct FakeBoundary {
        files: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl FakeBoundary {
        fn with(files: &[(&str, &[u8])]) -> Self {
            let fake = Self::default();
            for (path, content) in files {
                fake.files
                    .lock()
                    .unwrap()
                    .insert(path.to_string(), content.to_vec());
            }
            fake
        }
    }

    #[async_trait]
    impl BoundaryTransfer for FakeBoundary {
        async fn extract(&self, env: &str, remote_path: &str) -> Result<Vec<u8>> {
            self.files
                .lock()
                .unwrap()
                .get(&format!("{}:{}", env, remote_path))
                .cloned()
                .ok_or_else(|| TransferError::CommandFailed {
                    command: format!("cp {}:{}", env, remote_path),
                    status: 1,
                    stderr: "no such file".to_string(),
                })
        }

        async fn inject(&self, env: &str, dest_path: &str, content: &[u8]) -> Result<()> {
            self.files
                .lock()
                .unwrap()
                .insert(format!("{}:{}", env, dest_path), content.to_vec());
            Ok(())
        }

        async fn list_dir(&self, env: &str, dir: &str) -> Result<Vec<String>> {
            let prefix = format!("{}:{}/", env, dir.trim_end_matches('/'));
            Ok(self
                .files
                .lock()
                .unwrap()
                .keys()
                .filter_map(|key| key.strip_prefix(&prefix))
                .map(str::to_string)
                .collect())
        }
    }

    #[tokio::test]
    async fn missing_sources_are_named_failures_not_fatal() {
        let fake = FakeBoundary::with(&[
            ("server:/certs/cert.pem", b"CERT"),
            ("server:/certs/key.pem", b"KEY"),
            ("server:/certs/dckey.pem", b"DCKEY"),
        ]);
        let out = tempfile::tempdir().unwrap();

        let report = pull_bundle(&fake, "server", "/certs", out.path())
            .await
            .unwrap();

        assert_eq!(report.transferred, vec!["cert.pem", "key.pem", "dckey.pem"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "dc.cred");
        assert!(!report.all_failed());
        assert_eq!(
            std::fs::read(out.path().join("cert.pem")).unwrap(),
            b"CERT"
        );
        assert!(!out.path().join("dc.cred").exists());
    }

    #[tokio::test]
    async fn push_skips_locally_missing_files() {
        let fake = FakeBoundary::default();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dc.cred"), b"CRED").unwrap();
        std::fs::write(dir.path().join("dckey.pem"), b"DCKEY").unwrap();

        let report = push_bundle(&fake, "middlebox", dir.path(), "/certs")
            .await
            .unwrap();

        assert_eq!(report.transferred, vec!["dc.cred", "dckey.pem"]);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(
            fake.files.lock().unwrap()["middlebox:/certs/dc.cred"],
            b"CRED"
        );
    }

    #[tokio::test]
    async fn verify_names_absent_files() {
        let fake = FakeBoundary::with(&[
            ("middlebox:/certs/cert.pem", b"CERT"),
            ("middlebox:/certs/dc.cred", b"CRED"),
        ]);

        let missing = verify_bundle(&fake, "middlebox", "/certs").await.unwrap();
        assert_eq!(missing, vec!["key.pem", "dckey.pem"]);
    }

    #[tokio::test]
    async fn total_failure_is_detectable() {
        let fake = FakeBoundary::default();
        let out = tempfile::tempdir().unwrap();

        let report = pull_bundle(&fake, "server", "/certs", out.path())
            .await
            .unwrap();
        assert!(report.all_failed());
        assert_eq!(report.failed.len(), 4);
    }
}
