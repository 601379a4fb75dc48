use std::process::Stdio;
use std::time::Duration;

use dcprov_protocol::{now_ns, ArtifactKind};
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::store::ArtifactStore;

/// Result of one external generator invocation.
///
/// A non-zero exit status is data, not an error: the caller decides
/// whether a failed generation aborts the exchange.
#[derive(Debug)]
pub struct GeneratorOutcome {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// t3.1: invocation start
    pub started_ns: u64,
    /// t3.2: invocation end
    pub finished_ns: u64,
}

impl GeneratorOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn duration_ns(&self) -> u64 {
        self.finished_ns.saturating_sub(self.started_ns)
    }
}

/// Adapter around the external delegated-credential generator.
///
/// The generator's channel convention is a fixed external contract:
/// it emits the credential on stdout and the key material on stderr,
/// and those streams land in `dc.cred` and `dckey.pem` respectively.
pub struct GeneratorAdapter {
    cert_command: Vec<String>,
    generator_program: String,
    signature_scheme: String,
    duration: String,
    timeout: Duration,
}

impl GeneratorAdapter {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            cert_command: config.cert_command.clone(),
            generator_program: config.generator_program.clone(),
            signature_scheme: config.signature_scheme.clone(),
            duration: config.duration.clone(),
            timeout: config.generator_timeout,
        }
    }

    /// Prerequisite step: (re)generate cert.pem and key.pem. Idempotent;
    /// prior material is overwritten.
    pub async fn generate_cert_key(&self, store: &ArtifactStore) -> Result<()> {
        let cert_path = store.path(ArtifactKind::Cert);
        let key_path = store.path(ArtifactKind::Key);

        let args: Vec<String> = self.cert_command[1..]
            .iter()
            .map(|arg| {
                arg.replace("{cert}", &cert_path.to_string_lossy())
                    .replace("{key}", &key_path.to_string_lossy())
            })
            .collect();

        tracing::info!("Generating cert.pem and key.pem");
        let output = self
            .run_with_timeout(Command::new(&self.cert_command[0]).args(&args))
            .await?;

        if !output.status.success() {
            return Err(ServerError::GeneratorSpawn(format!(
                "cert command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(())
    }

    /// Invoke the external generator and capture its output, bracketed by
    /// the t3.1/t3.2 checkpoints. The credential (stdout) and key
    /// (stderr) are written to the store; empty streams are not, so a
    /// failed generation leaves those artifacts absent.
    pub async fn generate_credential(&self, store: &ArtifactStore) -> Result<GeneratorOutcome> {
        let cert_path = store.path(ArtifactKind::Cert);
        let key_path = store.path(ArtifactKind::Key);

        tracing::info!(
            "Invoking delegated-credential generator: {}",
            self.generator_program
        );

        let started_ns = now_ns();
        let output = self
            .run_with_timeout(
                Command::new(&self.generator_program)
                    .arg("-cert-path")
                    .arg(&cert_path)
                    .arg("-key-path")
                    .arg(&key_path)
                    .arg("-signature-scheme")
                    .arg(&self.signature_scheme)
                    .arg("-duration")
                    .arg(&self.duration),
            )
            .await?;
        let finished_ns = now_ns();

        let outcome = GeneratorOutcome {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: output.stderr,
            started_ns,
            finished_ns,
        };

        if !outcome.success() {
            tracing::warn!(
                "Generator exited with code {}: {}",
                outcome.exit_code,
                String::from_utf8_lossy(&outcome.stderr)
            );
        }

        if !outcome.stdout.is_empty() {
            store.write(ArtifactKind::DcCred, &outcome.stdout)?;
        }
        if !outcome.stderr.is_empty() {
            store.write(ArtifactKind::DcKey, &outcome.stderr)?;
        }

        Ok(outcome)
    }

    async fn run_with_timeout(&self, command: &mut Command) -> Result<std::process::Output> {
        let child = command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ServerError::GeneratorSpawn(e.to_string()))?;

        match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => Ok(result?),
            // Dropping the future kills the child (kill_on_drop).
            Err(_) => Err(ServerError::GeneratorTimeout(self.timeout.as_secs())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(generator: &str, timeout_secs: u64) -> GeneratorAdapter {
        GeneratorAdapter {
            cert_command: vec![
                "sh".to_string(),
                "-c".to_string(),
                "printf CERT > {cert} && printf KEY > {key}".to_string(),
            ],
            generator_program: generator.to_string(),
            signature_scheme: "Ed25519".to_string(),
            duration: "168h".to_string(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn fake_generator(dir: &std::path::Path, script: &str) -> String {
        let path = dir.join("generator.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn cert_prerequisite_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();

        adapter("true", 5).generate_cert_key(&store).await.unwrap();

        assert_eq!(store.read(ArtifactKind::Cert).unwrap(), b"CERT");
        assert_eq!(store.read(ArtifactKind::Key).unwrap(), b"KEY");
    }

    #[tokio::test]
    async fn streams_land_in_their_artifact_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let generator = fake_generator(dir.path(), "printf CREDENTIAL; printf KEYMATERIAL >&2");

        let outcome = adapter(&generator, 5)
            .generate_credential(&store)
            .await
            .unwrap();

        assert!(outcome.success());
        assert!(outcome.started_ns <= outcome.finished_ns);
        assert_eq!(
            outcome.duration_ns(),
            outcome.finished_ns - outcome.started_ns
        );
        assert_eq!(store.read(ArtifactKind::DcCred).unwrap(), b"CREDENTIAL");
        assert_eq!(store.read(ArtifactKind::DcKey).unwrap(), b"KEYMATERIAL");
    }

    #[tokio::test]
    async fn non_zero_exit_is_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let generator = fake_generator(dir.path(), "printf oops >&2; exit 3");

        let outcome = adapter(&generator, 5)
            .generate_credential(&store)
            .await
            .unwrap();

        assert!(!outcome.success());
        assert_eq!(outcome.exit_code, 3);
        // The error stream still follows the channel contract.
        assert_eq!(store.read(ArtifactKind::DcKey).unwrap(), b"oops");
        assert!(store.read(ArtifactKind::DcCred).is_none());
    }

    #[tokio::test]
    async fn hung_generator_is_killed_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let generator = fake_generator(dir.path(), "sleep 30");

        let mut adapter = adapter(&generator, 5);
        adapter.timeout = Duration::from_millis(100);

        match adapter.generate_credential(&store).await {
            Err(ServerError::GeneratorTimeout(_)) => {}
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
