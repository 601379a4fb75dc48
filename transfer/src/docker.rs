//! `docker` CLI implementation of [`BoundaryTransfer`].
//!
//! `docker cp <env>:<path> -` streams a tar archive of one file to
//! stdout, and `docker cp - <env>:<dir>` accepts one on stdin; both map
//! directly onto the single-entry archive wire format.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::archive;
use crate::{BoundaryTransfer, Result, TransferError};

pub struct DockerCli {
    program: String,
    timeout: Duration,
}

impl DockerCli {
    pub fn new() -> Self {
        Self {
            program: "docker".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Use a different binary (e.g. `podman`) or timeout.
    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    async fn run(&self, args: &[&str], stdin: Option<&[u8]>) -> Result<Vec<u8>> {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| TransferError::Spawn(self.program.clone(), e.to_string()))?;

        if let Some(input) = stdin {
            let mut handle = child.stdin.take().expect("stdin was piped");
            handle.write_all(input).await?;
            // Drop closes the pipe so the child sees EOF.
            drop(handle);
        }

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            // Dropping the future kills the child (kill_on_drop).
            Err(_) => return Err(TransferError::Timeout(self.timeout.as_secs())),
        };

        if !output.status.success() {
            return Err(TransferError::CommandFailed {
                command: format!("{} {}", self.program, args.join(" ")),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(output.stdout)
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BoundaryTransfer for DockerCli {
    async fn extract(&self, env: &str, remote_path: &str) -> Result<Vec<u8>> {
        tracing::debug!("Extracting {}:{}", env, remote_path);
        let stream = self
            .run(&["cp", &format!("{}:{}", env, remote_path), "-"], None)
            .await?;
        archive::unpack_first(&stream)
    }

    async fn inject(&self, env: &str, dest_path: &str, content: &[u8]) -> Result<()> {
        let (dir, name) = match dest_path.rsplit_once('/') {
            Some((dir, name)) if !dir.is_empty() => (dir, name),
            _ => ("/", dest_path.trim_start_matches('/')),
        };

        tracing::debug!("Injecting {} bytes to {}:{}", content.len(), env, dest_path);
        let stream = archive::pack_single(name, content)?;
        self.run(&["cp", "-", &format!("{}:{}", env, dir)], Some(&stream))
            .await?;
        Ok(())
    }

    async fn list_dir(&self, env: &str, dir: &str) -> Result<Vec<String>> {
        let output = self.run(&["exec", env, "ls", "-1", dir], None).await?;
        Ok(String::from_utf8_lossy(&output)
            .lines()
            .map(str::to_string)
            .filter(|line| !line.is_empty())
            .collect())
    }
}
