use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use dcprov_transfer::{pull_bundle, push_bundle, verify_bundle, BatchReport, DockerCli};

fn report(action: &str, report: &BatchReport) -> Result<()> {
    for name in &report.transferred {
        tracing::info!("{}: {} OK", action, name);
    }
    for (name, reason) in &report.failed {
        tracing::warn!("{}: {} failed: {}", action, name, reason);
    }
    if report.all_failed() {
        bail!("{} failed for every artifact", action);
    }
    Ok(())
}

/// Extract the bundle from a container into a local directory.
pub async fn pull(env: &str, remote_dir: &str, out: &Path) -> Result<()> {
    let docker = DockerCli::new();
    let batch = pull_bundle(&docker, env, remote_dir, out).await?;
    report("pull", &batch)
}

/// Inject a locally stored bundle into a container.
pub async fn push(env: &str, from: &Path, remote_dir: &str) -> Result<()> {
    let docker = DockerCli::new();
    let batch = push_bundle(&docker, env, from, remote_dir).await?;
    report("push", &batch)
}

/// Move the bundle from one container to another through a local scratch
/// directory, then verify the destination contents.
pub async fn relay(
    from_env: &str,
    to_env: &str,
    remote_dir: &str,
    scratch: Option<PathBuf>,
) -> Result<()> {
    let docker = DockerCli::new();

    // An explicit scratch directory is kept for inspection; the default
    // one is removed when the relay finishes.
    let tempdir;
    let scratch_dir = match scratch {
        Some(dir) => dir,
        None => {
            tempdir = tempfile::tempdir()?;
            tempdir.path().to_path_buf()
        }
    };

    let pulled = pull_bundle(&docker, from_env, remote_dir, &scratch_dir).await?;
    report("pull", &pulled)?;

    let pushed = push_bundle(&docker, to_env, &scratch_dir, remote_dir).await?;
    report("push", &pushed)?;

    let missing = verify_bundle(&docker, to_env, remote_dir).await?;
    if missing.is_empty() {
        tracing::info!("Verified: all artifacts present in {}:{}", to_env, remote_dir);
    } else {
        for name in &missing {
            tracing::warn!("Still missing in {}:{}: {}", to_env, remote_dir, name);
        }
    }
    Ok(())
}
