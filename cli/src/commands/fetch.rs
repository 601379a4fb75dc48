use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use crate::client::ProvisioningClient;

/// Trigger one provisioning exchange and persist the credentials.
pub async fn run(server_url: &str, timeout_secs: u64, out_dir: &Path) -> Result<()> {
    let client = ProvisioningClient::new(server_url, Duration::from_secs(timeout_secs))?;
    client.fetch(out_dir).await
}
