use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use dcprov_protocol::wire::decode_artifact;
use dcprov_protocol::{now_ns, ProvisionResponse, TimestampTrace};

/// Provisioning client: triggers credential generation on the server and
/// persists the returned artifacts.
pub struct ProvisioningClient {
    http: reqwest::Client,
    url: String,
}

/// Longest prefix of a response body worth logging on failure.
const BODY_PREVIEW: usize = 2000;

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW).collect()
}

impl ProvisioningClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// One provisioning exchange: POST the trigger, time it, decode the
    /// artifacts, write them under `out_dir`.
    ///
    /// Transport failures, non-200 statuses and unparseable bodies are
    /// hard failures that leave no partial state. A missing or
    /// undecodable artifact field degrades that field only.
    pub async fn fetch(&self, out_dir: &Path) -> Result<()> {
        tracing::info!("Requesting credentials from {}", self.url);

        let client_send = now_ns();
        let response = self
            .http
            .post(&self.url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.url))?;
        let client_recv = now_ns();

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        tracing::info!("HTTP status: {}", status);
        tracing::info!("t1.1 (client send): {} ns", client_send);
        tracing::info!("t1.2 (client recv): {} ns", client_recv);
        tracing::info!(
            "Total (t1.2 - t1.1): {} ns",
            client_recv.saturating_sub(client_send)
        );

        if status.as_u16() != 200 {
            bail!(
                "Server responded {}, body (truncated): {}",
                status,
                preview(&body)
            );
        }

        let parsed: ProvisionResponse = serde_json::from_str(&body).with_context(|| {
            format!(
                "Failed to decode JSON response, raw body (truncated): {}",
                preview(&body)
            )
        })?;

        self.log_trace(&parsed, client_send, client_recv);

        for name in &parsed.missing {
            tracing::warn!("Server reported missing artifact: {}", name);
        }

        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create {}", out_dir.display()))?;

        self.save_field(out_dir, "dc.cred", "dc_cred_b64", &parsed.dc_cred_b64);
        self.save_field(out_dir, "dckey.pem", "dc_key_b64", &parsed.dc_key_b64);

        tracing::info!("Provisioning complete");
        Ok(())
    }

    /// Log server-side checkpoints individually (older servers omit
    /// them), and the full six-point trace when complete.
    fn log_trace(&self, parsed: &ProvisionResponse, client_send: u64, client_recv: u64) {
        if let Some(t) = parsed.server_recv_ns {
            tracing::info!("t2.1 (server recv): {} ns", t);
        }
        if let Some(t) = parsed.generator_start_ns {
            tracing::info!("t3.1 (generator start): {} ns", t);
        }
        if let Some(t) = parsed.generator_end_ns {
            tracing::info!("t3.2 (generator end): {} ns", t);
        }
        if let Some(t) = parsed.server_send_ns {
            tracing::info!("t2.2 (server send): {} ns", t);
        }

        if let Some(trace) = TimestampTrace::from_parts(
            client_send,
            parsed.server_recv_ns,
            parsed.generator_start_ns,
            parsed.generator_end_ns,
            parsed.server_send_ns,
            client_recv,
        ) {
            tracing::info!(
                "Full trace: total {} ns, generator {} ns",
                trace.total_ns(),
                trace.generator_ns()
            );
            for (before, after) in trace.violations() {
                tracing::warn!(
                    "Timestamp ordering violated: {} > {} (clock skew across hosts?)",
                    before,
                    after
                );
            }
        }
    }

    /// Decode one base64 field and write it; field-level problems are
    /// logged and never abort the remaining fields.
    fn save_field(&self, out_dir: &Path, file_name: &str, field: &str, value: &str) {
        if value.is_empty() {
            tracing::warn!("Field {} is empty, skipping {}", field, file_name);
            return;
        }
        let bytes = match decode_artifact(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Failed to decode {}: {}", field, e);
                return;
            }
        };
        let path = out_dir.join(file_name);
        match std::fs::write(&path, &bytes) {
            Ok(()) => tracing::info!("Saved {} ({} bytes)", path.display(), bytes.len()),
            Err(e) => tracing::error!("Failed to save {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use dcprov_protocol::wire::encode_artifact;

    use super::*;

    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/certs", addr)
    }

    #[tokio::test]
    async fn fetch_decodes_and_persists_both_artifacts() {
        let router = Router::new().route(
            "/certs",
            post(|| async {
                Json(ProvisionResponse {
                    dc_cred_b64: encode_artifact(b"THE-CREDENTIAL"),
                    dc_key_b64: encode_artifact(b"THE-KEY"),
                    server_recv_ns: Some(1),
                    generator_start_ns: Some(2),
                    generator_end_ns: Some(3),
                    server_send_ns: Some(4),
                    ..Default::default()
                })
            }),
        );
        let url = spawn_server(router).await;
        let out = tempfile::tempdir().unwrap();

        let client = ProvisioningClient::new(url, Duration::from_secs(120)).unwrap();
        client.fetch(out.path()).await.unwrap();

        assert_eq!(
            std::fs::read(out.path().join("dc.cred")).unwrap(),
            b"THE-CREDENTIAL"
        );
        assert_eq!(
            std::fs::read(out.path().join("dckey.pem")).unwrap(),
            b"THE-KEY"
        );
    }

    #[tokio::test]
    async fn non_200_is_a_hard_failure_with_no_files_written() {
        let router = Router::new().route(
            "/certs",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        );
        let url = spawn_server(router).await;
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("certs");

        let client = ProvisioningClient::new(url, Duration::from_secs(5)).unwrap();
        let err = client.fetch(&target).await.unwrap_err();

        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("maintenance"));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn unparseable_body_surfaces_the_raw_body() {
        let router = Router::new().route("/certs", post(|| async { "not json at all" }));
        let url = spawn_server(router).await;
        let out = tempfile::tempdir().unwrap();

        let client = ProvisioningClient::new(url, Duration::from_secs(5)).unwrap();
        let err = client.fetch(out.path()).await.unwrap_err();
        assert!(format!("{:#}", err).contains("not json at all"));
    }

    #[tokio::test]
    async fn empty_and_malformed_fields_degrade_per_field() {
        let router = Router::new().route(
            "/certs",
            post(|| async {
                Json(ProvisionResponse {
                    dc_cred_b64: encode_artifact(b"ONLY-THE-CRED"),
                    dc_key_b64: "!!!not-base64!!!".to_string(),
                    ..Default::default()
                })
            }),
        );
        let url = spawn_server(router).await;
        let out = tempfile::tempdir().unwrap();

        let client = ProvisioningClient::new(url, Duration::from_secs(5)).unwrap();
        // Run continues past the bad field.
        client.fetch(out.path()).await.unwrap();

        assert_eq!(
            std::fs::read(out.path().join("dc.cred")).unwrap(),
            b"ONLY-THE-CRED"
        );
        assert!(!out.path().join("dckey.pem").exists());
    }

    #[tokio::test]
    async fn request_timeout_is_a_hard_failure() {
        let router = Router::new().route(
            "/certs",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                "late"
            }),
        );
        let url = spawn_server(router).await;
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("certs");

        let client = ProvisioningClient::new(url, Duration::from_millis(200)).unwrap();
        assert!(client.fetch(&target).await.is_err());
        assert!(!target.exists());
    }
}
