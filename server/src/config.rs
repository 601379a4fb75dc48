use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, ServerError};

/// Server configuration, read from the environment with the deployment
/// defaults of the container images this runs in.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Control-class listener port (liveness probes only).
    pub control_port: u16,
    /// Credential-class listener port (provisioning traffic). Legacy
    /// single-port deployments set this to 8000.
    pub credential_port: u16,
    /// Provisioning endpoint path on the credential listener.
    pub provision_path: String,
    /// Artifact store directory.
    pub certs_dir: PathBuf,
    /// Command generating cert.pem/key.pem, as a program plus arguments.
    pub cert_command: Vec<String>,
    /// External delegated-credential generator program.
    pub generator_program: String,
    /// Signature scheme passed to the generator.
    pub signature_scheme: String,
    /// Credential validity passed to the generator.
    pub duration: String,
    /// Upper bound on one generator invocation.
    pub generator_timeout: Duration,
    /// Echo cert.pem/key.pem in the response body (debug deployments).
    pub debug_artifacts: bool,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_port(name: &str, default: u16) -> Result<u16> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ServerError::Config(format!("{} is not a valid port: {}", name, value))),
        Err(_) => Ok(default),
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let cert_command = env_or(
            "DCPROV_CERT_COMMAND",
            "openssl req -x509 -newkey ed25519 -keyout {key} -out {cert} -days 1 -nodes -subj /CN=dcprov-server",
        )
        .split_whitespace()
        .map(str::to_string)
        .collect::<Vec<_>>();

        if cert_command.is_empty() {
            return Err(ServerError::Config(
                "DCPROV_CERT_COMMAND must not be empty".to_string(),
            ));
        }

        let timeout_secs: u64 = {
            let raw = env_or("DCPROV_GENERATOR_TIMEOUT_SECS", "60");
            raw.parse().map_err(|_| {
                ServerError::Config(format!(
                    "DCPROV_GENERATOR_TIMEOUT_SECS is not a number: {}",
                    raw
                ))
            })?
        };

        Ok(Self {
            control_port: env_port("DCPROV_CONTROL_PORT", 5000)?,
            credential_port: env_port("DCPROV_CREDENTIAL_PORT", 5001)?,
            provision_path: env_or("DCPROV_PROVISION_PATH", "/certs"),
            certs_dir: PathBuf::from(env_or("DCPROV_CERTS_DIR", "/certs")),
            cert_command,
            generator_program: env_or("DCPROV_GENERATOR", "generate_delegated_credential"),
            signature_scheme: env_or("DCPROV_SIGNATURE_SCHEME", "Ed25519"),
            duration: env_or("DCPROV_DC_DURATION", "168h"),
            generator_timeout: Duration::from_secs(timeout_secs),
            debug_artifacts: env_or("DCPROV_DEBUG_ARTIFACTS", "false") == "true",
        })
    }
}
