use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

/// JSON body of a successful `POST /certs` exchange.
///
/// The base64 fields are empty strings when the corresponding artifact was
/// not produced; `missing` names the absent artifacts (the partial-bundle
/// report). The timestamp fields keep their dotted wire names and are
/// optional: older servers omit them and their absence is a valid state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvisionResponse {
    #[serde(default)]
    pub dc_cred_b64: String,

    #[serde(default)]
    pub dc_key_b64: String,

    /// Debug echo of the certificate, only present when the server runs
    /// with debug artifacts enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_b64: Option<String>,

    /// Debug echo of the certificate key, same condition as `cert_b64`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_b64: Option<String>,

    /// Exit status of the external generator process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator_exit: Option<i32>,

    /// t2.1: server received the request
    #[serde(rename = "t2.1_ns", default, skip_serializing_if = "Option::is_none")]
    pub server_recv_ns: Option<u64>,

    /// t3.1: generator invocation started
    #[serde(rename = "t3.1_ns", default, skip_serializing_if = "Option::is_none")]
    pub generator_start_ns: Option<u64>,

    /// t3.2: generator invocation ended
    #[serde(rename = "t3.2_ns", default, skip_serializing_if = "Option::is_none")]
    pub generator_end_ns: Option<u64>,

    /// t2.2: server wrote the response
    #[serde(rename = "t2.2_ns", default, skip_serializing_if = "Option::is_none")]
    pub server_send_ns: Option<u64>,

    /// Artifacts that were expected but absent after generation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

/// Encode artifact bytes for transport.
pub fn encode_artifact(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Decode a transport field back into artifact bytes.
pub fn decode_artifact(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64.decode(text)
}
