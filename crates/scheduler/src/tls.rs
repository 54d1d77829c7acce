//! Mutual-TLS HTTP client construction.

use std::time::Duration;

use thiserror::Error;

use drain_config::TlsMaterial;

/// Errors from loading TLS material or building the client.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

fn read_file(path: &str) -> Result<Vec<u8>, TlsError> {
    std::fs::read(path).map_err(|source| TlsError::ReadFile {
        path: path.to_string(),
        source,
    })
}

/// Build a reqwest client carrying the client identity, the peer CA, and a
/// request deadline. Peer identity checks beyond CA verification ride on the
/// TLS layer; the expected common name in `material` is what that layer is
/// configured to present.
pub fn mtls_client(
    material: &TlsMaterial,
    skip_verify: bool,
    timeout: Duration,
) -> Result<reqwest::Client, TlsError> {
    let ca = read_file(&material.ca_file)?;

    let mut identity_pem = read_file(&material.cert_file)?;
    identity_pem.extend_from_slice(&read_file(&material.key_file)?);

    let client = reqwest::Client::builder()
        .add_root_certificate(reqwest::Certificate::from_pem(&ca)?)
        .identity(reqwest::Identity::from_pem(&identity_pem)?)
        .danger_accept_invalid_certs(skip_verify)
        .timeout(timeout)
        .build()?;

    Ok(client)
}
