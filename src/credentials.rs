//! Credential records: the `credential_process` response and its on-disk envelope.
//!
//! The response is the document AWS SDKs read from the helper's standard output,
//! see <https://docs.aws.amazon.com/sdkref/latest/guide/feature-process-credentials.html>.
//! Field order is significant and follows the struct declaration order.

use std::{fmt, io::Write};

use anyhow::{Context, Result};
use aws_sdk_sts::types;
use aws_smithy_types::{DateTime, date_time::Format};
use serde::{Deserialize, Serialize};

/// Only version of the `credential_process` document defined by AWS.
pub const PROCESS_CREDENTIALS_VERSION: i64 = 1;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CredentialProcessResponse {
    pub version: i64,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    /// RFC3339, e.g. `2024-01-02T15:04:05Z`.
    pub expiration: String,
}

impl CredentialProcessResponse {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
        expiration: impl Into<String>,
    ) -> Self {
        Self {
            version: PROCESS_CREDENTIALS_VERSION,
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: session_token.into(),
            expiration: expiration.into(),
        }
    }

    /// Serializes to a single line of JSON without a trailing newline.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).context("encoding credential_process response")
    }

    /// Writes the response followed by a newline and flushes `out`.
    pub fn emit<W: Write>(&self, mut out: W) -> Result<()> {
        let mut line = self.encode()?;
        line.push(b'\n');
        out.write_all(&line)
            .and_then(|()| out.flush())
            .context("writing credentials to standard output")
    }
}

impl TryFrom<&types::Credentials> for CredentialProcessResponse {
    type Error = anyhow::Error;

    fn try_from(credentials: &types::Credentials) -> Result<Self> {
        // Whole seconds only, so the cache file reads like `2024-01-02T15:04:05Z`.
        let expiration = DateTime::from_secs(credentials.expiration().secs())
            .fmt(Format::DateTime)
            .context("formatting session expiration")?;

        Ok(Self::new(
            credentials.access_key_id(),
            credentials.secret_access_key(),
            credentials.session_token(),
            expiration,
        ))
    }
}

impl fmt::Debug for CredentialProcessResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialProcessResponse")
            .field("version", &self.version)
            .field("access_key_id", &self.access_key_id)
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

/// On-disk cache document. New top-level fields can sit next to `credentials`
/// without touching the response shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedCredentials {
    pub credentials: CredentialProcessResponse,
}

impl CachedCredentials {
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).context("encoding cached credentials")
    }

    /// Parses a cache document. Only the shape is checked, not the key material.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("decoding cached credentials")
    }
}

impl From<CredentialProcessResponse> for CachedCredentials {
    fn from(credentials: CredentialProcessResponse) -> Self {
        Self { credentials }
    }
}
