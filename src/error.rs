//! Fatal error kinds the credential process distinguishes.
//!
//! Everything else travels as a plain `anyhow::Error` with context attached.

use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid {what} ARN: {arn:?}")]
    InvalidArn { what: &'static str, arn: String },

    #[error("MFA prompt was cancelled")]
    PromptCancelled,

    #[error("STS AssumeRole did not complete within {0:?}")]
    StsTimeout(Duration),

    #[error("STS returned no credentials")]
    MissingCredentials,
}
