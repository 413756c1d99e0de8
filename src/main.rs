//! AWS MFA credential_process helper
//!
//! This program supplies credentials for MFA-protected roles to AWS SDKs through the
//! `credential_process` setting of a shared-config profile:
//!
//! ```ini
//! [profile admin]
//! credential_process = aws-mfa-helper --role-arn arn:aws:iam::123456789012:role/Admin --mfa-arn arn:aws:iam::123456789012:mfa/me
//! ```
//!
//! The program performs the following operations:
//! 1. Parses and validates the role and MFA device ARNs
//! 2. Returns cached credentials for the role if they have not expired yet
//! 3. Otherwise asks for an MFA code (1Password first, if configured, then the terminal)
//! 4. Calls STS AssumeRole with the code, re-asking when STS rejects it
//! 5. Caches the new credentials and prints them to standard output

use anyhow::Result;
use clap::Parser;
use log::warn;

mod arn;
mod cache;
mod cli;
mod credentials;
mod error;
mod expiry;
mod logging;
mod process;
mod prompt;
mod sts;

use cache::CacheStore;
use cli::Args;
use process::CredentialProcess;
use prompt::{OnePasswordPrompt, TerminalPrompt};
use sts::StsAssumeRole;

/// Main entry point for the credential process.
///
/// Standard output receives exactly one line, the credential document, and only on
/// success. Any error ends the process with a non-zero exit code and the error chain
/// on standard error.
///
/// # Errors
/// This function will return an error if:
/// * Either ARN is malformed
/// * No state directory can be determined
/// * The MFA prompt is cancelled
/// * STS does not answer within the deadline
#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        role_arn,
        mfa_arn,
        profile,
        cache_dir,
        duration,
        region,
        op_account,
        op_item_name,
    } = Args::parse();

    // Reject malformed ARNs before touching the filesystem.
    arn::validate("role", &role_arn)?;
    arn::validate("MFA", &mfa_arn)?;

    let cache_dir = match cache_dir {
        Some(dir) => dir,
        None => cache::default_state_dir()?,
    };
    let dir_error = cache::ensure_dir(&cache_dir).await.err();
    if let Some(e) = logging::init(&cache_dir) {
        warn!("Logging to standard error: {e:#}");
    }
    if let Some(e) = dir_error {
        warn!("Credential cache unavailable: {e:#}");
    }

    let store = CacheStore::new(cache_dir);
    let sts = StsAssumeRole::new(profile, region, duration);
    let terminal = TerminalPrompt::stdio();

    match (op_account, op_item_name) {
        (Some(account), Some(item)) => {
            let prompt = OnePasswordPrompt::new(account, item, terminal);
            CredentialProcess::new(role_arn, mfa_arn, store, prompt, sts)?
                .run(std::io::stdout())
                .await
        }
        _ => {
            CredentialProcess::new(role_arn, mfa_arn, store, terminal, sts)?
                .run(std::io::stdout())
                .await
        }
    }
}
