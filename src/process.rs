//! The credential process flow.
//!
//! ```text
//! validate ARNs ─► load cache ─► fresh? ──yes──────────────────────────────► emit
//!                                  │no (missing, stale, unreadable)
//!                                  ▼
//!                  ┌──────────► prompt ──cancel──► error
//!                  │              │token
//!                  │              ▼
//!                  └──STS error── AssumeRole ──deadline──► error
//!                                 │ok
//!                                 ▼
//!                         store (warn on failure) ─► emit
//! ```
//!
//! All `AssumeRole` attempts share one time budget, counted from the first
//! call. The clock only runs while a call is in flight: time spent at the
//! prompt, including re-prompts after a rejected code, does not count.

use std::{io::Write, time::Duration};

use anyhow::Result;
use log::{info, warn};
use tokio::time::{Instant, timeout};

use crate::{
    arn,
    cache::CacheStore,
    credentials::{CredentialProcessResponse, PROCESS_CREDENTIALS_VERSION},
    error::Error,
    expiry,
    prompt::{PromptMfaToken, PromptOutcome, PromptRequest},
    sts::AssumeRoleWithMfa,
};

/// In-flight time budget shared by all `AssumeRole` attempts of one invocation.
pub const STS_TIMEOUT: Duration = Duration::from_secs(30);

pub struct CredentialProcess<P, S> {
    role_arn: String,
    mfa_serial: String,
    cache: CacheStore,
    prompt: P,
    sts: S,
    sts_timeout: Duration,
}

impl<P, S> CredentialProcess<P, S>
where
    P: PromptMfaToken + Send,
    S: AssumeRoleWithMfa + Send + Sync,
{
    /// Fails with [`Error::InvalidArn`] before anything touches the cache or the network.
    pub fn new(
        role_arn: String,
        mfa_serial: String,
        cache: CacheStore,
        prompt: P,
        sts: S,
    ) -> Result<Self> {
        arn::validate("role", &role_arn)?;
        arn::validate("MFA", &mfa_serial)?;

        Ok(Self {
            role_arn,
            mfa_serial,
            cache,
            prompt,
            sts,
            sts_timeout: STS_TIMEOUT,
        })
    }

    /// Writes credentials for the role to `out`, from the cache or from STS.
    pub async fn run<W: Write>(&mut self, out: W) -> Result<()> {
        if let Some(cached) = self.fresh_cached().await {
            info!("Using cached credentials, expiring at {}", cached.expiration);
            return cached.emit(out);
        }

        let response = self.assume_role().await?;
        info!("Obtained credentials expiring at {}", response.expiration);

        if let Err(e) = self.cache.store(&response, &self.role_arn).await {
            warn!("Unable to cache credentials: {e:#}");
        }
        response.emit(out)
    }

    async fn fresh_cached(&self) -> Option<CredentialProcessResponse> {
        match self.cache.load(&self.role_arn).await {
            Ok(Some(cached)) if cached.version != PROCESS_CREDENTIALS_VERSION => {
                warn!("Ignoring cached credentials with unsupported version {}", cached.version);
                None
            }
            Ok(Some(cached)) if !expiry::is_expired(&cached.expiration) => Some(cached),
            Ok(Some(cached)) => {
                info!("Cached credentials are stale (expired {})", cached.expiration);
                None
            }
            Ok(None) => {
                info!("No cached credentials for {}", self.role_arn);
                None
            }
            Err(e) => {
                warn!("Ignoring unreadable credential cache: {e:#}");
                None
            }
        }
    }

    async fn assume_role(&mut self) -> Result<CredentialProcessResponse> {
        let mut request = PromptRequest {
            role_arn: self.role_arn.clone(),
            mfa_serial: self.mfa_serial.clone(),
            error: None,
        };
        let mut remaining = self.sts_timeout;

        loop {
            let token = match self.prompt.request_token(&request).await? {
                PromptOutcome::Token(token) => token,
                PromptOutcome::Cancelled => return Err(Error::PromptCancelled.into()),
            };

            if remaining.is_zero() {
                return Err(Error::StsTimeout(self.sts_timeout).into());
            }

            let started = Instant::now();
            let call = self
                .sts
                .assume_role(&self.role_arn, &self.mfa_serial, token.as_str());
            match timeout(remaining, call).await {
                Ok(Ok(credentials)) => return CredentialProcessResponse::try_from(&credentials),
                Ok(Err(e)) => {
                    warn!("AssumeRole failed: {e:#}");
                    request.error = Some(format!("{e:#}"));
                    remaining = remaining.saturating_sub(started.elapsed());
                }
                Err(_) => return Err(Error::StsTimeout(self.sts_timeout).into()),
            }
        }
    }
}
