//! MFA token prompts.
//!
//! The credential process only needs one thing from a human: a six-digit code,
//! or a signal that they gave up. Anything that can deliver that implements
//! [`PromptMfaToken`]. Prompts never write to standard output, which is
//! reserved for the credential document.

use std::fmt;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::{info, warn};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stderr, Stdin},
    process::Command,
};

/// A syntactically valid MFA code: exactly six ASCII digits.
#[derive(Clone, PartialEq, Eq)]
pub struct MfaToken(String);

impl MfaToken {
    pub fn parse(code: &str) -> Result<Self> {
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            bail!("MFA token must be 6 digits");
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MfaToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MfaToken(******)")
    }
}

/// What the prompt is asked for. `error` carries the reason the previous code was rejected.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub role_arn: String,
    pub mfa_serial: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Token(MfaToken),
    Cancelled,
}

#[async_trait]
pub trait PromptMfaToken {
    async fn request_token(&mut self, request: &PromptRequest) -> Result<PromptOutcome>;
}

/// Line-oriented prompt: writes to `output`, reads codes from `input`.
///
/// End of input or an empty line cancels. Malformed codes are re-asked.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<BufReader<Stdin>, Stderr> {
    /// Prompts on standard error and reads from standard input.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stderr())
    }
}

impl<R, W> TerminalPrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    async fn say(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl<R, W> PromptMfaToken for TerminalPrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn request_token(&mut self, request: &PromptRequest) -> Result<PromptOutcome> {
        if let Some(error) = &request.error {
            self.say(&format!("Error: {error}\n")).await?;
        }

        loop {
            self.say(&format!(
                "Enter MFA code for {} (assuming {}): ",
                request.mfa_serial, request.role_arn
            ))
            .await?;

            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .await
                .context("reading MFA code")?;
            let code = line.trim();
            if read == 0 || code.is_empty() {
                return Ok(PromptOutcome::Cancelled);
            }

            match MfaToken::parse(code) {
                Ok(token) => return Ok(PromptOutcome::Token(token)),
                Err(e) => self.say(&format!("{e}\n")).await?,
            }
        }
    }
}

/// Fetches the first code from the 1Password CLI, then defers to `fallback`.
///
/// Once STS has rejected a code, or `op` failed, every later request goes to
/// `fallback`: asking 1Password again within the same TOTP window would return
/// the code that was just rejected.
pub struct OnePasswordPrompt<P> {
    account: String,
    item: String,
    program: String,
    tried: bool,
    fallback: P,
}

impl<P: PromptMfaToken + Send> OnePasswordPrompt<P> {
    pub fn new(account: String, item: String, fallback: P) -> Self {
        Self {
            account,
            item,
            program: "op".to_string(),
            tried: false,
            fallback,
        }
    }
}

async fn fetch_otp(program: &str, account: &str, item: &str) -> Option<MfaToken> {
    let output = Command::new(program)
        .args(["item", "get", "--account", account, item, "--otp"])
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    MfaToken::parse(String::from_utf8_lossy(&output.stdout).trim()).ok()
}

#[async_trait]
impl<P: PromptMfaToken + Send> PromptMfaToken for OnePasswordPrompt<P> {
    async fn request_token(&mut self, request: &PromptRequest) -> Result<PromptOutcome> {
        if !self.tried && request.error.is_none() {
            self.tried = true;
            if let Some(token) = fetch_otp(&self.program, &self.account, &self.item).await {
                info!("Retrieved MFA token from 1Password");
                return Ok(PromptOutcome::Token(token));
            }
            warn!("Failed to get token from 1Password, falling back to manual input");
        }
        self.fallback.request_token(request).await
    }
}
