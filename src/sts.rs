//! STS `AssumeRole` with an MFA code, signed by a shared-config profile.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sts::{Client, error::DisplayErrorContext, types};
use log::{debug, info};

use crate::error::Error;

/// Session name sent with every `AssumeRole` call.
pub const ROLE_SESSION_NAME: &str = "AssumedRoleSession";

/// STS is global; used when neither the flags nor the profile name a region.
pub const DEFAULT_STS_REGION: &str = "us-east-1";

/// Exchanges an MFA code for role session credentials.
#[async_trait]
pub trait AssumeRoleWithMfa {
    async fn assume_role(
        &self,
        role_arn: &str,
        mfa_serial: &str,
        token: &str,
    ) -> Result<types::Credentials>;
}

/// `AssumeRole` through the AWS SDK, signed with the credentials of a shared-config profile.
pub struct StsAssumeRole {
    profile: String,
    region: Option<String>,
    duration: Option<i32>,
}

impl StsAssumeRole {
    pub fn new(profile: impl Into<String>, region: Option<String>, duration: Option<i32>) -> Self {
        Self {
            profile: profile.into(),
            region,
            duration,
        }
    }

    async fn client(&self) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).profile_name(&self.profile);
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let config = loader.load().await;

        if config.region().is_some() {
            return Client::new(&config);
        }

        info!("No region configured for profile {}, using {DEFAULT_STS_REGION}", self.profile);
        let config = config
            .to_builder()
            .region(Region::new(DEFAULT_STS_REGION))
            .build();
        Client::new(&config)
    }
}

#[async_trait]
impl AssumeRoleWithMfa for StsAssumeRole {
    async fn assume_role(
        &self,
        role_arn: &str,
        mfa_serial: &str,
        token: &str,
    ) -> Result<types::Credentials> {
        debug!("AssumeRole {role_arn} with MFA {mfa_serial} using profile {}", self.profile);

        self.client()
            .await
            .assume_role()
            .role_arn(role_arn)
            .role_session_name(ROLE_SESSION_NAME)
            .serial_number(mfa_serial)
            .token_code(token)
            .set_duration_seconds(self.duration)
            .send()
            .await
            .map_err(|e| anyhow!("calling STS AssumeRole: {}", DisplayErrorContext(&e)))?
            .credentials
            .ok_or_else(|| Error::MissingCredentials.into())
    }
}
