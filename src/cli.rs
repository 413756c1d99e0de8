//! Command-line interface definitions.

use std::path::PathBuf;

use clap::Parser;

/// AWS credential_process helper for MFA-protected roles.
///
/// Prints role session credentials as the JSON document AWS SDKs expect from a
/// `credential_process`. Credentials are cached per role until they expire; on a
/// miss the helper asks for an MFA code and calls STS AssumeRole.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// ARN of the role to assume
    #[arg(long)]
    pub role_arn: String,

    /// ARN of the MFA device
    #[arg(long)]
    pub mfa_arn: String,

    /// AWS shared-config profile whose credentials sign the AssumeRole call
    #[arg(long, default_value = "default")]
    pub profile: String,

    /// Directory for cached credentials and the log file [default: platform state directory]
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Session duration in seconds (900-43200) [default: STS default of 3600]
    #[arg(long, value_parser = clap::value_parser!(i32).range(900..=43200))]
    pub duration: Option<i32>,

    /// Region of the STS endpoint [default: profile region, else us-east-1]
    #[arg(long)]
    pub region: Option<String>,

    /// 1Password account for automatic MFA token retrieval
    #[arg(long, requires = "op_item_name")]
    pub op_account: Option<String>,

    /// 1Password item name containing the TOTP
    #[arg(long, requires = "op_account")]
    pub op_item_name: Option<String>,
}
