//! Structural ARN validation.
//!
//! Only the shape is checked: `arn:aws<partition suffix>:<service>:<region>:<account>:<resource>`.
//! Whether the resource exists is left to STS.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;

static ARN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^arn:aws[A-Za-z0-9-]*:[A-Za-z0-9-]+:[A-Za-z0-9-]*:[0-9]{12}:[A-Za-z0-9+=/,.@_-]+$")
        .expect("ARN pattern is a valid regex")
});

/// Returns `true` if `arn` has the shape of an AWS ARN.
pub fn is_valid(arn: &str) -> bool {
    ARN_PATTERN.is_match(arn)
}

/// Validates `arn`, naming it `what` in the error (e.g. "role").
pub fn validate(what: &'static str, arn: &str) -> Result<(), Error> {
    if is_valid(arn) {
        Ok(())
    } else {
        Err(Error::InvalidArn {
            what,
            arn: arn.to_string(),
        })
    }
}
