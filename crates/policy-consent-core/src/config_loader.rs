// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Configuration loader for [`AgreementController`].
//!
//! Supports two load strategies:
//!
//! 1. **TOML file**: [`load_config`] reads and deserialises a TOML file into
//!    a [`Config`].
//! 2. **Environment variables**: [`load_config_from_env`] reads
//!    `POLICY_`-prefixed environment variables.
//!
//! # File format
//!
//! ```toml
//! wwwroot          = "https://lms.example.org/"
//! plugin_path      = "/admin/tool/policy"
//! privacy_officer  = "dpo@example.org"
//! revoke_unchecked = false
//! signup_match     = "policy_id"     # "policy_id" | "version_id"
//! ```
//!
//! # Environment variables
//!
//! | Variable                   | Type    | Default               |
//! |----------------------------|---------|-----------------------|
//! | `POLICY_WWWROOT`           | string  | `http://localhost/`   |
//! | `POLICY_PLUGIN_PATH`       | string  | `/admin/tool/policy`  |
//! | `POLICY_PRIVACY_OFFICER`   | string  | unset                 |
//! | `POLICY_REVOKE_UNCHECKED`  | boolean | false                 |
//! | `POLICY_SIGNUP_MATCH`      | string  | `policy_id`           |
//!
//! [`AgreementController`]: crate::controller::AgreementController

#![cfg(feature = "config-loader")]

use std::fs;

use thiserror::Error;

use crate::config::{Config, SignupAgreementMatch};

/// Errors that can occur while loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file \"{path}\": {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("field \"{field}\": cannot parse \"{value}\": {reason}")]
    ParseField {
        field: String,
        value: String,
        reason: String,
    },

    #[error("field \"{field}\": \"{value}\" is not an absolute URL: {source}")]
    InvalidUrl {
        field: String,
        value: String,
        #[source]
        source: url::ParseError,
    },
}

/// Load a [`Config`] from a TOML file.  Missing keys take their defaults.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, the TOML does not
/// match the schema, or `wwwroot` is not an absolute URL.
///
/// # Example
///
/// ```rust,no_run
/// use policy_consent_core::config_loader::load_config;
///
/// let config = load_config("/etc/policy/consent.toml").unwrap();
/// println!("Site root: {}", config.wwwroot);
/// ```
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_owned(),
        source,
    })?;
    let config: Config = toml::from_str(&content)?;
    validate_wwwroot(&config.wwwroot, "wwwroot")?;
    Ok(config)
}

/// Load a [`Config`] from `POLICY_`-prefixed environment variables.
///
/// Unset variables fall back to their defaults.
///
/// # Errors
///
/// Returns [`ConfigError::ParseField`] for unparsable values and
/// [`ConfigError::InvalidUrl`] for a malformed `POLICY_WWWROOT`.
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    let defaults = Config::default();

    let wwwroot = std::env::var("POLICY_WWWROOT").unwrap_or(defaults.wwwroot);
    validate_wwwroot(&wwwroot, "POLICY_WWWROOT")?;

    let plugin_path = std::env::var("POLICY_PLUGIN_PATH").unwrap_or(defaults.plugin_path);
    let privacy_officer = std::env::var("POLICY_PRIVACY_OFFICER")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or(defaults.privacy_officer);
    let revoke_unchecked = read_env_bool("POLICY_REVOKE_UNCHECKED", defaults.revoke_unchecked)?;
    let signup_match = match std::env::var("POLICY_SIGNUP_MATCH") {
        Ok(value) => parse_signup_match("POLICY_SIGNUP_MATCH", &value)?,
        Err(_) => defaults.signup_match,
    };

    Ok(Config {
        wwwroot,
        plugin_path,
        privacy_officer,
        revoke_unchecked,
        signup_match,
        ..defaults
    })
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn validate_wwwroot(value: &str, field: &str) -> Result<(), ConfigError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|source| ConfigError::InvalidUrl {
            field: field.to_owned(),
            value: value.to_owned(),
            source,
        })
}

fn parse_signup_match(key: &str, value: &str) -> Result<SignupAgreementMatch, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "policy_id" | "policyid" => Ok(SignupAgreementMatch::PolicyId),
        "version_id" | "versionid" => Ok(SignupAgreementMatch::VersionId),
        other => Err(ConfigError::ParseField {
            field: key.to_owned(),
            value: other.to_owned(),
            reason: "expected one of: policy_id, version_id".into(),
        }),
    }
}

fn read_env_bool(key: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(key) {
        Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
            "true"  | "1" | "yes" | "on"  => Ok(true),
            "false" | "0" | "no"  | "off" => Ok(false),
            other => Err(ConfigError::ParseField {
                field: key.to_owned(),
                value: other.to_owned(),
                reason: "expected one of: true/false, 1/0, yes/no, on/off".into(),
            }),
        },
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "wwwroot = \"https://lms.example.org/\"\nprivacy_officer = \"dpo@example.org\"\nsignup_match = \"version_id\""
        )
        .expect("write");

        let config = load_config(file.path().to_str().expect("utf-8 path")).expect("valid config");
        assert_eq!(config.wwwroot, "https://lms.example.org/");
        assert_eq!(config.privacy_officer.as_deref(), Some("dpo@example.org"));
        assert_eq!(config.signup_match, SignupAgreementMatch::VersionId);
        assert_eq!(config.plugin_path, "/admin/tool/policy");
        assert!(!config.revoke_unchecked);
    }

    #[test]
    fn test_relative_wwwroot_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "wwwroot = \"lms.example.org\"").expect("write");
        let err = load_config(file.path().to_str().expect("utf-8 path")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_config("/nonexistent/consent.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/consent.toml"));
    }

    #[test]
    fn test_parse_signup_match_values() {
        assert_eq!(parse_signup_match("k", "Version_ID").unwrap(), SignupAgreementMatch::VersionId);
        assert!(parse_signup_match("k", "either").is_err());
    }
}
