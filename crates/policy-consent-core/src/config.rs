// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Controller-level configuration.
//!
//! [`Config`] is the single entry point for tuning the agreement controller
//! at construction time.  Every field has a default so that
//! `Config::default()` is always a valid starting point.

use serde::{Deserialize, Serialize};

use crate::types::NameDisplay;

/// Which identifier the signup flow compares against the submitted
/// `agreedocs` list when marking a policy as agreed on the page.
///
/// The authenticated flow always compares version ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SignupAgreementMatch {
    /// Compare the policy id, so any ticked version of the policy counts.
    #[default]
    PolicyId,
    /// Compare the current version id, like the authenticated flow.
    VersionId,
}

/// Top-level configuration for [`AgreementController`].
///
/// # Examples
///
/// ```rust
/// use policy_consent_core::config::Config;
///
/// let config = Config {
///     privacy_officer: Some("dpo@example.org".into()),
///     ..Config::default()
/// };
/// assert!(!config.revoke_unchecked);
/// ```
///
/// [`AgreementController`]: crate::controller::AgreementController
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site root, e.g. `https://lms.example.org/`.
    pub wwwroot: String,

    /// Path of the policy pages below `wwwroot`.
    pub plugin_path: String,

    /// Contact shown on the agreement page.
    pub privacy_officer: Option<String>,

    /// When `true`, current versions left unticked on submission are
    /// revoked.  Defaults to `false` (unticked policies are left alone).
    pub revoke_unchecked: bool,

    pub signup_match: SignupAgreementMatch,

    /// Name format for viewers without the view-full-names capability.
    pub fullname_display: NameDisplay,

    /// Name format for viewers holding the view-full-names capability.
    /// Defaults to the same format as `fullname_display`.
    pub alternative_fullname_display: NameDisplay,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wwwroot: "http://localhost/".into(),
            plugin_path: "/admin/tool/policy".into(),
            privacy_officer: None,
            revoke_unchecked: false,
            signup_match: SignupAgreementMatch::PolicyId,
            fullname_display: NameDisplay::FirstLast,
            alternative_fullname_display: NameDisplay::FirstLast,
        }
    }
}
