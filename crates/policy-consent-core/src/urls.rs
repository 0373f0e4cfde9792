// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! URL construction for the policy pages.

use url::Url;

use crate::config::Config;
use crate::types::{PolicyId, UserId, VersionId};

/// Builds absolute URLs below the configured site root.
///
/// # Examples
///
/// ```rust
/// use policy_consent_core::{config::Config, urls::PluginUrls};
///
/// let urls = PluginUrls::from_config(&Config::default()).unwrap();
/// let index = urls.index(Some(42)).unwrap();
/// assert_eq!(index.as_str(), "http://localhost/admin/tool/policy/index.php?userid=42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginUrls {
    /// Always ends with `/` so that relative joins stay below it.
    wwwroot: Url,
    /// Plugin path relative to `wwwroot`, without leading or trailing `/`.
    plugin_path: String,
}

impl PluginUrls {
    pub fn from_config(config: &Config) -> Result<Self, url::ParseError> {
        let mut root = config.wwwroot.clone();
        if !root.ends_with('/') {
            root.push('/');
        }
        Ok(Self {
            wwwroot: Url::parse(&root)?,
            plugin_path: config.plugin_path.trim_matches('/').to_owned(),
        })
    }

    /// The site root itself.
    pub fn site_root(&self) -> &Url {
        &self.wwwroot
    }

    /// Resolve a site-relative `path` and append `params` as a query.
    pub fn page(&self, path: &str, params: &[(&str, String)]) -> Result<Url, url::ParseError> {
        let mut url = self.wwwroot.join(path.trim_start_matches('/'))?;
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn plugin_page(&self, file: &str, params: &[(&str, String)]) -> Result<Url, url::ParseError> {
        self.page(&format!("{}/{}", self.plugin_path, file), params)
    }

    /// Base URL of the policy pages.
    pub fn plugin_base(&self) -> Result<Url, url::ParseError> {
        self.page(&self.plugin_path, &[])
    }

    /// The agreement page, for oneself or for `behalf`.
    pub fn index(&self, behalf: Option<UserId>) -> Result<Url, url::ParseError> {
        match behalf {
            Some(id) => self.plugin_page("index.php", &[("userid", id.to_string())]),
            None => self.plugin_page("index.php", &[]),
        }
    }

    /// One document of the guided tour.
    pub fn view_version(
        &self,
        version_id: VersionId,
        return_url: &Url,
        num_policy: usize,
        total_policies: usize,
    ) -> Result<Url, url::ParseError> {
        self.plugin_page(
            "view.php",
            &[
                ("versionid", version_id.to_string()),
                ("returnurl", return_url.to_string()),
                ("numpolicy", num_policy.to_string()),
                ("totalpolicies", total_policies.to_string()),
            ],
        )
    }

    /// Full view of a policy's current version.
    pub fn view_policy(&self, policy_id: PolicyId, return_url: &Url) -> Result<Url, url::ParseError> {
        self.plugin_page(
            "view.php",
            &[
                ("policyid", policy_id.to_string()),
                ("returnurl", return_url.to_string()),
            ],
        )
    }

    /// Acceptance details of one user for one version.
    pub fn acceptance(&self, user_id: UserId, version_id: VersionId) -> Result<Url, url::ParseError> {
        self.plugin_page(
            "acceptance.php",
            &[
                ("userid", user_id.to_string()),
                ("versionid", version_id.to_string()),
            ],
        )
    }

    pub fn user_profile(&self, user_id: UserId) -> Result<Url, url::ParseError> {
        self.page("user/profile.php", &[("id", user_id.to_string())])
    }

    pub fn signup(&self) -> Result<Url, url::ParseError> {
        self.page("login/signup.php", &[])
    }

    /// Whether `candidate` points at the signup page, ignoring its query.
    pub fn is_signup(&self, candidate: &str) -> bool {
        match (Url::parse(candidate), self.signup()) {
            (Ok(candidate), Ok(signup)) => same_base(&candidate, &signup),
            _ => false,
        }
    }
}

/// Scheme, host, port, and path match; query and fragment are ignored.
fn same_base(left: &Url, right: &Url) -> bool {
    left.scheme() == right.scheme()
        && left.host_str() == right.host_str()
        && left.port_or_known_default() == right.port_or_known_default()
        && left.path() == right.path()
}
