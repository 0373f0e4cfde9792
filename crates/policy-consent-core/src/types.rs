// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Shared data types used across the consent sub-systems.
//!
//! All record types implement [`Clone`], [`Debug`], [`serde::Serialize`], and
//! [`serde::Deserialize`] so they can be persisted by any [`Storage`]
//! backend and handed to a rendering layer without conversion steps.
//!
//! [`Storage`]: crate::storage::Storage

use serde::{Deserialize, Serialize};

/// Identifier of a user.  `0` is the anonymous (not yet registered) user.
pub type UserId = u64;
/// Identifier of a policy document.
pub type PolicyId = u64;
/// Identifier of one revision of a policy document.
pub type VersionId = u64;
/// Identifier of an acceptance row.
pub type AcceptanceId = u64;

/// The id carried by a visitor who has no account yet (signup flow).
pub const ANONYMOUS_USER_ID: UserId = 0;

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Visibility tier of a policy.
///
/// # Examples
///
/// ```rust
/// use policy_consent_core::types::Audience;
///
/// assert!(Audience::All.covers(Audience::LoggedIn));
/// assert!(!Audience::Guests.covers(Audience::LoggedIn));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    /// Shown to everybody.
    #[default]
    All,
    /// Shown to authenticated users only.
    LoggedIn,
    /// Shown to guest sessions only.
    Guests,
}

impl Audience {
    /// Whether a policy published for `self` must be shown to `requested`.
    pub fn covers(self, requested: Audience) -> bool {
        self == Audience::All || self == requested
    }
}

/// A versioned document a user must consent to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    /// Display name.
    pub name: String,
    pub audience: Audience,
    /// The active version, if one has been published.
    pub currentversionid: Option<VersionId>,
}

impl Policy {
    /// Project this policy onto its current version, or `None` when it has
    /// never been published.
    pub fn current(&self) -> Option<CurrentPolicy> {
        self.currentversionid.map(|currentversionid| CurrentPolicy {
            id: self.id,
            name: self.name.clone(),
            currentversionid,
        })
    }
}

/// A policy known to have a published current version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentPolicy {
    pub id: PolicyId,
    pub name: String,
    pub currentversionid: VersionId,
}

/// One immutable revision of a policy's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyVersion {
    pub id: VersionId,
    pub policyid: PolicyId,
    /// Short summary shown on the agreement page.
    pub summary: String,
    /// Full document body.
    pub content: String,
}

/// Filter used by [`Storage::list_policies`](crate::storage::Storage::list_policies).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyFilter {
    /// If set, only return these policy ids.
    pub ids: Option<Vec<PolicyId>>,
    /// Only return policies with a published current version.
    pub only_current: bool,
    /// If set, only return policies whose audience covers this tier.
    pub audience: Option<Audience>,
}

impl PolicyFilter {
    /// Policies with a current version visible to logged-in users.
    pub fn loggedin_current() -> Self {
        Self {
            ids: None,
            only_current: true,
            audience: Some(Audience::LoggedIn),
        }
    }

    /// Whether `policy` satisfies every criterion of this filter.
    pub fn matches(&self, policy: &Policy) -> bool {
        if let Some(ref ids) = self.ids {
            if !ids.contains(&policy.id) {
                return false;
            }
        }
        if self.only_current && policy.currentversionid.is_none() {
            return false;
        }
        if let Some(audience) = self.audience {
            if !policy.audience.covers(audience) {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Acceptances
// ---------------------------------------------------------------------------

/// Stored status of an acceptance row.
///
/// Serialised as its raw integer (`1`, `-1`, `0`).
///
/// # Examples
///
/// ```rust
/// use policy_consent_core::types::AcceptanceStatus;
///
/// assert_eq!(AcceptanceStatus::from_raw(-1), Some(AcceptanceStatus::Revoked));
/// assert_eq!(AcceptanceStatus::Accepted.raw(), 1);
/// assert_eq!(AcceptanceStatus::from_raw(7), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum AcceptanceStatus {
    Accepted,
    Revoked,
    /// A placeholder row with no decision recorded.
    Empty,
}

impl AcceptanceStatus {
    pub fn raw(self) -> i8 {
        match self {
            AcceptanceStatus::Accepted => 1,
            AcceptanceStatus::Revoked => -1,
            AcceptanceStatus::Empty => 0,
        }
    }

    pub fn from_raw(value: i8) -> Option<Self> {
        match value {
            1 => Some(AcceptanceStatus::Accepted),
            -1 => Some(AcceptanceStatus::Revoked),
            0 => Some(AcceptanceStatus::Empty),
            _ => None,
        }
    }
}

impl From<AcceptanceStatus> for i8 {
    fn from(status: AcceptanceStatus) -> Self {
        status.raw()
    }
}

impl TryFrom<i8> for AcceptanceStatus {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        AcceptanceStatus::from_raw(value)
            .ok_or_else(|| format!("invalid acceptance status {value}"))
    }
}

/// One row of the append-only acceptance history.
///
/// Rows are never updated in place; the row with the highest `id` for a
/// `(userid, policyversionid)` pair is the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acceptance {
    /// Assigned by the storage backend on append.
    pub id: AcceptanceId,
    pub policyversionid: VersionId,
    /// The subject the acceptance is about.
    pub userid: UserId,
    /// `None` models a row whose status column was never written.
    pub status: Option<AcceptanceStatus>,
    /// Interface language active when the row was recorded.
    pub lang: String,
    /// Who recorded the row (differs from `userid` for on-behalf acceptances).
    pub usermodified: UserId,
    pub note: Option<String>,
    pub timecreated_ms: u64,
}

impl Acceptance {
    pub fn is_accepted(&self) -> bool {
        self.status == Some(AcceptanceStatus::Accepted)
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Minimal user profile needed to label on-behalf pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub firstname: String,
    pub lastname: String,
    /// Persisted "has agreed to every current policy" flag.
    pub policyagreed: bool,
    pub deleted: bool,
}

/// Order in which a user's name parts are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NameDisplay {
    #[default]
    FirstLast,
    LastFirst,
    FirstOnly,
}

impl UserProfile {
    /// Render the user's name using `display`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use policy_consent_core::types::{NameDisplay, UserProfile};
    ///
    /// let user = UserProfile {
    ///     id: 7,
    ///     firstname: "Ana".into(),
    ///     lastname: "Silva".into(),
    ///     policyagreed: false,
    ///     deleted: false,
    /// };
    /// assert_eq!(user.fullname(NameDisplay::LastFirst), "Silva Ana");
    /// ```
    pub fn fullname(&self, display: NameDisplay) -> String {
        match display {
            NameDisplay::FirstLast => format!("{} {}", self.firstname, self.lastname),
            NameDisplay::LastFirst => format!("{} {}", self.lastname, self.firstname),
            NameDisplay::FirstOnly => self.firstname.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Display model
// ---------------------------------------------------------------------------

/// An anchor ready for a template: target plus text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub text: String,
}

/// A link that opens the policy in a modal viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalLink {
    pub href: String,
    pub text: String,
    #[serde(rename = "data-action")]
    pub data_action: String,
    #[serde(rename = "data-versionid")]
    pub data_versionid: VersionId,
    #[serde(rename = "data-behalfid")]
    pub data_behalfid: UserId,
}

/// A current policy annotated with the subject's acceptance state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyAcceptanceView {
    pub id: PolicyId,
    pub name: String,
    pub currentversionid: VersionId,
    /// The resolved current version; other versions are not carried.
    pub currentversion: Option<PolicyVersion>,
    /// Full-document view URL.
    pub url: String,
    pub policylink: Link,
    pub policymodal: ModalLink,
    /// Latest acceptance for the current version (existing users only).
    pub versionacceptance: Option<Acceptance>,
    pub versionagreed: bool,
    /// Set when the acceptance was recorded in another interface language.
    pub versionlangsagreed: Option<String>,
    /// Set when somebody else recorded the acceptance for the subject.
    pub versionbehalfsagreed: Option<String>,
}

/// Template-ready data for the agreement page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementPageData {
    pub pluginbaseurl: String,
    pub myurl: String,
    pub sesskey: String,
    /// Annotated policies in load order.
    pub policies: Vec<PolicyAcceptanceView>,
    pub privacyofficer: Option<String>,
    /// Profile link of the user being acted for, when not acting as self.
    pub behalfuser: Option<Link>,
}

/// Notice attached when the acceptance was recorded in another language.
pub const ACCEPTED_IN_OTHER_LANG: &str =
    "This policy version has been accepted in a different language.";

/// Notice attached when the acceptance was recorded by somebody else.
pub const ACCEPTED_ON_BEHALF: &str =
    "This policy version has been accepted on your behalf.";
