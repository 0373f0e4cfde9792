// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Request-scoped context and the capability port.
//!
//! Everything the controller would otherwise read from ambient globals
//! (who is asking, which language is active, the session, permission
//! checks) is passed in explicitly through a [`RequestContext`].

use core::fmt;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::error::AgreementError;
use crate::session::PolicySession;
use crate::types::{UserId, ANONYMOUS_USER_ID};

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Permissions consulted by the agreement page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Accept policies for oneself.
    Accept,
    /// Accept policies on behalf of another user.
    AcceptBehalf,
    /// See other users' full names.
    ViewFullNames,
}

impl Capability {
    /// Stable capability name as stored in role definitions.
    pub fn name(self) -> &'static str {
        match self {
            Capability::Accept => "tool/policy:accept",
            Capability::AcceptBehalf => "tool/policy:acceptbehalf",
            Capability::ViewFullNames => "moodle/site:viewfullnames",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a capability is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityScope {
    System,
    /// The personal context of one user.
    User(UserId),
}

impl fmt::Display for CapabilityScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityScope::System => write!(f, "system context"),
            CapabilityScope::User(id) => write!(f, "user context {id}"),
        }
    }
}

/// Permission-check port implemented by the hosting platform.
pub trait CapabilityChecker: Send + Sync {
    fn has_capability(&self, user: UserId, capability: Capability, scope: CapabilityScope) -> bool;

    /// Fail with [`AgreementError::AccessDenied`] when the capability is absent.
    fn require_capability(
        &self,
        user: UserId,
        capability: Capability,
        scope: CapabilityScope,
    ) -> Result<(), AgreementError> {
        if self.has_capability(user, capability, scope) {
            Ok(())
        } else {
            Err(AgreementError::AccessDenied { capability, scope })
        }
    }
}

/// An explicit grant table, handy for tests and small deployments.
///
/// # Examples
///
/// ```rust
/// use policy_consent_core::context::{
///     Capability, CapabilityChecker, CapabilityScope, GrantedCapabilities,
/// };
///
/// let grants = GrantedCapabilities::new()
///     .grant(5, Capability::Accept, CapabilityScope::System);
/// assert!(grants.has_capability(5, Capability::Accept, CapabilityScope::System));
/// assert!(!grants.has_capability(5, Capability::AcceptBehalf, CapabilityScope::User(9)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct GrantedCapabilities {
    grants: HashSet<(UserId, Capability, CapabilityScope)>,
}

impl GrantedCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, user: UserId, capability: Capability, scope: CapabilityScope) -> Self {
        self.grants.insert((user, capability, scope));
        self
    }
}

impl CapabilityChecker for GrantedCapabilities {
    fn has_capability(&self, user: UserId, capability: Capability, scope: CapabilityScope) -> bool {
        self.grants.contains(&(user, capability, scope))
    }
}

// ---------------------------------------------------------------------------
// Request context
// ---------------------------------------------------------------------------

/// Identity of whoever issued the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    /// `0` while the visitor is still signing up.
    pub id: UserId,
    pub guest: bool,
    pub site_admin: bool,
    /// Persisted "agreed to every current policy" flag of the requester.
    pub policy_agreed: bool,
}

impl Requester {
    /// A visitor without an account.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A regular authenticated user.
    pub fn user(id: UserId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.id != ANONYMOUS_USER_ID
    }
}

/// Everything one request contributes to the agreement controller.
pub struct RequestContext<'a> {
    pub requester: Requester,
    /// Interface language active for this request.
    pub current_lang: String,
    pub session: &'a mut PolicySession,
    pub capabilities: &'a dyn CapabilityChecker,
    /// Replay-protection token sent with the form, if any.
    pub submitted_sesskey: Option<String>,
}

impl<'a> RequestContext<'a> {
    pub fn new(
        requester: Requester,
        current_lang: impl Into<String>,
        session: &'a mut PolicySession,
        capabilities: &'a dyn CapabilityChecker,
    ) -> Self {
        Self {
            requester,
            current_lang: current_lang.into(),
            session,
            capabilities,
            submitted_sesskey: None,
        }
    }

    /// Attach the token submitted with the form.
    pub fn with_sesskey(mut self, sesskey: impl Into<String>) -> Self {
        self.submitted_sesskey = Some(sesskey.into());
        self
    }

    /// Whether the submitted token is valid for this session.
    pub fn confirm_sesskey(&self) -> bool {
        self.session.confirm_sesskey(self.submitted_sesskey.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_capability_denies_with_details() {
        let grants = GrantedCapabilities::new();
        let err = grants
            .require_capability(3, Capability::AcceptBehalf, CapabilityScope::User(4))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("tool/policy:acceptbehalf"));
        assert!(message.contains("user context 4"));
    }

    #[test]
    fn test_context_sesskey_confirmation() {
        let mut session = PolicySession::new("tok");
        let grants = GrantedCapabilities::new();
        let ctx = RequestContext::new(Requester::user(2), "en", &mut session, &grants)
            .with_sesskey("tok");
        assert!(ctx.confirm_sesskey());
    }

    #[test]
    fn test_anonymous_requester_is_not_authenticated() {
        assert!(!Requester::anonymous().is_authenticated());
        assert!(Requester::user(1).is_authenticated());
    }
}
