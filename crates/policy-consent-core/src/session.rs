// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Per-session consent state.
//!
//! A [`PolicySession`] lives as long as the visitor's session and is
//! mutated incrementally across requests: each policy document shown
//! during the guided tour is appended to `viewed_policies`, and the signup
//! flow stores its "agreed to everything" verdict in `user_policy_agreed`.
//! Nothing here is shared between sessions.

use serde::{Deserialize, Serialize};

use crate::types::VersionId;

/// Consent-related values kept in the visitor's session.
///
/// # Examples
///
/// ```rust
/// use policy_consent_core::session::PolicySession;
///
/// let mut session = PolicySession::new("k3y");
/// assert!(session.confirm_sesskey(Some("k3y")));
/// assert!(!session.confirm_sesskey(None));
///
/// session.mark_viewed(30);
/// session.mark_viewed(30);
/// assert_eq!(session.viewed_policies(), &[30]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySession {
    /// Replay-protection token issued for this session.
    sesskey: String,
    /// Version ids already displayed during this session, in display order.
    viewed_policies: Vec<VersionId>,
    /// Signup flow only: every current policy was ticked.
    user_policy_agreed: bool,
    /// Where the visitor was heading before being sent to the policies.
    wants_url: Option<String>,
}

impl PolicySession {
    /// Create a session around an already issued `sesskey`.
    pub fn new(sesskey: impl Into<String>) -> Self {
        Self {
            sesskey: sesskey.into(),
            ..Self::default()
        }
    }

    pub fn sesskey(&self) -> &str {
        &self.sesskey
    }

    /// Whether `submitted` matches the session token.  An empty session
    /// token never validates.
    pub fn confirm_sesskey(&self, submitted: Option<&str>) -> bool {
        match submitted {
            Some(token) => !self.sesskey.is_empty() && token == self.sesskey,
            None => false,
        }
    }

    pub fn viewed_policies(&self) -> &[VersionId] {
        &self.viewed_policies
    }

    pub fn has_viewed(&self, version_id: VersionId) -> bool {
        self.viewed_policies.contains(&version_id)
    }

    /// Record that `version_id` has been shown.  Repeated calls are no-ops.
    pub fn mark_viewed(&mut self, version_id: VersionId) {
        if !self.has_viewed(version_id) {
            self.viewed_policies.push(version_id);
        }
    }

    pub fn user_policy_agreed(&self) -> bool {
        self.user_policy_agreed
    }

    pub fn set_user_policy_agreed(&mut self, agreed: bool) {
        self.user_policy_agreed = agreed;
    }

    pub fn wants_url(&self) -> Option<&str> {
        self.wants_url.as_deref()
    }

    pub fn set_wants_url(&mut self, url: impl Into<String>) {
        self.wants_url = Some(url.into());
    }

    /// Remove and return the pending destination.
    pub fn take_wants_url(&mut self) -> Option<String> {
        self.wants_url.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sesskey_never_confirms() {
        let session = PolicySession::default();
        assert!(!session.confirm_sesskey(Some("")));
    }

    #[test]
    fn test_wrong_sesskey_rejected() {
        let session = PolicySession::new("abc");
        assert!(!session.confirm_sesskey(Some("abd")));
    }

    #[test]
    fn test_take_wants_url_consumes() {
        let mut session = PolicySession::new("abc");
        session.set_wants_url("http://localhost/course/view.php?id=2");
        assert_eq!(
            session.take_wants_url().as_deref(),
            Some("http://localhost/course/view.php?id=2")
        );
        assert!(session.wants_url().is_none());
    }

    #[test]
    fn test_session_round_trips_through_json() {
        let mut session = PolicySession::new("abc");
        session.mark_viewed(10);
        session.set_user_policy_agreed(true);
        let json = serde_json::to_string(&session).expect("serialise");
        let back: PolicySession = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(back, session);
    }
}
