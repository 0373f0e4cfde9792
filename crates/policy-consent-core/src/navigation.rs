// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Guided tour through pending policy documents.
//!
//! Before the agreement form is shown, every current policy the subject has
//! neither accepted nor already seen in this session is displayed on its
//! own, one request at a time.  Progress lives in the session
//! ([`PolicySession::viewed_policies`]); there is no server-side cursor.
//!
//! Documents are visited in ascending policy id order.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::session::PolicySession;
use crate::types::{Acceptance, CurrentPolicy, UserId, VersionId, ANONYMOUS_USER_ID};

/// Where the request goes instead of rendering the agreement form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Leave the policy pages for the previously requested destination.
    Previous(Url),
    /// Back to the agreement page.
    Index(Url),
    /// Show a single policy document.
    ShowPolicy { url: Url, step: TourStep },
}

impl Navigation {
    pub fn url(&self) -> &Url {
        match self {
            Navigation::Previous(url) | Navigation::Index(url) => url,
            Navigation::ShowPolicy { url, .. } => url,
        }
    }
}

/// One stop of the tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourStep {
    pub version_id: VersionId,
    /// Current versions displayed so far in this session, this one included.
    pub num_policy: usize,
    /// Number of current policies.
    pub total_policies: usize,
}

/// Current versions `subject` has not accepted, in ascending policy id order.
///
/// For the anonymous subject nothing can have been accepted yet, so every
/// current version is returned.
pub fn unaccepted_versions(
    policies: &[CurrentPolicy],
    subject: UserId,
    acceptances: &[Acceptance],
) -> Vec<VersionId> {
    let mut ordered: Vec<&CurrentPolicy> = policies.iter().collect();
    ordered.sort_by_key(|policy| policy.id);
    ordered
        .into_iter()
        .filter(|policy| subject == ANONYMOUS_USER_ID || !is_accepted(acceptances, subject, policy.currentversionid))
        .map(|policy| policy.currentversionid)
        .collect()
}

/// Unaccepted versions not yet displayed in this session.
///
/// Pure: calling it twice with the same inputs yields the same list.
///
/// # Examples
///
/// ```rust
/// use policy_consent_core::navigation::pending_versions;
/// use policy_consent_core::types::CurrentPolicy;
///
/// let policies = vec![
///     CurrentPolicy { id: 2, name: "Privacy".into(), currentversionid: 20 },
///     CurrentPolicy { id: 1, name: "Site".into(), currentversionid: 10 },
/// ];
/// assert_eq!(pending_versions(&policies, 0, &[], &[10]), vec![20]);
/// assert_eq!(pending_versions(&policies, 0, &[], &[]), vec![10, 20]);
/// ```
pub fn pending_versions(
    policies: &[CurrentPolicy],
    subject: UserId,
    acceptances: &[Acceptance],
    viewed: &[VersionId],
) -> Vec<VersionId> {
    unaccepted_versions(policies, subject, acceptances)
        .into_iter()
        .filter(|version| !viewed.contains(version))
        .collect()
}

/// Pick the next document to display and record it as viewed.
///
/// Returns `None` once every unaccepted document has been shown.
pub fn next_tour_step(
    policies: &[CurrentPolicy],
    subject: UserId,
    acceptances: &[Acceptance],
    session: &mut PolicySession,
) -> Option<TourStep> {
    let pending = pending_versions(policies, subject, acceptances, session.viewed_policies());
    let version_id = *pending.first()?;
    session.mark_viewed(version_id);

    let num_policy = policies
        .iter()
        .filter(|policy| session.has_viewed(policy.currentversionid))
        .count();
    Some(TourStep {
        version_id,
        num_policy,
        total_policies: policies.len(),
    })
}

fn is_accepted(rows: &[Acceptance], user: UserId, version: VersionId) -> bool {
    rows.iter()
        .filter(|row| row.userid == user && row.policyversionid == version)
        .max_by_key(|row| row.id)
        .map_or(false, |row| row.is_accepted())
}
