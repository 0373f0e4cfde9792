// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Acceptance ledger.
//!
//! [`AcceptanceLedger`] is the only writer of acceptance rows.  It exposes:
//!
//! * [`accept_policies`](AcceptanceLedger::accept_policies): record acceptances
//! * [`revoke_acceptance`](AcceptanceLedger::revoke_acceptance): record a revocation
//! * lookups: [`get_user_acceptances`](AcceptanceLedger::get_user_acceptances),
//!   [`get_user_version_acceptance`](AcceptanceLedger::get_user_version_acceptance),
//!   [`is_user_version_accepted`](AcceptanceLedger::is_user_version_accepted)
//!
//! Every row written produces exactly one [`AcceptanceEvent`].  Rows are
//! appended, never updated; the newest row for a pair wins.  After each
//! write the subject's profile flag `policyagreed` is recomputed.

use tracing::{debug, info};

use crate::error::EventError;
use crate::event::{AcceptanceEvent, EventFilter};
use crate::storage::Storage;
use crate::types::{
    Acceptance, AcceptanceStatus, Policy, PolicyFilter, PolicyId, PolicyVersion, UserId, VersionId,
};

/// Records and answers questions about policy acceptances.
///
/// # Examples
///
/// ```rust
/// use policy_consent_core::{
///     ledger::AcceptanceLedger,
///     storage::InMemoryStorage,
///     types::Audience,
/// };
///
/// let mut store = InMemoryStorage::new();
/// store.add_policy(1, "Site policy", Audience::LoggedIn, Some(10));
/// let mut ledger = AcceptanceLedger::new(store);
///
/// assert!(!ledger.is_user_version_accepted(5, 10, None));
/// ledger.accept_policies(&[10], 5, 5, None, "en").unwrap();
/// assert!(ledger.is_user_version_accepted(5, 10, None));
/// ```
pub struct AcceptanceLedger<S: Storage> {
    storage: S,
}

impl<S: Storage> AcceptanceLedger<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn list_policies(&self, filter: &PolicyFilter) -> Vec<Policy> {
        self.storage.list_policies(filter)
    }

    pub fn get_policy_version(&self, policy: PolicyId, version: VersionId) -> Option<PolicyVersion> {
        self.storage.get_policy_version(policy, version)
    }

    /// All acceptance rows about `user`, oldest first.
    pub fn get_user_acceptances(&self, user: UserId) -> Vec<Acceptance> {
        self.storage.get_user_acceptances(user)
    }

    /// The most recent acceptance for `(user, version)`.
    ///
    /// Pass `acceptances` (as returned by [`get_user_acceptances`]) to
    /// avoid another storage round trip when looking up many versions.
    ///
    /// [`get_user_acceptances`]: AcceptanceLedger::get_user_acceptances
    pub fn get_user_version_acceptance(
        &self,
        user: UserId,
        version: VersionId,
        acceptances: Option<&[Acceptance]>,
    ) -> Option<Acceptance> {
        match acceptances {
            Some(rows) => latest_for(rows, user, version).cloned(),
            None => latest_for(&self.storage.get_user_acceptances(user), user, version).cloned(),
        }
    }

    /// Whether the latest acceptance for `(user, version)` is `Accepted`.
    pub fn is_user_version_accepted(
        &self,
        user: UserId,
        version: VersionId,
        acceptances: Option<&[Acceptance]>,
    ) -> bool {
        self.get_user_version_acceptance(user, version, acceptances)
            .map_or(false, |row| row.is_accepted())
    }

    /// Whether `user` currently accepts every current logged-in version.
    ///
    /// True when there is nothing to accept.
    pub fn has_accepted_all_current(&self, user: UserId) -> bool {
        let acceptances = self.storage.get_user_acceptances(user);
        self.storage
            .list_policies(&PolicyFilter::loggedin_current())
            .iter()
            .filter_map(|policy| policy.currentversionid)
            .all(|version| latest_for(&acceptances, user, version).map_or(false, |row| row.is_accepted()))
    }

    /// Recompute and persist the profile flag of `user`; returns the new value.
    pub fn update_policy_agreed(&mut self, user: UserId) -> bool {
        let agreed = self.has_accepted_all_current(user);
        self.storage.set_user_policy_agreed(user, agreed);
        debug!(user, agreed, "policy agreement flag updated");
        agreed
    }

    /// Record that `user` accepts each of `versions`.
    ///
    /// `actor` is who performs the action; it differs from `user` when
    /// accepting on somebody's behalf.  Versions the user already accepts
    /// are skipped, as are duplicates in `versions`.
    ///
    /// # Errors
    ///
    /// Returns [`EventError`] before anything is written when the rows
    /// would be invalid (for example `user` is the anonymous id).
    pub fn accept_policies(
        &mut self,
        versions: &[VersionId],
        user: UserId,
        actor: UserId,
        note: Option<&str>,
        lang: &str,
    ) -> Result<Vec<AcceptanceEvent>, EventError> {
        let existing = self.storage.get_user_acceptances(user);
        let mut pending: Vec<VersionId> = Vec::with_capacity(versions.len());
        for &version in versions {
            if pending.contains(&version) {
                continue;
            }
            if latest_for(&existing, user, version).map_or(false, |row| row.is_accepted()) {
                debug!(user, version, "version already accepted, skipping");
                continue;
            }
            pending.push(version);
        }

        let now = current_time_ms();
        let drafts: Vec<Acceptance> = pending
            .into_iter()
            .map(|version| Acceptance {
                id: 0,
                policyversionid: version,
                userid: user,
                status: Some(AcceptanceStatus::Accepted),
                lang: lang.into(),
                usermodified: actor,
                note: note.map(Into::into),
                timecreated_ms: now,
            })
            .collect();
        for draft in &drafts {
            AcceptanceEvent::create_from_record(draft, actor, now)?;
        }

        let mut events = Vec::with_capacity(drafts.len());
        for draft in drafts {
            events.push(self.write(draft, actor, now)?);
        }
        if !events.is_empty() {
            info!(user, actor, count = events.len(), "policy acceptances recorded");
            self.update_policy_agreed(user);
        }
        Ok(events)
    }

    /// Record that `user` no longer accepts `version`.
    ///
    /// Returns `Ok(None)` when the version is not currently accepted.
    pub fn revoke_acceptance(
        &mut self,
        version: VersionId,
        user: UserId,
        actor: UserId,
        note: Option<&str>,
    ) -> Result<Option<AcceptanceEvent>, EventError> {
        let current = match self.get_user_version_acceptance(user, version, None) {
            Some(row) if row.is_accepted() => row,
            _ => return Ok(None),
        };

        let now = current_time_ms();
        let draft = Acceptance {
            id: 0,
            policyversionid: version,
            userid: user,
            status: Some(AcceptanceStatus::Revoked),
            lang: current.lang,
            usermodified: actor,
            note: note.map(Into::into),
            timecreated_ms: now,
        };
        AcceptanceEvent::create_from_record(&draft, actor, now)?;
        let event = self.write(draft, actor, now)?;
        info!(user, actor, version, "policy acceptance revoked");
        self.update_policy_agreed(user);
        Ok(Some(event))
    }

    /// Recorded audit events matching `filter`.
    pub fn events(&self, filter: &EventFilter) -> Vec<AcceptanceEvent> {
        self.storage.query_events(filter)
    }

    /// Borrow the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Mutably borrow the underlying storage.
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn write(&mut self, mut row: Acceptance, actor: UserId, now: u64) -> Result<AcceptanceEvent, EventError> {
        row.id = self.storage.append_acceptance(row.clone());
        let event = AcceptanceEvent::create_from_record(&row, actor, now)?;
        self.storage.append_event(event.clone());
        Ok(event)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The newest row for `(user, version)` among `rows`.
fn latest_for(rows: &[Acceptance], user: UserId, version: VersionId) -> Option<&Acceptance> {
    rows.iter()
        .filter(|row| row.userid == user && row.policyversionid == version)
        .max_by_key(|row| row.id)
}

/// Return current Unix epoch milliseconds.
fn current_time_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use crate::types::{Audience, UserProfile};

    fn ledger() -> AcceptanceLedger<InMemoryStorage> {
        let mut store = InMemoryStorage::new();
        store.add_policy(1, "Site policy", Audience::LoggedIn, Some(10));
        store.add_policy(2, "Privacy", Audience::LoggedIn, Some(20));
        store.add_policy(3, "Guest notice", Audience::Guests, Some(30));
        store.put_user(UserProfile {
            id: 5,
            firstname: "Rui".into(),
            lastname: "Costa".into(),
            policyagreed: false,
            deleted: false,
        });
        AcceptanceLedger::new(store)
    }

    fn profile_agreed(ledger: &AcceptanceLedger<InMemoryStorage>, user: UserId) -> Option<bool> {
        ledger.storage().get_user(user).map(|profile| profile.policyagreed)
    }

    #[test]
    fn test_profile_flag_set_once_every_current_version_accepted() {
        let mut ledger = ledger();
        ledger.accept_policies(&[10], 5, 5, None, "en").unwrap();
        assert_eq!(profile_agreed(&ledger, 5), Some(false));

        ledger.accept_policies(&[20], 5, 5, None, "en").unwrap();
        assert!(ledger.has_accepted_all_current(5));
        assert_eq!(profile_agreed(&ledger, 5), Some(true));
    }

    #[test]
    fn test_profile_flag_cleared_by_revocation() {
        let mut ledger = ledger();
        ledger.accept_policies(&[10, 20], 5, 5, None, "en").unwrap();
        ledger.revoke_acceptance(20, 5, 5, None).unwrap();
        assert!(!ledger.has_accepted_all_current(5));
        assert_eq!(profile_agreed(&ledger, 5), Some(false));
    }

    #[test]
    fn test_accept_records_rows_and_events() {
        let mut ledger = ledger();
        let events = ledger.accept_policies(&[10, 20], 5, 5, None, "en").unwrap();
        assert_eq!(events.len(), 2);
        assert!(ledger.is_user_version_accepted(5, 10, None));
        assert!(ledger.is_user_version_accepted(5, 20, None));
        assert_eq!(ledger.events(&EventFilter::default()).len(), 2);
    }

    #[test]
    fn test_accept_skips_already_accepted_and_duplicates() {
        let mut ledger = ledger();
        ledger.accept_policies(&[10], 5, 5, None, "en").unwrap();
        let events = ledger.accept_policies(&[10, 20, 20], 5, 5, None, "en").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].other().policyversionid, 20);
        assert_eq!(ledger.get_user_acceptances(5).len(), 2);
    }

    #[test]
    fn test_accept_for_anonymous_writes_nothing() {
        let mut ledger = ledger();
        let err = ledger.accept_policies(&[10], 0, 0, None, "en").unwrap_err();
        assert_eq!(err, EventError::MissingRelatedUser);
        assert!(ledger.get_user_acceptances(0).is_empty());
    }

    #[test]
    fn test_on_behalf_acceptance_records_actor() {
        let mut ledger = ledger();
        let events = ledger.accept_policies(&[10], 8, 3, Some("guardian"), "fr").unwrap();
        assert_eq!(events[0].userid(), 3);
        assert_eq!(events[0].relateduserid(), 8);
        let row = ledger.get_user_version_acceptance(8, 10, None).unwrap();
        assert_eq!(row.usermodified, 3);
        assert_eq!(row.lang, "fr");
        assert_eq!(row.note.as_deref(), Some("guardian"));
    }

    #[test]
    fn test_latest_row_wins_after_revocation() {
        let mut ledger = ledger();
        ledger.accept_policies(&[10], 5, 5, None, "en").unwrap();
        let revoked = ledger.revoke_acceptance(10, 5, 5, None).unwrap();
        assert!(revoked.is_some());
        assert!(!ledger.is_user_version_accepted(5, 10, None));
        assert_eq!(ledger.get_user_acceptances(5).len(), 2);

        let rows = ledger.get_user_acceptances(5);
        let latest = ledger.get_user_version_acceptance(5, 10, Some(&rows)).unwrap();
        assert_eq!(latest.status, Some(AcceptanceStatus::Revoked));
    }

    #[test]
    fn test_revoke_without_acceptance_is_noop() {
        let mut ledger = ledger();
        assert!(ledger.revoke_acceptance(10, 5, 5, None).unwrap().is_none());
        assert!(ledger.events(&EventFilter::default()).is_empty());
    }

    #[test]
    fn test_reaccept_after_revocation() {
        let mut ledger = ledger();
        ledger.accept_policies(&[10], 5, 5, None, "en").unwrap();
        ledger.revoke_acceptance(10, 5, 5, None).unwrap();
        let events = ledger.accept_policies(&[10], 5, 5, None, "en").unwrap();
        assert_eq!(events.len(), 1);
        assert!(ledger.is_user_version_accepted(5, 10, None));
    }
}
