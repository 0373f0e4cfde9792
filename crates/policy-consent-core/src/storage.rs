// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Storage abstraction for the consent ledger.
//!
//! The [`Storage`] trait is the single interface between the ledger and any
//! persistence layer.  This crate ships [`InMemoryStorage`] for development
//! and testing.  Durable implementations live in downstream crates.
//!
//! # Implementing `Storage`
//!
//! ```rust,no_run
//! use policy_consent_core::event::{AcceptanceEvent, EventFilter};
//! use policy_consent_core::storage::Storage;
//! use policy_consent_core::types::{
//!     Acceptance, AcceptanceId, Policy, PolicyFilter, PolicyId, PolicyVersion, UserId,
//!     UserProfile, VersionId,
//! };
//!
//! struct MyStorage;
//!
//! impl Storage for MyStorage {
//!     fn list_policies(&self, _filter: &PolicyFilter) -> Vec<Policy> { Vec::new() }
//!     fn get_policy_version(&self, _policy: PolicyId, _version: VersionId) -> Option<PolicyVersion> { None }
//!     fn get_user(&self, _user: UserId) -> Option<UserProfile> { None }
//!     fn set_user_policy_agreed(&mut self, _user: UserId, _agreed: bool) {}
//!     fn get_user_acceptances(&self, _user: UserId) -> Vec<Acceptance> { Vec::new() }
//!     fn append_acceptance(&mut self, _acceptance: Acceptance) -> AcceptanceId { 1 }
//!     fn append_event(&mut self, _event: AcceptanceEvent) {}
//!     fn query_events(&self, _filter: &EventFilter) -> Vec<AcceptanceEvent> { Vec::new() }
//! }
//! ```

use hashbrown::HashMap;

use crate::event::{AcceptanceEvent, EventFilter};
use crate::types::{
    Acceptance, AcceptanceId, Policy, PolicyFilter, PolicyId, PolicyVersion, UserId, UserProfile,
    VersionId,
};

// ---------------------------------------------------------------------------
// Storage trait
// ---------------------------------------------------------------------------

/// Pluggable persistence interface for policies, users, and acceptances.
///
/// Acceptances are append-only: there is no update or delete.  Lookups
/// treat the row with the highest id for a `(user, version)` pair as the
/// current one.
///
/// Implementations MUST be `Send + Sync` so a ledger can be shared across
/// threads when wrapped in a lock.
pub trait Storage: Send + Sync {
    // ------------------------------------------------------------------
    // Policies
    // ------------------------------------------------------------------

    /// Policies matching `filter`, in catalogue order.
    fn list_policies(&self, filter: &PolicyFilter) -> Vec<Policy>;

    /// The version record, if it exists and belongs to `policy`.
    fn get_policy_version(&self, policy: PolicyId, version: VersionId) -> Option<PolicyVersion>;

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Resolve a user profile.  Deleted users resolve to `None`.
    fn get_user(&self, user: UserId) -> Option<UserProfile>;

    /// Persist the "agreed to every current policy" flag on a profile.
    /// Unknown users are ignored.
    fn set_user_policy_agreed(&mut self, user: UserId, agreed: bool);

    // ------------------------------------------------------------------
    // Acceptances
    // ------------------------------------------------------------------

    /// Every acceptance row about `user`, oldest first.
    fn get_user_acceptances(&self, user: UserId) -> Vec<Acceptance>;

    /// Append a row and return the id assigned to it.  The `id` carried
    /// by `acceptance` is ignored.
    fn append_acceptance(&mut self, acceptance: Acceptance) -> AcceptanceId;

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    fn append_event(&mut self, event: AcceptanceEvent);

    /// Events satisfying `filter`, oldest first.
    fn query_events(&self, filter: &EventFilter) -> Vec<AcceptanceEvent>;
}

// ---------------------------------------------------------------------------
// InMemoryStorage
// ---------------------------------------------------------------------------

/// A volatile [`Storage`] implementation backed by [`hashbrown::HashMap`].
///
/// All data lives in process memory and is lost when the store is dropped.
///
/// # Examples
///
/// ```rust
/// use policy_consent_core::storage::{InMemoryStorage, Storage};
/// use policy_consent_core::types::{Audience, PolicyFilter};
///
/// let mut store = InMemoryStorage::new();
/// store.add_policy(1, "Site policy", Audience::LoggedIn, Some(10));
/// store.add_policy(2, "Draft", Audience::All, None);
///
/// let current = store.list_policies(&PolicyFilter::loggedin_current());
/// assert_eq!(current.len(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryStorage {
    /// Catalogue order is insertion order.
    policies: Vec<Policy>,
    /// Key: version id → version.
    versions: HashMap<VersionId, PolicyVersion>,
    /// Key: user id → profile.
    users: HashMap<UserId, UserProfile>,
    /// Append-only acceptance history.
    acceptances: Vec<Acceptance>,
    /// Append-only event log.
    events: Vec<AcceptanceEvent>,
}

impl InMemoryStorage {
    /// Create a new, empty [`InMemoryStorage`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a policy, replacing any policy with the same id.
    ///
    /// When `current` is set, a version record with that id is created
    /// unless one already exists.
    pub fn add_policy(
        &mut self,
        id: PolicyId,
        name: &str,
        audience: crate::types::Audience,
        current: Option<VersionId>,
    ) {
        let policy = Policy {
            id,
            name: name.into(),
            audience,
            currentversionid: current,
        };
        match self.policies.iter_mut().find(|existing| existing.id == id) {
            Some(existing) => *existing = policy,
            None => self.policies.push(policy),
        }
        if let Some(version) = current {
            self.versions.entry(version).or_insert_with(|| PolicyVersion {
                id: version,
                policyid: id,
                summary: String::new(),
                content: String::new(),
            });
        }
    }

    /// Insert or replace a version record.
    pub fn put_version(&mut self, version: PolicyVersion) {
        self.versions.insert(version.id, version);
    }

    /// Insert or replace a user profile.
    pub fn put_user(&mut self, user: UserProfile) {
        self.users.insert(user.id, user);
    }
}

impl Storage for InMemoryStorage {
    fn list_policies(&self, filter: &PolicyFilter) -> Vec<Policy> {
        self.policies
            .iter()
            .filter(|policy| filter.matches(policy))
            .cloned()
            .collect()
    }

    fn get_policy_version(&self, policy: PolicyId, version: VersionId) -> Option<PolicyVersion> {
        self.versions
            .get(&version)
            .filter(|record| record.policyid == policy)
            .cloned()
    }

    fn get_user(&self, user: UserId) -> Option<UserProfile> {
        self.users.get(&user).filter(|profile| !profile.deleted).cloned()
    }

    fn set_user_policy_agreed(&mut self, user: UserId, agreed: bool) {
        if let Some(profile) = self.users.get_mut(&user) {
            profile.policyagreed = agreed;
        }
    }

    fn get_user_acceptances(&self, user: UserId) -> Vec<Acceptance> {
        self.acceptances
            .iter()
            .filter(|row| row.userid == user)
            .cloned()
            .collect()
    }

    fn append_acceptance(&mut self, mut acceptance: Acceptance) -> AcceptanceId {
        let id = self.acceptances.len() as AcceptanceId + 1;
        acceptance.id = id;
        self.acceptances.push(acceptance);
        id
    }

    fn append_event(&mut self, event: AcceptanceEvent) {
        self.events.push(event);
    }

    fn query_events(&self, filter: &EventFilter) -> Vec<AcceptanceEvent> {
        self.events
            .iter()
            .filter(|event| filter.matches(event))
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}
