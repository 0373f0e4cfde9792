// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! File-based JSON storage backend.
//!
//! [`FileStorage`] persists the policy catalogue, user profiles, acceptance
//! history, and audit events to a single JSON file on disk.  Every append
//! flushes the file atomically (write-rename) so that a crash mid-write does
//! not corrupt existing data.
//!
//! ## Layout
//!
//! The JSON file has the shape:
//!
//! ```json
//! {
//!   "policies":    [ Policy, ... ],
//!   "versions":    { "<version_id>": PolicyVersion, ... },
//!   "users":       { "<user_id>":    UserProfile,   ... },
//!   "acceptances": [ Acceptance, ... ],
//!   "events":      [ AcceptanceEvent, ... ]
//! }
//! ```
//!
//! ## Caveats
//!
//! * [`FileStorage`] holds the full state in memory and rewrites the whole
//!   file on every append.  It is not intended for large sites.
//! * Concurrent access from multiple processes is not supported.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use policy_consent_core::event::{AcceptanceEvent, EventFilter};
use policy_consent_core::storage::Storage;
use policy_consent_core::types::{
    Acceptance, AcceptanceId, Policy, PolicyFilter, PolicyId, PolicyVersion, UserId, UserProfile,
    VersionId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Snapshot of all stored state, serialised to / deserialised from disk.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct StorageSnapshot {
    policies:    Vec<Policy>,
    versions:    HashMap<VersionId, PolicyVersion>,
    users:       HashMap<UserId, UserProfile>,
    acceptances: Vec<Acceptance>,
    events:      Vec<AcceptanceEvent>,
}

/// A file-backed [`Storage`] implementation that persists state as JSON.
///
/// # Examples
///
/// ```rust,no_run
/// use policy_consent_std::storage::file::FileStorage;
/// use policy_consent_core::types::{Audience, Policy};
///
/// let mut storage = FileStorage::open("/tmp/policy-consent.json")
///     .expect("could not open storage");
///
/// storage.put_policy(Policy {
///     id: 1,
///     name: "Site policy".into(),
///     audience: Audience::LoggedIn,
///     currentversionid: Some(10),
/// }).expect("flush failed");
/// ```
pub struct FileStorage {
    path: PathBuf,
    data: StorageSnapshot,
}

impl FileStorage {
    /// Open an existing JSON storage file, or start empty if the path does
    /// not exist.  Nothing is written until the first mutation.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] if the file exists but cannot be read or if
    /// the JSON is malformed.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw).map_err(|error| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("policy storage JSON parse error: {}", error),
                )
            })?
        } else {
            StorageSnapshot::default()
        };
        debug!(path = %path.display(), acceptances = data.acceptances.len(), "opened policy storage");

        Ok(Self { path, data })
    }

    /// Flush the current in-memory state to disk using an atomic write-rename.
    ///
    /// The file is written to `<path>.tmp` first, then renamed over the
    /// target, so a crash during the write never leaves a partial file.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] if serialisation fails or the file cannot be
    /// written or renamed.
    pub fn flush(&self) -> io::Result<()> {
        let json = serde_json::to_string_pretty(&self.data).map_err(|error| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("policy storage serialisation error: {}", error),
            )
        })?;

        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Insert or replace a policy (matched by id) and flush.
    pub fn put_policy(&mut self, policy: Policy) -> io::Result<()> {
        match self.data.policies.iter_mut().find(|existing| existing.id == policy.id) {
            Some(existing) => *existing = policy,
            None => self.data.policies.push(policy),
        }
        self.flush()
    }

    /// Insert or replace a version record and flush.
    pub fn put_version(&mut self, version: PolicyVersion) -> io::Result<()> {
        self.data.versions.insert(version.id, version);
        self.flush()
    }

    /// Insert or replace a user profile and flush.
    pub fn put_user(&mut self, user: UserProfile) -> io::Result<()> {
        self.data.users.insert(user.id, user);
        self.flush()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Trait appends cannot return an error; a failed flush is logged and
    /// retried on the next mutation.  Callers needing durability call
    /// [`flush`](Self::flush) themselves.
    fn flush_logged(&self) {
        if let Err(error) = self.flush() {
            warn!(path = %self.path.display(), %error, "policy storage flush failed");
        }
    }
}

impl Storage for FileStorage {
    fn list_policies(&self, filter: &PolicyFilter) -> Vec<Policy> {
        self.data
            .policies
            .iter()
            .filter(|policy| filter.matches(policy))
            .cloned()
            .collect()
    }

    fn get_policy_version(&self, policy: PolicyId, version: VersionId) -> Option<PolicyVersion> {
        self.data
            .versions
            .get(&version)
            .filter(|record| record.policyid == policy)
            .cloned()
    }

    fn get_user(&self, user: UserId) -> Option<UserProfile> {
        self.data.users.get(&user).filter(|profile| !profile.deleted).cloned()
    }

    fn set_user_policy_agreed(&mut self, user: UserId, agreed: bool) {
        if let Some(profile) = self.data.users.get_mut(&user) {
            if profile.policyagreed != agreed {
                profile.policyagreed = agreed;
                self.flush_logged();
            }
        }
    }

    fn get_user_acceptances(&self, user: UserId) -> Vec<Acceptance> {
        self.data
            .acceptances
            .iter()
            .filter(|row| row.userid == user)
            .cloned()
            .collect()
    }

    fn append_acceptance(&mut self, mut acceptance: Acceptance) -> AcceptanceId {
        let id = self
            .data
            .acceptances
            .iter()
            .map(|row| row.id)
            .max()
            .unwrap_or(0)
            + 1;
        acceptance.id = id;
        self.data.acceptances.push(acceptance);
        self.flush_logged();
        id
    }

    fn append_event(&mut self, event: AcceptanceEvent) {
        self.data.events.push(event);
        self.flush_logged();
    }

    fn query_events(&self, filter: &EventFilter) -> Vec<AcceptanceEvent> {
        self.data
            .events
            .iter()
            .filter(|event| filter.matches(event))
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}
