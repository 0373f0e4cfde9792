// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! The acceptance-created audit event.
//!
//! An [`AcceptanceEvent`] is built from a freshly written [`Acceptance`]
//! row, validated on construction, and never mutated afterwards.  It carries
//! a snapshot of the row exactly as it was when the event was created.
//! The controller only emits events; it never reads them back.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::EventError;
use crate::types::{Acceptance, AcceptanceId, AcceptanceStatus, UserId, VersionId};
use crate::urls::PluginUrls;

/// Table the event's `objectid` refers to.
pub const OBJECT_TABLE: &str = "tool_policy_acceptances";

/// Whether an object id is remapped when data is restored elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestoreMapping {
    Mapped,
    NotMapped,
}

/// Object-id mapping metadata of an event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObjectIdMapping {
    pub db: &'static str,
    pub restore: RestoreMapping,
}

/// Acceptance events are never remapped during restore.
pub const OBJECTID_MAPPING: ObjectIdMapping = ObjectIdMapping {
    db: "tool_policy",
    restore: RestoreMapping::NotMapped,
};

/// Kind of change an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crud {
    #[serde(rename = "c")]
    Create,
}

/// Educational level of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EduLevel {
    Other,
}

/// Event-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceEventOther {
    pub policyversionid: VersionId,
    pub note: Option<String>,
    pub status: AcceptanceStatus,
}

/// Immutable audit record of one create/accept/revoke action.
///
/// # Examples
///
/// ```rust
/// use policy_consent_core::event::AcceptanceEvent;
/// use policy_consent_core::types::{Acceptance, AcceptanceStatus};
///
/// let record = Acceptance {
///     id: 1,
///     policyversionid: 10,
///     userid: 5,
///     status: Some(AcceptanceStatus::Accepted),
///     lang: "en".into(),
///     usermodified: 5,
///     note: None,
///     timecreated_ms: 0,
/// };
/// let event = AcceptanceEvent::create_from_record(&record, 5, 0).unwrap();
/// assert!(event.description().contains("added consent to"));
/// ```
///
/// Deserialising re-runs [`create_from_record`](Self::create_from_record)
/// on the stored snapshot, so a stored event that is incomplete or disagrees
/// with its snapshot is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredAcceptanceEvent")]
pub struct AcceptanceEvent {
    objecttable: String,
    crud: Crud,
    edulevel: EduLevel,
    objectid: AcceptanceId,
    /// Who performed the action.
    userid: UserId,
    /// Whom the acceptance is about.
    relateduserid: UserId,
    /// Instance id of the user context the event is raised in.
    contextinstanceid: UserId,
    other: AcceptanceEventOther,
    timecreated_ms: u64,
    snapshot: Acceptance,
}

impl AcceptanceEvent {
    /// Build a validated event from an acceptance row.
    ///
    /// `actor` is the user performing the action; the row's `userid`
    /// becomes the related user.
    ///
    /// # Errors
    ///
    /// Fails when the row lacks a version id, a status, or a subject.
    pub fn create_from_record(
        record: &Acceptance,
        actor: UserId,
        timecreated_ms: u64,
    ) -> Result<Self, EventError> {
        if record.policyversionid == 0 {
            return Err(EventError::MissingPolicyVersionId);
        }
        let status = record.status.ok_or(EventError::MissingStatus)?;
        if record.userid == 0 {
            return Err(EventError::MissingRelatedUser);
        }

        Ok(Self {
            objecttable: OBJECT_TABLE.into(),
            crud: Crud::Create,
            edulevel: EduLevel::Other,
            objectid: record.id,
            userid: actor,
            relateduserid: record.userid,
            contextinstanceid: record.userid,
            other: AcceptanceEventOther {
                policyversionid: record.policyversionid,
                note: record.note.clone(),
                status,
            },
            timecreated_ms,
            snapshot: record.clone(),
        })
    }

    /// Display name of this event type.
    pub fn name() -> &'static str {
        "User consent recorded"
    }

    /// Human-readable account of what happened.
    pub fn description(&self) -> String {
        let action = match self.other.status {
            AcceptanceStatus::Accepted => "added consent to",
            AcceptanceStatus::Revoked => "revoked consent to",
            AcceptanceStatus::Empty => "created an empty consent record for",
        };
        format!(
            "The user with id '{}' {} the policy with revision {} for the user with id '{}'",
            self.userid, action, self.other.policyversionid, self.relateduserid
        )
    }

    /// Deep link to the acceptance details page.
    pub fn url(&self, urls: &PluginUrls) -> Result<Url, url::ParseError> {
        urls.acceptance(self.relateduserid, self.other.policyversionid)
    }

    /// Payload fields never need remapping because the event is not backed up.
    pub fn other_mapping() -> Option<ObjectIdMapping> {
        None
    }

    pub fn objecttable(&self) -> &str {
        &self.objecttable
    }

    pub fn crud(&self) -> Crud {
        self.crud
    }

    pub fn edulevel(&self) -> EduLevel {
        self.edulevel
    }

    pub fn objectid(&self) -> AcceptanceId {
        self.objectid
    }

    pub fn userid(&self) -> UserId {
        self.userid
    }

    pub fn relateduserid(&self) -> UserId {
        self.relateduserid
    }

    pub fn contextinstanceid(&self) -> UserId {
        self.contextinstanceid
    }

    pub fn other(&self) -> &AcceptanceEventOther {
        &self.other
    }

    pub fn timecreated_ms(&self) -> u64 {
        self.timecreated_ms
    }

    /// The acceptance row as it was when the event was created.
    pub fn snapshot(&self) -> &Acceptance {
        &self.snapshot
    }
}

/// Wire form of [`AcceptanceEvent`], checked before it becomes one.
#[derive(Deserialize)]
struct StoredAcceptanceEvent {
    objecttable: String,
    crud: Crud,
    edulevel: EduLevel,
    objectid: AcceptanceId,
    userid: UserId,
    relateduserid: UserId,
    contextinstanceid: UserId,
    other: AcceptanceEventOther,
    timecreated_ms: u64,
    snapshot: Acceptance,
}

impl TryFrom<StoredAcceptanceEvent> for AcceptanceEvent {
    type Error = EventError;

    fn try_from(stored: StoredAcceptanceEvent) -> Result<Self, Self::Error> {
        let event = Self::create_from_record(&stored.snapshot, stored.userid, stored.timecreated_ms)?;
        let consistent = stored.objecttable == event.objecttable
            && stored.crud == event.crud
            && stored.edulevel == event.edulevel
            && stored.objectid == event.objectid
            && stored.relateduserid == event.relateduserid
            && stored.contextinstanceid == event.contextinstanceid
            && stored.other == event.other;
        if !consistent {
            return Err(EventError::SnapshotMismatch);
        }
        Ok(event)
    }
}

/// Filter used to narrow [`Storage::query_events`](crate::storage::Storage::query_events).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// If set, only return events about this user.
    pub relateduserid: Option<UserId>,
    /// If set, only return events for this version.
    pub policyversionid: Option<VersionId>,
    /// If set, limit the number of returned events.
    pub limit: Option<usize>,
}

impl EventFilter {
    pub fn matches(&self, event: &AcceptanceEvent) -> bool {
        if let Some(user) = self.relateduserid {
            if event.relateduserid != user {
                return false;
            }
        }
        if let Some(version) = self.policyversionid {
            if event.other.policyversionid != version {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(status: Option<AcceptanceStatus>) -> Acceptance {
        Acceptance {
            id: 3,
            policyversionid: 10,
            userid: 5,
            status,
            lang: "en".into(),
            usermodified: 7,
            note: Some("signed on paper".into()),
            timecreated_ms: 100,
        }
    }

    #[test]
    fn test_descriptions_follow_status() {
        let accepted = AcceptanceEvent::create_from_record(&record(Some(AcceptanceStatus::Accepted)), 7, 1).unwrap();
        let revoked = AcceptanceEvent::create_from_record(&record(Some(AcceptanceStatus::Revoked)), 7, 1).unwrap();
        let empty = AcceptanceEvent::create_from_record(&record(Some(AcceptanceStatus::Empty)), 7, 1).unwrap();

        assert_eq!(
            accepted.description(),
            "The user with id '7' added consent to the policy with revision 10 for the user with id '5'"
        );
        assert!(revoked.description().contains("revoked consent to"));
        assert!(empty.description().contains("created an empty consent record for"));
    }

    #[test]
    fn test_missing_status_rejected() {
        let err = AcceptanceEvent::create_from_record(&record(None), 7, 1).unwrap_err();
        assert_eq!(err, EventError::MissingStatus);
    }

    #[test]
    fn test_missing_version_rejected() {
        let mut row = record(Some(AcceptanceStatus::Accepted));
        row.policyversionid = 0;
        let err = AcceptanceEvent::create_from_record(&row, 7, 1).unwrap_err();
        assert_eq!(err, EventError::MissingPolicyVersionId);
    }

    #[test]
    fn test_missing_related_user_rejected() {
        let mut row = record(Some(AcceptanceStatus::Accepted));
        row.userid = 0;
        let err = AcceptanceEvent::create_from_record(&row, 7, 1).unwrap_err();
        assert_eq!(err, EventError::MissingRelatedUser);
    }

    #[test]
    fn test_snapshot_is_detached_from_source() {
        let mut row = record(Some(AcceptanceStatus::Accepted));
        let event = AcceptanceEvent::create_from_record(&row, 7, 1).unwrap();
        row.status = Some(AcceptanceStatus::Revoked);
        row.note = None;
        assert_eq!(event.snapshot().status, Some(AcceptanceStatus::Accepted));
        assert_eq!(event.snapshot().note.as_deref(), Some("signed on paper"));
    }

    #[test]
    fn test_event_metadata() {
        let event = AcceptanceEvent::create_from_record(&record(Some(AcceptanceStatus::Accepted)), 7, 1).unwrap();
        assert_eq!(event.objecttable(), "tool_policy_acceptances");
        assert_eq!(event.crud(), Crud::Create);
        assert_eq!(event.objectid(), 3);
        assert_eq!(event.contextinstanceid(), 5);
        assert_eq!(OBJECTID_MAPPING.restore, RestoreMapping::NotMapped);
        assert!(AcceptanceEvent::other_mapping().is_none());
    }

    #[test]
    fn test_event_url_points_at_acceptance_page() {
        let urls = PluginUrls::from_config(&crate::config::Config::default()).unwrap();
        let event = AcceptanceEvent::create_from_record(&record(Some(AcceptanceStatus::Accepted)), 7, 1).unwrap();
        assert_eq!(
            event.url(&urls).unwrap().as_str(),
            "http://localhost/admin/tool/policy/acceptance.php?userid=5&versionid=10"
        );
    }

    fn stored_json() -> serde_json::Value {
        let event = AcceptanceEvent::create_from_record(&record(Some(AcceptanceStatus::Accepted)), 7, 1).unwrap();
        serde_json::to_value(&event).unwrap()
    }

    #[test]
    fn test_stored_event_loads_back() {
        let event = AcceptanceEvent::create_from_record(&record(Some(AcceptanceStatus::Revoked)), 7, 1).unwrap();
        let json = serde_json::to_string(&event).unwrap();
        let loaded: AcceptanceEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, event);
    }

    #[test]
    fn test_stored_event_without_status_rejected() {
        let mut json = stored_json();
        json["snapshot"]["status"] = serde_json::Value::Null;
        let err = serde_json::from_value::<AcceptanceEvent>(json).unwrap_err();
        assert!(err.to_string().contains("'status'"));
    }

    #[test]
    fn test_stored_event_with_zero_version_rejected() {
        let mut json = stored_json();
        json["snapshot"]["policyversionid"] = 0.into();
        json["other"]["policyversionid"] = 0.into();
        assert!(serde_json::from_value::<AcceptanceEvent>(json).is_err());
    }

    #[test]
    fn test_stored_event_disagreeing_with_snapshot_rejected() {
        let mut json = stored_json();
        json["relateduserid"] = 99.into();
        let err = serde_json::from_value::<AcceptanceEvent>(json).unwrap_err();
        assert!(err.to_string().contains("does not match its acceptance snapshot"));
    }

    proptest! {
        /// Any row missing a required field is rejected, never coerced.
        #[test]
        fn incomplete_records_never_validate(
            version in prop_oneof![Just(0u64), 1u64..1000],
            user in prop_oneof![Just(0u64), 1u64..1000],
            status in prop_oneof![
                Just(None),
                Just(Some(AcceptanceStatus::Accepted)),
                Just(Some(AcceptanceStatus::Revoked)),
                Just(Some(AcceptanceStatus::Empty)),
            ],
        ) {
            let row = Acceptance {
                id: 1,
                policyversionid: version,
                userid: user,
                status,
                lang: "en".into(),
                usermodified: user,
                note: None,
                timecreated_ms: 0,
            };
            let complete = version != 0 && user != 0 && status.is_some();
            prop_assert_eq!(AcceptanceEvent::create_from_record(&row, 1, 0).is_ok(), complete);
        }
    }
}
