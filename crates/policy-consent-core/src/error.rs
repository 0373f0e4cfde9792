// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Error types.
//!
//! An unknown behalf user is not an error; the controller falls back to the
//! requester and logs a warning.

use thiserror::Error;

use crate::context::{Capability, CapabilityScope};

/// An acceptance record could not be turned into an event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("the 'policyversionid' value must be set")]
    MissingPolicyVersionId,

    #[error("the 'status' value must be set")]
    MissingStatus,

    #[error("the 'relateduserid' must be set")]
    MissingRelatedUser,

    #[error("stored event does not match its acceptance snapshot")]
    SnapshotMismatch,
}

/// Failures that abort an agreement-page request.
#[derive(Error, Debug)]
pub enum AgreementError {
    /// The requester lacks a capability the request needs.
    #[error("access denied: missing capability '{capability}' in {scope}")]
    AccessDenied {
        capability: Capability,
        scope: CapabilityScope,
    },

    #[error("event error: {0}")]
    Event(#[from] EventError),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}
