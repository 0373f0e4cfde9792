// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Async agreement controller backed by Tokio.
//!
//! This module is only compiled when the `async` feature flag is enabled:
//!
//! ```toml
//! [dependencies]
//! policy-consent-core = { version = "0.1", features = ["async"] }
//! ```
//!
//! # Design
//!
//! [`AsyncAgreementController`] wraps an [`AgreementController`] in a
//! [`tokio::sync::Mutex`].  Every request runs the whole pipeline while
//! holding the lock, so two submissions for the same subject cannot both
//! observe a version as "not yet accepted" and write it twice.
//!
//! # Example
//!
//! ```rust,no_run
//! use policy_consent_core::{
//!     async_controller::AsyncAgreementController,
//!     config::Config,
//!     context::{Capability, CapabilityScope, GrantedCapabilities, RequestContext, Requester},
//!     controller::AgreementRequest,
//!     session::PolicySession,
//!     storage::InMemoryStorage,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let controller = AsyncAgreementController::new(Config::default(), InMemoryStorage::new()).unwrap();
//!     let grants = GrantedCapabilities::new().grant(5, Capability::Accept, CapabilityScope::System);
//!     let mut session = PolicySession::new("sk");
//!     let mut ctx = RequestContext::new(Requester::user(5), "en", &mut session, &grants);
//!     let outcome = controller.handle(&mut ctx, &AgreementRequest::default()).await;
//!     assert!(outcome.is_ok());
//! }
//! ```

#![cfg(feature = "async")]

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::context::RequestContext;
use crate::controller::{AgreementController, AgreementOutcome, AgreementRequest};
use crate::error::AgreementError;
use crate::storage::Storage;
use crate::types::{Acceptance, UserId, VersionId};

/// Cloneable handle to a shared, lock-protected controller.
pub struct AsyncAgreementController<S: Storage> {
    inner: Arc<Mutex<AgreementController<S>>>,
}

impl<S: Storage> Clone for AsyncAgreementController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Storage> AsyncAgreementController<S> {
    /// Construct a new [`AsyncAgreementController`].
    pub fn new(config: Config, storage: S) -> Result<Self, url::ParseError> {
        Ok(Self::from_controller(AgreementController::new(config, storage)?))
    }

    pub fn from_controller(controller: AgreementController<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    /// Process one agreement-page request under the controller lock.
    pub async fn handle(
        &self,
        ctx: &mut RequestContext<'_>,
        request: &AgreementRequest,
    ) -> Result<AgreementOutcome, AgreementError> {
        let mut controller = self.inner.lock().await;
        controller.handle(ctx, request)
    }

    /// Versions `subject` still has to read, given what the session has shown.
    pub async fn pending_versions(&self, subject: UserId, viewed: &[VersionId]) -> Vec<VersionId> {
        let controller = self.inner.lock().await;
        controller.pending_versions(subject, viewed)
    }

    /// All acceptance rows about `user`.
    pub async fn user_acceptances(&self, user: UserId) -> Vec<Acceptance> {
        let controller = self.inner.lock().await;
        controller.ledger().get_user_acceptances(user)
    }
}
