// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! # policy-consent-core
//!
//! Site policy agreement: the acceptance ledger, its audit events, and the
//! controller behind the "agree to policies" page.
//!
//! ## Architecture
//!
//! ```text
//! AgreementController<S: Storage>
//!   ├── AcceptanceLedger<S>    record / revoke / query acceptances
//!   │     └── AcceptanceEvent   one audit event per written row
//!   ├── navigation             guided tour through unread policies
//!   └── PluginUrls             every URL the page links or redirects to
//!
//! RequestContext
//!   ├── Requester              who is asking
//!   ├── PolicySession          sesskey, viewed policies, signup agreement
//!   └── dyn CapabilityChecker   host permission checks
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use policy_consent_core::{
//!     config::Config,
//!     context::{Capability, CapabilityScope, GrantedCapabilities, RequestContext, Requester},
//!     controller::{AgreementController, AgreementOutcome, AgreementRequest},
//!     session::PolicySession,
//!     storage::InMemoryStorage,
//!     types::Audience,
//! };
//!
//! let mut store = InMemoryStorage::new();
//! store.add_policy(1, "Site policy", Audience::LoggedIn, Some(10));
//! store.add_policy(2, "Privacy notice", Audience::All, Some(20));
//! let mut controller = AgreementController::new(Config::default(), store).unwrap();
//!
//! let grants = GrantedCapabilities::new().grant(5, Capability::Accept, CapabilityScope::System);
//! let mut session = PolicySession::new("sk");
//! session.mark_viewed(10);
//! session.mark_viewed(20);
//!
//! let mut ctx = RequestContext::new(Requester::user(5), "en", &mut session, &grants)
//!     .with_sesskey("sk");
//! let request = AgreementRequest { agreedocs: vec![10, 20], behalf_id: 0 };
//!
//! // Everything accepted: the user leaves the page for where they were going.
//! let outcome = controller.handle(&mut ctx, &request).unwrap();
//! assert!(matches!(outcome, AgreementOutcome::Redirect(_)));
//! assert!(ctx.requester.policy_agreed);
//! assert!(controller.ledger().is_user_version_accepted(5, 20, None));
//! ```

pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod event;
pub mod ledger;
pub mod navigation;
pub mod session;
pub mod storage;
pub mod types;
pub mod urls;

#[cfg(feature = "config-loader")]
pub mod config_loader;

#[cfg(feature = "async")]
pub mod async_controller;

pub use controller::{AgreementController, AgreementOutcome, AgreementPage, AgreementRequest};
pub use error::{AgreementError, EventError};
pub use event::{AcceptanceEvent, EventFilter};
pub use ledger::AcceptanceLedger;
pub use storage::{InMemoryStorage, Storage};
pub use types::{
    Acceptance, AcceptanceStatus, AgreementPageData, Audience, CurrentPolicy, Policy,
    PolicyAcceptanceView, PolicyVersion, UserProfile,
};
