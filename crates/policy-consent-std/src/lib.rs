// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! # policy-consent-std
//!
//! Filesystem storage backends for `policy-consent-core`.
//!
//! This crate provides [`FileStorage`], a JSON file-backed implementation of
//! the [`Storage`](policy_consent_core::Storage) trait suitable for small
//! sites and command-line tooling that do not need a full database.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use policy_consent_std::storage::file::FileStorage;
//! use policy_consent_core::{AgreementController, config::Config};
//!
//! let storage = FileStorage::open("/var/lib/policy/consent.json")
//!     .expect("failed to open storage file");
//!
//! let controller = AgreementController::new(Config::default(), storage)
//!     .expect("invalid wwwroot");
//! ```

pub mod storage;

pub use storage::file::FileStorage;
