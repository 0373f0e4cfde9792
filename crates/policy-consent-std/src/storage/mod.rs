// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Durable [`Storage`](policy_consent_core::Storage) backends.

pub mod file;
