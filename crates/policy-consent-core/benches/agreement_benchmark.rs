// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Criterion benchmark suite for the policy agreement pipeline.
//!
//! Benchmarks cover:
//!
//! - Latest-acceptance lookup over a long history
//! - Recording acceptances through the ledger
//! - Pending-version computation for the guided tour
//! - The full agreement-page request
//!
//! Run with: `cargo bench --bench agreement_benchmark`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use policy_consent_core::{
    config::Config,
    context::{Capability, CapabilityScope, GrantedCapabilities, RequestContext, Requester},
    controller::{AgreementController, AgreementRequest},
    ledger::AcceptanceLedger,
    navigation,
    session::PolicySession,
    storage::InMemoryStorage,
    types::{Audience, CurrentPolicy},
};

/// A catalogue of `count` logged-in policies with versions `id * 10`.
fn catalogue(count: u64) -> InMemoryStorage {
    let mut store = InMemoryStorage::new();
    for id in 1..=count {
        store.add_policy(id, &format!("Policy {id}"), Audience::LoggedIn, Some(id * 10));
    }
    store
}

// ---------------------------------------------------------------------------
// Ledger lookups
// ---------------------------------------------------------------------------

/// Latest-row lookup cost as the acceptance history grows.
fn acceptance_lookup_benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("acceptance_lookup");

    for history in [10u64, 100, 1_000] {
        let mut ledger = AcceptanceLedger::new(catalogue(1));
        for _ in 0..history / 2 {
            ledger.accept_policies(&[10], 5, 5, None, "en").ok();
            ledger.revoke_acceptance(10, 5, 5, None).ok();
        }
        let rows = ledger.get_user_acceptances(5);

        group.bench_with_input(BenchmarkId::from_parameter(history), &rows, |bencher, rows| {
            bencher.iter(|| {
                let accepted = ledger.is_user_version_accepted(black_box(5), black_box(10), Some(rows));
                black_box(accepted);
            });
        });
    }

    group.finish();
}

/// Recording a batch of acceptances for a fresh user each iteration.
fn accept_policies_benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("accept_policies");
    let versions: Vec<u64> = (1..=10).map(|id| id * 10).collect();

    group.bench_function("ten_versions_new_user", |bencher| {
        let mut ledger = AcceptanceLedger::new(catalogue(10));
        let mut user = 0u64;
        bencher.iter(|| {
            user += 1;
            let events = ledger.accept_policies(black_box(&versions), user, user, None, "en");
            black_box(events.map(|events| events.len()).unwrap_or_default());
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Guided tour
// ---------------------------------------------------------------------------

fn pending_versions_benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("pending_versions");

    for count in [5u64, 50] {
        let policies: Vec<CurrentPolicy> = (1..=count)
            .rev()
            .map(|id| CurrentPolicy {
                id,
                name: format!("Policy {id}"),
                currentversionid: id * 10,
            })
            .collect();
        let viewed: Vec<u64> = (1..=count / 2).map(|id| id * 10).collect();

        group.bench_with_input(BenchmarkId::from_parameter(count), &policies, |bencher, policies| {
            bencher.iter(|| {
                let pending = navigation::pending_versions(policies, black_box(5), &[], &viewed);
                black_box(pending);
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Full request
// ---------------------------------------------------------------------------

/// A returning user who has read and accepted everything: no writes, full
/// page annotation.
fn agreement_page_benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("agreement_page");

    let mut controller = match AgreementController::new(Config::default(), catalogue(10)) {
        Ok(controller) => controller,
        Err(error) => panic!("default config must be valid: {error}"),
    };
    let versions: Vec<u64> = (1..=10).map(|id| id * 10).collect();
    controller
        .ledger_mut()
        .accept_policies(&versions, 5, 5, None, "en")
        .ok();
    let grants = GrantedCapabilities::new().grant(5, Capability::Accept, CapabilityScope::System);
    let request = AgreementRequest::default();

    group.bench_function("display_all_accepted", |bencher| {
        bencher.iter(|| {
            let mut session = PolicySession::new("sk");
            let mut ctx = RequestContext::new(Requester::user(5), "en", &mut session, &grants);
            let outcome = controller.handle(&mut ctx, black_box(&request));
            black_box(outcome.is_ok());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    acceptance_lookup_benchmark,
    accept_policies_benchmark,
    pending_versions_benchmark,
    agreement_page_benchmark,
);

criterion_main!(benches);
