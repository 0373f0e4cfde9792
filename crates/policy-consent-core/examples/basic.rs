// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! # Basic Agreement Page Example
//!
//! Walks one user through the guided tour, submits the agreement form, and
//! prints the resulting page data.  Run with:
//!
//! ```bash
//! RUST_LOG=debug cargo run --example basic
//! ```

use policy_consent_core::{
    config::Config,
    context::{Capability, CapabilityScope, GrantedCapabilities, RequestContext, Requester},
    controller::{AgreementController, AgreementOutcome, AgreementRequest},
    event::EventFilter,
    navigation::Navigation,
    session::PolicySession,
    storage::InMemoryStorage,
    types::Audience,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // -----------------------------------------------------------------------
    // 1. Catalogue and controller
    // -----------------------------------------------------------------------
    let mut store = InMemoryStorage::new();
    store.add_policy(1, "Site policy", Audience::LoggedIn, Some(10));
    store.add_policy(2, "Privacy notice", Audience::All, Some(20));
    store.add_policy(3, "Guest notice", Audience::Guests, Some(30));

    let config = Config {
        privacy_officer: Some("dpo@example.org".into()),
        ..Config::default()
    };
    let mut controller = AgreementController::new(config, store)?;

    let grants = GrantedCapabilities::new().grant(5, Capability::Accept, CapabilityScope::System);
    let mut session = PolicySession::new("sk-demo");

    // -----------------------------------------------------------------------
    // 2. Guided tour: one redirect per unread policy
    // -----------------------------------------------------------------------
    loop {
        let mut ctx = RequestContext::new(Requester::user(5), "en", &mut session, &grants);
        match controller.handle(&mut ctx, &AgreementRequest::default())? {
            AgreementOutcome::Redirect(Navigation::ShowPolicy { url, step }) => {
                println!(
                    "Showing policy {}/{} (version {}): {}",
                    step.num_policy, step.total_policies, step.version_id, url
                );
            }
            AgreementOutcome::Redirect(other) => {
                println!("Left the agreement page for {}", other.url());
                return Ok(());
            }
            AgreementOutcome::Display(_) => break,
        }
    }

    // -----------------------------------------------------------------------
    // 3. Submit the form
    // -----------------------------------------------------------------------
    let submissions = [vec![10], vec![10, 20]];
    for agreedocs in submissions {
        let mut ctx = RequestContext::new(Requester::user(5), "en", &mut session, &grants)
            .with_sesskey("sk-demo");
        let request = AgreementRequest {
            agreedocs,
            behalf_id: 0,
        };
        match controller.handle(&mut ctx, &request)? {
            AgreementOutcome::Display(page) => {
                let data = page.export_for_display(&ctx);
                println!("\nAgreement page ({}):", data.myurl);
                for policy in &data.policies {
                    println!(
                        "  [{}] {} (version {})",
                        if policy.versionagreed { "x" } else { " " },
                        policy.name,
                        policy.currentversionid
                    );
                }
                if let Some(officer) = data.privacyofficer {
                    println!("  Questions: {officer}");
                }
            }
            AgreementOutcome::Redirect(nav) => {
                println!(
                    "\nAll policies agreed (policy_agreed = {}), continuing to {}",
                    ctx.requester.policy_agreed,
                    nav.url()
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // 4. Audit events
    // -----------------------------------------------------------------------
    println!("\nRecorded events:");
    for event in controller.ledger().events(&EventFilter::default()) {
        println!("  {}: {}", policy_consent_core::AcceptanceEvent::name(), event.description());
    }

    Ok(())
}
