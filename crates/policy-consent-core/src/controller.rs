// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Agreement page controller: the top-level composition of the ledger,
//! session, and capability port.
//!
//! ## Request pipeline
//!
//! 1. **Behalf resolution**: an unknown behalf user silently falls back to
//!    acting as the requester.
//! 2. **Policy load**: every current policy visible to logged-in users.
//! 3. **Submission**: ticked versions are accepted (authenticated subject)
//!    or the signup "agreed to everything" flag is stored in the session.
//! 4. **Access gating**: guests and stray visitors are sent back; missing
//!    capabilities abort the request; subjects that already agreed skip
//!    the page.
//! 5. **Guided tour**: the next unread document is shown, one per request.
//! 6. **Annotation**: every policy is labelled with the subject's
//!    acceptance state and the page is ready for display.
//!
//! Steps 4 and 5 short-circuit with a [`Navigation`]; a missing capability
//! short-circuits with [`AgreementError::AccessDenied`].

use tracing::{debug, info, warn};
use url::Url;

use crate::config::{Config, SignupAgreementMatch};
use crate::context::{Capability, CapabilityScope, RequestContext, Requester};
use crate::error::AgreementError;
use crate::ledger::AcceptanceLedger;
use crate::navigation::{self, Navigation};
use crate::storage::Storage;
use crate::types::{
    Acceptance, AgreementPageData, CurrentPolicy, Link, ModalLink, NameDisplay,
    PolicyAcceptanceView, PolicyFilter, UserId, UserProfile, VersionId, ACCEPTED_IN_OTHER_LANG,
    ACCEPTED_ON_BEHALF, ANONYMOUS_USER_ID,
};
use crate::urls::PluginUrls;

/// Form input of one agreement-page request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgreementRequest {
    /// Version ids ticked on the submitted form.
    pub agreedocs: Vec<VersionId>,
    /// User to act for; `0` means the requester.
    pub behalf_id: UserId,
}

/// Result of a successful request.
#[derive(Debug, Clone)]
pub enum AgreementOutcome {
    /// Send the visitor elsewhere instead of rendering.
    Redirect(Navigation),
    /// Render the agreement page.
    Display(AgreementPage),
}

/// Subject of a request after behalf resolution.
#[derive(Debug, Clone)]
struct Subject {
    id: UserId,
    /// Resolved profile when acting for somebody else.
    profile: Option<UserProfile>,
}

/// Runs the agreement-page pipeline against a [`Storage`] backend.
///
/// # Examples
///
/// ```rust
/// use policy_consent_core::{
///     config::Config,
///     context::{Capability, CapabilityScope, GrantedCapabilities, RequestContext, Requester},
///     controller::{AgreementController, AgreementOutcome, AgreementRequest},
///     session::PolicySession,
///     storage::InMemoryStorage,
///     types::Audience,
/// };
///
/// let mut store = InMemoryStorage::new();
/// store.add_policy(1, "Site policy", Audience::LoggedIn, Some(10));
/// let mut controller = AgreementController::new(Config::default(), store).unwrap();
///
/// let grants = GrantedCapabilities::new().grant(5, Capability::Accept, CapabilityScope::System);
/// let mut session = PolicySession::new("sk");
/// session.mark_viewed(10);
/// let mut ctx = RequestContext::new(Requester::user(5), "en", &mut session, &grants)
///     .with_sesskey("sk");
///
/// // Accepting the only current policy sends the user on their way.
/// let request = AgreementRequest { agreedocs: vec![10], behalf_id: 0 };
/// match controller.handle(&mut ctx, &request).unwrap() {
///     AgreementOutcome::Redirect(nav) => assert_eq!(nav.url().as_str(), "http://localhost/"),
///     AgreementOutcome::Display(_) => panic!("expected a redirect"),
/// }
/// assert!(ctx.requester.policy_agreed);
/// assert!(controller.ledger().is_user_version_accepted(5, 10, None));
/// ```
pub struct AgreementController<S: Storage> {
    config: Config,
    urls: PluginUrls,
    ledger: AcceptanceLedger<S>,
}

impl<S: Storage> AgreementController<S> {
    /// Construct a controller.
    ///
    /// # Errors
    ///
    /// Fails when `config.wwwroot` is not an absolute URL.
    pub fn new(config: Config, storage: S) -> Result<Self, url::ParseError> {
        let urls = PluginUrls::from_config(&config)?;
        Ok(Self {
            config,
            urls,
            ledger: AcceptanceLedger::new(storage),
        })
    }

    pub fn ledger(&self) -> &AcceptanceLedger<S> {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut AcceptanceLedger<S> {
        &mut self.ledger
    }

    pub fn urls(&self) -> &PluginUrls {
        &self.urls
    }

    /// Process one agreement-page request.
    ///
    /// After a submission for oneself, `ctx.requester.policy_agreed` holds
    /// the freshly stored agreement flag so the host can refresh its copy.
    ///
    /// # Errors
    ///
    /// [`AgreementError::AccessDenied`] when the requester lacks the
    /// capability to accept for the subject.
    pub fn handle(
        &mut self,
        ctx: &mut RequestContext<'_>,
        request: &AgreementRequest,
    ) -> Result<AgreementOutcome, AgreementError> {
        let subject = self.resolve_subject(&ctx.requester, request.behalf_id);
        let policies = self.current_policies();
        debug!(subject = subject.id, count = policies.len(), "loaded current policies");

        self.accept_and_revoke(ctx, &policies, &request.agreedocs, subject.id)?;

        if let Some(navigation) = self.prepare_access(ctx, subject.id)? {
            info!(url = %navigation.url(), "leaving agreement page");
            return Ok(AgreementOutcome::Redirect(navigation));
        }

        let myurl = self.my_url(&ctx.requester, subject.id)?;
        if let Some(navigation) = self.redirect_to_policies(ctx, subject.id, &policies, &myurl)? {
            return Ok(AgreementOutcome::Redirect(navigation));
        }

        let views = self.prepare_user_acceptances(ctx, subject.id, &policies, &request.agreedocs, &myurl)?;
        let behalf_link = match subject.profile {
            Some(ref profile) => Some(self.urls.user_profile(profile.id)?),
            None => None,
        };

        Ok(AgreementOutcome::Display(AgreementPage {
            requester_id: ctx.requester.id,
            behalf_id: subject.id,
            behalf_user: subject.profile,
            behalf_profile_url: behalf_link,
            pluginbaseurl: self.urls.plugin_base()?,
            myurl,
            policies: views,
            privacy_officer: self.config.privacy_officer.clone(),
            fullname_display: self.config.fullname_display,
            alternative_fullname_display: self.config.alternative_fullname_display,
        }))
    }

    /// Current versions `subject` still has to read in this session.
    pub fn pending_versions(&self, subject: UserId, viewed: &[VersionId]) -> Vec<VersionId> {
        let policies = self.current_policies();
        let acceptances = self.ledger.get_user_acceptances(subject);
        navigation::pending_versions(&policies, subject, &acceptances, viewed)
    }

    // -----------------------------------------------------------------------
    // Pipeline steps
    // -----------------------------------------------------------------------

    fn resolve_subject(&self, requester: &Requester, behalf_id: UserId) -> Subject {
        if behalf_id == ANONYMOUS_USER_ID || behalf_id == requester.id {
            return Subject {
                id: requester.id,
                profile: None,
            };
        }
        match self.ledger.storage().get_user(behalf_id) {
            Some(profile) => Subject {
                id: behalf_id,
                profile: Some(profile),
            },
            None => {
                warn!(requester = requester.id, behalf_id, "behalf user not found, acting as self");
                Subject {
                    id: requester.id,
                    profile: None,
                }
            }
        }
    }

    fn current_policies(&self) -> Vec<CurrentPolicy> {
        self.ledger
            .list_policies(&PolicyFilter::loggedin_current())
            .iter()
            .filter_map(|policy| policy.current())
            .collect()
    }

    fn accept_and_revoke(
        &mut self,
        ctx: &mut RequestContext<'_>,
        policies: &[CurrentPolicy],
        agreedocs: &[VersionId],
        subject: UserId,
    ) -> Result<(), AgreementError> {
        if agreedocs.is_empty() {
            return Ok(());
        }
        if !ctx.confirm_sesskey() {
            warn!(requester = ctx.requester.id, "submission ignored: invalid sesskey");
            return Ok(());
        }
        if ctx.requester.guest {
            debug!(requester = ctx.requester.id, "submission ignored: guest session");
            return Ok(());
        }

        if !ctx.requester.is_authenticated() {
            let all_agreed = policies
                .iter()
                .all(|policy| agreedocs.contains(&policy.currentversionid));
            ctx.session.set_user_policy_agreed(all_agreed);
            info!(all_agreed, "signup policy agreement stored in session");
            return Ok(());
        }

        // Nothing is written for a subject the requester may not act for.
        self.require_accept_capability(ctx, subject)?;

        let (accept, unchecked): (Vec<&CurrentPolicy>, Vec<&CurrentPolicy>) = policies
            .iter()
            .partition(|policy| agreedocs.contains(&policy.currentversionid));
        let versions: Vec<VersionId> = accept.iter().map(|policy| policy.currentversionid).collect();
        self.ledger
            .accept_policies(&versions, subject, ctx.requester.id, None, &ctx.current_lang)?;

        for policy in unchecked {
            if self.config.revoke_unchecked {
                self.ledger
                    .revoke_acceptance(policy.currentversionid, subject, ctx.requester.id, None)?;
            } else {
                debug!(version = policy.currentversionid, "unticked policy left unchanged");
            }
        }

        let agreed = self.ledger.update_policy_agreed(subject);
        if subject == ctx.requester.id {
            ctx.requester.policy_agreed = agreed;
        }
        Ok(())
    }

    fn require_accept_capability(&self, ctx: &RequestContext<'_>, subject: UserId) -> Result<(), AgreementError> {
        let result = if subject == ctx.requester.id {
            ctx.capabilities
                .require_capability(ctx.requester.id, Capability::Accept, CapabilityScope::System)
        } else {
            ctx.capabilities.require_capability(
                ctx.requester.id,
                Capability::AcceptBehalf,
                CapabilityScope::User(subject),
            )
        };
        if let Err(ref error) = result {
            warn!(requester = ctx.requester.id, subject, %error, "access denied");
        }
        result
    }

    fn prepare_access(
        &self,
        ctx: &mut RequestContext<'_>,
        subject: UserId,
    ) -> Result<Option<Navigation>, AgreementError> {
        let requester = ctx.requester.clone();
        let signing_up = ctx
            .session
            .wants_url()
            .map_or(false, |wanted| self.urls.is_signup(wanted));

        if requester.guest || (!requester.is_authenticated() && !signing_up) {
            return Ok(Some(self.previous_url(ctx)));
        }

        if requester.is_authenticated() {
            self.require_accept_capability(ctx, subject)?;
        } else if subject != requester.id {
            return Ok(Some(Navigation::Index(self.urls.index(None)?)));
        }

        let agreed_signup = !requester.is_authenticated() && ctx.session.user_policy_agreed();
        let agreed_self = subject == requester.id && requester.policy_agreed;
        if !requester.site_admin && (agreed_signup || agreed_self) {
            return Ok(Some(self.previous_url(ctx)));
        }
        Ok(None)
    }

    fn redirect_to_policies(
        &self,
        ctx: &mut RequestContext<'_>,
        subject: UserId,
        policies: &[CurrentPolicy],
        return_url: &Url,
    ) -> Result<Option<Navigation>, AgreementError> {
        let acceptances = if subject == ANONYMOUS_USER_ID {
            Vec::new()
        } else {
            self.ledger.get_user_acceptances(subject)
        };
        let step = match navigation::next_tour_step(policies, subject, &acceptances, &mut *ctx.session) {
            Some(step) => step,
            None => return Ok(None),
        };
        let url = self
            .urls
            .view_version(step.version_id, return_url, step.num_policy, step.total_policies)?;
        info!(
            subject,
            version = step.version_id,
            num_policy = step.num_policy,
            total_policies = step.total_policies,
            "showing pending policy"
        );
        Ok(Some(Navigation::ShowPolicy { url, step }))
    }

    fn prepare_user_acceptances(
        &self,
        ctx: &RequestContext<'_>,
        subject: UserId,
        policies: &[CurrentPolicy],
        agreedocs: &[VersionId],
        return_url: &Url,
    ) -> Result<Vec<PolicyAcceptanceView>, AgreementError> {
        let acceptances: Vec<Acceptance> = if subject == ANONYMOUS_USER_ID {
            Vec::new()
        } else {
            self.ledger.get_user_acceptances(subject)
        };

        let mut views = Vec::with_capacity(policies.len());
        for policy in policies {
            let url = self.urls.view_policy(policy.id, return_url)?.to_string();

            let mut versionacceptance = None;
            let mut versionlangsagreed = None;
            let mut versionbehalfsagreed = None;
            let versionagreed = if subject != ANONYMOUS_USER_ID {
                versionacceptance =
                    self.ledger
                        .get_user_version_acceptance(subject, policy.currentversionid, Some(&acceptances));
                match versionacceptance {
                    Some(ref row) => {
                        if row.lang != ctx.current_lang {
                            versionlangsagreed = Some(ACCEPTED_IN_OTHER_LANG.to_owned());
                        }
                        if row.usermodified != subject {
                            versionbehalfsagreed = Some(ACCEPTED_ON_BEHALF.to_owned());
                        }
                        row.is_accepted()
                    }
                    None => false,
                }
            } else {
                match self.config.signup_match {
                    SignupAgreementMatch::PolicyId => agreedocs.contains(&policy.id),
                    SignupAgreementMatch::VersionId => agreedocs.contains(&policy.currentversionid),
                }
            };

            views.push(PolicyAcceptanceView {
                id: policy.id,
                name: policy.name.clone(),
                currentversionid: policy.currentversionid,
                currentversion: self.ledger.get_policy_version(policy.id, policy.currentversionid),
                policylink: Link {
                    href: url.clone(),
                    text: policy.name.clone(),
                },
                policymodal: ModalLink {
                    href: url.clone(),
                    text: policy.name.clone(),
                    data_action: "view".into(),
                    data_versionid: policy.currentversionid,
                    data_behalfid: subject,
                },
                url,
                versionacceptance,
                versionagreed,
                versionlangsagreed,
                versionbehalfsagreed,
            });
        }
        Ok(views)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// The agreement page URL, carrying `userid` when acting on behalf.
    fn my_url(&self, requester: &Requester, subject: UserId) -> Result<Url, url::ParseError> {
        if requester.is_authenticated() && subject != ANONYMOUS_USER_ID && subject != requester.id {
            self.urls.index(Some(subject))
        } else {
            self.urls.index(None)
        }
    }

    /// Consume the session's pending destination, defaulting to the site root.
    fn previous_url(&self, ctx: &mut RequestContext<'_>) -> Navigation {
        let target = ctx
            .session
            .take_wants_url()
            .and_then(|wanted| match Url::parse(&wanted) {
                Ok(url) => Some(url),
                Err(error) => {
                    warn!(%error, wanted = %wanted, "ignoring unparsable wants_url");
                    None
                }
            })
            .unwrap_or_else(|| self.urls.site_root().clone());
        Navigation::Previous(target)
    }
}

// ---------------------------------------------------------------------------
// AgreementPage
// ---------------------------------------------------------------------------

/// A fully prepared agreement page, ready for export.
#[derive(Debug, Clone)]
pub struct AgreementPage {
    requester_id: UserId,
    behalf_id: UserId,
    behalf_user: Option<UserProfile>,
    behalf_profile_url: Option<Url>,
    pluginbaseurl: Url,
    myurl: Url,
    policies: Vec<PolicyAcceptanceView>,
    privacy_officer: Option<String>,
    fullname_display: NameDisplay,
    alternative_fullname_display: NameDisplay,
}

impl AgreementPage {
    /// The user the page is about.
    pub fn behalf_id(&self) -> UserId {
        self.behalf_id
    }

    /// Annotated policies in load order.
    pub fn policies(&self) -> &[PolicyAcceptanceView] {
        &self.policies
    }

    pub fn myurl(&self) -> &Url {
        &self.myurl
    }

    /// Produce the template data.
    ///
    /// The behalf user's name is shown in full when the requester may view
    /// full names either site-wide or in that user's context.
    pub fn export_for_display(&self, ctx: &RequestContext<'_>) -> AgreementPageData {
        let behalfuser = match (&self.behalf_user, &self.behalf_profile_url) {
            (Some(profile), Some(url)) => {
                let full = ctx.capabilities.has_capability(
                    self.requester_id,
                    Capability::ViewFullNames,
                    CapabilityScope::System,
                ) || ctx.capabilities.has_capability(
                    self.requester_id,
                    Capability::ViewFullNames,
                    CapabilityScope::User(self.behalf_id),
                );
                let display = if full {
                    self.alternative_fullname_display
                } else {
                    self.fullname_display
                };
                Some(Link {
                    href: url.to_string(),
                    text: profile.fullname(display),
                })
            }
            _ => None,
        };

        AgreementPageData {
            pluginbaseurl: self.pluginbaseurl.to_string(),
            myurl: self.myurl.to_string(),
            sesskey: ctx.session.sesskey().to_owned(),
            policies: self.policies.clone(),
            privacyofficer: self.privacy_officer.clone(),
            behalfuser,
        }
    }
}
