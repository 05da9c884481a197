//! Navigation guards evaluated before a route is entered.
//!
//! # Responsibility
//! - Turn `requires_auth` / `role` route meta into enforced checks.
//! - Run guards as an ordered chain that stops at the first non-allow.
//!
//! # Invariants
//! - Guards never mutate the table or the auth context.
//! - A guard redirect is resolved and re-checked by the whole chain.
//! - Redirect chains stop after `MAX_REDIRECTS` hops with a denial.

use crate::routing::route::Role;
use crate::routing::table::{ResolvedRoute, RouteTable, MAX_REDIRECTS};
use log::{debug, info, warn};

/// Signed-in user as seen by guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub username: String,
    pub role: Role,
}

/// Authentication state of the navigating user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthContext {
    pub user: Option<SessionUser>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(username: impl Into<String>, role: Role) -> Self {
        Self {
            user: Some(SessionUser {
                username: username.into(),
                role,
            }),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|user| user.role)
    }
}

/// Decision returned by one guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Navigate somewhere else instead.
    Redirect(String),
    /// Stop navigation with a reason.
    Deny(String),
}

/// One check in the navigation pipeline.
pub trait NavigationGuard {
    /// Stable guard identifier for logs and denial reports.
    fn name(&self) -> &'static str;
    fn check(&self, to: &ResolvedRoute, auth: &AuthContext) -> GuardDecision;
}

/// Sends anonymous users to the login page when a route requires auth.
#[derive(Debug, Clone)]
pub struct RequireAuthGuard {
    login_path: String,
}

impl RequireAuthGuard {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }
}

impl NavigationGuard for RequireAuthGuard {
    fn name(&self) -> &'static str {
        "require_auth"
    }

    fn check(&self, to: &ResolvedRoute, auth: &AuthContext) -> GuardDecision {
        if !to.meta.requires_auth || auth.is_authenticated() {
            return GuardDecision::Allow;
        }
        GuardDecision::Redirect(format!(
            "{}?redirect={}",
            self.login_path,
            urlencoding::encode(&to.full_path())
        ))
    }
}

/// Denies users whose role does not satisfy `meta.role`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleGuard;

impl NavigationGuard for RoleGuard {
    fn name(&self) -> &'static str {
        "role"
    }

    fn check(&self, to: &ResolvedRoute, auth: &AuthContext) -> GuardDecision {
        let Some(required) = to.meta.role else {
            return GuardDecision::Allow;
        };
        match auth.role() {
            Some(role) if role.satisfies(required) => GuardDecision::Allow,
            Some(role) => GuardDecision::Deny(format!(
                "role `{role}` cannot open `{}` (requires `{required}`)",
                to.path
            )),
            None => GuardDecision::Deny(format!(
                "`{}` requires role `{required}`",
                to.path
            )),
        }
    }
}

/// Final result of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Arrived(ResolvedRoute),
    Denied {
        path: String,
        guard: &'static str,
        reason: String,
    },
    NotFound(String),
}

/// Ordered guard chain with first-denial short-circuit.
#[derive(Default)]
pub struct NavigationPipeline {
    guards: Vec<Box<dyn NavigationGuard>>,
}

impl NavigationPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Auth redirect to `/login`, then role enforcement.
    pub fn standard() -> Self {
        Self::new()
            .with_guard(RequireAuthGuard::new("/login"))
            .with_guard(RoleGuard)
    }

    pub fn with_guard(mut self, guard: impl NavigationGuard + 'static) -> Self {
        self.guards.push(Box::new(guard));
        self
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Resolves `path` and runs every guard in order.
    pub fn navigate(&self, table: &RouteTable, path: &str, auth: &AuthContext) -> NavigationOutcome {
        let mut current = path.to_string();

        for _ in 0..=MAX_REDIRECTS {
            let Some(route) = table.resolve(&current) else {
                info!("event=navigate module=routing status=not_found path={}", current);
                return NavigationOutcome::NotFound(current);
            };

            match self.run_guards(&route, auth) {
                Some((guard, GuardDecision::Redirect(target))) => {
                    debug!(
                        "event=navigate module=routing status=redirect guard={} from={} to={}",
                        guard, route.path, target
                    );
                    current = target;
                }
                Some((guard, GuardDecision::Deny(reason))) => {
                    info!(
                        "event=navigate module=routing status=denied guard={} path={}",
                        guard, route.path
                    );
                    return NavigationOutcome::Denied {
                        path: route.path,
                        guard,
                        reason,
                    };
                }
                None | Some((_, GuardDecision::Allow)) => {
                    debug!(
                        "event=navigate module=routing status=ok path={} view={}",
                        route.path, route.view
                    );
                    return NavigationOutcome::Arrived(route);
                }
            }
        }

        warn!(
            "event=navigate module=routing status=error reason=too_many_redirects path={}",
            path
        );
        NavigationOutcome::Denied {
            path: path.to_string(),
            guard: "pipeline",
            reason: format!("more than {MAX_REDIRECTS} guard redirects"),
        }
    }

    fn run_guards(
        &self,
        route: &ResolvedRoute,
        auth: &AuthContext,
    ) -> Option<(&'static str, GuardDecision)> {
        self.guards.iter().find_map(|guard| match guard.check(route, auth) {
            GuardDecision::Allow => None,
            decision => Some((guard.name(), decision)),
        })
    }
}
