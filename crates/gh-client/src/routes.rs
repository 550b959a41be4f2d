//! Role Router
//!
//! The one place role→behavior decisions live. Pages ask this module which
//! dashboard a user belongs on and whether they may see a given page; nobody
//! else compares roles.

use gh_common::{Role, User};

use crate::session::SessionState;

pub const ADMIN_DASHBOARD: &str = "/admin-dashboard";
pub const DONOR_DASHBOARD: &str = "/donor-dashboard";
pub const CHARITY_DASHBOARD: &str = "/charity-dashboard";
pub const GENERIC_DASHBOARD: &str = "/dashboard";
pub const LOGIN_PAGE: &str = "/login";

/// Dashboard path for the given user.
///
/// Donors who own an approved charity are routed to the charity dashboard;
/// with no user at all the generic dashboard applies.
pub fn dashboard_path(user: Option<&User>) -> &'static str {
    let user = match user {
        Some(user) => user,
        None => return GENERIC_DASHBOARD,
    };

    match user.role {
        Role::Admin => ADMIN_DASHBOARD,
        Role::Charity => CHARITY_DASHBOARD,
        Role::Donor => {
            if user.owned_charity.as_ref().is_some_and(|c| c.is_approved()) {
                CHARITY_DASHBOARD
            } else {
                DONOR_DASHBOARD
            }
        }
    }
}

/// Whether `user` may see a page requiring `required`.
///
/// True iff the page declares no required role, or the user exists and the
/// roles match exactly.
pub fn can_access(required: Option<Role>, user: Option<&User>) -> bool {
    match required {
        None => true,
        Some(role) => user.map(|u| u.role == role).unwrap_or(false),
    }
}

/// Outcome of a page-level access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// Render an access-denied view or navigate to `redirect` instead of
    /// the page body.
    Denied { redirect: &'static str },
}

/// Access decision for the current published state.
///
/// Pages re-run this on every render from the state they just received —
/// never from a cached decision — so a logout invalidates privileged views
/// on the next render.
pub fn guard(required: Option<Role>, state: &SessionState) -> Access {
    if !state.is_authenticated {
        return Access::Denied { redirect: LOGIN_PAGE };
    }
    if can_access(required, state.user.as_ref()) {
        Access::Granted
    } else {
        Access::Denied {
            redirect: dashboard_path(state.user.as_ref()),
        }
    }
}
