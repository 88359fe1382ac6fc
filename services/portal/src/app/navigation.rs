//! services/portal/src/app/navigation.rs
//!
//! Which screen a user may be on, given who is signed in.

use std::fmt;
use support_portal_core::domain::{ComplaintId, Identity, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    CustomerDashboard,
    NewComplaint,
    ComplaintDetails(ComplaintId),
    AdminDashboard,
    AdminResolve(ComplaintId),
}

impl Route {
    pub fn required_role(&self) -> Option<Role> {
        match self {
            Route::Login | Route::Register => None,
            Route::CustomerDashboard | Route::NewComplaint | Route::ComplaintDetails(_) => {
                Some(Role::Customer)
            }
            Route::AdminDashboard | Route::AdminResolve(_) => Some(Role::Admin),
        }
    }

    pub fn permits(&self, identity: Option<&Identity>) -> bool {
        match (self.required_role(), identity) {
            (None, _) => true,
            (Some(role), Some(identity)) => identity.role == role,
            (Some(_), None) => false,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Login => f.write_str("/login"),
            Route::Register => f.write_str("/register"),
            Route::CustomerDashboard => f.write_str("/customer/dashboard"),
            Route::NewComplaint => f.write_str("/customer/dashboard/complaint"),
            Route::ComplaintDetails(id) => write!(f, "/customer/dashboard/view/{}", id),
            Route::AdminDashboard => f.write_str("/admin/dashboard"),
            Route::AdminResolve(id) => write!(f, "/admin/dashboard/suggestions/{}", id),
        }
    }
}

/// Where a user lands after start-up or sign-in.
pub fn landing_route(identity: Option<&Identity>) -> Route {
    match identity.map(|i| i.role) {
        None => Route::Login,
        Some(Role::Admin) => Route::AdminDashboard,
        Some(Role::Customer) => Route::CustomerDashboard,
    }
}

/// Returns `requested` if the identity may see it, else its landing route.
pub fn gate(requested: Route, identity: Option<&Identity>) -> Route {
    if requested.permits(identity) {
        requested
    } else {
        landing_route(identity)
    }
}
