use super::session::SessionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Requires an authenticated session (the dashboard).
    Private,
    /// Only reachable while logged out (login, register).
    Guest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    /// Session still validating; show a spinner, decide later.
    Placeholder,
    RedirectToLogin,
    RedirectToDashboard,
}

pub fn resolve(route: RouteKind, status: SessionStatus) -> GuardDecision {
    match (route, status) {
        (_, SessionStatus::Loading) => GuardDecision::Placeholder,
        (RouteKind::Private, SessionStatus::Unauthenticated) => GuardDecision::RedirectToLogin,
        (RouteKind::Guest, SessionStatus::Authenticated) => GuardDecision::RedirectToDashboard,
        _ => GuardDecision::Render,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_matrix() {
        use GuardDecision::*;
        use RouteKind::*;
        use SessionStatus::*;

        assert_eq!(resolve(Private, Loading), Placeholder);
        assert_eq!(resolve(Guest, Loading), Placeholder);
        assert_eq!(resolve(Private, Authenticated), Render);
        assert_eq!(resolve(Private, Unauthenticated), RedirectToLogin);
        assert_eq!(resolve(Guest, Unauthenticated), Render);
        assert_eq!(resolve(Guest, Authenticated), RedirectToDashboard);
    }
}
