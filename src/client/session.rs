use crate::models::User;

/// Durable home of the bearer credential; the browser localStorage analog.
pub trait CredentialStore {
    fn load(&self) -> Option<String>;
    fn save(&mut self, token: &str);
    fn clear(&mut self);
}

#[derive(Debug, Default)]
pub struct MemoryStore(Option<String>);

impl CredentialStore for MemoryStore {
    fn load(&self) -> Option<String> {
        self.0.clone()
    }

    fn save(&mut self, token: &str) {
        self.0 = Some(token.to_string());
    }

    fn clear(&mut self) {
        self.0 = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Startup, before the stored credential (if any) has been validated.
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Outcome of [`Session::restore`]: either there is a stored credential the
/// host must validate with a profile fetch, or the session is already settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restore {
    Validate(String),
    Settled,
}

/// Session state machine. The host wires API calls to the `*_succeeded` /
/// `auth_failed` events; every authentication failure anywhere in the app
/// funnels into [`Session::auth_failed`].
pub struct Session<S: CredentialStore> {
    store: S,
    status: SessionStatus,
    user: Option<User>,
}

impl<S: CredentialStore> Session<S> {
    pub fn new(store: S) -> Self {
        Session {
            store,
            status: SessionStatus::Loading,
            user: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<String> {
        self.store.load()
    }

    /// On load: a stored credential must be re-validated by fetching the
    /// profile; without one the session settles as unauthenticated.
    pub fn restore(&mut self) -> Restore {
        match self.store.load() {
            Some(token) => {
                self.status = SessionStatus::Loading;
                Restore::Validate(token)
            }
            None => {
                self.status = SessionStatus::Unauthenticated;
                Restore::Settled
            }
        }
    }

    pub fn profile_loaded(&mut self, user: User) {
        self.user = Some(user);
        self.status = SessionStatus::Authenticated;
    }

    /// Any 401 from the API, or a failed profile fetch: discard the
    /// credential, never retry.
    pub fn auth_failed(&mut self) {
        self.store.clear();
        self.user = None;
        self.status = SessionStatus::Unauthenticated;
    }

    /// Successful login stores the credential; the host then re-fetches the
    /// profile, which lands in [`Session::profile_loaded`].
    pub fn login_succeeded(&mut self, token: &str, user: User) {
        self.store.save(token);
        self.user = Some(user);
        self.status = SessionStatus::Authenticated;
    }

    /// Registration does not authenticate; the user still has to log in.
    pub fn register_succeeded(&mut self) {
        self.status = SessionStatus::Unauthenticated;
    }

    pub fn logout(&mut self) {
        self.store.clear();
        self.user = None;
        self.status = SessionStatus::Unauthenticated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn profile(id: i64) -> User {
        User {
            id,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            hashed_password: String::new(),
            created_at: NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn restore_without_credential_settles_unauthenticated() {
        let mut session = Session::new(MemoryStore::default());
        assert_eq!(session.status(), SessionStatus::Loading);
        assert_eq!(session.restore(), Restore::Settled);
        assert_eq!(session.status(), SessionStatus::Unauthenticated);
    }

    #[test]
    fn restore_with_credential_validates_then_authenticates() {
        let mut store = MemoryStore::default();
        store.save("tok");
        let mut session = Session::new(store);

        assert_eq!(session.restore(), Restore::Validate("tok".to_string()));
        assert_eq!(session.status(), SessionStatus::Loading);

        session.profile_loaded(profile(1));
        assert_eq!(session.status(), SessionStatus::Authenticated);
        assert_eq!(session.user().unwrap().id, 1);
    }

    #[test]
    fn stale_credential_is_discarded_on_failed_validation() {
        let mut store = MemoryStore::default();
        store.save("expired");
        let mut session = Session::new(store);

        session.restore();
        session.auth_failed();

        assert_eq!(session.status(), SessionStatus::Unauthenticated);
        assert_eq!(session.token(), None);
        assert!(session.user().is_none());
    }

    #[test]
    fn login_stores_credential() {
        let mut session = Session::new(MemoryStore::default());
        session.restore();

        session.login_succeeded("fresh", profile(2));
        assert_eq!(session.status(), SessionStatus::Authenticated);
        assert_eq!(session.token(), Some("fresh".to_string()));
    }

    #[test]
    fn registration_does_not_authenticate() {
        let mut session = Session::new(MemoryStore::default());
        session.restore();

        session.register_succeeded();
        assert_eq!(session.status(), SessionStatus::Unauthenticated);
        assert_eq!(session.token(), None);
    }

    #[test]
    fn logout_clears_everything() {
        let mut session = Session::new(MemoryStore::default());
        session.login_succeeded("tok", profile(3));

        session.logout();
        assert_eq!(session.status(), SessionStatus::Unauthenticated);
        assert_eq!(session.token(), None);
        assert!(session.user().is_none());
    }
}
