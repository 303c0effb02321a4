// Signed-in user and preference state

use crate::clock::Clock;
use crate::kv::SharedKv;
use crate::models::{PreferencesPatch, User, UserPreferences};
use std::sync::Arc;
use tracing::{debug, info};

pub const PREFERENCES_KEY: &str = "user_preferences";
pub const USER_KEY: &str = "user_data";

/// Holds the optional user and the active preferences. Unlike the entity
/// collections this is a single value, persisted under two keys.
pub struct UserStore {
    user: Option<User>,
    preferences: UserPreferences,
    kv: SharedKv,
    clock: Arc<dyn Clock>,
}

impl UserStore {
    pub fn open(kv: SharedKv, clock: Arc<dyn Clock>) -> Self {
        let (user, preferences) = {
            let mut kv = kv.borrow_mut();
            (
                kv.get_as::<User>(USER_KEY),
                kv.get_as::<UserPreferences>(PREFERENCES_KEY).unwrap_or_default(),
            )
        };
        info!(signed_in = user.is_some(), "Loaded user state");

        Self {
            user,
            preferences,
            kv,
            clock,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    pub fn set_user(&mut self, user: User) {
        debug!(user_id = %user.id, "Setting user");
        self.kv.borrow_mut().put(USER_KEY, &user);
        self.user = Some(user);
    }

    /// Forget the user. Preferences stay in place.
    pub fn logout(&mut self) {
        self.user = None;
        self.kv.borrow_mut().remove(USER_KEY);
    }

    /// Shallow-merge preference fields and persist
    pub fn update_preferences(&mut self, patch: PreferencesPatch) {
        self.preferences.apply(patch);
        self.persist_preferences();
    }

    pub fn reset_preferences(&mut self) {
        self.preferences = UserPreferences::default();
        self.persist_preferences();
    }

    fn persist_preferences(&mut self) {
        self.kv.borrow_mut().put(PREFERENCES_KEY, &self.preferences);

        // The signed-in user carries a copy of the preferences
        if let Some(user) = self.user.as_mut() {
            user.preferences = self.preferences.clone();
            user.updated_at = self.clock.now();
            self.kv.borrow_mut().put(USER_KEY, &*user);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::kv::{DEFAULT_PREFIX, KvStore, SqliteMedium};
    use crate::models::{Theme, TimeFormat};
    use chrono::{Duration, TimeZone, Utc};

    fn setup() -> (SharedKv, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let kv = KvStore::new(DEFAULT_PREFIX, Box::new(SqliteMedium::in_memory().unwrap()), clock.clone()).shared();
        (kv, clock)
    }

    fn user(now: chrono::DateTime<Utc>) -> User {
        User {
            id: "u1".to_string(),
            email: "sam@example.com".to_string(),
            name: "Sam".to_string(),
            avatar: None,
            preferences: UserPreferences::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_defaults_when_nothing_stored() {
        let (kv, clock) = setup();
        let store = UserStore::open(kv, clock);
        assert!(store.user().is_none());
        assert_eq!(*store.preferences(), UserPreferences::default());
    }

    #[test]
    fn test_preferences_persist_across_reopen() {
        let (kv, clock) = setup();
        {
            let mut store = UserStore::open(kv.clone(), clock.clone());
            store.update_preferences(PreferencesPatch {
                theme: Some(Theme::Dark),
                time_format: Some(TimeFormat::TwentyFourHour),
                ..Default::default()
            });
        }

        let store = UserStore::open(kv, clock);
        assert_eq!(store.preferences().theme, Theme::Dark);
        assert_eq!(store.preferences().time_format, TimeFormat::TwentyFourHour);
        assert_eq!(store.preferences().currency, "USD");
    }

    #[test]
    fn test_logout_keeps_preferences() {
        let (kv, clock) = setup();
        let mut store = UserStore::open(kv.clone(), clock.clone());
        store.set_user(user(clock.now()));
        store.update_preferences(PreferencesPatch {
            currency: Some("EUR".to_string()),
            ..Default::default()
        });

        store.logout();
        assert!(store.user().is_none());

        let reopened = UserStore::open(kv, clock);
        assert!(reopened.user().is_none());
        assert_eq!(reopened.preferences().currency, "EUR");
    }

    #[test]
    fn test_signed_in_user_tracks_preferences() {
        let (kv, clock) = setup();
        let mut store = UserStore::open(kv, clock.clone());
        store.set_user(user(clock.now()));

        clock.advance(Duration::minutes(1));
        store.update_preferences(PreferencesPatch {
            theme: Some(Theme::Light),
            ..Default::default()
        });

        let user = store.user().unwrap();
        assert_eq!(user.preferences.theme, Theme::Light);
        assert_eq!(user.updated_at, clock.now());

        store.reset_preferences();
        assert_eq!(store.preferences().theme, Theme::System);
    }
}
