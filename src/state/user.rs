//! User profile record held by the session store.
//!
//! DESIGN
//! ======
//! Serialized with camelCase field names so a persisted session written by
//! the web client and one written by this crate are interchangeable.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::theme::ThemePreference;

#[cfg(test)]
#[path = "user_test.rs"]
mod tests;

/// Access tier of an account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Premium,
    Admin,
}

/// Subscription plan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
    Enterprise,
}

/// Per-user settings stored on the account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Account-level theme choice (independent of the local theme store).
    pub theme: ThemePreference,
    /// UI language tag, e.g. `"en"`.
    pub language: String,
    pub notifications: bool,
    pub auto_save: bool,
    /// Editor color scheme name, e.g. `"vs-dark"`.
    pub code_theme: String,
    pub font_size: u16,
}

/// Plan, expiry, and unlocked feature names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub plan: Plan,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<OffsetDateTime>,
    pub features: Vec<String>,
}

/// Learning progress counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub algorithms_completed: u32,
    /// Total time spent, in minutes.
    pub total_time: u64,
    /// Consecutive active days.
    pub streak: u32,
    pub level: u32,
    pub xp: u64,
}

/// Authenticated user profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub role: Role,
    pub preferences: Preferences,
    pub subscription: Subscription,
    pub progress: Progress,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_login_at: OffsetDateTime,
}

/// Shallow partial update for [`User`].
///
/// Every `Some` field replaces the whole corresponding field of the stored
/// record; nested records are not merged. `avatar: Some(None)` clears the
/// avatar.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub id: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<Option<String>>,
    pub role: Option<Role>,
    pub preferences: Option<Preferences>,
    pub subscription: Option<Subscription>,
    pub progress: Option<Progress>,
    pub created_at: Option<OffsetDateTime>,
    pub last_login_at: Option<OffsetDateTime>,
}

impl UserPatch {
    /// True when applying the patch cannot change anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite the fields of `user` that this patch carries.
    pub fn apply(self, user: &mut User) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        set(&mut user.id, self.id);
        set(&mut user.email, self.email);
        set(&mut user.username, self.username);
        set(&mut user.first_name, self.first_name);
        set(&mut user.last_name, self.last_name);
        set(&mut user.avatar, self.avatar);
        set(&mut user.role, self.role);
        set(&mut user.preferences, self.preferences);
        set(&mut user.subscription, self.subscription);
        set(&mut user.progress, self.progress);
        set(&mut user.created_at, self.created_at);
        set(&mut user.last_login_at, self.last_login_at);
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// A fully populated user with fixed timestamps.
    #[must_use]
    pub fn sample_user() -> User {
        let at = OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(1_700_000_000);
        User {
            id: "u1".to_owned(),
            email: "a@b.com".to_owned(),
            username: "a".to_owned(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            avatar: Some("https://example.test/a.svg".to_owned()),
            role: Role::User,
            preferences: Preferences {
                theme: ThemePreference::Dark,
                language: "en".to_owned(),
                notifications: true,
                auto_save: true,
                code_theme: "vs-dark".to_owned(),
                font_size: 14,
            },
            subscription: Subscription { plan: Plan::Pro, expires_at: None, features: vec!["ai_analysis".to_owned()] },
            progress: Progress { algorithms_completed: 3, total_time: 90, streak: 2, level: 1, xp: 120 },
            created_at: at,
            last_login_at: at,
        }
    }
}
