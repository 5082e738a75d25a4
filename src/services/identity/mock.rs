//! In-process identity provider for demos and offline runs.
//!
//! Every well-formed login succeeds with the demo profile; registration
//! builds a fresh free-tier account. Tokens follow the mock format described
//! in `services::token`, and renewal refuses tokens older than the configured
//! lifetime.

use std::time::Duration;

use time::OffsetDateTime;
use uuid::Uuid;

use super::{Identity, IdentityError, IdentityProvider, RegistrationData, normalize_email};
use crate::services::token::{self, DEFAULT_TOKEN_TTL};
use crate::state::theme::ThemePreference;
use crate::state::user::{Plan, Preferences, Progress, Role, Subscription, User};

#[cfg(test)]
#[path = "mock_test.rs"]
mod tests;

/// Email of the built-in demo account.
pub const DEMO_EMAIL: &str = "demo@algomaster.studio";
/// Credential of the built-in demo account.
pub const DEMO_PASSWORD: &str = "demo123";

const DEMO_USER_ID: &str = "demo-user-123";
const AVATAR_BASE_URL: &str = "https://api.dicebear.com/7.x/avataaars/svg";

const LOGIN_TOKEN_PREFIX: &str = "demo";
const REGISTER_TOKEN_PREFIX: &str = "token";
const REFRESH_TOKEN_PREFIX: &str = "refreshed";

const PRO_FEATURES: [&str; 4] = ["ai_analysis", "visualizations", "benchmarking", "unlimited_algorithms"];
const FREE_FEATURES: [&str; 2] = ["basic_analysis", "limited_algorithms"];

/// Identity provider that never leaves the process.
#[derive(Debug, Clone, Copy)]
pub struct MockIdentityProvider {
    token_ttl: Duration,
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_TTL)
    }
}

impl MockIdentityProvider {
    #[must_use]
    pub fn new(token_ttl: Duration) -> Self {
        Self { token_ttl }
    }

    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }
}

/// Generated avatar URL seeded by email.
#[must_use]
pub fn avatar_url(email: &str) -> String {
    format!("{AVATAR_BASE_URL}?seed={email}")
}

fn features(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_owned()).collect()
}

fn demo_profile(email: &str, now: OffsetDateTime) -> User {
    let username = email.split('@').next().unwrap_or(email).to_owned();
    User {
        id: DEMO_USER_ID.to_owned(),
        email: email.to_owned(),
        username,
        first_name: "Demo".to_owned(),
        last_name: "User".to_owned(),
        avatar: Some(avatar_url(email)),
        role: Role::User,
        preferences: Preferences {
            theme: ThemePreference::Dark,
            language: "en".to_owned(),
            notifications: true,
            auto_save: true,
            code_theme: "vs-dark".to_owned(),
            font_size: 14,
        },
        subscription: Subscription { plan: Plan::Pro, expires_at: None, features: features(&PRO_FEATURES) },
        progress: Progress { algorithms_completed: 23, total_time: 1247, streak: 7, level: 5, xp: 2340 },
        created_at: now,
        last_login_at: now,
    }
}

fn new_account_profile(email: &str, registration: &RegistrationData, now: OffsetDateTime) -> User {
    User {
        id: format!("user_{}", Uuid::new_v4().simple()),
        email: email.to_owned(),
        username: registration.username.trim().to_owned(),
        first_name: registration.first_name.trim().to_owned(),
        last_name: registration.last_name.trim().to_owned(),
        avatar: Some(avatar_url(email)),
        role: Role::User,
        preferences: Preferences {
            theme: ThemePreference::Light,
            language: "en".to_owned(),
            notifications: true,
            auto_save: true,
            code_theme: "vs-light".to_owned(),
            font_size: 14,
        },
        subscription: Subscription { plan: Plan::Free, expires_at: None, features: features(&FREE_FEATURES) },
        progress: Progress { level: 1, ..Progress::default() },
        created_at: now,
        last_login_at: now,
    }
}

#[async_trait::async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn authenticate(&self, email: &str, credential: &str) -> Result<Identity, IdentityError> {
        let email = normalize_email(email).ok_or_else(|| IdentityError::InvalidEmail(email.to_owned()))?;
        if credential.is_empty() {
            return Err(IdentityError::Rejected);
        }
        let user = demo_profile(&email, OffsetDateTime::now_utc());
        let token = token::mint_token(LOGIN_TOKEN_PREFIX, token::now_ms());
        Ok(Identity { user, token })
    }

    async fn create_account(&self, registration: &RegistrationData) -> Result<Identity, IdentityError> {
        let email = normalize_email(&registration.email)
            .ok_or_else(|| IdentityError::InvalidEmail(registration.email.clone()))?;
        if registration.password.is_empty() || registration.username.trim().is_empty() {
            return Err(IdentityError::Rejected);
        }
        let user = new_account_profile(&email, registration, OffsetDateTime::now_utc());
        let token = token::mint_token(REGISTER_TOKEN_PREFIX, token::now_ms());
        Ok(Identity { user, token })
    }

    async fn renew_token(&self, token: &str) -> Result<String, IdentityError> {
        let now = token::now_ms();
        if token::is_token_expired(token, now, self.token_ttl) {
            return Err(IdentityError::Expired);
        }
        Ok(token::mint_token(REFRESH_TOKEN_PREFIX, now))
    }
}
