//! AlgoMaster client state core.
//!
//! ARCHITECTURE
//! ============
//! Two independent stores hold the client's durable UI state:
//!
//! - [`state::session::SessionStore`]: signed-in user, credential token, and
//!   the login/register/refresh lifecycle, backed by an
//!   [`services::identity::IdentityProvider`].
//! - [`state::theme::ThemeStore`]: user theme choice reconciled with the OS
//!   theme reported by a [`services::system_theme::SystemThemeSignal`].
//!
//! Both persist a projection of their fields through
//! [`services::storage::Storage`] and are wired together once per process by
//! [`context::AppContext`].

pub mod config;
pub mod context;
pub mod error;
pub mod services;
pub mod state;

pub use config::AppConfig;
pub use context::AppContext;
pub use error::ErrorCode;
