//! Collaborators the stores depend on.
//!
//! ARCHITECTURE
//! ============
//! Service modules own everything that touches the outside world (storage,
//! identity backends, the OS theme source) so the stores in `state` stay
//! plain state machines over injected trait objects.

pub mod identity;
pub mod storage;
pub mod system_theme;
pub mod token;
