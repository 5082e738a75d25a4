//! Client state stores.
//!
//! DESIGN
//! ======
//! Each store owns its fields outright and mutates them only through its own
//! operations. Derived values (`is_authenticated`, `effective_theme`) are
//! recomputed inside those operations and have no setters.

pub mod session;
pub mod theme;
pub mod user;
