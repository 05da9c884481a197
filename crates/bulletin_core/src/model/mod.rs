//! Domain model for site announcements.
//!
//! # Responsibility
//! - Define the canonical announcement record and author-supplied drafts.
//! - Own identifier assignment so ids stay unique within one store.
//!
//! # Invariants
//! - Every persisted announcement carries a numeric, non-blank id.
//! - Ids issued by one `IdGenerator` are strictly increasing.

pub mod announcement;
pub mod clock;
