//! Announcement state and its durable mirror.
//!
//! # Responsibility
//! - Own the ordered, newest-first announcement list.
//! - Mirror the full list to durable storage after every mutation.
//! - Notify subscribers of each in-memory change.
//!
//! # Invariants
//! - New announcements are always inserted at index 0.
//! - Index-based mutations never touch memory or storage when out of range.
//! - A failed mirror write keeps the in-memory mutation and marks the store dirty.

pub mod announcement_store;
pub mod codec;
