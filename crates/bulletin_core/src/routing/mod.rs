//! Client-side route table and navigation pipeline.
//!
//! # Responsibility
//! - Declare path-pattern → view mappings for each site revision.
//! - Resolve request paths to views with captured parameters.
//! - Enforce route meta through ordered navigation guards.
//!
//! # Invariants
//! - Tables are validated once at build time and immutable afterwards.
//! - Resolution is deterministic for a given table and path.

pub mod guard;
pub mod path;
pub mod revisions;
pub mod route;
pub mod table;
