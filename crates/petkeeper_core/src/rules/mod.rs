//! Pure ownership decisions.
//!
//! # Responsibility
//! - Decide whether a link may be created or removed.
//! - Group active owners sharing one display identity.
//!
//! # Invariants
//! - Decisions never perform I/O and never raise errors; denials are values.
//! - Only `homonym::resolve_homonyms` touches the store, and only to read.

pub mod homonym;
pub mod ownership;
