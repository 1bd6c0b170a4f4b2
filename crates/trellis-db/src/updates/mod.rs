//! Partial-update patch structs.
//!
//! Each patch has `Option` fields (with `Option<Option<_>>` for nullable
//! columns) and a builder, so callers express exactly the columns they want
//! changed.

pub mod idea;
pub mod topic;
