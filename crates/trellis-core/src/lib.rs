//! # trellis-core
//!
//! Core types for the Trellis research dataflow engine.
//!
//! This crate provides the foundational types shared across all Trellis crates:
//! - Entity structs for the four graph levels (topics, decompositions,
//!   trend analyses, content ideas)
//! - Status enums with state machine transitions
//! - ID prefix constants
//! - Cross-cutting error types
//! - Report and input types for compound operations

pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod reports;
