//! ID prefix constants for Trellis entities.
//!
//! IDs are generated by the store as `<prefix>-<8 hex chars>`, e.g.
//! `rtp-a3f8b2c1`. The prefix makes entity types recognizable in logs
//! and foreign-key columns.

pub const PREFIX_TOPIC: &str = "rtp";
pub const PREFIX_DECOMPOSITION: &str = "dcp";
pub const PREFIX_ANALYSIS: &str = "tan";
pub const PREFIX_IDEA: &str = "cid";

/// All prefixes, for exhaustive tests of the ID generator.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_TOPIC,
    PREFIX_DECOMPOSITION,
    PREFIX_ANALYSIS,
    PREFIX_IDEA,
];
