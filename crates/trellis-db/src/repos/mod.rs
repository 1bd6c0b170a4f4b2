//! Repository methods, grouped per entity.
//!
//! All methods live on [`crate::service::TrellisService`]; each file holds
//! one entity's CRUD and lifecycle operations plus its row-parsing function.

pub mod analysis;
pub mod decomposition;
pub mod idea;
pub mod topic;
