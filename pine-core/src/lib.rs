//! Core procedural pine tree generation library.
//!
//! Main components:
//! - [`config`] — shape parameters, panel ranges and validation.
//! - [`builder`] — recursive branch generation.
//! - [`graft`] — runtime attachment of single branches.
//! - [`pick`] — ray casting against branch cylinders.
//! - [`tree`] — arena-backed branch hierarchy.
//! - [`transform`] — decomposed local transforms.
//! - [`resources`] — shared cylinder geometry and material.
//! - [`error`] — build and graft errors.
//! - [`types`] — shared type aliases and IDs.

pub mod builder;
pub mod config;
pub mod error;
pub mod graft;
pub mod pick;
pub mod resources;
pub mod transform;
pub mod tree;
pub mod types;

pub use builder::build;
pub use config::ShapeParameters;
pub use error::{BuildError, GraftError};
pub use graft::graft;
pub use pick::{PickHit, Ray};
pub use tree::{BranchNode, NodeOrigin, PineTree};
