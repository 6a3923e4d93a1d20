//! Core types for the device grouping engine
//!
//! This crate provides the entity-side vocabulary shared by the registries
//! and the grouping engine: EntityId, EntityState, typed Attributes, the
//! ordered EntitySnapshot and the domain tables.

pub mod attributes;
pub mod domains;
mod entity_id;
mod snapshot;
mod state;

pub use attributes::Attributes;
pub use entity_id::{EntityId, EntityIdError};
pub use snapshot::{EntitySnapshot, SnapshotError, SnapshotResult};
pub use state::EntityState;

