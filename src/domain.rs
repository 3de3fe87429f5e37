//! Domain models for hierarchy construction.
//!
//! This module contains the identifier and relation types, the relation
//! index, the hierarchy builder and the serializable tree records.

mod config;
pub use config::Config;

/// Opaque entity identifiers.
pub mod identifier;
pub use identifier::{EmptyIdentifierError, Identifier};

mod relation;
pub use relation::Relation;

/// The employee index built from a flat relation.
pub mod index;
pub use index::Index;

/// Forest construction and anomaly policies.
pub mod hierarchy;
pub use hierarchy::{DuplicatePolicy, Hierarchy, HierarchyError, OrphanPolicy, Policy};

/// Reporting trees and the forest that holds them.
pub mod tree;
pub use tree::{Employee, Forest};

/// Format-agnostic nested records for serialization.
pub mod record;
