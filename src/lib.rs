//! Organizational hierarchy builder
//!
//! Turns a flat list of (employee, manager) relations into a forest of
//! reporting trees and serializes it to a nested document.

pub mod domain;
pub use domain::{
    Config, Employee, Forest, Hierarchy, HierarchyError, Identifier, Index, Relation,
};

/// Loading relations from input documents and writing output documents.
pub mod storage;
pub use storage::{InputFormat, LoadError, OutputFormat, WriteError};
