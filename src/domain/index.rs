//! The [`Index`] is the lookup structure the hierarchy is built from.
//!
//! It maps each identifier to the latest record describing it while keeping
//! entries in the order their identifiers were first seen.

use std::collections::HashMap;

use tracing::instrument;

use super::{Identifier, Relation};

/// One indexed employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The employee identifier.
    pub id: Identifier,
    /// The employee's manager, if any.
    pub manager: Option<Identifier>,
    /// Zero-based position of the input record this entry was taken from.
    pub record: usize,
}

/// A record that overwrote an earlier record with the same identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    /// The repeated identifier.
    pub id: Identifier,
    /// Zero-based position of the record that was replaced.
    pub first: usize,
    /// Zero-based position of the record that replaced it.
    pub replaced_by: usize,
}

/// An insertion-ordered index of employees keyed by identifier.
///
/// Duplicate identifiers are not merged: a later record replaces the earlier
/// one (last-write-wins) but keeps the earlier record's position, so iteration
/// order is the order in which identifiers were first seen.
#[derive(Debug, Default, Clone)]
pub struct Index {
    entries: Vec<Entry>,
    positions: HashMap<Identifier, usize>,
    duplicates: Vec<Duplicate>,
}

impl Index {
    /// Creates an empty index with room for `capacity` employees.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
            duplicates: Vec::new(),
        }
    }

    /// Builds an index from a sequence of relations.
    #[must_use]
    #[instrument(skip(relations))]
    pub fn build<I>(relations: I) -> Self
    where
        I: IntoIterator<Item = Relation>,
    {
        let relations = relations.into_iter();
        let mut index = Self::with_capacity(relations.size_hint().0);

        for (record, relation) in relations.enumerate() {
            index.insert(record, relation);
        }

        tracing::debug!(
            employees = index.len(),
            duplicates = index.duplicates.len(),
            "built relation index"
        );

        index
    }

    /// Inserts one relation taken from input record number `record`.
    ///
    /// Returns the [`Duplicate`] if this replaced an existing entry.
    pub fn insert(&mut self, record: usize, relation: Relation) -> Option<Duplicate> {
        let Relation { id, manager } = relation;

        if let Some(&position) = self.positions.get(&id) {
            let entry = &mut self.entries[position];
            let duplicate = Duplicate {
                id: id.clone(),
                first: entry.record,
                replaced_by: record,
            };
            *entry = Entry {
                id,
                manager,
                record,
            };
            self.duplicates.push(duplicate.clone());
            return Some(duplicate);
        }

        self.positions.insert(id.clone(), self.entries.len());
        self.entries.push(Entry {
            id,
            manager,
            record,
        });
        None
    }

    /// Looks up an employee by identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.position(id).map(|position| &self.entries[position])
    }

    /// Returns the index position of an identifier.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// All entries, in first-seen order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Entries with no manager, in first-seen order.
    pub fn roots(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.entries.iter().filter(|entry| entry.manager.is_none())
    }

    /// Records that were overwritten by a later record with the same
    /// identifier, in input order.
    #[must_use]
    pub fn duplicates(&self) -> &[Duplicate] {
        &self.duplicates
    }

    /// Number of unique identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no employees.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Relation> for Index {
    fn from_iter<T: IntoIterator<Item = Relation>>(iter: T) -> Self {
        Self::build(iter)
    }
}
