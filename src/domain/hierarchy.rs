//! Forest construction
//!
//! The [`Hierarchy`] owns an [`Index`] together with a manager -> direct
//! reports table computed once from it. Building the forest applies the
//! anomaly [`Policy`], checks the relation for cycles and then resolves each
//! root's subtree with an explicit-stack depth-first walk.
//!
//! Nothing is shared between instances: every conversion builds its own index
//! and table.

use std::{collections::HashSet, fmt, str::FromStr};

use nonempty::NonEmpty;
use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use super::{
    Employee, Forest, Identifier, Index, Relation,
    index::{Duplicate, Entry},
};

/// What to do with an employee whose manager never appears as an employee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrphanPolicy {
    /// Leave the orphan and its subtree out of the forest, logging a warning.
    #[default]
    Drop,
    /// Treat the orphan as an additional root.
    Promote,
    /// Abort with [`HierarchyError::DanglingManager`].
    Fail,
}

/// What to do when an identifier appears in more than one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Keep the last record, logging a warning.
    #[default]
    LastWins,
    /// Abort with [`HierarchyError::Duplicate`].
    Fail,
}

/// How anomalies in the relation are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Policy {
    /// Handling of dangling manager references.
    pub orphans: OrphanPolicy,
    /// Handling of repeated identifiers.
    pub duplicates: DuplicatePolicy,
}

/// Errors that abort forest construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HierarchyError {
    /// An employee reports to a manager that has no record.
    #[error("employee {id} reports to unknown manager {manager}")]
    DanglingManager {
        /// The orphaned employee.
        id: Identifier,
        /// The manager identifier with no record.
        manager: Identifier,
    },
    /// The reporting relation contains a cycle.
    #[error("reporting cycle: {}", format_cycle(.members))]
    Cycle {
        /// The employees on the cycle, in index order.
        members: NonEmpty<Identifier>,
    },
    /// An identifier appears in more than one record.
    #[error("employee {id} appears in records {} and {}", .first + 1, .replaced_by + 1)]
    Duplicate {
        /// The repeated identifier.
        id: Identifier,
        /// Zero-based position of the first record.
        first: usize,
        /// Zero-based position of the later record.
        replaced_by: usize,
    },
}

fn format_cycle(members: &NonEmpty<Identifier>) -> String {
    let mut path: Vec<&str> = members.iter().map(Identifier::as_str).collect();
    path.push(members.head.as_str());
    path.join(" -> ")
}

impl From<Duplicate> for HierarchyError {
    fn from(duplicate: Duplicate) -> Self {
        Self::Duplicate {
            id: duplicate.id,
            first: duplicate.first,
            replaced_by: duplicate.replaced_by,
        }
    }
}

/// The employee index plus the derived reporting structure.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    index: Index,
    /// Direct reports of each index position, in index order.
    reports: Vec<Vec<usize>>,
    /// Positions whose manager has no record, in index order.
    orphans: Vec<usize>,
    policy: Policy,
}

impl Hierarchy {
    /// Indexes the relations and derives the reporting structure, using the
    /// default [`Policy`].
    #[must_use]
    pub fn new<I>(relations: I) -> Self
    where
        I: IntoIterator<Item = Relation>,
    {
        Self::from_index(Index::build(relations), Policy::default())
    }

    /// Derives the reporting structure of an existing index.
    #[must_use]
    pub fn from_index(index: Index, policy: Policy) -> Self {
        let mut reports = vec![Vec::new(); index.len()];
        let mut orphans = Vec::new();

        for (position, entry) in index.entries().iter().enumerate() {
            let Some(manager) = &entry.manager else {
                continue;
            };
            match index.position(manager) {
                Some(parent) => reports[parent].push(position),
                None => orphans.push(position),
            }
        }

        Self {
            index,
            reports,
            orphans,
            policy,
        }
    }

    /// Replaces the anomaly policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Employees whose manager has no record, in index order.
    pub fn orphans(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.orphans.iter().map(move |&position| self.entry(position))
    }

    /// The employees the forest will be rooted at, in index order.
    ///
    /// These are the entries with no manager and, under
    /// [`OrphanPolicy::Promote`], the orphans.
    pub fn roots(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.root_positions()
            .into_iter()
            .map(move |position| self.entry(position))
    }

    /// Direct reports of an employee, in index order.
    pub fn direct_reports(&self, id: &str) -> impl Iterator<Item = &Entry> + '_ {
        self.index
            .position(id)
            .map_or(&[][..], |position| self.reports[position].as_slice())
            .iter()
            .map(move |&position| self.entry(position))
    }

    /// Return all reporting cycles, each in index order.
    ///
    /// An employee managing themselves is a cycle of one.
    #[must_use]
    pub fn cycles(&self) -> Vec<NonEmpty<Identifier>> {
        let mut graph: DiGraphMap<usize, ()> =
            DiGraphMap::with_capacity(self.index.len(), self.index.len());
        for (parent, reports) in self.reports.iter().enumerate() {
            graph.add_node(parent);
            for &child in reports {
                graph.add_edge(child, parent, ());
            }
        }

        let mut cycles = Vec::new();
        for mut component in tarjan_scc(&graph) {
            let is_cycle = match component.as_slice() {
                [] => false,
                [node] => graph.contains_edge(*node, *node),
                _ => true,
            };
            if !is_cycle {
                continue;
            }
            component.sort_unstable();
            let members = component
                .into_iter()
                .map(|position| self.entry(position).id.clone())
                .collect();
            if let Some(members) = NonEmpty::from_vec(members) {
                cycles.push(members);
            }
        }

        cycles.sort_by_key(|members| self.index.position(&members.head));
        cycles
    }

    /// Employees that will not appear in the forest, in index order.
    ///
    /// These are the orphans and everyone below them when orphans are
    /// dropped, plus members of cycles and their subtrees.
    #[must_use]
    pub fn unattached(&self) -> Vec<&Identifier> {
        let mut reachable = vec![false; self.index.len()];
        let mut stack = self.root_positions();
        while let Some(position) = stack.pop() {
            if !std::mem::replace(&mut reachable[position], true) {
                stack.extend(&self.reports[position]);
            }
        }

        self.index
            .entries()
            .iter()
            .zip(reachable)
            .filter(|(_, reachable)| !reachable)
            .map(|(entry, _)| &entry.id)
            .collect()
    }

    /// Builds the forest.
    ///
    /// Roots are resolved independently and in parallel; the returned forest
    /// lists them in index order, each with its direct reports in index order.
    ///
    /// # Errors
    ///
    /// - [`HierarchyError::Duplicate`] for a repeated identifier under
    ///   [`DuplicatePolicy::Fail`]
    /// - [`HierarchyError::Cycle`] if any employee is, directly or
    ///   transitively, their own manager
    /// - [`HierarchyError::DanglingManager`] for an orphan under
    ///   [`OrphanPolicy::Fail`]
    #[instrument(skip(self), fields(employees = self.index.len()))]
    pub fn build(&self) -> Result<Forest, HierarchyError> {
        self.check_duplicates()?;

        if let Some(members) = self.cycles().into_iter().next() {
            return Err(HierarchyError::Cycle { members });
        }

        self.check_orphans()?;

        let roots = self.root_positions();
        let trees = roots
            .par_iter()
            .map(|&root| self.resolve(root))
            .collect::<Result<Vec<_>, _>>()?;

        let forest = Forest::new(trees);
        tracing::debug!(
            roots = forest.roots().len(),
            reachable = forest.len(),
            "built forest"
        );
        Ok(forest)
    }
}

impl Hierarchy {
    fn entry(&self, position: usize) -> &Entry {
        &self.index.entries()[position]
    }

    fn root_positions(&self) -> Vec<usize> {
        let promote = self.policy.orphans == OrphanPolicy::Promote;
        let mut orphans = self.orphans.iter().copied().peekable();

        (0..self.index.len())
            .filter(|&position| {
                let is_orphan = orphans.next_if_eq(&position).is_some();
                self.entry(position).manager.is_none() || (promote && is_orphan)
            })
            .collect()
    }

    fn check_duplicates(&self) -> Result<(), HierarchyError> {
        let duplicates = self.index.duplicates();
        if let (DuplicatePolicy::Fail, Some(duplicate)) =
            (self.policy.duplicates, duplicates.first())
        {
            return Err(duplicate.clone().into());
        }

        for duplicate in duplicates {
            tracing::warn!(
                "employee {} in record {} overwrites record {}",
                duplicate.id,
                duplicate.replaced_by + 1,
                duplicate.first + 1
            );
        }
        Ok(())
    }

    fn check_orphans(&self) -> Result<(), HierarchyError> {
        for orphan in self.orphans() {
            let Some(manager) = &orphan.manager else {
                continue;
            };
            match self.policy.orphans {
                OrphanPolicy::Fail => {
                    return Err(HierarchyError::DanglingManager {
                        id: orphan.id.clone(),
                        manager: manager.clone(),
                    });
                }
                OrphanPolicy::Drop => tracing::warn!(
                    "dropping employee {} (and their reports): unknown manager {manager}",
                    orphan.id
                ),
                OrphanPolicy::Promote => tracing::info!(
                    "promoting employee {} to root: unknown manager {manager}",
                    orphan.id
                ),
            }
        }
        Ok(())
    }

    /// Resolves the subtree rooted at `root`.
    ///
    /// The walk keeps the chain of unfinished ancestors on an explicit stack;
    /// a node's [`Employee`] is assembled once all its reports are finished.
    fn resolve(&self, root: usize) -> Result<Employee, HierarchyError> {
        let mut visited = HashSet::from([root]);
        let mut ancestors: Vec<Frame> = Vec::new();
        let mut current = Frame::new(root);

        loop {
            if let Some(&child) = self.reports[current.position].get(current.cursor) {
                current.cursor += 1;
                if !visited.insert(child) {
                    return Err(self.cycle_through(child, &ancestors, &current));
                }
                ancestors.push(std::mem::replace(&mut current, Frame::new(child)));
                continue;
            }

            let entry = self.entry(current.position);
            let employee =
                Employee::new(entry.id.clone(), entry.manager.clone(), current.reports);

            match ancestors.pop() {
                Some(mut parent) => {
                    parent.reports.push(employee);
                    current = parent;
                }
                None => return Ok(employee),
            }
        }
    }

    fn cycle_through(
        &self,
        revisited: usize,
        ancestors: &[Frame],
        current: &Frame,
    ) -> HierarchyError {
        let path: Vec<usize> = ancestors
            .iter()
            .chain(std::iter::once(current))
            .map(|frame| frame.position)
            .skip_while(|&position| position != revisited)
            .collect();

        let members = NonEmpty::from_vec(path)
            .unwrap_or_else(|| NonEmpty::new(revisited))
            .map(|position| self.entry(position).id.clone());

        HierarchyError::Cycle { members }
    }
}

#[derive(Debug)]
struct Frame {
    position: usize,
    /// Next report to descend into.
    cursor: usize,
    reports: Vec<Employee>,
}

impl Frame {
    const fn new(position: usize) -> Self {
        Self {
            position,
            cursor: 0,
            reports: Vec::new(),
        }
    }
}

impl fmt::Display for OrphanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Drop => "drop",
            Self::Promote => "promote",
            Self::Fail => "fail",
        })
    }
}

impl FromStr for OrphanPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drop" => Ok(Self::Drop),
            "promote" => Ok(Self::Promote),
            "fail" => Ok(Self::Fail),
            other => Err(format!(
                "unknown orphan policy '{other}' (expected drop, promote or fail)"
            )),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LastWins => "last-wins",
            Self::Fail => "fail",
        })
    }
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last-wins" => Ok(Self::LastWins),
            "fail" => Ok(Self::Fail),
            other => Err(format!(
                "unknown duplicate policy '{other}' (expected last-wins or fail)"
            )),
        }
    }
}
