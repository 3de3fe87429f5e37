//! In-memory reporting trees
//!
//! An [`Employee`] owns its direct reports, so a root [`Employee`] owns its
//! whole tree. A [`Forest`] is the ordered collection of root trees produced
//! by [`Hierarchy::build`](crate::Hierarchy::build).

use super::Identifier;

/// One employee and, recursively, everyone reporting to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    id: Identifier,
    manager: Option<Identifier>,
    direct_reports: Vec<Employee>,
}

impl Employee {
    /// Creates an employee with the given direct reports.
    #[must_use]
    pub const fn new(
        id: Identifier,
        manager: Option<Identifier>,
        direct_reports: Vec<Self>,
    ) -> Self {
        Self {
            id,
            manager,
            direct_reports,
        }
    }

    /// The employee's identifier.
    #[must_use]
    pub const fn id(&self) -> &Identifier {
        &self.id
    }

    /// The employee's manager, `None` for a root.
    #[must_use]
    pub const fn manager(&self) -> Option<&Identifier> {
        self.manager.as_ref()
    }

    /// The employee's direct reports, in index order.
    #[must_use]
    pub fn direct_reports(&self) -> &[Self] {
        &self.direct_reports
    }

    /// Whether nobody reports to this employee.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.direct_reports.is_empty()
    }

    /// Number of employees in this subtree, including this one.
    #[must_use]
    pub fn headcount(&self) -> usize {
        self.iter().count()
    }

    /// Number of levels in this subtree; a leaf has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((employee, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(employee.direct_reports.iter().map(|report| (report, level + 1)));
        }
        deepest
    }

    /// Depth-first, pre-order iterator over this subtree.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }
}

/// The ordered collection of root trees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forest {
    roots: Vec<Employee>,
}

impl Forest {
    /// Creates a forest from fully resolved roots.
    #[must_use]
    pub const fn new(roots: Vec<Employee>) -> Self {
        Self { roots }
    }

    /// The root employees, in root order.
    #[must_use]
    pub fn roots(&self) -> &[Employee] {
        &self.roots
    }

    /// Total number of employees across all trees.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether the forest has no trees.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of levels in the deepest tree; zero for an empty forest.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.roots.iter().map(Employee::depth).max().unwrap_or(0)
    }

    /// Depth-first, pre-order iterator over every tree in root order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: self.roots.iter().rev().collect(),
        }
    }

    /// Finds an employee anywhere in the forest.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Employee> {
        self.iter().find(|employee| employee.id.as_str() == id)
    }
}

impl<'a> IntoIterator for &'a Forest {
    type Item = &'a Employee;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Depth-first, pre-order iterator over employees.
#[derive(Debug)]
pub struct Iter<'a> {
    stack: Vec<&'a Employee>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Employee;

    fn next(&mut self) -> Option<Self::Item> {
        let employee = self.stack.pop()?;
        self.stack.extend(employee.direct_reports.iter().rev());
        Some(employee)
    }
}

// Dropping a deeply nested chain recursively can exhaust the stack.
impl Drop for Employee {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.direct_reports);
        while let Some(mut employee) = pending.pop() {
            pending.append(&mut employee.direct_reports);
        }
    }
}
