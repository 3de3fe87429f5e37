use super::Identifier;

/// One (employee, manager) pair from the flat input.
///
/// A `manager` of `None` marks the employee as the root of a reporting tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// The employee this record describes.
    pub id: Identifier,
    /// The employee's direct superior, if any.
    pub manager: Option<Identifier>,
}

impl Relation {
    /// Creates a relation for an employee reporting to `manager`.
    #[must_use]
    pub const fn new(id: Identifier, manager: Identifier) -> Self {
        Self {
            id,
            manager: Some(manager),
        }
    }

    /// Creates a relation for an employee with no manager.
    #[must_use]
    pub const fn root(id: Identifier) -> Self {
        Self { id, manager: None }
    }

    /// Whether this record describes a root.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.manager.is_none()
    }
}
