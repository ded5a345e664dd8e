//! The `Difference` record (spec §3) emitted by the Schema Differ.

use std::collections::HashSet;

use scurry_ast::ast::Statement;

/// Whether a `Difference` represents an object appearing only locally, only
/// remotely, or present on both sides with a different definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifferenceKind {
    /// Present in the desired schema, absent from the live schema.
    Added,
    /// Present in the live schema, absent from the desired schema.
    Removed,
    /// Present in both, with a different definition.
    Modified,
}

/// One discrete, atomically-applicable change produced by the differ.
#[derive(Debug, Clone)]
pub struct Difference {
    /// Added / Removed / Modified.
    pub kind: DifferenceKind,
    /// The canonical key of the object this difference concerns (a table,
    /// column, index, constraint, or other named entity).
    pub object_name: String,
    /// Human-readable summary, used in warning output and logs.
    pub description: String,
    /// Signals potential data loss or locking risk; consumers may gate
    /// execution on user confirmation.
    pub dangerous: bool,
    /// An advisory message surfaced as a `-- WARNING:` comment ahead of this
    /// difference's statements, if any.
    pub warning_message: Option<String>,
    /// Whether this difference's statements implement a drop-then-recreate
    /// of the object (as opposed to an in-place alter).
    pub is_drop_create: bool,
    /// The ordered statements that, applied together, implement this
    /// change. Never empty.
    pub migration_statements: Vec<Statement>,
    /// For a `Removed` difference, the set of dependency keys the dropped
    /// object required — used by the sequencer to order this drop ahead of
    /// drops of those dependencies (§4.5 step 2, §9 "Drop-ordering via
    /// reverse edges"). `None` for `Added`/`Modified` differences.
    pub original_dependencies: Option<HashSet<String>>,
}

impl Difference {
    /// Builds a non-dangerous, non-drop-create difference with no warning
    /// and no recorded dependencies — the common case for `Added`
    /// differences and simple in-place alters.
    #[must_use]
    pub fn new(
        kind: DifferenceKind,
        object_name: impl Into<String>,
        description: impl Into<String>,
        migration_statements: Vec<Statement>,
    ) -> Self {
        Self {
            kind,
            object_name: object_name.into(),
            description: description.into(),
            dangerous: false,
            warning_message: None,
            is_drop_create: false,
            migration_statements,
            original_dependencies: None,
        }
    }

    /// Marks this difference dangerous.
    #[must_use]
    pub const fn dangerous(mut self) -> Self {
        self.dangerous = true;
        self
    }

    /// Marks this difference as a drop-then-recreate.
    #[must_use]
    pub const fn drop_create(mut self) -> Self {
        self.is_drop_create = true;
        self
    }

    /// Attaches an advisory warning message.
    #[must_use]
    pub fn warn(mut self, message: impl Into<String>) -> Self {
        self.warning_message = Some(message.into());
        self
    }

    /// Attaches the set of names the removed object depended on.
    #[must_use]
    pub fn with_original_dependencies(mut self, deps: HashSet<String>) -> Self {
        self.original_dependencies = Some(deps);
        self
    }
}
