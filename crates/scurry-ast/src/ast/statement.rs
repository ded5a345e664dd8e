//! DDL statement AST.
//!
//! This covers the CockroachDB DDL subset the rest of the workspace needs:
//! schema/type/sequence/table/view/routine/trigger/index
//! `CREATE`/`ALTER`/`DROP`, transaction-boundary pseudo-statements, and the
//! `INSERT`/`UPDATE` shapes a data dump replays. It intentionally does not
//! parse `SELECT` query bodies into a tree — view/routine bodies are kept as
//! verbatim text, consistent with "no general SQL engine" being out of
//! scope.

use super::{ColumnDef, DataType, Expr};

/// A name, optionally schema-qualified, as written by the user (not yet
/// passed through name resolution).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    /// Explicit schema qualifier, if written.
    pub schema: Option<String>,
    /// Object name.
    pub name: String,
}

impl QualifiedName {
    /// Creates an unqualified name.
    #[must_use]
    pub fn bare(name: impl Into<String>) -> Self {
        Self { schema: None, name: name.into() }
    }

    /// Creates a schema-qualified name.
    #[must_use]
    pub fn qualified(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self { schema: Some(schema.into()), name: name.into() }
    }
}

/// Sort direction for an index column or `ORDER BY` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// `ASC`
    Asc,
    /// `DESC`
    Desc,
}

impl OrderDirection {
    /// SQL spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// The kind of object a `CREATE`/`DROP`/`ALTER` statement targets. Used as
/// the discriminant in the Provides/Requires extractor and by the differ to
/// key per-object-kind comparison maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// `CREATE SCHEMA`
    Schema,
    /// `CREATE TYPE`
    Type,
    /// `CREATE SEQUENCE`
    Sequence,
    /// `CREATE TABLE`
    Table,
    /// `CREATE VIEW`
    View,
    /// `CREATE FUNCTION`/`PROCEDURE`
    Routine,
    /// `CREATE TRIGGER`
    Trigger,
    /// `CREATE INDEX`
    Index,
}

/// A table-level constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum TableConstraint {
    /// `PRIMARY KEY (cols)`
    PrimaryKey {
        /// Constraint name, if explicit (defaults to `{table}_pkey`).
        name: Option<String>,
        /// Key columns, in order.
        columns: Vec<String>,
    },
    /// `UNIQUE (cols)`. CockroachDB backs this with a unique index, which is
    /// why the differ models unique-constraint add/drop as index add/drop.
    Unique {
        /// Constraint name.
        name: Option<String>,
        /// Key columns, in order.
        columns: Vec<String>,
    },
    /// `FOREIGN KEY (cols) REFERENCES target(ref_cols)`
    ForeignKey {
        /// Constraint name.
        name: Option<String>,
        /// Local columns.
        columns: Vec<String>,
        /// Referenced table.
        ref_table: QualifiedName,
        /// Referenced columns.
        ref_columns: Vec<String>,
        /// `ON DELETE` action, if any (`CASCADE`/`RESTRICT`/...).
        on_delete: Option<String>,
        /// `ON UPDATE` action, if any.
        on_update: Option<String>,
    },
    /// `CHECK (expr)`
    Check {
        /// Constraint name.
        name: Option<String>,
        /// The boolean expression.
        expr: Expr,
    },
}

impl TableConstraint {
    /// The constraint's name, if one was given explicitly.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::PrimaryKey { name, .. }
            | Self::Unique { name, .. }
            | Self::ForeignKey { name, .. }
            | Self::Check { name, .. } => name.as_deref(),
        }
    }
}

/// One key column in an index, with its ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexColumn {
    /// Column name.
    pub name: String,
    /// Sort direction.
    pub direction: OrderDirection,
}

/// `CREATE SCHEMA`
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSchemaStatement {
    /// Schema name.
    pub name: String,
    /// `IF NOT EXISTS`
    pub if_not_exists: bool,
}

/// `CREATE TABLE`
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    /// Table name.
    pub name: QualifiedName,
    /// `IF NOT EXISTS`
    pub if_not_exists: bool,
    /// Column definitions, in declaration order.
    pub columns: Vec<ColumnDef>,
    /// Table-level constraints.
    pub constraints: Vec<TableConstraint>,
}

/// `CREATE TYPE ... AS ENUM (...)`
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTypeStatement {
    /// Type name.
    pub name: QualifiedName,
    /// Enum labels, in declaration order (order is significant for enums:
    /// it determines default sort order).
    pub values: Vec<String>,
}

/// `CREATE SEQUENCE`
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSequenceStatement {
    /// Sequence name.
    pub name: QualifiedName,
    /// `IF NOT EXISTS`
    pub if_not_exists: bool,
    /// `INCREMENT BY`, if specified.
    pub increment: Option<i64>,
    /// `START WITH`, if specified.
    pub start: Option<i64>,
    /// `OWNED BY table.column`, if specified.
    pub owned_by: Option<(QualifiedName, String)>,
}

/// `CREATE [OR REPLACE] [MATERIALIZED] VIEW`
#[derive(Debug, Clone, PartialEq)]
pub struct CreateViewStatement {
    /// View name.
    pub name: QualifiedName,
    /// `OR REPLACE`
    pub or_replace: bool,
    /// `MATERIALIZED`
    pub materialized: bool,
    /// Explicit column name list, if given.
    pub columns: Vec<String>,
    /// The defining query, kept verbatim (not parsed into a tree — see
    /// module docs).
    pub query: String,
}

/// Function/procedure volatility, used by the planner and carried through
/// for diffing and pretty-printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Volatility {
    /// `IMMUTABLE`
    Immutable,
    /// `STABLE`
    Stable,
    /// `VOLATILE`
    Volatile,
}

/// A single routine parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineParam {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    pub data_type: DataType,
}

/// `CREATE [OR REPLACE] FUNCTION`/`PROCEDURE`
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRoutineStatement {
    /// Routine name.
    pub name: QualifiedName,
    /// `OR REPLACE`
    pub or_replace: bool,
    /// Parameters, in order; together with the name this forms the
    /// routine's identity key (overloads are distinct objects, per §4.4).
    pub params: Vec<RoutineParam>,
    /// Return type (absent for `PROCEDURE`).
    pub returns: Option<DataType>,
    /// `LANGUAGE` clause, e.g. `plpgsql`, `sql`.
    pub language: String,
    /// Declared volatility.
    pub volatility: Volatility,
    /// Body text, verbatim, from the dollar-quoted or single-quoted string.
    pub body: String,
}

impl CreateRoutineStatement {
    /// The full signature string used as the identity key for overloaded
    /// routines: `name(type1, type2, ...)`.
    #[must_use]
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| p.data_type.to_sql())
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({params})", self.name.name)
    }
}

/// When a trigger fires relative to the triggering event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTiming {
    /// `BEFORE`
    Before,
    /// `AFTER`
    After,
    /// `INSTEAD OF`
    InsteadOf,
}

/// What kind of DML event fires a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    /// `INSERT`
    Insert,
    /// `UPDATE`
    Update,
    /// `DELETE`
    Delete,
}

/// `FOR EACH ROW` vs `FOR EACH STATEMENT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForEach {
    /// `ROW`
    Row,
    /// `STATEMENT`
    Statement,
}

/// `CREATE TRIGGER`
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTriggerStatement {
    /// Trigger name.
    pub name: String,
    /// Table the trigger is attached to.
    pub table: QualifiedName,
    /// Firing timing.
    pub timing: TriggerTiming,
    /// Firing events (e.g. `BEFORE INSERT OR UPDATE`).
    pub events: Vec<TriggerEvent>,
    /// Row vs statement granularity.
    pub for_each: ForEach,
    /// The function invoked by the trigger.
    pub function: QualifiedName,
}

/// `CREATE [UNIQUE] INDEX`
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexStatement {
    /// Index name.
    pub name: String,
    /// Table the index is defined on.
    pub table: QualifiedName,
    /// `UNIQUE`
    pub unique: bool,
    /// `IF NOT EXISTS`
    pub if_not_exists: bool,
    /// `CONCURRENTLY`
    pub concurrently: bool,
    /// Key columns, in order.
    pub columns: Vec<IndexColumn>,
    /// `STORING (cols)`
    pub storing: Vec<String>,
    /// Partial-index predicate, if any.
    pub where_predicate: Option<Expr>,
}

/// One `ALTER TABLE` sub-action. A single `ALTER TABLE` statement may carry
/// several of these; the differ emits the minimal set for a given column or
/// constraint change in one statement (§4.4 step 2).
#[derive(Debug, Clone, PartialEq)]
pub enum AlterTableAction {
    /// `ADD COLUMN`
    AddColumn(ColumnDef),
    /// `DROP COLUMN ... RESTRICT`
    DropColumn {
        /// Column name.
        name: String,
        /// Whether `RESTRICT` was specified (the differ always emits this).
        restrict: bool,
    },
    /// `ALTER COLUMN ... TYPE ...`
    AlterColumnType {
        /// Column name.
        name: String,
        /// New type.
        data_type: DataType,
        /// `USING` expression, if a cast is not implicit.
        using: Option<Expr>,
    },
    /// `ALTER COLUMN ... SET DEFAULT ...`
    AlterColumnSetDefault {
        /// Column name.
        name: String,
        /// New default expression.
        default: Expr,
    },
    /// `ALTER COLUMN ... DROP DEFAULT`
    AlterColumnDropDefault {
        /// Column name.
        name: String,
    },
    /// `ALTER COLUMN ... SET NOT NULL`
    AlterColumnSetNotNull {
        /// Column name.
        name: String,
    },
    /// `ALTER COLUMN ... DROP NOT NULL`
    AlterColumnDropNotNull {
        /// Column name.
        name: String,
    },
    /// `ADD CONSTRAINT`
    AddConstraint(TableConstraint),
    /// `DROP CONSTRAINT`
    DropConstraint {
        /// Constraint name.
        name: String,
    },
    /// `RENAME COLUMN ... TO ...`
    RenameColumn {
        /// Old name.
        from: String,
        /// New name.
        to: String,
    },
}

/// `ALTER TABLE`
#[derive(Debug, Clone, PartialEq)]
pub struct AlterTableStatement {
    /// Table being altered.
    pub table: QualifiedName,
    /// Sub-actions, applied together as one statement.
    pub actions: Vec<AlterTableAction>,
}

/// One `ALTER TYPE` action on an enum.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterTypeAction {
    /// `ADD VALUE 'v'`
    AddValue {
        /// The label being added.
        value: String,
        /// `IF NOT EXISTS`
        if_not_exists: bool,
    },
    /// `DROP VALUE 'v'` (CRDB-specific; not standard Postgres).
    DropValue {
        /// The label being removed.
        value: String,
    },
}

/// `ALTER TYPE`
#[derive(Debug, Clone, PartialEq)]
pub struct AlterTypeStatement {
    /// Type being altered.
    pub name: QualifiedName,
    /// The single action carried by this statement (the differ emits one
    /// `ALTER TYPE` per changed value, per the enum-diff-minimality
    /// property).
    pub action: AlterTypeAction,
}

/// `DROP { SCHEMA | TYPE | SEQUENCE | TABLE | VIEW | FUNCTION | TRIGGER | INDEX }`
#[derive(Debug, Clone, PartialEq)]
pub struct DropStatement {
    /// What kind of object is being dropped.
    pub kind: ObjectKind,
    /// The object's name.
    pub name: QualifiedName,
    /// For routines: the parenthesized parameter-type list disambiguating
    /// an overload, verbatim.
    pub signature: Option<String>,
    /// For a trigger or index, the table it is attached to/defined on (not
    /// all dropped objects carry one).
    pub on_table: Option<QualifiedName>,
    /// `IF EXISTS`
    pub if_exists: bool,
    /// Whether `CASCADE` was specified (the differ always emits `RESTRICT`
    /// except where §4.4's unique-constraint-as-index rule requires
    /// `CASCADE`).
    pub cascade: bool,
}

/// `INSERT INTO table (cols) VALUES (...), (...), ...`
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    /// Target table.
    pub table: QualifiedName,
    /// Column list.
    pub columns: Vec<String>,
    /// One row of values per entry.
    pub rows: Vec<Vec<Expr>>,
}

/// `UPDATE table SET col = expr, ... WHERE ...`
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    /// Target table.
    pub table: QualifiedName,
    /// Column assignments, in order.
    pub assignments: Vec<(String, Expr)>,
    /// `WHERE` predicate.
    pub where_clause: Option<Expr>,
}

/// A single parsed DDL, DML (dump-replay only), or transaction-boundary
/// statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `CREATE SCHEMA`
    CreateSchema(CreateSchemaStatement),
    /// `CREATE TABLE`
    CreateTable(CreateTableStatement),
    /// `CREATE TYPE ... AS ENUM`
    CreateType(CreateTypeStatement),
    /// `CREATE SEQUENCE`
    CreateSequence(CreateSequenceStatement),
    /// `CREATE VIEW`
    CreateView(CreateViewStatement),
    /// `CREATE FUNCTION`/`PROCEDURE`
    CreateRoutine(CreateRoutineStatement),
    /// `CREATE TRIGGER`
    CreateTrigger(CreateTriggerStatement),
    /// `CREATE INDEX`
    CreateIndex(CreateIndexStatement),
    /// `ALTER TABLE`
    AlterTable(AlterTableStatement),
    /// `ALTER TYPE`
    AlterType(AlterTypeStatement),
    /// `DROP ...`
    Drop(DropStatement),
    /// `INSERT ...` (dump replay)
    Insert(InsertStatement),
    /// `UPDATE ...` (dump replay)
    Update(UpdateStatement),
    /// `BEGIN` transaction-boundary pseudo-statement.
    Begin,
    /// `COMMIT` transaction-boundary pseudo-statement.
    Commit,
}

impl Statement {
    /// The object kind this statement creates/drops/alters, if any — `None`
    /// for `INSERT`/`UPDATE`/transaction markers.
    #[must_use]
    pub const fn object_kind(&self) -> Option<ObjectKind> {
        match self {
            Self::CreateSchema(_) => Some(ObjectKind::Schema),
            Self::CreateTable(_) | Self::AlterTable(_) => Some(ObjectKind::Table),
            Self::CreateType(_) | Self::AlterType(_) => Some(ObjectKind::Type),
            Self::CreateSequence(_) => Some(ObjectKind::Sequence),
            Self::CreateView(_) => Some(ObjectKind::View),
            Self::CreateRoutine(_) => Some(ObjectKind::Routine),
            Self::CreateTrigger(_) => Some(ObjectKind::Trigger),
            Self::CreateIndex(_) => Some(ObjectKind::Index),
            Self::Drop(d) => Some(d.kind),
            Self::Insert(_) | Self::Update(_) | Self::Begin | Self::Commit => None,
        }
    }

    /// True for the `BEGIN`/`COMMIT` pseudo-statements the sequencer uses as
    /// transaction-boundary markers (§9).
    #[must_use]
    pub const fn is_transaction_marker(&self) -> bool {
        matches!(self, Self::Begin | Self::Commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routine_signature_includes_param_types() {
        let stmt = CreateRoutineStatement {
            name: QualifiedName::bare("area"),
            or_replace: false,
            params: vec![RoutineParam { name: "r".into(), data_type: DataType::Double }],
            returns: Some(DataType::Double),
            language: "sql".into(),
            volatility: Volatility::Immutable,
            body: "SELECT 3.14 * r * r".into(),
        };
        assert_eq!(stmt.signature(), "area(FLOAT8)");
    }

    #[test]
    fn transaction_markers_carry_no_object_kind() {
        assert!(Statement::Begin.is_transaction_marker());
        assert!(Statement::Commit.is_transaction_marker());
        assert_eq!(Statement::Begin.object_kind(), None);
    }
}
