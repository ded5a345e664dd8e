//! Abstract syntax tree types for the CockroachDB DDL subset.

mod expression;
mod statement;
mod types;

pub use expression::{BinaryOp, Expr, FunctionCall, Literal, UnaryOp};
pub use statement::{
    AlterTableAction, AlterTableStatement, AlterTypeAction, AlterTypeStatement,
    CreateIndexStatement, CreateRoutineStatement, CreateSchemaStatement,
    CreateSequenceStatement, CreateTableStatement, CreateTriggerStatement, CreateTypeStatement,
    CreateViewStatement, DropStatement, ForEach, IndexColumn, InsertStatement, ObjectKind,
    OrderDirection, QualifiedName, RoutineParam, Statement, TableConstraint, TriggerEvent,
    TriggerTiming, UpdateStatement, Volatility,
};
pub use types::{ColumnDef, ComputedColumn, DataType, TypeFamily};
