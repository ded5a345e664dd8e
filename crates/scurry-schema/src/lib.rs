//! Canonical Name resolution (§4.1) and the `Schema`/`ObjectSchema[T]` data
//! model (§3), loaded either from a desired-schema directory of `.sql`
//! files (§6) or built in-memory from ASTs obtained via database
//! introspection (done by `scurry-db`, which depends on this crate).

pub mod error;
mod loader;
mod model;
pub mod name;

pub use error::{Result, SchemaError};
pub use loader::load_desired_schema;
pub use model::{ObjectSchema, Schema, UnsupportedStatement};
pub use name::{column_key, provider_keys, qualify_object, qualify_routine, qualify_table, schema_key, CanonicalName};

use scurry_ast::ast::Statement;

/// The statement-kind label used in "unsupported statement" error messages.
pub(crate) fn canonical_kind(stmt: &Statement) -> &'static str {
    match stmt {
        Statement::CreateSchema(_) => "CreateSchema",
        Statement::CreateTable(_) => "CreateTable",
        Statement::CreateType(_) => "CreateType",
        Statement::CreateSequence(_) => "CreateSequence",
        Statement::CreateView(_) => "CreateView",
        Statement::CreateRoutine(_) => "CreateRoutine",
        Statement::CreateTrigger(_) => "CreateTrigger",
        Statement::CreateIndex(_) => "CreateIndex",
        Statement::AlterTable(_) => "AlterTable",
        Statement::AlterType(_) => "AlterType",
        Statement::Drop(_) => "Drop",
        Statement::Insert(_) => "Insert",
        Statement::Update(_) => "Update",
        Statement::Begin => "Begin",
        Statement::Commit => "Commit",
    }
}
