//! Canonical Name resolution (spec §4.1).
//!
//! A qualified name is a triple `(schema, object[, column])`, with `schema`
//! defaulted to the caller's default-schema token when a statement does not
//! write one explicitly. Comparison keys are always lowercased so that two
//! spellings of the same identifier a user could write resolve to the same
//! tuple; names are derived only from parsed ASTs, never from raw strings.

use scurry_ast::ast::{CreateRoutineStatement, QualifiedName};

/// A resolved `(schema, object)` pair, the unit of comparison used
/// throughout the differ and sequencer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalName {
    /// Schema the object lives in (defaulted if not explicit).
    pub schema: String,
    /// Object name.
    pub name: String,
}

impl CanonicalName {
    /// Builds a canonical name, lowercasing both parts.
    #[must_use]
    pub fn new(schema: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        Self {
            schema: schema.as_ref().to_lowercase(),
            name: name.as_ref().to_lowercase(),
        }
    }

    /// The `"{schema}.{name}"` key used as a Provides/Requires dependency
    /// name and as a map key in the differ's per-kind comparison.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

impl std::fmt::Display for CanonicalName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Resolves a possibly schema-qualified name against a default schema.
#[must_use]
pub fn qualify(name: &QualifiedName, default_schema: &str) -> CanonicalName {
    match &name.schema {
        Some(schema) => CanonicalName::new(schema, &name.name),
        None => CanonicalName::new(default_schema, &name.name),
    }
}

/// Resolves a table name. Identical to [`qualify`]; kept as a distinctly
/// named entry point per §4.1's operation list so callers read as intent
/// (`qualify_table` at a `CREATE TABLE`, `qualify_object` elsewhere).
#[must_use]
pub fn qualify_table(name: &QualifiedName, default_schema: &str) -> CanonicalName {
    qualify(name, default_schema)
}

/// Resolves a non-table, non-routine object name (type, sequence, view,
/// trigger).
#[must_use]
pub fn qualify_object(name: &QualifiedName, default_schema: &str) -> CanonicalName {
    qualify(name, default_schema)
}

/// Resolves a routine's identity key: its qualified name plus the full
/// parameter-type signature, since overloaded routines with the same name
/// are distinct objects (§4.4).
#[must_use]
pub fn qualify_routine(stmt: &CreateRoutineStatement, default_schema: &str) -> CanonicalName {
    let base = qualify(&stmt.name, default_schema);
    CanonicalName::new(base.schema, stmt.signature())
}

/// The column-level key `"{schema}.{table}.{col}"`.
#[must_use]
pub fn column_key(table: &CanonicalName, column: &str) -> String {
    format!("{}.{}.{}", table.schema, table.name, column.to_lowercase())
}

/// The sentinel key representing a schema object itself (as opposed to a
/// member of it), e.g. used by `CREATE SCHEMA`'s Provides set.
#[must_use]
pub fn schema_key(name: &str) -> String {
    format!("schema:{}", name.to_lowercase())
}

/// Yields the keys under which an unqualified expression reference could
/// resolve to `(schema, name)`: the fully-qualified key always, and the bare
/// name additionally when `schema` is the default schema — this is the
/// mechanism that lets an expression writing `area` resolve to
/// `public.area` without the expression walker knowing the default schema
/// at the point the name is collected.
#[must_use]
pub fn provider_keys(schema: &str, name: &str, default_schema: &str) -> Vec<String> {
    let schema = schema.to_lowercase();
    let name = name.to_lowercase();
    let mut keys = vec![format!("{schema}.{name}")];
    if schema == default_schema.to_lowercase() {
        keys.push(name);
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualify_defaults_missing_schema() {
        let name = QualifiedName::bare("users");
        assert_eq!(qualify_table(&name, "public"), CanonicalName::new("public", "users"));
    }

    #[test]
    fn qualify_keeps_explicit_schema() {
        let name = QualifiedName::qualified("billing", "invoices");
        assert_eq!(qualify_table(&name, "public"), CanonicalName::new("billing", "invoices"));
    }

    #[test]
    fn qualify_is_case_insensitive() {
        let a = qualify_table(&QualifiedName::bare("Users"), "Public");
        let b = qualify_table(&QualifiedName::bare("users"), "public");
        assert_eq!(a, b);
    }

    #[test]
    fn provider_keys_includes_bare_name_only_for_default_schema() {
        assert_eq!(
            provider_keys("public", "area", "public"),
            vec!["public.area".to_string(), "area".to_string()]
        );
        assert_eq!(provider_keys("billing", "area", "public"), vec!["billing.area".to_string()]);
    }

    #[test]
    fn schema_key_is_sentinel_prefixed() {
        assert_eq!(schema_key("billing"), "schema:billing");
    }

    #[test]
    fn column_key_format() {
        let table = CanonicalName::new("public", "users");
        assert_eq!(column_key(&table, "Email"), "public.users.email");
    }
}
