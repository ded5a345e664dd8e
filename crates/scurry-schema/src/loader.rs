//! Desired-schema directory loader (spec §6, "Desired-schema source").
//!
//! A directory tree of `*.sql` files (case-insensitive extension). All
//! files are parsed as DDL; any non-DDL statement fails the load with a
//! file-qualified error. The default schema is implicit; an explicit
//! `CREATE SCHEMA` establishes other schemas.

use std::path::{Path, PathBuf};

use scurry_ast::parser::parse_statements;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, SchemaError};
use crate::model::Schema;

/// Loads every `.sql` file under `dir` (recursively, case-insensitive
/// extension match) and merges their statements into one [`Schema`].
///
/// Files are visited in path-sorted order so that, combined with the
/// differ/sequencer's own determinism, the same directory tree always
/// produces the same `Schema`.
pub fn load_desired_schema(dir: &Path, default_schema: &str) -> Result<Schema> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"))
        })
        .collect();
    files.sort();

    let mut statements = Vec::new();
    for path in &files {
        debug!(file = %path.display(), "loading desired-schema file");
        let source = std::fs::read_to_string(path)
            .map_err(|source| SchemaError::Io { path: path.clone(), source })?;
        let parsed = parse_statements(&source).map_err(|source| SchemaError::Parse {
            path: path.clone(),
            source,
        })?;
        statements.extend(parsed);
    }

    Schema::from_statements(statements, default_schema)
        .map_err(|unsupported| SchemaError::Unsupported {
            path: files.last().cloned().unwrap_or_else(|| dir.to_path_buf()),
            message: unsupported.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_multiple_files_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.sql"), "CREATE TABLE posts (id INT8 PRIMARY KEY);").unwrap();
        std::fs::write(dir.path().join("a.sql"), "CREATE TABLE users (id INT8 PRIMARY KEY);").unwrap();

        let schema = load_desired_schema(dir.path(), "public").unwrap();
        assert_eq!(schema.tables.len(), 2);
        // a.sql sorts before b.sql, so users is parsed first.
        assert_eq!(schema.tables[0].ast.name.name, "users");
    }

    #[test]
    fn is_case_insensitive_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("t.SQL")).unwrap();
        writeln!(f, "CREATE TABLE t (id INT8 PRIMARY KEY);").unwrap();

        let schema = load_desired_schema(dir.path(), "public").unwrap();
        assert_eq!(schema.tables.len(), 1);
    }

    #[test]
    fn non_ddl_statement_fails_with_file_qualified_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.sql"), "INSERT INTO users (id) VALUES (1);").unwrap();

        let err = load_desired_schema(dir.path(), "public").unwrap_err();
        assert!(matches!(err, SchemaError::Unsupported { .. }));
    }
}
