//! Dump parser (§4.7): the inverse of [`crate::writer::write`].
//!
//! Every failure is reported as a [`crate::error::DumpError::Parse`]
//! carrying the one-based line number where the problem was found, per §7's
//! "Parse error" contract.

use chrono::{DateTime, Utc};
use scurry_schema::CanonicalName;

use crate::error::{DumpError, Result};
use crate::model::{DumpFile, SequenceValue, TableDump};
use crate::writer::HEADER_MARKER;

struct Lines<'a> {
    lines: std::str::Lines<'a>,
    /// One-based number of the line most recently returned by `next`.
    current: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self { lines: text.lines(), current: 0 }
    }

    fn next(&mut self) -> Option<&'a str> {
        let line = self.lines.next();
        if line.is_some() {
            self.current += 1;
        }
        line
    }

    fn peek_line_number(&self) -> usize {
        self.current + 1
    }

    fn err(&self, message: impl Into<String>) -> DumpError {
        DumpError::Parse { line: self.peek_line_number(), message: message.into() }
    }

    fn expect_prefixed(&mut self, prefix: &str) -> Result<String> {
        let Some(line) = self.next() else {
            return Err(self.err(format!("expected a line starting with `{prefix}`, found end of file")));
        };
        line.strip_prefix(prefix)
            .map(str::to_string)
            .ok_or_else(|| DumpError::Parse { line: self.current, message: format!("expected a line starting with `{prefix}`, found `{line}`") })
    }

    fn skip_blank(&mut self) {
        loop {
            let mut clone = self.lines.clone();
            match clone.next() {
                Some(l) if l.trim().is_empty() => {
                    self.lines = clone;
                    self.current += 1;
                }
                _ => break,
            }
        }
    }
}

fn parse_canonical_name(text: &str) -> Option<CanonicalName> {
    let (schema, name) = text.split_once('.')?;
    Some(CanonicalName::new(schema, name))
}

/// Collects every line up to (but not including) `-- END SCHEMA`, joined
/// with `\n` to reconstruct the schema text exactly.
fn read_schema_block(lines: &mut Lines<'_>) -> Result<String> {
    let mut body = Vec::new();
    loop {
        let Some(line) = lines.next() else {
            return Err(lines.err("unterminated schema block, expected `-- END SCHEMA`"));
        };
        if line == "-- END SCHEMA" {
            break;
        }
        body.push(line);
    }
    Ok(body.join("\n"))
}

/// Collects consecutive non-blank lines into one statement per blank-line
/// delimited group, stopping (without consuming) at the next `-- ` section
/// marker or end of file. Internal newlines inside a statement are
/// preserved by joining with `\n`.
fn read_statements_until_section(lines: &mut Lines<'_>) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    loop {
        let mut clone = lines.lines.clone();
        match clone.next() {
            None => break,
            Some(line) if line.starts_with("-- Table: ") || line.starts_with("-- Sequence: ") => break,
            Some(line) if line.trim().is_empty() => {
                lines.lines = clone;
                lines.current += 1;
                if !current.is_empty() {
                    statements.push(current.join("\n"));
                    current.clear();
                }
            }
            Some(line) => {
                lines.lines = clone;
                lines.current += 1;
                current.push(line);
            }
        }
    }
    if !current.is_empty() {
        statements.push(current.join("\n"));
    }
    statements
}

/// Extracts the value argument from a `SELECT setval('name', value);` line,
/// without a general SQL parse — it looks for the last comma before the
/// closing paren.
fn parse_setval_value(lines: &mut Lines<'_>, line: &str) -> Result<i64> {
    let open = line.find('(').ok_or_else(|| lines.err("malformed setval statement, missing `(`"))?;
    let close = line.rfind(')').ok_or_else(|| lines.err("malformed setval statement, missing `)`"))?;
    let inner = &line[open + 1..close];
    let comma = inner.rfind(',').ok_or_else(|| lines.err("malformed setval statement, missing value argument"))?;
    inner[comma + 1..]
        .trim()
        .parse()
        .map_err(|_| lines.err("malformed setval statement, value is not an integer"))
}

/// Parses `text` (the content of a dump file) into a [`DumpFile`].
pub fn parse(text: &str) -> Result<DumpFile> {
    let mut lines = Lines::new(text);

    let marker = lines.next().ok_or_else(|| lines.err("empty dump file"))?;
    if marker != HEADER_MARKER {
        return Err(DumpError::Parse { line: 1, message: format!("expected header `{HEADER_MARKER}`, found `{marker}`") });
    }

    let version: u32 = lines
        .expect_prefixed("-- version: ")?
        .trim()
        .parse()
        .map_err(|_| DumpError::Parse { line: lines.current, message: "malformed version line".to_string() })?;

    let created_at_text = lines.expect_prefixed("-- created_at: ")?;
    let created_at: DateTime<Utc> = created_at_text
        .trim()
        .parse()
        .map_err(|e| DumpError::Parse { line: lines.current, message: format!("malformed created_at: {e}") })?;

    let tables_csv = lines.expect_prefixed("-- tables: ")?;
    let tables: Vec<CanonicalName> = tables_csv
        .trim()
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| parse_canonical_name(s).ok_or_else(|| DumpError::Parse { line: lines.current, message: format!("malformed table name `{s}`") }))
        .collect::<Result<_>>()?;

    lines.skip_blank();
    let begin = lines.next().ok_or_else(|| lines.err("expected `-- BEGIN SCHEMA`, found end of file"))?;
    if begin != "-- BEGIN SCHEMA" {
        return Err(DumpError::Parse { line: lines.current, message: format!("expected `-- BEGIN SCHEMA`, found `{begin}`") });
    }
    let schema_sql = read_schema_block(&mut lines)?;

    let mut table_data = Vec::new();
    let mut sequences = Vec::new();

    loop {
        lines.skip_blank();
        let Some(line) = lines.next() else { break };
        if let Some(rest) = line.strip_prefix("-- Table: ") {
            let (name_text, count_text) = rest
                .split_once(" (")
                .ok_or_else(|| DumpError::Parse { line: lines.current, message: format!("malformed table section header `{line}`") })?;
            let name = parse_canonical_name(name_text)
                .ok_or_else(|| DumpError::Parse { line: lines.current, message: format!("malformed table name `{name_text}`") })?;
            let row_count: usize = count_text
                .trim_end_matches(" rows)")
                .parse()
                .map_err(|_| DumpError::Parse { line: lines.current, message: format!("malformed row count in `{line}`") })?;
            let statements = read_statements_until_section(&mut lines);
            table_data.push(TableDump { name, row_count, statements });
        } else if let Some(name_text) = line.strip_prefix("-- Sequence: ") {
            let name = parse_canonical_name(name_text)
                .ok_or_else(|| DumpError::Parse { line: lines.current, message: format!("malformed sequence name `{name_text}`") })?;
            let setval_line = lines.next().ok_or_else(|| lines.err("expected a setval statement, found end of file"))?;
            let value = parse_setval_value(&mut lines, setval_line)?;
            sequences.push(SequenceValue { name, value });
        } else {
            return Err(DumpError::Parse { line: lines.current, message: format!("expected `-- Table: ` or `-- Sequence: `, found `{line}`") });
        }
    }

    Ok(DumpFile { version, created_at, tables, schema_sql, table_data, sequences })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::write;
    use chrono::TimeZone;

    fn sample() -> DumpFile {
        DumpFile {
            version: 1,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            tables: vec![CanonicalName::new("public", "users")],
            schema_sql: "CREATE TABLE public.users (id INT8 NOT NULL PRIMARY KEY);".to_string(),
            table_data: vec![TableDump {
                name: CanonicalName::new("public", "users"),
                row_count: 2,
                statements: vec![
                    "INSERT INTO public.users (id) VALUES (1)".to_string(),
                    "INSERT INTO public.users (id) VALUES (2)".to_string(),
                ],
            }],
            sequences: vec![SequenceValue { name: CanonicalName::new("public", "users_id_seq"), value: 3 }],
        }
    }

    #[test]
    fn round_trips_through_write_then_parse() {
        let dump = sample();
        let text = write(&dump);
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed, dump);
    }

    #[test]
    fn rejects_wrong_header_marker() {
        let err = parse("-- not-a-dump\n").unwrap_err();
        assert!(matches!(err, DumpError::Parse { line: 1, .. }));
    }

    #[test]
    fn rejects_missing_begin_schema() {
        let text = "-- scurry:data-dump\n-- version: 1\n-- created_at: 2026-01-01T00:00:00Z\n-- tables: public.users\n\n-- not begin\n";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, DumpError::Parse { .. }));
    }

    #[test]
    fn preserves_internal_newlines_in_a_statement() {
        let text = "-- scurry:data-dump\n-- version: 1\n-- created_at: 2026-01-01T00:00:00Z\n-- tables: public.users\n\n-- BEGIN SCHEMA\n-- END SCHEMA\n\n-- Table: public.users (1 rows)\nINSERT INTO public.users (id, note)\nVALUES (1, 'a')\n";
        let parsed = parse(text).unwrap();
        assert_eq!(parsed.table_data[0].statements[0], "INSERT INTO public.users (id, note)\nVALUES (1, 'a')");
    }
}
