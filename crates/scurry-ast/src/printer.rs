//! Canonical single-line and pretty-printed rendering of AST subtrees.
//!
//! The differ and dump writer both need a stable, whitespace-normalized
//! textual form of a subtree to compare or persist (§1: "returning the
//! canonical textual form of any subtree"). [`canonical`] produces that form;
//! [`pretty`] produces a human-readable multi-line form for migration files
//! and dumps meant to be read by a person.

use crate::ast::{
    AlterTableAction, AlterTableStatement, AlterTypeAction, AlterTypeStatement, BinaryOp,
    ColumnDef, CreateIndexStatement, CreateRoutineStatement, CreateSchemaStatement,
    CreateSequenceStatement, CreateTableStatement, CreateTriggerStatement, CreateTypeStatement,
    CreateViewStatement, DropStatement, Expr, InsertStatement, Literal, ObjectKind, QualifiedName,
    Statement, TableConstraint, TriggerEvent, TriggerTiming, UnaryOp, UpdateStatement,
};
use crate::lexer::TokenKind;

/// Renders a single token back to its source spelling. Used to reassemble
/// verbatim text (view/routine bodies, `DROP FUNCTION` signatures) from a
/// captured token slice.
#[must_use]
pub fn render_token(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Integer(n) => n.to_string(),
        TokenKind::Float(f) => f.to_string(),
        TokenKind::String(s) => format!("'{}'", s.replace('\'', "''")),
        TokenKind::DollarQuotedString(s) => format!("${s}$"),
        TokenKind::Identifier(name) => name.clone(),
        TokenKind::Keyword(kw) => kw.as_str().to_string(),
        TokenKind::Plus => "+".to_string(),
        TokenKind::Minus => "-".to_string(),
        TokenKind::Star => "*".to_string(),
        TokenKind::Slash => "/".to_string(),
        TokenKind::Percent => "%".to_string(),
        TokenKind::Eq => "=".to_string(),
        TokenKind::NotEq => "!=".to_string(),
        TokenKind::Lt => "<".to_string(),
        TokenKind::LtEq => "<=".to_string(),
        TokenKind::Gt => ">".to_string(),
        TokenKind::GtEq => ">=".to_string(),
        TokenKind::Concat => "||".to_string(),
        TokenKind::BitAnd => "&".to_string(),
        TokenKind::BitOr => "|".to_string(),
        TokenKind::BitNot => "~".to_string(),
        TokenKind::LeftShift => "<<".to_string(),
        TokenKind::RightShift => ">>".to_string(),
        TokenKind::LeftParen => "(".to_string(),
        TokenKind::RightParen => ")".to_string(),
        TokenKind::LeftBracket => "[".to_string(),
        TokenKind::RightBracket => "]".to_string(),
        TokenKind::Comma => ",".to_string(),
        TokenKind::Semicolon => ";".to_string(),
        TokenKind::Dot => ".".to_string(),
        TokenKind::Colon => ":".to_string(),
        TokenKind::DoubleColon => "::".to_string(),
        TokenKind::Eof => String::new(),
        TokenKind::Error(s) => s.clone(),
    }
}

fn qualified_name(name: &QualifiedName) -> String {
    match &name.schema {
        Some(schema) => format!("{schema}.{}", name.name),
        None => name.name.clone(),
    }
}

/// Renders an expression as a single-line canonical string.
#[must_use]
pub fn canonical_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal(lit) => canonical_literal(lit),
        Expr::Column { table, name, .. } => match table {
            Some(t) => format!("{t}.{name}"),
            None => name.clone(),
        },
        Expr::Binary { left, op, right } => {
            format!("{} {} {}", canonical_expr(left), op.as_str(), canonical_expr(right))
        }
        Expr::Unary { op, operand } => match op {
            UnaryOp::Not => format!("NOT {}", canonical_expr(operand)),
            _ => format!("{}{}", op.as_str(), canonical_expr(operand)),
        },
        Expr::Function(call) => {
            let args = call.args.iter().map(canonical_expr).collect::<Vec<_>>().join(", ");
            match &call.schema {
                Some(schema) => format!("{schema}.{}({args})", call.name),
                None => format!("{}({args})", call.name),
            }
        }
        Expr::IsNull { expr, negated } => {
            format!("{} IS{} NULL", canonical_expr(expr), if *negated { " NOT" } else { "" })
        }
        Expr::In { expr, list, negated } => {
            let items = list.iter().map(canonical_expr).collect::<Vec<_>>().join(", ");
            format!("{} {}IN ({items})", canonical_expr(expr), if *negated { "NOT " } else { "" })
        }
        Expr::Between { expr, low, high, negated } => format!(
            "{} {}BETWEEN {} AND {}",
            canonical_expr(expr),
            if *negated { "NOT " } else { "" },
            canonical_expr(low),
            canonical_expr(high)
        ),
        Expr::Case { operand, when_clauses, else_clause } => {
            let mut parts = vec!["CASE".to_string()];
            if let Some(op) = operand {
                parts.push(canonical_expr(op));
            }
            for (cond, result) in when_clauses {
                parts.push(format!("WHEN {} THEN {}", canonical_expr(cond), canonical_expr(result)));
            }
            if let Some(e) = else_clause {
                parts.push(format!("ELSE {}", canonical_expr(e)));
            }
            parts.push("END".to_string());
            parts.join(" ")
        }
        Expr::Cast { expr, data_type } => format!("{}::{}", canonical_expr(expr), data_type.to_sql()),
        Expr::Paren(inner) => format!("({})", canonical_expr(inner)),
        Expr::Wildcard => "*".to_string(),
    }
}

fn canonical_literal(lit: &Literal) -> String {
    match lit {
        Literal::Integer(n) => n.to_string(),
        Literal::Float(f) => f.to_string(),
        Literal::String(s) => format!("'{}'", s.replace('\'', "''")),
        Literal::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Literal::Null => "NULL".to_string(),
    }
}

fn canonical_column_def(col: &ColumnDef) -> String {
    let mut parts = vec![col.name.clone(), col.data_type.to_sql()];
    if !col.nullable {
        parts.push("NOT NULL".to_string());
    }
    if col.primary_key {
        parts.push("PRIMARY KEY".to_string());
    }
    if col.unique {
        parts.push("UNIQUE".to_string());
    }
    if let Some(default) = &col.default {
        parts.push(format!("DEFAULT {}", canonical_expr(default)));
    }
    if let Some(computed) = &col.computed {
        let mode = if computed.stored { "STORED" } else { "VIRTUAL" };
        parts.push(format!("AS ({}) {mode}", canonical_expr(&computed.expr)));
    }
    parts.join(" ")
}

fn canonical_constraint(c: &TableConstraint) -> String {
    let named = |name: &Option<String>| name.as_ref().map(|n| format!("CONSTRAINT {n} ")).unwrap_or_default();
    match c {
        TableConstraint::PrimaryKey { name, columns } => {
            format!("{}PRIMARY KEY ({})", named(name), columns.join(", "))
        }
        TableConstraint::Unique { name, columns } => {
            format!("{}UNIQUE ({})", named(name), columns.join(", "))
        }
        TableConstraint::ForeignKey { name, columns, ref_table, ref_columns, on_delete, on_update } => {
            let mut s = format!(
                "{}FOREIGN KEY ({}) REFERENCES {}({})",
                named(name),
                columns.join(", "),
                qualified_name(ref_table),
                ref_columns.join(", ")
            );
            if let Some(d) = on_delete {
                s.push_str(&format!(" ON DELETE {d}"));
            }
            if let Some(u) = on_update {
                s.push_str(&format!(" ON UPDATE {u}"));
            }
            s
        }
        TableConstraint::Check { name, expr } => format!("{}CHECK ({})", named(name), canonical_expr(expr)),
    }
}

/// Renders a statement as a single-line canonical string, suitable for
/// content-hashing and exact equality comparison in the schema differ.
#[must_use]
pub fn canonical(stmt: &Statement) -> String {
    match stmt {
        Statement::CreateSchema(s) => canonical_create_schema(s),
        Statement::CreateTable(s) => canonical_create_table(s),
        Statement::CreateType(s) => canonical_create_type(s),
        Statement::CreateSequence(s) => canonical_create_sequence(s),
        Statement::CreateView(s) => canonical_create_view(s),
        Statement::CreateRoutine(s) => canonical_create_routine(s),
        Statement::CreateTrigger(s) => canonical_create_trigger(s),
        Statement::CreateIndex(s) => canonical_create_index(s),
        Statement::AlterTable(s) => canonical_alter_table(s),
        Statement::AlterType(s) => canonical_alter_type(s),
        Statement::Drop(s) => canonical_drop(s),
        Statement::Insert(s) => canonical_insert(s),
        Statement::Update(s) => canonical_update(s),
        Statement::Begin => "BEGIN".to_string(),
        Statement::Commit => "COMMIT".to_string(),
    }
}

fn canonical_create_schema(s: &CreateSchemaStatement) -> String {
    let ine = if s.if_not_exists { "IF NOT EXISTS " } else { "" };
    format!("CREATE SCHEMA {ine}{}", s.name)
}

fn canonical_create_table(s: &CreateTableStatement) -> String {
    let ine = if s.if_not_exists { "IF NOT EXISTS " } else { "" };
    let mut items: Vec<String> = s.columns.iter().map(canonical_column_def).collect();
    items.extend(s.constraints.iter().map(canonical_constraint));
    format!("CREATE TABLE {ine}{} ({})", qualified_name(&s.name), items.join(", "))
}

fn canonical_create_type(s: &CreateTypeStatement) -> String {
    let values = s.values.iter().map(|v| format!("'{v}'")).collect::<Vec<_>>().join(", ");
    format!("CREATE TYPE {} AS ENUM ({values})", qualified_name(&s.name))
}

fn canonical_create_sequence(s: &CreateSequenceStatement) -> String {
    let ine = if s.if_not_exists { "IF NOT EXISTS " } else { "" };
    let mut out = format!("CREATE SEQUENCE {ine}{}", qualified_name(&s.name));
    if let Some(inc) = s.increment {
        out.push_str(&format!(" INCREMENT BY {inc}"));
    }
    if let Some(start) = s.start {
        out.push_str(&format!(" START WITH {start}"));
    }
    if let Some((table, column)) = &s.owned_by {
        out.push_str(&format!(" OWNED BY {}.{column}", qualified_name(table)));
    }
    out
}

fn canonical_create_view(s: &CreateViewStatement) -> String {
    let or_replace = if s.or_replace { "OR REPLACE " } else { "" };
    let materialized = if s.materialized { "MATERIALIZED " } else { "" };
    let cols = if s.columns.is_empty() { String::new() } else { format!(" ({})", s.columns.join(", ")) };
    format!("CREATE {or_replace}{materialized}VIEW {}{cols} AS {}", qualified_name(&s.name), s.query.trim())
}

fn canonical_create_routine(s: &CreateRoutineStatement) -> String {
    let or_replace = if s.or_replace { "OR REPLACE " } else { "" };
    let params = s.params.iter().map(|p| format!("{} {}", p.name, p.data_type.to_sql())).collect::<Vec<_>>().join(", ");
    let returns = s.returns.as_ref().map(|t| format!(" RETURNS {}", t.to_sql())).unwrap_or_default();
    format!(
        "CREATE {or_replace}FUNCTION {}({params}){returns} LANGUAGE {} AS $${}$$",
        qualified_name(&s.name),
        s.language,
        s.body.trim()
    )
}

fn canonical_create_trigger(s: &CreateTriggerStatement) -> String {
    let timing = match s.timing {
        TriggerTiming::Before => "BEFORE",
        TriggerTiming::After => "AFTER",
        TriggerTiming::InsteadOf => "INSTEAD OF",
    };
    let events = s
        .events
        .iter()
        .map(|e| match e {
            TriggerEvent::Insert => "INSERT",
            TriggerEvent::Update => "UPDATE",
            TriggerEvent::Delete => "DELETE",
        })
        .collect::<Vec<_>>()
        .join(" OR ");
    format!(
        "CREATE TRIGGER {} {timing} {events} ON {} EXECUTE FUNCTION {}()",
        s.name,
        qualified_name(&s.table),
        qualified_name(&s.function)
    )
}

fn canonical_create_index(s: &CreateIndexStatement) -> String {
    let unique = if s.unique { "UNIQUE " } else { "" };
    let ine = if s.if_not_exists { "IF NOT EXISTS " } else { "" };
    let cols = s.columns.iter().map(|c| format!("{} {}", c.name, c.direction.as_str())).collect::<Vec<_>>().join(", ");
    let mut out = format!("CREATE {unique}INDEX {ine}{} ON {} ({cols})", s.name, qualified_name(&s.table));
    if !s.storing.is_empty() {
        out.push_str(&format!(" STORING ({})", s.storing.join(", ")));
    }
    if let Some(pred) = &s.where_predicate {
        out.push_str(&format!(" WHERE {}", canonical_expr(pred)));
    }
    out
}

fn canonical_alter_table_action(action: &AlterTableAction) -> String {
    match action {
        AlterTableAction::AddColumn(col) => format!("ADD COLUMN {}", canonical_column_def(col)),
        AlterTableAction::DropColumn { name, restrict } => {
            format!("DROP COLUMN {name}{}", if *restrict { " RESTRICT" } else { "" })
        }
        AlterTableAction::AlterColumnType { name, data_type, using } => {
            let mut s = format!("ALTER COLUMN {name} TYPE {}", data_type.to_sql());
            if let Some(u) = using {
                s.push_str(&format!(" USING {}", canonical_expr(u)));
            }
            s
        }
        AlterTableAction::AlterColumnSetDefault { name, default } => {
            format!("ALTER COLUMN {name} SET DEFAULT {}", canonical_expr(default))
        }
        AlterTableAction::AlterColumnDropDefault { name } => format!("ALTER COLUMN {name} DROP DEFAULT"),
        AlterTableAction::AlterColumnSetNotNull { name } => format!("ALTER COLUMN {name} SET NOT NULL"),
        AlterTableAction::AlterColumnDropNotNull { name } => format!("ALTER COLUMN {name} DROP NOT NULL"),
        AlterTableAction::AddConstraint(c) => format!("ADD {}", canonical_constraint(c)),
        AlterTableAction::DropConstraint { name } => format!("DROP CONSTRAINT {name}"),
        AlterTableAction::RenameColumn { from, to } => format!("RENAME COLUMN {from} TO {to}"),
    }
}

fn canonical_alter_table(s: &AlterTableStatement) -> String {
    let actions = s.actions.iter().map(canonical_alter_table_action).collect::<Vec<_>>().join(", ");
    format!("ALTER TABLE {} {actions}", qualified_name(&s.table))
}

fn canonical_alter_type(s: &AlterTypeStatement) -> String {
    match &s.action {
        AlterTypeAction::AddValue { value, if_not_exists } => {
            let ine = if *if_not_exists { "IF NOT EXISTS " } else { "" };
            format!("ALTER TYPE {} ADD VALUE {ine}'{value}'", qualified_name(&s.name))
        }
        AlterTypeAction::DropValue { value } => format!("ALTER TYPE {} DROP VALUE '{value}'", qualified_name(&s.name)),
    }
}

fn canonical_drop(s: &DropStatement) -> String {
    let kind = match s.kind {
        ObjectKind::Schema => "SCHEMA",
        ObjectKind::Type => "TYPE",
        ObjectKind::Sequence => "SEQUENCE",
        ObjectKind::Table => "TABLE",
        ObjectKind::View => "VIEW",
        ObjectKind::Routine => "FUNCTION",
        ObjectKind::Trigger => "TRIGGER",
        ObjectKind::Index => "INDEX",
    };
    let ie = if s.if_exists { "IF EXISTS " } else { "" };
    let mut target = qualified_name(&s.name);
    if let Some(on_table) = &s.on_table {
        target = format!("{} ON {}", target, qualified_name(on_table));
    }
    if let Some(sig) = &s.signature {
        target = format!("{target}{sig}");
    }
    let cascade = if s.cascade { " CASCADE" } else { " RESTRICT" };
    format!("DROP {kind} {ie}{target}{cascade}")
}

/// Renders an `INSERT` statement as a single-line canonical string, the form
/// the dump writer batches rows into.
#[must_use]
pub fn canonical_insert(s: &InsertStatement) -> String {
    let rows = s
        .rows
        .iter()
        .map(|row| format!("({})", row.iter().map(canonical_expr).collect::<Vec<_>>().join(", ")))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {} ({}) VALUES {rows}", qualified_name(&s.table), s.columns.join(", "))
}

/// Renders an `UPDATE` statement as a single-line canonical string, used by
/// the dump writer's self-referential two-phase insert.
#[must_use]
pub fn canonical_update(s: &UpdateStatement) -> String {
    let assignments = s.assignments.iter().map(|(c, e)| format!("{c} = {}", canonical_expr(e))).collect::<Vec<_>>().join(", ");
    let mut out = format!("UPDATE {} SET {assignments}", qualified_name(&s.table));
    if let Some(w) = &s.where_clause {
        out.push_str(&format!(" WHERE {}", canonical_expr(w)));
    }
    out
}

/// Renders a statement across multiple lines with standard indentation, for
/// migration files and dumps intended to be read by a person.
#[must_use]
pub fn pretty(stmt: &Statement) -> String {
    match stmt {
        Statement::CreateTable(s) => pretty_create_table(s),
        other => canonical(other),
    }
}

fn pretty_create_table(s: &CreateTableStatement) -> String {
    let ine = if s.if_not_exists { "IF NOT EXISTS " } else { "" };
    let mut lines = vec![format!("CREATE TABLE {ine}{} (", qualified_name(&s.name))];
    let mut items: Vec<String> = s.columns.iter().map(canonical_column_def).collect();
    items.extend(s.constraints.iter().map(canonical_constraint));
    let last = items.len().saturating_sub(1);
    for (i, item) in items.iter().enumerate() {
        let comma = if i == last { "" } else { "," };
        lines.push(format!("    {item}{comma}"));
    }
    lines.push(")".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_statement;

    #[test]
    fn canonical_round_trips_simple_table() {
        let stmt = parse_statement("CREATE TABLE users (id INT8 NOT NULL PRIMARY KEY)").unwrap();
        assert_eq!(canonical(&stmt), "CREATE TABLE users (id INT8 NOT NULL PRIMARY KEY)");
    }

    #[test]
    fn pretty_indents_each_column() {
        let stmt = parse_statement("CREATE TABLE t (a INT8, b STRING)").unwrap();
        let rendered = pretty(&stmt);
        assert!(rendered.contains("    a INT8"));
        assert!(rendered.contains("    b STRING"));
    }

    #[test]
    fn canonical_expr_renders_cast() {
        let stmt = parse_statement("CREATE TABLE t (x INT8 DEFAULT (1)::INT8)").unwrap();
        let text = canonical(&stmt);
        assert!(text.contains("DEFAULT (1)::INT8"));
    }

    #[test]
    fn canonical_drop_includes_cascade() {
        let stmt = parse_statement("DROP TABLE IF EXISTS users CASCADE").unwrap();
        assert_eq!(canonical(&stmt), "DROP TABLE IF EXISTS users CASCADE");
    }
}
