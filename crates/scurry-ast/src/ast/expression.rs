//! Expression AST types used in `DEFAULT`, computed-column, and `CHECK`
//! clauses, and in dump `INSERT`/`UPDATE` statement values.

use super::DataType;
use crate::lexer::Span;

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer literal.
    Integer(i64),
    /// Float literal.
    Float(f64),
    /// String literal.
    String(String),
    /// Boolean literal.
    Boolean(bool),
    /// `NULL` literal.
    Null,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `=`
    Eq,
    /// `!=`/`<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `||`
    Concat,
    /// `LIKE`
    Like,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `<<`
    LeftShift,
    /// `>>`
    RightShift,
}

impl BinaryOp {
    /// The SQL spelling of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Concat => "||",
            Self::Like => "LIKE",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::LeftShift => "<<",
            Self::RightShift => ">>",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Logical `NOT`.
    Not,
    /// Bitwise `~`.
    BitNot,
}

impl UnaryOp {
    /// The SQL spelling of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "NOT",
            Self::BitNot => "~",
        }
    }
}

/// A function call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// Schema qualifier, if the call was schema-qualified.
    pub schema: Option<String>,
    /// The function name.
    pub name: String,
    /// The arguments.
    pub args: Vec<Expr>,
}

/// An expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value.
    Literal(Literal),

    /// A column/name reference, optionally qualified with up to two levels
    /// (`schema.table.col` appears as nested qualifiers collapsed into
    /// `table`/`name` with `schema` folded into `table` by the parser, per
    /// the name resolver's qualification contract).
    Column {
        /// Table/object qualifier, if present.
        table: Option<String>,
        /// Column/name.
        name: String,
        /// Source span.
        span: Span,
    },

    /// A binary expression.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
    },

    /// A unary expression.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },

    /// A function call.
    Function(FunctionCall),

    /// `IS [NOT] NULL`.
    IsNull {
        /// Operand.
        expr: Box<Expr>,
        /// Whether this is `IS NOT NULL`.
        negated: bool,
    },

    /// `[NOT] IN (...)`.
    In {
        /// Operand.
        expr: Box<Expr>,
        /// The candidate list.
        list: Vec<Expr>,
        /// Whether this is `NOT IN`.
        negated: bool,
    },

    /// `[NOT] BETWEEN ... AND ...`.
    Between {
        /// Operand.
        expr: Box<Expr>,
        /// Lower bound.
        low: Box<Expr>,
        /// Upper bound.
        high: Box<Expr>,
        /// Whether this is `NOT BETWEEN`.
        negated: bool,
    },

    /// `CASE [operand] WHEN ... THEN ... [ELSE ...] END`.
    Case {
        /// Optional case operand (simple form).
        operand: Option<Box<Expr>>,
        /// `WHEN`/`THEN` pairs.
        when_clauses: Vec<(Expr, Expr)>,
        /// `ELSE` clause.
        else_clause: Option<Box<Expr>>,
    },

    /// `CAST(expr AS type)` / `expr::type`.
    Cast {
        /// Expression being cast.
        expr: Box<Expr>,
        /// Target type.
        data_type: DataType,
    },

    /// A parenthesized expression, preserved so printers can round-trip
    /// explicit grouping.
    Paren(Box<Expr>),

    /// `*` wildcard (only meaningful in dump `SELECT`-shaped contexts).
    Wildcard,
}

impl Expr {
    /// Creates an unqualified column reference.
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column {
            table: None,
            name: name.into(),
            span: Span::default(),
        }
    }

    /// Creates a table-qualified column reference.
    #[must_use]
    pub fn qualified_column(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Column {
            table: Some(table.into()),
            name: name.into(),
            span: Span::default(),
        }
    }

    /// Creates an integer literal.
    #[must_use]
    pub const fn integer(value: i64) -> Self {
        Self::Literal(Literal::Integer(value))
    }

    /// Creates a string literal.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(Literal::String(value.into()))
    }

    /// Creates a `NULL` literal.
    #[must_use]
    pub const fn null() -> Self {
        Self::Literal(Literal::Null)
    }

    /// Creates a binary expression.
    #[must_use]
    pub fn binary(self, op: BinaryOp, right: Self) -> Self {
        Self::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expr_builders() {
        let col = Expr::column("name");
        assert!(matches!(col, Expr::Column { name, .. } if name == "name"));
        assert!(matches!(Expr::integer(42), Expr::Literal(Literal::Integer(42))));
    }

    #[test]
    fn binary_chaining() {
        let expr = Expr::column("quantity").binary(BinaryOp::Sub, Expr::column("committed"));
        assert!(matches!(expr, Expr::Binary { op: BinaryOp::Sub, .. }));
    }
}
