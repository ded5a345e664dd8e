//! SQL data type definitions for the CockroachDB DDL subset.

use std::fmt;

/// A data type as it appears in a column definition, `CAST`, or function
/// signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    /// 2-byte integer.
    Smallint,
    /// 4-byte integer.
    Integer,
    /// 8-byte integer.
    Bigint,
    /// 4-byte floating point.
    Real,
    /// 8-byte floating point.
    Double,
    /// Arbitrary-precision decimal.
    Decimal {
        /// Total number of digits.
        precision: Option<u16>,
        /// Number of digits after the decimal point.
        scale: Option<u16>,
    },
    /// Alias family for [`DataType::Decimal`].
    Numeric {
        /// Total number of digits.
        precision: Option<u16>,
        /// Number of digits after the decimal point.
        scale: Option<u16>,
    },
    /// Fixed-length character string.
    Char(Option<u32>),
    /// Variable-length character string (`VARCHAR`/`STRING`).
    Varchar(Option<u32>),
    /// Unbounded text.
    Text,
    /// Variable-length byte string.
    Bytes,
    /// Boolean.
    Boolean,
    /// Calendar date with no time component.
    Date,
    /// Time of day with no date component.
    Time,
    /// Timestamp without time zone.
    Timestamp,
    /// Timestamp with time zone.
    Timestamptz,
    /// UUID.
    Uuid,
    /// JSON stored in a binary, indexable form.
    Jsonb,
    /// IP address/network type.
    Inet,
    /// An array of some element type.
    ///
    /// Per the Expression Dependency Walker's contract, array element types
    /// unwrap to their element's name when collecting dependencies.
    Array(Box<DataType>),
    /// A database-specific or user-defined type referenced by name (e.g. an
    /// enum created with `CREATE TYPE ... AS ENUM`).
    Custom(String),
}

impl DataType {
    /// Renders the canonical single-line SQL spelling of this type.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Smallint => "INT2".to_string(),
            Self::Integer => "INT8".to_string(),
            Self::Bigint => "INT8".to_string(),
            Self::Real => "FLOAT4".to_string(),
            Self::Double => "FLOAT8".to_string(),
            Self::Decimal { precision, scale } => Self::decimal_sql("DECIMAL", *precision, *scale),
            Self::Numeric { precision, scale } => Self::decimal_sql("NUMERIC", *precision, *scale),
            Self::Char(len) => match len {
                Some(n) => format!("CHAR({n})"),
                None => "CHAR".to_string(),
            },
            Self::Varchar(len) => match len {
                Some(n) => format!("VARCHAR({n})"),
                None => "VARCHAR".to_string(),
            },
            Self::Text => "STRING".to_string(),
            Self::Bytes => "BYTES".to_string(),
            Self::Boolean => "BOOL".to_string(),
            Self::Date => "DATE".to_string(),
            Self::Time => "TIME".to_string(),
            Self::Timestamp => "TIMESTAMP".to_string(),
            Self::Timestamptz => "TIMESTAMPTZ".to_string(),
            Self::Uuid => "UUID".to_string(),
            Self::Jsonb => "JSONB".to_string(),
            Self::Inet => "INET".to_string(),
            Self::Array(elem) => format!("{}[]", elem.to_sql()),
            Self::Custom(name) => name.clone(),
        }
    }

    fn decimal_sql(family: &str, precision: Option<u16>, scale: Option<u16>) -> String {
        match (precision, scale) {
            (Some(p), Some(s)) => format!("{family}({p}, {s})"),
            (Some(p), None) => format!("{family}({p})"),
            _ => family.to_string(),
        }
    }

    /// The bare type name used as a dependency key, ignoring array wrapping,
    /// length, and precision/scale — e.g. `Array(Custom("status"))` and
    /// `Custom("status")` both resolve to `"status"`.
    #[must_use]
    pub fn dependency_name(&self) -> Option<&str> {
        match self {
            Self::Array(elem) => elem.dependency_name(),
            Self::Custom(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// The "family" of a type for the purposes of the rewrite-requiring type
    /// change rule (§4.4.1): two types in the same family can sometimes be
    /// widened in place; different families always require a rewrite.
    #[must_use]
    pub fn family(&self) -> TypeFamily {
        match self {
            Self::Smallint | Self::Integer | Self::Bigint => TypeFamily::Int,
            Self::Real | Self::Double => TypeFamily::Float,
            Self::Decimal { .. } | Self::Numeric { .. } => TypeFamily::Decimal,
            Self::Char(_) | Self::Varchar(_) | Self::Text => TypeFamily::String,
            Self::Bytes => TypeFamily::Bytes,
            Self::Boolean => TypeFamily::Boolean,
            Self::Date => TypeFamily::Date,
            Self::Time => TypeFamily::Time,
            Self::Timestamp | Self::Timestamptz => TypeFamily::Timestamp,
            Self::Uuid => TypeFamily::Uuid,
            Self::Jsonb => TypeFamily::Json,
            Self::Inet => TypeFamily::Inet,
            Self::Array(elem) => elem.family(),
            Self::Custom(name) => TypeFamily::Custom(name.clone()),
        }
    }

    /// Returns `true` if going from `self` to `other` is a safe widening
    /// within the same family (no on-disk rewrite needed), per §4.4.1.
    #[must_use]
    pub fn widens_to(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Smallint, Self::Integer | Self::Bigint)
            | (Self::Integer, Self::Bigint)
            | (Self::Real, Self::Double) => true,
            (Self::Char(a) | Self::Varchar(a), Self::Varchar(b) | Self::Char(b)) => match (a, b) {
                (Some(a), Some(b)) => b >= a,
                (_, None) => true,
                (None, Some(_)) => false,
            },
            (Self::Char(_) | Self::Varchar(_), Self::Text) => true,
            (
                Self::Decimal { precision: pa, scale: sa } | Self::Numeric { precision: pa, scale: sa },
                Self::Decimal { precision: pb, scale: sb } | Self::Numeric { precision: pb, scale: sb },
            ) => Self::precision_widens(*pa, *pb) && Self::precision_widens(*sa, *sb),
            _ => false,
        }
    }

    fn precision_widens(a: Option<u16>, b: Option<u16>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => b >= a,
            (_, None) => true,
            (None, Some(_)) => false,
        }
    }
}

/// Broad type family used to decide whether a type change is a safe widen
/// or a rewrite-requiring change (§4.4.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeFamily {
    /// Int
    Int,
    /// Float
    Float,
    /// Decimal/Numeric
    Decimal,
    /// Char/Varchar/Text
    String,
    /// Bytes
    Bytes,
    /// Boolean
    Boolean,
    /// Date
    Date,
    /// Time
    Time,
    /// Timestamp/Timestamptz
    Timestamp,
    /// Uuid
    Uuid,
    /// Jsonb
    Json,
    /// Inet
    Inet,
    /// A user-defined/custom type, distinguished by name.
    Custom(String),
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// A column definition inside `CREATE TABLE`/`ALTER TABLE ADD COLUMN`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Data type.
    pub data_type: DataType,
    /// Whether the column is nullable.
    pub nullable: bool,
    /// Default value expression, if any.
    pub default: Option<super::Expr>,
    /// Whether this column is (part of) the primary key.
    pub primary_key: bool,
    /// Whether this column carries a standalone `UNIQUE` constraint.
    pub unique: bool,
    /// Computed-column expression, if any, and its materialization mode.
    pub computed: Option<ComputedColumn>,
    /// Whether the column is `ON UPDATE`-style generated (rare in CRDB but
    /// modeled for the differ's on-update comparison per §4.4 step 2).
    pub on_update: Option<super::Expr>,
    /// Whether the column is excluded from `SELECT *` (`HIDDEN`, CRDB's
    /// implicit `rowid`-style columns).
    pub hidden: bool,
}

/// A computed column's defining expression and materialization mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedColumn {
    /// The expression computing the column's value.
    pub expr: super::Expr,
    /// Whether the value is persisted (`STORED`) or computed on read
    /// (`VIRTUAL`).
    pub stored: bool,
}

impl ColumnDef {
    /// Creates a new nullable column definition with no default.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            default: None,
            primary_key: false,
            unique: false,
            computed: None,
            on_update: None,
            hidden: false,
        }
    }

    /// Marks the column `NOT NULL`.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column as (part of) the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Marks the column `UNIQUE`.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the column's default expression.
    #[must_use]
    pub fn default(mut self, expr: super::Expr) -> Self {
        self.default = Some(expr);
        self
    }

    /// Sets the column's computed expression and storage mode.
    #[must_use]
    pub fn computed(mut self, expr: super::Expr, stored: bool) -> Self {
        self.computed = Some(ComputedColumn { expr, stored });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_to_sql() {
        assert_eq!(DataType::Integer.to_sql(), "INT8");
        assert_eq!(DataType::Varchar(Some(255)).to_sql(), "VARCHAR(255)");
        assert_eq!(
            DataType::Decimal { precision: Some(10), scale: Some(2) }.to_sql(),
            "DECIMAL(10, 2)"
        );
        assert_eq!(
            DataType::Array(Box::new(DataType::Text)).to_sql(),
            "STRING[]"
        );
    }

    #[test]
    fn array_dependency_name_unwraps_element() {
        let custom = DataType::Custom("status".to_string());
        let arr = DataType::Array(Box::new(custom));
        assert_eq!(arr.dependency_name(), Some("status"));
    }

    #[test]
    fn widening_is_detected_within_family() {
        assert!(DataType::Smallint.widens_to(&DataType::Integer));
        assert!(DataType::Varchar(Some(10)).widens_to(&DataType::Varchar(Some(20))));
        assert!(!DataType::Varchar(Some(20)).widens_to(&DataType::Varchar(Some(10))));
        assert!(!DataType::Integer.widens_to(&DataType::Text));
    }

    #[test]
    fn column_def_builder() {
        let col = ColumnDef::new("id", DataType::Integer).primary_key();
        assert_eq!(col.name, "id");
        assert!(col.primary_key);
        assert!(!col.nullable);
    }
}
