//! Recursive-descent DDL parser and its supporting Pratt expression tables.

mod ddl;
mod error;
mod pratt;

pub use ddl::{parse_statement, parse_statements, Parser};
pub use error::ParseError;
pub use pratt::{infix_binding_power, prefix_binding_power, token_to_binary_op, token_to_unary_op};
