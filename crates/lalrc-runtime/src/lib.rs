//! Runtime support for parse tables generated by `lalrc`.
//!
//! The generated artifact is a [`PackedTable`], which is expanded into a
//! [`ParserTable`] with O(1) lookup. The [`parser`] module drives that table
//! over a token stream.

pub mod action;
pub mod pack;
pub mod parser;
pub mod resolver;
pub mod table;

pub use crate::{
    action::ParseAction,
    pack::{PackedValues, UnpackError},
    resolver::{ConflictResolver, Line, Lookahead},
    table::{PackedTable, ParserTable},
};
