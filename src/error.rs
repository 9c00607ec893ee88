// Copyright (C) 2026 the toad-db authors
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.

//! Error taxonomy for the domain engine, its views, tables, and the DDL/expression
//! parser. Each family gets its own `thiserror`-derived enum per the component that
//! raises it; nothing here is fatal, nothing is swallowed by callers in this crate.

use std::ops::Range;
use thiserror::Error;

use crate::domain::BasicKind;

/// Errors raised while resolving names/indices against a [`crate::registry::Registry`]
/// or while registering a new domain.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown domain name `{0}`")]
    UnknownDomainName(String),

    #[error("domain index {0} is out of range")]
    DomainIndexOutOfRange(usize),

    #[error("a domain named `{0}` is already registered")]
    DuplicateDomainName(String),

    #[error("internal invariant violated: {0}")]
    InvalidVariantValue(String),
}

/// Errors raised by [`crate::view::View`] operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("{0}")]
    Registry(#[from] RegistryError),

    #[error("cannot unwrap domain `{domain}` as basic kind {expected:?}, it is {actual:?}")]
    UnwrapInvalidVariant {
        domain: String,
        expected: BasicKind,
        /// `None` when `domain` is not a `Basic` domain at all.
        actual: Option<BasicKind>,
    },

    #[error("domain `{0}` is not a complex (Add/Mul) domain")]
    NotComplexVariant(String),

    #[error("domain `{0}` is not an Add domain")]
    NotAddVariant(String),

    #[error("domain `{0}` is not an Array domain")]
    NotArrayVariant(String),

    #[error("domain `{domain}` has no field named `{field}`")]
    DomainHasNoSuchField { domain: String, field: String },

    #[error("domain `{domain}` has {field_count} fields, index {index} is out of range")]
    FieldIndexOutOfRange {
        domain: String,
        index: usize,
        field_count: usize,
    },

    #[error("array index {index} is out of range for length {length}")]
    ArrayIndexOutOfRange { index: usize, length: usize },

    #[error("array length {requested} exceeds capacity {capacity}")]
    ArrayLengthOutOfBounds { requested: usize, capacity: usize },

    #[error("pop from an empty array")]
    PopFromEmptyArray,

    #[error("cannot assign domain `{src}` into incompatible domain `{dst}`")]
    AssignIncompatibleDomains { dst: String, src: String },
}

/// Errors raised by [`crate::table::Table`] construction, insertion, and row access.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("failed to insert row: {cause}")]
    FailedToInsertRow {
        #[source]
        cause: ViewError,
    },

    #[error("table has {expected} columns, {actual} values were given")]
    ColumnCountMismatch { expected: usize, actual: usize },

    #[error("row index {index} is out of range for {len} rows")]
    RowIndexOutOfRange { index: usize, len: usize },

    #[error("{0}")]
    Registry(#[from] RegistryError),
}

/// A source span, as a half-open byte range into the owning `SyntaxTree`'s text.
pub type Span = Range<usize>;

/// Errors raised by the DDL/expression parser. Every variant carries the span that was
/// being parsed when the expectation failed, so callers can render [`error_help`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("expected a table name after `table`")]
    ExpectedTableName,

    #[error("expected `{0}`")]
    ExpectedChar(char),

    #[error("expected a field name")]
    ExpectedFieldName,

    #[error("expected a domain name for this table field")]
    ExpectedTableFieldDomainName,

    #[error("expected a rule name")]
    ExpectedTableFieldRuleName,

    #[error("expected a rule type (one of `?`, `@`, `!`)")]
    ExpectedTableFieldRuleType,

    #[error("expected a domain name after `domain`")]
    ExpectedDomainName,

    #[error("expected `:=` after the domain name")]
    ExpectedDomainWalrus,

    #[error("expected at least one field")]
    ExpectFields,

    #[error("expected a left operand")]
    ExpectedLeftOperand,

    #[error("expected a right operand")]
    ExpectedRightOperand,

    #[error("unexpected call expression")]
    UnexpectedCall,

    #[error("expected an expression between bound-operator keywords")]
    ExpectedBoundOperatorNodeExpr,
}

/// A parse failure: what went wrong, and where in the source it happened.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Render a multi-line, caret-underlined diagnostic pointing at this error's span
    /// within `source`. This is the library's only user-facing formatting beyond
    /// [`crate::view::View`]'s `to_string`.
    pub fn error_help(&self, source: &str) -> String {
        crate::lexer::error_help(source, self.span.clone(), &self.kind.to_string())
    }
}
