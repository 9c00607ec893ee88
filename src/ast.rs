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

//! C5 data types: the tagged statement/expression tree the parser produces.
//!
//! `SPEC_FULL.md` §9 notes that the original's nodes borrow slices of the owning
//! source text; here every node instead owns its own decoded `String` alongside a
//! [`Span`] into the source, per the design note's suggested rendition ("owned string
//! + span indices so that the tree is self-contained and movable") — a `SyntaxTree`
//! is plain data with no lifetime tied to the text it was parsed from.

use crate::error::Span;

/// The trailing-character kind of a table-field rule: validator (`?`), display
/// (`@`), or generator (`!`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Validator,
    Display,
    Generator,
}

/// A single rule token attached to a table field, e.g. `not_null?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub kind: RuleKind,
    pub span: Span,
}

/// One field of a `table` definition: `name(Domain)[: rule rule …]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableField {
    pub name: String,
    pub domain_name: String,
    pub rules: Vec<Rule>,
    pub span: Span,
}

/// A `table <Name> { <field>, … };` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub name: String,
    pub fields: Vec<TableField>,
    pub span: Span,
}

/// Whether a `domain` statement's body is a bare alias, an `&`-joined `Mul`, or a
/// `|`-joined `Add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainVariant {
    Alias,
    Mul,
    Add,
}

/// One field of a `domain` definition's body. `domain_name` is empty for a tagless
/// `Add` case; an `Alias` body carries exactly one field whose `name` is the
/// referent domain's name.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainField {
    pub name: String,
    pub domain_name: String,
    pub span: Span,
}

/// A `domain <Name> := <body>;` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainDefStmt {
    pub name: String,
    pub variant: DomainVariant,
    pub fields: Vec<DomainField>,
    pub span: Span,
}

/// Which pair of brackets a list-form bound operator used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketKind {
    Square,
    Paren,
    Angle,
    Brace,
}

impl BracketKind {
    pub fn open(self) -> char {
        match self {
            BracketKind::Square => '[',
            BracketKind::Paren => '(',
            BracketKind::Angle => '<',
            BracketKind::Brace => '{',
        }
    }

    pub fn close(self) -> char {
        match self {
            BracketKind::Square => ']',
            BracketKind::Paren => ')',
            BracketKind::Angle => '>',
            BracketKind::Brace => '}',
        }
    }
}

/// Which fixed multi-keyword form a [`Expr::BoundOperator`] node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundOperatorKind {
    IfThenElse,
    LetIn,
    Brackets(BracketKind),
}

/// An expression tree node, per `SPEC_FULL.md` §4.5.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name {
        text: String,
        span: Span,
    },
    StrLiteral {
        text: String,
        span: Span,
    },
    CharLiteral {
        value: char,
        span: Span,
    },
    NumLiteral {
        value: i64,
        span: Span,
    },
    Operator {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    BoundOperator {
        kind: BoundOperatorKind,
        parts: Vec<Expr>,
        span: Span,
    },
    /// The root wrapper every parsed expression is enclosed in, so that a
    /// precedence-climbing rewrite has a stable single-child node to mutate through.
    Expression {
        child: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Name { span, .. }
            | Expr::StrLiteral { span, .. }
            | Expr::CharLiteral { span, .. }
            | Expr::NumLiteral { span, .. }
            | Expr::Operator { span, .. }
            | Expr::BoundOperator { span, .. }
            | Expr::Expression { span, .. } => span.clone(),
        }
    }
}

impl std::fmt::Display for Expr {
    /// Canonical rendering: `L:` for literals, `N:` for names, `O:` for operators
    /// (including bound operators, tagged by keyword), arguments parenthesized.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Name { text, .. } => write!(f, "N:{text}"),
            Expr::StrLiteral { text, .. } => write!(f, "L:\"{text}\""),
            Expr::CharLiteral { value, .. } => write!(f, "L:'{value}'"),
            Expr::NumLiteral { value, .. } => write!(f, "L:{value}"),
            Expr::Operator { op, left, right, .. } => write!(f, "O:{op}({left}, {right})"),
            Expr::BoundOperator { kind, parts, .. } => {
                let tag = match kind {
                    BoundOperatorKind::IfThenElse => "if".to_string(),
                    BoundOperatorKind::LetIn => "let".to_string(),
                    BoundOperatorKind::Brackets(b) => format!("{}{}", b.open(), b.close()),
                };
                let args = parts.iter().map(Expr::to_string).collect::<Vec<_>>().join(", ");
                write!(f, "O:{tag}({args})")
            }
            Expr::Expression { child, .. } => write!(f, "{child}"),
        }
    }
}

/// One top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    TableDef(TableDef),
    DomainDef(DomainDefStmt),
    ExpressionStmt(Expr),
}

/// A parsed source text and its sequence of statements.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxTree {
    pub source: String,
    pub statements: Vec<Statement>,
}

impl SyntaxTree {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            statements: Vec::new(),
        }
    }
}
