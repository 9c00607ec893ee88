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

//! The domain data model: basic kinds, and the three domain shapes (`Basic`, `Array`,
//! `Complex`) a [`crate::registry::Registry`] can hold. Mirrors `SPEC_FULL.md` §3.

use strum::{EnumString, FromRepr};

use crate::registry::DomainIndex;

/// One of the eleven primitive numeric/boolean kinds a `Basic` domain can be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, EnumString)]
#[repr(u8)]
#[allow(non_camel_case_types)]
pub enum BasicKind {
    U8 = 0,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
}

impl BasicKind {
    /// The natural, platform-native byte width of this kind.
    pub fn size(self) -> usize {
        match self {
            BasicKind::U8 | BasicKind::I8 | BasicKind::Bool => 1,
            BasicKind::U16 | BasicKind::I16 => 2,
            BasicKind::U32 | BasicKind::I32 | BasicKind::F32 => 4,
            BasicKind::U64 | BasicKind::I64 | BasicKind::F64 => 8,
        }
    }
}

impl std::fmt::Display for BasicKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BasicKind::U8 => "U8",
            BasicKind::U16 => "U16",
            BasicKind::U32 => "U32",
            BasicKind::U64 => "U64",
            BasicKind::I8 => "I8",
            BasicKind::I16 => "I16",
            BasicKind::I32 => "I32",
            BasicKind::I64 => "I64",
            BasicKind::F32 => "F32",
            BasicKind::F64 => "F64",
            BasicKind::Bool => "Bool",
        };
        write!(f, "{s}")
    }
}

/// Whether a complex domain is a sum (`Add`) or a product (`Mul`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComplexVariant {
    Add,
    Mul,
}

/// One field of a complex domain. `domain` is `None` only for a tagless `Add` case
/// (an enum-like variant with no payload).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub domain: Option<DomainIndex>,
}

impl Field {
    pub fn typed(name: impl Into<String>, domain: DomainIndex) -> Self {
        Self {
            name: name.into(),
            domain: Some(domain),
        }
    }

    pub fn tagless(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: None,
        }
    }
}

/// The shape of a domain: a primitive kind, a fixed-capacity array, or a complex
/// (sum/product) domain over named fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainShape {
    /// A basic kind, or a named alias of one (e.g. `Day -> U8`); aliases carry no
    /// extra data of their own, so they reuse this same variant.
    Basic(BasicKind),
    Array {
        element: DomainIndex,
        capacity: usize,
    },
    Complex {
        variant: ComplexVariant,
        fields: Vec<Field>,
    },
}

/// A named entry in the registry. Domains never reference domains registered after
/// themselves (the registry is append-only and forward references are rejected at
/// registration time), so a `Domain` only ever needs `DomainIndex`es into the same,
/// already-validated prefix of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub name: String,
    pub shape: DomainShape,
}

impl Domain {
    pub fn basic(name: impl Into<String>, kind: BasicKind) -> Self {
        Self {
            name: name.into(),
            shape: DomainShape::Basic(kind),
        }
    }

    pub fn array(name: impl Into<String>, element: DomainIndex, capacity: usize) -> Self {
        Self {
            name: name.into(),
            shape: DomainShape::Array { element, capacity },
        }
    }

    pub fn complex(
        name: impl Into<String>,
        variant: ComplexVariant,
        fields: Vec<Field>,
    ) -> Self {
        Self {
            name: name.into(),
            shape: DomainShape::Complex { variant, fields },
        }
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        match &self.shape {
            DomainShape::Complex { fields, .. } => fields.iter().position(|f| f.name == name),
            _ => None,
        }
    }
}
