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

//! C1: the domain registry. An append-only arena of [`Domain`]s addressed by a stable
//! [`DomainIndex`], plus the counter helpers ([`counter_size`], [`get_counter`],
//! [`set_counter`]) that every width-adaptive length/tag prefix in C2 is built from.

use std::collections::HashMap;

use crate::domain::{BasicKind, ComplexVariant, Domain, DomainShape, Field};
use crate::error::RegistryError;

/// A stable index into a [`Registry`]. Domains are never removed or reordered, so an
/// index handed out by `add` stays valid for the registry's whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainIndex(pub u32);

impl DomainIndex {
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for DomainIndex {
    fn from(value: usize) -> Self {
        DomainIndex(value as u32)
    }
}

/// A field definition as given to [`Registry::add`]: names are resolved to
/// [`DomainIndex`]es at registration time, so forward references fail immediately
/// with [`RegistryError::UnknownDomainName`] rather than lingering as dangling names.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub domain_name: Option<String>,
}

impl FieldDef {
    pub fn typed(name: impl Into<String>, domain_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain_name: Some(domain_name.into()),
        }
    }

    pub fn tagless(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain_name: None,
        }
    }
}

/// A not-yet-resolved domain definition, as produced by the DDL parser or written by
/// hand. [`Registry::add`] resolves every name it carries against domains already
/// registered.
#[derive(Debug, Clone)]
pub enum DomainDef {
    Basic(BasicKind),
    /// A named alias of another, already-registered domain. Indistinguishable from
    /// its referent at the value level; only the name differs.
    Alias(String),
    Array {
        element_name: String,
        capacity: usize,
    },
    Complex {
        variant: ComplexVariant,
        fields: Vec<FieldDef>,
    },
}

/// The append-only sequence of known domains, shared by reference with every
/// [`crate::value::Value`], [`crate::view::View`], and [`crate::table::Table`] built
/// against it.
#[derive(Debug, Clone)]
pub struct Registry {
    domains: Vec<Domain>,
    by_name: HashMap<String, DomainIndex>,
}

impl Registry {
    /// An empty registry with none of the seeded built-ins. Most callers want
    /// [`Registry::with_builtins`] instead.
    pub fn empty() -> Self {
        Self {
            domains: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// A registry seeded with the built-ins `SPEC_FULL.md` §3 specifies: the eleven
    /// basic kinds, `Key ≡ U64`, the `Month` sum domain, the `Day`/`Year`/`Seconds`/
    /// `Time_Stamp` aliases, the `Date` product domain, and the four `I8`-array
    /// aliases `Str`/`String`/`Text`/`BigText`.
    pub fn with_builtins() -> Self {
        let mut reg = Self::empty();
        reg.seed_builtins()
            .expect("seeded built-in domains must register cleanly");
        reg
    }

    fn seed_builtins(&mut self) -> Result<(), RegistryError> {
        use BasicKind::*;
        for (name, kind) in [
            ("U8", U8),
            ("U16", U16),
            ("U32", U32),
            ("U64", U64),
            ("I8", I8),
            ("I16", I16),
            ("I32", I32),
            ("I64", I64),
            ("F32", F32),
            ("F64", F64),
            ("Bool", Bool),
        ] {
            self.add(name, DomainDef::Basic(kind))?;
        }

        self.add("Key", DomainDef::Alias("U64".into()))?;

        self.add(
            "Month",
            DomainDef::Complex {
                variant: ComplexVariant::Add,
                fields: [
                    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov",
                    "dec",
                ]
                .into_iter()
                .map(FieldDef::tagless)
                .collect(),
            },
        )?;

        self.add("Day", DomainDef::Alias("U8".into()))?;
        self.add("Year", DomainDef::Alias("U16".into()))?;
        self.add("Seconds", DomainDef::Alias("U32".into()))?;
        self.add("Time_Stamp", DomainDef::Alias("U32".into()))?;

        self.add(
            "Date",
            DomainDef::Complex {
                variant: ComplexVariant::Mul,
                fields: vec![
                    FieldDef::typed("day", "Day"),
                    FieldDef::typed("month", "Month"),
                    FieldDef::typed("year", "Year"),
                    FieldDef::typed("time", "Seconds"),
                ],
            },
        )?;

        for (name, capacity) in [("Str", 64), ("String", 255), ("Text", 1024), ("BigText", 65535)]
        {
            self.add(
                name,
                DomainDef::Array {
                    element_name: "I8".into(),
                    capacity,
                },
            )?;
        }

        Ok(())
    }

    /// Append a new domain, resolving every name `def` references against domains
    /// already registered. Returns the new domain's stable index.
    pub fn add(&mut self, name: impl Into<String>, def: DomainDef) -> Result<DomainIndex, RegistryError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(RegistryError::DuplicateDomainName(name));
        }

        let shape = match def {
            DomainDef::Basic(kind) => DomainShape::Basic(kind),
            DomainDef::Alias(referent) => {
                let idx = self.index_of(&referent)?;
                self.get(idx)?.shape.clone()
            }
            DomainDef::Array {
                element_name,
                capacity,
            } => {
                let element = self.index_of(&element_name)?;
                DomainShape::Array { element, capacity }
            }
            DomainDef::Complex { variant, fields } => {
                let mut resolved = Vec::with_capacity(fields.len());
                for field in fields {
                    let domain = match field.domain_name {
                        Some(n) => Some(self.index_of(&n)?),
                        None => None,
                    };
                    resolved.push(Field {
                        name: field.name,
                        domain,
                    });
                }
                DomainShape::Complex {
                    variant,
                    fields: resolved,
                }
            }
        };

        let domain = Domain {
            name: name.clone(),
            shape,
        };
        let index = DomainIndex::from(self.domains.len());
        let size = self.size_of_shape(&domain.shape)?;
        tracing::debug!(name = %name, index = index.0, size, "domain registered");
        self.domains.push(domain);
        self.by_name.insert(name, index);
        Ok(index)
    }

    pub fn index_of(&self, name: &str) -> Result<DomainIndex, RegistryError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| RegistryError::UnknownDomainName(name.to_string()))
    }

    pub fn get(&self, index: DomainIndex) -> Result<&Domain, RegistryError> {
        self.domains
            .get(index.as_usize())
            .ok_or(RegistryError::DomainIndexOutOfRange(index.as_usize()))
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// `size_of(idx)` per `SPEC_FULL.md` §3: deterministic and total over any
    /// already-registered domain.
    pub fn size_of(&self, index: DomainIndex) -> Result<usize, RegistryError> {
        let domain = self.get(index)?;
        self.size_of_shape(&domain.shape)
    }

    fn size_of_shape(&self, shape: &DomainShape) -> Result<usize, RegistryError> {
        match shape {
            DomainShape::Basic(kind) => Ok(kind.size()),
            DomainShape::Array { element, capacity } => {
                let elem_size = self.size_of(*element)?;
                Ok(counter_size(*capacity) + capacity * elem_size)
            }
            DomainShape::Complex {
                variant: ComplexVariant::Mul,
                fields,
            } => {
                let mut total = 0;
                for field in fields {
                    let d = field
                        .domain
                        .ok_or_else(|| RegistryError::InvalidVariantValue(
                            "Mul field must be typed".into(),
                        ))?;
                    total += self.size_of(d)?;
                }
                Ok(total)
            }
            DomainShape::Complex {
                variant: ComplexVariant::Add,
                fields,
            } => {
                let mut max_payload = 0;
                for field in fields {
                    if let Some(d) = field.domain {
                        max_payload = max_payload.max(self.size_of(d)?);
                    }
                }
                Ok(counter_size(fields.len()) + max_payload)
            }
        }
    }

    /// Whether `src` may be assigned into `dst`, per the prefix-compatibility rule of
    /// `SPEC_FULL.md` §3.
    pub fn is_compatible(&self, dst: DomainIndex, src: DomainIndex) -> bool {
        let (Ok(dst_dom), Ok(src_dom)) = (self.get(dst), self.get(src)) else {
            return false;
        };
        self.shapes_compatible(&dst_dom.shape, &src_dom.shape)
    }

    fn shapes_compatible(&self, dst: &DomainShape, src: &DomainShape) -> bool {
        match (dst, src) {
            (DomainShape::Basic(a), DomainShape::Basic(b)) => a == b,
            (
                DomainShape::Array { element: de, .. },
                DomainShape::Array { element: se, .. },
            ) => self.is_compatible(*de, *se),
            (
                DomainShape::Complex {
                    variant: dv,
                    fields: df,
                },
                DomainShape::Complex {
                    variant: sv,
                    fields: sf,
                },
            ) => dv == sv && self.fields_are_prefix(df, sf),
            _ => false,
        }
    }

    fn fields_are_prefix(&self, dst: &[Field], src: &[Field]) -> bool {
        if dst.len() > src.len() {
            return false;
        }
        dst.iter().zip(src.iter()).all(|(d, s)| match (d.domain, s.domain) {
            (None, None) => true,
            (Some(d), Some(s)) => self.is_compatible(d, s),
            _ => false,
        })
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// The byte width (1, 2, or 4) of a counter that must be able to represent any value
/// up to and including `capacity`.
pub fn counter_size(capacity: usize) -> usize {
    if capacity <= 0xFF {
        1
    } else if capacity <= 0xFFFF {
        2
    } else {
        4
    }
}

/// Read an unsigned little-endian counter of `width` bytes from the front of `bytes`.
pub fn get_counter(bytes: &[u8], width: usize) -> usize {
    let mut value = 0usize;
    for (i, byte) in bytes.iter().take(width).enumerate() {
        value |= (*byte as usize) << (8 * i);
    }
    value
}

/// Write `value` as an unsigned little-endian counter of `width` bytes at the front of
/// `bytes`.
pub fn set_counter(bytes: &mut [u8], width: usize, value: usize) {
    for (i, byte) in bytes.iter_mut().take(width).enumerate() {
        *byte = ((value >> (8 * i)) & 0xFF) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0 => 1)]
    #[test_case(0xFF => 1)]
    #[test_case(0x100 => 2)]
    #[test_case(0xFFFF => 2)]
    #[test_case(0x10000 => 4)]
    #[test_case(usize::MAX => 4)]
    fn counter_size_boundaries(capacity: usize) -> usize {
        counter_size(capacity)
    }

    #[test]
    fn counter_roundtrip() {
        let mut buf = [0u8; 4];
        set_counter(&mut buf, 4, 0xDEAD_BEEF);
        assert_eq!(get_counter(&buf, 4), 0xDEAD_BEEF);

        let mut buf2 = [0u8; 2];
        set_counter(&mut buf2, 2, 0xBEEF);
        assert_eq!(get_counter(&buf2, 2), 0xBEEF);
    }

    #[test]
    fn builtins_seed_cleanly() {
        let reg = Registry::with_builtins();
        assert!(reg.index_of("Date").is_ok());
        assert!(reg.index_of("Str").is_ok());
        assert!(reg.index_of("Month").is_ok());
    }

    #[test]
    fn size_of_basic_kinds() {
        let reg = Registry::with_builtins();
        assert_eq!(reg.size_of(reg.index_of("U8").unwrap()).unwrap(), 1);
        assert_eq!(reg.size_of(reg.index_of("U64").unwrap()).unwrap(), 8);
        assert_eq!(reg.size_of(reg.index_of("Bool").unwrap()).unwrap(), 1);
    }

    #[test]
    fn size_of_date_is_sum_of_fields() {
        let reg = Registry::with_builtins();
        // Day(1) + Month(ctr(12)=1) + Year(2) + Seconds(4) = 8
        let date = reg.index_of("Date").unwrap();
        assert_eq!(reg.size_of(date).unwrap(), 1 + 1 + 2 + 4);
    }

    #[test]
    fn size_of_str_array() {
        let reg = Registry::with_builtins();
        let str_idx = reg.index_of("Str").unwrap();
        // ctr(64) = 1, 64 * size_of(I8) = 64
        assert_eq!(reg.size_of(str_idx).unwrap(), 1 + 64);
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut reg = Registry::with_builtins();
        let err = reg.add("U8", DomainDef::Basic(BasicKind::U8)).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateDomainName("U8".into()));
    }

    #[test]
    fn forward_reference_rejected() {
        let mut reg = Registry::empty();
        let err = reg
            .add(
                "Bogus",
                DomainDef::Array {
                    element_name: "Nope".into(),
                    capacity: 4,
                },
            )
            .unwrap_err();
        assert_eq!(err, RegistryError::UnknownDomainName("Nope".into()));
    }

    #[test]
    fn mul_prefix_compatibility() {
        let mut reg = Registry::with_builtins();
        let str_idx = reg.index_of("String").unwrap();
        let u8_idx = reg.index_of("U8").unwrap();
        let person = reg
            .add(
                "Person",
                DomainDef::Complex {
                    variant: ComplexVariant::Mul,
                    fields: vec![
                        FieldDef::typed("name", "String"),
                        FieldDef::typed("age", "U8"),
                    ],
                },
            )
            .unwrap();
        let cs_student = reg
            .add(
                "CS_Student",
                DomainDef::Complex {
                    variant: ComplexVariant::Mul,
                    fields: vec![
                        FieldDef::typed("name", "String"),
                        FieldDef::typed("age", "U8"),
                        FieldDef::typed("fav_lang", "String"),
                    ],
                },
            )
            .unwrap();
        let _ = (str_idx, u8_idx);

        assert!(reg.is_compatible(person, cs_student));
        assert!(!reg.is_compatible(cs_student, person));
    }
}
