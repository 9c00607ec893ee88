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

//! C2's non-owning half: [`View`], a cheap-to-copy `(registry, domain, byte_pointer)`
//! cursor that performs every read, write, navigation, assignment, and rendering
//! operation the domain engine supports. This is the only module that touches raw
//! bytes.
//!
//! A `View` borrows a raw, possibly-interior pointer into a [`crate::value::Value`] or
//! a [`crate::table::Table`] row, rather than a Rust slice: field and array navigation
//! both need to hand out further `View`s into disjoint (but sometimes statically
//! unprovable) sub-regions of the same buffer, which a single `&mut [u8]` borrow
//! cannot be split into without reborrowing machinery heavier than this crate's scope.
//! Every public entry point re-validates bounds before it dereferences, so the
//! `unsafe` stays an internal implementation detail (`SPEC_FULL.md` §4.2, "Memory
//! safety rendition").

use std::marker::PhantomData;
use std::ptr::NonNull;

use itertools::Itertools;

use crate::domain::{BasicKind, ComplexVariant, DomainShape, Field};
use crate::error::ViewError;
use crate::registry::{counter_size, get_counter, set_counter, DomainIndex, Registry};
use crate::scalar::BasicValue;

/// A non-owning, `Copy` cursor into a byte buffer, typed by a domain. See the module
/// documentation for why the backing pointer is raw rather than a Rust slice.
pub struct View<'a> {
    registry: &'a Registry,
    domain: DomainIndex,
    ptr: NonNull<u8>,
    len: usize,
    _marker: PhantomData<&'a mut [u8]>,
}

impl<'a> Clone for View<'a> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a> Copy for View<'a> {}

impl<'a> View<'a> {
    /// # Safety
    /// `ptr` must be non-null and point to at least `len` bytes, valid and
    /// exclusively accessible through this view for the duration of `'a`.
    pub unsafe fn from_raw(registry: &'a Registry, domain: DomainIndex, ptr: *mut u8, len: usize) -> Self {
        Self {
            registry,
            domain,
            ptr: NonNull::new(ptr).expect("view pointer must not be null"),
            len,
            _marker: PhantomData,
        }
    }

    pub fn domain(self) -> DomainIndex {
        self.domain
    }

    pub fn registry(self) -> &'a Registry {
        self.registry
    }

    pub fn byte_len(self) -> usize {
        self.len
    }

    fn as_slice(self) -> &'a [u8] {
        // SAFETY: see struct invariant.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[allow(clippy::mut_from_ref)]
    fn as_slice_mut(self) -> &'a mut [u8] {
        // SAFETY: see struct invariant.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    fn domain_name(self) -> String {
        self.registry
            .get(self.domain)
            .map(|d| d.name.clone())
            .unwrap_or_else(|_| format!("<domain {}>", self.domain.as_usize()))
    }

    fn sub_view(self, domain: DomainIndex, offset: usize, size: usize) -> View<'a> {
        // SAFETY: callers only compute `offset`/`size` from this domain's own
        // validated layout, so `offset + size <= self.len`.
        unsafe { View::from_raw(self.registry, domain, self.ptr.as_ptr().add(offset), size) }
    }

    // -- basic read/write -------------------------------------------------------

    pub fn unwrap_basic<T: BasicValue>(self) -> Result<T, ViewError> {
        let domain = self.registry.get(self.domain)?;
        match &domain.shape {
            DomainShape::Basic(kind) if *kind == T::KIND => {
                Ok(unsafe { T::read_le(self.ptr.as_ptr()) })
            }
            DomainShape::Basic(kind) => Err(ViewError::UnwrapInvalidVariant {
                domain: domain.name.clone(),
                expected: T::KIND,
                actual: Some(*kind),
            }),
            _ => Err(ViewError::UnwrapInvalidVariant {
                domain: domain.name.clone(),
                expected: T::KIND,
                actual: None,
            }),
        }
    }

    pub fn set_basic<T: BasicValue>(self, value: T) -> Result<(), ViewError> {
        let domain = self.registry.get(self.domain)?;
        match &domain.shape {
            DomainShape::Basic(kind) if *kind == T::KIND => {
                unsafe { value.write_le(self.ptr.as_ptr()) };
                Ok(())
            }
            DomainShape::Basic(kind) => Err(ViewError::UnwrapInvalidVariant {
                domain: domain.name.clone(),
                expected: T::KIND,
                actual: Some(*kind),
            }),
            _ => Err(ViewError::UnwrapInvalidVariant {
                domain: domain.name.clone(),
                expected: T::KIND,
                actual: None,
            }),
        }
    }

    // -- field navigation ---------------------------------------------------------

    /// `view[name]` for a `Mul` or `Add` domain. Selecting an `Add` field also
    /// transitions the variant tag to that field's index.
    pub fn field(self, name: &str) -> Result<View<'a>, ViewError> {
        let domain = self.registry.get(self.domain)?;
        let DomainShape::Complex { variant, fields } = &domain.shape else {
            return Err(ViewError::NotComplexVariant(domain.name.clone()));
        };
        let index = fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| ViewError::DomainHasNoSuchField {
                domain: domain.name.clone(),
                field: name.to_string(),
            })?;
        match variant {
            ComplexVariant::Mul => self.mul_field_at(fields, index),
            ComplexVariant::Add => self.select_add_variant(fields, index),
        }
    }

    /// `view[i]` by position: resolves through the field list for complex domains,
    /// or to element access for arrays.
    pub fn at(self, index: usize) -> Result<View<'a>, ViewError> {
        let domain = self.registry.get(self.domain)?;
        match &domain.shape {
            DomainShape::Array { .. } => self.array_get(index),
            DomainShape::Complex {
                variant: ComplexVariant::Mul,
                fields,
            } => self.mul_field_at(fields, index),
            DomainShape::Complex {
                variant: ComplexVariant::Add,
                fields,
            } => self.select_add_variant(fields, index),
            DomainShape::Basic(_) => Err(ViewError::NotComplexVariant(domain.name.clone())),
        }
    }

    fn mul_field_at(self, fields: &[Field], index: usize) -> Result<View<'a>, ViewError> {
        if index >= fields.len() {
            return Err(ViewError::FieldIndexOutOfRange {
                domain: self.domain_name(),
                index,
                field_count: fields.len(),
            });
        }
        let mut offset = 0;
        for field in &fields[..index] {
            let d = field.domain.expect("Mul fields are always typed");
            offset += self.registry.size_of(d)?;
        }
        let field_domain = fields[index]
            .domain
            .expect("Mul fields are always typed");
        let size = self.registry.size_of(field_domain)?;
        Ok(self.sub_view(field_domain, offset, size))
    }

    fn select_add_variant(self, fields: &[Field], index: usize) -> Result<View<'a>, ViewError> {
        if index >= fields.len() {
            return Err(ViewError::FieldIndexOutOfRange {
                domain: self.domain_name(),
                index,
                field_count: fields.len(),
            });
        }
        let tag_width = counter_size(fields.len());
        set_counter(self.as_slice_mut(), tag_width, index);
        match fields[index].domain {
            Some(d) => {
                let size = self.registry.size_of(d)?;
                Ok(self.sub_view(d, tag_width, size))
            }
            // Tagless case: no payload to navigate into; the tag write above is the
            // whole effect of the selection.
            None => Ok(self.sub_view(self.domain, tag_width, 0)),
        }
    }

    /// The currently selected variant's field index. Fails if this view's domain is
    /// not an `Add` domain.
    pub fn get_variant(self) -> Result<usize, ViewError> {
        let domain = self.registry.get(self.domain)?;
        match &domain.shape {
            DomainShape::Complex {
                variant: ComplexVariant::Add,
                fields,
            } => Ok(get_counter(self.as_slice(), counter_size(fields.len()))),
            _ => Err(ViewError::NotAddVariant(domain.name.clone())),
        }
    }

    // -- array operations -----------------------------------------------------

    fn array_parts(self) -> Result<(DomainIndex, usize, usize), ViewError> {
        let domain = self.registry.get(self.domain)?;
        match &domain.shape {
            DomainShape::Array { element, capacity } => {
                Ok((*element, *capacity, counter_size(*capacity)))
            }
            _ => Err(ViewError::NotArrayVariant(domain.name.clone())),
        }
    }

    pub fn length(self) -> Result<usize, ViewError> {
        let (_, _, width) = self.array_parts()?;
        Ok(get_counter(self.as_slice(), width))
    }

    pub fn capacity(self) -> Result<usize, ViewError> {
        let (_, capacity, _) = self.array_parts()?;
        Ok(capacity)
    }

    pub fn set_length(self, n: usize) -> Result<(), ViewError> {
        let (_, capacity, width) = self.array_parts()?;
        if n > capacity {
            return Err(ViewError::ArrayLengthOutOfBounds {
                requested: n,
                capacity,
            });
        }
        set_counter(self.as_slice_mut(), width, n);
        Ok(())
    }

    fn array_element_at(self, element: DomainIndex, width: usize, index: usize) -> Result<View<'a>, ViewError> {
        let elem_size = self.registry.size_of(element)?;
        Ok(self.sub_view(element, width + index * elem_size, elem_size))
    }

    pub fn array_get(self, index: usize) -> Result<View<'a>, ViewError> {
        let (element, _, width) = self.array_parts()?;
        let len = get_counter(self.as_slice(), width);
        if index >= len {
            return Err(ViewError::ArrayIndexOutOfRange { index, length: len });
        }
        self.array_element_at(element, width, index)
    }

    pub fn push_basic<T: BasicValue>(self, value: T) -> Result<(), ViewError> {
        let (element, capacity, width) = self.array_parts()?;
        let len = get_counter(self.as_slice(), width);
        if len >= capacity {
            return Err(ViewError::ArrayLengthOutOfBounds {
                requested: len + 1,
                capacity,
            });
        }
        let slot = self.array_element_at(element, width, len)?;
        slot.set_basic(value)?;
        set_counter(self.as_slice_mut(), width, len + 1);
        Ok(())
    }

    pub fn push(self, src: View<'_>) -> Result<(), ViewError> {
        let (element, capacity, width) = self.array_parts()?;
        if !self.registry.is_compatible(element, src.domain) {
            return Err(ViewError::AssignIncompatibleDomains {
                dst: self.registry.get(element)?.name.clone(),
                src: src.domain_name(),
            });
        }
        let len = get_counter(self.as_slice(), width);
        if len >= capacity {
            return Err(ViewError::ArrayLengthOutOfBounds {
                requested: len + 1,
                capacity,
            });
        }
        let slot = self.array_element_at(element, width, len)?;
        slot.assign(src)?;
        set_counter(self.as_slice_mut(), width, len + 1);
        Ok(())
    }

    pub fn pop(self) -> Result<(), ViewError> {
        let (_, _, width) = self.array_parts()?;
        let len = get_counter(self.as_slice(), width);
        if len == 0 {
            return Err(ViewError::PopFromEmptyArray);
        }
        set_counter(self.as_slice_mut(), width, len - 1);
        Ok(())
    }

    // -- assignment ---------------------------------------------------------------

    /// `dst.assign(src)` per `SPEC_FULL.md` §4.2. `Mul` assignment is sequential,
    /// field by field, and may abort partway through on an incompatible nested field;
    /// callers sensitive to partial writes should assign into a scratch `Value` first.
    pub fn assign(self, src: View<'_>) -> Result<(), ViewError> {
        if !self.registry.is_compatible(self.domain, src.domain) {
            return Err(ViewError::AssignIncompatibleDomains {
                dst: self.domain_name(),
                src: src.domain_name(),
            });
        }
        let domain = self.registry.get(self.domain)?;
        match &domain.shape {
            DomainShape::Basic(_) => {
                let n = self.len.min(src.len);
                self.as_slice_mut()[..n].copy_from_slice(&src.as_slice()[..n]);
                Ok(())
            }
            DomainShape::Array { element, capacity } => {
                let width = counter_size(*capacity);
                let src_len = src.length()?;
                if src_len > *capacity {
                    return Err(ViewError::ArrayLengthOutOfBounds {
                        requested: src_len,
                        capacity: *capacity,
                    });
                }
                set_counter(self.as_slice_mut(), width, src_len);
                for i in 0..src_len {
                    let src_elem = src.array_get(i)?;
                    let dst_elem = self.array_element_at(*element, width, i)?;
                    dst_elem.assign(src_elem)?;
                }
                Ok(())
            }
            DomainShape::Complex {
                variant: ComplexVariant::Add,
                fields,
            } => {
                let width = counter_size(fields.len());
                let tag = src.get_variant()?;
                if tag >= fields.len() {
                    return Err(ViewError::AssignIncompatibleDomains {
                        dst: domain.name.clone(),
                        src: src.domain_name(),
                    });
                }
                set_counter(self.as_slice_mut(), width, tag);
                match fields[tag].domain {
                    Some(d) => {
                        let size = self.registry.size_of(d)?;
                        let src_domain = src.registry.get(src.domain)?;
                        let DomainShape::Complex {
                            fields: src_fields, ..
                        } = &src_domain.shape
                        else {
                            unreachable!("is_compatible guarantees both sides are Complex");
                        };
                        let src_width = counter_size(src_fields.len());
                        let dst_payload = self.sub_view(d, width, size);
                        let src_payload = src.sub_view(d, src_width, size);
                        dst_payload.assign(src_payload)
                    }
                    None => Ok(()),
                }
            }
            DomainShape::Complex {
                variant: ComplexVariant::Mul,
                fields,
            } => {
                let src_domain = src.registry.get(src.domain)?;
                let DomainShape::Complex {
                    fields: src_fields, ..
                } = &src_domain.shape
                else {
                    unreachable!("is_compatible guarantees both sides are Complex");
                };
                let mut dst_offset = 0;
                let mut src_offset = 0;
                for (i, field) in fields.iter().enumerate() {
                    let dd = field.domain.expect("Mul fields are always typed");
                    let sd = src_fields[i].domain.expect("Mul fields are always typed");
                    let dst_size = self.registry.size_of(dd)?;
                    let src_size = src.registry.size_of(sd)?;
                    let dst_view = self.sub_view(dd, dst_offset, dst_size);
                    let src_view = src.sub_view(sd, src_offset, src_size);
                    dst_view.assign(src_view)?;
                    dst_offset += dst_size;
                    src_offset += src_size;
                }
                Ok(())
            }
        }
    }

    // -- rendering ------------------------------------------------------------

    /// Canonical textual form, per `SPEC_FULL.md` §4.2. Used by this view's `Display`
    /// impl; exposed directly so callers can distinguish a render failure (only
    /// possible against a corrupted/foreign registry) from `Display`'s infallible
    /// fallback text.
    pub fn render(self) -> Result<String, ViewError> {
        let domain = self.registry.get(self.domain)?;
        match &domain.shape {
            DomainShape::Basic(kind) => Ok(format!("{}({})", domain.name, self.render_basic(*kind)?)),
            DomainShape::Array { capacity, .. } => {
                let len = self.length()?;
                let items = (0..len)
                    .map(|i| self.array_get(i).and_then(View::render))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!(
                    "{} {}:{} [ {} ]",
                    domain.name,
                    capacity,
                    len,
                    items.iter().join(", ")
                ))
            }
            DomainShape::Complex {
                variant: ComplexVariant::Mul,
                fields,
            } => {
                let mut parts = Vec::with_capacity(fields.len());
                for (i, field) in fields.iter().enumerate() {
                    let value = self.mul_field_at(fields, i)?.render()?;
                    parts.push(format!("{}: {}", field.name, value));
                }
                Ok(format!("{} {{ {}, }}", domain.name, parts.join(", ")))
            }
            DomainShape::Complex {
                variant: ComplexVariant::Add,
                fields,
            } => {
                let width = counter_size(fields.len());
                let tag = get_counter(self.as_slice(), width);
                let field = fields.get(tag).ok_or_else(|| ViewError::FieldIndexOutOfRange {
                    domain: domain.name.clone(),
                    index: tag,
                    field_count: fields.len(),
                })?;
                match field.domain {
                    Some(d) => {
                        let size = self.registry.size_of(d)?;
                        let payload = self.sub_view(d, width, size).render()?;
                        Ok(format!("{}::{}({})", domain.name, field.name, payload))
                    }
                    None => Ok(format!("{}::{}", domain.name, field.name)),
                }
            }
        }
    }

    fn render_basic(self, kind: BasicKind) -> Result<String, ViewError> {
        Ok(match kind {
            BasicKind::U8 => self.unwrap_basic::<u8>()?.to_string(),
            BasicKind::U16 => self.unwrap_basic::<u16>()?.to_string(),
            BasicKind::U32 => self.unwrap_basic::<u32>()?.to_string(),
            BasicKind::U64 => self.unwrap_basic::<u64>()?.to_string(),
            BasicKind::I8 => self.unwrap_basic::<i8>()?.to_string(),
            BasicKind::I16 => self.unwrap_basic::<i16>()?.to_string(),
            BasicKind::I32 => self.unwrap_basic::<i32>()?.to_string(),
            BasicKind::I64 => self.unwrap_basic::<i64>()?.to_string(),
            BasicKind::F32 => format!("{:.6}", self.unwrap_basic::<f32>()?),
            BasicKind::F64 => format!("{:.6}", self.unwrap_basic::<f64>()?),
            BasicKind::Bool => self.unwrap_basic::<bool>()?.to_string(),
        })
    }
}

impl<'a> std::fmt::Display for View<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.render() {
            Ok(s) => write!(f, "{s}"),
            Err(e) => write!(f, "<render error: {e}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DomainDef, FieldDef};
    use crate::value::Value;

    #[test]
    fn date_scenario() {
        let reg = Registry::with_builtins();
        let date_idx = reg.index_of("Date").unwrap();
        let mut value = Value::new(&reg, date_idx).unwrap();
        let view = value.view(&reg);

        view.field("day").unwrap().set_basic::<u8>(26).unwrap();
        view.field("month").unwrap().field("jan").unwrap();
        view.field("year").unwrap().set_basic::<u16>(2004).unwrap();
        view.field("time").unwrap().set_basic::<u32>(0).unwrap();

        let rendered = view.render().unwrap();
        assert!(rendered.contains("day: Day(26)"), "{rendered}");
        assert!(rendered.contains("month: Month::jan"), "{rendered}");
        assert!(rendered.contains("year: Year(2004)"), "{rendered}");
        assert!(rendered.contains("time: Seconds(0)"), "{rendered}");
    }

    fn add_vector_domains(reg: &mut Registry) -> DomainIndex {
        for name in ["Vector2", "Vector3", "Vector4"] {
            let n = match name {
                "Vector2" => 2,
                "Vector3" => 3,
                _ => 4,
            };
            let fields = ["x", "y", "z", "w"][..n]
                .iter()
                .map(|f| FieldDef::typed(*f, "F32"))
                .collect();
            reg.add(
                name,
                DomainDef::Complex {
                    variant: ComplexVariant::Mul,
                    fields,
                },
            )
            .unwrap();
        }
        reg.add(
            "Vector",
            DomainDef::Complex {
                variant: ComplexVariant::Add,
                fields: vec![
                    FieldDef::typed("v2", "Vector2"),
                    FieldDef::typed("v3", "Vector3"),
                    FieldDef::typed("v4", "Vector4"),
                ],
            },
        )
        .unwrap()
    }

    #[test]
    fn sum_domain_scenario() {
        let mut reg = Registry::with_builtins();
        let vector_idx = add_vector_domains(&mut reg);
        let mut value = Value::new(&reg, vector_idx).unwrap();
        let view = value.view(&reg);

        let v2 = view.field("v2").unwrap();
        v2.field("x").unwrap().set_basic::<f32>(2.5).unwrap();
        v2.field("y").unwrap().set_basic::<f32>(4.5).unwrap();
        let rendered = view.render().unwrap();
        assert!(
            rendered.starts_with("Vector::v2(Vector2 { x: F32(2.500000), y: F32(4.500000), })"),
            "{rendered}"
        );

        let v3 = view.field("v3").unwrap();
        v3.field("x").unwrap().set_basic::<f32>(2.5).unwrap();
        v3.field("y").unwrap().set_basic::<f32>(4.5).unwrap();
        v3.field("z").unwrap().set_basic::<f32>(6.5).unwrap();
        let rendered = view.render().unwrap();
        assert!(rendered.starts_with("Vector::v3("), "{rendered}");
        assert!(!rendered.contains("v2"), "{rendered}");
    }

    #[test]
    fn array_push_pop_scenario() {
        let mut reg = Registry::with_builtins();
        let arr_idx = reg
            .add(
                "U8_10",
                DomainDef::Array {
                    element_name: "U8".into(),
                    capacity: 10,
                },
            )
            .unwrap();
        let mut value = Value::new(&reg, arr_idx).unwrap();
        let view = value.view(&reg);

        view.set_length(0).unwrap();
        for v in [12u8, 2, 4, 6, 8, 10] {
            view.push_basic(v).unwrap();
        }
        assert_eq!(view.length().unwrap(), 6);
        let values: Vec<u8> = (0..6)
            .map(|i| view.array_get(i).unwrap().unwrap_basic::<u8>().unwrap())
            .collect();
        assert_eq!(values, vec![12, 2, 4, 6, 8, 10]);

        view.pop().unwrap();
        assert_eq!(view.length().unwrap(), 5);
        assert_eq!(
            view.array_get(5).unwrap_err(),
            ViewError::ArrayIndexOutOfRange { index: 5, length: 5 }
        );
    }

    #[test]
    fn array_overflow_and_empty_pop() {
        let mut reg = Registry::with_builtins();
        let arr_idx = reg
            .add(
                "U8_1",
                DomainDef::Array {
                    element_name: "U8".into(),
                    capacity: 1,
                },
            )
            .unwrap();
        let mut value = Value::new(&reg, arr_idx).unwrap();
        let view = value.view(&reg);
        view.set_length(0).unwrap();
        view.push_basic::<u8>(1).unwrap();
        assert_eq!(
            view.push_basic::<u8>(2).unwrap_err(),
            ViewError::ArrayLengthOutOfBounds {
                requested: 2,
                capacity: 1
            }
        );
        assert_eq!(view.length().unwrap(), 1);

        view.pop().unwrap();
        assert_eq!(view.pop().unwrap_err(), ViewError::PopFromEmptyArray);
    }

    #[test]
    fn assignment_widening_and_rejection() {
        let mut reg = Registry::with_builtins();
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

        let mut person_value = Value::new(&reg, person).unwrap();
        let mut student_value = Value::new(&reg, cs_student).unwrap();
        let person_view = person_value.view(&reg);
        let student_view = student_value.view(&reg);

        student_view.field("age").unwrap().set_basic::<u8>(21).unwrap();
        person_view.assign(student_view).unwrap();
        assert_eq!(
            person_view.field("age").unwrap().unwrap_basic::<u8>().unwrap(),
            21
        );

        assert!(matches!(
            student_view.assign(person_view).unwrap_err(),
            ViewError::AssignIncompatibleDomains { .. }
        ));
    }

    #[test]
    fn wrong_kind_unwrap_fails() {
        let reg = Registry::with_builtins();
        let idx = reg.index_of("U8").unwrap();
        let mut value = Value::new(&reg, idx).unwrap();
        let view = value.view(&reg);
        view.set_basic::<u8>(5).unwrap();
        assert!(matches!(
            view.unwrap_basic::<u16>().unwrap_err(),
            ViewError::UnwrapInvalidVariant { .. }
        ));
    }

    /// `dst`'s tag is 1 byte wide (2 variants); `src`'s is 2 bytes wide (>255
    /// variants). The payload must be read from offset `counter_size(src_fields)`,
    /// not `counter_size(dst_fields)` — a prior bug read the source payload at the
    /// destination's (narrower) tag width, copying the wrong bytes.
    #[test]
    fn add_assign_uses_source_tag_width() {
        let mut reg = Registry::with_builtins();
        let dst_idx = reg
            .add(
                "NarrowTag",
                DomainDef::Complex {
                    variant: ComplexVariant::Add,
                    fields: vec![FieldDef::typed("a", "U8"), FieldDef::typed("b", "U8")],
                },
            )
            .unwrap();

        let mut src_fields = vec![FieldDef::typed("a", "U8"), FieldDef::typed("b", "U8")];
        for i in 0..254 {
            src_fields.push(FieldDef::tagless(format!("pad{i}")));
        }
        let src_idx = reg
            .add(
                "WideTag",
                DomainDef::Complex {
                    variant: ComplexVariant::Add,
                    fields: src_fields,
                },
            )
            .unwrap();
        assert_eq!(reg.get(src_idx).unwrap().field_index("pad253"), Some(255));

        let mut dst_value = Value::new(&reg, dst_idx).unwrap();
        let mut src_value = Value::new(&reg, src_idx).unwrap();
        let dst_view = dst_value.view(&reg);
        let src_view = src_value.view(&reg);

        src_view.field("b").unwrap().set_basic::<u8>(77).unwrap();
        dst_view.assign(src_view).unwrap();

        assert_eq!(dst_view.get_variant().unwrap(), 1);
        assert_eq!(
            dst_view.field("b").unwrap().unwrap_basic::<u8>().unwrap(),
            77
        );
    }

    proptest::proptest! {
        /// §8's basic round-trip law: `set_basic::<T>(x); unwrap_basic::<T>() == x`,
        /// for every value `T`'s full range can hold.
        #[test]
        fn basic_round_trip_u8(x: u8) {
            let reg = Registry::with_builtins();
            let idx = reg.index_of("U8").unwrap();
            let mut value = Value::new(&reg, idx).unwrap();
            let view = value.view(&reg);
            view.set_basic::<u8>(x).unwrap();
            proptest::prop_assert_eq!(view.unwrap_basic::<u8>().unwrap(), x);
        }

        #[test]
        fn basic_round_trip_i32(x: i32) {
            let reg = Registry::with_builtins();
            let idx = reg.index_of("I32").unwrap();
            let mut value = Value::new(&reg, idx).unwrap();
            let view = value.view(&reg);
            view.set_basic::<i32>(x).unwrap();
            proptest::prop_assert_eq!(view.unwrap_basic::<i32>().unwrap(), x);
        }

        #[test]
        fn array_push_pop_preserves_length(n in 0u8..=20) {
            let mut reg = Registry::with_builtins();
            let arr_idx = reg
                .add(
                    "PropArrayU8",
                    DomainDef::Array {
                        element_name: "U8".into(),
                        capacity: 21,
                    },
                )
                .unwrap();
            let mut value = Value::new(&reg, arr_idx).unwrap();
            let view = value.view(&reg);
            view.set_length(0).unwrap();
            for i in 0..n {
                view.push_basic::<u8>(i).unwrap();
            }
            let len_before = view.length().unwrap();
            view.push_basic::<u8>(0).unwrap();
            view.pop().unwrap();
            proptest::prop_assert_eq!(view.length().unwrap(), len_before);
        }
    }
}
