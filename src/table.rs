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

//! C3: a flat, fixed-width row store built directly on top of C2. A `Table`'s schema
//! is registered as an ordinary `Mul` domain, so a row is nothing more than a `View`
//! over that domain — navigation, rendering, and per-column assignment all fall
//! straight out of [`crate::view::View`] rather than needing a parallel
//! implementation.

use crate::domain::ComplexVariant;
use crate::error::{RegistryError, TableError, ViewError};
use crate::registry::{DomainDef, DomainIndex, FieldDef, Registry};
use crate::view::View;

/// One column of a [`Table`]: a name and the domain values in that column are stored
/// as.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub domain: DomainIndex,
}

/// A contiguous byte store of fixed-width rows. Row `i` occupies
/// `[i * row_width, (i + 1) * row_width)`.
#[derive(Debug)]
pub struct Table {
    name: String,
    row_domain: DomainIndex,
    columns: Vec<Column>,
    row_width: usize,
    store: Vec<u8>,
}

impl Table {
    /// Register this table's row layout as a `Mul` domain named `{name}::Row` and
    /// build an empty table over it. `columns` gives each column's name and the
    /// domain its values must be compatible with.
    pub fn new(
        registry: &mut Registry,
        name: impl Into<String>,
        columns: Vec<(String, DomainIndex)>,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        let mut fields = Vec::with_capacity(columns.len());
        for (col_name, domain) in &columns {
            let domain_name = registry.get(*domain)?.name.clone();
            fields.push(FieldDef::typed(col_name.clone(), domain_name));
        }
        let row_domain = registry.add(
            format!("{name}::Row"),
            DomainDef::Complex {
                variant: ComplexVariant::Mul,
                fields,
            },
        )?;
        let row_width = registry.size_of(row_domain)?;
        let columns = columns
            .into_iter()
            .map(|(col_name, domain)| Column {
                name: col_name,
                domain,
            })
            .collect();
        tracing::debug!(table = %name, row_width, "table created");
        Ok(Self {
            name,
            row_domain,
            columns,
            row_width,
            store: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn row_width(&self) -> usize {
        self.row_width
    }

    pub fn row_domain(&self) -> DomainIndex {
        self.row_domain
    }

    pub fn len(&self) -> usize {
        if self.row_width == 0 {
            0
        } else {
            self.store.len() / self.row_width
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn column_offsets(&self, registry: &Registry) -> Result<Vec<usize>, ViewError> {
        let mut offsets = Vec::with_capacity(self.columns.len());
        let mut offset = 0;
        for col in &self.columns {
            offsets.push(offset);
            offset += registry.size_of(col.domain)?;
        }
        Ok(offsets)
    }

    /// Append a row, assigning `values[i]` into column `i` via C2 `assign` (so
    /// compatible-but-distinct domains widen the same way a direct `assign` would).
    /// If any column assignment fails the row is discarded entirely; the store is
    /// left exactly as it was before the call.
    pub fn insert_row(&mut self, registry: &Registry, values: &[View<'_>]) -> Result<(), TableError> {
        if values.len() != self.columns.len() {
            return Err(TableError::ColumnCountMismatch {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }

        let offsets = self
            .column_offsets(registry)
            .map_err(|cause| TableError::FailedToInsertRow { cause })?;
        let mut row = vec![0u8; self.row_width];
        for (i, col) in self.columns.iter().enumerate() {
            let size = registry.size_of(col.domain)?;
            // SAFETY: `offsets[i] + size <= row_width == row.len()` by construction.
            let dst = unsafe { View::from_raw(registry, col.domain, row.as_mut_ptr().add(offsets[i]), size) };
            dst.assign(values[i])
                .map_err(|cause| TableError::FailedToInsertRow { cause })?;
        }

        tracing::debug!(table = %self.name, row_index = self.len(), "row inserted");
        self.store.extend_from_slice(&row);
        Ok(())
    }

    /// A `View` over row `index`, typed as this table's registered row domain so that
    /// `row["column_name"]` navigates exactly like any other `Mul` domain field.
    pub fn row<'a>(&'a mut self, registry: &'a Registry, index: usize) -> Result<View<'a>, TableError> {
        let len = self.len();
        if index >= len {
            return Err(TableError::RowIndexOutOfRange { index, len });
        }
        let start = index * self.row_width;
        // SAFETY: `start + row_width <= store.len()` since `index < len`.
        Ok(unsafe { View::from_raw(registry, self.row_domain, self.store.as_mut_ptr().add(start), self.row_width) })
    }

    /// All rows, in insertion order.
    pub fn rows<'a>(&'a mut self, registry: &'a Registry) -> Rows<'a> {
        Rows {
            registry,
            domain: self.row_domain,
            ptr: self.store.as_mut_ptr(),
            row_width: self.row_width,
            index: 0,
            len: self.len(),
        }
    }
}

/// Iterator over a [`Table`]'s rows, yielded as [`View`]s over the registered row
/// domain.
pub struct Rows<'a> {
    registry: &'a Registry,
    domain: DomainIndex,
    ptr: *mut u8,
    row_width: usize,
    index: usize,
    len: usize,
}

impl<'a> Iterator for Rows<'a> {
    type Item = View<'a>;

    fn next(&mut self) -> Option<View<'a>> {
        if self.index >= self.len {
            return None;
        }
        let offset = self.index * self.row_width;
        self.index += 1;
        // SAFETY: `offset + row_width <= ptr`'s backing store length, since
        // `self.index <= self.len == store.len() / row_width` at entry.
        Some(unsafe { View::from_raw(self.registry, self.domain, self.ptr.add(offset), self.row_width) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::value::Value;

    fn str_value(registry: &Registry, text: &str) -> Value {
        let str_idx = registry.index_of("Str").unwrap();
        let mut value = Value::new(registry, str_idx).unwrap();
        {
            let view = value.view(registry);
            view.set_length(0).unwrap();
            for byte in text.bytes() {
                view.push_basic::<i8>(byte as i8).unwrap();
            }
        }
        value
    }

    #[test]
    fn table_round_trip() {
        let mut registry = Registry::with_builtins();
        let str_idx = registry.index_of("Str").unwrap();
        let i32_idx = registry.index_of("I32").unwrap();
        let mut table = Table::new(
            &mut registry,
            "People",
            vec![("name".into(), str_idx), ("age".into(), i32_idx)],
        )
        .unwrap();

        for (name, age) in [("Vlad", 10), ("Vova", 12)] {
            let mut name_value = str_value(&registry, name);
            let mut age_value = Value::new(&registry, i32_idx).unwrap();
            age_value.view(&registry).set_basic::<i32>(age).unwrap();
            let values = [name_value.view(&registry), age_value.view(&registry)];
            table.insert_row(&registry, &values).unwrap();
        }

        assert_eq!(table.len(), 2);
        let rendered: Vec<String> = table.rows(&registry).map(|row| row.to_string()).collect();
        assert_eq!(rendered.len(), 2);
        // `Str` is an array of `I8`; rendering is byte-wise, so check the column's
        // declared domain name and length rather than the decoded text.
        assert!(rendered[0].contains("name: Str 64:4"), "{}", rendered[0]);
        assert!(rendered[0].contains("age: I32(10)"), "{}", rendered[0]);
        assert!(rendered[1].contains("name: Str 64:4"), "{}", rendered[1]);
        assert!(rendered[1].contains("age: I32(12)"), "{}", rendered[1]);
    }

    #[test]
    fn column_count_mismatch_rejected() {
        let mut registry = Registry::with_builtins();
        let i32_idx = registry.index_of("I32").unwrap();
        let mut table = Table::new(&mut registry, "Ages", vec![("age".into(), i32_idx)]).unwrap();
        let mut age_value = Value::new(&registry, i32_idx).unwrap();
        age_value.view(&registry).set_basic::<i32>(1).unwrap();
        let values = [age_value.view(&registry), age_value.view(&registry)];
        assert_eq!(
            table.insert_row(&registry, &values).unwrap_err(),
            TableError::ColumnCountMismatch {
                expected: 1,
                actual: 2
            }
        );
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn row_index_out_of_range() {
        let mut registry = Registry::with_builtins();
        let i32_idx = registry.index_of("I32").unwrap();
        let mut table = Table::new(&mut registry, "Ages", vec![("age".into(), i32_idx)]).unwrap();
        assert_eq!(
            table.row(&registry, 0).unwrap_err(),
            TableError::RowIndexOutOfRange { index: 0, len: 0 }
        );
    }
}
