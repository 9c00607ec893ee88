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

//! C2 owning half: [`Value`] owns a byte buffer of exactly `size_of(domain)` bytes and
//! frees it on drop. All reading/writing happens through a [`crate::view::View`]
//! borrowed from it.

use crate::error::RegistryError;
use crate::registry::{DomainIndex, Registry};
use crate::view::View;

/// An owned, domain-typed byte buffer.
#[derive(Debug, Clone)]
pub struct Value {
    domain: DomainIndex,
    bytes: Box<[u8]>,
}

impl Value {
    /// Allocate a zeroed buffer of `size_of(domain)` bytes.
    pub fn new(registry: &Registry, domain: DomainIndex) -> Result<Self, RegistryError> {
        let size = registry.size_of(domain)?;
        Ok(Self {
            domain,
            bytes: vec![0u8; size].into_boxed_slice(),
        })
    }

    pub fn domain(&self) -> DomainIndex {
        self.domain
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Borrow a [`View`] over this value's buffer, bound to `registry` and to this
    /// value's lifetime. The view is cheap to copy but cannot outlive `self`.
    pub fn view<'a>(&'a mut self, registry: &'a Registry) -> View<'a> {
        // SAFETY: `bytes` is exactly `size_of(domain)` long and is exclusively
        // borrowed for `'a` via `&'a mut self`, so no other view of this buffer can
        // exist concurrently with the one returned here.
        unsafe { View::from_raw(registry, self.domain, self.bytes.as_mut_ptr(), self.bytes.len()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_value_is_zeroed_and_sized() {
        let reg = Registry::with_builtins();
        let idx = reg.index_of("U32").unwrap();
        let value = Value::new(&reg, idx).unwrap();
        assert_eq!(value.as_bytes(), &[0, 0, 0, 0]);
    }
}
