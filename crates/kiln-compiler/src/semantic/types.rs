use std::collections::HashMap;

use serde::Serialize;

/// Handle to a canonical entry in the [`TypeTable`].
///
/// Two handles are equal exactly when they name the same entry, so type
/// identity checks are plain `==`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mutability {
    Const,
    Mut,
}

impl Mutability {
    pub fn from_const(is_const: bool) -> Self {
        if is_const {
            Mutability::Const
        } else {
            Mutability::Mut
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mutability::Const => "const",
            Mutability::Mut => "mut",
        }
    }
}

/// Low-level representation handed to lowering. Opaque to analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "repr", rename_all = "snake_case")]
pub enum Repr {
    Void,
    Int { bits: u16, signed: bool },
    Pointer { pointee: TypeId },
    /// The sentinels have no runtime representation.
    None,
}

/// A canonical type record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeEntry {
    pub name: String,
    pub repr: Repr,
}

/// Handles to the entries created when the table is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuiltinTypes {
    pub void: TypeId,
    pub bool: TypeId,
    pub i32: TypeId,
    pub u8: TypeId,
    /// `*const u8`
    pub string_literal: TypeId,
    /// Type of expressions that never complete.
    pub unreachable: TypeId,
    /// Stands in for anything already reported as erroneous.
    pub invalid: TypeId,
}

/// The type registry: owns every entry, maps names to entries and interns
/// pointer types.
#[derive(Debug, Clone, Serialize)]
pub struct TypeTable {
    entries: Vec<TypeEntry>,
    #[serde(skip)]
    by_name: HashMap<String, TypeId>,
    #[serde(skip)]
    pointers: HashMap<(TypeId, Mutability), TypeId>,
    builtins: BuiltinTypes,
}

/// Name of the error sentinel. Not a valid identifier, so no source can name it.
pub const INVALID_TYPE_NAME: &str = "(invalid)";

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub fn new() -> Self {
        let mut entries = Vec::new();
        let mut by_name = HashMap::new();
        let mut add = |name: &str, repr: Repr| {
            let id = TypeId(entries.len() as u32);
            entries.push(TypeEntry {
                name: name.to_string(),
                repr,
            });
            by_name.insert(name.to_string(), id);
            id
        };

        let int = |bits, signed| Repr::Int { bits, signed };

        let void = add("void", Repr::Void);
        let bool = add("bool", int(1, false));
        let i32 = add("i32", int(32, true));
        let u8 = add("u8", int(8, false));
        let unreachable = add("unreachable", Repr::None);
        let invalid = add(INVALID_TYPE_NAME, Repr::None);
        by_name.remove(INVALID_TYPE_NAME);

        let mut table = Self {
            entries,
            by_name,
            pointers: HashMap::new(),
            builtins: BuiltinTypes {
                void,
                bool,
                i32,
                u8,
                // Patched below once pointer interning is available.
                string_literal: invalid,
                unreachable,
                invalid,
            },
        };
        table.builtins.string_literal = table.pointer_to(u8, true);
        table
    }

    pub fn builtins(&self) -> &BuiltinTypes {
        &self.builtins
    }

    /// Look up a type by the name source code uses for it.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: TypeId) -> &TypeEntry {
        &self.entries[id.index()]
    }

    pub fn name(&self, id: TypeId) -> &str {
        &self.get(id).name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_invalid(&self, id: TypeId) -> bool {
        id == self.builtins.invalid
    }

    pub fn is_unreachable(&self, id: TypeId) -> bool {
        id == self.builtins.unreachable
    }

    /// The interned pointer-to-`child` entry, created on first request.
    ///
    /// Callers that must reject pointers to `unreachable` do so themselves;
    /// an entry is produced regardless so they always have something to use.
    pub fn pointer_to(&mut self, child: TypeId, is_const: bool) -> TypeId {
        let mutability = Mutability::from_const(is_const);
        if let Some(&existing) = self.pointers.get(&(child, mutability)) {
            return existing;
        }

        let name = format!("*{} {}", mutability.as_str(), self.name(child));
        let id = TypeId(self.entries.len() as u32);
        self.entries.push(TypeEntry {
            name: name.clone(),
            repr: Repr::Pointer { pointee: child },
        });
        self.by_name.insert(name, id);
        self.pointers.insert((child, mutability), id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered_by_name() {
        let table = TypeTable::new();
        let b = *table.builtins();
        assert_eq!(table.lookup("void"), Some(b.void));
        assert_eq!(table.lookup("bool"), Some(b.bool));
        assert_eq!(table.lookup("i32"), Some(b.i32));
        assert_eq!(table.lookup("u8"), Some(b.u8));
        assert_eq!(table.lookup("unreachable"), Some(b.unreachable));
        assert_eq!(table.lookup("i64"), None);
    }

    #[test]
    fn string_literal_is_const_pointer_to_u8() {
        let mut table = TypeTable::new();
        let b = *table.builtins();
        assert_eq!(table.name(b.string_literal), "*const u8");
        assert_eq!(table.pointer_to(b.u8, true), b.string_literal);
    }

    #[test]
    fn pointers_are_interned_per_mutability() {
        let mut table = TypeTable::new();
        let i32 = table.builtins().i32;
        let before = table.len();

        let c1 = table.pointer_to(i32, true);
        let c2 = table.pointer_to(i32, true);
        let m1 = table.pointer_to(i32, false);
        let m2 = table.pointer_to(i32, false);

        assert_eq!(c1, c2);
        assert_eq!(m1, m2);
        assert_ne!(c1, m1);
        assert_eq!(table.len(), before + 2);
        assert_eq!(table.name(c1), "*const i32");
        assert_eq!(table.name(m1), "*mut i32");
        assert_eq!(table.get(m1).repr, Repr::Pointer { pointee: i32 });
    }

    #[test]
    fn nested_pointers_intern_through_their_child() {
        let mut table = TypeTable::new();
        let i32 = table.builtins().i32;
        let inner = table.pointer_to(i32, true);
        let outer = table.pointer_to(inner, false);
        assert_eq!(table.name(outer), "*mut *const i32");
        assert_eq!(table.lookup("*mut *const i32"), Some(outer));
        let inner_again = table.pointer_to(i32, true);
        assert_eq!(table.pointer_to(inner_again, false), outer);
    }

    #[test]
    fn invalid_sentinel_cannot_be_named() {
        let table = TypeTable::new();
        let invalid = table.builtins().invalid;
        assert!(table.is_invalid(invalid));
        assert_eq!(table.name(invalid), INVALID_TYPE_NAME);
        assert_eq!(table.lookup(INVALID_TYPE_NAME), None);
    }
}
