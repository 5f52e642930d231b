use std::collections::HashMap;

use serde::Serialize;

use crate::ast::{FileId, FnProto, NodeId, Visibility};

/// Index of a function in [`Analysis::functions`](super::Analysis::functions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FunctionId(pub(crate) u32);

impl FunctionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallingConvention {
    /// Platform C convention, used across the artifact boundary.
    C,
    /// Unconstrained convention for calls that stay inside the artifact.
    Fast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    Internal,
    External,
}

/// One concrete callable function.
#[derive(Debug, Clone)]
pub struct FunctionEntry {
    pub name: String,
    /// The declaring prototype. Its type nodes carry the resolved signature.
    pub proto: FnProto,
    /// The definition node, absent for extern declarations.
    pub definition: Option<NodeId>,
    pub is_extern: bool,
    pub linkage: Linkage,
    pub calling_convention: CallingConvention,
    pub file: FileId,
}

impl FunctionEntry {
    /// An entry for a body-less function bound in from outside.
    pub fn external(proto: &FnProto, file: FileId) -> Self {
        Self {
            name: proto.name.clone(),
            proto: proto.clone(),
            definition: None,
            is_extern: true,
            linkage: Linkage::External,
            calling_convention: CallingConvention::C,
            file,
        }
    }

    /// An entry for a function defined in this program.
    ///
    /// Only `export` functions leave the artifact; everything else is
    /// internal and free to use the fast convention.
    pub fn defined(proto: &FnProto, definition: NodeId, file: FileId) -> Self {
        let internal = proto.visibility != Visibility::Export;
        Self {
            name: proto.name.clone(),
            proto: proto.clone(),
            definition: Some(definition),
            is_extern: false,
            linkage: if internal {
                Linkage::Internal
            } else {
                Linkage::External
            },
            calling_convention: if internal {
                CallingConvention::Fast
            } else {
                CallingConvention::C
            },
            file,
        }
    }
}

/// Name → function mapping for one visibility scope (a file, or the
/// program-wide table of `pub` functions).
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: HashMap<String, FunctionId>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any earlier binding.
    pub fn insert(&mut self, name: impl Into<String>, id: FunctionId) -> Option<FunctionId> {
        self.functions.insert(name.into(), id)
    }

    pub fn get(&self, name: &str) -> Option<FunctionId> {
        self.functions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Bound names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstBuilder;

    fn proto(visibility: Visibility) -> FnProto {
        let mut b = AstBuilder::new();
        let ret = b.named_type("void");
        b.proto("f", visibility, vec![], ret)
    }

    #[test]
    fn define_and_lookup() {
        let mut table = FunctionTable::new();
        assert!(table.insert("f", FunctionId(0)).is_none());
        assert_eq!(table.get("f"), Some(FunctionId(0)));
        assert!(table.get("g").is_none());
        assert!(table.contains("f"));
    }

    #[test]
    fn names_are_sorted() {
        let mut table = FunctionTable::new();
        table.insert("zeta", FunctionId(0));
        table.insert("alpha", FunctionId(1));
        assert_eq!(table.names(), ["alpha", "zeta"]);
    }

    #[test]
    fn linkage_follows_visibility() {
        let private = FunctionEntry::defined(&proto(Visibility::Private), NodeId(9), FileId(0));
        assert_eq!(private.linkage, Linkage::Internal);
        assert_eq!(private.calling_convention, CallingConvention::Fast);

        let public = FunctionEntry::defined(&proto(Visibility::Pub), NodeId(9), FileId(0));
        assert_eq!(public.linkage, Linkage::Internal);
        assert_eq!(public.calling_convention, CallingConvention::Fast);

        let exported = FunctionEntry::defined(&proto(Visibility::Export), NodeId(9), FileId(0));
        assert_eq!(exported.linkage, Linkage::External);
        assert_eq!(exported.calling_convention, CallingConvention::C);
    }

    #[test]
    fn extern_entries_use_c_convention() {
        let entry = FunctionEntry::external(&proto(Visibility::Pub), FileId(1));
        assert!(entry.is_extern);
        assert!(entry.definition.is_none());
        assert_eq!(entry.linkage, Linkage::External);
        assert_eq!(entry.calling_convention, CallingConvention::C);
        assert_eq!(entry.file, FileId(1));
    }
}
