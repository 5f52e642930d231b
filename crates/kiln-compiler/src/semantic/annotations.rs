use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::Serialize;

use super::error::SemanticError;
use super::types::TypeId;
use crate::ast::NodeId;

/// What analysis learned about one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    /// A type reference, resolved to its canonical entry.
    TypeRef { ty: TypeId },
    /// An expression and its inferred type.
    Expr { ty: TypeId },
    /// A function definition. `skip` marks a body that is never analyzed.
    FnDef {
        skip: bool,
        implicit_return_type: Option<TypeId>,
    },
}

/// Side table of per-node annotations; each node is written at most once.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct Annotations {
    slots: BTreeMap<NodeId, Annotation>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn annotate(&mut self, node: NodeId, annotation: Annotation) -> Result<(), SemanticError> {
        match self.slots.entry(node) {
            Entry::Occupied(_) => Err(SemanticError::AlreadyAnnotated(node)),
            Entry::Vacant(slot) => {
                slot.insert(annotation);
                Ok(())
            }
        }
    }

    pub fn get(&self, node: NodeId) -> Option<Annotation> {
        self.slots.get(&node).copied()
    }

    pub fn is_annotated(&self, node: NodeId) -> bool {
        self.slots.contains_key(&node)
    }

    /// The canonical type a type-reference node resolved to.
    pub fn resolved_type(&self, node: NodeId) -> Option<TypeId> {
        match self.get(node)? {
            Annotation::TypeRef { ty } => Some(ty),
            _ => None,
        }
    }

    /// The inferred type of an expression node.
    pub fn expr_type(&self, node: NodeId) -> Option<TypeId> {
        match self.get(node)? {
            Annotation::Expr { ty } => Some(ty),
            _ => None,
        }
    }

    pub fn is_skipped(&self, node: NodeId) -> bool {
        matches!(self.get(node), Some(Annotation::FnDef { skip: true, .. }))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
