use kiln_common::Position;
use thiserror::Error;

use crate::ast::NodeId;

/// Failures that abort analysis outright.
///
/// These are never user diagnostics: they mean the tree uses a construct
/// analysis cannot type yet, or an internal invariant was broken.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("{file}:{position}: {construct} is not supported yet")]
    Unsupported {
        construct: &'static str,
        file: String,
        position: Position,
    },

    #[error("node {0} was annotated twice")]
    AlreadyAnnotated(NodeId),

    #[error("node {node} is missing its {expected} annotation")]
    MissingAnnotation {
        node: NodeId,
        expected: &'static str,
    },
}

impl SemanticError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, SemanticError::Unsupported { .. })
    }
}
