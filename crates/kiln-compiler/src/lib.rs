pub mod ast;
pub mod semantic;

pub use semantic::{analyze, Analysis, SemanticError};
