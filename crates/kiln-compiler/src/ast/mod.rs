pub mod builder;
pub mod nodes;

pub use builder::AstBuilder;
pub use nodes::*;
