pub mod errors;
pub mod manifest;
pub mod span;

pub use errors::{Diagnostic, DiagnosticBag};
pub use manifest::{BuildOptions, Manifest, ManifestError, OutType};
pub use span::Position;
