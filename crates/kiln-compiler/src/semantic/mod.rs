pub mod analysis;
pub mod annotations;
mod declarations;
pub mod error;
mod resolver;
pub mod scope;
pub mod type_checker;
pub mod types;
pub mod validator;

pub use analysis::{Analysis, ExportInfo};
pub use annotations::{Annotation, Annotations};
pub use error::SemanticError;
pub use scope::{CallingConvention, FunctionEntry, FunctionId, FunctionTable, Linkage};
pub use types::{BuiltinTypes, Mutability, Repr, TypeId, TypeTable};
pub use validator::{parse_version_string, Version};

use kiln_common::BuildOptions;
use tracing::debug;

use crate::ast::nodes::Program;

/// Run both semantic passes over every file of `program`.
///
/// Pass 1 collects every function signature and the root export across all
/// files, so that pass 2 can type-check bodies calling functions declared
/// later or in another file. Values in `options` take precedence over the
/// root export declaration.
///
/// User mistakes end up as diagnostics on the returned [`Analysis`]; an
/// `Err` means the program uses a construct the analyzer cannot handle yet,
/// or an internal invariant was broken.
pub fn analyze(program: &Program, options: &BuildOptions) -> Result<Analysis, SemanticError> {
    let mut analysis = Analysis::new(program.files.len(), options);

    debug!(files = program.files.len(), "collecting declarations");
    for (file_id, _) in program.iter_files() {
        declarations::DeclarationCollector::new(&mut analysis, program, file_id).collect()?;
    }

    debug!(
        functions = analysis.functions().len(),
        "analyzing function bodies"
    );
    for (file_id, _) in program.iter_files() {
        resolver::BodyResolver::new(&mut analysis, program, file_id).resolve()?;
    }

    validator::validate_program(&mut analysis, program);

    debug!(
        files = program.files.len(),
        functions = analysis.functions().len(),
        types = analysis.types().len(),
        diagnostics = analysis.diagnostics().len(),
        "semantic analysis finished"
    );
    Ok(analysis)
}
