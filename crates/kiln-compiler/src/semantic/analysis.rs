use std::collections::BTreeSet;

use kiln_common::{BuildOptions, DiagnosticBag, OutType, Position};
use serde::Serialize;

use super::annotations::{Annotation, Annotations};
use super::error::SemanticError;
use super::scope::{FunctionEntry, FunctionId, FunctionTable};
use super::type_checker;
use super::types::{TypeId, TypeTable};
use super::validator::Version;
use crate::ast::{Directive, FileId, FnProto, NodeId, SourceFile, TypeRef, TypeRefKind};

/// Program-level output metadata gathered from the root export declaration
/// and the build options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportInfo {
    pub out_type: Option<OutType>,
    pub out_name: Option<String>,
    pub version: Option<Version>,
    /// The root export declaration that was honored, if any.
    pub decl: Option<NodeId>,
}

/// Everything semantic analysis produces for one compilation.
///
/// Created empty before the declaration pass, filled by both passes, and
/// read-only for the phases that follow.
#[derive(Debug)]
pub struct Analysis {
    pub(super) types: TypeTable,
    pub(super) annotations: Annotations,
    pub(super) diagnostics: DiagnosticBag,
    pub(super) functions: Vec<FunctionEntry>,
    pub(super) definitions: Vec<FunctionId>,
    pub(super) global_table: FunctionTable,
    pub(super) local_tables: Vec<FunctionTable>,
    pub(super) link_libraries: BTreeSet<String>,
    pub(super) export: ExportInfo,
}

impl Analysis {
    pub(super) fn new(file_count: usize, options: &BuildOptions) -> Self {
        Self {
            types: TypeTable::new(),
            annotations: Annotations::new(),
            diagnostics: DiagnosticBag::new(),
            functions: Vec::new(),
            definitions: Vec::new(),
            global_table: FunctionTable::new(),
            local_tables: vec![FunctionTable::new(); file_count],
            link_libraries: BTreeSet::new(),
            export: ExportInfo {
                out_type: options.out_type,
                out_name: options.out_name.clone(),
                version: None,
                decl: None,
            },
        }
    }

    // ====================================================================
    // Accessors
    // ====================================================================

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn diagnostics(&self) -> &DiagnosticBag {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Every function entry, in declaration order.
    pub fn functions(&self) -> &[FunctionEntry] {
        &self.functions
    }

    pub fn function(&self, id: FunctionId) -> &FunctionEntry {
        &self.functions[id.index()]
    }

    /// The functions that have bodies, in declaration order.
    pub fn definitions(&self) -> impl Iterator<Item = &FunctionEntry> {
        self.definitions.iter().map(|&id| self.function(id))
    }

    /// Functions visible from every file.
    pub fn global_table(&self) -> &FunctionTable {
        &self.global_table
    }

    /// Functions declared in `file`.
    pub fn local_table(&self, file: FileId) -> &FunctionTable {
        &self.local_tables[file.0]
    }

    /// Resolve a call target as seen from `file`: its own declarations
    /// first, then the global table.
    pub fn lookup_function(&self, file: FileId, name: &str) -> Option<FunctionId> {
        self.local_table(file)
            .get(name)
            .or_else(|| self.global_table.get(name))
    }

    /// Library names requested through `link` directives.
    pub fn link_libraries(&self) -> impl Iterator<Item = &str> {
        self.link_libraries.iter().map(String::as_str)
    }

    pub fn export(&self) -> &ExportInfo {
        &self.export
    }

    /// The inferred type of an expression node, by name.
    pub fn expr_type_name(&self, node: NodeId) -> Option<&str> {
        self.annotations
            .expr_type(node)
            .map(|ty| self.types.name(ty))
    }

    /// Annotations, types and program metadata as JSON, for later phases
    /// and debugging.
    pub fn to_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Dump<'a> {
            types: &'a TypeTable,
            annotations: &'a Annotations,
            export: &'a ExportInfo,
            link_libraries: &'a BTreeSet<String>,
            diagnostics: &'a DiagnosticBag,
        }

        serde_json::to_string_pretty(&Dump {
            types: &self.types,
            annotations: &self.annotations,
            export: &self.export,
            link_libraries: &self.link_libraries,
            diagnostics: &self.diagnostics,
        })
    }

    // ====================================================================
    // Shared helpers for both passes
    // ====================================================================

    pub(super) fn error(
        &mut self,
        file: &SourceFile,
        position: Position,
        message: impl Into<String>,
    ) {
        self.diagnostics.error(file.path.as_str(), position, message);
    }

    pub(super) fn invalid_directive(&mut self, file: &SourceFile, directive: &Directive) {
        self.error(
            file,
            directive.pos,
            format!("invalid directive: '{}'", directive.name),
        );
    }

    pub(super) fn add_function(&mut self, entry: FunctionEntry) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        if entry.definition.is_some() {
            self.definitions.push(id);
        }
        self.functions.push(entry);
        id
    }

    /// Bind `name` in `file`'s table, and program-wide when `public`.
    pub(super) fn bind_function(&mut self, file: FileId, name: &str, id: FunctionId, public: bool) {
        self.local_tables[file.0].insert(name, id);
        if public {
            self.global_table.insert(name, id);
        }
    }

    /// Look a type up by name, reporting unknown names.
    ///
    /// Unknown names yield the `invalid` sentinel, which callers must treat
    /// as already reported.
    pub(super) fn resolve_named_type(
        &mut self,
        file: &SourceFile,
        position: Position,
        name: &str,
    ) -> TypeId {
        match self.types.lookup(name) {
            Some(ty) => ty,
            None => {
                self.error(file, position, format!("invalid type name: '{}'", name));
                self.types.builtins().invalid
            }
        }
    }

    /// Resolve a type reference and record the result on it. Each node is
    /// resolved exactly once.
    pub(super) fn resolve_type_node(
        &mut self,
        file: &SourceFile,
        node: &TypeRef,
    ) -> Result<TypeId, SemanticError> {
        if self.annotations.is_annotated(node.id) {
            return Err(SemanticError::AlreadyAnnotated(node.id));
        }

        let ty = match &node.kind {
            TypeRefKind::Primitive { name } => self.resolve_named_type(file, node.pos, name),
            TypeRefKind::Pointer { is_const, child } => {
                let child_type = self.resolve_type_node(file, child)?;
                if self.types.is_unreachable(child_type) {
                    self.error(file, node.pos, "pointer to unreachable not allowed");
                }
                self.types.pointer_to(child_type, *is_const)
            }
        };

        self.annotations.annotate(node.id, Annotation::TypeRef { ty })?;
        Ok(ty)
    }

    /// Resolve every type in a signature. Prototypes accept no directives.
    pub(super) fn resolve_fn_proto(
        &mut self,
        file: &SourceFile,
        proto: &FnProto,
    ) -> Result<(), SemanticError> {
        for directive in &proto.directives {
            self.invalid_directive(file, directive);
        }
        for param in &proto.params {
            self.resolve_type_node(file, &param.ty)?;
        }
        self.resolve_type_node(file, &proto.return_type)?;
        Ok(())
    }

    pub(super) fn check_type_compatibility(
        &mut self,
        file: &SourceFile,
        position: Position,
        expected: Option<TypeId>,
        actual: TypeId,
    ) {
        let Some(expected) = expected else {
            return;
        };
        if type_checker::types_compatible(self.types.builtins(), expected, actual) {
            return;
        }
        let message = format!(
            "type mismatch: expected '{}', got '{}'",
            self.types.name(expected),
            self.types.name(actual)
        );
        self.error(file, position, message);
    }
}
