use tracing::{debug, trace};

use super::analysis::Analysis;
use super::annotations::Annotation;
use super::error::SemanticError;
use super::scope::FunctionEntry;
use super::validator;
use crate::ast::*;

/// Pass 1 over one file: registers functions, resolves their signatures and
/// records program-level directives, without looking at any body.
pub(super) struct DeclarationCollector<'a> {
    analysis: &'a mut Analysis,
    file_id: FileId,
    file: &'a SourceFile,
    is_entry: bool,
}

impl<'a> DeclarationCollector<'a> {
    pub(super) fn new(analysis: &'a mut Analysis, program: &'a Program, file_id: FileId) -> Self {
        Self {
            analysis,
            file_id,
            file: program.file(file_id),
            is_entry: file_id == program.entry,
        }
    }

    pub(super) fn collect(mut self) -> Result<(), SemanticError> {
        trace!(
            file = %self.file.path,
            decls = self.file.root.decls.len(),
            "collecting declarations"
        );
        let file = self.file;
        for decl in &file.root.decls {
            self.collect_declaration(decl)?;
        }
        Ok(())
    }

    fn collect_declaration(&mut self, decl: &TopLevelDecl) -> Result<(), SemanticError> {
        match decl {
            TopLevelDecl::ExternBlock(block) => self.collect_extern_block(block),
            TopLevelDecl::FnDef(def) => self.collect_fn_def(def),
            TopLevelDecl::RootExport(export) => {
                validator::collect_root_export(self.analysis, self.file, self.is_entry, export);
                Ok(())
            }
            // Imported files arrive as separate entries of the program.
            TopLevelDecl::Use(_) => Ok(()),
        }
    }

    fn collect_extern_block(&mut self, block: &ExternBlock) -> Result<(), SemanticError> {
        for directive in &block.directives {
            if directive.name == "link" {
                self.analysis.link_libraries.insert(directive.param.clone());
            } else {
                self.analysis.invalid_directive(self.file, directive);
            }
        }

        for decl in &block.fn_decls {
            let proto = &decl.proto;
            self.analysis.resolve_fn_proto(self.file, proto)?;
            let entry = FunctionEntry::external(proto, self.file_id);
            let id = self.analysis.add_function(entry);
            let is_pub = proto.visibility == Visibility::Pub;
            self.analysis.bind_function(self.file_id, &proto.name, id, is_pub);
            trace!(name = %proto.name, "declared extern function");
        }
        Ok(())
    }

    fn collect_fn_def(&mut self, def: &FnDef) -> Result<(), SemanticError> {
        let proto = &def.proto;
        let is_pub = proto.visibility == Visibility::Pub;

        let local = self.analysis.local_table(self.file_id);
        let redefined = local.contains(&proto.name)
            || (is_pub && self.analysis.global_table.contains(&proto.name));
        if redefined {
            let message = format!("redefinition of '{}'", proto.name);
            self.analysis.error(self.file, def.pos, message);
            debug!(name = %proto.name, file = %self.file.path, "skipping redefined function");
            // The binding is ambiguous, so the body is never analyzed.
            let annotation = Annotation::FnDef {
                skip: true,
                implicit_return_type: None,
            };
            return self.analysis.annotations.annotate(def.id, annotation);
        }

        let entry = FunctionEntry::defined(proto, def.id, self.file_id);
        let id = self.analysis.add_function(entry);
        self.analysis.bind_function(self.file_id, &proto.name, id, is_pub);
        trace!(name = %proto.name, "declared function");

        self.analysis.resolve_fn_proto(self.file, proto)
    }
}
