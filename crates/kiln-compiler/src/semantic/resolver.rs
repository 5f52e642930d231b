use kiln_common::Position;
use tracing::trace;

use super::analysis::Analysis;
use super::annotations::Annotation;
use super::error::SemanticError;
use super::type_checker;
use super::types::{BuiltinTypes, TypeId};
use super::validator;
use crate::ast::*;

/// Pass 2 over one file: type-checks every function body that survived the
/// declaration pass and annotates each analyzed expression with its type.
///
/// Checking is bidirectional: the caller passes the type it expects (or
/// `None` for anything), each node infers its own type, and the two are
/// compared once before the node is annotated.
pub(super) struct BodyResolver<'a> {
    analysis: &'a mut Analysis,
    file_id: FileId,
    file: &'a SourceFile,
    builtins: BuiltinTypes,
    /// The return type of the enclosing function.
    current_function_return: Option<TypeId>,
}

impl<'a> BodyResolver<'a> {
    pub(super) fn new(analysis: &'a mut Analysis, program: &'a Program, file_id: FileId) -> Self {
        let builtins = *analysis.types.builtins();
        Self {
            analysis,
            file_id,
            file: program.file(file_id),
            builtins,
            current_function_return: None,
        }
    }

    pub(super) fn resolve(mut self) -> Result<(), SemanticError> {
        let file = self.file;
        for decl in &file.root.decls {
            match decl {
                TopLevelDecl::FnDef(def) => self.resolve_fn_def(def)?,
                TopLevelDecl::Use(decl) => {
                    validator::check_use_directives(self.analysis, file, decl)
                }
                // Fully handled by the declaration pass.
                TopLevelDecl::ExternBlock(_) | TopLevelDecl::RootExport(_) => {}
            }
        }
        Ok(())
    }

    fn resolve_fn_def(&mut self, def: &FnDef) -> Result<(), SemanticError> {
        if self.analysis.annotations.is_skipped(def.id) {
            return Ok(());
        }
        trace!(name = %def.proto.name, file = %self.file.path, "analyzing function body");

        // TODO: bind parameters once symbol references can be typed.
        let return_type = self.resolved_type(&def.proto.return_type)?;

        let prev_return = self.current_function_return.replace(return_type);
        let body_type = self.analyze_expr(Some(return_type), &def.body);
        self.current_function_return = prev_return;

        let annotation = Annotation::FnDef {
            skip: false,
            implicit_return_type: Some(body_type?),
        };
        self.analysis.annotations.annotate(def.id, annotation)
    }

    // ====================================================================
    // Expressions
    // ====================================================================

    fn analyze_expr(
        &mut self,
        expected: Option<TypeId>,
        expr: &Expr,
    ) -> Result<TypeId, SemanticError> {
        let b = self.builtins;
        let ty = match &expr.kind {
            ExprKind::Block { statements } => self.analyze_block(statements)?,

            ExprKind::Return { expr: value } => self.analyze_return(expr, value.as_deref())?,

            ExprKind::Binary { op, lhs, rhs } => {
                let rule = type_checker::binary_op_rule(*op, &b)
                    .map_err(|construct| self.unsupported(construct, expr.pos))?;
                self.analyze_expr(Some(rule.operand), lhs)?;
                self.analyze_expr(Some(rule.operand), rhs)?;
                rule.result
            }

            ExprKind::Call { callee, args } => self.analyze_call(expr, callee, args)?,

            ExprKind::NumberLiteral { .. } => b.i32,

            ExprKind::StringLiteral { .. } => b.string_literal,

            ExprKind::Unreachable => b.unreachable,

            ExprKind::Void => b.void,

            ExprKind::Symbol { .. } => return Err(self.unsupported("symbol reference", expr.pos)),

            ExprKind::Cast { .. } => return Err(self.unsupported("cast expression", expr.pos)),

            ExprKind::Prefix { op, operand } => {
                let rule = type_checker::prefix_op_rule(*op, &b)
                    .map_err(|construct| self.unsupported(construct, expr.pos))?;
                self.analyze_expr(Some(rule.operand), operand)?;
                rule.result
            }

            ExprKind::If {
                condition,
                then_block,
                else_node,
            } => {
                let else_node = else_node.as_deref();
                self.analyze_if(expected, expr.pos, condition, then_block, else_node)?
            }
        };

        self.analysis.check_type_compatibility(self.file, expr.pos, expected, ty);
        let annotation = Annotation::Expr { ty };
        self.analysis.annotations.annotate(expr.id, annotation)?;
        Ok(ty)
    }

    /// A block is typed as its last analyzed statement. Once a statement
    /// diverges, the rest is reported as unreachable and left unanalyzed;
    /// `void` statements are allowed as padding.
    fn analyze_block(&mut self, statements: &[Expr]) -> Result<TypeId, SemanticError> {
        let mut block_type = self.builtins.void;
        for stmt in statements {
            if block_type == self.builtins.unreachable {
                if !matches!(stmt.kind, ExprKind::Void) {
                    self.analysis.error(self.file, stmt.pos, "unreachable code");
                }
                continue;
            }
            block_type = self.analyze_expr(None, stmt)?;
        }
        Ok(block_type)
    }

    fn analyze_return(
        &mut self,
        node: &Expr,
        value: Option<&Expr>,
    ) -> Result<TypeId, SemanticError> {
        let Some(expected) = self.current_function_return else {
            return Err(SemanticError::MissingAnnotation {
                node: node.id,
                expected: "enclosing function return type",
            });
        };

        let mut actual = match value {
            Some(value) => self.analyze_expr(Some(expected), value)?,
            None => self.builtins.void,
        };

        if actual == self.builtins.unreachable {
            // `return exit(0)` should just be `exit(0)`.
            self.analysis.error(self.file, node.pos, "returning is unreachable");
            actual = self.builtins.invalid;
        }

        self.analysis.check_type_compatibility(self.file, node.pos, Some(expected), actual);
        Ok(self.builtins.unreachable)
    }

    fn analyze_call(
        &mut self,
        node: &Expr,
        callee: &Expr,
        args: &[Expr],
    ) -> Result<TypeId, SemanticError> {
        let ExprKind::Symbol { name } = &callee.kind else {
            return Err(self.unsupported("indirect call", callee.pos));
        };

        let Some(fn_id) = self.analysis.lookup_function(self.file_id, name) else {
            let message = format!("undefined function: '{}'", name);
            self.analysis.error(self.file, node.pos, message);
            // Surface errors inside the arguments even without a signature.
            for arg in args {
                self.analyze_expr(None, arg)?;
            }
            return Ok(self.builtins.invalid);
        };

        let (param_types, return_type) = {
            let proto = &self.analysis.function(fn_id).proto;
            let params: Vec<Option<TypeId>> = proto
                .params
                .iter()
                .map(|param| self.analysis.annotations.resolved_type(param.ty.id))
                .collect();
            (params, self.resolved_type(&proto.return_type)?)
        };

        if param_types.len() != args.len() {
            let message = format!(
                "wrong number of arguments: expected {}, got {}",
                param_types.len(),
                args.len()
            );
            self.analysis.error(self.file, node.pos, message);
        }

        for (i, arg) in args.iter().enumerate() {
            let expected = param_types.get(i).copied().flatten();
            self.analyze_expr(expected, arg)?;
        }

        Ok(return_type)
    }

    /// The conditional yields its then-branch type. The else-branch (or
    /// `void` when absent) is checked against the caller's expectation, or
    /// against the then-branch when the caller has none.
    ///
    /// The else-branch is analyzed before the then-branch, so its
    /// diagnostics come first.
    fn analyze_if(
        &mut self,
        expected: Option<TypeId>,
        position: Position,
        condition: &Expr,
        then_block: &Expr,
        else_node: Option<&Expr>,
    ) -> Result<TypeId, SemanticError> {
        self.analyze_expr(Some(self.builtins.bool), condition)?;

        let else_type = match else_node {
            Some(else_node) => Some(self.analyze_expr(expected, else_node)?),
            None => None,
        };
        let then_type = self.analyze_expr(expected, then_block)?;

        let then_diverges = then_type == self.builtins.unreachable;
        let against = match else_type {
            Some(_) if expected.is_none() && !then_diverges => Some(then_type),
            _ => expected,
        };
        let else_type = else_type.unwrap_or(self.builtins.void);
        self.analysis.check_type_compatibility(self.file, position, against, else_type);

        Ok(then_type)
    }

    // ====================================================================
    // Helpers
    // ====================================================================

    fn resolved_type(&self, node: &TypeRef) -> Result<TypeId, SemanticError> {
        let ty = self.analysis.annotations.resolved_type(node.id);
        ty.ok_or(SemanticError::MissingAnnotation {
            node: node.id,
            expected: "resolved type",
        })
    }

    fn unsupported(&self, construct: &'static str, position: Position) -> SemanticError {
        SemanticError::Unsupported {
            construct,
            file: self.file.path.clone(),
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use kiln_common::BuildOptions;

    use super::super::analyze;
    use crate::ast::*;

    /// Wrap `main` (returning `ret`) around `body` in a program that
    /// already declares its output.
    fn program_with_main(
        b: &mut AstBuilder,
        ret: &str,
        body: Expr,
        extra: Vec<TopLevelDecl>,
    ) -> Program {
        let ret = b.named_type(ret);
        let proto = b.proto("main", Visibility::Export, vec![], ret);
        let mut decls = vec![b.root_export("executable", "app", vec![])];
        decls.extend(extra);
        decls.push(b.fn_def(proto, body));
        let file = b.file("main.kn", decls);
        Program {
            files: vec![file],
            entry: FileId(0),
        }
    }

    fn messages(analysis: &crate::semantic::Analysis) -> Vec<&str> {
        analysis
            .diagnostics()
            .diagnostics()
            .iter()
            .map(|d| d.message.as_str())
            .collect()
    }

    #[test]
    fn statements_after_divergence_are_reported_once_each() {
        let mut b = AstBuilder::new();
        let unreachable = b.unreachable();
        let pad = b.void();
        let dead = b.number(1);
        let dead_id = dead.id;
        let body = b.block(vec![unreachable, pad, dead]);
        let body_id = body.id;
        let program = program_with_main(&mut b, "void", body, vec![]);

        let analysis = analyze(&program, &BuildOptions::default()).unwrap();
        assert_eq!(messages(&analysis), ["unreachable code"]);
        assert_eq!(analysis.expr_type_name(body_id), Some("unreachable"));
        assert!(!analysis.annotations().is_annotated(dead_id));
    }

    #[test]
    fn returning_a_divergent_value_is_reported_without_mismatch() {
        let mut b = AstBuilder::new();
        let value = b.unreachable();
        let ret = b.ret(Some(value));
        let body = b.block(vec![ret]);
        let program = program_with_main(&mut b, "i32", body, vec![]);

        let analysis = analyze(&program, &BuildOptions::default()).unwrap();
        assert_eq!(messages(&analysis), ["returning is unreachable"]);
    }

    #[test]
    fn bare_return_is_checked_against_return_type() {
        let mut b = AstBuilder::new();
        let ret = b.ret(None);
        let body = b.block(vec![ret]);
        let program = program_with_main(&mut b, "i32", body, vec![]);

        let analysis = analyze(&program, &BuildOptions::default()).unwrap();
        assert_eq!(
            messages(&analysis),
            ["type mismatch: expected 'i32', got 'void'"]
        );
    }

    #[test]
    fn body_type_becomes_implicit_return_type() {
        let mut b = AstBuilder::new();
        let lhs = b.number(1);
        let rhs = b.number(2);
        let sum = b.binary(BinaryOp::Add, lhs, rhs);
        let body = b.block(vec![sum]);
        let program = program_with_main(&mut b, "i32", body, vec![]);

        let analysis = analyze(&program, &BuildOptions::default()).unwrap();
        assert!(!analysis.has_errors());
        let TopLevelDecl::FnDef(def) = &program.files[0].root.decls[1] else {
            panic!("expected function definition");
        };
        let i32 = analysis.types().builtins().i32;
        assert_eq!(
            analysis.annotations().get(def.id),
            Some(crate::semantic::Annotation::FnDef {
                skip: false,
                implicit_return_type: Some(i32),
            })
        );
    }

    #[test]
    fn undefined_callee_still_analyzes_arguments() {
        let mut b = AstBuilder::new();
        let bad = b.string("x");
        let ok = b.number(1);
        let sum = b.binary(BinaryOp::Add, bad, ok);
        let call = b.call("missing", vec![sum]);
        let call_id = call.id;
        let body = b.block(vec![call]);
        let program = program_with_main(&mut b, "void", body, vec![]);

        let analysis = analyze(&program, &BuildOptions::default()).unwrap();
        assert_eq!(
            messages(&analysis),
            [
                "undefined function: 'missing'",
                "type mismatch: expected 'i32', got '*const u8'",
            ]
        );
        assert_eq!(analysis.expr_type_name(call_id), Some("(invalid)"));
    }

    #[test]
    fn extern_call_uses_declared_signature() {
        let mut b = AstBuilder::new();
        let byte = b.named_type("u8");
        let param_ty = b.pointer_type(true, byte);
        let param = b.param("s", param_ty);
        let ret = b.named_type("i32");
        let puts = b.proto("puts", Visibility::Private, vec![param], ret);
        let link = b.directive("link", "c");
        let externs = b.extern_block(vec![link], vec![puts]);

        let arg = b.string("hello");
        let call = b.call("puts", vec![arg]);
        let call_id = call.id;
        let body = b.block(vec![call]);
        let program = program_with_main(&mut b, "i32", body, vec![externs]);

        let analysis = analyze(&program, &BuildOptions::default()).unwrap();
        assert!(!analysis.has_errors(), "{:?}", messages(&analysis));
        assert_eq!(analysis.expr_type_name(call_id), Some("i32"));
        assert_eq!(analysis.link_libraries().collect::<Vec<_>>(), ["c"]);
    }

    #[test]
    fn if_without_else_must_be_void_when_value_expected() {
        let mut b = AstBuilder::new();
        let l = b.number(1);
        let r = b.number(1);
        let cond = b.binary(BinaryOp::CmpEq, l, r);
        let one = b.number(1);
        let then_block = b.block(vec![one]);
        let body = b.if_expr(cond, then_block, None);
        let program = program_with_main(&mut b, "i32", body, vec![]);

        let analysis = analyze(&program, &BuildOptions::default()).unwrap();
        assert_eq!(
            messages(&analysis),
            ["type mismatch: expected 'i32', got 'void'"]
        );
    }

    #[test]
    fn not_expects_bool_operand() {
        let mut b = AstBuilder::new();
        let one = b.number(1);
        let not = b.prefix(PrefixOp::BoolNot, one);
        let not_id = not.id;
        let body = b.block(vec![not]);
        let program = program_with_main(&mut b, "bool", body, vec![]);

        let analysis = analyze(&program, &BuildOptions::default()).unwrap();
        assert_eq!(
            messages(&analysis),
            ["type mismatch: expected 'bool', got 'i32'"]
        );
        assert_eq!(analysis.expr_type_name(not_id), Some("bool"));
    }

    #[test]
    fn call_through_expression_is_unsupported() {
        let mut b = AstBuilder::new();
        let callee = b.number(0);
        let call = b.call_expr(callee, vec![]);
        let body = b.block(vec![call]);
        let program = program_with_main(&mut b, "void", body, vec![]);

        let err = analyze(&program, &BuildOptions::default()).unwrap_err();
        assert!(err.is_unsupported());
    }
}
