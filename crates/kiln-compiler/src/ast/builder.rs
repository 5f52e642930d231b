//! Programmatic AST construction.
//!
//! The parser normally hands the analyzer a finished tree; this builder
//! produces the same shapes for embedders and tests, handing out fresh
//! [`NodeId`]s and stamping every node with the current position.

use kiln_common::Position;

use super::nodes::*;

#[derive(Debug)]
pub struct AstBuilder {
    next_id: u32,
    pos: Position,
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AstBuilder {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pos: Position::new(1, 1, 0),
        }
    }

    /// Stamp nodes built from now on with `line:column`.
    pub fn at(&mut self, line: u32, column: u32) -> &mut Self {
        self.pos = Position {
            line,
            column,
            offset: self.pos.offset,
        };
        self
    }

    fn node(&mut self) -> (NodeId, Position) {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        (id, self.pos)
    }

    // ====================================================================
    // Files and declarations
    // ====================================================================

    pub fn file(&mut self, path: impl Into<String>, decls: Vec<TopLevelDecl>) -> SourceFile {
        let (id, pos) = self.node();
        SourceFile {
            path: path.into(),
            root: Root { id, pos, decls },
        }
    }

    pub fn directive(&mut self, name: impl Into<String>, param: impl Into<String>) -> Directive {
        let (id, pos) = self.node();
        Directive {
            id,
            pos,
            name: name.into(),
            param: param.into(),
        }
    }

    pub fn proto(
        &mut self,
        name: impl Into<String>,
        visibility: Visibility,
        params: Vec<ParamDecl>,
        return_type: TypeRef,
    ) -> FnProto {
        let (id, pos) = self.node();
        FnProto {
            id,
            pos,
            name: name.into(),
            visibility,
            params,
            return_type,
            directives: Vec::new(),
        }
    }

    pub fn param(&mut self, name: impl Into<String>, ty: TypeRef) -> ParamDecl {
        let (id, pos) = self.node();
        ParamDecl {
            id,
            pos,
            name: name.into(),
            ty,
        }
    }

    pub fn fn_def(&mut self, proto: FnProto, body: Expr) -> TopLevelDecl {
        let (id, pos) = self.node();
        TopLevelDecl::FnDef(FnDef {
            id,
            pos,
            proto,
            body,
        })
    }

    pub fn extern_block(
        &mut self,
        directives: Vec<Directive>,
        protos: Vec<FnProto>,
    ) -> TopLevelDecl {
        let fn_decls = protos
            .into_iter()
            .map(|proto| {
                let (id, pos) = self.node();
                FnDecl { id, pos, proto }
            })
            .collect();
        let (id, pos) = self.node();
        TopLevelDecl::ExternBlock(ExternBlock {
            id,
            pos,
            directives,
            fn_decls,
        })
    }

    pub fn root_export(
        &mut self,
        kind: impl Into<String>,
        name: impl Into<String>,
        directives: Vec<Directive>,
    ) -> TopLevelDecl {
        let (id, pos) = self.node();
        TopLevelDecl::RootExport(RootExportDecl {
            id,
            pos,
            kind: kind.into(),
            name: name.into(),
            directives,
        })
    }

    pub fn use_decl(
        &mut self,
        path: impl Into<String>,
        directives: Vec<Directive>,
    ) -> TopLevelDecl {
        let (id, pos) = self.node();
        TopLevelDecl::Use(UseDecl {
            id,
            pos,
            path: path.into(),
            directives,
        })
    }

    // ====================================================================
    // Types
    // ====================================================================

    pub fn named_type(&mut self, name: impl Into<String>) -> TypeRef {
        let (id, pos) = self.node();
        TypeRef {
            id,
            pos,
            kind: TypeRefKind::Primitive { name: name.into() },
        }
    }

    pub fn pointer_type(&mut self, is_const: bool, child: TypeRef) -> TypeRef {
        let (id, pos) = self.node();
        TypeRef {
            id,
            pos,
            kind: TypeRefKind::Pointer {
                is_const,
                child: Box::new(child),
            },
        }
    }

    // ====================================================================
    // Expressions
    // ====================================================================

    fn expr(&mut self, kind: ExprKind) -> Expr {
        let (id, pos) = self.node();
        Expr { id, pos, kind }
    }

    pub fn block(&mut self, statements: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Block { statements })
    }

    pub fn ret(&mut self, expr: Option<Expr>) -> Expr {
        self.expr(ExprKind::Return {
            expr: expr.map(Box::new),
        })
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    /// A call whose callee is a plain name.
    pub fn call(&mut self, name: impl Into<String>, args: Vec<Expr>) -> Expr {
        let callee = self.symbol(name);
        self.call_expr(callee, args)
    }

    pub fn call_expr(&mut self, callee: Expr, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call {
            callee: Box::new(callee),
            args,
        })
    }

    pub fn number(&mut self, value: u64) -> Expr {
        self.expr(ExprKind::NumberLiteral {
            value: value.to_string(),
        })
    }

    pub fn string(&mut self, value: impl Into<String>) -> Expr {
        self.expr(ExprKind::StringLiteral {
            value: value.into(),
        })
    }

    pub fn unreachable(&mut self) -> Expr {
        self.expr(ExprKind::Unreachable)
    }

    pub fn void(&mut self) -> Expr {
        self.expr(ExprKind::Void)
    }

    pub fn symbol(&mut self, name: impl Into<String>) -> Expr {
        self.expr(ExprKind::Symbol { name: name.into() })
    }

    pub fn cast(&mut self, expr: Expr, ty: TypeRef) -> Expr {
        self.expr(ExprKind::Cast {
            expr: Box::new(expr),
            ty,
        })
    }

    pub fn prefix(&mut self, op: PrefixOp, operand: Expr) -> Expr {
        self.expr(ExprKind::Prefix {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn if_expr(&mut self, condition: Expr, then_block: Expr, else_node: Option<Expr>) -> Expr {
        self.expr(ExprKind::If {
            condition: Box::new(condition),
            then_block: Box::new(then_block),
            else_node: else_node.map(Box::new),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_positions_follow_cursor() {
        let mut b = AstBuilder::new();
        let one = b.number(1);
        b.at(7, 3);
        let two = b.number(2);
        assert_ne!(one.id, two.id);
        assert_eq!(one.pos.line, 1);
        assert_eq!((two.pos.line, two.pos.column), (7, 3));
    }

    #[test]
    fn call_wraps_name_in_symbol_callee() {
        let mut b = AstBuilder::new();
        let call = b.call("f", vec![]);
        match call.kind {
            ExprKind::Call { callee, args } => {
                assert!(args.is_empty());
                assert!(matches!(callee.kind, ExprKind::Symbol { ref name } if name == "f"));
            }
            other => panic!("expected call, got {:?}", other),
        }
    }
}
