use kiln_common::Position;
use serde::{Deserialize, Serialize};

/// Stable identity of a node, unique across every file of a program.
///
/// Analysis results are attached to nodes through this id rather than
/// through a field on the node itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a file within [`Program::files`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub usize);

// ============================================================================
// Program / files
// ============================================================================

/// Every parsed file of one compilation, plus which of them is the entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub files: Vec<SourceFile>,
    /// The file whose root export declaration is honored.
    pub entry: FileId,
}

impl Program {
    /// Decode a file forest produced by an external parser.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.0]
    }

    /// Files paired with their ids, in program order.
    pub fn iter_files(&self) -> impl Iterator<Item = (FileId, &SourceFile)> {
        self.files.iter().enumerate().map(|(i, f)| (FileId(i), f))
    }
}

/// One parsed source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path used to attribute diagnostics.
    pub path: String,
    pub root: Root,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Root {
    pub id: NodeId,
    pub pos: Position,
    pub decls: Vec<TopLevelDecl>,
}

// ============================================================================
// Declarations
// ============================================================================

/// A top-level declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TopLevelDecl {
    FnDef(FnDef),
    ExternBlock(ExternBlock),
    RootExport(RootExportDecl),
    Use(UseDecl),
}

/// A directive: `#name("param")`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directive {
    pub id: NodeId,
    pub pos: Position,
    pub name: String,
    #[serde(default)]
    pub param: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Visible only inside the declaring file.
    #[default]
    Private,
    /// Visible from every file of the program.
    Pub,
    /// Exported from the produced artifact with the C calling convention.
    Export,
}

/// A function signature.
///
/// ```kiln
/// #directive("x")
/// pub fn name(a: i32, b: *const u8) -> i32
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FnProto {
    pub id: NodeId,
    pub pos: Position,
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    pub params: Vec<ParamDecl>,
    pub return_type: TypeRef,
    #[serde(default)]
    pub directives: Vec<Directive>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDecl {
    pub id: NodeId,
    pub pos: Position,
    pub name: String,
    pub ty: TypeRef,
}

/// A body-less function declaration inside an extern block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FnDecl {
    pub id: NodeId,
    pub pos: Position,
    pub proto: FnProto,
}

/// A function definition: prototype plus block body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FnDef {
    pub id: NodeId,
    pub pos: Position,
    pub proto: FnProto,
    pub body: Expr,
}

/// ```kiln
/// #link("c")
/// extern {
///     fn exit(code: i32) -> unreachable;
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternBlock {
    pub id: NodeId,
    pub pos: Position,
    #[serde(default)]
    pub directives: Vec<Directive>,
    pub fn_decls: Vec<FnDecl>,
}

/// ```kiln
/// #version("1.0.2")
/// export executable "hello";
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootExportDecl {
    pub id: NodeId,
    pub pos: Position,
    /// The requested output kind as written; validated during analysis.
    pub kind: String,
    /// The output artifact name.
    pub name: String,
    #[serde(default)]
    pub directives: Vec<Directive>,
}

/// `use "path";`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UseDecl {
    pub id: NodeId,
    pub pos: Position,
    pub path: String,
    #[serde(default)]
    pub directives: Vec<Directive>,
}

// ============================================================================
// Type references
// ============================================================================

/// A type as written in source: `i32`, `*const u8`, `*mut *const i32`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRef {
    pub id: NodeId,
    pub pos: Position,
    pub kind: TypeRefKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeRefKind {
    Primitive { name: String },
    Pointer { is_const: bool, child: Box<TypeRef> },
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub id: NodeId,
    pub pos: Position,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExprKind {
    /// `{ a; b; c }`, typed as its last statement.
    Block { statements: Vec<Expr> },

    /// `return` or `return expr`
    Return { expr: Option<Box<Expr>> },

    /// `a + b`, `x == y`, `p && q`
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// `callee(args...)`
    Call { callee: Box<Expr>, args: Vec<Expr> },

    /// Integer literal, kept as written.
    NumberLiteral { value: String },

    /// `"text"`
    StringLiteral { value: String },

    Unreachable,

    Void,

    /// A bare name: `x`, `add`.
    Symbol { name: String },

    /// `expr as T`
    Cast { expr: Box<Expr>, ty: TypeRef },

    /// `not x`, `~x`, `-x`
    Prefix { op: PrefixOp, operand: Box<Expr> },

    /// `if (cond) { ... } else { ... }`
    If {
        condition: Box<Expr>,
        then_block: Box<Expr>,
        else_node: Option<Box<Expr>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    BoolOr,
    BoolAnd,
    CmpEq,
    CmpNotEq,
    CmpLessThan,
    CmpGreaterThan,
    CmpLessOrEq,
    CmpGreaterOrEq,
    BinOr,
    BinXor,
    BinAnd,
    BitShiftLeft,
    BitShiftRight,
    Add,
    Sub,
    Mult,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixOp {
    BoolNot,
    BinNot,
    Negation,
}
