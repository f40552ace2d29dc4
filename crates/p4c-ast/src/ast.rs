//! The P4 abstract syntax tree.
//!
//! Every node is a tagged variant ([`NodeKind`]) addressed by a typed handle
//! ([`NodeId`]) into one flat [`Ast`] arena, rather than a separate Rust
//! struct per syntactic class linked by owned pointers. List-shaped
//! productions (a declaration list, a parameter list, a block's statements)
//! are `Vec<NodeId>` fields on the list node itself; there is no generic
//! first-child/right-sibling traversal left for callers to walk, since every
//! consumer in this repository dispatches on `NodeKind` directly. Nodes are
//! allocated during parsing and are immutable afterward — later passes
//! attach data through AST-keyed side tables, never by mutating a node.

use p4c_util::{define_idx, IndexVec, Span, Symbol};

define_idx!(NodeId);

/// Lets `NodeId` key an `IdentityMap` (which wants `Into<usize>` rather than
/// `p4c_util`'s own `Idx` trait, since it pre-dates the AST crate and is
/// meant to key off any dense owned index space).
impl From<NodeId> for usize {
    fn from(id: NodeId) -> usize {
        id.0 as usize
    }
}

/// Parameter-passing direction; `None` is P4's implicit "in" direction for
/// parameters that name no direction at all (directionless parameters).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDirection {
    None,
    In,
    Out,
    InOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Eq,
    Neq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    BitwAnd,
    BitwOr,
    BitwXor,
    Shl,
    Shr,
    Mask,
    Concat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BitwNot,
}

/// One node in the tree. `parent` is filled in as each node's parent is
/// allocated (children are always allocated before the node that holds
/// them, so it starts `None` and is set exactly once).
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub parent: Option<NodeId>,
}

/// The closed set of P4 syntactic productions. Variant names and field
/// shapes follow the production grammar directly: a list production carries
/// a `Vec<NodeId>`, an optional child is `Option<NodeId>`, everything else
/// is a required `NodeId` or scalar payload (width, literal value, operator
/// tag, interned name).
#[derive(Debug, Clone)]
pub enum NodeKind {
    // ---- program ----
    Program {
        decls: NodeId,
    },
    DeclarationList {
        decls: Vec<NodeId>,
    },
    /// An identifier occurrence (both declaring and referencing sites).
    Name {
        strname: Symbol,
    },
    ParameterList {
        params: Vec<NodeId>,
    },
    Parameter {
        direction: ParamDirection,
        name: NodeId,
        ty: NodeId,
        init_expr: Option<NodeId>,
    },
    PackageTypeDecl {
        name: NodeId,
        params: NodeId,
    },
    Instantiation {
        name: NodeId,
        ty: NodeId,
        args: NodeId,
    },

    // ---- parser ----
    ParserDecl {
        proto: NodeId,
        ctor_params: NodeId,
        local_elements: NodeId,
        states: NodeId,
    },
    ParserTypeDecl {
        name: NodeId,
        params: NodeId,
        method_protos: NodeId,
    },
    ParserLocalElements {
        elements: Vec<NodeId>,
    },
    ParserStates {
        states: Vec<NodeId>,
    },
    ParserState {
        name: NodeId,
        stmt_list: NodeId,
        transition_stmt: Option<NodeId>,
    },
    ParserStatements {
        stmts: Vec<NodeId>,
    },
    ParserBlockStatement {
        stmt_list: NodeId,
    },
    TransitionStatement {
        stmt: NodeId,
    },
    StateExpression {
        expr: NodeId,
    },
    SelectExpression {
        expr_list: NodeId,
        case_list: NodeId,
    },
    SelectCaseList {
        cases: Vec<NodeId>,
    },
    SelectCase {
        keyset_expr: NodeId,
        name: NodeId,
    },
    TupleKeysetExpression {
        expr_list: NodeId,
    },
    SimpleKeysetExpression {
        expr: NodeId,
    },
    SimpleExpressionList {
        exprs: Vec<NodeId>,
    },

    // ---- control ----
    ControlDecl {
        proto: NodeId,
        ctor_params: NodeId,
        local_decls: NodeId,
        apply_stmt: NodeId,
    },
    ControlTypeDecl {
        name: NodeId,
        params: NodeId,
        method_protos: NodeId,
    },
    ControlLocalDeclarations {
        decls: Vec<NodeId>,
    },

    // ---- extern ----
    ExternDecl {
        decl: NodeId,
    },
    ExternTypeDecl {
        name: NodeId,
        method_protos: NodeId,
    },
    MethodPrototypes {
        protos: Vec<NodeId>,
    },
    FunctionPrototype {
        return_type: Option<NodeId>,
        name: NodeId,
        params: NodeId,
    },

    // ---- types ----
    TypeRef {
        ty: NodeId,
    },
    TupleType {
        type_args: Vec<NodeId>,
    },
    HeaderStackType {
        ty: NodeId,
        stack_expr: NodeId,
    },
    BaseTypeBoolean,
    BaseTypeInteger {
        size: Option<NodeId>,
    },
    BaseTypeBit {
        size: Option<NodeId>,
    },
    BaseTypeVarbit {
        size: Option<NodeId>,
    },
    BaseTypeString,
    BaseTypeVoid,
    BaseTypeError,
    BaseTypeMatchKind,
    IntegerTypeSize {
        size: NodeId,
    },
    TypeDecl {
        decl: NodeId,
    },
    HeaderTypeDecl {
        name: NodeId,
        fields: NodeId,
    },
    HeaderUnionDecl {
        name: NodeId,
        fields: NodeId,
    },
    StructTypeDecl {
        name: NodeId,
        fields: NodeId,
    },
    StructFieldList {
        fields: Vec<NodeId>,
    },
    StructField {
        ty: NodeId,
        name: NodeId,
    },
    EnumDecl {
        type_size: Option<NodeId>,
        name: NodeId,
        fields: NodeId,
    },
    ErrorDecl {
        fields: NodeId,
    },
    MatchKindDecl {
        fields: NodeId,
    },
    IdentifierList {
        idents: Vec<NodeId>,
    },
    SpecifiedIdentifierList {
        idents: Vec<NodeId>,
    },
    SpecifiedIdentifier {
        name: NodeId,
        init_expr: Option<NodeId>,
    },
    TypedefDecl {
        type_ref: NodeId,
        name: NodeId,
    },

    // ---- statements ----
    AssignmentStatement {
        lhs: NodeId,
        rhs: NodeId,
    },
    EmptyStatement,
    ReturnStatement {
        expr: Option<NodeId>,
    },
    ExitStatement,
    ConditionalStatement {
        cond: NodeId,
        stmt: NodeId,
        else_stmt: Option<NodeId>,
    },
    DirectApplication {
        name: NodeId,
        args: NodeId,
    },
    BlockStatement {
        stmt_list: NodeId,
    },
    StatementOrDeclList {
        items: Vec<NodeId>,
    },
    SwitchStatement {
        expr: NodeId,
        cases: NodeId,
    },
    SwitchCases {
        cases: Vec<NodeId>,
    },
    SwitchCase {
        label: NodeId,
        stmt: Option<NodeId>,
    },
    /// `label` is either a `Name` or a `Default` node.
    SwitchLabel {
        label: NodeId,
    },

    // ---- tables ----
    TableDecl {
        name: NodeId,
        prop_list: NodeId,
    },
    TablePropertyList {
        props: Vec<NodeId>,
    },
    KeyProperty {
        keyelem_list: NodeId,
    },
    KeyElementList {
        elems: Vec<NodeId>,
    },
    KeyElement {
        expr: NodeId,
        match_kind: NodeId,
    },
    ActionsProperty {
        action_list: NodeId,
    },
    ActionList {
        actions: Vec<NodeId>,
    },
    ActionRef {
        name: NodeId,
        args: Option<NodeId>,
    },
    ActionDecl {
        name: NodeId,
        params: NodeId,
        stmt: NodeId,
    },

    // ---- variables ----
    VariableDeclaration {
        ty: NodeId,
        name: NodeId,
        init_expr: Option<NodeId>,
        is_const: bool,
    },

    // ---- expressions ----
    ArgumentList {
        args: Vec<NodeId>,
    },
    Argument {
        arg: NodeId,
    },
    ExpressionList {
        exprs: Vec<NodeId>,
    },
    CastExpression {
        ty: NodeId,
        expr: NodeId,
    },
    UnaryExpression {
        op: UnaryOp,
        operand: NodeId,
    },
    BinaryExpression {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    MemberSelector {
        lhs: NodeId,
        name: NodeId,
    },
    FunctionCall {
        lhs: NodeId,
        args: NodeId,
    },
    ArraySubscript {
        lhs: NodeId,
        index: NodeId,
    },
    IndexExpression {
        start_index: NodeId,
        end_index: Option<NodeId>,
    },
    IntegerLiteral {
        value: u64,
        width: Option<u32>,
        is_signed: bool,
    },
    BooleanLiteral {
        value: bool,
    },
    StringLiteral {
        value: Symbol,
    },
    Default,
    Dontcare,
}

/// The full arena for one compilation. Holds every node ever allocated;
/// nothing is freed until the `Ast` itself is dropped.
pub struct Ast {
    nodes: IndexVec<NodeId, Node>,
    pub root: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Self {
            nodes: IndexVec::new(),
            root: None,
        }
    }

    /// Allocates a new node, wiring `parent` onto every id in `children`.
    /// Children must already exist in the arena (they are always built
    /// before the node that contains them).
    pub fn alloc(&mut self, kind: NodeKind, span: Span, children: &[NodeId]) -> NodeId {
        let id = self.nodes.push(Node {
            kind,
            span,
            parent: None,
        });
        for &child in children {
            self.nodes[child].parent = Some(id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id].span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter_enumerated()
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p4c_util::Span;

    #[test]
    fn alloc_wires_parent_pointers() {
        let mut ast = Ast::new();
        let name = ast.alloc(
            NodeKind::Name {
                strname: Symbol::intern("H"),
            },
            Span::DUMMY,
            &[],
        );
        let fields = ast.alloc(NodeKind::StructFieldList { fields: vec![] }, Span::DUMMY, &[]);
        let decl = ast.alloc(
            NodeKind::HeaderTypeDecl { name, fields },
            Span::DUMMY,
            &[name, fields],
        );
        assert_eq!(ast.parent(name), Some(decl));
        assert_eq!(ast.parent(fields), Some(decl));
        assert!(ast.parent(decl).is_none());
    }

    #[test]
    fn empty_ast_has_no_root() {
        let ast = Ast::new();
        assert!(ast.root.is_none());
        assert_eq!(ast.len(), 0);
    }
}
