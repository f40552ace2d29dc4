//! C5/C6/C7: scope hierarchy, name binding, and declared-types construction.
//!
//! The three passes share one AST walk (a declaration only needs to be
//! visited once to know both which scope it opens and what it's named), so
//! `bind_program` builds the `ScopeTree` first and `build_declared_types`
//! then re-walks the same declaration list to build each declaration's
//! `Type` against the now-complete scope structure. Three fix-up sweeps run
//! after both walks finish, in the fixed order the forwarding chains they
//! resolve require: a `NameRef` can point at a `Typedef` that itself still
//! needs flattening, so typedefs must flatten *after* name resolution, and
//! the final alias-compaction sweep needs every `Typedef` already gone.

use p4c_ast::{Ast, NodeId, NodeKind, ParamDirection};
use p4c_util::{DiagnosticCode, Handler, IdentityMap, Symbol};

use crate::scope::{Definition, NameDeclId, Namespace, RibId, RibKind, ScopeTree};
use crate::types::{Field, Signature, TypeId, TypeKind, TypeUniverse};

pub(crate) const E_UNRESOLVED_TYPE: DiagnosticCode = DiagnosticCode::new("E", 3005);
pub(crate) const E_AMBIGUOUS_TYPE: DiagnosticCode = DiagnosticCode::new("E", 3006);
const E_TYPEDEF_CYCLE: DiagnosticCode = DiagnosticCode::new("E", 3007);

/// Side tables keyed by AST node rather than carried on the node itself —
/// every later pass reaches a node's scope, binding, or declared type
/// through here instead of through a mutable field on the (immutable) AST.
#[derive(Default)]
pub struct SemaTables {
    scope_map: IdentityMap<NodeId, RibId>,
    decl_map: IdentityMap<NodeId, NameDeclId>,
    type_env: IdentityMap<NodeId, TypeId>,
}

impl SemaTables {
    pub fn scope_of(&self, node: NodeId) -> Option<RibId> {
        self.scope_map.lookup(node).copied()
    }

    pub fn decl_of(&self, node: NodeId) -> Option<NameDeclId> {
        self.decl_map.lookup(node).copied()
    }

    pub fn type_of(&self, node: NodeId) -> Option<TypeId> {
        self.type_env.lookup(node).copied()
    }

    fn set_scope(&mut self, node: NodeId, rib: RibId) {
        self.scope_map.insert(node, rib, false);
    }

    fn set_decl(&mut self, node: NodeId, decl: NameDeclId) {
        self.decl_map.insert(node, decl, false);
    }

    pub(crate) fn set_type(&mut self, node: NodeId, ty: TypeId) {
        self.type_env.insert(node, ty, false);
    }
}

/// Runs the full pipeline (C5 through C9) over a parsed program, in that
/// fixed order: scope hierarchy and name binding share one walk, declared
/// types and their fix-up sweeps follow, then potential types bottom-up
/// and final type selection top-down.
#[tracing::instrument(skip_all, name = "analyze")]
pub fn analyze(
    ast: &Ast,
    handler: &Handler,
) -> (ScopeTree, TypeUniverse, SemaTables, crate::infer::PotentialTypeMap) {
    let mut b = Builder {
        ast,
        scope: ScopeTree::new(),
        types: TypeUniverse::new(),
        tables: SemaTables::default(),
        typedef_sites: std::collections::HashMap::new(),
        handler,
    };
    b.bind_program();
    b.build_declared_types();
    b.resolve_name_refs();
    b.flatten_typedefs();
    b.flatten_aliases();
    let potential = b.infer_potential_types();
    b.select_types(&potential);
    (b.scope, b.types, b.tables, potential)
}

pub(crate) struct Builder<'a> {
    pub(crate) ast: &'a Ast,
    pub(crate) scope: ScopeTree,
    pub(crate) types: TypeUniverse,
    pub(crate) tables: SemaTables,
    /// `typedef`-declaration `TypeId` → the `TypedefDecl` node that created
    /// it, consulted only by sweep 2 so a non-terminating chain's diagnostic
    /// carries a real source location instead of [`p4c_util::Span::DUMMY`].
    pub(crate) typedef_sites: std::collections::HashMap<TypeId, NodeId>,
    pub(crate) handler: &'a Handler,
}

pub(crate) fn name_symbol(ast: &Ast, name_node: NodeId) -> Symbol {
    match ast.kind(name_node) {
        NodeKind::Name { strname } => *strname,
        other => unreachable!("expected a Name node, found {other:?}"),
    }
}

/// Every list-shaped production keeps its children as a plain `Vec<NodeId>`
/// field; this just picks that field out regardless of which list kind it
/// is, so the walks below don't need a separate arm per list production.
pub(crate) fn node_list<'a>(ast: &'a Ast, node: NodeId) -> &'a [NodeId] {
    match ast.kind(node) {
        NodeKind::DeclarationList { decls } => decls,
        NodeKind::ParameterList { params } => params,
        NodeKind::ParserLocalElements { elements } => elements,
        NodeKind::ParserStates { states } => states,
        NodeKind::ParserStatements { stmts } => stmts,
        NodeKind::ControlLocalDeclarations { decls } => decls,
        NodeKind::StructFieldList { fields } => fields,
        NodeKind::IdentifierList { idents } => idents,
        NodeKind::SpecifiedIdentifierList { idents } => idents,
        NodeKind::MethodPrototypes { protos } => protos,
        NodeKind::StatementOrDeclList { items } => items,
        NodeKind::TablePropertyList { props } => props,
        NodeKind::KeyElementList { elems } => elems,
        NodeKind::ActionList { actions } => actions,
        NodeKind::ArgumentList { args } => args,
        NodeKind::ExpressionList { exprs } => exprs,
        NodeKind::SimpleExpressionList { exprs } => exprs,
        NodeKind::SelectCaseList { cases } => cases,
        NodeKind::SwitchCases { cases } => cases,
        other => unreachable!("expected a list node, found {other:?}"),
    }
}

// ---------------------------------------------------------------------
// C5/C6: scope hierarchy + name binding, one combined walk.
// ---------------------------------------------------------------------

impl<'a> Builder<'a> {
    /// C5/C6: scope hierarchy plus name binding, one combined walk.
    #[tracing::instrument(skip_all, name = "C5_C6_bind_program")]
    fn bind_program(&mut self) {
        let Some(root) = self.ast.root else { return };
        let decls = match self.ast.kind(root) {
            NodeKind::Program { decls } => *decls,
            _ => return,
        };
        self.tables.set_scope(root, self.scope.root);
        self.tables.set_scope(decls, self.scope.root);
        for &decl in node_list(self.ast, decls) {
            self.bind_top_level(decl, self.scope.root);
        }
    }

    fn bind_decl(&mut self, name: NodeId, rib: RibId, ns: Namespace, decl_site: NodeId) -> NameDeclId {
        self.tables.set_scope(name, rib);
        let spelling = name_symbol(self.ast, name);
        let id = self.scope.bind(rib, ns, spelling, decl_site);
        tracing::debug!(spelling = spelling.as_str(), namespace = ?ns, decl = ?id, "bind");
        self.tables.set_decl(decl_site, id);
        self.tables.set_decl(name, id);
        id
    }

    fn bind_top_level(&mut self, node: NodeId, rib: RibId) {
        self.tables.set_scope(node, rib);
        match self.ast.kind(node).clone() {
            NodeKind::PackageTypeDecl { name, params } => {
                self.bind_decl(name, rib, Namespace::Type, node);
                self.bind_param_list_names(params, rib);
            }
            NodeKind::Instantiation { name, ty, args } => {
                self.tables.set_scope(ty, rib);
                self.bind_decl(name, rib, Namespace::Var, node);
                for &arg in node_list(self.ast, args) {
                    self.bind_expr_scope(arg, rib);
                }
                self.tables.set_scope(args, rib);
            }
            NodeKind::ParserTypeDecl { name, params, method_protos } => {
                self.bind_decl(name, rib, Namespace::Type, node);
                self.bind_param_list_names(params, rib);
                self.tables.set_scope(method_protos, rib);
            }
            NodeKind::ParserDecl { proto, ctor_params, local_elements, states } => {
                self.bind_top_level(proto, rib);
                let body_rib = self.scope.enter_scope(rib, RibKind::Parser);
                self.bind_param_list_names(ctor_params, body_rib);
                if let NodeKind::ParserTypeDecl { params, .. } = self.ast.kind(proto) {
                    self.bind_param_list_names(*params, body_rib);
                }
                self.tables.set_scope(local_elements, body_rib);
                for &elem in node_list(self.ast, local_elements) {
                    self.bind_local_decl(elem, body_rib);
                }
                self.tables.set_scope(states, body_rib);
                for &state in node_list(self.ast, states) {
                    self.bind_parser_state(state, body_rib);
                }
            }
            NodeKind::ControlTypeDecl { name, params, method_protos } => {
                self.bind_decl(name, rib, Namespace::Type, node);
                self.bind_param_list_names(params, rib);
                self.tables.set_scope(method_protos, rib);
            }
            NodeKind::ControlDecl { proto, ctor_params, local_decls, apply_stmt } => {
                self.bind_top_level(proto, rib);
                let body_rib = self.scope.enter_scope(rib, RibKind::Control);
                self.bind_param_list_names(ctor_params, body_rib);
                if let NodeKind::ControlTypeDecl { params, .. } = self.ast.kind(proto) {
                    self.bind_param_list_names(*params, body_rib);
                }
                self.tables.set_scope(local_decls, body_rib);
                for &decl in node_list(self.ast, local_decls) {
                    self.bind_local_decl(decl, body_rib);
                }
                let apply_rib = self.scope.enter_scope(body_rib, RibKind::Apply);
                self.bind_block(apply_stmt, apply_rib);
            }
            NodeKind::ExternDecl { decl } => self.bind_top_level(decl, rib),
            NodeKind::ExternTypeDecl { name, method_protos } => {
                self.bind_decl(name, rib, Namespace::Type, node);
                let ext_rib = self.scope.enter_scope(rib, RibKind::Extern);
                self.tables.set_scope(method_protos, ext_rib);
                for &proto in node_list(self.ast, method_protos) {
                    self.bind_top_level(proto, ext_rib);
                }
            }
            NodeKind::FunctionPrototype { name, params, .. } => {
                self.bind_decl(name, rib, Namespace::Var, node);
                let fn_rib = self.scope.enter_scope(rib, RibKind::Function);
                self.bind_param_list_names(params, fn_rib);
            }
            NodeKind::HeaderTypeDecl { name, fields }
            | NodeKind::HeaderUnionDecl { name, fields }
            | NodeKind::StructTypeDecl { name, fields } => {
                self.bind_decl(name, rib, Namespace::Type, node);
                self.tables.set_scope(fields, rib);
                for &field in node_list(self.ast, fields) {
                    self.tables.set_scope(field, rib);
                    if let NodeKind::StructField { ty, .. } = self.ast.kind(field) {
                        self.tables.set_scope(*ty, rib);
                    }
                }
            }
            NodeKind::EnumDecl { name, fields, .. } => {
                self.bind_decl(name, rib, Namespace::Type, node);
                self.tables.set_scope(fields, rib);
                match self.ast.kind(fields).clone() {
                    NodeKind::IdentifierList { idents } => {
                        for member in idents {
                            self.bind_decl(member, rib, Namespace::Var, member);
                        }
                    }
                    NodeKind::SpecifiedIdentifierList { idents } => {
                        for member in idents {
                            if let NodeKind::SpecifiedIdentifier { name, init_expr } = self.ast.kind(member).clone() {
                                self.bind_decl(name, rib, Namespace::Var, member);
                                if let Some(e) = init_expr {
                                    self.bind_expr_scope(e, rib);
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
            NodeKind::ErrorDecl { fields } | NodeKind::MatchKindDecl { fields } => {
                // error{} and match_kind{} blocks accumulate into one
                // program-wide set across however many times the source
                // repeats the block, so members bind into the shared root
                // rib rather than the declaration's own lexical scope.
                self.tables.set_scope(fields, self.scope.root);
                if let NodeKind::IdentifierList { idents } = self.ast.kind(fields).clone() {
                    for member in idents {
                        self.bind_decl(member, self.scope.root, Namespace::Var, member);
                    }
                }
            }
            NodeKind::TypedefDecl { type_ref, name } => {
                self.tables.set_scope(type_ref, rib);
                self.bind_decl(name, rib, Namespace::Type, node);
            }
            NodeKind::VariableDeclaration { ty, name, init_expr, .. } => {
                self.tables.set_scope(ty, rib);
                self.bind_decl(name, rib, Namespace::Var, node);
                if let Some(e) = init_expr {
                    self.bind_expr_scope(e, rib);
                }
            }
            NodeKind::ActionDecl { name, params, stmt } => {
                self.bind_decl(name, rib, Namespace::Var, node);
                let action_rib = self.scope.enter_scope(rib, RibKind::Action);
                self.bind_param_list_names(params, action_rib);
                self.bind_block(stmt, action_rib);
            }
            NodeKind::TableDecl { name, prop_list } => {
                self.bind_decl(name, rib, Namespace::Var, node);
                self.tables.set_scope(prop_list, rib);
                for &prop in node_list(self.ast, prop_list) {
                    self.bind_table_property(prop, rib);
                }
            }
            _ => {}
        }
    }

    fn bind_local_decl(&mut self, node: NodeId, rib: RibId) {
        self.bind_top_level(node, rib);
    }

    fn bind_param_list_names(&mut self, params: NodeId, rib: RibId) {
        self.tables.set_scope(params, rib);
        for &param in node_list(self.ast, params) {
            self.tables.set_scope(param, rib);
            if let NodeKind::Parameter { name, ty, init_expr, .. } = self.ast.kind(param).clone() {
                self.tables.set_scope(ty, rib);
                self.bind_decl(name, rib, Namespace::Var, param);
                if let Some(e) = init_expr {
                    self.bind_expr_scope(e, rib);
                }
            }
        }
    }

    fn bind_parser_state(&mut self, node: NodeId, rib: RibId) {
        let NodeKind::ParserState { name, stmt_list, transition_stmt } = self.ast.kind(node).clone() else {
            return;
        };
        self.bind_decl(name, rib, Namespace::Var, node);
        let state_rib = self.scope.enter_scope(rib, RibKind::ParserState);
        self.tables.set_scope(stmt_list, state_rib);
        for &stmt in node_list(self.ast, stmt_list) {
            self.bind_parser_statement(stmt, state_rib);
        }
        if let Some(transition) = transition_stmt {
            self.bind_transition(transition, state_rib);
        }
    }

    fn bind_parser_statement(&mut self, node: NodeId, rib: RibId) {
        self.tables.set_scope(node, rib);
        if let NodeKind::ParserBlockStatement { stmt_list } = self.ast.kind(node).clone() {
            let block_rib = self.scope.enter_scope(rib, RibKind::Block);
            self.tables.set_scope(stmt_list, block_rib);
            for &stmt in node_list(self.ast, stmt_list) {
                self.bind_parser_statement(stmt, block_rib);
            }
        } else {
            self.bind_statement_in(node, rib);
        }
    }

    fn bind_transition(&mut self, node: NodeId, rib: RibId) {
        self.tables.set_scope(node, rib);
        let NodeKind::TransitionStatement { stmt } = self.ast.kind(node).clone() else { return };
        self.tables.set_scope(stmt, rib);
        match self.ast.kind(stmt).clone() {
            NodeKind::StateExpression { expr } => self.bind_expr_scope(expr, rib),
            NodeKind::SelectExpression { expr_list, case_list } => {
                self.tables.set_scope(expr_list, rib);
                for &e in node_list(self.ast, expr_list) {
                    self.bind_expr_scope(e, rib);
                }
                self.tables.set_scope(case_list, rib);
                for &case in node_list(self.ast, case_list) {
                    self.tables.set_scope(case, rib);
                    if let NodeKind::SelectCase { keyset_expr, name } = self.ast.kind(case).clone() {
                        self.bind_keyset(keyset_expr, rib);
                        self.tables.set_scope(name, rib);
                    }
                }
            }
            _ => {}
        }
    }

    fn bind_keyset(&mut self, node: NodeId, rib: RibId) {
        self.tables.set_scope(node, rib);
        match self.ast.kind(node).clone() {
            NodeKind::TupleKeysetExpression { expr_list } => {
                self.tables.set_scope(expr_list, rib);
                for &e in node_list(self.ast, expr_list) {
                    // Each element is itself a `SimpleKeysetExpression`
                    // wrapper, not a bare expression, so this recurses
                    // through the dispatcher rather than unwrapping once.
                    self.bind_keyset(e, rib);
                }
            }
            NodeKind::SimpleKeysetExpression { expr } => self.bind_simple_keyset(expr, rib),
            _ => {}
        }
    }

    fn bind_simple_keyset(&mut self, node: NodeId, rib: RibId) {
        self.tables.set_scope(node, rib);
        match self.ast.kind(node) {
            NodeKind::Default | NodeKind::Dontcare => {}
            _ => self.bind_expr_scope(node, rib),
        }
    }

    fn bind_block(&mut self, node: NodeId, rib: RibId) {
        self.tables.set_scope(node, rib);
        if let NodeKind::BlockStatement { stmt_list } = self.ast.kind(node).clone() {
            let block_rib = self.scope.enter_scope(rib, RibKind::Block);
            self.tables.set_scope(stmt_list, block_rib);
            for &item in node_list(self.ast, stmt_list) {
                self.bind_statement_in(item, block_rib);
            }
        }
    }

    fn bind_statement_in(&mut self, node: NodeId, rib: RibId) {
        self.tables.set_scope(node, rib);
        match self.ast.kind(node).clone() {
            NodeKind::BlockStatement { .. } => self.bind_block(node, rib),
            NodeKind::VariableDeclaration { ty, name, init_expr, .. } => {
                self.tables.set_scope(ty, rib);
                self.bind_decl(name, rib, Namespace::Var, node);
                if let Some(e) = init_expr {
                    self.bind_expr_scope(e, rib);
                }
            }
            NodeKind::AssignmentStatement { lhs, rhs } => {
                self.bind_expr_scope(lhs, rib);
                self.bind_expr_scope(rhs, rib);
            }
            NodeKind::ConditionalStatement { cond, stmt, else_stmt } => {
                self.bind_expr_scope(cond, rib);
                self.bind_statement_in(stmt, rib);
                if let Some(e) = else_stmt {
                    self.bind_statement_in(e, rib);
                }
            }
            NodeKind::ReturnStatement { expr } => {
                if let Some(e) = expr {
                    self.bind_expr_scope(e, rib);
                }
            }
            NodeKind::SwitchStatement { expr, cases } => {
                self.bind_expr_scope(expr, rib);
                self.tables.set_scope(cases, rib);
                for &case in node_list(self.ast, cases) {
                    self.tables.set_scope(case, rib);
                    if let NodeKind::SwitchCase { label, stmt } = self.ast.kind(case).clone() {
                        self.tables.set_scope(label, rib);
                        if let NodeKind::SwitchLabel { label: inner } = self.ast.kind(label).clone() {
                            self.tables.set_scope(inner, rib);
                        }
                        if let Some(s) = stmt {
                            self.bind_statement_in(s, rib);
                        }
                    }
                }
            }
            NodeKind::DirectApplication { name, args } => {
                self.tables.set_scope(name, rib);
                self.tables.set_scope(args, rib);
                for &arg in node_list(self.ast, args) {
                    self.bind_expr_scope(arg, rib);
                }
            }
            NodeKind::EmptyStatement | NodeKind::ExitStatement => {}
            _ => self.bind_expr_scope(node, rib),
        }
    }

    fn bind_table_property(&mut self, node: NodeId, rib: RibId) {
        self.tables.set_scope(node, rib);
        match self.ast.kind(node).clone() {
            NodeKind::KeyProperty { keyelem_list } => {
                self.tables.set_scope(keyelem_list, rib);
                for &elem in node_list(self.ast, keyelem_list) {
                    self.tables.set_scope(elem, rib);
                    if let NodeKind::KeyElement { expr, match_kind } = self.ast.kind(elem).clone() {
                        self.bind_expr_scope(expr, rib);
                        self.tables.set_scope(match_kind, rib);
                    }
                }
            }
            NodeKind::ActionsProperty { action_list } => {
                self.tables.set_scope(action_list, rib);
                for &action in node_list(self.ast, action_list) {
                    self.tables.set_scope(action, rib);
                    if let NodeKind::ActionRef { name, args } = self.ast.kind(action).clone() {
                        self.tables.set_scope(name, rib);
                        if let Some(args) = args {
                            self.tables.set_scope(args, rib);
                            for &arg in node_list(self.ast, args) {
                                self.bind_expr_scope(arg, rib);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn bind_expr_scope(&mut self, node: NodeId, rib: RibId) {
        self.tables.set_scope(node, rib);
        match self.ast.kind(node).clone() {
            NodeKind::BinaryExpression { left, right, .. } => {
                self.bind_expr_scope(left, rib);
                self.bind_expr_scope(right, rib);
            }
            NodeKind::UnaryExpression { operand, .. } => self.bind_expr_scope(operand, rib),
            NodeKind::CastExpression { ty, expr } => {
                self.tables.set_scope(ty, rib);
                self.bind_expr_scope(expr, rib);
            }
            NodeKind::MemberSelector { lhs, name } => {
                self.bind_expr_scope(lhs, rib);
                self.tables.set_scope(name, rib);
            }
            NodeKind::FunctionCall { lhs, args } => {
                self.bind_expr_scope(lhs, rib);
                self.tables.set_scope(args, rib);
                for &arg in node_list(self.ast, args) {
                    self.bind_expr_scope(arg, rib);
                }
            }
            NodeKind::ArraySubscript { lhs, index } => {
                self.bind_expr_scope(lhs, rib);
                self.bind_expr_scope(index, rib);
            }
            NodeKind::IndexExpression { start_index, end_index } => {
                self.bind_expr_scope(start_index, rib);
                if let Some(e) = end_index {
                    self.bind_expr_scope(e, rib);
                }
            }
            NodeKind::Argument { arg } => self.bind_expr_scope(arg, rib),
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------
// C7: declared-types construction + fix-up sweeps.
// ---------------------------------------------------------------------

impl<'a> Builder<'a> {
    #[tracing::instrument(skip_all, name = "C7_build_declared_types")]
    fn build_declared_types(&mut self) {
        let Some(root) = self.ast.root else { return };
        let decls = match self.ast.kind(root) {
            NodeKind::Program { decls } => *decls,
            _ => return,
        };
        for &decl in node_list(self.ast, decls) {
            self.build_type_for_decl(decl);
        }
    }

    fn finish_decl_type(&mut self, name: NodeId, decl_site: NodeId, ty: TypeId) {
        self.tables.set_type(decl_site, ty);
        self.tables.set_type(name, ty);
        if let Some(decl) = self.tables.decl_of(decl_site) {
            self.scope.set_decl_type(decl, ty);
        }
    }

    fn build_type_for_decl(&mut self, node: NodeId) {
        match self.ast.kind(node).clone() {
            NodeKind::PackageTypeDecl { name, params } => {
                let sig = Signature { params: self.build_param_product(params), ret: None };
                let ty = self.types.alloc(TypeKind::Package { name: name_symbol(self.ast, name), sig });
                self.finish_decl_type(name, node, ty);
            }
            NodeKind::ParserTypeDecl { name, params, .. } => {
                let sig = Signature { params: self.build_param_product(params), ret: None };
                let ty = self.types.alloc(TypeKind::Parser {
                    name: name_symbol(self.ast, name),
                    sig,
                    ctor_params: Vec::new(),
                });
                self.finish_decl_type(name, node, ty);
            }
            NodeKind::ControlTypeDecl { name, params, .. } => {
                let sig = Signature { params: self.build_param_product(params), ret: None };
                let ty = self.types.alloc(TypeKind::Control {
                    name: name_symbol(self.ast, name),
                    sig,
                    ctor_params: Vec::new(),
                });
                self.finish_decl_type(name, node, ty);
            }
            NodeKind::ParserDecl { proto, ctor_params, states, .. } => {
                self.build_type_for_decl(proto);
                let ctor_types = self.build_ctor_param_types(ctor_params);
                if let Some(proto_ty) = self.tables.type_of(proto) {
                    if let TypeKind::Parser { name, sig, .. } = self.types.kind(proto_ty).clone() {
                        self.types.set_kind(proto_ty, TypeKind::Parser { name, sig, ctor_params: ctor_types });
                    }
                }
                self.build_state_types(states);
            }
            NodeKind::ControlDecl { proto, ctor_params, .. } => {
                self.build_type_for_decl(proto);
                let ctor_types = self.build_ctor_param_types(ctor_params);
                if let Some(proto_ty) = self.tables.type_of(proto) {
                    if let TypeKind::Control { name, sig, .. } = self.types.kind(proto_ty).clone() {
                        self.types.set_kind(proto_ty, TypeKind::Control { name, sig, ctor_params: ctor_types });
                    }
                }
            }
            NodeKind::ExternDecl { decl } => self.build_type_for_decl(decl),
            NodeKind::ExternTypeDecl { name, method_protos } => {
                let placeholder = self.types.alloc(TypeKind::TypeError);
                self.finish_decl_type(name, node, placeholder);
                let ext_name = name_symbol(self.ast, name);
                let mut methods = Vec::new();
                let mut ctors = Vec::new();
                for &proto in node_list(self.ast, method_protos) {
                    let NodeKind::FunctionPrototype { return_type, name: mname, params } = self.ast.kind(proto).clone()
                    else {
                        continue;
                    };
                    let msym = name_symbol(self.ast, mname);
                    let is_ctor = return_type.is_none() && msym == ext_name;
                    let ret = if is_ctor {
                        Some(placeholder)
                    } else {
                        Some(return_type.map(|rt| self.build_type_ref(rt)).unwrap_or_else(|| self.types.void()))
                    };
                    let sig = Signature { params: self.build_param_product(params), ret };
                    self.finish_decl_type(mname, proto, placeholder);
                    if is_ctor {
                        ctors.push(sig);
                    } else {
                        methods.push((msym, sig));
                    }
                }
                self.types.set_kind(placeholder, TypeKind::Extern { name: ext_name, methods, ctors });
            }
            NodeKind::FunctionPrototype { return_type, name, params } => {
                let ret = Some(return_type.map(|rt| self.build_type_ref(rt)).unwrap_or_else(|| self.types.void()));
                let sig = Signature { params: self.build_param_product(params), ret };
                let ty = self.types.alloc(TypeKind::Function { sig });
                self.finish_decl_type(name, node, ty);
            }
            NodeKind::HeaderTypeDecl { name, fields } => {
                let ty = self.build_struct_like(name, fields, |n, f| TypeKind::Header { name: n, fields: f });
                self.finish_decl_type(name, node, ty);
            }
            NodeKind::HeaderUnionDecl { name, fields } => {
                let ty = self.build_struct_like(name, fields, |n, f| TypeKind::HeaderUnion { name: n, fields: f });
                self.finish_decl_type(name, node, ty);
            }
            NodeKind::StructTypeDecl { name, fields } => {
                let ty = self.build_struct_like(name, fields, |n, f| TypeKind::Struct { name: n, fields: f });
                self.finish_decl_type(name, node, ty);
            }
            NodeKind::EnumDecl { name, fields, type_size } => {
                let underlying = type_size.map(|sz| self.build_type_ref(sz));
                let members = self.identifier_list_symbols(fields);
                let ty = self.types.alloc(TypeKind::Enum {
                    name: name_symbol(self.ast, name),
                    underlying,
                    members,
                });
                self.finish_decl_type(name, node, ty);
                for &member in node_list(self.ast, fields) {
                    let member_name = match self.ast.kind(member) {
                        NodeKind::SpecifiedIdentifier { name, .. } => *name,
                        _ => member,
                    };
                    if let Some(decl) = self.tables.decl_of(member_name) {
                        self.scope.set_decl_type(decl, ty);
                    }
                }
            }
            NodeKind::ErrorDecl { fields } => self.type_error_members(fields, self.types.error()),
            NodeKind::MatchKindDecl { fields } => self.type_error_members(fields, self.types.match_kind()),
            NodeKind::TypedefDecl { type_ref, name } => {
                let aliased = self.build_type_ref(type_ref);
                let ty = self.types.alloc(TypeKind::Typedef(aliased));
                self.typedef_sites.insert(ty, node);
                self.finish_decl_type(name, node, ty);
            }
            NodeKind::VariableDeclaration { ty, name, .. } => {
                let t = self.build_type_ref(ty);
                self.finish_decl_type(name, node, t);
            }
            NodeKind::ActionDecl { name, params, .. } => {
                let sig = Signature { params: self.build_param_product(params), ret: Some(self.types.void()) };
                let ty = self.types.alloc(TypeKind::Action { name: name_symbol(self.ast, name), sig });
                self.finish_decl_type(name, node, ty);
            }
            NodeKind::TableDecl { name, .. } => {
                let ty = self.types.alloc(TypeKind::Table { name: name_symbol(self.ast, name) });
                self.finish_decl_type(name, node, ty);
            }
            NodeKind::Instantiation { name, ty, .. } => {
                let t = self.build_type_ref(ty);
                self.finish_decl_type(name, node, t);
            }
            _ => {}
        }
    }

    fn build_state_types(&mut self, states: NodeId) {
        for &state in node_list(self.ast, states) {
            let NodeKind::ParserState { name, .. } = self.ast.kind(state).clone() else { continue };
            let ty = self.types.state();
            self.finish_decl_type(name, state, ty);
        }
    }

    fn identifier_list_symbols(&self, node: NodeId) -> Vec<Symbol> {
        match self.ast.kind(node).clone() {
            NodeKind::IdentifierList { idents } => idents.iter().map(|&n| name_symbol(self.ast, n)).collect(),
            NodeKind::SpecifiedIdentifierList { idents } => idents
                .iter()
                .map(|&n| match self.ast.kind(n) {
                    NodeKind::SpecifiedIdentifier { name, .. } => name_symbol(self.ast, *name),
                    _ => name_symbol(self.ast, n),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn type_error_members(&mut self, fields: NodeId, base: TypeId) {
        if let NodeKind::IdentifierList { idents } = self.ast.kind(fields).clone() {
            for member in idents {
                if let Some(decl) = self.tables.decl_of(member) {
                    self.scope.set_decl_type(decl, base);
                }
                self.tables.set_type(member, base);
            }
        }
    }

    fn build_struct_like(
        &mut self,
        name: NodeId,
        fields: NodeId,
        make: impl FnOnce(Symbol, Vec<Field>) -> TypeKind,
    ) -> TypeId {
        let mut built = Vec::new();
        for &field in node_list(self.ast, fields) {
            if let NodeKind::StructField { ty, name: fname } = self.ast.kind(field).clone() {
                let field_ty = self.build_type_ref(ty);
                built.push(Field { name: name_symbol(self.ast, fname), ty: field_ty });
            }
        }
        self.types.alloc(make(name_symbol(self.ast, name), built))
    }

    fn build_param_product(&mut self, params: NodeId) -> Vec<(ParamDirection, TypeId)> {
        node_list(self.ast, params)
            .to_vec()
            .iter()
            .filter_map(|&p| match self.ast.kind(p).clone() {
                NodeKind::Parameter { direction, ty, .. } => Some((direction, self.build_type_ref(ty))),
                _ => None,
            })
            .collect()
    }

    fn build_ctor_param_types(&mut self, params: NodeId) -> Vec<TypeId> {
        node_list(self.ast, params)
            .to_vec()
            .iter()
            .filter_map(|&p| match self.ast.kind(p).clone() {
                NodeKind::Parameter { ty, .. } => Some(self.build_type_ref(ty)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn build_type_ref(&mut self, node: NodeId) -> TypeId {
        let ty = match self.ast.kind(node).clone() {
            NodeKind::TypeRef { ty } => self.build_type_ref(ty),
            NodeKind::BaseTypeBoolean => self.types.bool_(),
            NodeKind::BaseTypeVoid => self.types.void(),
            NodeKind::BaseTypeString => self.types.string(),
            NodeKind::BaseTypeError => self.types.error(),
            NodeKind::BaseTypeMatchKind => self.types.match_kind(),
            NodeKind::BaseTypeInteger { size } => {
                let width = size.and_then(|s| self.const_width(s));
                self.types.int(width)
            }
            NodeKind::BaseTypeBit { size } => {
                let width = size.and_then(|s| self.const_width(s));
                self.types.bit(width)
            }
            NodeKind::BaseTypeVarbit { size } => {
                let width = size.and_then(|s| self.const_width(s));
                self.types.varbit(width)
            }
            NodeKind::TupleType { type_args } => {
                let members = type_args.iter().map(|&a| self.build_type_ref(a)).collect();
                self.types.alloc(TypeKind::Tuple(members))
            }
            NodeKind::HeaderStackType { ty, stack_expr } => {
                let element = self.build_type_ref(ty);
                let size = self.const_width(stack_expr).unwrap_or(0);
                self.types.alloc(TypeKind::HeaderStack { element, size })
            }
            NodeKind::Name { strname } => {
                let scope = self.tables.scope_of(node).unwrap_or(self.scope.root);
                self.types.alloc(TypeKind::NameRef { name: strname, scope, node })
            }
            _ => self.types.error(),
        };
        self.tables.set_type(node, ty);
        ty
    }

    pub(crate) fn const_width(&self, node: NodeId) -> Option<u32> {
        let node = match self.ast.kind(node) {
            NodeKind::IntegerTypeSize { size } => *size,
            _ => node,
        };
        match self.ast.kind(node) {
            NodeKind::IntegerLiteral { value, .. } => Some(*value as u32),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------
// C7 fix-up sweeps.
// ---------------------------------------------------------------------

impl<'a> Builder<'a> {
    /// Sweep 1: resolve every `NameRef` left by `build_type_ref` against the
    /// scope it was captured in, replacing it with `Alias(target)` (or
    /// `TypeError`, with a diagnostic, if the name doesn't resolve or
    /// resolves to more than one type-namespace declaration).
    #[tracing::instrument(skip_all, name = "C7_resolve_name_refs")]
    fn resolve_name_refs(&mut self) {
        for id in self.types.ids().collect::<Vec<_>>() {
            let TypeKind::NameRef { name, scope, node: ref_node } = self.types.kind(id).clone() else { continue };
            let span = self.ast.span(ref_node);
            match self.scope.lookup(scope, Namespace::Type, name) {
                None => {
                    self.handler
                        .build_error(span, format!("unresolved type reference '{name}'"))
                        .code(E_UNRESOLVED_TYPE)
                        .emit(self.handler);
                    self.types.set_kind(id, TypeKind::TypeError);
                }
                Some(def) => {
                    let set = self.scope.overload_set(def);
                    if set.len() > 1 {
                        self.handler
                            .build_error(span, format!("ambiguous type reference '{name}'"))
                            .code(E_AMBIGUOUS_TYPE)
                            .emit(self.handler);
                        self.types.set_kind(id, TypeKind::TypeError);
                    } else {
                        let target = match def {
                            Definition::Decl(decl) => self.scope.decl(decl).ty.unwrap_or_else(|| self.types.error()),
                            Definition::Builtin(sym) => self.builtin_type(sym),
                        };
                        tracing::debug!(name = name.as_str(), target = ?target, "resolve");
                        self.types.set_kind(id, TypeKind::Alias(target));
                    }
                }
            }
        }
    }

    pub(crate) fn builtin_type(&self, sym: Symbol) -> TypeId {
        match sym.as_str() {
            "void" => self.types.void(),
            "bool" => self.types.bool_(),
            "string" => self.types.string(),
            "error" => self.types.error(),
            "match_kind" => self.types.match_kind(),
            _ => self.types.error(),
        }
    }

    /// Sweep 2: flatten every remaining `Typedef(target)` to `Alias(target)`
    /// by following its forwarding chain to the end, reporting a cycle if
    /// the chain never terminates.
    fn flatten_typedefs(&mut self) {
        for id in self.types.ids().collect::<Vec<_>>() {
            if !matches!(self.types.kind(id), TypeKind::Typedef(_)) {
                continue;
            }
            match self.types.follow_chain(id) {
                Some(target) => self.types.set_kind(id, TypeKind::Alias(target)),
                None => {
                    let span = self
                        .typedef_sites
                        .get(&id)
                        .map(|&n| self.ast.span(n))
                        .unwrap_or(p4c_util::Span::DUMMY);
                    self.handler
                        .build_error(span, "typedef chain does not terminate")
                        .code(E_TYPEDEF_CYCLE)
                        .emit(self.handler);
                    self.types.set_kind(id, TypeKind::TypeError);
                }
            }
        }
    }

    /// Sweep 3: compress any multi-hop `Alias` chain left by sweep 1 (an
    /// alias can itself point at another alias) down to a single hop, so
    /// `actual_type` is O(1) from here on.
    fn flatten_aliases(&mut self) {
        for id in self.types.ids().collect::<Vec<_>>() {
            if !matches!(self.types.kind(id), TypeKind::Alias(_)) {
                continue;
            }
            match self.types.follow_chain(id) {
                Some(target) => self.types.set_kind(id, TypeKind::Alias(target)),
                None => self.types.set_kind(id, TypeKind::TypeError),
            }
        }
    }
}
