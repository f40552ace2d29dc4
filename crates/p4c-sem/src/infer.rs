//! C8/C9: potential types (bottom-up candidate sets) and select-type
//! (top-down, context-driven disambiguation).
//!
//! C8 walks every expression once, from the leaves up, and records what each
//! node *could* mean in isolation: a literal's candidate set is a singleton,
//! a name's is its overload set (filtered against argument types when the
//! name sits in callee position), a binary expression's is whatever the
//! built-in operator rules produce from its operands' candidates. None of
//! this consults surrounding context — that's C9's job. P4 doesn't let user
//! code overload operators the way it lets extern methods and constructors
//! overload, so binary/unary operator typing is hard-coded here rather than
//! resolved through a scope lookup the way name references are.
//!
//! C9 re-walks the same tree top-down, this time carrying a `required` type
//! in from the enclosing context (an assignment's RHS must match its LHS, a
//! condition must be `bool`, a variable's initializer must match its
//! declared type) and narrows each node's candidate set against it. Exactly
//! one survivor selects that node's final type; zero is a type mismatch,
//! more than one is still ambiguous after context, both diagnosed.

use indexmap::IndexSet;

use p4c_ast::{NodeId, NodeKind};
use p4c_util::{DiagnosticCode, IdentityMap, Symbol};

use crate::analysis::{name_symbol, node_list, Builder, E_AMBIGUOUS_TYPE, E_UNRESOLVED_TYPE};
use crate::hir::PotentialType;
use crate::scope::{Definition, Namespace};
use crate::types::{TypeId, TypeKind};

const E_TYPE_MISMATCH: DiagnosticCode = DiagnosticCode::new("E", 3008);
const E_TYPE_AMBIGUOUS: DiagnosticCode = DiagnosticCode::new("E", 3009);

/// C8's output: one `PotentialType` per expression-shaped node (plus every
/// argument and argument-list node), keyed the same way `SemaTables` keys
/// its side tables.
#[derive(Default)]
pub struct PotentialTypeMap {
    map: IdentityMap<NodeId, PotentialType>,
}

impl PotentialTypeMap {
    pub fn get(&self, node: NodeId) -> Option<&PotentialType> {
        self.map.lookup(node)
    }

    fn set(&mut self, node: NodeId, pt: PotentialType) {
        self.map.insert(node, pt, false);
    }
}

// ---------------------------------------------------------------------
// C8: potential types, bottom-up.
// ---------------------------------------------------------------------

impl<'a> Builder<'a> {
    #[tracing::instrument(skip_all, name = "C8_infer_potential_types")]
    pub(crate) fn infer_potential_types(&mut self) -> PotentialTypeMap {
        let mut map = PotentialTypeMap::default();
        let Some(root) = self.ast.root else { return map };
        let decls = match self.ast.kind(root) {
            NodeKind::Program { decls } => *decls,
            _ => return map,
        };
        for &decl in node_list(self.ast, decls) {
            self.infer_top_level(decl, &mut map);
        }
        map
    }

    fn infer_top_level(&mut self, node: NodeId, map: &mut PotentialTypeMap) {
        match self.ast.kind(node).clone() {
            NodeKind::PackageTypeDecl { params, .. } => self.infer_param_defaults(params, map),
            NodeKind::Instantiation { args, .. } => {
                self.infer_arg_list(args, map);
            }
            NodeKind::ParserTypeDecl { params, .. } => self.infer_param_defaults(params, map),
            NodeKind::ParserDecl { proto, ctor_params, local_elements, states } => {
                self.infer_top_level(proto, map);
                self.infer_param_defaults(ctor_params, map);
                for &elem in node_list(self.ast, local_elements) {
                    self.infer_top_level(elem, map);
                }
                for &state in node_list(self.ast, states) {
                    self.infer_parser_state(state, map);
                }
            }
            NodeKind::ControlTypeDecl { params, .. } => self.infer_param_defaults(params, map),
            NodeKind::ControlDecl { proto, ctor_params, local_decls, apply_stmt } => {
                self.infer_top_level(proto, map);
                self.infer_param_defaults(ctor_params, map);
                for &decl in node_list(self.ast, local_decls) {
                    self.infer_top_level(decl, map);
                }
                self.infer_block(apply_stmt, map);
            }
            NodeKind::ExternDecl { decl } => self.infer_top_level(decl, map),
            NodeKind::ExternTypeDecl { method_protos, .. } => {
                for &proto in node_list(self.ast, method_protos) {
                    self.infer_top_level(proto, map);
                }
            }
            NodeKind::FunctionPrototype { params, .. } => self.infer_param_defaults(params, map),
            NodeKind::EnumDecl { fields, .. } => {
                if let NodeKind::SpecifiedIdentifierList { idents } = self.ast.kind(fields).clone() {
                    for member in idents {
                        if let NodeKind::SpecifiedIdentifier { init_expr: Some(e), .. } = self.ast.kind(member).clone()
                        {
                            self.infer_expr(e, None, map);
                        }
                    }
                }
            }
            NodeKind::VariableDeclaration { init_expr: Some(e), .. } => {
                self.infer_expr(e, None, map);
            }
            NodeKind::ActionDecl { params, stmt, .. } => {
                self.infer_param_defaults(params, map);
                self.infer_block(stmt, map);
            }
            NodeKind::TableDecl { prop_list, .. } => {
                for &prop in node_list(self.ast, prop_list) {
                    self.infer_table_property(prop, map);
                }
            }
            _ => {}
        }
    }

    fn infer_param_defaults(&mut self, params: NodeId, map: &mut PotentialTypeMap) {
        for &param in node_list(self.ast, params) {
            if let NodeKind::Parameter { init_expr: Some(e), .. } = self.ast.kind(param).clone() {
                self.infer_expr(e, None, map);
            }
        }
    }

    fn infer_parser_state(&mut self, node: NodeId, map: &mut PotentialTypeMap) {
        let NodeKind::ParserState { stmt_list, transition_stmt, .. } = self.ast.kind(node).clone() else { return };
        for &stmt in node_list(self.ast, stmt_list) {
            self.infer_parser_statement(stmt, map);
        }
        if let Some(transition) = transition_stmt {
            self.infer_transition(transition, map);
        }
    }

    fn infer_parser_statement(&mut self, node: NodeId, map: &mut PotentialTypeMap) {
        if let NodeKind::ParserBlockStatement { stmt_list } = self.ast.kind(node).clone() {
            for &stmt in node_list(self.ast, stmt_list) {
                self.infer_parser_statement(stmt, map);
            }
        } else {
            self.infer_statement(node, map);
        }
    }

    fn infer_transition(&mut self, node: NodeId, map: &mut PotentialTypeMap) {
        let NodeKind::TransitionStatement { stmt } = self.ast.kind(node).clone() else { return };
        match self.ast.kind(stmt).clone() {
            NodeKind::StateExpression { expr } => {
                self.infer_expr(expr, None, map);
            }
            NodeKind::SelectExpression { expr_list, case_list } => {
                for &e in node_list(self.ast, expr_list) {
                    self.infer_expr(e, None, map);
                }
                for &case in node_list(self.ast, case_list) {
                    if let NodeKind::SelectCase { keyset_expr, .. } = self.ast.kind(case).clone() {
                        self.infer_keyset(keyset_expr, map);
                    }
                }
            }
            _ => {}
        }
    }

    fn infer_keyset(&mut self, node: NodeId, map: &mut PotentialTypeMap) {
        match self.ast.kind(node).clone() {
            NodeKind::TupleKeysetExpression { expr_list } => {
                for &e in node_list(self.ast, expr_list) {
                    self.infer_keyset(e, map);
                }
            }
            NodeKind::SimpleKeysetExpression { expr } => self.infer_simple_keyset(expr, map),
            _ => {}
        }
    }

    fn infer_simple_keyset(&mut self, node: NodeId, map: &mut PotentialTypeMap) {
        match self.ast.kind(node) {
            NodeKind::Default | NodeKind::Dontcare => {
                let any = self.types.any();
                map.set(node, PotentialType::singleton(any));
            }
            _ => {
                self.infer_expr(node, None, map);
            }
        }
    }

    fn infer_block(&mut self, node: NodeId, map: &mut PotentialTypeMap) {
        if let NodeKind::BlockStatement { stmt_list } = self.ast.kind(node).clone() {
            for &item in node_list(self.ast, stmt_list) {
                self.infer_statement(item, map);
            }
        }
    }

    fn infer_statement(&mut self, node: NodeId, map: &mut PotentialTypeMap) {
        match self.ast.kind(node).clone() {
            NodeKind::BlockStatement { .. } => self.infer_block(node, map),
            NodeKind::VariableDeclaration { init_expr: Some(e), .. } => {
                self.infer_expr(e, None, map);
            }
            NodeKind::AssignmentStatement { lhs, rhs } => {
                self.infer_expr(lhs, None, map);
                self.infer_expr(rhs, None, map);
            }
            NodeKind::ConditionalStatement { cond, stmt, else_stmt } => {
                self.infer_expr(cond, None, map);
                self.infer_statement(stmt, map);
                if let Some(e) = else_stmt {
                    self.infer_statement(e, map);
                }
            }
            NodeKind::ReturnStatement { expr: Some(e) } => {
                self.infer_expr(e, None, map);
            }
            NodeKind::SwitchStatement { expr, cases } => {
                self.infer_expr(expr, None, map);
                for &case in node_list(self.ast, cases) {
                    if let NodeKind::SwitchCase { stmt: Some(s), .. } = self.ast.kind(case).clone() {
                        self.infer_statement(s, map);
                    }
                }
            }
            NodeKind::DirectApplication { args, .. } => {
                self.infer_arg_list(args, map);
            }
            _ => {
                self.infer_expr(node, None, map);
            }
        };
    }

    fn infer_table_property(&mut self, node: NodeId, map: &mut PotentialTypeMap) {
        match self.ast.kind(node).clone() {
            NodeKind::KeyProperty { keyelem_list } => {
                for &elem in node_list(self.ast, keyelem_list) {
                    if let NodeKind::KeyElement { expr, match_kind } = self.ast.kind(elem).clone() {
                        self.infer_expr(expr, None, map);
                        self.infer_expr(match_kind, None, map);
                    }
                }
            }
            NodeKind::ActionsProperty { action_list } => {
                for &action in node_list(self.ast, action_list) {
                    if let NodeKind::ActionRef { args: Some(args), .. } = self.ast.kind(action).clone() {
                        self.infer_arg_list(args, map);
                    }
                }
            }
            _ => {}
        }
    }

    fn infer_arg_list(&mut self, node: NodeId, map: &mut PotentialTypeMap) -> PotentialType {
        let parts: Vec<PotentialType> =
            node_list(self.ast, node).iter().map(|&a| self.infer_argument(a, map)).collect();
        let product = PotentialType::Product(parts);
        map.set(node, product.clone());
        product
    }

    fn infer_argument(&mut self, node: NodeId, map: &mut PotentialTypeMap) -> PotentialType {
        let pt = if let NodeKind::Argument { arg } = self.ast.kind(node).clone() {
            self.infer_expr(arg, None, map)
        } else {
            self.infer_expr(node, None, map)
        };
        map.set(node, pt.clone());
        pt
    }

    /// Computes one node's candidate set from its already-computed children,
    /// recording it and returning it. `potential_args` is `Some` only when
    /// `node` sits in callee position of a `FunctionCall`; it narrows a
    /// name's or member's overload set to the candidates whose signature
    /// actually accepts that many arguments of those types.
    fn infer_expr(&mut self, node: NodeId, potential_args: Option<&PotentialType>, map: &mut PotentialTypeMap) -> PotentialType {
        let pt = match self.ast.kind(node).clone() {
            NodeKind::IntegerLiteral { width, is_signed, .. } => {
                let ty = match width {
                    Some(w) if is_signed => self.types.int(Some(w)),
                    Some(w) => self.types.bit(Some(w)),
                    None => self.types.int(None),
                };
                PotentialType::singleton(ty)
            }
            NodeKind::BooleanLiteral { .. } => {
                let ty = self.types.bool_();
                PotentialType::singleton(ty)
            }
            NodeKind::StringLiteral { .. } => {
                let ty = self.types.string();
                PotentialType::singleton(ty)
            }
            NodeKind::Default | NodeKind::Dontcare => {
                let ty = self.types.any();
                PotentialType::singleton(ty)
            }
            NodeKind::Name { .. } => self.infer_name(node, potential_args),
            NodeKind::UnaryExpression { operand, .. } => self.infer_expr(operand, None, map),
            NodeKind::CastExpression { ty, expr } => {
                self.infer_expr(expr, None, map);
                let target = self.resolve_type_ref_now(ty);
                PotentialType::singleton(target)
            }
            NodeKind::BinaryExpression { op, left, right } => {
                let l = self.infer_expr(left, None, map);
                let r = self.infer_expr(right, None, map);
                self.infer_binary(op, &l, &r)
            }
            NodeKind::MemberSelector { lhs, name } => {
                let l = self.infer_expr(lhs, None, map);
                self.infer_member(&l, name, potential_args)
            }
            NodeKind::FunctionCall { lhs, args } => {
                let argset = self.infer_arg_list(args, map);
                let callee = self.infer_expr(lhs, Some(&argset), map);
                self.infer_call_result(&callee)
            }
            NodeKind::ArraySubscript { lhs, index } => self.infer_subscript(lhs, index, map),
            _ => PotentialType::empty_set(),
        };
        map.set(node, pt.clone());
        pt
    }

    fn infer_name(&mut self, node: NodeId, potential_args: Option<&PotentialType>) -> PotentialType {
        let strname = name_symbol(self.ast, node);
        let scope = self.tables.scope_of(node).unwrap_or(self.scope.root);
        let mut set = IndexSet::new();
        let def = self
            .scope
            .lookup(scope, Namespace::Var, strname)
            .or_else(|| self.scope.lookup(scope, Namespace::Type, strname));
        if let Some(def) = def {
            match def {
                Definition::Builtin(sym) => {
                    set.insert(self.builtin_value_type(sym));
                }
                Definition::Decl(_) => {
                    for decl_id in self.scope.overload_set(def) {
                        let Some(ty) = self.scope.decl(decl_id).ty else { continue };
                        let actual = self.types.actual_type(ty);
                        match potential_args {
                            Some(args) => {
                                if let TypeKind::Function { sig } = self.types.kind(actual).clone() {
                                    if self.match_params(&sig.params, args) {
                                        set.insert(actual);
                                    }
                                }
                            }
                            None => {
                                set.insert(actual);
                            }
                        }
                    }
                }
            }
        }
        PotentialType::Set(set)
    }

    fn builtin_value_type(&mut self, sym: Symbol) -> TypeId {
        match sym.as_str() {
            "accept" | "reject" => self.types.state(),
            "_" => self.types.any(),
            _ => self.builtin_type(sym),
        }
    }

    fn match_params(&self, params: &[(p4c_ast::ParamDirection, TypeId)], args: &PotentialType) -> bool {
        let Some(items) = args.as_product() else { return params.is_empty() };
        if items.len() != params.len() {
            return false;
        }
        params.iter().zip(items).all(|((_, pty), arg_pt)| match arg_pt.as_set() {
            Some(set) => set.iter().any(|&t| self.types.equivalent(t, *pty)),
            None => false,
        })
    }

    /// Built-in operator typing: P4 has a fixed operator set with no
    /// user-definable overloads, so rather than modeling a scope-based
    /// lookup (there is nothing to look up) each operator's result type is
    /// computed directly from its operands' candidate types.
    fn infer_binary(&mut self, op: p4c_ast::BinaryOp, left: &PotentialType, right: &PotentialType) -> PotentialType {
        use p4c_ast::BinaryOp::*;
        let mut set = IndexSet::new();
        let (Some(ls), Some(rs)) = (left.as_set(), right.as_set()) else {
            return PotentialType::empty_set();
        };
        for &lt in ls {
            for &rt in rs {
                let la = self.types.actual_type(lt);
                let ra = self.types.actual_type(rt);
                match op {
                    And | Or => {
                        if matches!(self.types.kind(la), TypeKind::Bool) && matches!(self.types.kind(ra), TypeKind::Bool) {
                            set.insert(self.types.bool_());
                        }
                    }
                    Eq | Neq | Less | Greater | LessEq | GreaterEq => {
                        if self.numeric_compatible(la, ra) {
                            set.insert(self.types.bool_());
                        }
                    }
                    Shl | Shr => {
                        if self.is_numeric(la) {
                            set.insert(la);
                        }
                    }
                    Concat => {
                        if let (TypeKind::Bit(Some(wl)), TypeKind::Bit(Some(wr))) =
                            (self.types.kind(la).clone(), self.types.kind(ra).clone())
                        {
                            let ty = self.types.bit(Some(wl + wr));
                            set.insert(ty);
                        }
                    }
                    _ => {
                        if let Some(result) = self.arith_result(la, ra) {
                            set.insert(result);
                        }
                    }
                }
            }
        }
        PotentialType::Set(set)
    }

    fn is_numeric(&self, t: TypeId) -> bool {
        matches!(self.types.kind(t), TypeKind::Int(_) | TypeKind::Bit(_) | TypeKind::Varbit(_))
    }

    fn numeric_compatible(&self, a: TypeId, b: TypeId) -> bool {
        self.types.equivalent(a, b) || (self.is_numeric(a) && self.is_numeric(b))
    }

    /// An unsized integer constant (`Int(None)`) takes on whichever sized
    /// type it's combined with; two differently-sized operands don't
    /// combine at all.
    fn arith_result(&self, a: TypeId, b: TypeId) -> Option<TypeId> {
        if !self.is_numeric(a) || !self.is_numeric(b) {
            return None;
        }
        if self.types.equivalent(a, b) {
            return Some(a);
        }
        match (self.types.kind(a), self.types.kind(b)) {
            (TypeKind::Int(None), _) => Some(b),
            (_, TypeKind::Int(None)) => Some(a),
            _ => None,
        }
    }

    fn infer_member(&mut self, lhs: &PotentialType, name_node: NodeId, potential_args: Option<&PotentialType>) -> PotentialType {
        let mname = name_symbol(self.ast, name_node);
        let mut set = IndexSet::new();
        if let Some(lhs_set) = lhs.as_set() {
            for &t in lhs_set {
                let actual = self.types.actual_type(t);
                match self.types.kind(actual).clone() {
                    TypeKind::Extern { methods, .. } => {
                        for (msym, sig) in methods {
                            if msym != mname {
                                continue;
                            }
                            if let Some(args) = potential_args {
                                if !self.match_params(&sig.params, args) {
                                    continue;
                                }
                            }
                            let fn_ty = self.types.alloc(TypeKind::Function { sig });
                            set.insert(fn_ty);
                        }
                    }
                    TypeKind::Struct { fields, .. }
                    | TypeKind::Header { fields, .. }
                    | TypeKind::HeaderUnion { fields, .. } => {
                        for field in fields {
                            if field.name == mname {
                                set.insert(field.ty);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        PotentialType::Set(set)
    }

    fn infer_call_result(&mut self, callee: &PotentialType) -> PotentialType {
        let mut set = IndexSet::new();
        if let Some(cset) = callee.as_set() {
            for &t in cset {
                if let TypeKind::Function { sig } = self.types.kind(t).clone() {
                    set.insert(sig.ret.unwrap_or_else(|| self.types.void()));
                }
            }
        }
        PotentialType::Set(set)
    }

    fn infer_subscript(&mut self, lhs: NodeId, index: NodeId, map: &mut PotentialTypeMap) -> PotentialType {
        let base = self.infer_expr(lhs, None, map);
        match self.ast.kind(index).clone() {
            NodeKind::IndexExpression { start_index, end_index } => {
                self.infer_expr(start_index, None, map);
                if let Some(e) = end_index {
                    self.infer_expr(e, None, map);
                }
                let width = match (self.literal_value(start_index), end_index.and_then(|e| self.literal_value(e))) {
                    (Some(hi), Some(lo)) if hi >= lo => Some((hi - lo + 1) as u32),
                    _ => None,
                };
                let ty = self.types.bit(width);
                map.set(index, PotentialType::singleton(ty));
                PotentialType::singleton(ty)
            }
            _ => {
                self.infer_expr(index, None, map);
                let mut set = IndexSet::new();
                if let Some(base_set) = base.as_set() {
                    for &t in base_set {
                        let actual = self.types.actual_type(t);
                        if let TypeKind::HeaderStack { element, .. } = self.types.kind(actual) {
                            set.insert(*element);
                        }
                    }
                }
                PotentialType::Set(set)
            }
        }
    }

    fn literal_value(&self, node: NodeId) -> Option<u64> {
        match self.ast.kind(node) {
            NodeKind::IntegerLiteral { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Resolves a type reference appearing inside an expression (currently
    /// only a cast's target type) rather than at a declaration site. C7's
    /// `build_type_ref` only ever runs at declaration sites, with the
    /// `NameRef` it produces for a bare name flattened later by the fix-up
    /// sweeps; since those sweeps have already run by the time C8 walks
    /// expressions, a `NameRef` produced here is resolved immediately
    /// instead of being left for a sweep that won't come back around.
    fn resolve_type_ref_now(&mut self, node: NodeId) -> TypeId {
        let id = self.build_type_ref(node);
        if let TypeKind::NameRef { name, scope, .. } = self.types.kind(id).clone() {
            match self.scope.lookup(scope, Namespace::Type, name) {
                None => {
                    self.handler
                        .build_error(self.ast.span(node), format!("unresolved type reference '{name}'"))
                        .code(E_UNRESOLVED_TYPE)
                        .emit(self.handler);
                    self.types.set_kind(id, TypeKind::TypeError);
                }
                Some(def) => {
                    let set = self.scope.overload_set(def);
                    if set.len() > 1 {
                        self.handler
                            .build_error(self.ast.span(node), format!("ambiguous type reference '{name}'"))
                            .code(E_AMBIGUOUS_TYPE)
                            .emit(self.handler);
                        self.types.set_kind(id, TypeKind::TypeError);
                    } else {
                        let target = match def {
                            Definition::Decl(decl) => self.scope.decl(decl).ty.unwrap_or_else(|| self.types.error()),
                            Definition::Builtin(sym) => self.builtin_type(sym),
                        };
                        self.types.set_kind(id, TypeKind::Alias(target));
                    }
                }
            }
        }
        id
    }
}

// ---------------------------------------------------------------------
// C9: select-type, top-down.
// ---------------------------------------------------------------------

impl<'a> Builder<'a> {
    #[tracing::instrument(skip_all, name = "C9_select_types")]
    pub(crate) fn select_types(&mut self, potential: &PotentialTypeMap) {
        let Some(root) = self.ast.root else { return };
        let decls = match self.ast.kind(root) {
            NodeKind::Program { decls } => *decls,
            _ => return,
        };
        for &decl in node_list(self.ast, decls) {
            self.select_top_level(decl, potential);
        }
    }

    fn select_top_level(&mut self, node: NodeId, potential: &PotentialTypeMap) {
        match self.ast.kind(node).clone() {
            NodeKind::PackageTypeDecl { params, .. } => self.select_param_defaults(params, potential),
            NodeKind::Instantiation { args, .. } => self.select_arg_list(args, potential),
            NodeKind::ParserTypeDecl { params, .. } => self.select_param_defaults(params, potential),
            NodeKind::ParserDecl { proto, ctor_params, local_elements, states } => {
                self.select_top_level(proto, potential);
                self.select_param_defaults(ctor_params, potential);
                for &elem in node_list(self.ast, local_elements) {
                    self.select_top_level(elem, potential);
                }
                for &state in node_list(self.ast, states) {
                    self.select_parser_state(state, potential);
                }
            }
            NodeKind::ControlTypeDecl { params, .. } => self.select_param_defaults(params, potential),
            NodeKind::ControlDecl { proto, ctor_params, local_decls, apply_stmt } => {
                self.select_top_level(proto, potential);
                self.select_param_defaults(ctor_params, potential);
                for &decl in node_list(self.ast, local_decls) {
                    self.select_top_level(decl, potential);
                }
                self.select_block(apply_stmt, potential);
            }
            NodeKind::ExternDecl { decl } => self.select_top_level(decl, potential),
            NodeKind::ExternTypeDecl { method_protos, .. } => {
                for &proto in node_list(self.ast, method_protos) {
                    self.select_top_level(proto, potential);
                }
            }
            NodeKind::FunctionPrototype { params, .. } => self.select_param_defaults(params, potential),
            NodeKind::EnumDecl { fields, .. } => {
                if let NodeKind::SpecifiedIdentifierList { idents } = self.ast.kind(fields).clone() {
                    for member in idents {
                        if let NodeKind::SpecifiedIdentifier { init_expr: Some(e), .. } = self.ast.kind(member).clone()
                        {
                            self.select_expr(e, None, potential);
                        }
                    }
                }
            }
            NodeKind::VariableDeclaration { init_expr: Some(e), .. } => {
                let declared = self.tables.type_of(node);
                self.select_expr(e, declared, potential);
            }
            NodeKind::ActionDecl { params, stmt, .. } => {
                self.select_param_defaults(params, potential);
                self.select_block(stmt, potential);
            }
            NodeKind::TableDecl { prop_list, .. } => {
                for &prop in node_list(self.ast, prop_list) {
                    self.select_table_property(prop, potential);
                }
            }
            _ => {}
        }
    }

    fn select_param_defaults(&mut self, params: NodeId, potential: &PotentialTypeMap) {
        for &param in node_list(self.ast, params) {
            if let NodeKind::Parameter { ty, init_expr: Some(e), .. } = self.ast.kind(param).clone() {
                let declared = self.tables.type_of(ty);
                self.select_expr(e, declared, potential);
            }
        }
    }

    fn select_parser_state(&mut self, node: NodeId, potential: &PotentialTypeMap) {
        let NodeKind::ParserState { stmt_list, transition_stmt, .. } = self.ast.kind(node).clone() else { return };
        for &stmt in node_list(self.ast, stmt_list) {
            self.select_parser_statement(stmt, potential);
        }
        if let Some(transition) = transition_stmt {
            self.select_transition(transition, potential);
        }
    }

    fn select_parser_statement(&mut self, node: NodeId, potential: &PotentialTypeMap) {
        if let NodeKind::ParserBlockStatement { stmt_list } = self.ast.kind(node).clone() {
            for &stmt in node_list(self.ast, stmt_list) {
                self.select_parser_statement(stmt, potential);
            }
        } else {
            self.select_statement(node, potential);
        }
    }

    fn select_transition(&mut self, node: NodeId, potential: &PotentialTypeMap) {
        let NodeKind::TransitionStatement { stmt } = self.ast.kind(node).clone() else { return };
        match self.ast.kind(stmt).clone() {
            NodeKind::StateExpression { expr } => {
                let state = Some(self.types.state());
                self.select_expr(expr, state, potential);
            }
            NodeKind::SelectExpression { expr_list, case_list } => {
                for &e in node_list(self.ast, expr_list) {
                    self.select_expr(e, None, potential);
                }
                for &case in node_list(self.ast, case_list) {
                    if let NodeKind::SelectCase { keyset_expr, .. } = self.ast.kind(case).clone() {
                        self.select_keyset(keyset_expr, potential);
                    }
                }
            }
            _ => {}
        }
    }

    fn select_keyset(&mut self, node: NodeId, potential: &PotentialTypeMap) {
        match self.ast.kind(node).clone() {
            NodeKind::TupleKeysetExpression { expr_list } => {
                for &e in node_list(self.ast, expr_list) {
                    self.select_keyset(e, potential);
                }
            }
            NodeKind::SimpleKeysetExpression { expr } => self.select_simple_keyset(expr, potential),
            _ => {}
        }
    }

    /// A select case's simple keyset value has no local declared type to
    /// pin it to, so it's required to land on an unsized integer constant;
    /// matching the select expression's own (possibly sized) type case by
    /// case would need positional pairing across `expr_list`/keyset tuples
    /// this pass doesn't track.
    fn select_simple_keyset(&mut self, node: NodeId, potential: &PotentialTypeMap) {
        match self.ast.kind(node) {
            NodeKind::Default | NodeKind::Dontcare => {}
            _ => {
                let required = Some(self.types.int(None));
                self.select_expr(node, required, potential);
            }
        }
    }

    fn select_block(&mut self, node: NodeId, potential: &PotentialTypeMap) {
        if let NodeKind::BlockStatement { stmt_list } = self.ast.kind(node).clone() {
            for &item in node_list(self.ast, stmt_list) {
                self.select_statement(item, potential);
            }
        }
    }

    fn select_statement(&mut self, node: NodeId, potential: &PotentialTypeMap) {
        match self.ast.kind(node).clone() {
            NodeKind::BlockStatement { .. } => self.select_block(node, potential),
            NodeKind::VariableDeclaration { init_expr: Some(e), .. } => {
                let declared = self.tables.type_of(node);
                self.select_expr(e, declared, potential);
            }
            NodeKind::AssignmentStatement { lhs, rhs } => {
                let lhs_ty = self.select_expr(lhs, None, potential);
                self.select_expr(rhs, lhs_ty, potential);
            }
            NodeKind::ConditionalStatement { cond, stmt, else_stmt } => {
                let bool_ty = Some(self.types.bool_());
                self.select_expr(cond, bool_ty, potential);
                self.select_statement(stmt, potential);
                if let Some(e) = else_stmt {
                    self.select_statement(e, potential);
                }
            }
            NodeKind::ReturnStatement { expr: Some(e) } => {
                self.select_expr(e, None, potential);
            }
            NodeKind::SwitchStatement { expr, cases } => {
                self.select_expr(expr, None, potential);
                for &case in node_list(self.ast, cases) {
                    if let NodeKind::SwitchCase { stmt: Some(s), .. } = self.ast.kind(case).clone() {
                        self.select_statement(s, potential);
                    }
                }
            }
            NodeKind::DirectApplication { args, .. } => self.select_arg_list(args, potential),
            NodeKind::EmptyStatement
            | NodeKind::ExitStatement
            | NodeKind::VariableDeclaration { .. }
            | NodeKind::ReturnStatement { .. } => {}
            _ => {
                self.select_expr(node, None, potential);
            }
        }
    }

    fn select_table_property(&mut self, node: NodeId, potential: &PotentialTypeMap) {
        match self.ast.kind(node).clone() {
            NodeKind::KeyProperty { keyelem_list } => {
                for &elem in node_list(self.ast, keyelem_list) {
                    if let NodeKind::KeyElement { expr, match_kind } = self.ast.kind(elem).clone() {
                        self.select_expr(expr, None, potential);
                        let mk = Some(self.types.match_kind());
                        self.select_expr(match_kind, mk, potential);
                    }
                }
            }
            NodeKind::ActionsProperty { action_list } => {
                for &action in node_list(self.ast, action_list) {
                    if let NodeKind::ActionRef { args: Some(args), .. } = self.ast.kind(action).clone() {
                        self.select_arg_list(args, potential);
                    }
                }
            }
            _ => {}
        }
    }

    fn select_arg_list(&mut self, node: NodeId, potential: &PotentialTypeMap) {
        for &arg in node_list(self.ast, node) {
            if let NodeKind::Argument { arg: inner } = self.ast.kind(arg).clone() {
                self.select_expr(inner, None, potential);
            }
        }
    }

    /// Narrows `node`'s C8 candidate set against `required` (if any) and
    /// records the single survivor, reporting a mismatch for zero or an
    /// ambiguity for more than one. Returns the selected type so a caller
    /// can feed it forward as the `required` type for a sibling node (an
    /// assignment's LHS selects first, then drives its RHS).
    fn select(&mut self, node: NodeId, required: Option<TypeId>, potential: &PotentialTypeMap) -> Option<TypeId> {
        let pt = potential.get(node)?;
        let set = pt.as_set()?;
        let candidates: Vec<TypeId> = match required {
            Some(req) => set.iter().copied().filter(|&t| self.types.equivalent(t, req)).collect(),
            None => set.iter().copied().collect(),
        };
        match candidates.len() {
            0 => {
                self.handler
                    .build_error(self.ast.span(node), "expression has no type consistent with its context")
                    .code(E_TYPE_MISMATCH)
                    .emit(self.handler);
                None
            }
            1 => {
                self.tables.set_type(node, candidates[0]);
                Some(candidates[0])
            }
            _ => {
                self.handler
                    .build_error(self.ast.span(node), "ambiguous expression type")
                    .code(E_TYPE_AMBIGUOUS)
                    .emit(self.handler);
                self.tables.set_type(node, candidates[0]);
                Some(candidates[0])
            }
        }
    }

    fn select_expr(&mut self, node: NodeId, required: Option<TypeId>, potential: &PotentialTypeMap) -> Option<TypeId> {
        let resolved = self.select(node, required, potential);
        match self.ast.kind(node).clone() {
            NodeKind::UnaryExpression { operand, .. } => {
                self.select_expr(operand, None, potential);
            }
            NodeKind::CastExpression { expr, .. } => {
                self.select_expr(expr, None, potential);
            }
            NodeKind::BinaryExpression { left, right, .. } => {
                self.select_expr(left, None, potential);
                self.select_expr(right, None, potential);
            }
            NodeKind::MemberSelector { lhs, .. } => {
                self.select_expr(lhs, None, potential);
            }
            NodeKind::FunctionCall { lhs, args } => {
                let callee_ty = self.select_expr(lhs, None, potential);
                let param_types = callee_ty.and_then(|t| match self.types.kind(t).clone() {
                    TypeKind::Function { sig } => Some(sig.params),
                    _ => None,
                });
                for (i, &arg) in node_list(self.ast, args).iter().enumerate() {
                    let NodeKind::Argument { arg: inner } = self.ast.kind(arg).clone() else { continue };
                    let required = param_types.as_ref().and_then(|p| p.get(i)).map(|(_, t)| *t);
                    self.select_expr(inner, required, potential);
                }
            }
            NodeKind::ArraySubscript { lhs, index } => {
                self.select_expr(lhs, None, potential);
                match self.ast.kind(index).clone() {
                    NodeKind::IndexExpression { start_index, end_index } => {
                        self.select(index, None, potential);
                        let int_ty = Some(self.types.int(None));
                        self.select_expr(start_index, int_ty, potential);
                        if let Some(e) = end_index {
                            self.select_expr(e, int_ty, potential);
                        }
                    }
                    _ => {
                        let int_ty = Some(self.types.int(None));
                        self.select_expr(index, int_ty, potential);
                    }
                }
            }
            _ => {}
        }
        resolved
    }
}
