//! C3: scopes and the three-namespace binding table; C5/C6's shared
//! declaration record.
//!
//! Generalizes the teacher's single-namespace `Rib`/`RibKind`/`ScopeTree`
//! (one `HashMap<Symbol, DefId>` per scope, a parent chain, `enter_scope`/
//! `exit_scope`/`add_binding`/`resolve`) to the three namespaces a P4
//! program resolves names in: ordinary values, types, and the fixed keyword
//! set. A name is looked up in exactly one namespace at a time — there is
//! no fallback between them — so each `Rib` carries three independent maps
//! rather than one.
//!
//! Unlike the teacher's version, binding a second declaration under the same
//! (scope, namespace, spelling) never overwrites the first: spec.md §4.2
//! requires overload sets (overloaded extern methods, operators, and
//! constructors sharing a name with their enclosing type) to survive as a
//! chain, with ambiguity deferred to the point a name is actually referenced
//! (C7/C9), not rejected at bind time.

use p4c_util::{define_idx, IndexVec, StrMap, Symbol};

use crate::types::TypeId;

define_idx!(RibId);
define_idx!(NameDeclId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Var,
    Type,
    Keyword,
}

/// What kind of syntactic construct opened this scope; currently only used
/// for diagnostics (e.g. reporting "inside control body" rather than a bare
/// span), since every rib resolves names identically regardless of kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RibKind {
    Root,
    Program,
    Parser,
    ParserState,
    Control,
    Action,
    Function,
    Extern,
    Apply,
    Block,
}

/// One declaring occurrence of a spelling (spec.md's `NameDeclaration`).
/// Created exactly once per declaring AST node by C6's `bind`; `ty` starts
/// empty and is filled in by C7 once the declaration's `Type` exists.
#[derive(Debug, Clone, Copy)]
pub struct NameDeclaration {
    pub spelling: Symbol,
    pub node: p4c_ast::NodeId,
    pub namespace: Namespace,
    pub scope: RibId,
    /// Previous declaration sharing this (scope, namespace, spelling) slot,
    /// forming the overload chain reference sites walk.
    pub next_in_scope: Option<NameDeclId>,
    pub ty: Option<TypeId>,
}

/// What a namespace lookup resolves to: either a user declaration (walk
/// `next_in_scope` from here for the rest of the overload set) or one of
/// the fixed keyword/base-type names preloaded at the root, which have no
/// declaring AST node of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Definition {
    Decl(NameDeclId),
    Builtin(Symbol),
}

/// spec.md §3's per-scope name table: one [`StrMap`] per namespace, keyed by
/// the identifier's spelling directly rather than through `Symbol`'s
/// interned index, matching C1's string-keyed-map container (§4.1) instead
/// of reaching for a generic hash map.
#[derive(Default)]
struct Rib {
    parent: Option<RibId>,
    vars: StrMap<Definition>,
    types: StrMap<Definition>,
    keywords: StrMap<Definition>,
}

impl Rib {
    fn map(&self, ns: Namespace) -> &StrMap<Definition> {
        match ns {
            Namespace::Var => &self.vars,
            Namespace::Type => &self.types,
            Namespace::Keyword => &self.keywords,
        }
    }

    fn map_mut(&mut self, ns: Namespace) -> &mut StrMap<Definition> {
        match ns {
            Namespace::Var => &mut self.vars,
            Namespace::Type => &mut self.types,
            Namespace::Keyword => &mut self.keywords,
        }
    }
}

pub struct ScopeTree {
    ribs: IndexVec<RibId, Rib>,
    rib_kinds: IndexVec<RibId, RibKind>,
    pub decls: IndexVec<NameDeclId, NameDeclaration>,
    pub root: RibId,
}

impl ScopeTree {
    /// A fresh tree with the root scope already preloaded with the fixed
    /// keyword set and the built-in base-type/action names (spec's §4.2
    /// root-scope preload: `accept, reject, void, bool, int, bit, varbit,
    /// string, error, match_kind, _`).
    pub fn new() -> Self {
        let mut ribs = IndexVec::new();
        let mut rib_kinds = IndexVec::new();
        let root = ribs.push(Rib::default());
        rib_kinds.push(RibKind::Root);
        let mut tree = Self { ribs, rib_kinds, decls: IndexVec::new(), root };
        tree.preload_builtins();
        tree
    }

    fn preload_builtins(&mut self) {
        // spec.md §4.2: `accept`/`reject`/`_` are Var-namespace built-ins
        // (state names and the wildcard live alongside ordinary variables),
        // not reserved words — `infer_name` resolves them through the same
        // plain Var lookup as any other name, with no Keyword fallback.
        const VAR_BUILTINS: &[&str] = &["accept", "reject", "_"];
        const BUILTIN_TYPES: &[&str] =
            &["void", "bool", "int", "bit", "varbit", "string", "error", "match_kind"];

        for name in VAR_BUILTINS {
            let sym = Symbol::intern(name);
            self.ribs[self.root].vars.insert(sym.as_str(), Definition::Builtin(sym), false);
        }
        for ty in BUILTIN_TYPES {
            let sym = Symbol::intern(ty);
            self.ribs[self.root].types.insert(sym.as_str(), Definition::Builtin(sym), false);
        }
    }

    pub fn enter_scope(&mut self, parent: RibId, kind: RibKind) -> RibId {
        let id = self.ribs.push(Rib { parent: Some(parent), ..Rib::default() });
        self.rib_kinds.push(kind);
        id
    }

    pub fn kind_of(&self, rib: RibId) -> RibKind {
        self.rib_kinds[rib]
    }

    /// Creates a `NameDeclaration` for `node` under `spelling` in `ns`,
    /// chaining it onto any existing declaration in the same (scope, ns,
    /// spelling) slot rather than replacing it — spec's overload-chain
    /// binding rule. Returns the new declaration's id.
    pub fn bind(
        &mut self,
        rib: RibId,
        ns: Namespace,
        spelling: Symbol,
        node: p4c_ast::NodeId,
    ) -> NameDeclId {
        let previous = match self.ribs[rib].map(ns).lookup(spelling.as_str()) {
            Some(Definition::Decl(prev)) => Some(*prev),
            _ => None,
        };
        let id = self.decls.push(NameDeclaration {
            spelling,
            node,
            namespace: ns,
            scope: rib,
            next_in_scope: previous,
            ty: None,
        });
        self.ribs[rib].map_mut(ns).insert(spelling.as_str(), Definition::Decl(id), false);
        id
    }

    pub fn set_decl_type(&mut self, decl: NameDeclId, ty: TypeId) {
        self.decls[decl].ty = Some(ty);
    }

    pub fn decl(&self, id: NameDeclId) -> &NameDeclaration {
        &self.decls[id]
    }

    /// Walks `rib → parent → …` looking for `name` in `ns`, innermost scope
    /// first; stops at the first scope where the spelling has any entry at
    /// all, even if that entry is itself ambiguous (spec.md §4.2).
    pub fn lookup(&self, rib: RibId, ns: Namespace, name: Symbol) -> Option<Definition> {
        let mut current = Some(rib);
        while let Some(id) = current {
            if let Some(def) = self.ribs[id].map(ns).lookup(name.as_str()) {
                return Some(*def);
            }
            current = self.ribs[id].parent;
        }
        None
    }

    /// Looks up a name directly in the root scope, bypassing the chain —
    /// used when a caller already knows a name must be a keyword or
    /// built-in rather than a user declaration.
    pub fn lookup_builtin(&self, ns: Namespace, name: Symbol) -> Option<Definition> {
        self.ribs[self.root].map(ns).lookup(name.as_str()).copied()
    }

    /// All declarations chained under `def` (the full overload set), in
    /// most-recently-bound-first order.
    pub fn overload_set(&self, def: Definition) -> Vec<NameDeclId> {
        let mut out = Vec::new();
        if let Definition::Decl(mut cur) = def {
            loop {
                out.push(cur);
                match self.decls[cur].next_in_scope {
                    Some(next) => cur = next,
                    None => break,
                }
            }
        }
        out
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}
