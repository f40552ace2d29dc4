//! C4: the type universe, and structural type equivalence over it.

use std::collections::HashMap;

use p4c_ast::NodeId;
use p4c_util::{define_idx, IndexVec, Symbol};

use crate::scope::RibId;

define_idx!(TypeId);

/// Bound on typedef-chain (and resolved-`NameRef`) forwarding-chain length
/// before C7's fix-up sweeps give up and report a diagnostic rather than
/// loop. spec.md §9's third Open Question leaves cycle *diagnosis*
/// unspecified and explicitly allows either an iteration bound or graph
/// coloring; this repo takes the iteration bound, grounded on
/// `original_source/cyclic_type.c` discussing (without resolving) the same
/// problem.
pub const MAX_TYPEDEF_CHAIN: usize = 256;

/// A declaration's signature, shared by parsers, controls, externs, and
/// actions: an ordered parameter list plus (for functions/methods) a
/// return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<(p4c_ast::ParamDirection, TypeId)>,
    pub ret: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: Symbol,
    pub ty: TypeId,
}

/// The closed set of types a P4 program's declarations and expressions can
/// have. `NameRef` is a transient placeholder produced while building C7's
/// declared types — every `NameRef` is resolved away (or turned into
/// `TypeError`) by the fix-up sweep that runs after the per-declaration
/// walk, so no other pass ever sees one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Void,
    Bool,
    Error,
    MatchKind,
    StringT,
    /// `int`/`int<N>` — `None` is the unsized constant form.
    Int(Option<u32>),
    /// `bit`/`bit<N>`.
    Bit(Option<u32>),
    Varbit(Option<u32>),
    Tuple(Vec<TypeId>),
    HeaderStack {
        element: TypeId,
        size: u32,
    },
    Header {
        name: Symbol,
        fields: Vec<Field>,
    },
    HeaderUnion {
        name: Symbol,
        fields: Vec<Field>,
    },
    Struct {
        name: Symbol,
        fields: Vec<Field>,
    },
    Enum {
        name: Symbol,
        /// `Some(bit<N>)` for a serializable enum, `None` for a plain one.
        underlying: Option<TypeId>,
        members: Vec<Symbol>,
    },
    Parser {
        name: Symbol,
        sig: Signature,
        /// Types of the optional `parser P(...)(ctor_params) { ... }` clause;
        /// empty when the declaration supplies none.
        ctor_params: Vec<TypeId>,
    },
    Control {
        name: Symbol,
        sig: Signature,
        ctor_params: Vec<TypeId>,
    },
    Package {
        name: Symbol,
        sig: Signature,
    },
    Extern {
        name: Symbol,
        methods: Vec<(Symbol, Signature)>,
        /// Subset of `methods` whose spelling matches `name` — the
        /// overloaded constructor set `potential_args` filters against at a
        /// `T(args)` instantiation site.
        ctors: Vec<Signature>,
    },
    Action {
        name: Symbol,
        sig: Signature,
    },
    Table {
        name: Symbol,
    },
    Function {
        sig: Signature,
    },
    /// A parser state declaration's own type; states aren't values and
    /// never participate in equivalence beyond identity, but C7 still gives
    /// every declaring site *some* `Type` so `decl.ty` is never `None` once
    /// construction finishes.
    State,
    /// The universal wildcard (`Any` in spec terms): equivalent to every
    /// other type, used for constructs (e.g. a `_` default-action slot)
    /// that accept any argument type without themselves constraining it.
    Any,
    /// An unresolved reference to a named type, by spelling, carrying the
    /// scope it was written in (resolution is scope-relative — the same
    /// spelling can name different declarations depending on where it's
    /// written). Only ever appears mid-construction in C7;
    /// `analysis.rs`'s first fix-up sweep replaces every occurrence with
    /// `Alias` before the pass returns.
    NameRef { name: Symbol, scope: RibId, node: NodeId },
    /// `typedef <ref> <name>;` before flattening. `ref` may itself still be
    /// a `NameRef` or another `Typedef` at construction time (typedefs may
    /// chain); C7's second fix-up sweep follows the chain and rewrites this
    /// entry to `Alias`.
    Typedef(TypeId),
    /// A forwarding node (spec's `Type{target:...}`): the identity created
    /// at a declaration site is preserved (so other, already-built `Field`s
    /// and `Signature`s that reference this `TypeId` keep working) while
    /// the slot itself is redirected to the type it actually means. Both
    /// fix-up sweeps compress multi-step chains down to a single `Alias`
    /// hop, so `actual_type` is O(1) after C7 returns.
    Alias(TypeId),
    /// Recovery sentinel for a type that failed to resolve; equivalent to
    /// everything, so one bad declaration doesn't cascade into spurious
    /// mismatches on its uses.
    TypeError,
}

/// The arena all of a compilation's types live in, plus interning for the
/// handful of singleton base types so `bool`/`void`/... are always the same
/// `TypeId` no matter how many declarations mention them.
pub struct TypeUniverse {
    types: IndexVec<TypeId, TypeKind>,
    singletons: HashMap<&'static str, TypeId>,
    sized_cache: HashMap<(u8, Option<u32>), TypeId>,
}

/// Discriminates `Int`/`Bit`/`Varbit` for `sized_cache`'s key without
/// needing `TypeKind` itself to be hashable.
const KIND_INT: u8 = 0;
const KIND_BIT: u8 = 1;
const KIND_VARBIT: u8 = 2;

impl TypeUniverse {
    pub fn new() -> Self {
        let mut u = Self {
            types: IndexVec::new(),
            singletons: HashMap::new(),
            sized_cache: HashMap::new(),
        };
        for (key, kind) in [
            ("void", TypeKind::Void),
            ("bool", TypeKind::Bool),
            ("error", TypeKind::Error),
            ("match_kind", TypeKind::MatchKind),
            ("string", TypeKind::StringT),
            ("state", TypeKind::State),
            ("any", TypeKind::Any),
        ] {
            let id = u.types.push(kind);
            u.singletons.insert(key, id);
        }
        u
    }

    pub fn void(&self) -> TypeId {
        self.singletons["void"]
    }
    pub fn bool_(&self) -> TypeId {
        self.singletons["bool"]
    }
    pub fn error(&self) -> TypeId {
        self.singletons["error"]
    }
    pub fn match_kind(&self) -> TypeId {
        self.singletons["match_kind"]
    }
    pub fn string(&self) -> TypeId {
        self.singletons["string"]
    }
    pub fn state(&self) -> TypeId {
        self.singletons["state"]
    }
    pub fn any(&self) -> TypeId {
        self.singletons["any"]
    }

    pub fn int(&mut self, width: Option<u32>) -> TypeId {
        self.sized(KIND_INT, width, TypeKind::Int(width))
    }
    pub fn bit(&mut self, width: Option<u32>) -> TypeId {
        self.sized(KIND_BIT, width, TypeKind::Bit(width))
    }
    pub fn varbit(&mut self, width: Option<u32>) -> TypeId {
        self.sized(KIND_VARBIT, width, TypeKind::Varbit(width))
    }

    fn sized(&mut self, kind: u8, width: Option<u32>, make: TypeKind) -> TypeId {
        if let Some(&id) = self.sized_cache.get(&(kind, width)) {
            return id;
        }
        let id = self.types.push(make);
        self.sized_cache.insert((kind, width), id);
        id
    }

    pub fn alloc(&mut self, kind: TypeKind) -> TypeId {
        self.types.push(kind)
    }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.types[id]
    }

    pub fn set_kind(&mut self, id: TypeId, kind: TypeKind) {
        self.types[id] = kind;
    }

    pub fn ids(&self) -> impl Iterator<Item = TypeId> {
        (0..self.types.len()).map(p4c_util::Idx::from_usize)
    }

    /// Strips one layer of `Alias` forwarding (spec's `actual_type`). After
    /// C7's fix-up sweeps compress every chain to a single hop, this is the
    /// O(1) operation spec.md §3's invariant promises.
    pub fn actual_type(&self, id: TypeId) -> TypeId {
        match self.kind(id) {
            TypeKind::Alias(target) => *target,
            _ => id,
        }
    }

    /// Follows an `Alias`/`Typedef` chain starting at `start` (not
    /// including `start` itself) to its terminal non-forwarding type,
    /// bounded by [`MAX_TYPEDEF_CHAIN`]. Returns `None` if the chain runs
    /// past the bound without terminating (a would-be cycle).
    pub fn follow_chain(&self, start: TypeId) -> Option<TypeId> {
        let mut current = start;
        for _ in 0..MAX_TYPEDEF_CHAIN {
            match self.kind(current) {
                TypeKind::Alias(next) | TypeKind::Typedef(next) => current = *next,
                _ => return Some(current),
            }
        }
        None
    }

    /// Structural equivalence (spec's coinductive definition): two named
    /// aggregate types are equal if their fields are pairwise equal, with
    /// a pair already on the comparison stack treated as equal so mutually
    /// recursive header-stack/struct cycles terminate instead of looping.
    pub fn equivalent(&self, a: TypeId, b: TypeId) -> bool {
        self.equivalent_rec(a, b, &mut Vec::new())
    }

    fn equivalent_rec(&self, a: TypeId, b: TypeId, seen: &mut Vec<(TypeId, TypeId)>) -> bool {
        let a = self.actual_type(a);
        let b = self.actual_type(b);
        if a == b {
            return true;
        }
        if seen.contains(&(a, b)) || seen.contains(&(b, a)) {
            return true;
        }
        use TypeKind::*;
        match (self.kind(a), self.kind(b)) {
            (TypeError, _) | (_, TypeError) => true,
            (Any, _) | (_, Any) => true,
            (State, State) => true,
            (Void, Void) | (Bool, Bool) | (Error, Error) | (MatchKind, MatchKind) | (StringT, StringT) => true,
            (Int(w1), Int(w2)) | (Bit(w1), Bit(w2)) | (Varbit(w1), Varbit(w2)) => w1 == w2,
            (Tuple(ts1), Tuple(ts2)) => {
                ts1.len() == ts2.len()
                    && ts1.iter().zip(ts2).all(|(&x, &y)| self.equivalent_rec(x, y, seen))
            }
            (HeaderStack { element: e1, size: s1 }, HeaderStack { element: e2, size: s2 }) => {
                s1 == s2 && self.equivalent_rec(*e1, *e2, seen)
            }
            (Header { fields: f1, .. }, Header { fields: f2, .. })
            | (HeaderUnion { fields: f1, .. }, HeaderUnion { fields: f2, .. })
            | (Struct { fields: f1, .. }, Struct { fields: f2, .. }) => {
                seen.push((a, b));
                let eq = f1.len() == f2.len()
                    && f1
                        .iter()
                        .zip(f2)
                        .all(|(x, y)| x.name == y.name && self.equivalent_rec(x.ty, y.ty, seen));
                seen.pop();
                eq
            }
            (Enum { name: n1, members: m1, .. }, Enum { name: n2, members: m2, .. }) => {
                n1 == n2 && m1 == m2
            }
            (Function { sig: s1 }, Function { sig: s2 }) => {
                self.signature_equivalent(s1, s2, seen, true)
            }
            (Parser { sig: s1, .. }, Parser { sig: s2, .. })
            | (Control { sig: s1, .. }, Control { sig: s2, .. })
            | (Package { sig: s1, .. }, Package { sig: s2, .. }) => {
                self.signature_equivalent(s1, s2, seen, false)
            }
            (Extern { name: n1, .. }, Extern { name: n2, .. })
            | (Table { name: n1 }, Table { name: n2 })
            | (Action { name: n1, .. }, Action { name: n2, .. }) => n1 == n2,
            _ => false,
        }
    }

    /// Shared by `Function`/`Parser`/`Control`/`Package`: pointwise-equal
    /// parameter products (direction and type), plus (for `Function`) an
    /// equal return type.
    fn signature_equivalent(
        &self,
        s1: &Signature,
        s2: &Signature,
        seen: &mut Vec<(TypeId, TypeId)>,
        check_return: bool,
    ) -> bool {
        if s1.params.len() != s2.params.len() {
            return false;
        }
        let params_eq = s1
            .params
            .iter()
            .zip(&s2.params)
            .all(|((d1, t1), (d2, t2))| d1 == d2 && self.equivalent_rec(*t1, *t2, seen));
        if !params_eq {
            return false;
        }
        if !check_return {
            return true;
        }
        match (s1.ret, s2.ret) {
            (Some(r1), Some(r2)) => self.equivalent_rec(r1, r2, seen),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Default for TypeUniverse {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sized_bit_types_are_interned() {
        let mut u = TypeUniverse::new();
        assert_eq!(u.bit(Some(8)), u.bit(Some(8)));
        assert_ne!(u.bit(Some(8)), u.bit(Some(16)));
    }

    #[test]
    fn structurally_identical_headers_are_equivalent() {
        let mut u = TypeUniverse::new();
        let w8 = u.bit(Some(8));
        let f = vec![Field { name: Symbol::intern("x"), ty: w8 }];
        let h1 = u.alloc(TypeKind::Header { name: Symbol::intern("A"), fields: f.clone() });
        let h2 = u.alloc(TypeKind::Header { name: Symbol::intern("B"), fields: f });
        assert!(u.equivalent(h1, h2));
    }

    #[test]
    fn type_error_is_equivalent_to_anything() {
        let mut u = TypeUniverse::new();
        let bit8 = u.bit(Some(8));
        let err = u.alloc(TypeKind::TypeError);
        assert!(u.equivalent(bit8, err));
    }
}
