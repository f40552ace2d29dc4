//! Small shared types the C8/C9 passes key their side tables by. The
//! binding a name resolves to (`Definition`) and the overload-chain
//! machinery it rides on live in `scope.rs`, next to the `ScopeTree` they
//! belong to; this module just re-exports it under the name spec.md uses
//! so callers reading `crate::hir::Definition` land on the right concept.

pub use crate::scope::Definition;

use p4c_util::Symbol;

use crate::types::TypeId;

/// One entry of a `key { ... }` table property, with its operand already
/// bound to the value it's keyed on. Recorded by C7 while walking a
/// `TableDecl` so later code doesn't need to re-walk the `KeyElementList`
/// to relate a match-kind to its expression.
#[derive(Debug, Clone, Copy)]
pub struct KeyEntry {
    pub expr: p4c_ast::NodeId,
    pub match_kind: Symbol,
}

/// C8's output at one AST node: either the set of candidate types an
/// expression could have absent outer context, or (at an argument/parameter
/// list) the fixed-arity product of its elements' own `PotentialType`s.
/// `Set` uses an `IndexSet` purely for the "unique-keyed set with
/// deterministic iteration" property spec.md calls for; any set structure
/// with those two properties would do.
#[derive(Debug, Clone)]
pub enum PotentialType {
    Set(indexmap::IndexSet<TypeId>),
    Product(Vec<PotentialType>),
}

impl PotentialType {
    pub fn singleton(ty: TypeId) -> Self {
        let mut set = indexmap::IndexSet::new();
        set.insert(ty);
        PotentialType::Set(set)
    }

    pub fn empty_set() -> Self {
        PotentialType::Set(indexmap::IndexSet::new())
    }

    pub fn as_set(&self) -> Option<&indexmap::IndexSet<TypeId>> {
        match self {
            PotentialType::Set(s) => Some(s),
            PotentialType::Product(_) => None,
        }
    }

    pub fn as_product(&self) -> Option<&[PotentialType]> {
        match self {
            PotentialType::Product(p) => Some(p),
            PotentialType::Set(_) => None,
        }
    }
}
