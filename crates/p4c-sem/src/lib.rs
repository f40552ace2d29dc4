//! Semantic analysis for the P4 front end: scopes, the type universe, and
//! the declared/potential/select type passes that turn a parsed program
//! into a fully-typed one.
//!
//! The pipeline is a fixed sequence of passes over one parsed [`p4c_ast::Ast`]:
//!
//! 1. scope hierarchy + name binding (`analysis::bind_program`)
//! 2. declared types, built against the completed scope tree, plus the
//!    fix-up sweeps that resolve named-type references and flatten typedef
//!    chains (`analysis::build_declared_types` and friends)
//! 3. potential types: bottom-up candidate sets for every expression
//!    (`infer::infer_potential_types`)
//! 4. select-type: top-down disambiguation against context
//!    (`infer::select_types`)
//!
//! [`analyze`] runs all four and returns the tables later passes (or a
//! driver emitting diagnostics) read from.

mod analysis;
mod edge_cases;
mod hir;
mod infer;
mod scope;
mod types;

pub use analysis::{analyze, SemaTables};
pub use hir::{Definition, KeyEntry, PotentialType};
pub use infer::PotentialTypeMap;
pub use scope::{Namespace, NameDeclId, NameDeclaration, RibId, RibKind, ScopeTree};
pub use types::{Field, Signature, TypeId, TypeKind, TypeUniverse, MAX_TYPEDEF_CHAIN};
