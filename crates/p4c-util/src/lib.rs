//! p4c-util - Core Utilities and Foundation Types
//!
//! Fundamental types shared by every later stage of the pipeline: the
//! arena-backed containers the rest of the compiler is built on (C1), an
//! interned `Symbol` with precompiled constants for keywords and built-ins,
//! source location tracking (`Span`/`SourceMap`), typed-index vectors
//! (`IndexVec`), and the `Handler`/`Diagnostic`/`DiagnosticBuilder` error
//! reporting stack.
//!
//! Everything here is infrastructure: it has no notion of P4 syntax or
//! semantics beyond the symbol table's precompiled keyword constants.

pub mod container;
pub mod def_id;
pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use container::{Arena, IdentityMap, SegmentedArray, StrMap};
pub use def_id::{DefId, DefIdGenerator};
pub use diagnostic::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Handler, Level};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, Span};
pub use symbol::Symbol;

// Re-export commonly used hash collection types, consistent with the rest
// of the pipeline using rustc-hash instead of the stdlib's SipHash maps.
pub use rustc_hash::{FxHashMap, FxHashSet};
