//! Type-system data model consumed by the reachability engine.
//!
//! The engine never type-checks source; it receives an already-built type
//! universe from the loader and only queries it. Two submodules:
//!
//! - [`arena`]: interned type storage with `TypeId` handles
//! - [`method_set`]: method sets and the shared method-set cache

pub mod arena;
pub mod method_set;

pub use arena::{
    Basic, IfaceMethod, MethodDecl, NamedDef, NamedId, PackageId, TypeId, TypeKind, TypeTable,
};
pub use method_set::{MethodSel, MethodSet, MethodSetCache, ObjId};
