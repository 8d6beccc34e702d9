//! deadfunc-core: reachability engine for unused-function detection.
//!
//! Implements a modified Rapid Type Analysis over an externally built SSA
//! program: starting from the entry points, it computes the exact set of
//! functions, methods, and runtime types the program may need at execution
//! time. Dead-code reporting, package loading, and parsing are separate
//! collaborators; this crate is only the fixed point.
//!
//! # Features
//!
//! - **Cross-product tabulation**: address-taken functions x dynamic call
//!   sites by signature; runtime types x interface invoke sites by interface
//! - **Fingerprinted compliance checks**: a 64-bit method-set mask rejects
//!   most non-implementing pairs before the authoritative comparison
//! - **Context-aware reflection**: conversions feeding known consumers
//!   (JSON, fmt, XML, ...) mark only the methods those consumers invoke
//! - **Marker-method support**: unexported interface methods resolve through
//!   their defining package, so type-discrimination patterns stay precise
//! - **Generic awareness**: reachable instantiations keep their templates in
//!   the result; template methods without bodies are tracked by identity
//! - **Finalizer detection**: callables registered with the runtime
//!   finalizer hook are reachable even though the GC calls them
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use deadfunc_core::prelude::*;
//!
//! let result = Deadfunc::new(&program)
//!     .roots(entry_points)
//!     .analyze()?;
//!
//! for f in program.func_ids().filter(|&f| !result.is_reachable(f)) {
//!     println!("dead: {}", program.func(f).qualified);
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`ssa`]: the SSA program model the engine consumes
//! - [`types`]: interned type arena, method sets, shared method-set cache
//! - [`fingerprint`]: method-set bitmask summaries
//! - [`compliance`]: implements-oracle and concrete-method resolution
//! - [`index`]: lazy interface <-> implementers index
//! - [`reflection`]: allow-list of reflection-consuming library functions
//! - [`rta`]: the worklist driver and cross-product tables
//! - [`builder`]: fluent entry API
//! - [`error`]: typed error handling
//! - [`logging`]: structured logging bootstrap

pub mod builder;
pub mod compliance;
pub mod error;
pub mod fingerprint;
pub mod index;
pub mod logging;
pub mod prelude;
pub mod reflection;
pub mod rta;
pub mod ssa;
pub mod types;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{DeadfuncError, DeadfuncResult};

// Builder API
pub use builder::Deadfunc;

// Engine entry point and result types
pub use rta::{analyze, analyze_with, Reachable, RtaResult, RtaStats};

// Program model
pub use ssa::{
    BasicBlock, CallInstr, Callee, FuncId, Function, Instr, MethodRef, Package, Program,
    ProgramBuilder, Value,
};

// Type model
pub use types::{
    Basic, IfaceMethod, MethodDecl, MethodSel, MethodSet, NamedDef, ObjId, PackageId, TypeId,
    TypeKind, TypeTable,
};

// Compliance oracle
pub use compliance::{locate_method, ComplianceCache, ConcreteTypeInfo, InterfaceTypeInfo};

// Implementation index
pub use index::ImplIndex;

// Reflection allow-list
pub use reflection::{ReflectionAllowlist, FALLBACK_REFLECTION_METHODS};

// Fingerprinting
pub use fingerprint::fingerprint;

// Logging
pub use logging::init_structured_logging;
