//! SSA program model consumed by the reachability engine.
//!
//! The engine does not build SSA; the loader does, ahead of analysis, and
//! hands over a finished [`Program`]. Functions are identified by [`FuncId`]
//! handles, instructions are a closed sum type ([`instr::Instr`]), and the
//! program owns the shared method-set cache the engine borrows from.

pub mod build;
pub mod instr;

use std::sync::Arc;

use crate::types::{MethodSet, MethodSetCache, PackageId, TypeId, TypeTable};

pub use build::ProgramBuilder;
pub use instr::{BasicBlock, CallInstr, Callee, Instr, MethodRef, Value};

/// Handle to a function in the program. Copyable, hashable, O(1) equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncId(pub(crate) u32);

impl FuncId {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// A package of the analyzed program.
#[derive(Debug, Clone)]
pub struct Package {
    pub path: String,
    /// User code (module-path shaped import path) as opposed to the
    /// standard library. Stdlib paths have no dot in their first segment.
    pub user: bool,
    /// Named types declared at package level, for implementation scans.
    pub named_types: Vec<TypeId>,
}

/// True for module-shaped paths like `github.com/acme/tool`, false for
/// stdlib paths like `fmt` or `internal/abi`.
pub(crate) fn is_user_path(path: &str) -> bool {
    match path.split('/').next() {
        Some(first) => first.contains('.'),
        None => false,
    }
}

/// A callable unit of the SSA program.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    /// Fully qualified rendering, e.g. `fmt.Printf` or
    /// `(*encoding/json.Encoder).Encode`. Keys the reflection allow-list.
    pub qualified: String,
    pub pkg: Option<PackageId>,
    pub signature: TypeId,
    /// The generic template this function was instantiated from, if any.
    pub origin: Option<FuncId>,
    /// Uninstantiated generic template: carries type parameters and must
    /// not be used as an entry point.
    pub is_template: bool,
    pub blocks: Vec<BasicBlock>,
}

/// A complete SSA program: the engine's read-only world.
#[derive(Debug)]
pub struct Program {
    pub(crate) types: TypeTable,
    pub(crate) packages: Vec<Package>,
    pub(crate) funcs: Vec<Function>,
    pub(crate) method_sets: MethodSetCache,
    pub(crate) reflective_call: Option<FuncId>,
}

impl Program {
    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn func(&self, f: FuncId) -> &Function {
        &self.funcs[f.0 as usize]
    }

    pub fn func_ids(&self) -> impl Iterator<Item = FuncId> {
        (0..self.funcs.len() as u32).map(FuncId)
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn package(&self, p: PackageId) -> &Package {
        &self.packages[p.0 as usize]
    }

    pub fn package_path(&self, p: PackageId) -> &str {
        &self.packages[p.0 as usize].path
    }

    /// The shared method set of `t`. Never construct method sets elsewhere;
    /// every query goes through the program's cache.
    pub fn method_set(&self, t: TypeId) -> Arc<MethodSet> {
        self.method_sets
            .method_set(&self.types, |p| self.packages[p.0 as usize].path.as_str(), t)
    }

    /// How many method sets the cache has built. Flat across repeated
    /// analyses of the same program.
    pub fn method_sets_constructed(&self) -> usize {
        self.method_sets.constructed()
    }

    /// The reflection library's generic method-invocation entry point, if
    /// the program depends on it. Its presence makes every address-taken
    /// function reachable regardless of signature.
    pub fn reflective_call_entry(&self) -> Option<FuncId> {
        self.reflective_call
    }

    pub fn is_stdlib_function(&self, f: FuncId) -> bool {
        match self.func(f).pkg {
            Some(p) => !self.packages[p.0 as usize].user,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_user_path() {
        assert!(is_user_path("github.com/acme/tool"));
        assert!(is_user_path("example.com/app"));
        assert!(!is_user_path("fmt"));
        assert!(!is_user_path("encoding/json"));
        assert!(!is_user_path("internal/abi"));
        assert!(!is_user_path(""));
    }
}
