//! Builder pattern API for running an analysis.
//!
//! Provides a fluent interface over the engine's single operation:
//!
//! ```rust,ignore
//! use deadfunc_core::prelude::*;
//!
//! let result = Deadfunc::new(&program)
//!     .roots([main_fn])
//!     .analyze()?;
//!
//! for (f, info) in &result.reachable {
//!     println!("live: {} (addr_taken: {})", program.func(*f).qualified, info.addr_taken);
//! }
//! ```

use crate::error::{DeadfuncError, DeadfuncResult};
use crate::reflection::ReflectionAllowlist;
use crate::rta::{self, RtaResult};
use crate::ssa::{FuncId, Program};

/// Builder for configuring a reachability analysis.
#[derive(Debug)]
pub struct Deadfunc<'p> {
    program: &'p Program,

    /// Entry points; must be executable (instantiated or non-generic).
    roots: Vec<FuncId>,

    /// Reflection-consumer database; defaults to the established table.
    allowlist: ReflectionAllowlist,
}

impl<'p> Deadfunc<'p> {
    /// Create a new analysis builder over an SSA program.
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            roots: Vec::new(),
            allowlist: ReflectionAllowlist::with_defaults(),
        }
    }

    /// Add a single entry point.
    pub fn root(mut self, f: FuncId) -> Self {
        self.roots.push(f);
        self
    }

    /// Add entry points.
    pub fn roots(mut self, roots: impl IntoIterator<Item = FuncId>) -> Self {
        self.roots.extend(roots);
        self
    }

    /// Replace the reflection-consumer allow-list.
    pub fn with_allowlist(mut self, allowlist: ReflectionAllowlist) -> Self {
        self.allowlist = allowlist;
        self
    }

    /// Run the analysis to its fixed point.
    ///
    /// Rejects an empty root set and template roots with typed errors; the
    /// core itself treats an empty root set as a nil result.
    pub fn analyze(self) -> DeadfuncResult<RtaResult> {
        if self.roots.is_empty() {
            return Err(DeadfuncError::EmptyRoots);
        }
        for &f in &self.roots {
            let func = self.program.func(f);
            if func.is_template {
                return Err(DeadfuncError::invalid_root(
                    &func.qualified,
                    "uninstantiated generic template cannot be an entry point",
                ));
            }
        }
        rta::analyze_with(self.program, &self.roots, &self.allowlist)
            .ok_or(DeadfuncError::EmptyRoots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssa::ProgramBuilder;

    #[test]
    fn test_empty_roots_is_an_error() {
        let b = ProgramBuilder::new();
        let prog = b.finish();
        let err = Deadfunc::new(&prog).analyze().unwrap_err();
        assert!(matches!(err, DeadfuncError::EmptyRoots));
    }

    #[test]
    fn test_template_root_is_rejected() {
        let mut b = ProgramBuilder::new();
        let pkg = b.package("example.com/app");
        let sig = b.signature(&[], &[]);
        let tmpl = b.template(Some(pkg), "Map", sig);
        let prog = b.finish();

        let err = Deadfunc::new(&prog).root(tmpl).analyze().unwrap_err();
        assert!(matches!(err, DeadfuncError::InvalidRoot { .. }));
    }

    #[test]
    fn test_analyze_reaches_roots() {
        let mut b = ProgramBuilder::new();
        let pkg = b.package("example.com/app");
        let sig = b.signature(&[], &[]);
        let main = b.function(Some(pkg), "main", sig);
        b.body(main, vec![]);
        let prog = b.finish();

        let result = Deadfunc::new(&prog).root(main).analyze().unwrap();
        assert!(result.is_reachable(main));
    }
}
