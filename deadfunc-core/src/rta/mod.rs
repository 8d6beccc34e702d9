//! Rapid Type Analysis: reachability from program entry points.
//!
//! The algorithm tabulates two cross-products by dynamic programming. For
//! plain function values it pairs the set of known address-taken functions
//! with the set of known dynamic call sites of the same signature: each new
//! function becomes reachable from each known site, each new site reaches
//! each known function. For interface dispatch it pairs the set of known
//! runtime types (types that may appear inside an interface value, or be
//! derived from one via reflection) with the set of known invoke sites,
//! resolving the concrete method per pair.
//!
//! Each function that becomes reachable is scanned once for further call
//! sites, address-taken functions, and runtime types; the process runs to a
//! fixed point. Exported methods of runtime types stay reachable because
//! reflection may call them, except where a conversion's context proves a
//! narrower set (see [`crate::reflection`]).
//!
//! This implementation is tuned for reachability only: it does not build a
//! call graph.

mod conversions;
mod runtime_types;
mod scan;
mod tables;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::compliance::ComplianceCache;
use crate::index::ImplIndex;
use crate::reflection::ReflectionAllowlist;
use crate::ssa::{FuncId, MethodRef, Program};
use crate::types::{ObjId, TypeId};

const INITIAL_WORKLIST_CAP: usize = 2048;

/// Reachability record for one function.
///
/// Deliberately a struct rather than a bare bool so membership tests read
/// as `result.reachable.contains_key(..)` and never as a truthiness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reachable {
    /// Whether the function's identity escapes as a value (stored, passed,
    /// registered as a finalizer, or dispatched through an interface).
    pub addr_taken: bool,
}

/// Summary counters over an analysis result.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RtaStats {
    pub reachable_functions: usize,
    pub address_taken: usize,
    pub reachable_objects: usize,
    pub runtime_types: usize,
}

/// The outcome of one analysis run.
#[derive(Debug, Clone, Default)]
pub struct RtaResult {
    /// Reachable functions and whether each is address-taken.
    pub reachable: FxHashMap<FuncId, Reachable>,
    /// Reachable method identities with no SSA body (generic template
    /// methods reached through the type system).
    pub reachable_objects: FxHashSet<ObjId>,
    /// Runtime types; the value is `skip_methods`: true when the type was
    /// added structurally and its exported methods were not force-marked.
    pub runtime_types: FxHashMap<TypeId, bool>,
}

impl RtaResult {
    pub fn is_reachable(&self, f: FuncId) -> bool {
        self.reachable.contains_key(&f)
    }

    pub fn is_addr_taken(&self, f: FuncId) -> bool {
        self.reachable.get(&f).is_some_and(|r| r.addr_taken)
    }

    pub fn stats(&self) -> RtaStats {
        RtaStats {
            reachable_functions: self.reachable.len(),
            address_taken: self.reachable.values().filter(|r| r.addr_taken).count(),
            reachable_objects: self.reachable_objects.len(),
            runtime_types: self.runtime_types.len(),
        }
    }

    /// Machine-readable summary, sorted for stable output.
    pub fn to_json(&self, prog: &Program) -> serde_json::Value {
        let mut functions: Vec<serde_json::Value> = self
            .reachable
            .iter()
            .map(|(&f, r)| {
                serde_json::json!({
                    "function": prog.func(f).qualified,
                    "addr_taken": r.addr_taken,
                })
            })
            .collect();
        functions.sort_by(|a, b| a["function"].as_str().cmp(&b["function"].as_str()));

        serde_json::json!({
            "functions": functions,
            "stats": self.stats(),
        })
    }
}

/// Working state of the fixed-point loop.
pub(crate) struct Rta<'p> {
    pub(crate) prog: &'p Program,
    pub(crate) allowlist: &'p ReflectionAllowlist,
    pub(crate) result: RtaResult,

    /// Function currently being scanned, for context-sensitive conversion
    /// handling.
    pub(crate) current: Option<FuncId>,
    pub(crate) worklist: Vec<FuncId>,

    /// Known address-taken functions, grouped by signature.
    pub(crate) addr_taken_by_sig: FxHashMap<TypeId, FxHashSet<FuncId>>,
    /// Known dynamic call sites (enclosing function), grouped by signature.
    pub(crate) dyn_call_sites: FxHashMap<TypeId, Vec<FuncId>>,
    /// Known invoke sites, grouped by canonical interface.
    pub(crate) invoke_sites: FxHashMap<TypeId, Vec<MethodRef>>,

    pub(crate) cache: ComplianceCache,
    pub(crate) index: ImplIndex,

    /// The reflection library's generic call entry point, if imported.
    pub(crate) reflective_call: Option<FuncId>,
}

/// Run the analysis from the given roots with the default reflection
/// allow-list. Returns `None` for an empty root set.
///
/// Roots must be executable entry points of a complete program; callers
/// pre-filter uninstantiated generic templates.
pub fn analyze(prog: &Program, roots: &[FuncId]) -> Option<RtaResult> {
    let allowlist = ReflectionAllowlist::with_defaults();
    analyze_with(prog, roots, &allowlist)
}

/// [`analyze`] with a caller-supplied reflection allow-list.
pub fn analyze_with(
    prog: &Program,
    roots: &[FuncId],
    allowlist: &ReflectionAllowlist,
) -> Option<RtaResult> {
    if roots.is_empty() {
        return None;
    }

    let mut r = Rta {
        prog,
        allowlist,
        result: RtaResult::default(),
        current: None,
        worklist: Vec::with_capacity(INITIAL_WORKLIST_CAP),
        addr_taken_by_sig: FxHashMap::default(),
        dyn_call_sites: FxHashMap::default(),
        invoke_sites: FxHashMap::default(),
        cache: ComplianceCache::new(),
        index: ImplIndex::new(),
        reflective_call: prog.reflective_call_entry(),
    };

    for &root in roots {
        r.mark_reachable(root, false);
    }

    // Swap-and-drain double buffering: the drained buffer keeps its
    // capacity, newly discovered functions append to the other one, and
    // the buffer being iterated is never mutated.
    let mut shadow: Vec<FuncId> = Vec::with_capacity(INITIAL_WORKLIST_CAP);
    while !r.worklist.is_empty() {
        std::mem::swap(&mut r.worklist, &mut shadow);
        for f in shadow.drain(..) {
            r.scan_function(f);
        }
    }

    Some(r.result)
}

impl<'p> Rta<'p> {
    /// Record `f` as potentially callable at run time and queue it for its
    /// one scan. Re-marking only upgrades the address-taken flag.
    pub(crate) fn mark_reachable(&mut self, f: FuncId, addr_taken: bool) {
        use std::collections::hash_map::Entry;
        match self.result.reachable.entry(f) {
            Entry::Occupied(mut e) => {
                if addr_taken {
                    e.get_mut().addr_taken = true;
                }
            }
            Entry::Vacant(e) => {
                e.insert(Reachable { addr_taken });
                self.worklist.push(f);
                self.mark_template_of(f);
            }
        }
    }

    /// An instantiation keeps its generic template alive: the template goes
    /// into the reachable set, but is not queued, since its code lives in
    /// its instantiations.
    fn mark_template_of(&mut self, f: FuncId) {
        let Some(origin) = self.prog.func(f).origin else {
            return;
        };
        if origin == f {
            return;
        }
        self.result
            .reachable
            .entry(origin)
            .or_insert(Reachable { addr_taken: false });
    }

    /// Track a method identity that has no SSA body.
    pub(crate) fn mark_object(&mut self, obj: ObjId) {
        self.result.reachable_objects.insert(obj);
    }
}
