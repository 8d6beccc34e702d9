//! Pre-computed interface-implementation index.
//!
//! Bidirectional map {interface <-> implementing concrete types}, built
//! lazily the first time a type assertion forces a whole-program answer,
//! then updated incrementally as new runtime types surface.
//!
//! Scope is deliberate: the build enumerates named types from *user*
//! packages (plus whatever is already a runtime type). Stdlib assertion
//! sites are restricted by the caller to observed runtime types, so a
//! stray stdlib probe never makes every `String()` method in the program
//! artificially live.
//!
//! Performance characteristics:
//! - Build: one N x M sweep, fingerprint-gated, per analysis
//! - Queries and incremental updates afterwards: O(1) map lookups

use rustc_hash::{FxHashMap, FxHashSet};

use crate::compliance::{implements, ComplianceCache};
use crate::fingerprint::subset;
use crate::ssa::Program;
use crate::types::TypeId;

/// The implementation index. `built` flips once; queries before the build
/// see empty answers, which is why callers trigger [`ImplIndex::build`]
/// first.
#[derive(Debug, Default)]
pub struct ImplIndex {
    built: bool,
    user_types: Vec<TypeId>,
    iface_to_types: FxHashMap<TypeId, Vec<TypeId>>,
    type_to_ifaces: FxHashMap<TypeId, Vec<TypeId>>,
}

impl ImplIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Concrete types implementing `iface`. Empty before the build or for
    /// an unknown interface.
    pub fn types_for(&self, iface: TypeId) -> &[TypeId] {
        self.iface_to_types.get(&iface).map_or(&[], |v| v.as_slice())
    }

    /// Distinguishes "never computed" from "computed, none found".
    pub fn get(&self, iface: TypeId) -> Option<&Vec<TypeId>> {
        self.iface_to_types.get(&iface)
    }

    /// Record a result computed outside the index (the pre-build fallback
    /// sweep), so later queries hit.
    pub fn set(&mut self, iface: TypeId, types: Vec<TypeId>) {
        if self.built {
            self.iface_to_types.insert(iface, types);
        }
    }

    pub fn interfaces_for(&self, t: TypeId) -> &[TypeId] {
        self.type_to_ifaces.get(&t).map_or(&[], |v| v.as_slice())
    }

    /// One-shot build: enumerate candidate types, warm their value and
    /// pointer infos, then cross-check every candidate against every
    /// interface registered so far.
    pub fn build(
        &mut self,
        prog: &Program,
        cache: &mut ComplianceCache,
        runtime_types: &FxHashMap<TypeId, bool>,
    ) {
        if self.built {
            return;
        }
        let table = prog.types();

        let mut seen: FxHashSet<TypeId> = FxHashSet::default();
        for &t in runtime_types.keys() {
            if !table.is_interface(t) && seen.insert(t) {
                self.user_types.push(t);
            }
        }
        for pkg in prog.packages() {
            if !pkg.user {
                continue;
            }
            for &t in &pkg.named_types {
                if !table.is_interface(t) && seen.insert(t) {
                    self.user_types.push(t);
                }
            }
        }

        // Warm both receiver forms so the sweep below is pure lookups.
        let mut warmed: Vec<(TypeId, usize, Option<usize>)> =
            Vec::with_capacity(self.user_types.len());
        for &t in &self.user_types {
            let vidx = cache.concrete_idx(prog, t);
            let pidx = table.pointer_to(t).map(|p| cache.concrete_idx(prog, p));
            warmed.push((t, vidx, pidx));
        }

        let ifaces = cache.interface_ids();
        for &(t, vidx, pidx) in &warmed {
            for &i in &ifaces {
                let Some(iinfo) = cache.interface_info(i) else {
                    continue;
                };
                let vfp = cache.concrete(vidx).fingerprint;
                let pfp = pidx.map_or(0, |p| cache.concrete(p).fingerprint);
                if !subset(iinfo.fingerprint, vfp) && !subset(iinfo.fingerprint, pfp) {
                    continue;
                }
                let ok = implements(prog, cache.concrete(vidx), iinfo)
                    || pidx.is_some_and(|p| implements(prog, cache.concrete(p), iinfo));
                if ok {
                    self.iface_to_types.entry(i).or_default().push(t);
                    self.type_to_ifaces.entry(t).or_default().push(i);
                }
            }
        }

        self.built = true;
    }

    /// Implementations of `iface` over the indexed candidate set, computing
    /// and caching the answer for an interface the build sweep did not
    /// cover (first seen at an assertion after the build).
    pub fn compute_for(
        &mut self,
        prog: &Program,
        cache: &mut ComplianceCache,
        iface: TypeId,
    ) -> Vec<TypeId> {
        if !self.built {
            return Vec::new();
        }
        if let Some(types) = self.iface_to_types.get(&iface) {
            return types.clone();
        }
        cache.ensure_interface(prog, iface);

        let table = prog.types();
        let candidates = self.user_types.clone();
        let mut found: Vec<TypeId> = Vec::new();
        for t in candidates {
            let vidx = cache.concrete_idx(prog, t);
            let pidx = table.pointer_to(t).map(|p| cache.concrete_idx(prog, p));
            let Some(iinfo) = cache.interface_info(iface) else {
                continue;
            };
            let vfp = cache.concrete(vidx).fingerprint;
            let pfp = pidx.map_or(0, |p| cache.concrete(p).fingerprint);
            if !subset(iinfo.fingerprint, vfp) && !subset(iinfo.fingerprint, pfp) {
                continue;
            }
            let ok = implements(prog, cache.concrete(vidx), iinfo)
                || pidx.is_some_and(|p| implements(prog, cache.concrete(p), iinfo));
            if ok {
                found.push(t);
                self.type_to_ifaces.entry(t).or_default().push(iface);
            }
        }
        self.iface_to_types.insert(iface, found.clone());
        found
    }

    /// Incremental update for a runtime type discovered after the build.
    /// Checked against every interface registered in the cache.
    pub fn add_type(&mut self, prog: &Program, cache: &mut ComplianceCache, t: TypeId) {
        if !self.built {
            return;
        }
        let table = prog.types();
        if table.is_interface(t) {
            return;
        }
        let vidx = cache.concrete_idx(prog, t);
        let pidx = table.pointer_to(t).map(|p| cache.concrete_idx(prog, p));

        for i in cache.interface_ids() {
            let Some(iinfo) = cache.interface_info(i) else {
                continue;
            };
            if !subset(iinfo.fingerprint, cache.concrete(vidx).fingerprint) {
                continue;
            }
            let ok = implements(prog, cache.concrete(vidx), iinfo)
                || pidx.is_some_and(|p| implements(prog, cache.concrete(p), iinfo));
            if !ok {
                continue;
            }
            let types = self.iface_to_types.entry(i).or_default();
            if !types.contains(&t) {
                types.push(t);
            }
            let ifaces = self.type_to_ifaces.entry(t).or_default();
            if !ifaces.contains(&i) {
                ifaces.push(i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssa::ProgramBuilder;
    use crate::types::Basic;

    #[test]
    fn test_build_indexes_user_implementations() {
        let mut b = ProgramBuilder::new();
        let user = b.package("example.com/app");
        let stdlib = b.package("fmt");
        let int = b.basic(Basic::Int);
        let sig = b.signature(&[], &[int]);
        let stringer = b.interface(Some(stdlib), &[("String", sig)]).unwrap();

        let mine = b.named(Some(user), "Mine", int);
        b.method(mine, "String", sig, false, None).unwrap();
        let theirs = b.named(Some(stdlib), "Theirs", int);
        b.method(theirs, "String", sig, false, None).unwrap();
        let prog = b.finish();

        let mut cache = ComplianceCache::new();
        cache.ensure_interface(&prog, stringer);
        let mut index = ImplIndex::new();
        index.build(&prog, &mut cache, &FxHashMap::default());

        // User type indexed, stdlib type ignored (never became runtime).
        assert_eq!(index.types_for(stringer), &[mine]);
        assert_eq!(index.interfaces_for(mine), &[stringer]);
    }

    #[test]
    fn test_runtime_types_widen_the_candidate_set() {
        let mut b = ProgramBuilder::new();
        let stdlib = b.package("os");
        let int = b.basic(Basic::Int);
        let sig = b.signature(&[], &[int]);
        let stringer = b.interface(None, &[("String", sig)]).unwrap();
        let theirs = b.named(Some(stdlib), "Theirs", int);
        b.method(theirs, "String", sig, false, None).unwrap();
        let prog = b.finish();

        let mut cache = ComplianceCache::new();
        cache.ensure_interface(&prog, stringer);
        let mut runtime = FxHashMap::default();
        runtime.insert(theirs, false);

        let mut index = ImplIndex::new();
        index.build(&prog, &mut cache, &runtime);
        assert_eq!(index.types_for(stringer), &[theirs]);
    }

    #[test]
    fn test_incremental_add_after_build() {
        let mut b = ProgramBuilder::new();
        let stdlib = b.package("os");
        let int = b.basic(Basic::Int);
        let sig = b.signature(&[], &[int]);
        let stringer = b.interface(None, &[("String", sig)]).unwrap();
        let late = b.named(Some(stdlib), "Late", int);
        b.method(late, "String", sig, false, None).unwrap();
        let prog = b.finish();

        let mut cache = ComplianceCache::new();
        cache.ensure_interface(&prog, stringer);
        let mut index = ImplIndex::new();

        // Before the build, incremental adds are dropped.
        index.add_type(&prog, &mut cache, late);
        assert!(index.types_for(stringer).is_empty());

        index.build(&prog, &mut cache, &FxHashMap::default());
        assert!(index.types_for(stringer).is_empty());

        index.add_type(&prog, &mut cache, late);
        assert_eq!(index.types_for(stringer), &[late]);
    }
}
