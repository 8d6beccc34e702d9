//! Cross-product tables.
//!
//! Table A pairs address-taken functions with dynamic call sites of the
//! same signature. Table B pairs runtime types with invoke sites of the
//! interfaces they implement. Both are saturated incrementally: whichever
//! side of a pair arrives second completes the product for everything
//! already recorded on the other side.
//!
//! Entries are stable handles (function ids, interface type ids, method
//! references); no references are held across table mutations.

use super::Rta;
use crate::compliance::{implements, locate_method};
use crate::ssa::{FuncId, MethodRef};
use crate::types::TypeId;

impl<'p> Rta<'p> {
    /// A function's identity escaped as a value. Pair it with every known
    /// dynamic call site of its signature; with the reflective generic call
    /// entry point in the program, every address-taken function is callable
    /// regardless of signature.
    pub(crate) fn visit_addr_taken(&mut self, g: FuncId) {
        let sig = self.prog.types().unalias(self.prog.func(g).signature);
        let newly = self.addr_taken_by_sig.entry(sig).or_default().insert(g);
        if !newly {
            return;
        }

        let n_sites = self.dyn_call_sites.get(&sig).map_or(0, |s| s.len());
        if n_sites > 0 {
            self.mark_reachable(g, true);
        }

        if self.reflective_call.is_some() {
            self.mark_reachable(g, true);
        }
    }

    /// A call through an unknown function value. Pair it with every known
    /// address-taken function of the same signature.
    pub(crate) fn visit_dyn_call(&mut self, sig: TypeId, parent: FuncId) {
        let sig = self.prog.types().unalias(sig);
        self.dyn_call_sites.entry(sig).or_default().push(parent);

        let funcs: Vec<FuncId> = self
            .addr_taken_by_sig
            .get(&sig)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        for g in funcs {
            self.mark_reachable(g, true);
        }
    }

    /// A dynamic dispatch through an interface value. Record the site, then
    /// resolve the method on every concrete type already known to implement
    /// the interface.
    pub(crate) fn visit_invoke(&mut self, recv_ty: TypeId, method: &MethodRef) {
        let Some(iface) = self.prog.types().interface_of(recv_ty) else {
            return;
        };
        self.invoke_sites
            .entry(iface)
            .or_default()
            .push(method.clone());

        for c in self.implementations(iface) {
            self.add_invoke_edge(method, c);
        }
    }

    /// One (site, concrete type) pair of Table B: resolve the concrete
    /// method and mark it reachable. A resolver miss is skipped silently; a
    /// type that cannot produce the method cannot be the dynamic value at
    /// the site.
    pub(crate) fn add_invoke_edge(&mut self, method: &MethodRef, c: TypeId) {
        let Some(res) = locate_method(self.prog, c, method.pkg, &method.name) else {
            return;
        };
        if let Some(f) = res.sel.func {
            self.mark_reachable(f, true);
        } else if let Some(obj) = res.sel.obj {
            self.mark_object(obj);
        }
    }

    /// All concrete types currently known to implement `iface`, from the
    /// interface info when computed, the index when built, or a sweep over
    /// the concrete types seen so far.
    pub(crate) fn implementations(&mut self, iface: TypeId) -> Vec<TypeId> {
        self.cache.ensure_interface(self.prog, iface);
        if let Some(info) = self.cache.interface_info(iface) {
            if info.computed {
                return info.implementations.clone();
            }
        }

        if self.index.is_built() {
            if let Some(cached) = self.index.get(iface).cloned() {
                if let Some(info) = self.cache.interface_info_mut(iface) {
                    info.implementations = cached.clone();
                    info.computed = true;
                }
                return cached;
            }
        }

        // Sweep the concrete types observed so far; taken when the
        // interface shows up before any whole-program scan forced the
        // index build.
        let mut impls: Vec<TypeId> = Vec::new();
        let mut matched: Vec<usize> = Vec::new();
        for idx in 0..self.cache.concrete_count() {
            let Some(iinfo) = self.cache.interface_info(iface) else {
                break;
            };
            let cinfo = self.cache.concrete(idx);
            if implements(self.prog, cinfo, iinfo) {
                impls.push(cinfo.ty);
                matched.push(idx);
            }
        }
        for idx in matched {
            self.cache.record_implements(idx, iface);
        }
        if let Some(info) = self.cache.interface_info_mut(iface) {
            info.implementations = impls.clone();
            info.computed = true;
        }
        self.index.set(iface, impls.clone());
        impls
    }

    pub(crate) fn build_index(&mut self) {
        self.index
            .build(self.prog, &mut self.cache, &self.result.runtime_types);
    }

    /// Every concrete type in the program implementing `iface`, via the
    /// whole-program index (building it on first use).
    pub(crate) fn find_all_implementations(&mut self, iface: TypeId) -> Vec<TypeId> {
        self.cache.ensure_interface(self.prog, iface);
        self.build_index();
        self.index.compute_for(self.prog, &mut self.cache, iface)
    }
}
