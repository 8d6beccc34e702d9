//! Interface-compliance oracle and per-type info caches.
//!
//! Answers two questions for the engine: does concrete type `C` implement
//! interface `I`, and which concrete method satisfies a given interface
//! method. Both lean on cached [`ConcreteTypeInfo`]/[`InterfaceTypeInfo`]
//! records carrying the type's method set and fingerprint, so the common
//! negative answer costs one AND-NOT.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::fingerprint::{fingerprint, subset};
use crate::ssa::Program;
use crate::types::{MethodSel, MethodSet, PackageId, TypeId, TypeKind};

/// Cached facts about one concrete type.
#[derive(Debug, Clone)]
pub struct ConcreteTypeInfo {
    /// Unaliased type handle.
    pub ty: TypeId,
    pub mset: Arc<MethodSet>,
    pub fingerprint: u64,
    /// Interfaces this type is known to implement. Grows as interfaces are
    /// discovered; authoritative only once `implements_computed` is set.
    pub implements: Vec<TypeId>,
    pub implements_computed: bool,
}

/// Cached facts about one interface.
#[derive(Debug, Clone)]
pub struct InterfaceTypeInfo {
    /// Canonical `Interface` node (never a named type).
    pub iface: TypeId,
    pub mset: Arc<MethodSet>,
    pub fingerprint: u64,
    /// Concrete types known to implement this interface.
    pub implementations: Vec<TypeId>,
    /// Whether `implementations` is authoritative for the types known so far.
    pub computed: bool,
}

/// Where a resolved concrete method lives.
#[derive(Debug, Clone)]
pub struct MethodResolution {
    /// The receiver form that carries the method; the pointer type when the
    /// method is only in the pointer method set.
    pub recv: TypeId,
    pub sel: MethodSel,
}

/// Authoritative check: every interface method must be present in the
/// concrete method set with an identical signature. Signatures are interned
/// structurally, so identity is handle equality.
fn satisfies(prog: &Program, cmset: &MethodSet, iface: TypeId) -> bool {
    prog.types()
        .interface_methods(iface)
        .iter()
        .all(|m| matches!(cmset.lookup(m.pkg, &m.name), Some(sel) if sel.sig == m.sig))
}

/// Whether `cinfo`'s type implements `iinfo`'s interface: fingerprint
/// fast-path, then the authoritative method-set comparison.
pub fn implements(prog: &Program, cinfo: &ConcreteTypeInfo, iinfo: &InterfaceTypeInfo) -> bool {
    subset(iinfo.fingerprint, cinfo.fingerprint) && satisfies(prog, &cinfo.mset, iinfo.iface)
}

/// Resolve the concrete method satisfying an interface method on `c`.
///
/// Looks in the value method set first; a method found only on the pointer
/// form resolves with the pointer as receiver. A miss despite a positive
/// implements answer is possible in aliasing and generic-substitution
/// corners; callers skip the site in that case.
pub fn locate_method(
    prog: &Program,
    c: TypeId,
    pkg: Option<PackageId>,
    name: &str,
) -> Option<MethodResolution> {
    let table = prog.types();
    let c = table.unalias(c);
    if let Some(sel) = prog.method_set(c).lookup(pkg, name) {
        return Some(MethodResolution {
            recv: c,
            sel: sel.clone(),
        });
    }
    if !matches!(table.kind(c), TypeKind::Pointer(_)) {
        if let Some(ptr) = table.pointer_to(c) {
            if let Some(sel) = prog.method_set(ptr).lookup(pkg, name) {
                return Some(MethodResolution {
                    recv: ptr,
                    sel: sel.clone(),
                });
            }
        }
    }
    None
}

/// Per-analysis cache of compliance facts. Concrete entries are shared
/// between an alias and its target so either key hits the same record.
#[derive(Debug, Default)]
pub struct ComplianceCache {
    concrete_index: FxHashMap<TypeId, usize>,
    concretes: Vec<ConcreteTypeInfo>,
    ifaces: FxHashMap<TypeId, InterfaceTypeInfo>,
}

impl ComplianceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the cached info for `t`, creating it on first sight.
    pub fn concrete_idx(&mut self, prog: &Program, t: TypeId) -> usize {
        if let Some(&i) = self.concrete_index.get(&t) {
            return i;
        }
        let u = prog.types().unalias(t);
        if let Some(&i) = self.concrete_index.get(&u) {
            self.concrete_index.insert(t, i);
            return i;
        }
        let mset = prog.method_set(u);
        let fp = fingerprint(prog.types(), &mset);
        let idx = self.concretes.len();
        self.concretes.push(ConcreteTypeInfo {
            ty: u,
            mset,
            fingerprint: fp,
            implements: Vec::new(),
            implements_computed: false,
        });
        self.concrete_index.insert(u, idx);
        if t != u {
            self.concrete_index.insert(t, idx);
        }
        idx
    }

    pub fn concrete(&self, idx: usize) -> &ConcreteTypeInfo {
        &self.concretes[idx]
    }

    pub fn concrete_count(&self) -> usize {
        self.concretes.len()
    }

    /// Record that the concrete type at `idx` implements `iface`.
    pub fn record_implements(&mut self, idx: usize, iface: TypeId) {
        let c = &mut self.concretes[idx];
        if !c.implements.contains(&iface) {
            c.implements.push(iface);
        }
    }

    /// Ensure an interface info exists for the canonical interface node.
    pub fn ensure_interface(&mut self, prog: &Program, iface: TypeId) {
        if self.ifaces.contains_key(&iface) {
            return;
        }
        let mset = prog.method_set(iface);
        let fp = fingerprint(prog.types(), &mset);
        self.ifaces.insert(
            iface,
            InterfaceTypeInfo {
                iface,
                mset,
                fingerprint: fp,
                implementations: Vec::new(),
                computed: false,
            },
        );
    }

    pub fn interface_info(&self, iface: TypeId) -> Option<&InterfaceTypeInfo> {
        self.ifaces.get(&iface)
    }

    pub fn interface_info_mut(&mut self, iface: TypeId) -> Option<&mut InterfaceTypeInfo> {
        self.ifaces.get_mut(&iface)
    }

    /// Interfaces registered so far, with their fingerprints.
    pub fn interface_ids(&self) -> Vec<TypeId> {
        self.ifaces.keys().copied().collect()
    }

    /// Full oracle call through the caches.
    pub fn type_implements(&mut self, prog: &Program, t: TypeId, iface: TypeId) -> bool {
        let idx = self.concrete_idx(prog, t);
        self.ensure_interface(prog, iface);
        let iinfo = &self.ifaces[&iface];
        implements(prog, &self.concretes[idx], iinfo)
    }

    /// All currently known interfaces implemented by `t`, computing the
    /// relation against registered interfaces on first request.
    pub fn interfaces_of(&mut self, prog: &Program, t: TypeId) -> Vec<TypeId> {
        let idx = self.concrete_idx(prog, t);
        if !self.concretes[idx].implements_computed {
            let mut found: Vec<TypeId> = Vec::new();
            for (&key, iinfo) in &self.ifaces {
                if implements(prog, &self.concretes[idx], iinfo) {
                    found.push(key);
                }
            }
            for i in found {
                self.record_implements(idx, i);
            }
            self.concretes[idx].implements_computed = true;
        }
        self.concretes[idx].implements.clone()
    }
}
