//! Interface conversions and type assertions.
//!
//! Context decides how much liveness a conversion implies:
//!
//! - Conversion to the empty interface is conservative (the whole exported
//!   surface may be reached via reflection) unless the enclosing function
//!   calls a known reflection consumer, in which case only the methods that
//!   consumer invokes are marked, or the source is a pointer to an
//!   interface, the shape of error-matching APIs, in which case every
//!   implementer of that interface owes its interface methods.
//! - Conversion to a non-empty interface marks only the methods the target
//!   interface requires.
//! - An assertion from an interface to a concrete type proves the concrete
//!   type flows through that interface and owes its methods, including
//!   unexported markers.

use super::Rta;
use crate::reflection::FALLBACK_REFLECTION_METHODS;
use crate::ssa::{Callee, Instr};
use crate::types::{TypeId, TypeKind};

impl<'p> Rta<'p> {
    pub(crate) fn handle_make_interface(&mut self, source: TypeId, target: TypeId) {
        let table = self.prog.types();
        let Some(target_iface) = table.interface_of(target) else {
            return;
        };

        if table.interface_methods(target_iface).is_empty() {
            // `&SomeInterface` converted to the empty interface: the shape
            // of error-matching and decoding APIs. Every implementer of the
            // pointee interface owes its interface methods.
            let src = table.unalias(source);
            if let TypeKind::Pointer(elem) = table.kind(src) {
                if let Some(pointee_iface) = table.interface_of(*elem) {
                    self.mark_implementors_methods_reachable(pointee_iface);
                    return;
                }
            }

            if self.in_known_safe_context() {
                self.add_runtime_type_selective(source, false);
                return;
            }
            self.add_runtime_type(source, false);
        } else {
            self.add_runtime_type_for_interface(source, target_iface, false);
        }
    }

    pub(crate) fn handle_type_assert(&mut self, source: TypeId, asserted: TypeId) {
        let table = self.prog.types();

        // Interface-to-concrete: the assertion proves the concrete type is
        // used through the source interface somewhere.
        if let Some(source_iface) = table.interface_of(source) {
            if !table.interface_methods(source_iface).is_empty()
                && table.interface_of(asserted).is_none()
            {
                self.mark_interface_methods_reachable(asserted, source_iface);
                return;
            }
        }

        // Interface-to-interface: concrete types flowing here must carry
        // the asserted interface's methods.
        let Some(asserted_iface) = table.interface_of(asserted) else {
            return;
        };
        if table.interface_methods(asserted_iface).is_empty() {
            return;
        }

        self.cache.ensure_interface(self.prog, asserted_iface);
        self.build_index();

        // Assertions inside stdlib code (internal Stringer probes and the
        // like) only consider types already observed at runtime; otherwise
        // every String() method in the program would become live.
        let in_stdlib = self
            .current
            .is_some_and(|f| self.prog.is_stdlib_function(f));
        if in_stdlib {
            let candidates = self
                .index
                .compute_for(self.prog, &mut self.cache, asserted_iface);
            for t in candidates {
                if self.result.runtime_types.contains_key(&t) {
                    self.mark_interface_methods_reachable(t, asserted_iface);
                }
            }
            return;
        }

        for t in self.find_all_implementations(asserted_iface) {
            self.mark_interface_methods_reachable(t, asserted_iface);
        }
    }

    /// Interface-to-interface conversion: every implementer of the target
    /// interface owes the target's methods.
    pub(crate) fn handle_change_interface(&mut self, target: TypeId) {
        let table = self.prog.types();
        let Some(target_iface) = table.interface_of(target) else {
            return;
        };
        if table.interface_methods(target_iface).is_empty() {
            return;
        }
        for t in self.find_all_implementations(target_iface) {
            self.mark_interface_methods_reachable(t, target_iface);
        }
    }

    /// Force-mark every method `iface` requires on concrete type `t`,
    /// checking both receiver forms. Unexported marker methods resolve via
    /// the requirement's defining package.
    pub(crate) fn mark_interface_methods_reachable(&mut self, t: TypeId, iface: TypeId) {
        let prog = self.prog;
        let table = prog.types();
        let value_mset = prog.method_set(t);
        let ptr_mset = table.pointer_to(t).map(|p| prog.method_set(p));

        for m in table.interface_methods(iface) {
            for mset in std::iter::once(&value_mset).chain(ptr_mset.as_ref()) {
                if let Some(sel) = mset.lookup(m.pkg, &m.name) {
                    if let Some(f) = sel.func {
                        self.mark_reachable(f, true);
                    } else if let Some(obj) = sel.obj {
                        self.mark_object(obj);
                    }
                }
            }
        }
    }

    /// Walk every named type in the program; implementers of `iface` that
    /// are already runtime types get the interface's methods force-marked,
    /// the rest become runtime types the normal way.
    pub(crate) fn mark_implementors_methods_reachable(&mut self, iface: TypeId) {
        let prog = self.prog;
        let table = prog.types();

        for pkg in prog.packages() {
            for &t in &pkg.named_types {
                if table.is_interface(t) {
                    continue;
                }
                let implements_value = self.cache.type_implements(prog, t, iface);
                let implements_ptr = !implements_value
                    && table
                        .pointer_to(t)
                        .is_some_and(|p| self.cache.type_implements(prog, p, iface));
                if !implements_value && !implements_ptr {
                    continue;
                }

                if !self.result.runtime_types.contains_key(&t) {
                    self.add_runtime_type(t, false);
                }
                // Interface methods are owed in either case; the normal
                // registration alone misses pointer-receiver markers.
                self.mark_interface_methods_reachable(t, iface);
            }
        }
    }

    /// Whether the function being scanned calls any allow-listed reflection
    /// consumer.
    pub(crate) fn in_known_safe_context(&self) -> bool {
        let Some(cur) = self.current else {
            return false;
        };
        let func = self.prog.func(cur);
        for block in &func.blocks {
            for instr in &block.instrs {
                if let Instr::Call(call) = instr {
                    if let Callee::Static(g) = call.callee {
                        if self.allowlist.contains(&self.prog.func(g).qualified) {
                            return true;
                        }
                    }
                }
            }
        }
        false
    }

    /// Whether a method of a selectively added runtime type should still be
    /// marked: an allow-listed consumer called from the current function
    /// names it, or it is one of the common reflection hooks.
    pub(crate) fn should_mark_for_reflection(&self, method: &str) -> bool {
        if let Some(cur) = self.current {
            let func = self.prog.func(cur);
            for block in &func.blocks {
                for instr in &block.instrs {
                    if let Instr::Call(call) = instr {
                        if let Callee::Static(g) = call.callee {
                            if let Some(methods) =
                                self.allowlist.methods_for(&self.prog.func(g).qualified)
                            {
                                if methods.iter().any(|m| m == method) {
                                    return true;
                                }
                            }
                        }
                    }
                }
            }
        }
        FALLBACK_REFLECTION_METHODS.contains(&method)
    }
}
