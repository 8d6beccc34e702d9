//! Runtime-type registration and recursive structural materialization.
//!
//! A type becomes a "runtime type" when a value of it may appear inside an
//! interface or be derived through reflection. Registration marks methods
//! according to how much the conversion context proves (everything
//! exported, an interface's worth, or an allow-listed consumer's worth) and
//! then materializes the structurally reachable types with
//! `skip_methods=true`: they complete the reflective type graph without
//! making every field's methods live.

use super::Rta;
use crate::types::{TypeId, TypeKind};

impl<'p> Rta<'p> {
    /// Register `t` as a runtime type. With `skip` false, all exported
    /// methods are marked reachable (reflection may call them) and existing
    /// invoke sites of implemented interfaces are cross-producted.
    ///
    /// Re-registration is a no-op: the first registration decides the flag
    /// and the marking, and structural re-encounters (a named type is the
    /// element of its own derived pointer) must not rewrite either.
    pub(crate) fn add_runtime_type(&mut self, t: TypeId, skip: bool) {
        let t = self.prog.types().unalias(t);
        if self.result.runtime_types.contains_key(&t) {
            return;
        }
        self.result.runtime_types.insert(t, skip);

        self.index.add_type(self.prog, &mut self.cache, t);
        self.add_runtime_type_structure(t);

        let concrete = self.prog.types().interface_of(t).is_none();
        if !skip && concrete {
            self.cross_product_existing_invokes(t);

            let mset = self.prog.method_set(t);
            for sel in mset.iter() {
                if sel.exported {
                    if let Some(f) = sel.func {
                        self.mark_reachable(f, true);
                    } else if let Some(obj) = sel.obj {
                        self.mark_object(obj);
                    }
                }
            }
        }
    }

    /// Registration for a conversion inside an allow-listed reflection
    /// consumer's caller: only the methods that consumer invokes are
    /// marked, and the type structure is not traversed.
    pub(crate) fn add_runtime_type_selective(&mut self, t: TypeId, skip: bool) {
        let t = self.prog.types().unalias(t);
        if self.result.runtime_types.contains_key(&t) {
            return;
        }
        self.result.runtime_types.insert(t, skip);
        self.index.add_type(self.prog, &mut self.cache, t);

        if self.prog.types().interface_of(t).is_none() {
            let mset = self.prog.method_set(t);
            for sel in mset.iter() {
                if sel.exported && self.should_mark_for_reflection(&sel.name) {
                    if let Some(f) = sel.func {
                        self.mark_reachable(f, true);
                    } else if let Some(obj) = sel.obj {
                        self.mark_object(obj);
                    }
                }
            }
            self.cross_product_existing_invokes(t);
        }
    }

    /// Registration for a conversion to a non-empty interface: only the
    /// methods the interface requires are marked, resolved through the
    /// requirement's defining package so unexported markers are found.
    ///
    /// The marking runs even on re-encounter; the type may have been
    /// registered earlier for a different interface.
    pub(crate) fn add_runtime_type_for_interface(
        &mut self,
        t: TypeId,
        iface: TypeId,
        skip: bool,
    ) {
        let t = self.prog.types().unalias(t);
        let already = self.result.runtime_types.contains_key(&t);
        if !already {
            self.result.runtime_types.insert(t, skip);
        }

        let table = self.prog.types();
        if table.interface_of(t).is_none() {
            let mset = self.prog.method_set(t);
            for m in table.interface_methods(iface) {
                if let Some(sel) = mset.lookup(m.pkg, &m.name) {
                    if let Some(f) = sel.func {
                        self.mark_reachable(f, true);
                    } else if let Some(obj) = sel.obj {
                        self.mark_object(obj);
                    }
                }
            }
            if !already {
                self.cross_product_existing_invokes(t);
            }
        }

        if !already {
            self.index.add_type(self.prog, &mut self.cache, t);
            self.add_runtime_type_structure(t);
        }
    }

    /// Pair a newly discovered runtime type with every invoke site already
    /// recorded for an interface it implements, and keep the interface's
    /// implementation list current so sites recorded later see this type.
    pub(crate) fn cross_product_existing_invokes(&mut self, t: TypeId) {
        let ifaces = self.cache.interfaces_of(self.prog, t);
        for iface in ifaces {
            if let Some(info) = self.cache.interface_info_mut(iface) {
                if info.computed && !info.implementations.contains(&t) {
                    info.implementations.push(t);
                }
            }
            let sites = self.invoke_sites.get(&iface).cloned().unwrap_or_default();
            for method in sites {
                self.add_invoke_edge(&method, t);
            }
        }
    }

    /// Register the structurally reachable types of `t`, all with
    /// `skip_methods=true`: element types, keys, fields, components,
    /// parameter and result tuples; for a named type additionally the
    /// reflection-derivable pointer form and each method's signature.
    fn add_runtime_type_structure(&mut self, t: TypeId) {
        let table = self.prog.types();
        match table.kind(t) {
            TypeKind::Basic(_) | TypeKind::Interface { .. } => {}
            TypeKind::Pointer(elem) | TypeKind::Slice(elem) | TypeKind::Chan(elem) => {
                self.add_runtime_type(*elem, true);
            }
            TypeKind::Array { elem, .. } => {
                self.add_runtime_type(*elem, true);
            }
            TypeKind::Map { key, elem } => {
                self.add_runtime_type(*key, true);
                self.add_runtime_type(*elem, true);
            }
            TypeKind::Struct { fields } => {
                for &f in fields {
                    self.add_runtime_type(f, true);
                }
            }
            TypeKind::Tuple(elems) => {
                for &e in elems {
                    self.add_runtime_type(e, true);
                }
            }
            TypeKind::Signature { params, results } => {
                self.add_runtime_type(*params, true);
                self.add_runtime_type(*results, true);
            }
            TypeKind::Named(id) => {
                if let Some(ptr) = table.pointer_to(t) {
                    self.add_runtime_type(ptr, true);
                }
                let def = table.named_def(*id);
                let underlying = def.underlying;
                let method_sigs: Vec<TypeId> = def.methods.iter().map(|m| m.sig).collect();
                self.add_runtime_type(underlying, true);
                for sig in method_sigs {
                    self.add_runtime_type(sig, true);
                }
            }
            TypeKind::Alias { target, .. } => {
                self.add_runtime_type(*target, true);
            }
            TypeKind::TypeParam { name } => {
                // Type parameters resolve during instantiation; one showing
                // up as a runtime type is not traversable.
                tracing::warn!(
                    type_param = %name,
                    "skipping unhandled type during runtime type materialization"
                );
            }
        }
    }
}
