//! Method sets and the shared method-set cache.
//!
//! Method sets are a property of the program, not of any one analysis: the
//! engine borrows them from this cache and never builds one of its own. The
//! cache tracks how many sets it has constructed so embedders (and tests)
//! can observe that repeated analyses hit the cache instead of recomputing.

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::ssa::FuncId;
use crate::types::arena::{IfaceMethod, MethodDecl, PackageId, TypeId, TypeKind, TypeTable};

/// Stable type-system identity of a method declaration. Reachability of
/// template methods with no SSA body is tracked through these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjId(pub(crate) u32);

impl ObjId {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// One selection in a method set.
#[derive(Debug, Clone)]
pub struct MethodSel {
    /// Qualified identity: the bare name for exported methods, the
    /// package-prefixed name for unexported ones. Two same-named unexported
    /// methods in different packages get distinct ids.
    pub id: String,
    pub name: String,
    pub pkg: Option<PackageId>,
    pub exported: bool,
    pub sig: TypeId,
    /// SSA body, absent for interface methods and generic template methods.
    pub func: Option<FuncId>,
    /// Type-system identity, absent for interface methods.
    pub obj: Option<ObjId>,
    pub pointer_receiver: bool,
}

/// The ordered set of methods callable on a value of some type.
#[derive(Debug, Clone, Default)]
pub struct MethodSet {
    sels: Vec<MethodSel>,
}

impl MethodSet {
    pub fn iter(&self) -> impl Iterator<Item = &MethodSel> {
        self.sels.iter()
    }

    pub fn len(&self) -> usize {
        self.sels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sels.is_empty()
    }

    /// Look up a method by name and defining package.
    ///
    /// Exported methods match on name alone; unexported methods additionally
    /// require the same defining package, which is how marker methods stay
    /// private to their package.
    pub fn lookup(&self, pkg: Option<PackageId>, name: &str) -> Option<&MethodSel> {
        self.sels
            .iter()
            .find(|sel| sel.name == name && (sel.exported || sel.pkg == pkg))
    }
}

fn qualified_id<'a>(
    name: &str,
    exported: bool,
    pkg: Option<PackageId>,
    pkg_path: impl Fn(PackageId) -> &'a str,
) -> String {
    match pkg {
        Some(p) if !exported => format!("{}.{}", pkg_path(p), name),
        _ => name.to_string(),
    }
}

/// Shared per-program cache of method sets.
///
/// Interior mutability keeps the owning program shareable by reference while
/// the cache fills lazily; the engine is single-threaded by contract, so a
/// `RefCell` suffices.
#[derive(Debug, Default)]
pub struct MethodSetCache {
    sets: RefCell<FxHashMap<TypeId, Arc<MethodSet>>>,
    constructed: Cell<usize>,
}

impl MethodSetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of method sets constructed so far. Stable across repeated
    /// analyses of the same program: reuse is observable as this not moving.
    pub fn constructed(&self) -> usize {
        self.constructed.get()
    }

    /// The method set of `t`, computed on first request and shared after.
    pub fn method_set<'a>(
        &self,
        table: &TypeTable,
        pkg_path: impl Fn(PackageId) -> &'a str + Copy,
        t: TypeId,
    ) -> Arc<MethodSet> {
        let t = table.unalias(t);
        if let Some(set) = self.sets.borrow().get(&t) {
            return Arc::clone(set);
        }
        let set = Arc::new(Self::compute(table, pkg_path, t));
        self.constructed.set(self.constructed.get() + 1);
        self.sets.borrow_mut().insert(t, Arc::clone(&set));
        set
    }

    fn compute<'a>(
        table: &TypeTable,
        pkg_path: impl Fn(PackageId) -> &'a str + Copy,
        t: TypeId,
    ) -> MethodSet {
        let mut sels: Vec<MethodSel> = Vec::new();

        let push_decl = |m: &MethodDecl, sels: &mut Vec<MethodSel>| {
            sels.push(MethodSel {
                id: qualified_id(&m.name, m.exported, m.pkg, pkg_path),
                name: m.name.clone(),
                pkg: m.pkg,
                exported: m.exported,
                sig: m.sig,
                func: m.func,
                obj: Some(m.obj),
                pointer_receiver: m.pointer_receiver,
            });
        };
        let push_iface = |m: &IfaceMethod, sels: &mut Vec<MethodSel>| {
            sels.push(MethodSel {
                id: qualified_id(&m.name, m.exported, m.pkg, pkg_path),
                name: m.name.clone(),
                pkg: m.pkg,
                exported: m.exported,
                sig: m.sig,
                func: None,
                obj: None,
                pointer_receiver: false,
            });
        };

        match table.kind(t) {
            TypeKind::Named(id) => {
                let def = table.named_def(*id);
                if let Some(iface) = table.interface_of(t) {
                    for m in table.interface_methods(iface) {
                        push_iface(m, &mut sels);
                    }
                } else {
                    // Value receiver set: pointer-receiver methods are only
                    // callable through *T.
                    for m in &def.methods {
                        if !m.pointer_receiver {
                            push_decl(m, &mut sels);
                        }
                    }
                }
            }
            TypeKind::Pointer(elem) => {
                let elem = table.unalias(*elem);
                if let TypeKind::Named(id) = table.kind(elem) {
                    if !table.is_interface(elem) {
                        for m in &table.named_def(*id).methods {
                            push_decl(m, &mut sels);
                        }
                    }
                }
            }
            TypeKind::Interface { methods } => {
                for m in methods {
                    push_iface(m, &mut sels);
                }
            }
            _ => {}
        }

        sels.sort_by(|a, b| a.id.cmp(&b.id));
        MethodSet { sels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::arena::{Basic, NamedDef, TypeIdVec};

    fn sig_of(table: &mut TypeTable) -> TypeId {
        let params = table.intern(TypeKind::Tuple(TypeIdVec::new()));
        table.intern(TypeKind::Signature {
            params,
            results: params,
        })
    }

    fn decl(name: &str, exported: bool, sig: TypeId, ptr: bool, obj: u32) -> MethodDecl {
        MethodDecl {
            name: name.to_string(),
            pkg: Some(PackageId(0)),
            exported,
            sig,
            pointer_receiver: ptr,
            func: None,
            obj: ObjId(obj),
        }
    }

    fn paths(_: PackageId) -> &'static str {
        "example.com/app"
    }

    #[test]
    fn test_value_set_excludes_pointer_receivers() {
        let mut table = TypeTable::new();
        let int = table.intern(TypeKind::Basic(Basic::Int));
        let sig = sig_of(&mut table);
        let (_, t) = table.add_named(NamedDef {
            name: "F".to_string(),
            pkg: Some(PackageId(0)),
            underlying: int,
            methods: vec![decl("Write", true, sig, true, 0), decl("Name", true, sig, false, 1)],
        });
        let ptr = table.intern(TypeKind::Pointer(t));

        let cache = MethodSetCache::new();
        let value_set = cache.method_set(&table, paths, t);
        let ptr_set = cache.method_set(&table, paths, ptr);

        assert_eq!(value_set.len(), 1);
        assert!(value_set.lookup(None, "Name").is_some());
        assert!(value_set.lookup(None, "Write").is_none());
        assert_eq!(ptr_set.len(), 2);
        assert!(ptr_set.lookup(None, "Write").is_some());
    }

    #[test]
    fn test_unexported_lookup_requires_same_package() {
        let mut table = TypeTable::new();
        let int = table.intern(TypeKind::Basic(Basic::Int));
        let sig = sig_of(&mut table);
        let (_, t) = table.add_named(NamedDef {
            name: "A".to_string(),
            pkg: Some(PackageId(0)),
            underlying: int,
            methods: vec![decl("mark", false, sig, false, 0)],
        });

        let cache = MethodSetCache::new();
        let set = cache.method_set(&table, paths, t);

        assert!(set.lookup(Some(PackageId(0)), "mark").is_some());
        assert!(set.lookup(Some(PackageId(1)), "mark").is_none());
        assert!(set.lookup(None, "mark").is_none());
    }

    #[test]
    fn test_cache_constructs_each_set_once() {
        let mut table = TypeTable::new();
        let int = table.intern(TypeKind::Basic(Basic::Int));
        let (_, t) = table.add_named(NamedDef {
            name: "A".to_string(),
            pkg: Some(PackageId(0)),
            underlying: int,
            methods: Vec::new(),
        });

        let cache = MethodSetCache::new();
        let _ = cache.method_set(&table, paths, t);
        let before = cache.constructed();
        let _ = cache.method_set(&table, paths, t);
        let _ = cache.method_set(&table, paths, t);
        assert_eq!(cache.constructed(), before);
    }

    #[test]
    fn test_named_interface_set_is_interface_methods() {
        let mut table = TypeTable::new();
        let sig = sig_of(&mut table);
        let iface = table.intern(TypeKind::Interface {
            methods: vec![IfaceMethod {
                name: "Write".to_string(),
                pkg: None,
                exported: true,
                sig,
            }],
        });
        let (_, w) = table.add_named(NamedDef {
            name: "W".to_string(),
            pkg: Some(PackageId(0)),
            underlying: iface,
            methods: Vec::new(),
        });

        let cache = MethodSetCache::new();
        let set = cache.method_set(&table, paths, w);
        assert_eq!(set.len(), 1);
        assert!(set.lookup(None, "Write").is_some());
    }
}
