//! Interned type arena with `TypeId` handles.
//!
//! Structural types (pointers, slices, signatures, interfaces, ...) are
//! deduplicated on interning, so `TypeId` equality is structural identity
//! for them. Named types are nominal: every `named()` call mints a fresh
//! definition, and two named types are equal only if they are the same
//! definition.
//!
//! Performance characteristics:
//! - Interning: O(1) amortized hash-map lookup per node
//! - All queries after construction: O(1), no allocation on the hot path
//!
//! The table is immutable once the program is built; the engine holds a
//! shared reference for the whole analysis.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::ssa::FuncId;
use crate::types::method_set::ObjId;

/// Handle to an interned type. Copyable, hashable, O(1) equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    /// Raw index, for diagnostics.
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Handle to a named-type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamedId(u32);

/// Handle to a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackageId(pub(crate) u32);

/// Inline storage for child type lists; most composites have few children.
pub type TypeIdVec = SmallVec<[TypeId; 4]>;

/// Predeclared scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Basic {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    Str,
    UnsafePointer,
}

impl Basic {
    pub fn name(self) -> &'static str {
        match self {
            Basic::Bool => "bool",
            Basic::Int => "int",
            Basic::Int8 => "int8",
            Basic::Int16 => "int16",
            Basic::Int32 => "int32",
            Basic::Int64 => "int64",
            Basic::Uint => "uint",
            Basic::Uint8 => "uint8",
            Basic::Uint16 => "uint16",
            Basic::Uint32 => "uint32",
            Basic::Uint64 => "uint64",
            Basic::Uintptr => "uintptr",
            Basic::Float32 => "float32",
            Basic::Float64 => "float64",
            Basic::Complex64 => "complex64",
            Basic::Complex128 => "complex128",
            Basic::Str => "string",
            Basic::UnsafePointer => "unsafe.Pointer",
        }
    }
}

/// One method requirement of an interface.
///
/// `pkg` is the defining package: unexported methods are only satisfied by
/// methods from the same package, which is what makes marker methods work
/// as a type-discrimination device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IfaceMethod {
    pub name: String,
    pub pkg: Option<PackageId>,
    pub exported: bool,
    pub sig: TypeId,
}

/// The closed set of type shapes the engine recognizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Basic(Basic),
    Pointer(TypeId),
    Slice(TypeId),
    Array { elem: TypeId, len: u64 },
    Map { key: TypeId, elem: TypeId },
    Chan(TypeId),
    Struct { fields: TypeIdVec },
    Tuple(TypeIdVec),
    /// Function type; `params` and `results` are `Tuple` types.
    Signature { params: TypeId, results: TypeId },
    Named(NamedId),
    /// Flattened method list: embedded interfaces contribute their methods
    /// at construction time, so an assertion against an embedding interface
    /// covers every embedded method with no special case.
    Interface { methods: Vec<IfaceMethod> },
    TypeParam { name: String },
    Alias { name: String, target: TypeId },
}

/// A method declared on a named type.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub pkg: Option<PackageId>,
    pub exported: bool,
    pub sig: TypeId,
    pub pointer_receiver: bool,
    /// The SSA function body, if one was built. Generic template methods
    /// exist in the type system without code; those stay `None`.
    pub func: Option<FuncId>,
    /// Stable type-system identity, used when no SSA function exists.
    pub obj: ObjId,
}

/// A named-type definition: nominal identity plus declared methods.
#[derive(Debug, Clone)]
pub struct NamedDef {
    pub name: String,
    pub pkg: Option<PackageId>,
    pub underlying: TypeId,
    pub methods: Vec<MethodDecl>,
}

/// Interned type storage. Built once by the program builder, then read-only.
#[derive(Debug, Default)]
pub struct TypeTable {
    kinds: Vec<TypeKind>,
    lookup: FxHashMap<TypeKind, TypeId>,
    named: Vec<NamedDef>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a type node, returning the canonical handle.
    ///
    /// Named nodes are nominal: the caller mints a fresh `NamedId` per
    /// definition, so distinct definitions never collide here.
    pub(crate) fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(&id) = self.lookup.get(&kind) {
            return id;
        }
        let id = TypeId(self.kinds.len() as u32);
        self.kinds.push(kind.clone());
        self.lookup.insert(kind, id);
        id
    }

    pub(crate) fn add_named(&mut self, def: NamedDef) -> (NamedId, TypeId) {
        let nid = NamedId(self.named.len() as u32);
        self.named.push(def);
        let tid = self.intern(TypeKind::Named(nid));
        (nid, tid)
    }

    pub(crate) fn named_mut(&mut self, id: NamedId) -> &mut NamedDef {
        &mut self.named[id.0 as usize]
    }

    pub fn kind(&self, t: TypeId) -> &TypeKind {
        &self.kinds[t.0 as usize]
    }

    pub fn named_def(&self, id: NamedId) -> &NamedDef {
        &self.named[id.0 as usize]
    }

    pub fn named_ids(&self) -> impl Iterator<Item = NamedId> {
        (0..self.named.len() as u32).map(NamedId)
    }

    /// Resolve alias chains to the aliased type. Always unalias before
    /// using a `TypeId` as a map key.
    pub fn unalias(&self, mut t: TypeId) -> TypeId {
        while let TypeKind::Alias { target, .. } = self.kind(t) {
            t = *target;
        }
        t
    }

    /// The underlying type: what a named type is defined as. Identity for
    /// everything that is not named. Aliases are resolved first.
    pub fn underlying(&self, t: TypeId) -> TypeId {
        let t = self.unalias(t);
        match self.kind(t) {
            TypeKind::Named(id) => self.named_def(*id).underlying,
            _ => t,
        }
    }

    /// The interned pointer type `*T`, if the program contains one.
    ///
    /// The builder interns a pointer for every named type, so the forms the
    /// engine asks for (pointer receivers, reflection-derived pointers) are
    /// always present; anything else (`**T`, pointer to unnamed composite)
    /// has an empty method set and the caller skips it.
    pub fn pointer_to(&self, t: TypeId) -> Option<TypeId> {
        let t = self.unalias(t);
        self.lookup.get(&TypeKind::Pointer(t)).copied()
    }

    /// If `t` is interface-shaped (an interface, a named interface, or an
    /// alias of either), the canonical `Interface` node. Never a named type.
    pub fn interface_of(&self, t: TypeId) -> Option<TypeId> {
        let u = self.underlying(t);
        match self.kind(u) {
            TypeKind::Interface { .. } => Some(u),
            _ => None,
        }
    }

    pub fn is_interface(&self, t: TypeId) -> bool {
        self.interface_of(t).is_some()
    }

    /// Method requirements of an interface node (as returned by
    /// [`TypeTable::interface_of`]).
    pub fn interface_methods(&self, iface: TypeId) -> &[IfaceMethod] {
        match self.kind(iface) {
            TypeKind::Interface { methods } => methods,
            _ => &[],
        }
    }

    /// Parameter and result counts of a `Signature` type.
    pub fn signature_arity(&self, sig: TypeId) -> (usize, usize) {
        match self.kind(self.underlying(sig)) {
            TypeKind::Signature { params, results } => {
                (self.tuple_len(*params), self.tuple_len(*results))
            }
            _ => (0, 0),
        }
    }

    fn tuple_len(&self, t: TypeId) -> usize {
        match self.kind(t) {
            TypeKind::Tuple(elems) => elems.len(),
            _ => 0,
        }
    }

    /// Human-readable rendering, for logs and diagnostics only.
    pub fn display(&self, t: TypeId, pkg_path: impl Fn(PackageId) -> String + Copy) -> String {
        match self.kind(t) {
            TypeKind::Basic(b) => b.name().to_string(),
            TypeKind::Pointer(e) => format!("*{}", self.display(*e, pkg_path)),
            TypeKind::Slice(e) => format!("[]{}", self.display(*e, pkg_path)),
            TypeKind::Array { elem, len } => format!("[{}]{}", len, self.display(*elem, pkg_path)),
            TypeKind::Map { key, elem } => format!(
                "map[{}]{}",
                self.display(*key, pkg_path),
                self.display(*elem, pkg_path)
            ),
            TypeKind::Chan(e) => format!("chan {}", self.display(*e, pkg_path)),
            TypeKind::Struct { fields } => format!("struct{{{} fields}}", fields.len()),
            TypeKind::Tuple(elems) => format!("({} values)", elems.len()),
            TypeKind::Signature { params, results } => {
                format!("func({})({})", self.tuple_len(*params), self.tuple_len(*results))
            }
            TypeKind::Named(id) => {
                let def = self.named_def(*id);
                match def.pkg {
                    Some(p) => format!("{}.{}", pkg_path(p), def.name),
                    None => def.name.clone(),
                }
            }
            TypeKind::Interface { methods } => format!("interface{{{} methods}}", methods.len()),
            TypeKind::TypeParam { name } => name.clone(),
            TypeKind::Alias { name, .. } => name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_interning_dedupes() {
        let mut table = TypeTable::new();
        let int = table.intern(TypeKind::Basic(Basic::Int));
        let p1 = table.intern(TypeKind::Pointer(int));
        let p2 = table.intern(TypeKind::Pointer(int));
        assert_eq!(p1, p2);
        assert_ne!(p1, int);
    }

    #[test]
    fn test_named_types_are_nominal() {
        let mut table = TypeTable::new();
        let int = table.intern(TypeKind::Basic(Basic::Int));
        let (_, a) = table.add_named(NamedDef {
            name: "A".to_string(),
            pkg: None,
            underlying: int,
            methods: Vec::new(),
        });
        let (_, b) = table.add_named(NamedDef {
            name: "A".to_string(),
            pkg: None,
            underlying: int,
            methods: Vec::new(),
        });
        assert_ne!(a, b);
    }

    #[test]
    fn test_unalias_resolves_chains() {
        let mut table = TypeTable::new();
        let int = table.intern(TypeKind::Basic(Basic::Int));
        let a1 = table.intern(TypeKind::Alias {
            name: "MyInt".to_string(),
            target: int,
        });
        let a2 = table.intern(TypeKind::Alias {
            name: "MyInt2".to_string(),
            target: a1,
        });
        assert_eq!(table.unalias(a2), int);
        assert_eq!(table.unalias(int), int);
    }

    #[test]
    fn test_interface_of_sees_through_named_and_alias() {
        let mut table = TypeTable::new();
        let iface = table.intern(TypeKind::Interface {
            methods: Vec::new(),
        });
        let (_, named) = table.add_named(NamedDef {
            name: "W".to_string(),
            pkg: None,
            underlying: iface,
            methods: Vec::new(),
        });
        let alias = table.intern(TypeKind::Alias {
            name: "WAlias".to_string(),
            target: named,
        });
        assert_eq!(table.interface_of(named), Some(iface));
        assert_eq!(table.interface_of(alias), Some(iface));
        assert_eq!(table.interface_of(iface), Some(iface));
    }

    #[test]
    fn test_signature_arity() {
        let mut table = TypeTable::new();
        let int = table.intern(TypeKind::Basic(Basic::Int));
        let s = table.intern(TypeKind::Basic(Basic::Str));
        let params = table.intern(TypeKind::Tuple(TypeIdVec::from_slice(&[int, s])));
        let results = table.intern(TypeKind::Tuple(TypeIdVec::from_slice(&[int])));
        let sig = table.intern(TypeKind::Signature { params, results });
        assert_eq!(table.signature_arity(sig), (2, 1));
    }

    #[test]
    fn test_pointer_to_requires_interned_pointer() {
        let mut table = TypeTable::new();
        let int = table.intern(TypeKind::Basic(Basic::Int));
        assert_eq!(table.pointer_to(int), None);
        let p = table.intern(TypeKind::Pointer(int));
        assert_eq!(table.pointer_to(int), Some(p));
    }
}
