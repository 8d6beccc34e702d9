//! Program construction API.
//!
//! Upstream producers (the loader) assemble a [`Program`] through this
//! builder; the engine's own tests use it to assemble fixture programs.
//! Construction is two-phase: declare packages, types, and functions first,
//! then fill in function bodies, so instructions can reference any function
//! by handle.

use crate::error::{DeadfuncError, DeadfuncResult};
use crate::ssa::{is_user_path, BasicBlock, FuncId, Function, Instr, Package, Program};
use crate::types::arena::TypeIdVec;
use crate::types::{Basic, IfaceMethod, MethodDecl, NamedDef, ObjId, PackageId, TypeId, TypeKind, TypeTable};

/// Builder for a complete SSA program.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    table: TypeTable,
    packages: Vec<Package>,
    funcs: Vec<Function>,
    next_obj: u32,
    reflective_call: Option<FuncId>,
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn package(&mut self, path: &str) -> PackageId {
        if let Some(i) = self.packages.iter().position(|p| p.path == path) {
            return PackageId(i as u32);
        }
        let id = PackageId(self.packages.len() as u32);
        self.packages.push(Package {
            path: path.to_string(),
            user: is_user_path(path),
            named_types: Vec::new(),
        });
        id
    }

    // ---- types ----

    pub fn basic(&mut self, b: Basic) -> TypeId {
        self.table.intern(TypeKind::Basic(b))
    }

    pub fn pointer(&mut self, t: TypeId) -> TypeId {
        let t = self.table.unalias(t);
        self.table.intern(TypeKind::Pointer(t))
    }

    pub fn slice(&mut self, t: TypeId) -> TypeId {
        self.table.intern(TypeKind::Slice(t))
    }

    pub fn array(&mut self, elem: TypeId, len: u64) -> TypeId {
        self.table.intern(TypeKind::Array { elem, len })
    }

    pub fn map(&mut self, key: TypeId, elem: TypeId) -> TypeId {
        self.table.intern(TypeKind::Map { key, elem })
    }

    pub fn chan(&mut self, t: TypeId) -> TypeId {
        self.table.intern(TypeKind::Chan(t))
    }

    pub fn struct_type(&mut self, fields: &[TypeId]) -> TypeId {
        self.table.intern(TypeKind::Struct {
            fields: TypeIdVec::from_slice(fields),
        })
    }

    pub fn tuple(&mut self, elems: &[TypeId]) -> TypeId {
        self.table.intern(TypeKind::Tuple(TypeIdVec::from_slice(elems)))
    }

    pub fn signature(&mut self, params: &[TypeId], results: &[TypeId]) -> TypeId {
        let params = self.tuple(params);
        let results = self.tuple(results);
        self.table.intern(TypeKind::Signature { params, results })
    }

    pub fn type_param(&mut self, name: &str) -> TypeId {
        self.table.intern(TypeKind::TypeParam {
            name: name.to_string(),
        })
    }

    pub fn alias(&mut self, name: &str, target: TypeId) -> TypeId {
        self.table.intern(TypeKind::Alias {
            name: name.to_string(),
            target,
        })
    }

    pub fn empty_interface(&mut self) -> TypeId {
        self.table.intern(TypeKind::Interface {
            methods: Vec::new(),
        })
    }

    /// An interface with the given `(name, signature)` requirements.
    /// Exportedness follows the name's first rune; unexported methods are
    /// owned by `pkg`.
    pub fn interface(
        &mut self,
        pkg: Option<PackageId>,
        methods: &[(&str, TypeId)],
    ) -> DeadfuncResult<TypeId> {
        self.interface_with_embeds(pkg, methods, &[])
    }

    /// An interface that embeds other interfaces. Embedded methods are
    /// flattened into the method list at construction.
    ///
    /// Errors when an embedded type is not interface-shaped.
    pub fn interface_with_embeds(
        &mut self,
        pkg: Option<PackageId>,
        methods: &[(&str, TypeId)],
        embeds: &[TypeId],
    ) -> DeadfuncResult<TypeId> {
        let mut list: Vec<IfaceMethod> = Vec::new();
        for &(name, sig) in methods {
            let exported = is_exported(name);
            list.push(IfaceMethod {
                name: name.to_string(),
                pkg,
                exported,
                sig,
            });
        }
        for &embed in embeds {
            let Some(iface) = self.table.interface_of(embed) else {
                return Err(DeadfuncError::internal(
                    "interface declaration embeds a non-interface type",
                ));
            };
            for m in self.table.interface_methods(iface).to_vec() {
                if !list.iter().any(|e| e.name == m.name && e.pkg == m.pkg) {
                    list.push(m);
                }
            }
        }
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(self.table.intern(TypeKind::Interface { methods: list }))
    }

    pub fn named(&mut self, pkg: Option<PackageId>, name: &str, underlying: TypeId) -> TypeId {
        let (_, tid) = self.table.add_named(NamedDef {
            name: name.to_string(),
            pkg,
            underlying,
            methods: Vec::new(),
        });
        if let Some(p) = pkg {
            self.packages[p.0 as usize].named_types.push(tid);
        }
        tid
    }

    /// Declare a method on a named type. Exportedness follows the name; the
    /// defining package is the type's package.
    ///
    /// Errors when the receiver is not a named type.
    pub fn method(
        &mut self,
        named: TypeId,
        name: &str,
        sig: TypeId,
        pointer_receiver: bool,
        func: Option<FuncId>,
    ) -> DeadfuncResult<ObjId> {
        let named = self.table.unalias(named);
        let TypeKind::Named(nid) = *self.table.kind(named) else {
            return Err(DeadfuncError::internal(format!(
                "method {name}: receiver is not a named type"
            )));
        };
        let obj = ObjId(self.next_obj);
        self.next_obj += 1;
        let pkg = self.table.named_def(nid).pkg;
        self.table.named_mut(nid).methods.push(MethodDecl {
            name: name.to_string(),
            pkg,
            exported: is_exported(name),
            sig,
            pointer_receiver,
            func,
            obj,
        });
        Ok(obj)
    }

    // ---- functions ----

    pub fn function(&mut self, pkg: Option<PackageId>, name: &str, signature: TypeId) -> FuncId {
        let qualified = match pkg {
            Some(p) => format!("{}.{}", self.packages[p.0 as usize].path, name),
            None => name.to_string(),
        };
        self.function_qualified(pkg, name, &qualified, signature)
    }

    /// Declare a function with an explicit qualified name, for receivers and
    /// wrappers whose rendering differs from `pkg.name`.
    pub fn function_qualified(
        &mut self,
        pkg: Option<PackageId>,
        name: &str,
        qualified: &str,
        signature: TypeId,
    ) -> FuncId {
        let id = FuncId(self.funcs.len() as u32);
        self.funcs.push(Function {
            name: name.to_string(),
            qualified: qualified.to_string(),
            pkg,
            signature,
            origin: None,
            is_template: false,
            blocks: Vec::new(),
        });
        id
    }

    /// Declare an uninstantiated generic template.
    pub fn template(&mut self, pkg: Option<PackageId>, name: &str, signature: TypeId) -> FuncId {
        let f = self.function(pkg, name, signature);
        self.funcs[f.0 as usize].is_template = true;
        f
    }

    /// Declare an instantiation of a generic template.
    pub fn instantiation(&mut self, origin: FuncId, name: &str, signature: TypeId) -> FuncId {
        let pkg = self.funcs[origin.0 as usize].pkg;
        let f = self.function(pkg, name, signature);
        self.funcs[f.0 as usize].origin = Some(origin);
        f
    }

    pub fn set_blocks(&mut self, f: FuncId, blocks: Vec<BasicBlock>) {
        self.funcs[f.0 as usize].blocks = blocks;
    }

    /// Single-block body convenience.
    pub fn body(&mut self, f: FuncId, instrs: Vec<Instr>) {
        self.set_blocks(f, vec![BasicBlock { instrs }]);
    }

    /// Mark `f` as the reflection library's generic call entry point.
    pub fn set_reflective_call(&mut self, f: FuncId) {
        self.reflective_call = Some(f);
    }

    pub fn finish(mut self) -> Program {
        // Pointer forms the engine derives on demand (pointer receivers,
        // reflection-derived *T) must exist in the table; intern one per
        // named type.
        let named: Vec<TypeId> = self
            .table
            .named_ids()
            .map(|id| self.table.intern(TypeKind::Named(id)))
            .collect();
        for t in named {
            self.table.intern(TypeKind::Pointer(t));
        }
        Program {
            types: self.table,
            packages: self.packages,
            funcs: self.funcs,
            method_sets: Default::default(),
            reflective_call: self.reflective_call,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_interns_pointer_per_named_type() {
        let mut b = ProgramBuilder::new();
        let pkg = b.package("example.com/app");
        let int = b.basic(Basic::Int);
        let t = b.named(Some(pkg), "T", int);
        let prog = b.finish();
        assert!(prog.types().pointer_to(t).is_some());
    }

    #[test]
    fn test_package_deduplication() {
        let mut b = ProgramBuilder::new();
        let a = b.package("example.com/app");
        let b2 = b.package("example.com/app");
        assert_eq!(a, b2);
    }

    #[test]
    fn test_qualified_names() {
        let mut b = ProgramBuilder::new();
        let pkg = b.package("fmt");
        let sig = b.signature(&[], &[]);
        let f = b.function(Some(pkg), "Printf", sig);
        let prog = b.finish();
        assert_eq!(prog.func(f).qualified, "fmt.Printf");
        assert!(prog.is_stdlib_function(f));
    }

    #[test]
    fn test_embedded_interface_methods_are_flattened() {
        let mut b = ProgramBuilder::new();
        let pkg = b.package("example.com/app");
        let sig = b.signature(&[], &[]);
        let error_iface = b.interface(None, &[("Error", sig)]).unwrap();
        let e = b
            .interface_with_embeds(Some(pkg), &[("mark", sig)], &[error_iface])
            .unwrap();
        let prog = b.finish();
        let methods = prog.types().interface_methods(e);
        assert_eq!(methods.len(), 2);
        assert!(methods.iter().any(|m| m.name == "Error"));
        assert!(methods.iter().any(|m| m.name == "mark" && !m.exported));
    }

    #[test]
    fn test_embedding_non_interface_is_an_error() {
        let mut b = ProgramBuilder::new();
        let int = b.basic(Basic::Int);
        let err = b.interface_with_embeds(None, &[], &[int]).unwrap_err();
        assert!(matches!(err, DeadfuncError::Internal { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_method_on_non_named_receiver_is_an_error() {
        let mut b = ProgramBuilder::new();
        let int = b.basic(Basic::Int);
        let sig = b.signature(&[], &[]);
        let err = b.method(int, "Write", sig, false, None).unwrap_err();
        assert!(matches!(err, DeadfuncError::Internal { .. }));
        assert!(err.to_string().contains("Write"));
    }
}
