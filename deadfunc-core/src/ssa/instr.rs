//! The closed instruction set the engine recognizes.
//!
//! The scan is a single exhaustive match: calls (static, dynamic, invoke),
//! the three interface conversions, closure construction, and a catch-all
//! that exists only so its operands participate in the address-taken walk.
//! The set is stable and known to the engine; no virtual dispatch.

use crate::ssa::FuncId;
use crate::types::{PackageId, TypeId};

/// An SSA value as it appears in operand position.
#[derive(Debug, Clone)]
pub enum Value {
    /// A function used as a value; address-taken wherever it appears.
    Func(FuncId),
    /// A closure value over `func`.
    Closure(FuncId),
    /// A value wrapped into an interface. Kept structured so argument
    /// inspection (finalizer extraction) can unwrap it.
    MakeInterface { ty: TypeId, inner: Box<Value> },
    /// An opaque register.
    Local(u32),
    /// An opaque constant.
    Const,
}

/// Reference to an interface method at an invoke site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRef {
    pub name: String,
    /// Defining package; required to resolve unexported methods.
    pub pkg: Option<PackageId>,
}

/// Who a call targets.
#[derive(Debug, Clone)]
pub enum Callee {
    /// Statically resolved direct call.
    Static(FuncId),
    /// Call through a function value of unknown identity. Builtins are
    /// flagged so they do not register as dynamic call sites.
    Dynamic { builtin: bool },
    /// Dynamic dispatch through an interface value.
    Invoke { iface: TypeId, method: MethodRef },
}

/// A call instruction in any of the three modes.
#[derive(Debug, Clone)]
pub struct CallInstr {
    pub callee: Callee,
    /// Signature of the callee; groups dynamic sites with address-taken
    /// functions of the same shape.
    pub signature: TypeId,
    pub args: Vec<Value>,
}

/// One SSA instruction.
#[derive(Debug, Clone)]
pub enum Instr {
    Call(CallInstr),
    /// Conversion of a concrete value into an interface; materializes the
    /// source type at runtime.
    MakeInterface {
        source: TypeId,
        target: TypeId,
        operand: Value,
    },
    /// `x.(T)` on an interface value.
    TypeAssert { source: TypeId, asserted: TypeId },
    /// Interface-to-interface conversion.
    ChangeInterface { target: TypeId },
    /// Closure construction; the closed-over function is address-taken.
    MakeClosure { func: FuncId, bindings: Vec<Value> },
    /// Any other instruction; scanned only for function-valued operands.
    Other { operands: Vec<Value> },
}

/// A basic block: a straight-line run of instructions.
#[derive(Debug, Clone, Default)]
pub struct BasicBlock {
    pub instrs: Vec<Instr>,
}

impl Instr {
    pub fn static_call(callee: FuncId, signature: TypeId, args: Vec<Value>) -> Self {
        Instr::Call(CallInstr {
            callee: Callee::Static(callee),
            signature,
            args,
        })
    }

    pub fn dynamic_call(signature: TypeId, args: Vec<Value>) -> Self {
        Instr::Call(CallInstr {
            callee: Callee::Dynamic { builtin: false },
            signature,
            args,
        })
    }

    pub fn builtin_call(signature: TypeId, args: Vec<Value>) -> Self {
        Instr::Call(CallInstr {
            callee: Callee::Dynamic { builtin: true },
            signature,
            args,
        })
    }

    pub fn invoke(
        iface: TypeId,
        method_pkg: Option<PackageId>,
        method: &str,
        signature: TypeId,
        args: Vec<Value>,
    ) -> Self {
        Instr::Call(CallInstr {
            callee: Callee::Invoke {
                iface,
                method: MethodRef {
                    name: method.to_string(),
                    pkg: method_pkg,
                },
            },
            signature,
            args,
        })
    }

    pub fn make_interface(source: TypeId, target: TypeId, operand: Value) -> Self {
        Instr::MakeInterface {
            source,
            target,
            operand,
        }
    }
}
