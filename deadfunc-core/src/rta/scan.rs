//! Per-function instruction scan.
//!
//! One exhaustive match over the closed instruction set, plus a walk over
//! operand values: any function appearing in operand position is
//! address-taken. The callee position of a call is not an operand; a
//! statically called function is not address-taken by the call alone.

use super::Rta;
use crate::ssa::{Callee, FuncId, Instr, Value};

impl<'p> Rta<'p> {
    /// Scan the body of `f` once, updating the cross-product tables and the
    /// worklist.
    pub(crate) fn scan_function(&mut self, f: FuncId) {
        self.current = Some(f);
        let prog = self.prog;
        let func = prog.func(f);

        for block in &func.blocks {
            for instr in &block.instrs {
                match instr {
                    Instr::Call(call) => {
                        match &call.callee {
                            Callee::Invoke { iface, method } => {
                                self.visit_invoke(*iface, method);
                            }
                            Callee::Static(g) => {
                                self.mark_reachable(*g, false);
                                self.check_set_finalizer(*g, &call.args);
                            }
                            Callee::Dynamic { builtin } => {
                                if !builtin {
                                    self.visit_dyn_call(call.signature, f);
                                }
                            }
                        }
                        self.walk_operands(&call.args);
                    }
                    Instr::MakeInterface {
                        source,
                        target,
                        operand,
                    } => {
                        self.handle_make_interface(*source, *target);
                        self.walk_operand(operand);
                    }
                    Instr::TypeAssert { source, asserted } => {
                        self.handle_type_assert(*source, *asserted);
                    }
                    Instr::ChangeInterface { target } => {
                        self.handle_change_interface(*target);
                    }
                    Instr::MakeClosure { func, bindings } => {
                        self.visit_addr_taken(*func);
                        self.walk_operands(bindings);
                    }
                    Instr::Other { operands } => {
                        self.walk_operands(operands);
                    }
                }
            }
        }

        self.current = None;
    }

    fn walk_operands(&mut self, values: &[Value]) {
        for v in values {
            self.walk_operand(v);
        }
    }

    fn walk_operand(&mut self, v: &Value) {
        match v {
            Value::Func(g) | Value::Closure(g) => self.visit_addr_taken(*g),
            // A wrapped value is visited at its own defining instruction.
            Value::MakeInterface { .. } | Value::Local(_) | Value::Const => {}
        }
    }

    /// Finalizers run from the garbage collector, outside the call graph.
    /// A static call to the runtime registration function makes its second
    /// argument reachable and address-taken, unwrapping an interface
    /// conversion or a closure around it.
    pub(crate) fn check_set_finalizer(&mut self, callee: FuncId, args: &[Value]) {
        let func = self.prog.func(callee);
        let in_runtime = func
            .pkg
            .is_some_and(|p| self.prog.package_path(p) == "runtime");
        if !in_runtime || func.name != "SetFinalizer" || args.len() < 2 {
            return;
        }

        let mut finalizer = &args[1];
        if let Value::MakeInterface { inner, .. } = finalizer {
            finalizer = inner;
        }
        match finalizer {
            Value::Func(g) | Value::Closure(g) => self.mark_reachable(*g, true),
            Value::MakeInterface { .. } | Value::Local(_) | Value::Const => {}
        }
    }
}
