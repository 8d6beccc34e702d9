//! Convenient imports for common usage.
//!
//! ```rust,ignore
//! use deadfunc_core::prelude::*;
//! ```

pub use crate::builder::Deadfunc;
pub use crate::error::{DeadfuncError, DeadfuncResult};
pub use crate::reflection::ReflectionAllowlist;
pub use crate::rta::{analyze, Reachable, RtaResult, RtaStats};
pub use crate::ssa::{FuncId, Instr, Program, ProgramBuilder, Value};
pub use crate::types::{Basic, ObjId, TypeId};
