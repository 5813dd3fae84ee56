//! The execution context.
//!
//! `Context` is the crate's top-level aggregate: one [`Compiler`], one
//! [`Interpreter`], the process-wide built-in [`GlobalBindings`], and any
//! command-line-style arguments passed in. A "sub-context" shares the
//! parent's compiler and globals but gets its own interpreter scope chain —
//! the shape a module import or an `eval`-like nested run would need.

use crate::builtin::{ContextHandle, LibraryStub, PlArray, PlString};
use crate::cell::Any;
use crate::compiler::Compiler;
use crate::interpreter::Interpreter;
use crate::registry::{self, GlobalBindings};
#[cfg(feature = "verbose")]
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};

/// Built-in type constructors every top-level scope starts with.
const BUILTIN_TYPE_NAMES: &[&str] =
    &["char", "number", "boolean", "pointer", "string", "list", "array", "pair", "hash_map"];

/// Native core operations with no dedicated payload type of their own;
/// bound as [`LibraryStub`]s (see its doc comment).
const NATIVE_OP_NAMES: &[&str] = &["to_integer", "to_string", "type", "clone", "move", "swap"];

/// External library collaborators this crate does not implement; bound as
/// [`LibraryStub`]s so their *names* are present without this crate
/// pretending to implement them.
const LIBRARY_NAMES: &[&str] = &["exception", "iostream", "system", "runtime", "math"];

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// The top-level aggregate a host embeds to run one program.
pub struct Context {
    id: u64,
    compiler: Compiler,
    interpreter: Interpreter,
    globals: GlobalBindings,
    args: Vec<String>,
}

impl Context {
    /// A fresh top-level context: standard grammar, the full built-in name
    /// set bound in the top-level scope, no arguments.
    pub fn new() -> Self {
        let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        let mut ctx = Context {
            id,
            compiler: Compiler::new(),
            interpreter: Interpreter::new(),
            globals: GlobalBindings::new(),
            args: Vec::new(),
        };
        ctx.bootstrap_globals();
        ctx
    }

    /// Binds every name a fresh top-level scope is expected to carry: the
    /// built-in type constructors, the `context` handle, the native
    /// operation names, and the external library names.
    fn bootstrap_globals(&mut self) {
        for name in BUILTIN_TYPE_NAMES {
            if let Ok(v) = registry::construct(name) {
                self.globals.insert(*name, v);
            }
        }
        // §4.3: "single is applied to members that must neither be rebound
        // nor aliased — chiefly `this` inside struct methods and the context
        // object itself."
        self.globals.insert("context", Any::make_single(ContextHandle(self.id)));
        for name in NATIVE_OP_NAMES {
            self.globals.insert(*name, Any::make_constant(LibraryStub(name)));
        }
        for name in LIBRARY_NAMES {
            self.globals.insert(*name, Any::make_constant(LibraryStub(name)));
        }
        #[cfg(feature = "verbose")]
        debug!(
            "context #{} bootstrapped: {} built-in types, {} native ops, {} library stubs",
            self.id,
            BUILTIN_TYPE_NAMES.len(),
            NATIVE_OP_NAMES.len(),
            LIBRARY_NAMES.len()
        );
    }

    /// A top-level context seeded with program arguments (`argv`-style),
    /// exposed to user code as bound `string` Cells.
    pub fn with_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ctx = Self::new();
        ctx.args = args.into_iter().map(Into::into).collect();
        ctx
    }

    /// A sub-context: shares `self`'s compiler and command-line arguments,
    /// but does NOT inherit any global `self` has bound — it gets its own
    /// fresh scope, re-populated from scratch with only the built-in types,
    /// native operations, and library stubs every top-level scope starts
    /// with, under its own fresh context identity and a fresh interpreter
    /// scope chain/call stack. This mirrors the original `create_subcontext`,
    /// which builds an entirely new storage table and re-adds only the
    /// built-ins, never copying the parent's declared variables.
    pub fn sub_context(&self) -> Self {
        let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        let mut ctx = Context {
            id,
            compiler: self.compiler.clone(),
            interpreter: Interpreter::new(),
            globals: GlobalBindings::new(),
            args: self.args.clone(),
        };
        ctx.bootstrap_globals();
        ctx
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// §6 "Command-line arguments": the program's `argv`, boxed as a single
    /// constant-level `array` Cell of `string` elements. Built fresh on
    /// every call rather than cached, since `Any` has no `Clone`-shares-data
    /// semantics that would let a cached constant be handed out safely
    /// without also sharing its Proxy (which would be fine too, but a fresh
    /// build keeps this method independent of mutable context state).
    pub fn args_cell(&self) -> Any {
        let elements = self.args.iter().cloned().map(PlString).map(Any::make).collect();
        Any::make_constant(PlArray(elements))
    }

    /// Looks up a global by name, falling back to the built-in type
    /// registry's default-constructed value when no global of that name has
    /// been bound yet (mirrors how an unqualified type name resolves before
    /// any user shadowing).
    pub fn resolve_global(&self, name: &str) -> Option<Any> {
        if let Some(v) = self.globals.get(name) {
            return Some(v.clone());
        }
        registry::construct(name).ok()
    }

    pub fn define_global(&mut self, name: impl Into<String>, value: Any) {
        self.globals.insert(name, value);
    }

    /// Binds the program's arguments into the interpreter's global scope
    /// under `args`, as the single constant-level `array` Cell §6 specifies
    /// — not one binding per argument.
    pub fn bind_args(&mut self) {
        self.interpreter.define("args", self.args_cell());
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Context bootstrap: every expected top-level name is present in a
    // fresh scope, and `context` resolves to a handle naming this context.
    #[test]
    fn context_bootstrap_binds_every_required_name() {
        // Run with `--features verbose RUST_LOG=debug` to see the bootstrap summary logged.
        let _ = env_logger::try_init();
        let ctx = Context::with_args(vec!["script", "--flag"]);
        for name in BUILTIN_TYPE_NAMES.iter().chain(NATIVE_OP_NAMES).chain(LIBRARY_NAMES) {
            assert!(ctx.resolve_global(name).is_some(), "missing global: {name}");
        }
        let handle = ctx.resolve_global("context").unwrap();
        assert_eq!(handle.get_type_name().unwrap(), "ContextHandle");
        assert_eq!(
            handle.const_val::<ContextHandle>().unwrap().0,
            ctx.id
        );
    }

    #[test]
    fn sub_context_does_not_inherit_parent_globals_but_gets_its_own_identity() {
        let mut ctx = Context::new();
        ctx.define_global("greeting", Any::make(PlString("hi".to_string())));
        let sub = ctx.sub_context();
        assert!(sub.globals.get("greeting").is_none());
        assert_eq!(sub.resolve_global("number").unwrap().get_type_name().unwrap(), "number");
        let handle = sub.resolve_global("context").unwrap();
        assert_eq!(handle.const_val::<ContextHandle>().unwrap().0, sub.id);
        assert_ne!(sub.id, ctx.id);
    }

    #[test]
    fn unbound_name_falls_back_to_the_builtin_registry() {
        let ctx = Context::new();
        let v = ctx.resolve_global("number").unwrap();
        assert_eq!(v.get_type_name().unwrap(), "number");
    }

    #[test]
    fn args_are_boxed_as_a_single_constant_array_cell() {
        let mut ctx = Context::with_args(vec!["a.cs", "--flag"]);
        ctx.bind_args();
        let args = ctx.interpreter().resolve("args").unwrap();
        assert_eq!(args.get_type_name().unwrap(), "array");
        assert!(args.is_constant());
        let array = args.const_val::<PlArray>().unwrap();
        assert_eq!(array.0.len(), 2);
        assert_eq!(array.0[0].to_string_value(), "a.cs");
        assert_eq!(array.0[1].to_string_value(), "--flag");
    }

    #[test]
    fn args_cell_matches_raw_args() {
        let ctx = Context::with_args(vec!["x", "y", "z"]);
        let cell = ctx.args_cell();
        assert!(cell.is_constant());
        let array = cell.const_val::<PlArray>().unwrap();
        assert_eq!(array.0.iter().map(|c| c.to_string_value()).collect::<Vec<_>>(), ctx.args());
    }
}
