//! The interpreter back end.
//!
//! Statement execution, control-flow dispatch and function calling are
//! explicitly out of scope here. What's kept is the runtime shape the
//! core's Cell semantics actually interact with: a lexical scope chain of
//! name → Cell bindings, and a call stack of frames, so [`Any::val`]'s
//! copy-on-write and the protection ladder have somewhere concrete they'd
//! be exercised from in a complete implementation.

use crate::cell::Any;
use std::collections::HashMap;

/// One lexical scope: a flat table of local bindings. Scopes nest through
/// [`Interpreter`]'s `scopes` stack, innermost last.
#[derive(Debug, Default)]
pub struct Scope {
    bindings: HashMap<String, Any>,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    pub fn get(&self, name: &str) -> Option<&Any> {
        self.bindings.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Any> {
        self.bindings.get_mut(name)
    }

    pub fn define(&mut self, name: impl Into<String>, value: Any) {
        self.bindings.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}

/// One activation record on the call stack: the function's display name
/// (for diagnostics) and its own local scope chain depth at entry.
#[derive(Debug)]
pub struct Frame {
    pub function_name: String,
    pub base_scope_depth: usize,
}

/// The interpreter component. Owns the live scope chain and call stack;
/// has no `execute`/`eval` methods because no statement or expression
/// forms are specified to execute.
#[derive(Debug, Default)]
pub struct Interpreter {
    scopes: Vec<Scope>,
    frames: Vec<Frame>,
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter {
            scopes: vec![Scope::new()],
            frames: Vec::new(),
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    /// Pops the innermost scope. A no-op at the global scope: callers must
    /// not pop below depth 1.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Resolves a name by walking the scope chain from innermost to
    /// outermost (global).
    pub fn resolve(&self, name: &str) -> Option<&Any> {
        self.scopes.iter().rev().find_map(|s| s.get(name))
    }

    pub fn resolve_mut(&mut self, name: &str) -> Option<&mut Any> {
        self.scopes.iter_mut().rev().find_map(|s| s.get_mut(name))
    }

    /// Defines a binding in the innermost scope.
    pub fn define(&mut self, name: impl Into<String>, value: Any) {
        self.scopes
            .last_mut()
            .expect("global scope always present")
            .define(name, value);
    }

    pub fn call_stack_depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push_frame(&mut self, function_name: impl Into<String>) {
        self.frames.push(Frame {
            function_name: function_name.into(),
            base_scope_depth: self.scopes.len(),
        });
        self.push_scope();
    }

    /// Pops the current frame and every scope pushed since it was entered.
    pub fn pop_frame(&mut self) {
        if let Some(frame) = self.frames.pop() {
            while self.scopes.len() > frame.base_scope_depth {
                self.scopes.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::PlNumber;

    #[test]
    fn inner_scope_shadows_outer() {
        let mut interp = Interpreter::new();
        interp.define("x", Any::make(PlNumber(1.0)));
        interp.push_scope();
        interp.define("x", Any::make(PlNumber(2.0)));
        assert_eq!(interp.resolve("x").unwrap().to_integer(), Some(2));
        interp.pop_scope();
        assert_eq!(interp.resolve("x").unwrap().to_integer(), Some(1));
    }

    #[test]
    fn pop_scope_never_removes_the_global_scope() {
        let mut interp = Interpreter::new();
        interp.pop_scope();
        assert_eq!(interp.depth(), 1);
    }

    #[test]
    fn call_frame_cleans_up_its_own_scopes_on_pop() {
        let mut interp = Interpreter::new();
        interp.define("g", Any::make(PlNumber(1.0)));
        interp.push_frame("f");
        interp.push_scope();
        interp.define("local", Any::make(PlNumber(2.0)));
        assert_eq!(interp.call_stack_depth(), 1);
        interp.pop_frame();
        assert_eq!(interp.call_stack_depth(), 0);
        assert!(interp.resolve("local").is_none());
        assert!(interp.resolve("g").is_some());
    }
}
