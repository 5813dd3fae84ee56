//! The built-in type and top-level name registry.
//!
//! The core does not itself parse or execute anything (the grammar/compiler/
//! interpreter layer is explicitly minimal, see [`crate::compiler`] and
//! [`crate::interpreter`]); what it owns is the table the interpreter
//! consults to turn a type name token into a constructor, and a type's
//! [`TypeId`] back into its descriptor, plus the set of names bound at
//! global scope before any user code runs.

use crate::builtin::{
    PlArray, PlBool, PlChar, PlHashMap, PlList, PlNumber, PlPair, PlPointer, PlString, ARRAY_EXT,
    HASH_MAP_EXT, LIST_EXT, PAIR_EXT, STRING_EXT,
};
use crate::cell::Any;
use crate::error::{CellError, Result};
use crate::ext::ExtensionNamespace;
use once_cell::sync::Lazy;
use std::any::TypeId;
use std::collections::HashMap;

/// A thunk producing a fresh default-valued Cell of one built-in type.
pub type Constructor = fn() -> Any;

/// Static metadata for one registered type: its name, its default-value
/// constructor, its [`TypeId`], and (if any) its extension namespace.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    pub name: &'static str,
    pub type_id_fn: fn() -> TypeId,
    pub construct: Constructor,
    pub ext: Option<&'static ExtensionNamespace>,
}

impl TypeDescriptor {
    pub fn type_id(&self) -> TypeId {
        (self.type_id_fn)()
    }
}

fn descriptors() -> &'static [TypeDescriptor] {
    static TABLE: &[TypeDescriptor] = &[
        TypeDescriptor {
            name: "char",
            type_id_fn: TypeId::of::<PlChar>,
            construct: || Any::make(PlChar('\0')),
            ext: None,
        },
        TypeDescriptor {
            name: "number",
            type_id_fn: TypeId::of::<PlNumber>,
            construct: || Any::make(PlNumber(0.0)),
            ext: None,
        },
        TypeDescriptor {
            name: "boolean",
            type_id_fn: TypeId::of::<PlBool>,
            construct: || Any::make(PlBool(false)),
            ext: None,
        },
        TypeDescriptor {
            name: "pointer",
            type_id_fn: TypeId::of::<PlPointer>,
            construct: || Any::make(PlPointer(Any::empty())),
            ext: None,
        },
        TypeDescriptor {
            name: "string",
            type_id_fn: TypeId::of::<PlString>,
            construct: || Any::make(PlString(String::new())),
            ext: Some(&STRING_EXT),
        },
        TypeDescriptor {
            name: "list",
            type_id_fn: TypeId::of::<PlList>,
            construct: || Any::make(PlList(Vec::new())),
            ext: Some(&LIST_EXT),
        },
        TypeDescriptor {
            name: "array",
            type_id_fn: TypeId::of::<PlArray>,
            construct: || Any::make(PlArray(Vec::new())),
            ext: Some(&ARRAY_EXT),
        },
        TypeDescriptor {
            name: "pair",
            type_id_fn: TypeId::of::<PlPair>,
            construct: || Any::make(PlPair(Any::empty(), Any::empty())),
            ext: Some(&PAIR_EXT),
        },
        TypeDescriptor {
            name: "hash_map",
            type_id_fn: TypeId::of::<PlHashMap>,
            construct: || Any::make(PlHashMap(HashMap::new())),
            ext: Some(&HASH_MAP_EXT),
        },
    ];
    TABLE
}

/// The process-wide table of registered built-in types, keyed by name.
/// Built lazily on first use: types are looked up by name/TypeId through
/// this shared table rather than each carrying its own dedicated pool.
static BY_NAME: Lazy<HashMap<&'static str, TypeDescriptor>> =
    Lazy::new(|| descriptors().iter().map(|d| (d.name, *d)).collect());

static BY_TYPE_ID: Lazy<HashMap<TypeId, TypeDescriptor>> =
    Lazy::new(|| descriptors().iter().map(|d| (d.type_id(), *d)).collect());

/// Looks up a built-in type descriptor by its source-level name (e.g. the
/// operand of a `new` expression or a `typeof` result compared by name).
pub fn lookup_by_name(name: &str) -> Option<TypeDescriptor> {
    BY_NAME.get(name).copied()
}

/// Looks up a built-in type descriptor by the dynamic [`TypeId`] recovered
/// from a bound Cell.
pub fn lookup_by_type_id(id: TypeId) -> Option<TypeDescriptor> {
    BY_TYPE_ID.get(&id).copied()
}

/// Constructs the registry's default-valued Cell for a named built-in type.
/// `E0006` (reused as "unknown type name") when the name isn't registered.
pub fn construct(name: &str) -> Result<Any> {
    lookup_by_name(name).map(|d| (d.construct)()).ok_or(CellError::TypeMismatch)
}

/// The top-level name → Cell bindings a fresh [`crate::context::Context`]
/// starts with, before any user declaration runs. Empty for now: the
/// language's standard library (math, iostream, ...) lives outside this
/// crate's scope.
#[derive(Clone)]
pub struct GlobalBindings {
    names: HashMap<String, Any>,
}

impl GlobalBindings {
    pub fn new() -> Self {
        GlobalBindings { names: HashMap::new() }
    }

    pub fn get(&self, name: &str) -> Option<&Any> {
        self.names.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Any) {
        self.names.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }
}

impl Default for GlobalBindings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name_finds_every_built_in() {
        for n in ["char", "number", "boolean", "pointer", "string", "list", "array", "pair", "hash_map"] {
            assert!(lookup_by_name(n).is_some(), "missing descriptor for {n}");
        }
    }

    #[test]
    fn unknown_name_is_type_mismatch() {
        assert_eq!(construct("not_a_real_type").unwrap_err(), CellError::TypeMismatch);
    }

    #[test]
    fn construct_produces_the_right_dynamic_type() {
        let c = construct("string").unwrap();
        assert_eq!(c.get_type_name().unwrap(), "string");
    }

    #[test]
    fn by_type_id_round_trips_with_by_name() {
        let d = lookup_by_name("number").unwrap();
        let back = lookup_by_type_id(d.type_id()).unwrap();
        assert_eq!(back.name, "number");
    }

    #[test]
    fn descriptor_ext_matches_the_types_that_actually_expose_members() {
        for (name, has_ext) in [
            ("char", false),
            ("number", false),
            ("boolean", false),
            ("pointer", false),
            ("string", true),
            ("list", true),
            ("array", true),
            ("pair", true),
            ("hash_map", true),
        ] {
            let d = lookup_by_name(name).unwrap();
            assert_eq!(d.ext.is_some(), has_ext, "ext mismatch for {name}");
        }
    }

    #[test]
    fn global_bindings_start_empty() {
        let g = GlobalBindings::new();
        assert!(!g.contains("pi"));
    }
}
