//! `cellcore` implements the data model at the heart of a small
//! dynamically-typed scripting language: a reference-counted, type-erased,
//! copy-on-write value cell with a four-level mutability protection ladder,
//! its shared header, its typed body, a small-object pool allocator, and the
//! execution context a host embeds to run a program.
//!
//! # Layers
//!
//! * [`ladder`] — the `mutable < protected < constant < single` protection
//!   ladder ([`ladder::ProtectLevel`]).
//! * [`error`] — the error codes every fallible operation returns
//!   ([`error::CellError`]).
//! * [`pool`] — the small-object pool allocator ([`pool::Pool`]) backing
//!   Proxy allocation.
//! * [`ext`] — per-type extension namespaces ([`ext::ExtensionNamespace`]),
//!   the seam a (not-provided) standard library would hang member methods
//!   off of.
//! * [`holder`] — the type-erased typed body ([`holder::Holder`],
//!   [`holder::HolderBody`]).
//! * [`proxy`] — the shared cell header ([`proxy::Proxy`]).
//! * [`cell`] — the public value handle ([`cell::Any`]).
//! * [`builtin`] — the concrete built-in payload types (`char`, `number`,
//!   `boolean`, `string`, `pointer`, `list`, `array`, `pair`, `hash_map`,
//!   `type`).
//! * [`registry`] — the built-in type table and top-level name bindings.
//! * [`compiler`] / [`interpreter`] — minimal grammar-table and
//!   scope-chain/call-stack shapes; no parsing or statement execution is
//!   implemented (out of scope).
//! * [`context`] — [`context::Context`], the aggregate a host constructs to
//!   run a program.
//!
//! ```
//! use cellcore::cell::Any;
//! use cellcore::builtin::PlNumber;
//!
//! let a = Any::make(PlNumber(7.0));
//! let mut b = a.clone();
//! *b.val::<PlNumber>(false).unwrap() = PlNumber(9.0);
//! assert_eq!(a.const_val::<PlNumber>().unwrap().0, 7.0);
//! assert_eq!(b.const_val::<PlNumber>().unwrap().0, 9.0);
//! ```

#![allow(dead_code)]

// `cellcore_derive`'s generated impls are written against the path
// `cellcore::holder::HolderBody` so that external crates deriving
// `BuiltinType` resolve it correctly; this crate also uses its own derive
// (on `ContextHandle`/`LibraryStub` in `builtin.rs`, and in several modules'
// own unit tests), so it needs to be reachable under its own package name
// here too.
extern crate self as cellcore;

pub mod builtin;
pub mod cell;
pub mod compiler;
pub mod context;
pub mod error;
pub mod ext;
pub mod holder;
pub mod interpreter;
pub mod ladder;
pub mod pool;
pub mod proxy;
pub mod registry;

pub use cell::Any;
pub use context::Context;
pub use error::{CellError, Result};
pub use ladder::ProtectLevel;
