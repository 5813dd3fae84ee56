//! The typed cell-body.
//!
//! [`HolderBody`] is the dyn-safe vtable every concrete payload type plugs
//! into: identity (via [`std::any::Any`]), equality, hashing, stringification,
//! integer coercion, extension-namespace lookup, and structural detach. A
//! [`Holder`] is the type-erased box around one such payload, owned by
//! exactly one [`Proxy`](crate::proxy::Proxy) at a time.
//!
//! A closed built-in payload set and an open, host-defined one share a
//! single generic `Box<dyn HolderBody>` rather than a hand-rolled enum
//! discriminant, so the common case stays monomorphizable and
//! branch-predictable at each call site without a separate code path per
//! kind of payload.

use crate::error::{CellError, Result};
use crate::ext::ExtensionNamespace;
use crate::pool::{Pool, DEFAULT_POOL_SLOTS};
use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hasher;
use std::ptr::NonNull;

/// The vtable a concrete payload type implements to become a Holder body.
///
/// Most implementers derive this with `#[derive(BuiltinType)]` (see
/// `cellcore_derive`), which delegates every operation to the type's own
/// `Clone`/`PartialEq`/`Hash`/`Display` impls. Types that need a non-default
/// `to_integer`, `detach`, or `get_ext` implement the trait by hand instead.
pub trait HolderBody: std::any::Any + fmt::Debug {
    /// A human-readable name for the dynamic type, used by `typeof` and
    /// error messages. Stable per concrete `T`.
    fn type_name(&self) -> &'static str;

    /// Deep-copies the value. Containers replicate their elements, which are
    /// themselves Cells and so increment (not deep-copy) their Proxies.
    fn duplicate(&self) -> Box<dyn HolderBody>;

    /// False when `other`'s dynamic type differs from `self`'s; otherwise
    /// delegates to `T`'s equality.
    fn compare(&self, other: &dyn HolderBody) -> bool;

    /// Feeds this value's hash into `state`. Must agree with `compare`: if
    /// `a.compare(b)` then `a.hash_value` and `b.hash_value` must produce the
    /// same digest for the same hasher state.
    fn hash_value(&self, state: &mut dyn Hasher);

    /// `to_string` for this payload (`true`/`false` for bool and `Null` for
    /// an empty Cell are both handled on [`Holder`]/[`Any`](crate::cell::Any)
    /// directly, not here).
    fn to_display_string(&self) -> String;

    fn as_any(&self) -> &dyn std::any::Any;
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;

    /// Integer coercion. A no-op (`None`) for types with no sensible integer
    /// reading; overridden for `char`, `number`, `boolean`.
    fn to_integer(&self) -> Option<i64> {
        None
    }

    /// Recursively requests that inner Cells become writable (break Proxy
    /// sharing). A no-op for value-type primitives; overridden by containers
    /// and the `pointer` payload.
    fn detach(&mut self) -> Result<()> {
        Ok(())
    }

    /// The per-type extension namespace, if any. Types without one must
    /// return `None` here — [`Holder::get_ext`] turns that into the distinct
    /// "target type does not support extensions" failure, never a sentinel.
    fn get_ext(&self) -> Option<&'static ExtensionNamespace> {
        None
    }
}

// One small-object pool per concrete payload type `T`, keyed lazily by
// `TypeId` rather than one static per type (Rust has no reflection to
// enumerate "every built-in payload type" at compile time). Each entry is a
// `RefCell<Pool<T>>` type-erased behind `std::any::Any` and downcast back to
// its concrete `Pool<T>` on lookup.
thread_local! {
    static HOLDER_POOLS: RefCell<HashMap<TypeId, Box<dyn std::any::Any>>> = RefCell::new(HashMap::new());
}

fn with_type_pool<T: 'static, R>(f: impl FnOnce(&mut Pool<T>) -> R) -> R {
    HOLDER_POOLS.with(|pools| {
        let mut pools = pools.borrow_mut();
        let entry = pools
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(RefCell::new(Pool::<T>::new(DEFAULT_POOL_SLOTS))) as Box<dyn std::any::Any>);
        let cell = entry
            .downcast_ref::<RefCell<Pool<T>>>()
            .expect("pool entry keyed by TypeId::of::<T>()");
        f(&mut cell.borrow_mut())
    })
}

/// # Safety
/// `ptr` must have been produced by [`Holder::new::<T>`] and must not be
/// freed twice.
unsafe fn free_holder<T: HolderBody + 'static>(ptr: NonNull<dyn HolderBody>) {
    let typed = NonNull::new_unchecked(ptr.as_ptr() as *mut T);
    with_type_pool::<T, _>(|pool| unsafe { pool.free(typed) });
}

/// # Safety
/// `body`'s concrete dynamic type must be `T`.
unsafe fn duplicate_holder<T: HolderBody + Clone + 'static>(body: &dyn HolderBody) -> Holder {
    let concrete = body.as_any().downcast_ref::<T>().expect("vtable matches T");
    Holder::new(concrete.clone())
}

/// The type-erased typed body owned by a [`Proxy`](crate::proxy::Proxy).
///
/// Backed by a per-concrete-type small-object pool rather than a bare
/// `Box<dyn HolderBody>`, so repeated allocation of the same payload type
/// (the common case — a tight loop re-binding the same `number` Cell, say)
/// recycles freelist slots instead of round-tripping the system allocator.
/// `free_fn`/`duplicate_fn` are monomorphized per concrete `T` at
/// construction time and carried alongside the erased pointer, since the
/// pool lookup itself needs `T` to downcast back to its typed freelist.
pub struct Holder {
    ptr: NonNull<dyn HolderBody>,
    free_fn: unsafe fn(NonNull<dyn HolderBody>),
    duplicate_fn: unsafe fn(&dyn HolderBody) -> Holder,
}

impl Holder {
    pub fn new<T: HolderBody + Clone + 'static>(value: T) -> Self {
        let typed_ptr: NonNull<T> = with_type_pool::<T, _>(|pool| pool.alloc(value));
        let ptr: NonNull<dyn HolderBody> = typed_ptr;
        Holder {
            ptr,
            free_fn: free_holder::<T>,
            duplicate_fn: duplicate_holder::<T>,
        }
    }

    fn body(&self) -> &dyn HolderBody {
        unsafe { self.ptr.as_ref() }
    }

    /// Stable per-concrete-`T` token used for equality-typed dispatch.
    pub fn type_id(&self) -> TypeId {
        self.body().as_any().type_id()
    }

    pub fn type_name(&self) -> &'static str {
        self.body().type_name()
    }

    pub fn duplicate(&self) -> Holder {
        unsafe { (self.duplicate_fn)(self.body()) }
    }

    pub fn compare(&self, other: &Holder) -> bool {
        if self.type_id() != other.type_id() {
            return false;
        }
        self.body().compare(other.body())
    }

    pub fn hash_value(&self, state: &mut dyn Hasher) {
        self.body().hash_value(state)
    }

    pub fn to_integer(&self) -> Option<i64> {
        self.body().to_integer()
    }

    pub fn to_display_string(&self) -> String {
        self.body().to_display_string()
    }

    pub fn detach(&mut self) -> Result<()> {
        unsafe { self.ptr.as_mut() }.detach()
    }

    pub fn get_ext(&self) -> Result<&'static ExtensionNamespace> {
        self.body().get_ext().ok_or(CellError::NoExtensions(self.body().type_name()))
    }

    pub fn downcast_ref<T: HolderBody + 'static>(&self) -> Option<&T> {
        self.body().as_any().downcast_ref()
    }

    pub fn downcast_mut<T: HolderBody + 'static>(&mut self) -> Option<&mut T> {
        unsafe { self.ptr.as_mut() }.as_any_mut().downcast_mut()
    }
}

impl Drop for Holder {
    fn drop(&mut self) {
        unsafe { (self.free_fn)(self.ptr) }
    }
}

impl fmt::Debug for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Holder").field(&self.body()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellcore_derive::BuiltinType;

    #[derive(Debug, Clone, PartialEq, Hash, BuiltinType)]
    struct Tagged(i64);

    impl fmt::Display for Tagged {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    #[test]
    fn duplicate_produces_an_equal_but_distinct_value() {
        let h = Holder::new(Tagged(5));
        let d = h.duplicate();
        assert!(h.compare(&d));
        assert_eq!(d.to_display_string(), "5");
    }

    #[test]
    fn compare_is_false_across_dynamic_types() {
        #[derive(Debug, Clone, PartialEq, Hash, BuiltinType)]
        struct Other(i64);
        impl fmt::Display for Other {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        let a = Holder::new(Tagged(5));
        let b = Holder::new(Other(5));
        assert!(!a.compare(&b));
    }

    #[test]
    fn get_ext_without_namespace_is_a_distinct_failure() {
        let h = Holder::new(Tagged(1));
        match h.get_ext() {
            Err(CellError::NoExtensions(name)) => assert_eq!(name, "Tagged"),
            other => panic!("expected NoExtensions, got {:?}", other),
        }
    }
}
