//! The public value handle.
//!
//! `Any` is a nullable, reference-counted, copy-on-write handle to a
//! [`Proxy`]. It is the one value type every binding, parameter, temporary
//! and container element in the language is represented by.

use crate::error::{CellError, Result};
use crate::ext::ExtensionNamespace;
use crate::holder::{Holder, HolderBody};
use crate::ladder::ProtectLevel;
use crate::proxy::Proxy;
use std::any::TypeId;
use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr::NonNull;

use crate::pool::{Pool, DEFAULT_POOL_SLOTS};
#[cfg(feature = "verbose")]
use log::warn;

thread_local! {
    static PROXY_POOL: RefCell<Pool<Proxy>> = RefCell::new(Pool::new(DEFAULT_POOL_SLOTS));
}

fn alloc_proxy(proxy: Proxy) -> NonNull<Proxy> {
    PROXY_POOL.with(|pool| pool.borrow_mut().alloc(proxy))
}

/// # Safety
/// `ptr` must have come from [`alloc_proxy`] and must not be freed twice.
unsafe fn free_proxy(ptr: NonNull<Proxy>) {
    PROXY_POOL.with(|pool| pool.borrow_mut().free(ptr));
}

/// The language's universal value handle ("Cell").
///
/// Either *empty* (the language's `Null`) or bound to a Proxy shared with
/// zero-or-more other `Any` handles.
pub struct Any {
    proxy: Option<NonNull<Proxy>>,
}

impl Any {
    /// Constructs an empty Cell — the language's `Null`.
    pub fn empty() -> Any {
        Any { proxy: None }
    }

    pub fn is_empty(&self) -> bool {
        self.proxy.is_none()
    }

    fn bind<T: HolderBody + Clone + 'static>(value: T, level: ProtectLevel) -> Any {
        let proxy = Proxy::new(Holder::new(value), level);
        Any {
            proxy: Some(alloc_proxy(proxy)),
        }
    }

    /// `Cell::make<T>` — binds at `mutable` (level 0).
    pub fn make<T: HolderBody + Clone + 'static>(value: T) -> Any {
        Self::bind(value, ProtectLevel::Mutable)
    }

    /// `Cell::make_protect<T>` — binds at `protected` (level 1).
    pub fn make_protect<T: HolderBody + Clone + 'static>(value: T) -> Any {
        Self::bind(value, ProtectLevel::Protected)
    }

    /// `Cell::make_constant<T>` — binds at `constant` (level 2).
    pub fn make_constant<T: HolderBody + Clone + 'static>(value: T) -> Any {
        Self::bind(value, ProtectLevel::Constant)
    }

    /// `Cell::make_single<T>` — binds at `single` (level 3).
    pub fn make_single<T: HolderBody + Clone + 'static>(value: T) -> Any {
        Self::bind(value, ProtectLevel::Single)
    }

    fn proxy(&self) -> Result<&Proxy> {
        match &self.proxy {
            Some(p) => Ok(unsafe { p.as_ref() }),
            None => Err(CellError::EmptyAccess),
        }
    }

    /// `Cell::type()` — the dynamic type token, or `E0005` if empty.
    pub fn type_id(&self) -> Result<TypeId> {
        Ok(self.proxy()?.data.type_id())
    }

    /// `Cell::get_type_name()`.
    pub fn get_type_name(&self) -> Result<&'static str> {
        Ok(self.proxy()?.data.type_name())
    }

    /// `Cell::is_same(other)` — Proxy identity, not value equality.
    pub fn is_same(&self, other: &Any) -> bool {
        match (&self.proxy, &other.proxy) {
            (None, None) => true,
            (Some(a), Some(b)) => a.as_ptr() == b.as_ptr(),
            _ => false,
        }
    }

    /// `Cell::compare(other)` — value equality: both empty, or both bound
    /// with equal Holders.
    pub fn compare(&self, other: &Any) -> bool {
        match (&self.proxy, &other.proxy) {
            (None, None) => true,
            (Some(a), Some(b)) => unsafe { a.as_ref().data.compare(&b.as_ref().data) },
            _ => false,
        }
    }

    /// `Cell::hash()`. Empty Cells hash identically to one another;
    /// `compare`-equal Cells hash identically.
    pub fn hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        match &self.proxy {
            None => 0u8.hash(&mut hasher),
            Some(p) => {
                1u8.hash(&mut hasher);
                unsafe { p.as_ref().data.hash_value(&mut hasher) };
            }
        }
        hasher.finish()
    }

    /// `Cell::to_string()`. `Null` for an empty Cell.
    pub fn to_string_value(&self) -> String {
        match &self.proxy {
            None => "Null".to_string(),
            Some(p) => unsafe { p.as_ref().data.to_display_string() },
        }
    }

    /// `Cell::to_integer()`.
    pub fn to_integer(&self) -> Option<i64> {
        match &self.proxy {
            None => None,
            Some(p) => unsafe { p.as_ref().data.to_integer() },
        }
    }

    /// `get_ext()` — the extension namespace for member lookup.
    pub fn get_ext(&self) -> Result<&'static ExtensionNamespace> {
        self.proxy()?.data.get_ext()
    }

    pub fn protect_level(&self) -> Result<ProtectLevel> {
        Ok(self.proxy()?.protect_level())
    }

    /// True from `protected` upward — `single` is strictly more restrictive
    /// than `protected`, so a `single` Cell reports `is_protect() == true`
    /// too, not just a Cell sitting exactly at `protected`.
    pub fn is_protect(&self) -> bool {
        matches!(self.protect_level(), Ok(level) if level >= ProtectLevel::Protected)
    }

    /// True from `constant` upward (so also true at `single`).
    pub fn is_constant(&self) -> bool {
        matches!(self.protect_level(), Ok(level) if level >= ProtectLevel::Constant)
    }

    pub fn is_single(&self) -> bool {
        matches!(self.protect_level(), Ok(ProtectLevel::Single))
    }

    pub fn is_rvalue(&self) -> bool {
        match &self.proxy {
            Some(p) => unsafe { p.as_ref().is_rvalue() },
            None => false,
        }
    }

    fn escalate(&self, target: ProtectLevel) -> Result<()> {
        let proxy = self.proxy()?;
        let next = proxy.protect_level().escalate(target)?;
        proxy.protect_level.set(next);
        Ok(())
    }

    /// Escalates to `protected` (level 1).
    pub fn protect(&self) -> Result<()> {
        self.escalate(ProtectLevel::Protected)
    }

    /// Escalates to `constant` (level 2).
    pub fn constant(&self) -> Result<()> {
        self.escalate(ProtectLevel::Constant)
    }

    /// Escalates to `single` (level 3).
    pub fn single(&self) -> Result<()> {
        self.escalate(ProtectLevel::Single)
    }

    /// Const (read-only) typed access. Never fails on protection, never
    /// clones. `E0005` if empty, `E0006` if the dynamic type doesn't match.
    pub fn const_val<T: HolderBody + 'static>(&self) -> Result<&T> {
        let proxy = self.proxy()?;
        proxy.data.downcast_ref::<T>().ok_or(CellError::TypeMismatch)
    }

    /// Writable typed access.
    ///
    /// `raw = false` is the normal path: fails `E000K` at `constant`/`single`,
    /// and mints a fresh Proxy (copy-on-write) unless this Cell uniquely
    /// owns a `mutable` Proxy. `raw = true` skips every check and mutates the
    /// current Proxy's Holder in place — reserved for the interpreter's own
    /// controlled internal paths, where aliasing is known to be safe.
    pub fn val<T: HolderBody + 'static>(&mut self, raw: bool) -> Result<&mut T> {
        {
            let proxy = self.proxy()?;
            if proxy.data.type_id() != TypeId::of::<T>() {
                return Err(CellError::TypeMismatch);
            }
        }

        if !raw {
            let (level, refcount) = {
                let proxy = self.proxy()?;
                (proxy.protect_level(), proxy.refcount())
            };
            if !matches!(level, ProtectLevel::Mutable | ProtectLevel::Protected) {
                #[cfg(feature = "verbose")]
                warn!("writable access refused: proxy at {:?}", level);
                return Err(CellError::WriteForbidden);
            }
            let needs_clone = level != ProtectLevel::Mutable || refcount > 1;
            if needs_clone {
                self.clone_on_write()?;
            }
        }

        let ptr = self.proxy.expect("checked bound above");
        let proxy = unsafe { &mut *ptr.as_ptr() };
        proxy.data.downcast_mut::<T>().ok_or(CellError::TypeMismatch)
    }

    /// Mints a fresh Proxy wrapping a duplicated Holder, releases this
    /// Cell's share of the old one, and repoints `self` at the new Proxy —
    /// the mechanism behind both `val`'s copy-on-write and the protection
    /// ladder's "replace the Holder, keep the binding" escalation path.
    fn clone_on_write(&mut self) -> Result<()> {
        let new_holder = {
            let proxy = self.proxy()?;
            proxy.data.duplicate()
        };
        let new_proxy = Proxy::new(new_holder, ProtectLevel::Mutable);
        let new_ptr = alloc_proxy(new_proxy);
        self.release();
        self.proxy = Some(new_ptr);
        Ok(())
    }

    /// `Cell::clone()` — a deep duplicate producing a brand-new,
    /// independent Cell at `mutable` protection. Distinct from the `Clone`
    /// trait impl below, which is the language's default "copy" (an alias
    /// that shares the Proxy and increments its refcount).
    ///
    /// Fails `E000L` at `single` protection.
    pub fn duplicate(&self) -> Result<Any> {
        let proxy = self.proxy()?;
        if proxy.protect_level() == ProtectLevel::Single {
            return Err(CellError::SingleForbidden);
        }
        let new_proxy = Proxy::new(proxy.data.duplicate(), ProtectLevel::Mutable);
        Ok(Any {
            proxy: Some(alloc_proxy(new_proxy)),
        })
    }

    /// Recursively requests inner Cells become structurally independent.
    /// Fails `E000L` at `single` protection.
    ///
    /// Breaks this Cell's own Proxy sharing first (if aliased, mints an
    /// independent copy exactly like `val`'s copy-on-write) before recursing
    /// into the Holder, so a container whose elements are aliases of one
    /// another ends up with each element owning its own Proxy.
    pub fn detach(&mut self) -> Result<()> {
        let ptr = match self.proxy {
            Some(p) => p,
            None => return Ok(()),
        };
        if unsafe { ptr.as_ref().protect_level() } == ProtectLevel::Single {
            return Err(CellError::SingleForbidden);
        }
        if unsafe { ptr.as_ref().refcount() } > 1 {
            self.clone_on_write()?;
        }
        let ptr = self.proxy.expect("checked bound above");
        unsafe { &mut *ptr.as_ptr() }.data.detach()
    }

    /// `Cell::try_move()` — when uniquely owned (refcount == 1), clears
    /// protection to `mutable` and marks this Cell as an r-value, without
    /// minting a new Proxy. Returns whether the move-qualification applied.
    ///
    /// Safe only because uniqueness implies there is no other observer of
    /// this Proxy; callers must not retain raw Holder pointers obtained
    /// before the call across it.
    pub fn try_move(&mut self) -> bool {
        match &self.proxy {
            Some(p) if unsafe { p.as_ref().refcount() } == 1 => {
                let proxy = unsafe { p.as_ref() };
                proxy.protect_level.set(ProtectLevel::Mutable);
                proxy.is_rvalue.set(true);
                true
            }
            _ => false,
        }
    }

    /// Non-raw swap: exchanges which Proxy `self` and `other` point to.
    /// Cheap, and invisible to any third Cell aliasing either Proxy.
    ///
    /// Raw swap: exchanges the two Proxies' Holders in place, so every Cell
    /// aliasing either Proxy observes the swap. Fails `E000J` if either
    /// Proxy's protection forbids in-place mutation (level >= 1). If either
    /// side is empty, there is no Proxy to mutate in place, so this falls
    /// back to the ordinary non-raw pointer swap instead of failing.
    pub fn swap(&mut self, other: &mut Any, raw: bool) -> Result<()> {
        if raw {
            if let (Some(a), Some(b)) = (self.proxy, other.proxy) {
                let pa = unsafe { a.as_ref() };
                let pb = unsafe { b.as_ref() };
                if !pa.protect_level().allows_raw_mutation() || !pb.protect_level().allows_raw_mutation() {
                    #[cfg(feature = "verbose")]
                    warn!(
                        "raw swap refused: proxies at {:?}/{:?} forbid in-place mutation",
                        pa.protect_level(),
                        pb.protect_level()
                    );
                    return Err(CellError::RawMutationForbidden);
                }
                unsafe {
                    std::mem::swap(&mut (*a.as_ptr()).data, &mut (*b.as_ptr()).data);
                }
                return Ok(());
            }
        }
        std::mem::swap(&mut self.proxy, &mut other.proxy);
        Ok(())
    }

    /// Non-raw assign: replaces this Cell's Proxy pointer with `other`'s
    /// (an aliasing rebind — always allowed, since it only touches this
    /// handle's own pointer field, never the shared Proxy).
    ///
    /// Raw assign: replaces the Holder inside this Cell's *current* Proxy
    /// with a duplicate of `other`'s value, so every alias observes the new
    /// value. Fails `E000J` if the current Proxy forbids in-place mutation.
    /// If either side is empty, there is no Holder to replace in place, so
    /// this falls back to the ordinary non-raw rebind instead of failing.
    pub fn assign(&mut self, other: &Any, raw: bool) -> Result<()> {
        if raw {
            if let (Some(ptr), Some(_)) = (self.proxy, other.proxy) {
                let other_proxy = other.proxy()?;
                let this_proxy = unsafe { ptr.as_ref() };
                if !this_proxy.protect_level().allows_raw_mutation() {
                    #[cfg(feature = "verbose")]
                    warn!(
                        "raw assign refused: proxy at {:?} forbids in-place mutation",
                        this_proxy.protect_level()
                    );
                    return Err(CellError::RawMutationForbidden);
                }
                let new_data = other_proxy.data.duplicate();
                unsafe {
                    (*ptr.as_ptr()).data = new_data;
                }
                return Ok(());
            }
        }
        *self = other.clone();
        Ok(())
    }

    fn release(&mut self) {
        if let Some(ptr) = self.proxy.take() {
            let remaining = unsafe { ptr.as_ref().dec_ref() };
            if remaining == 0 {
                unsafe { free_proxy(ptr) };
            }
        }
    }
}

impl Clone for Any {
    /// The language's default "copy": increments the shared Proxy's
    /// refcount. This is *not* `Cell::clone()` (see [`Any::duplicate`]).
    fn clone(&self) -> Any {
        if let Some(p) = &self.proxy {
            unsafe { p.as_ref().inc_ref() };
        }
        Any { proxy: self.proxy }
    }
}

impl Drop for Any {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Any {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.proxy {
            None => write!(f, "Any(Null)"),
            Some(_) => write!(f, "Any({})", self.to_string_value()),
        }
    }
}

impl PartialEq for Any {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellcore_derive::BuiltinType;

    #[derive(Debug, Clone, PartialEq, Hash, BuiltinType)]
    struct Num(i64);

    impl fmt::Display for Num {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    // Copy-on-write: mutating a typed access of an aliased Cell clones.
    #[test]
    fn copy_on_write_clones_before_mutating() {
        let a = Any::make(Num(7));
        let mut b = a.clone();
        b.val::<Num>(false).unwrap().0 = 9;
        assert_eq!(a.const_val::<Num>().unwrap().0, 7);
        assert_eq!(b.const_val::<Num>().unwrap().0, 9);
        assert!(!a.is_same(&b));
    }

    #[test]
    fn constant_refuses_mutation() {
        let mut c = Any::make_constant(Num(42));
        assert_eq!(c.val::<Num>(false).unwrap_err(), CellError::WriteForbidden);
        assert_eq!(c.const_val::<Num>().unwrap().0, 42);
    }

    #[test]
    fn raw_swap_fails_when_protected() {
        let mut a = Any::make_protect(Num(1));
        let mut b = Any::make(Num(2));
        assert_eq!(a.swap(&mut b, true).unwrap_err(), CellError::RawMutationForbidden);
    }

    #[test]
    fn raw_swap_falls_back_to_pointer_swap_when_either_side_empty() {
        let mut a = Any::empty();
        let mut b = Any::make(Num(2));
        assert!(a.swap(&mut b, true).is_ok());
        assert_eq!(a.const_val::<Num>().unwrap().0, 2);
        assert!(b.is_empty());
    }

    #[test]
    fn raw_assign_falls_back_to_rebind_when_either_side_empty() {
        let mut a = Any::empty();
        let other = Any::make(Num(4));
        assert!(a.assign(&other, true).is_ok());
        assert_eq!(a.const_val::<Num>().unwrap().0, 4);
        assert!(a.is_same(&other));
    }

    #[test]
    fn try_move_drops_protection() {
        let mut a = Any::make_protect(Num(5));
        assert!(a.try_move());
        assert!(!a.is_protect());
        assert!(a.is_rvalue());
    }

    #[test]
    fn single_forbids_clone() {
        let a = Any::make_single(Num(3));
        assert_eq!(a.duplicate().unwrap_err(), CellError::SingleForbidden);
    }

    #[test]
    fn round_trip_to_string_and_empty() {
        assert_eq!(Any::empty().to_string_value(), "Null");
        assert_eq!(Any::make(Num(5)).to_string_value(), "5");
    }

    #[test]
    fn empty_cells_compare_and_hash_equal() {
        let a = Any::empty();
        let b = Any::empty();
        assert!(a.compare(&b));
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn hash_agrees_with_compare() {
        let a = Any::make(Num(11));
        let b = Any::make(Num(11));
        assert!(a.compare(&b));
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn escalation_is_idempotent_and_refuses_downgrade() {
        let a = Any::make(Num(1));
        a.protect().unwrap();
        a.constant().unwrap();
        assert_eq!(a.protect().unwrap_err(), CellError::ProtectionDowngrade);
        assert_eq!(a.protect_level().unwrap(), ProtectLevel::Constant);
    }

    #[test]
    fn swap_symmetry_non_raw() {
        let mut a = Any::make(Num(1));
        let mut b = Any::make(Num(2));
        a.swap(&mut b, false).unwrap();
        a.swap(&mut b, false).unwrap();
        assert_eq!(a.const_val::<Num>().unwrap().0, 1);
        assert_eq!(b.const_val::<Num>().unwrap().0, 2);
    }

    #[test]
    fn swap_symmetry_raw() {
        let mut a = Any::make(Num(1));
        let mut b = Any::make(Num(2));
        a.swap(&mut b, true).unwrap();
        a.swap(&mut b, true).unwrap();
        assert_eq!(a.const_val::<Num>().unwrap().0, 1);
        assert_eq!(b.const_val::<Num>().unwrap().0, 2);
    }

    #[test]
    fn raw_swap_is_observed_through_a_third_alias_non_raw_is_not() {
        let mut a = Any::make(Num(1));
        let c = a.clone();
        let mut b = Any::make(Num(2));

        a.swap(&mut b, true).unwrap();
        assert_eq!(c.const_val::<Num>().unwrap().0, 2);

        let mut a2 = Any::make(Num(1));
        let c2 = a2.clone();
        let mut b2 = Any::make(Num(2));
        a2.swap(&mut b2, false).unwrap();
        assert_eq!(c2.const_val::<Num>().unwrap().0, 1);
    }

    #[test]
    fn val_at_refcount_one_is_stable_identity() {
        let mut a = Any::make(Num(1));
        let ptr1 = a.val::<Num>(false).unwrap() as *mut Num;
        let ptr2 = a.val::<Num>(false).unwrap() as *mut Num;
        assert_eq!(ptr1, ptr2);
    }

    #[test]
    fn type_mismatch_is_e0006() {
        #[derive(Debug, Clone, PartialEq, Hash, BuiltinType)]
        struct Other(bool);
        impl fmt::Display for Other {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
        let a = Any::make(Num(1));
        assert_eq!(a.const_val::<Other>().unwrap_err(), CellError::TypeMismatch);
    }

    #[test]
    fn empty_access_is_e0005() {
        let a = Any::empty();
        assert_eq!(a.const_val::<Num>().unwrap_err(), CellError::EmptyAccess);
    }
}
