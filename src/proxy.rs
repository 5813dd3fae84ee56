//! The shared cell header.

use crate::holder::Holder;
use crate::ladder::ProtectLevel;
use std::cell::Cell as StdCell;

/// Shared metadata owned by exactly one live allocation, pointed at by
/// zero-or-more [`Any`](crate::cell::Any) handles.
///
/// `refcount`/`protect_level`/`is_rvalue` use [`std::cell::Cell`] rather than
/// plain fields because every `Any` handle reaches its Proxy through a raw
/// pointer (there is no single owning `&mut` to thread through) — keeping
/// refcount >= 1 for every Proxy reachable from a live Cell requires
/// mutating the count through a shared reference.
pub struct Proxy {
    pub(crate) refcount: StdCell<usize>,
    pub(crate) protect_level: StdCell<ProtectLevel>,
    pub(crate) is_rvalue: StdCell<bool>,
    pub(crate) data: Holder,
}

impl Proxy {
    pub fn new(data: Holder, level: ProtectLevel) -> Self {
        Proxy {
            refcount: StdCell::new(1),
            protect_level: StdCell::new(level),
            is_rvalue: StdCell::new(false),
            data,
        }
    }

    pub fn refcount(&self) -> usize {
        self.refcount.get()
    }

    pub fn protect_level(&self) -> ProtectLevel {
        self.protect_level.get()
    }

    pub fn is_rvalue(&self) -> bool {
        self.is_rvalue.get()
    }

    pub(crate) fn inc_ref(&self) {
        self.refcount.set(self.refcount.get() + 1);
    }

    /// Returns the refcount after decrementing, so the caller can tell
    /// whether this was the last share.
    pub(crate) fn dec_ref(&self) -> usize {
        let next = self.refcount.get() - 1;
        self.refcount.set(next);
        next
    }
}
