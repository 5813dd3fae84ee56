//! The core error codes, preserved verbatim as a `thiserror` enum.
//!
//! Every failure the core raises is one of these variants. Implementers of
//! host bindings may expand the `Display` text, but the discriminant (and
//! therefore the code) must not change meaning once assigned.

use thiserror::Error;

/// A core-level failure, tagged by its short code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CellError {
    /// `E0005` — typed access on an empty Cell.
    #[error("E0005: typed access on an empty cell")]
    EmptyAccess,

    /// `E0006` — typed access with mismatched dynamic type.
    #[error("E0006: typed access with mismatched dynamic type")]
    TypeMismatch,

    /// `E000G` — attempt to downgrade (or re-raise) protection below its
    /// current level.
    #[error("E000G: cannot downgrade protection level")]
    ProtectionDowngrade,

    /// `E000J` — raw swap/assign where either Proxy forbids in-place
    /// mutation.
    #[error("E000J: raw mutation of a protected proxy")]
    RawMutationForbidden,

    /// `E000K` — writable typed access on a constant-or-higher Cell.
    #[error("E000K: writable access to a constant-or-higher cell")]
    WriteForbidden,

    /// `E000L` — `clone` or `detach` on a `single`-level Cell.
    #[error("E000L: clone or detach on a single-level cell")]
    SingleForbidden,

    /// Not one of the protection codes: a type without an extension
    /// namespace was asked for one.
    #[error("target type `{0}` does not support extensions")]
    NoExtensions(&'static str),
}

/// Convenience alias used throughout the core.
pub type Result<T> = std::result::Result<T, CellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_display() {
        assert!(CellError::EmptyAccess.to_string().starts_with("E0005"));
        assert!(CellError::TypeMismatch.to_string().starts_with("E0006"));
        assert!(CellError::ProtectionDowngrade.to_string().starts_with("E000G"));
        assert!(CellError::RawMutationForbidden.to_string().starts_with("E000J"));
        assert!(CellError::WriteForbidden.to_string().starts_with("E000K"));
        assert!(CellError::SingleForbidden.to_string().starts_with("E000L"));
    }

    #[test]
    fn no_extensions_is_not_a_protection_code() {
        let e = CellError::NoExtensions("number");
        assert!(!e.to_string().starts_with('E'));
    }
}
