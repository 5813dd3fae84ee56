//! Extension namespaces.
//!
//! The core does not implement the built-in libraries (math, iostream,
//! string/list/array/pair/hash_map member methods, ...) — those are out of
//! scope here. What the core does own is the *shape* of a per-type
//! namespace of member names, so that the (out-of-scope) interpreter can
//! resolve `value.member` into a dispatch against the library that actually
//! implements it.

/// A per-type named scope of members (methods/constants), reachable via
/// [`Holder::get_ext`](crate::holder::Holder::get_ext).
///
/// Instances are `'static` data baked into the built-in payload types; there
/// is one per type, not per value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionNamespace {
    pub type_name: &'static str,
    pub members: &'static [&'static str],
}

impl ExtensionNamespace {
    pub const fn new(type_name: &'static str, members: &'static [&'static str]) -> Self {
        ExtensionNamespace { type_name, members }
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.members.iter().any(|m| *m == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_member_checks_the_list() {
        const STRING_EXT: ExtensionNamespace = ExtensionNamespace::new("string", &["length", "upper"]);
        assert!(STRING_EXT.has_member("length"));
        assert!(!STRING_EXT.has_member("push"));
    }
}
