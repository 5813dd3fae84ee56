//! Concrete built-in payload types.
//!
//! Each type here implements [`HolderBody`](crate::holder::HolderBody),
//! either via `#[derive(BuiltinType)]` (when `Clone`/`PartialEq`/`Hash`/
//! `Display` alone are enough) or by hand, where `to_integer`, `detach`, or
//! `get_ext` need type-specific behavior.

use crate::cell::Any;
use crate::error::Result;
use crate::ext::ExtensionNamespace;
use crate::holder::HolderBody;
use cellcore_derive::BuiltinType;
use std::any::Any as StdAny;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// `char` — a single Unicode scalar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlChar(pub char);

impl fmt::Display for PlChar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl HolderBody for PlChar {
    fn type_name(&self) -> &'static str {
        "char"
    }
    fn duplicate(&self) -> Box<dyn HolderBody> {
        Box::new(*self)
    }
    fn compare(&self, other: &dyn HolderBody) -> bool {
        other.as_any().downcast_ref::<Self>() == Some(self)
    }
    fn hash_value(&self, state: &mut dyn Hasher) {
        Hash::hash(self, state)
    }
    fn to_display_string(&self) -> String {
        self.0.to_string()
    }
    fn to_integer(&self) -> Option<i64> {
        Some(self.0 as i64)
    }
    fn as_any(&self) -> &dyn StdAny {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn StdAny {
        self
    }
}

/// `number` — the language's sole numeric type, an IEEE-754 double.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlNumber(pub f64);

impl Eq for PlNumber {}

impl Hash for PlNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for PlNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl HolderBody for PlNumber {
    fn type_name(&self) -> &'static str {
        "number"
    }
    fn duplicate(&self) -> Box<dyn HolderBody> {
        Box::new(*self)
    }
    fn compare(&self, other: &dyn HolderBody) -> bool {
        other.as_any().downcast_ref::<Self>() == Some(self)
    }
    fn hash_value(&self, state: &mut dyn Hasher) {
        Hash::hash(self, state)
    }
    fn to_display_string(&self) -> String {
        self.0.to_string()
    }
    fn to_integer(&self) -> Option<i64> {
        Some(self.0 as i64)
    }
    fn as_any(&self) -> &dyn StdAny {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn StdAny {
        self
    }
}

/// `boolean`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlBool(pub bool);

impl fmt::Display for PlBool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.0 { "true" } else { "false" })
    }
}

impl HolderBody for PlBool {
    fn type_name(&self) -> &'static str {
        "boolean"
    }
    fn duplicate(&self) -> Box<dyn HolderBody> {
        Box::new(*self)
    }
    fn compare(&self, other: &dyn HolderBody) -> bool {
        other.as_any().downcast_ref::<Self>() == Some(self)
    }
    fn hash_value(&self, state: &mut dyn Hasher) {
        Hash::hash(self, state)
    }
    fn to_display_string(&self) -> String {
        self.to_string()
    }
    fn to_integer(&self) -> Option<i64> {
        Some(if self.0 { 1 } else { 0 })
    }
    fn as_any(&self) -> &dyn StdAny {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn StdAny {
        self
    }
}

/// `string` — a growable, owned UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlString(pub String);

impl fmt::Display for PlString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) const STRING_EXT: ExtensionNamespace =
    ExtensionNamespace::new("string", &["length", "upper", "lower", "substr", "split", "trim"]);

impl HolderBody for PlString {
    fn type_name(&self) -> &'static str {
        "string"
    }
    fn duplicate(&self) -> Box<dyn HolderBody> {
        Box::new(self.clone())
    }
    fn compare(&self, other: &dyn HolderBody) -> bool {
        other.as_any().downcast_ref::<Self>() == Some(self)
    }
    fn hash_value(&self, state: &mut dyn Hasher) {
        Hash::hash(self, state)
    }
    fn to_display_string(&self) -> String {
        self.0.clone()
    }
    fn as_any(&self) -> &dyn StdAny {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn StdAny {
        self
    }
    fn get_ext(&self) -> Option<&'static ExtensionNamespace> {
        Some(&STRING_EXT)
    }
}

/// `pointer` — a reference to another Cell (the language's reference type).
/// Equality and hashing are by Proxy identity, not by the pointed-to value.
#[derive(Debug, Clone)]
pub struct PlPointer(pub Any);

impl PartialEq for PlPointer {
    fn eq(&self, other: &Self) -> bool {
        self.0.is_same(&other.0)
    }
}

impl fmt::Display for PlPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&{}", self.0.to_string_value())
    }
}

impl HolderBody for PlPointer {
    fn type_name(&self) -> &'static str {
        "pointer"
    }
    fn duplicate(&self) -> Box<dyn HolderBody> {
        Box::new(self.clone())
    }
    fn compare(&self, other: &dyn HolderBody) -> bool {
        other.as_any().downcast_ref::<Self>().map_or(false, |o| self == o)
    }
    fn hash_value(&self, state: &mut dyn Hasher) {
        state.write_u64(self.0.hash())
    }
    fn to_display_string(&self) -> String {
        self.to_string()
    }
    fn detach(&mut self) -> Result<()> {
        self.0.detach()
    }
    fn as_any(&self) -> &dyn StdAny {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn StdAny {
        self
    }
}

/// `list` — a growable, heterogeneous sequence of Cells.
#[derive(Debug, Clone)]
pub struct PlList(pub Vec<Any>);

impl PartialEq for PlList {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().zip(&other.0).all(|(a, b)| a.compare(b))
    }
}

impl Hash for PlList {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for item in &self.0 {
            state.write_u64(item.hash());
        }
    }
}

impl fmt::Display for PlList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", item.to_string_value())?;
        }
        write!(f, "]")
    }
}

pub(crate) const LIST_EXT: ExtensionNamespace =
    ExtensionNamespace::new("list", &["push", "pop", "length", "sort", "reverse", "clear"]);

impl HolderBody for PlList {
    fn type_name(&self) -> &'static str {
        "list"
    }
    fn duplicate(&self) -> Box<dyn HolderBody> {
        Box::new(self.clone())
    }
    fn compare(&self, other: &dyn HolderBody) -> bool {
        other.as_any().downcast_ref::<Self>().map_or(false, |o| self == o)
    }
    fn hash_value(&self, state: &mut dyn Hasher) {
        Hash::hash(self, state)
    }
    fn to_display_string(&self) -> String {
        self.to_string()
    }
    fn detach(&mut self) -> Result<()> {
        for item in &mut self.0 {
            item.detach()?;
        }
        Ok(())
    }
    fn get_ext(&self) -> Option<&'static ExtensionNamespace> {
        Some(&LIST_EXT)
    }
    fn as_any(&self) -> &dyn StdAny {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn StdAny {
        self
    }
}

/// `array` — a fixed-length sequence of Cells, fixed at construction time.
#[derive(Debug, Clone)]
pub struct PlArray(pub Vec<Any>);

impl PartialEq for PlArray {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().zip(&other.0).all(|(a, b)| a.compare(b))
    }
}

impl Hash for PlArray {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for item in &self.0 {
            state.write_u64(item.hash());
        }
    }
}

impl fmt::Display for PlArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", item.to_string_value())?;
        }
        write!(f, ")")
    }
}

pub(crate) const ARRAY_EXT: ExtensionNamespace = ExtensionNamespace::new("array", &["length", "fill"]);

impl HolderBody for PlArray {
    fn type_name(&self) -> &'static str {
        "array"
    }
    fn duplicate(&self) -> Box<dyn HolderBody> {
        Box::new(self.clone())
    }
    fn compare(&self, other: &dyn HolderBody) -> bool {
        other.as_any().downcast_ref::<Self>().map_or(false, |o| self == o)
    }
    fn hash_value(&self, state: &mut dyn Hasher) {
        Hash::hash(self, state)
    }
    fn to_display_string(&self) -> String {
        self.to_string()
    }
    fn detach(&mut self) -> Result<()> {
        for item in &mut self.0 {
            item.detach()?;
        }
        Ok(())
    }
    fn get_ext(&self) -> Option<&'static ExtensionNamespace> {
        Some(&ARRAY_EXT)
    }
    fn as_any(&self) -> &dyn StdAny {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn StdAny {
        self
    }
}

/// `pair` — a fixed two-element tuple of Cells.
#[derive(Debug, Clone)]
pub struct PlPair(pub Any, pub Any);

impl PartialEq for PlPair {
    fn eq(&self, other: &Self) -> bool {
        self.0.compare(&other.0) && self.1.compare(&other.1)
    }
}

impl Hash for PlPair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash());
        state.write_u64(self.1.hash());
    }
}

impl fmt::Display for PlPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0.to_string_value(), self.1.to_string_value())
    }
}

pub(crate) const PAIR_EXT: ExtensionNamespace = ExtensionNamespace::new("pair", &["first", "second"]);

impl HolderBody for PlPair {
    fn type_name(&self) -> &'static str {
        "pair"
    }
    fn duplicate(&self) -> Box<dyn HolderBody> {
        Box::new(self.clone())
    }
    fn compare(&self, other: &dyn HolderBody) -> bool {
        other.as_any().downcast_ref::<Self>().map_or(false, |o| self == o)
    }
    fn hash_value(&self, state: &mut dyn Hasher) {
        Hash::hash(self, state)
    }
    fn to_display_string(&self) -> String {
        self.to_string()
    }
    fn detach(&mut self) -> Result<()> {
        self.0.detach()?;
        self.1.detach()
    }
    fn get_ext(&self) -> Option<&'static ExtensionNamespace> {
        Some(&PAIR_EXT)
    }
    fn as_any(&self) -> &dyn StdAny {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn StdAny {
        self
    }
}

/// A hashable, restricted key type for [`PlHashMap`]. Map keys are
/// restricted to a handful of primitive kinds rather than accepting an
/// arbitrary Cell, so equality and hashing stay well-defined.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlKey {
    Char(char),
    Number(u64), // bit pattern, so Eq/Hash are well-defined for floats
    Bool(bool),
    Str(String),
}

/// `hash_map` — a map keyed by a restricted primitive subset of Cell.
#[derive(Debug, Clone)]
pub struct PlHashMap(pub HashMap<PlKey, Any>);

impl PartialEq for PlHashMap {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().all(|(k, v)| other.0.get(k).map_or(false, |ov| v.compare(ov)))
    }
}

impl Hash for PlHashMap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Order-independent: XOR each entry's own hash together.
        let mut acc: u64 = 0;
        for (k, v) in &self.0 {
            let mut entry_hasher = std::collections::hash_map::DefaultHasher::new();
            k.hash(&mut entry_hasher);
            entry_hasher.write_u64(v.hash());
            acc ^= entry_hasher.finish();
        }
        state.write_u64(acc);
    }
}

impl fmt::Display for PlHashMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (_, v)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v.to_string_value())?;
        }
        write!(f, "}}")
    }
}

pub(crate) const HASH_MAP_EXT: ExtensionNamespace =
    ExtensionNamespace::new("hash_map", &["keys", "values", "has_key", "remove", "length"]);

impl HolderBody for PlHashMap {
    fn type_name(&self) -> &'static str {
        "hash_map"
    }
    fn duplicate(&self) -> Box<dyn HolderBody> {
        Box::new(self.clone())
    }
    fn compare(&self, other: &dyn HolderBody) -> bool {
        other.as_any().downcast_ref::<Self>().map_or(false, |o| self == o)
    }
    fn hash_value(&self, state: &mut dyn Hasher) {
        Hash::hash(self, state)
    }
    fn to_display_string(&self) -> String {
        self.to_string()
    }
    fn detach(&mut self) -> Result<()> {
        for value in self.0.values_mut() {
            value.detach()?;
        }
        Ok(())
    }
    fn get_ext(&self) -> Option<&'static ExtensionNamespace> {
        Some(&HASH_MAP_EXT)
    }
    fn as_any(&self) -> &dyn StdAny {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn StdAny {
        self
    }
}

/// The runtime type-info token (`type`, "typeof" results). Compares equal
/// when the two tokens name the same dynamic type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlTypeToken(pub std::any::TypeId, pub &'static str);

impl fmt::Display for PlTypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.1)
    }
}

impl HolderBody for PlTypeToken {
    fn type_name(&self) -> &'static str {
        "type"
    }
    fn duplicate(&self) -> Box<dyn HolderBody> {
        Box::new(*self)
    }
    fn compare(&self, other: &dyn HolderBody) -> bool {
        other.as_any().downcast_ref::<Self>() == Some(self)
    }
    fn hash_value(&self, state: &mut dyn Hasher) {
        Hash::hash(self, state)
    }
    fn to_display_string(&self) -> String {
        self.to_string()
    }
    fn as_any(&self) -> &dyn StdAny {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn StdAny {
        self
    }
}

/// An opaque token identifying one [`Context`](crate::context::Context)
/// instance, bound under the top-level `context` name at context creation.
/// The core owns only the token, not the Context itself — a Cell can't
/// recursively contain the Context it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, BuiltinType)]
pub struct ContextHandle(pub u64);

impl fmt::Display for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<context #{}>", self.0)
    }
}

/// A placeholder bound under the names of an out-of-scope external
/// collaborator: the built-in libraries `math`, `iostream`, `system`,
/// `runtime`, `exception`, and the native operations `to_integer`,
/// `to_string`, `clone`, `move`, `swap`. Lets `Context` keep those names
/// present in the top-level scope honestly, without pretending to
/// implement a library this crate explicitly does not own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, BuiltinType)]
pub struct LibraryStub(pub &'static str);

impl fmt::Display for LibraryStub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native `{}`>", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_to_string_is_lowercase_literal() {
        let t = Any::make(PlBool(true));
        let f = Any::make(PlBool(false));
        assert_eq!(t.to_string_value(), "true");
        assert_eq!(f.to_string_value(), "false");
    }

    #[test]
    fn string_round_trips() {
        let s = Any::make(PlString("hello".to_string()));
        assert_eq!(s.to_string_value(), "hello");
    }

    #[test]
    fn char_to_integer_is_codepoint() {
        let c = Any::make(PlChar('A'));
        assert_eq!(c.to_integer(), Some(65));
    }

    #[test]
    fn primitives_have_no_extension_namespace() {
        let n = Any::make(PlNumber(1.0));
        assert!(n.get_ext().is_err());
    }

    #[test]
    fn string_has_an_extension_namespace() {
        let s = Any::make(PlString("x".to_string()));
        let ext = s.get_ext().unwrap();
        assert!(ext.has_member("length"));
    }

    #[test]
    fn list_detach_breaks_sharing_of_elements() {
        let shared = Any::make(PlNumber(1.0));
        let list_cell = Any::make(PlList(vec![shared.clone(), shared.clone()]));
        let mut list_cell = list_cell;
        list_cell.detach().unwrap();
        if let Ok(list) = list_cell.const_val::<PlList>() {
            assert!(!list.0[0].is_same(&list.0[1]));
        }
    }

    #[test]
    fn pointer_equality_is_identity_not_value() {
        let a = Any::make(PlNumber(1.0));
        let b = Any::make(PlNumber(1.0));
        let pa = PlPointer(a.clone());
        let pb = PlPointer(b);
        assert_ne!(pa, pb);
        let pa2 = PlPointer(a);
        assert_eq!(pa, pa2);
    }
}
