//! Declaration visibility and decorator representation.
//!
//! Per the REDESIGN FLAGS, decorator identity is lifted into the
//! [`DeriveKind`] enum during parsing/lowering rather than compared by
//! string at every derive-engine call site; the engine only ever matches on
//! these enums.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// One recognized `@derive(...)` argument (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeriveKind {
    PartialEq,
    Eq,
    Hash,
    Debug,
    Display,
    Default,
    FromStr,
    Serialize,
    Deserialize,
    Reflect,
}

impl DeriveKind {
    /// Parses a single identifier from a `@derive(...)` argument list.
    /// Returns `None` for an unrecognized name; the caller surfaces that as
    /// an unsupported-construct diagnostic rather than silently ignoring it.
    pub fn from_name(name: &str) -> Option<DeriveKind> {
        match name {
            "PartialEq" => Some(DeriveKind::PartialEq),
            "Eq" => Some(DeriveKind::Eq),
            "Hash" => Some(DeriveKind::Hash),
            "Debug" => Some(DeriveKind::Debug),
            "Display" => Some(DeriveKind::Display),
            "Default" => Some(DeriveKind::Default),
            "FromStr" => Some(DeriveKind::FromStr),
            "Serialize" => Some(DeriveKind::Serialize),
            "Deserialize" => Some(DeriveKind::Deserialize),
            "Reflect" => Some(DeriveKind::Reflect),
            _ => None,
        }
    }
}

impl fmt::Display for DeriveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeriveKind::PartialEq => "PartialEq",
            DeriveKind::Eq => "Eq",
            DeriveKind::Hash => "Hash",
            DeriveKind::Debug => "Debug",
            DeriveKind::Display => "Display",
            DeriveKind::Default => "Default",
            DeriveKind::FromStr => "FromStr",
            DeriveKind::Serialize => "Serialize",
            DeriveKind::Deserialize => "Deserialize",
            DeriveKind::Reflect => "Reflect",
        };
        write!(f, "{name}")
    }
}

/// A decorator attached to a declaration (§6 input contract).
#[derive(Debug, Clone)]
pub enum Attribute {
    /// `@extern(abi)` — `abi` is one of `"c"`, `"c++"`, `"stdcall"`, `"fastcall"`, `"thiscall"`.
    Extern { abi: String },
    /// `@link(lib)` — accumulated for the driver, not consumed here.
    Link { lib: String },
    Derive(Vec<DeriveKind>),
    Test,
    Bench,
    ShouldPanic,
    Ignore,
    Stable,
    /// Marks a function whose return value is a freshly heap-allocated
    /// string, for the lifetime tracker (§4.9).
    Allocates,
    /// Marks a function body as itself an intrinsic implementation; the
    /// declaration emitter skips ordinary body codegen for it.
    Intrinsic,
}

/// Convenience queries over a declaration's attribute list. Implemented as
/// free functions (rather than a wrapper newtype) since every declaration
/// kind stores attributes as a plain `Vec<Attribute>`.
pub fn derives(attrs: &[Attribute]) -> Vec<DeriveKind> {
    attrs
        .iter()
        .filter_map(|a| match a {
            Attribute::Derive(kinds) => Some(kinds.clone()),
            _ => None,
        })
        .flatten()
        .collect()
}

pub fn extern_abi(attrs: &[Attribute]) -> Option<&str> {
    attrs.iter().find_map(|a| match a {
        Attribute::Extern { abi } => Some(abi.as_str()),
        _ => None,
    })
}

pub fn link_libs(attrs: &[Attribute]) -> Vec<&str> {
    attrs
        .iter()
        .filter_map(|a| match a {
            Attribute::Link { lib } => Some(lib.as_str()),
            _ => None,
        })
        .collect()
}

pub fn has(attrs: &[Attribute], predicate: impl Fn(&Attribute) -> bool) -> bool {
    attrs.iter().any(predicate)
}

pub fn is_test(attrs: &[Attribute]) -> bool {
    has(attrs, |a| matches!(a, Attribute::Test))
}

pub fn is_should_panic(attrs: &[Attribute]) -> bool {
    has(attrs, |a| matches!(a, Attribute::ShouldPanic))
}

pub fn allocates(attrs: &[Attribute]) -> bool {
    has(attrs, |a| matches!(a, Attribute::Allocates))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_kind_from_name() {
        assert_eq!(DeriveKind::from_name("PartialEq"), Some(DeriveKind::PartialEq));
        assert_eq!(DeriveKind::from_name("Bogus"), None);
    }

    #[test]
    fn test_derives_flattens_single_attribute() {
        let attrs = vec![Attribute::Derive(vec![DeriveKind::Eq, DeriveKind::Hash])];
        assert_eq!(derives(&attrs), vec![DeriveKind::Eq, DeriveKind::Hash]);
    }

    #[test]
    fn test_extern_abi_and_link_libs() {
        let attrs = vec![Attribute::Extern { abi: "c".to_string() }, Attribute::Link { lib: "m".to_string() }];
        assert_eq!(extern_abi(&attrs), Some("c"));
        assert_eq!(link_libs(&attrs), vec!["m"]);
    }
}
