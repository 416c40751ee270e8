//! Enum reflection
//!
//! Closed enumerations (contract states, events, performatives, diagnostic
//! kinds) need a display name per symbol and a way back from the name. The
//! `reflect_enum!` macro generates the enum together with a static
//! bidirectional table, `Display`, `FromStr` and serde impls that use the
//! table's names, so no hand-written lookup ever drifts from the enum.
//!
//! ## Laws
//!
//! - `name_of` is total: every symbol has exactly one name
//! - `parse(name_of(s)) == Ok(s)` for every symbol
//! - `parse` of any other string yields `UnknownStateError`

use crate::error::UnknownStateError;

/// A closed enumeration with a compile-time name table
pub trait Reflect: Sized + Copy + Eq + 'static {
    /// Name of the enumeration, used in error messages
    const KIND: &'static str;

    /// Every symbol, in declaration order
    fn variants() -> &'static [Self];

    /// Display name of this symbol
    fn name(&self) -> &'static str;

    /// Symbol for a display name
    ///
    /// Matching is exact (case-sensitive).
    fn parse(name: &str) -> Result<Self, UnknownStateError> {
        Self::variants()
            .iter()
            .copied()
            .find(|v| v.name() == name)
            .ok_or_else(|| UnknownStateError::new(Self::KIND, name))
    }
}

/// Display name of a reflected symbol
pub fn name_of<T: Reflect>(value: T) -> &'static str {
    value.name()
}

/// Parse a reflected symbol from its display name
pub fn parse<T: Reflect>(name: &str) -> Result<T, UnknownStateError> {
    T::parse(name)
}

/// Define an enum with a static name table
///
/// ```
/// scaf_core::reflect_enum! {
///     /// Traffic light
///     pub enum Light: "Light" {
///         /// Stop
///         Red => "red",
///         /// Go
///         Green => "green",
///     }
/// }
///
/// use scaf_core::reflect::Reflect;
/// assert_eq!(Light::Red.name(), "red");
/// assert_eq!(Light::parse("green").unwrap(), Light::Green);
/// ```
#[macro_export]
macro_rules! reflect_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $crate::reflect::Reflect for $name {
            const KIND: &'static str = $kind;

            fn variants() -> &'static [Self] {
                &[ $( $name::$variant ),+ ]
            }

            fn name(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::reflect::Reflect::name(self))
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::UnknownStateError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                <$name as $crate::reflect::Reflect>::parse(s)
            }
        }

        impl $crate::__private::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                serializer.serialize_str($crate::reflect::Reflect::name(self))
            }
        }

        impl<'de> $crate::__private::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: $crate::__private::serde::Deserializer<'de>,
            {
                let name: ::std::string::String =
                    $crate::__private::serde::Deserialize::deserialize(deserializer)?;
                <$name as $crate::reflect::Reflect>::parse(&name)
                    .map_err(<D::Error as $crate::__private::serde::de::Error>::custom)
            }
        }
    };
}
