//! Macro for implementing Display and FromStr for wire-named enums
//!
//! Several small enums (HTTP methods, renewal states) travel as fixed
//! strings in headers and log fields. This macro maps each variant to one
//! canonical string and parses it back case-insensitively.
//!
//! # Example
//!
//! ```rust
//! use nexium_domain::impl_wire_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Phase {
//!     Idle,
//!     Renewing,
//! }
//!
//! impl_wire_name_conversions!(Phase {
//!     Idle => "idle",
//!     Renewing => "renewing",
//! });
//!
//! assert_eq!(Phase::Renewing.to_string(), "renewing");
//! assert_eq!("IDLE".parse::<Phase>().unwrap(), Phase::Idle);
//! ```

/// Implements Display and FromStr traits for wire-named enums
///
/// This macro generates:
/// - Display trait: writes the canonical string of the variant
/// - FromStr trait: parses case-insensitive strings to enum variants
#[macro_export]
macro_rules! impl_wire_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical wire string of this variant.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($str) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}
