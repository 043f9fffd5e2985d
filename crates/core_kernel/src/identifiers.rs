//! Strongly-typed identifiers for domain entities
//!
//! Every table in the warranty schema is keyed by a `SERIAL` integer. Newtype
//! wrappers keep a warranty id from being passed where a claim id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wraps a raw database key
            pub const fn new(value: i32) -> Self {
                Self(value)
            }

            /// Returns the raw database key
            pub const fn value(&self) -> i32 {
                self.0
            }

            /// Returns the identifier prefix used in log output
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Accept both "42" and "WAR-42"
                let raw = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(raw.trim().parse()?))
            }
        }

        impl From<i32> for $name {
            fn from(value: i32) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> i32 {
                id.0
            }
        }
    };
}

// Network identifiers
define_id!(ShopId, "SHP");
define_id!(StateId, "STA");
define_id!(UserId, "USR");

// Stock identifiers
define_id!(CarPartId, "CPT");
define_id!(ProductId, "PRD");
define_id!(ProductAllocationId, "PAL");

// Warranty identifiers
define_id!(WarrantyId, "WAR");
define_id!(WarrantyPartId, "WARP");

// Claim identifiers
define_id!(ClaimId, "CLM");
define_id!(ClaimPartId, "CLMP");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_raw_key() {
        assert_eq!(WarrantyId::new(42).to_string(), "42");
    }

    #[test]
    fn test_parse_with_and_without_prefix() {
        let plain: ClaimId = "17".parse().unwrap();
        let prefixed: ClaimId = "CLM-17".parse().unwrap();
        assert_eq!(plain, prefixed);
        assert_eq!(plain.value(), 17);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("abc".parse::<ShopId>().is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&WarrantyPartId::new(9)).unwrap();
        assert_eq!(json, "9");
    }
}
