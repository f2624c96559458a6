//! Strongly-typed identifiers used across the domain.
//!
//! Identifiers in the flat-file format are opaque, supplier-assigned strings.
//! The only rule enforced here is that they are never blank.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// Identifier of a box (unique per delivery).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoxId(String);

/// Identifier of the supplier that shipped a box.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SupplierId(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create an identifier, rejecting empty or whitespace-only values.
            ///
            /// The value is kept verbatim (no trimming).
            pub fn new(value: impl Into<String>) -> Result<Self, FormatError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(FormatError::invalid_id(format!("{} must not be blank", $name)));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $t {
            type Error = FormatError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = FormatError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

impl_string_newtype!(BoxId, "BoxId");
impl_string_newtype!(SupplierId, "SupplierId");
