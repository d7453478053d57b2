use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Numeric identifiers issued by the remote explore/onboarding services.
///
/// Serialized transparently so the wire shape stays a bare JSON number.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw id. Server ids are strictly positive.
            pub fn new(value: i64) -> Result<Self, DomainError> {
                if value <= 0 {
                    return Err(DomainError::invalid_id(format!(
                        "{} must be positive, got {}",
                        stringify!($name),
                        value
                    )));
                }
                Ok(Self(value))
            }

            /// Wraps a raw id without validation (wire decoding, fixtures).
            pub const fn from_raw(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<i64> for $name {
            type Error = DomainError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

define_id!(ContentId);
define_id!(SessionId);
define_id!(CategoryId);

// Entity references carried by content items
define_id!(PropertyId);
define_id!(DevelopmentId);
define_id!(PartnerId);
