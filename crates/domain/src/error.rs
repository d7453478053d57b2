//! Unified error types for the domain layer
//!
//! Domain constructors and `FromStr` impls report problems through
//! [`DomainError`] so adapters never have to fall back to `String` errors.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., negative identifiers, empty media locators)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Invalid ID value
    #[error("Invalid ID: {0}")]
    InvalidId(String),

    /// Parse error (for enums parsed from wire or config strings)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Creates a validation error for values that break a domain invariant.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invalid ID error
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    ///
    /// # Example
    /// ```ignore
    /// impl FromStr for DeviceClass {
    ///     type Err = DomainError;
    ///     fn from_str(s: &str) -> Result<Self, Self::Err> {
    ///         match s {
    ///             "mobile" => Ok(Self::Mobile),
    ///             _ => Err(DomainError::parse(format!("Unknown device class: {}", s))),
    ///         }
    ///     }
    /// }
    /// ```
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
