//! Unified error type for the settlement crate.
//!
//! Every fallible operation returns [`Result`]. Variants carry enough context to
//! build a user-facing message at the CLI boundary without re-querying the store.

use thiserror::Error;

/// All errors surfaced by the settlement crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field is missing or malformed. Raised before any store access.
    #[error("Validation failed for `{field}`: {message}")]
    Validation {
        /// Name of the offending input field
        field: String,
        /// Human-readable reason
        message: String,
    },

    /// A daily record already exists for this identity key.
    #[error("A daily record already exists for key {key}")]
    DuplicateRecord {
        /// The colliding record key
        key: String,
    },

    /// No route is registered for the route/operator pair.
    #[error("Route is not registered (route: {route} / operator: {operator_id})")]
    RouteNotRegistered {
        /// Route code as entered
        route: String,
        /// Operator account id as entered
        operator_id: String,
    },

    /// The referenced user does not exist.
    #[error("User not found: {uid}")]
    UserNotFound {
        /// Missing user id
        uid: String,
    },

    /// The acting session lacks the capability for this action.
    #[error("Permission denied: {action} requires the {required} role")]
    PermissionDenied {
        /// Action that was attempted
        action: String,
        /// Role that would have been required
        required: String,
    },

    /// A deduction or credit was negative while the policy forbids it.
    #[error("Negative amount for `{field}`: {amount}")]
    NegativeAmount {
        /// Deduction field name
        field: String,
        /// Offending amount
        amount: i64,
    },

    /// Aggregation touched routes with no registered price while the policy forbids it.
    #[error("Records reference unregistered routes: {}", route_keys.join(", "))]
    UnpricedRoutes {
        /// Route keys that resolved to no route document
        route_keys: Vec<String>,
    },

    /// A won amount or unit count left the representable range.
    #[error("Amount overflow while computing {what}")]
    Overflow {
        /// Quantity being computed
        what: String,
    },

    /// A requested document does not exist.
    #[error("{what} not found")]
    NotFound {
        /// Description of what was looked up
        what: String,
    },

    /// The store did not answer within the configured bound.
    #[error("Operation `{operation}` timed out after {seconds}s; please retry")]
    Timeout {
        /// Name of the bounded operation
        operation: String,
        /// Bound that was exceeded
        seconds: u64,
    },

    /// Rendering the settlement document failed.
    #[error("Export error: {message}")]
    Export {
        /// Description of the rendering failure
        message: String,
    },

    /// Configuration could not be loaded.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Underlying store failure.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] error.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for an [`Error::Overflow`] error.
    pub fn overflow(what: &str) -> Self {
        Self::Overflow {
            what: what.to_string(),
        }
    }

    /// Whether the failed action may succeed if simply repeated.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Database(_))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_not_registered_message_names_both_parts() {
        let err = Error::RouteNotRegistered {
            route: "B101".to_string(),
            operator_id: "cp1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("B101"));
        assert!(msg.contains("cp1"));
    }

    #[test]
    fn test_retriable_classification() {
        let timeout = Error::Timeout {
            operation: "aggregate".to_string(),
            seconds: 30,
        };
        assert!(timeout.is_retriable());
        assert!(!Error::validation("date", "required").is_retriable());
        assert!(!Error::overflow("driver income").is_retriable());
        assert!(
            !Error::DuplicateRecord {
                key: "k".to_string()
            }
            .is_retriable()
        );
    }

    #[test]
    fn test_unpriced_routes_lists_keys() {
        let err = Error::UnpricedRoutes {
            route_keys: vec!["A01_X".to_string(), "B02_Y".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Records reference unregistered routes: A01_X, B02_Y"
        );
    }
}
