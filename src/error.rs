//! Error types for the clockkit library.
//!
//! Construction is the only fallible surface of the engine: every other
//! operation is purely in-memory and either completes or reports absence
//! through an `Option`. A cache miss, an expired entry, or a `remove` of an
//! unknown key are normal outcomes, never errors.

use std::fmt;

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by the fallible `try_new` constructors. The only validated
/// precondition is the capacity: a cache must have at least one slot.
///
/// # Example
///
/// ```
/// use clockkit::error::ConfigError;
/// use clockkit::policy::clock::ClockCache;
///
/// let err = ClockCache::<u64, u64>::try_new(0).unwrap_err();
/// assert_eq!(err, ConfigError::InvalidCapacity { got: 0 });
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// The requested capacity was below the minimum of one slot.
    InvalidCapacity {
        /// The capacity that was requested.
        got: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidCapacity { got } => {
                write!(f, "capacity must be at least 1 (got {got})")
            },
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_parameter() {
        let err = ConfigError::InvalidCapacity { got: 0 };
        assert_eq!(err.to_string(), "capacity must be at least 1 (got 0)");
    }

    #[test]
    fn debug_includes_requested_value() {
        let err = ConfigError::InvalidCapacity { got: 0 };
        let dbg = format!("{:?}", err);
        assert!(dbg.contains("InvalidCapacity"));
        assert!(dbg.contains('0'));
    }

    #[test]
    fn clone_and_eq() {
        let a = ConfigError::InvalidCapacity { got: 0 };
        let b = a;
        assert_eq!(a, b);
    }

    #[test]
    fn implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<ConfigError>();
    }
}
