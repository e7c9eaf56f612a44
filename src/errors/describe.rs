//! Convenience methods to turn any error (from any library) into an [`AppError`].
use crate::errors::{AppError, PublicError};

pub trait Describe {
    /// Convert an error into an AppError by describing it to your users.
    fn describe(self, public: PublicError) -> AppError;
}

impl<Internal: Into<anyhow::Error>> Describe for Internal {
    fn describe(self, public: PublicError) -> AppError {
        AppError {
            internal: self.into(),
            public,
        }
    }
}

/// Any regular internal error can be turned into an AppError, using the default public error.
/// If you want to give an internal error a custom public face, use `internal.describe(public)`.
impl<Internal: Into<anyhow::Error>> From<Internal> for AppError {
    fn from(internal: Internal) -> AppError {
        internal.describe(Default::default())
    }
}

pub trait DescribeErr<T> {
    /// Convert a result's error into an AppError by describing it to your users.
    /// Shorthand for `result.map_err(|e| e.describe(public))`.
    fn describe_err(self, public: PublicError) -> Result<T, AppError>;
}

impl<T, E> DescribeErr<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn describe_err(self, public: PublicError) -> Result<T, AppError> {
        self.map_err(|e| e.describe(public))
    }
}
