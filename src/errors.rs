//! `AppError` pairs an internal Rust error with the description users are allowed to see.
//! Internal errors can carry sensitive detail (SQL, file paths, pool state) which must
//! never leak into an HTTP response body.

mod actix;
mod describe;
pub mod public;

pub use describe::*;
pub use public::{Kind, PublicError};
use std::fmt;
use std::fmt::{Display, Formatter};

/// An error with two faces: the internal one gets logged, the public one gets served.
#[derive(Debug)]
pub struct AppError {
    /// The underlying error from some function. May contain sensitive information, so it
    /// is logged but never shown to users.
    pub internal: anyhow::Error,
    /// A user-friendly error that doesn't contain any sensitive information.
    pub public: PublicError,
}

/// Displaying an AppError only displays the public part. The internal error stays private.
impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::result::Result<(), fmt::Error> {
        write!(f, "{}", self.public)
    }
}

/// Return type of a fallible operation anywhere in the service. Carries both faces of
/// the error so handlers can serve it directly.
pub type Fallible<T> = Result<T, AppError>;
