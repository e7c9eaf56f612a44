use actix_web::http::StatusCode;
use std::fmt;

/// Used to create HTTP responses with the given text and status code.
#[derive(Debug)]
pub struct PublicError {
    /// A user-facing explanation of what caused the error.
    pub kind: Kind,
    /// Error text that will describe the problem to the user.
    pub text: &'static str,
}

/// A user-facing classification of what caused the error. Authorization failures and
/// invalid forms never pass through here: they answer with a login redirect and a 200
/// error body respectively.
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    ServerError,
    NotFound,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        // Make fmt::Display the same as fmt::Debug, i.e. each variant's name.
        write!(f, "{:?}", self)
    }
}

impl From<Kind> for StatusCode {
    /// Kinds map to HTTP status codes here, in one place. PublicError doesn't carry status
    /// codes directly because the datastore shouldn't need to know about HTTP.
    fn from(kind: Kind) -> StatusCode {
        match kind {
            Kind::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Kind::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl PublicError {
    /// The standard "no such row" error, shared by every lookup endpoint.
    pub fn not_found(text: &'static str) -> Self {
        Self {
            kind: Kind::NotFound,
            text,
        }
    }
}

impl fmt::Display for PublicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}: {}", self.kind, self.text)
    }
}

impl Default for PublicError {
    // Default to ServerError and a very vague generic message.
    fn default() -> Self {
        Self {
            kind: Kind::ServerError,
            text: "Internal server error",
        }
    }
}
