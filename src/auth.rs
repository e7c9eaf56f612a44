//! Bearer-token identities. Login/session management lives in a separate service; this
//! one only verifies the JWTs it issues. Handlers take [`Identity`] when a logged-in
//! caller is required, or `Option<Identity>` when the page just renders differently for
//! one. A missing or bad token is answered with a redirect to the login page carrying
//! the original path in `next`, never with a bare 401.

use actix_web::{
    dev::Payload,
    http::{header, StatusCode},
    web, FromRequest, HttpRequest, HttpResponse,
};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use futures::future::{ready, Ready};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;
use uuid::Uuid;

/// Token-verification settings, stored as app data.
#[derive(Clone)]
pub struct AuthSettings {
    secret: String,
    login_url: String,
    disabled: bool,
}

impl AuthSettings {
    pub fn new(secret: &str, login_url: &str, disabled: bool) -> Self {
        Self {
            secret: secret.to_owned(),
            login_url: login_url.to_owned(),
            disabled,
        }
    }

    fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = if self.disabled {
            // Test environments only: accept the claims without checking the signature.
            jsonwebtoken::dangerous_insecure_decode::<Claims>(token)?
        } else {
            jsonwebtoken::decode::<Claims>(
                token,
                &jsonwebtoken::DecodingKey::from_secret(self.secret.as_bytes()),
                &jsonwebtoken::Validation::default(),
            )?
        };
        Ok(data.claims)
    }
}

/// The claims the login service puts in its tokens.
#[derive(Serialize, Deserialize)]
pub struct Claims {
    /// The user's id.
    pub sub: Uuid,
    /// The user's username.
    pub name: String,
    pub exp: i64,
}

/// The authenticated caller, extracted from the Authorization header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
}

impl FromRequest for Identity {
    type Error = LoginRedirect;
    type Future = Ready<Result<Self, LoginRedirect>>;
    type Config = ();

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(identify(req))
    }
}

fn identify(req: &HttpRequest) -> Result<Identity, LoginRedirect> {
    guard!(let Some(settings) = req.app_data::<web::Data<AuthSettings>>() else {
        warn!("AuthSettings app data is missing; rejecting the request");
        return Err(LoginRedirect::to("/auth/login", req.path()));
    });
    let rejection = || LoginRedirect::to(&settings.login_url, req.path());

    let auth = <Authorization<Bearer> as header::Header>::parse(req).map_err(|_| rejection())?;
    let scheme = auth.into_scheme();
    let token: &str = scheme.token();
    let claims = settings.verify(token).map_err(|_| rejection())?;
    Ok(Identity {
        user_id: claims.sub,
        username: claims.name,
    })
}

/// Rejection from the [`Identity`] extractor: send the caller to the login page,
/// remembering where they were going.
#[derive(Debug)]
pub struct LoginRedirect {
    location: String,
}

impl LoginRedirect {
    fn to(login_url: &str, next: &str) -> Self {
        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("next", next)
            .finish();
        Self {
            location: format!("{}?{}", login_url, query),
        }
    }
}

impl fmt::Display for LoginRedirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "redirecting to {}", self.location)
    }
}

impl actix_web::ResponseError for LoginRedirect {
    fn status_code(&self) -> StatusCode {
        StatusCode::FOUND
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Found()
            .header(header::LOCATION, self.location.clone())
            .finish()
    }
}

/// Mint a token the way the login service would.
#[cfg(test)]
pub fn token_for(user_id: Uuid, username: &str, secret: &str) -> String {
    let claims = Claims {
        sub: user_id,
        name: username.to_owned(),
        exp: 4_102_444_800, // 2100-01-01, far enough
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("couldn't encode test token")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_accepts_own_tokens() {
        let settings = AuthSettings::new("sekrit", "/auth/login", false);
        let user_id = Uuid::new_v4();
        let token = token_for(user_id, "leo", "sekrit");

        let claims = settings.verify(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.name, "leo");
    }

    #[test]
    fn test_verify_rejects_wrong_signature() {
        let settings = AuthSettings::new("sekrit", "/auth/login", false);
        let token = token_for(Uuid::new_v4(), "leo", "some-other-secret");
        assert!(settings.verify(&token).is_err());
    }

    #[test]
    fn test_disabled_mode_skips_signature_checks() {
        let settings = AuthSettings::new("sekrit", "/auth/login", true);
        let token = token_for(Uuid::new_v4(), "leo", "some-other-secret");
        assert!(settings.verify(&token).is_ok());
    }

    #[test]
    fn test_login_redirect_escapes_next() {
        let redirect = LoginRedirect::to("/auth/login", "/leo/some post");
        assert_eq!(redirect.location, "/auth/login?next=%2Fleo%2Fsome+post");
    }
}
