//! Optional per-request identity.
//!
//! The [`identify`] middleware asks an [`IdentityResolver`] for the current
//! user and stores it in the request extensions; handlers read it back with
//! the [`MaybeUser`] extractor. Nothing here rejects a request: a missing or
//! bad token simply means "no user".

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shelf_core::CurrentUser;

/// Resolve the signed-in user from request headers.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Option<CurrentUser>;
}

/// Resolver for deployments without sign-in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl IdentityResolver for Anonymous {
    fn resolve(&self, _headers: &HeaderMap) -> Option<CurrentUser> {
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub exp: usize,
}

/// Authorization schemes accepted in front of a token.
const SCHEMES: [&str; 2] = ["Bearer", "JWT"];

/// Cookie carrying the token for browser sessions.
pub const TOKEN_COOKIE: &str = "bookshelf_token";

/// HS256 tokens from `Authorization: Bearer <token>` or a session cookie.
pub struct JwtIdentity {
    decoding: DecodingKey,
    encoding: EncodingKey,
    validation: Validation,
}

impl JwtIdentity {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Sign a token for `user`, valid for `ttl_secs`.
    pub fn issue(&self, user: &CurrentUser, ttl_secs: u64) -> anyhow::Result<String> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)?
            .as_secs();
        let claims = Claims {
            sub: user.id.clone(),
            name: user.name.clone(),
            exp: (now + ttl_secs) as usize,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    fn token_from_authorization(&self, headers: &HeaderMap) -> Option<String> {
        let hv = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
        let (scheme, token) = hv.split_once(' ')?;
        let token = token.trim();

        let allowed = SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme.trim()));
        (allowed && !token.is_empty()).then(|| token.to_string())
    }

    fn token_from_cookie(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == TOKEN_COOKIE)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

impl IdentityResolver for JwtIdentity {
    fn resolve(&self, headers: &HeaderMap) -> Option<CurrentUser> {
        let token = self
            .token_from_authorization(headers)
            .or_else(|| self.token_from_cookie(headers))?;

        match decode::<Claims>(&token, &self.decoding, &self.validation) {
            Ok(data) => Some(CurrentUser::new(data.claims.sub, data.claims.name)),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring invalid identity token");
                None
            }
        }
    }
}

/// Middleware: attach the resolved [`CurrentUser`] to the request.
pub async fn identify(
    State(resolver): State<Arc<dyn IdentityResolver>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(user) = resolver.resolve(req.headers()) {
        req.extensions_mut().insert(user);
    }
    next.run(req).await
}

/// The current user, if the [`identify`] middleware found one.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<CurrentUser>().cloned()))
    }
}
