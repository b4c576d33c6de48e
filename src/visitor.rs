//! Visitor identity and admin access
//!
//! The consent banner sets `consent=true` and a random `user_id` cookie.
//! Only with both present is a request tied to a visitor; otherwise it is
//! anonymous and unscoped.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header, request::Parts, HeaderMap},
};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

const CONSENT_COOKIE: &str = "consent";
const USER_ID_COOKIE: &str = "user_id";
const ADMIN_COOKIE: &str = "admin_auth";

/// The requesting visitor, as far as their cookies allow us to know
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Visitor {
    pub consent: bool,
    user_id: Option<String>,
}

impl Visitor {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let consent = cookie(headers, CONSENT_COOKIE).as_deref() == Some("true");
        let user_id = cookie(headers, USER_ID_COOKIE).filter(|id| !id.is_empty());

        Self { consent, user_id }
    }

    /// Tracking id, only when the visitor has consented
    pub fn user_id(&self) -> Option<&str> {
        if self.consent {
            self.user_id.as_deref()
        } else {
            None
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Visitor::from_headers(&parts.headers))
    }
}

/// Proof that the request carries the admin shared secret
#[derive(Debug)]
pub struct AdminAuth;

#[derive(Debug, Deserialize)]
struct AdminQuery {
    password: Option<String>,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config().admin.password.as_deref() else {
            return Err(AppError::Forbidden("Admin access is disabled".to_string()));
        };

        let from_query = Query::<AdminQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.password);
        let from_cookie = cookie(&parts.headers, ADMIN_COOKIE);

        if [from_query, from_cookie].iter().flatten().any(|p| p == expected) {
            Ok(AdminAuth)
        } else {
            tracing::warn!(path = %parts.uri.path(), "Rejected admin request");
            Err(AppError::Forbidden("Admin password required".to_string()))
        }
    }
}

/// Value of the named cookie, if the request sent it
fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
}
