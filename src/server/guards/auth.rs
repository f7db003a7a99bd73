use crate::error::LaunchpadError;
use crate::server::router::LaunchpadState;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;

pub const ADMIN_COOKIE: &str = "launchpad_admin_session";
pub const ADMIN_SESSION_HOURS: i64 = 12;

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

pub(crate) fn keys_match(given: &str, expected: &str) -> bool {
    !expected.is_empty() && bool::from(given.as_bytes().ct_eq(expected.as_bytes()))
}

/// Encrypted session cookie; the value is the expiry as a unix timestamp.
pub fn session_cookie(expires_at: DateTime<Utc>, insecure: bool) -> Cookie<'static> {
    Cookie::build((ADMIN_COOKIE, expires_at.timestamp().to_string()))
        .path("/")
        .http_only(true)
        .secure(!insecure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::hours(ADMIN_SESSION_HOURS))
        .build()
}

fn session_valid(jar: &PrivateCookieJar, now: DateTime<Utc>) -> bool {
    jar.get(ADMIN_COOKIE)
        .and_then(|c| c.value().parse::<i64>().ok())
        .is_some_and(|expires| expires > now.timestamp())
}

/// Admin session cookie or `Authorization: Bearer <admin key>`.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<LaunchpadState> for RequireAdmin {
    type Rejection = LaunchpadError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &LaunchpadState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(token) = bearer_token(parts) {
            return if keys_match(&token, &state.admin_key) {
                Ok(RequireAdmin)
            } else {
                Err(LaunchpadError::Unauthorized("Invalid admin key"))
            };
        }

        let jar = PrivateCookieJar::<axum_extra::extract::cookie::Key>::from_request_parts(
            parts, state,
        )
        .await
        .map_err(|_| LaunchpadError::Unauthorized("Missing admin session"))?;

        if session_valid(&jar, Utc::now()) {
            Ok(RequireAdmin)
        } else {
            Err(LaunchpadError::Unauthorized("Missing admin session"))
        }
    }
}

/// `Authorization: Bearer <cron secret>`; 503 when no secret is configured.
#[derive(Debug, Clone, Copy)]
pub struct RequireCron;

impl FromRequestParts<LaunchpadState> for RequireCron {
    type Rejection = LaunchpadError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &LaunchpadState,
    ) -> Result<Self, Self::Rejection> {
        let Some(secret) = state.cfg.basic.cron_secret.as_deref() else {
            return Err(LaunchpadError::Disabled("Cron"));
        };
        match bearer_token(parts) {
            Some(token) if keys_match(&token, secret) => Ok(RequireCron),
            Some(_) => Err(LaunchpadError::Unauthorized("Invalid cron secret")),
            None => Err(LaunchpadError::Unauthorized("Missing cron secret")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_match_rejects_empty_expected() {
        assert!(keys_match("abc", "abc"));
        assert!(!keys_match("abd", "abc"));
        assert!(!keys_match("", ""));
    }

    #[test]
    fn session_cookie_is_hardened() {
        let c = session_cookie(Utc::now(), false);
        assert_eq!(c.name(), ADMIN_COOKIE);
        assert_eq!(c.http_only(), Some(true));
        assert_eq!(c.secure(), Some(true));
        assert_eq!(session_cookie(Utc::now(), true).secure(), Some(false));
    }
}
